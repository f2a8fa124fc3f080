use std::sync::{Arc, Mutex};
use svgtoolpath_core::{Command, Point};
use svgtoolpath_designer::{compile_svg, FontProvider, GlyphOutline, OutlinePoint, OutlineSource};
use svgtoolpath_settings::Config;

/// Every glyph is a 600-unit wide box, 700 units tall, on a 1000-unit em.
struct BoxFont;

impl OutlineSource for BoxFont {
    fn units_per_em(&self) -> f64 {
        1000.0
    }

    fn glyph(&self, ch: char) -> Option<GlyphOutline> {
        if ch == ' ' {
            return Some(GlyphOutline {
                contours: Vec::new(),
                advance: 300.0,
            });
        }
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        Some(GlyphOutline {
            contours: vec![vec![
                OutlinePoint::on(0.0, 0.0),
                OutlinePoint::on(600.0, 0.0),
                OutlinePoint::on(600.0, 700.0),
                OutlinePoint::on(0.0, 700.0),
            ]],
            advance: 600.0,
        })
    }

    fn kerning(&self, _left: char, _right: char) -> f64 {
        0.0
    }
}

#[derive(Default)]
struct RecordingProvider {
    requests: Mutex<Vec<(String, u16, bool)>>,
}

impl FontProvider for RecordingProvider {
    fn outline_source(&self, families: &str, weight: u16, italic: bool) -> Option<Arc<dyn OutlineSource>> {
        self.requests
            .lock()
            .unwrap()
            .push((families.to_string(), weight, italic));
        Some(Arc::new(BoxFont))
    }
}

fn compile_text(source: &str, provider: &RecordingProvider) -> Vec<Command> {
    compile_svg(source, &Config::default(), Some(provider as &dyn FontProvider)).unwrap()
}

fn travels(commands: &[Command]) -> Vec<Point> {
    commands
        .iter()
        .filter(|c| c.is_travel())
        .map(Command::position)
        .collect()
}

#[test]
fn test_each_glyph_contour_is_a_closed_stroke() {
    let provider = RecordingProvider::default();
    let commands = compile_text(
        r#"<svg><text x="10" y="20" font-size="10mm">AB</text></svg>"#,
        &provider,
    );
    // Two boxes, each a travel plus four sides.
    assert_eq!(commands.len(), 10);
    assert_eq!(travels(&commands), vec![Point::new(10.0, 20.0), Point::new(16.0, 20.0)]);
    // Glyphs rise above the baseline.
    assert!(commands.iter().any(|c| (c.position().y - 13.0).abs() < 1e-9));
    assert_eq!(commands[4].position(), commands[0].position());
}

#[test]
fn test_whitespace_collapse_and_text_transform() {
    let provider = RecordingProvider::default();
    let commands = compile_text(
        r#"<svg><text font-size="10mm" style="text-transform: uppercase">  a
             b </text></svg>"#,
        &provider,
    );
    // "A B": the space advances 3 mm between the 6 mm glyphs.
    assert_eq!(travels(&commands), vec![Point::new(0.0, 0.0), Point::new(9.0, 0.0)]);
}

#[test]
fn test_font_request_carries_weight_and_style() {
    let provider = RecordingProvider::default();
    compile_text(
        r#"<svg font-family="'Open Sans', sans-serif">
             <text font-weight="bold" font-style="italic">x</text>
             <text dx="5" dy="5">y</text>
           </svg>"#,
        &provider,
    );
    let requests = provider.requests.lock().unwrap();
    assert_eq!(
        *requests,
        vec![
            ("'Open Sans', sans-serif".to_string(), 700, true),
            ("'Open Sans', sans-serif".to_string(), 400, false),
        ]
    );
}

#[test]
fn test_text_follows_transform() {
    let provider = RecordingProvider::default();
    let commands = compile_text(
        r#"<svg><g transform="translate(50, 50) scale(2)"><text font-size="10mm" x="1">I</text></g></svg>"#,
        &provider,
    );
    assert_eq!(travels(&commands), vec![Point::new(52.0, 50.0)]);
    assert!(commands
        .iter()
        .any(|c| c.position().distance_to(&Point::new(64.0, 36.0)) < 1e-9));
}
