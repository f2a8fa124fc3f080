use svgtoolpath_core::{Command, Point};
use svgtoolpath_designer::compile_svg;
use svgtoolpath_settings::Config;

fn compile(source: &str) -> Vec<Command> {
    compile_svg(source, &Config::default(), None).unwrap()
}

fn bbox(commands: &[Command]) -> (Point, Point) {
    commands.iter().map(Command::position).fold(
        (
            Point::new(f64::INFINITY, f64::INFINITY),
            Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        ),
        |(min, max), p| {
            (
                Point::new(min.x.min(p.x), min.y.min(p.y)),
                Point::new(max.x.max(p.x), max.y.max(p.y)),
            )
        },
    )
}

fn assert_bbox(commands: &[Command], min: (f64, f64), max: (f64, f64)) {
    let (actual_min, actual_max) = bbox(commands);
    assert!(
        actual_min.distance_to(&Point::new(min.0, min.1)) < 1e-6
            && actual_max.distance_to(&Point::new(max.0, max.1)) < 1e-6,
        "bbox {actual_min} - {actual_max}, expected {min:?} - {max:?}"
    );
}

#[test]
fn test_use_translates_scaled_definition() {
    let commands = compile(
        r##"<svg>
              <defs><rect id="r" width="2" height="2" transform="scale(2)"/></defs>
              <use href="#r" x="10" y="0"/>
            </svg>"##,
    );
    assert_eq!(commands.len(), 5);
    assert_bbox(&commands, (10.0, 0.0), (14.0, 4.0));
}

#[test]
fn test_use_of_use_is_printed() {
    let commands = compile(
        r##"<svg>
              <rect id="r" width="1" height="1"/>
              <use id="u" href="#r" x="5"/>
              <use href="#u" y="5"/>
            </svg>"##,
    );
    assert_eq!(commands.len(), 15);
    assert_bbox(&commands, (0.0, 0.0), (6.0, 6.0));
}

#[test]
fn test_unknown_element_does_not_abort_siblings() {
    let commands = compile(
        r#"<svg>
             <g>
               <blink/>
               <rect width="1" height="1"/>
               <marquee><rect width="50" height="50"/></marquee>
               <line x2="3"/>
             </g>
           </svg>"#,
    );
    assert_eq!(commands.len(), 7);
    assert_bbox(&commands, (0.0, 0.0), (3.0, 1.0));
}

#[test]
fn test_non_rendering_elements() {
    let commands = compile(
        r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:sodipodi="http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd">
              <title>drawing</title>
              <desc>nothing</desc>
              <metadata><rect width="5" height="5"/></metadata>
              <symbol id="s"><rect width="5" height="5"/></symbol>
              <defs><rect width="5" height="5"/></defs>
              <sodipodi:namedview/>
              <style>rect { stroke-width: 1mm }</style>
            </svg>"##,
    );
    assert!(commands.is_empty());
}

#[test]
fn test_view_box_scales_to_physical_size() {
    let commands = compile(
        r#"<svg width="100mm" height="50mm" viewBox="10 10 200 100">
             <rect x="10" y="10" width="200" height="100"/>
           </svg>"#,
    );
    assert_bbox(&commands, (0.0, 0.0), (100.0, 50.0));
}

#[test]
fn test_view_box_scales_path_data_and_points() {
    let commands = compile(
        r#"<svg width="20mm" height="20mm" viewBox="0 0 10 10">
             <path d="M1 1 h 2"/>
             <polyline points="0 0 5 5"/>
           </svg>"#,
    );
    assert_eq!(
        commands,
        vec![
            Command::travel(2.0, 2.0),
            Command::extrude(6.0, 2.0, 0.4),
            Command::travel(0.0, 0.0),
            Command::extrude(10.0, 10.0, 0.4),
        ]
    );
}

#[test]
fn test_nested_svg_opens_and_restores_viewport() {
    let commands = compile(
        r#"<svg>
             <svg x="20" width="10" height="10" viewBox="0 0 1 1">
               <rect width="1" height="1"/>
             </svg>
             <rect x="40" width="1" height="1"/>
           </svg>"#,
    );
    assert_bbox(&commands[..5], (20.0, 0.0), (30.0, 10.0));
    assert_bbox(&commands[5..], (40.0, 0.0), (41.0, 1.0));
}

#[test]
fn test_nested_svg_inside_transformed_group() {
    let commands = compile(
        r#"<svg>
             <g transform="scale(2)">
               <svg x="5" width="10" height="10" viewBox="5 0 10 10">
                 <rect x="5" width="1" height="1"/>
               </svg>
             </g>
           </svg>"#,
    );
    // viewBox origin cancels the rect's x, svg x shifts by 5, group doubles it.
    assert_bbox(&commands, (10.0, 0.0), (12.0, 2.0));
}

#[test]
fn test_switch_renders_first_supported_child() {
    let commands = compile(
        r#"<svg>
             <switch>
               <rect requiredFeatures="http://www.w3.org/TR/SVG11/feature#Font" width="9" height="9"/>
               <rect requiredExtensions="http://example.org/ext" width="8" height="8"/>
               <rect requiredFeatures="http://www.w3.org/TR/SVG11/feature#Shape" width="2" height="2"/>
               <rect width="7" height="7"/>
             </switch>
           </svg>"#,
    );
    assert_eq!(commands.len(), 5);
    assert_bbox(&commands, (0.0, 0.0), (2.0, 2.0));
}

#[test]
fn test_unsupported_required_features_skip_element() {
    let commands = compile(
        r#"<svg>
             <g requiredFeatures="http://www.w3.org/TR/SVG11/feature#Animation">
               <rect width="9" height="9"/>
             </g>
           </svg>"#,
    );
    assert!(commands.is_empty());
}

#[test]
fn test_stroke_width_cascade() {
    let commands = compile(
        r#"<svg>
             <g stroke-width="0.8mm">
               <style>line { stroke-width: 2mm }</style>
               <line x2="1"/>
               <line x2="1" style="stroke-width: 0.2mm"/>
               <line x2="1" stroke-width="bogus"/>
             </g>
           </svg>"#,
    );
    let widths: Vec<f64> = commands.iter().filter_map(Command::line_width).collect();
    assert_eq!(widths, vec![2.0, 0.2, 2.0]);
}

#[test]
fn test_malformed_document_is_an_error() {
    let err = compile_svg("<svg><rect></svg>", &Config::default(), None).unwrap_err();
    assert!(err.is_document_error());
    let err = compile_svg("<html/>", &Config::default(), None).unwrap_err();
    assert!(err.is_document_error());
}

#[test]
fn test_text_without_fonts_is_skipped() {
    let commands = compile(r#"<svg><text x="1" y="1">Hi</text><rect width="1" height="1"/></svg>"#);
    assert_eq!(commands.len(), 5);
}
