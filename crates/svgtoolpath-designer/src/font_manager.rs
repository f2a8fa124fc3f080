use crate::text::{FontProvider, GlyphOutline, OutlinePoint, OutlineSource};
use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use rusttype::{Font, OutlineBuilder, Scale};
use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, Mutex, OnceLock},
    thread::JoinHandle,
};
use tracing::{debug, info, warn};

/// Family used when nothing else is installed.
pub const LAST_RESORT_FAMILY: &str = "Noto Sans";

/// CSS generic family → platform font that is virtually always installed.
#[cfg(target_os = "windows")]
const SAFE_FONTS: &[(&str, &str)] = &[
    ("serif", "Times New Roman"),
    ("sans-serif", "Arial"),
    ("cursive", "Monotype Corsiva"),
    ("fantasy", "Impact"),
    ("monospace", "Courier New"),
    ("system-ui", "Segoe UI"),
];

#[cfg(target_os = "macos")]
const SAFE_FONTS: &[(&str, &str)] = &[
    ("serif", "Times"),
    ("sans-serif", "Helvetica"),
    ("cursive", "Apple Chancery"),
    ("fantasy", "Papyrus"),
    ("monospace", "Courier"),
    ("system-ui", ".SF NS Text"),
];

// Elsewhere the generic names go through fontdb's generic family mapping.
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const SAFE_FONTS: &[(&str, &str)] = &[
    ("serif", "serif"),
    ("sans-serif", "sans-serif"),
    ("cursive", "cursive"),
    ("fantasy", "fantasy"),
    ("monospace", "monospace"),
    ("system-ui", "sans-serif"),
];

fn safe_font(name: &str) -> Option<&'static str> {
    SAFE_FONTS
        .iter()
        .find(|(generic, _)| generic.eq_ignore_ascii_case(name))
        .map(|(_, family)| *family)
}

fn generic_family(name: &str) -> Option<Family<'static>> {
    match name {
        "serif" => Some(Family::Serif),
        "sans-serif" => Some(Family::SansSerif),
        "cursive" => Some(Family::Cursive),
        "fantasy" => Some(Family::Fantasy),
        "monospace" => Some(Family::Monospace),
        _ => None,
    }
}

/// Splits a CSS `font-family` list into unquoted names.
pub fn split_family_list(families: &str) -> Vec<String> {
    families
        .split(',')
        .map(|name| name.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Eq, PartialEq, Hash)]
struct FontKey {
    family: String,
    weight: u16,
    italic: bool,
}

/// Installed fonts, scanned on a background thread.
///
/// The scan starts when the catalog is created; the first lookup waits for
/// it to finish.
pub struct FontCatalog {
    scan: Mutex<Option<JoinHandle<Database>>>,
    database: OnceLock<Database>,
    cache: Mutex<HashMap<FontKey, Option<Arc<RustTypeOutlines>>>>,
}

impl FontCatalog {
    /// Starts scanning the system font directories.
    pub fn load_system() -> Self {
        let handle = std::thread::spawn(|| {
            let mut db = Database::new();
            db.load_system_fonts();
            info!(faces = db.len(), "Font scan finished");
            db
        });
        Self {
            scan: Mutex::new(Some(handle)),
            database: OnceLock::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Uses an already populated database.
    pub fn from_database(db: Database) -> Self {
        let database = OnceLock::new();
        let _ = database.set(db);
        Self {
            scan: Mutex::new(None),
            database,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.database.get().is_some()
    }

    /// The font database, waiting for the scan if it is still running.
    pub fn database(&self) -> &Database {
        self.database.get_or_init(|| {
            let handle = self.scan.lock().unwrap_or_else(|p| p.into_inner()).take();
            match handle.map(JoinHandle::join) {
                Some(Ok(db)) => db,
                Some(Err(_)) => {
                    warn!("Font scan thread panicked; continuing without system fonts");
                    Database::new()
                }
                None => Database::new(),
            }
        })
    }

    /// Sorted names of all installed families.
    pub fn family_names(&self) -> Vec<String> {
        let names: BTreeSet<String> = self
            .database()
            .faces()
            .flat_map(|face| face.families.iter().map(|(name, _)| name.clone()))
            .collect();
        names.into_iter().collect()
    }

    fn installed_family(&self, name: &str) -> Option<String> {
        self.database()
            .faces()
            .flat_map(|face| face.families.iter())
            .find(|(family, _)| family.eq_ignore_ascii_case(name))
            .map(|(family, _)| family.clone())
    }

    fn is_available(&self, name: &str) -> bool {
        if let Some(generic) = generic_family(name) {
            let families = [generic];
            let query = Query {
                families: &families,
                weight: Weight::NORMAL,
                stretch: Stretch::Normal,
                style: Style::Normal,
            };
            return self.database().query(&query).is_some();
        }
        self.installed_family(name).is_some()
    }

    /// Picks one family for a CSS family list: each entry (generic names via
    /// the safe-font table), then the safe serif font, then any installed
    /// family, then [`LAST_RESORT_FAMILY`].
    pub fn resolve_family(&self, families: &str) -> String {
        for name in split_family_list(families) {
            let lowered = name.to_ascii_lowercase();
            let candidate = safe_font(&lowered).map_or(name, str::to_string);
            if self.is_available(&candidate) {
                return self.installed_family(&candidate).unwrap_or(candidate);
            }
        }
        warn!(families = %families, "Desired fonts not available on the system");

        if let Some(serif) = safe_font("serif").filter(|name| self.is_available(name)) {
            return serif.to_string();
        }
        if let Some(any) = self.family_names().into_iter().next() {
            return any;
        }
        LAST_RESORT_FAMILY.to_string()
    }

    fn load(&self, family: &str, weight: u16, italic: bool) -> Option<RustTypeOutlines> {
        let families = [generic_family(family).unwrap_or(Family::Name(family))];
        let query = Query {
            families: &families,
            weight: Weight(weight),
            stretch: Stretch::Normal,
            style: if italic { Style::Italic } else { Style::Normal },
        };
        let db = self.database();
        let id = db.query(&query)?;
        let font = db
            .with_face_data(id, |data, index| Font::try_from_vec_and_index(data.to_vec(), index))
            .flatten();
        if font.is_none() {
            warn!(family = %family, "Font file could not be parsed");
        }
        font.map(RustTypeOutlines::new)
    }
}

impl FontProvider for FontCatalog {
    fn outline_source(&self, families: &str, weight: u16, italic: bool) -> Option<Arc<dyn OutlineSource>> {
        let family = self.resolve_family(families);
        let key = FontKey {
            family: family.clone(),
            weight,
            italic,
        };

        let mut cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
        let entry = cache.entry(key).or_insert_with(|| {
            debug!(family = %family, weight, italic, "Loading font face");
            self.load(&family, weight, italic).map(Arc::new)
        });
        entry
            .clone()
            .map(|outlines| outlines as Arc<dyn OutlineSource>)
    }
}

/// Glyph outlines of a TrueType/OpenType face read through rusttype.
pub struct RustTypeOutlines {
    font: Font<'static>,
    /// Scale at which rusttype reports coordinates in font units
    unit_scale: Scale,
}

impl RustTypeOutlines {
    pub fn new(font: Font<'static>) -> Self {
        let metrics = font.v_metrics_unscaled();
        let unit_scale = Scale::uniform(metrics.ascent - metrics.descent);
        Self { font, unit_scale }
    }
}

impl OutlineSource for RustTypeOutlines {
    fn units_per_em(&self) -> f64 {
        f64::from(self.font.units_per_em())
    }

    fn glyph(&self, ch: char) -> Option<GlyphOutline> {
        let glyph = self.font.glyph(ch);
        if glyph.id().0 == 0 {
            return None;
        }
        let scaled = glyph.scaled(self.unit_scale);
        let mut collector = ContourCollector::default();
        scaled.build_outline(&mut collector);
        collector.finish();
        Some(GlyphOutline {
            contours: collector.contours,
            advance: f64::from(scaled.h_metrics().advance_width),
        })
    }

    fn kerning(&self, left: char, right: char) -> f64 {
        f64::from(self.font.pair_kerning(self.unit_scale, left, right))
    }
}

#[derive(Default)]
struct ContourCollector {
    contours: Vec<Vec<OutlinePoint>>,
    current: Vec<OutlinePoint>,
}

impl ContourCollector {
    // rusttype reports y pointing down.
    fn push(&mut self, x: f32, y: f32, make: fn(f64, f64) -> OutlinePoint) {
        self.current.push(make(f64::from(x), -f64::from(y)));
    }

    fn finish(&mut self) {
        if !self.current.is_empty() {
            self.contours.push(std::mem::take(&mut self.current));
        }
    }
}

impl OutlineBuilder for ContourCollector {
    fn move_to(&mut self, x: f32, y: f32) {
        self.finish();
        self.push(x, y, OutlinePoint::on);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.push(x, y, OutlinePoint::on);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.push(x1, y1, OutlinePoint::quadratic);
        self.push(x, y, OutlinePoint::on);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.push(x1, y1, OutlinePoint::cubic);
        self.push(x2, y2, OutlinePoint::cubic);
        self.push(x, y, OutlinePoint::on);
    }

    fn close(&mut self) {
        // The closing segment is implied by the contour.
        if self.current.len() > 1 {
            let first = self.current[0];
            if let Some(last) = self.current.last() {
                if last.is_on_curve() && last.x == first.x && last.y == first.y {
                    self.current.pop();
                }
            }
        }
        self.finish();
    }
}
