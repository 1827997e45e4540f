use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use ttf_parser::{Face, GlyphId, OutlineBuilder};

/// Horizontal advance plus the extent above and below the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TextMetrics {
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
}

/// Text measurement capability consumed by the layout engine.
pub trait TextMeasure {
    fn measure_text(&self, text: &str, font_size: f32) -> TextMetrics;

    /// Outline points for one glyph at `font_size`, relative to the glyph
    /// origin on the baseline with y pointing down. `None` when unknown.
    fn glyph_outline(&self, _ch: char, _font_size: f32) -> Option<Vec<(f32, f32)>> {
        None
    }
}

/// Fixed-ratio metrics; deterministic and font-independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxMetrics;

const APPROX_ADVANCE: f32 = 0.56;
const APPROX_ASCENT: f32 = 0.72;
const APPROX_DESCENT: f32 = 0.21;

impl TextMeasure for ApproxMetrics {
    fn measure_text(&self, text: &str, font_size: f32) -> TextMetrics {
        if text.is_empty() || font_size <= 0.0 {
            return TextMetrics::default();
        }
        TextMetrics {
            width: text.chars().count() as f32 * font_size * APPROX_ADVANCE,
            ascent: font_size * APPROX_ASCENT,
            descent: font_size * APPROX_DESCENT,
        }
    }
}

static TEXT_MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

/// Metrics and outlines from a system font resolved by family name,
/// falling back to [`ApproxMetrics`] when no face is available.
#[derive(Debug, Clone)]
pub struct SystemFontMetrics {
    font_family: String,
}

impl SystemFontMetrics {
    pub fn new(font_family: impl Into<String>) -> Self {
        Self {
            font_family: font_family.into(),
        }
    }
}

impl TextMeasure for SystemFontMetrics {
    fn measure_text(&self, text: &str, font_size: f32) -> TextMetrics {
        if text.is_empty() || font_size <= 0.0 {
            return TextMetrics::default();
        }
        let measured = TEXT_MEASURER
            .lock()
            .ok()
            .and_then(|mut guard| guard.measure(text, font_size, &self.font_family));
        measured.unwrap_or_else(|| ApproxMetrics.measure_text(text, font_size))
    }

    fn glyph_outline(&self, ch: char, font_size: f32) -> Option<Vec<(f32, f32)>> {
        let mut guard = TEXT_MEASURER.lock().ok()?;
        guard.outline(ch, font_size, &self.font_family)
    }
}

struct TextMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    cache: HashMap<String, Option<FontFace>>,
}

impl TextMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            cache: HashMap::new(),
        }
    }

    fn face(&mut self, font_family: &str) -> Option<&mut FontFace> {
        let family_key = normalize_family_key(font_family);
        if !self.cache.contains_key(&family_key) {
            let face = self.load_face(font_family);
            self.cache.insert(family_key.clone(), face);
        }
        self.cache.get_mut(&family_key).and_then(|face| face.as_mut())
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<TextMetrics> {
        self.face(font_family)?.measure(text, font_size)
    }

    fn outline(&mut self, ch: char, font_size: f32, font_family: &str) -> Option<Vec<(f32, f32)>> {
        self.face(font_family)?.outline(ch, font_size)
    }

    fn load_face(&mut self, font_family: &str) -> Option<FontFace> {
        let family_key = normalize_family_key(font_family);
        if let Some(face) = load_cached_face(&family_key) {
            return Some(face);
        }

        let mut names: Vec<&str> = Vec::new();
        let mut generic: Vec<Option<Family<'static>>> = Vec::new();
        for part in font_family.split(',') {
            let raw = part.trim().trim_matches('"').trim_matches('\'');
            if raw.is_empty() {
                continue;
            }
            match raw.to_ascii_lowercase().as_str() {
                "serif" => generic.push(Some(Family::Serif)),
                "sans-serif" | "system-ui" => generic.push(Some(Family::SansSerif)),
                "monospace" => generic.push(Some(Family::Monospace)),
                _ => {
                    names.push(raw);
                    generic.push(None);
                }
            }
        }
        let mut families: Vec<Family<'_>> = Vec::new();
        let mut named = names.iter();
        for token in generic {
            match token {
                Some(family) => families.push(family),
                None => {
                    if let Some(name) = named.next() {
                        families.push(Family::Name(*name));
                    }
                }
            }
        }
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        let mut loaded: Option<FontFace> = None;
        self.db.with_face_data(id, |data, index| {
            let bytes = data.to_vec();
            if Face::parse(&bytes, index).is_ok() {
                if let Some((font_path, meta_path)) = cache_paths(&family_key)
                    && !font_path.exists()
                {
                    if let Err(err) = store_cached_face(&font_path, &meta_path, &bytes, index) {
                        tracing::debug!(
                            path = %font_path.display(),
                            %err,
                            "font cache write failed"
                        );
                    }
                }
                loaded = FontFace::new(bytes, index);
            }
        });
        loaded
    }
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: f32,
    ascender: f32,
    descender: f32,
    advance_cache: HashMap<char, Option<u16>>,
}

impl FontFace {
    fn new(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let units_per_em = f32::from(face.units_per_em().max(1));
        let ascender = face
            .capital_height()
            .map(f32::from)
            .unwrap_or_else(|| f32::from(face.ascender()));
        let descender = -f32::from(face.descender());
        Some(Self {
            data,
            index,
            units_per_em,
            ascender,
            descender,
            advance_cache: HashMap::new(),
        })
    }

    fn parsed(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, self.index).ok()
    }

    fn measure(&mut self, text: &str, font_size: f32) -> Option<TextMetrics> {
        let scale = font_size / self.units_per_em;
        let fallback = font_size * APPROX_ADVANCE;
        let mut width = 0.0f32;
        for ch in text.chars() {
            let advance = match self.advance_cache.get(&ch) {
                Some(cached) => *cached,
                None => {
                    let face = self.parsed()?;
                    let value = face
                        .glyph_index(ch)
                        .and_then(|glyph| face.glyph_hor_advance(glyph));
                    self.advance_cache.insert(ch, value);
                    value
                }
            };
            width += match advance {
                Some(units) if units > 0 => f32::from(units) * scale,
                _ => fallback,
            };
        }
        Some(TextMetrics {
            width,
            ascent: self.ascender * scale,
            descent: self.descender * scale,
        })
    }

    fn outline(&self, ch: char, font_size: f32) -> Option<Vec<(f32, f32)>> {
        let face = self.parsed()?;
        let glyph: GlyphId = face.glyph_index(ch)?;
        let mut collector = OutlineCollector {
            scale: font_size / self.units_per_em,
            points: Vec::new(),
        };
        face.outline_glyph(glyph, &mut collector)?;
        if collector.points.is_empty() {
            None
        } else {
            Some(collector.points)
        }
    }
}

/// Gathers on-curve and control points, flipping y to device orientation.
/// Control points bound their curves, so the hull of the result encloses
/// the glyph.
struct OutlineCollector {
    scale: f32,
    points: Vec<(f32, f32)>,
}

impl OutlineCollector {
    fn push(&mut self, x: f32, y: f32) {
        self.points.push((x * self.scale, -y * self.scale));
    }
}

impl OutlineBuilder for OutlineCollector {
    fn move_to(&mut self, x: f32, y: f32) {
        self.push(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.push(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.push(x1, y1);
        self.push(x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.push(x1, y1);
        self.push(x2, y2);
        self.push(x, y);
    }

    fn close(&mut self) {}
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}

fn cache_paths(family_key: &str) -> Option<(PathBuf, PathBuf)> {
    let base = std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))?;
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    family_key.hash(&mut hasher);
    let hash = hasher.finish();
    let dir = base.join("moldraw").join("font-cache");
    let font_path = dir.join(format!("{hash:x}.font"));
    let meta_path = dir.join(format!("{hash:x}.meta"));
    Some((font_path, meta_path))
}

fn store_cached_face(
    font_path: &Path,
    meta_path: &Path,
    bytes: &[u8],
    index: u32,
) -> std::io::Result<()> {
    if let Some(parent) = font_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(font_path, bytes)?;
    fs::write(meta_path, index.to_string())
}

fn load_cached_face(family_key: &str) -> Option<FontFace> {
    let (font_path, meta_path) = cache_paths(family_key)?;
    if !font_path.exists() || !meta_path.exists() {
        return None;
    }
    let bytes = fs::read(font_path).ok()?;
    let index: u32 = fs::read_to_string(meta_path).ok()?.trim().parse().ok()?;
    FontFace::new(bytes, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approx_metrics_scale_with_length_and_size() {
        let one = ApproxMetrics.measure_text("N", 10.0);
        let two = ApproxMetrics.measure_text("NH", 10.0);
        assert!((two.width - 2.0 * one.width).abs() < 1e-4);
        assert!((one.ascent - 7.2).abs() < 1e-4);
        assert_eq!(ApproxMetrics.measure_text("", 10.0), TextMetrics::default());
        assert!(ApproxMetrics.glyph_outline('N', 10.0).is_none());
    }

    #[test]
    fn cache_store_reports_unwritable_paths() {
        let dir = std::env::temp_dir().join(format!("moldraw-cache-{}", std::process::id()));
        let font = dir.join("face.font");
        let meta = dir.join("face.meta");
        store_cached_face(&font, &meta, b"data", 3).unwrap();
        assert_eq!(fs::read_to_string(&meta).unwrap(), "3");

        // A regular file cannot be used as a parent directory.
        let blocked = font.join("nested.font");
        assert!(store_cached_face(&blocked, &meta, b"data", 3).is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn system_metrics_always_measure() {
        let metrics = SystemFontMetrics::new("sans-serif").measure_text("Cl", 12.0);
        assert!(metrics.width > 0.0);
        assert!(metrics.ascent > 0.0);
    }

    #[test]
    fn outline_collector_flips_y() {
        let mut collector = OutlineCollector {
            scale: 0.5,
            points: Vec::new(),
        };
        collector.move_to(0.0, 10.0);
        collector.line_to(4.0, 0.0);
        assert_eq!(collector.points, vec![(0.0, -5.0), (2.0, 0.0)]);
    }
}
