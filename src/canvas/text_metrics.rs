use eframe::egui;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::constants;

// Family name the label face is registered under in egui.
pub const LABEL_FONT_FAMILY: &str = "flowsketch-label";
const BUNDLED_FACE: &str = "Ubuntu-Light";

const SYSTEM_FACES: &[&str] = &[
    "C:\\Windows\\Fonts\\segoeui.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
];

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse font {name}: {reason}")]
    Parse { name: String, reason: &'static str },
    #[error("no bundled fallback font is available")]
    NoFallback,
}

pub trait TextMeasure {
    fn measure(&self, text: &str, font_size: f32) -> egui::Vec2;
}

// Size a label needs inside its shape: measured text plus fixed padding.
pub fn measure_label(measure: &dyn TextMeasure, text: &str, font_size: f32) -> egui::Vec2 {
    measure.measure(text, font_size) + egui::Vec2::splat(constants::LABEL_PADDING)
}

// Character-count estimate for when no font face can be loaded.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApproxMeasure;

impl TextMeasure for ApproxMeasure {
    fn measure(&self, text: &str, font_size: f32) -> egui::Vec2 {
        let w = text.chars().filter(|&c| c != '\n').count() as f32 * font_size * 0.6;
        let h = font_size * 1.2;
        egui::vec2(w, h)
    }
}

pub struct LabelFont {
    name: String,
    data: Arc<Vec<u8>>,
    font: fontdue::Font,
    bundled: bool,
}

impl LabelFont {
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self, FontError> {
        let name = name.into();
        let font = fontdue::Font::from_bytes(data.as_slice(), fontdue::FontSettings::default())
            .map_err(|reason| FontError::Parse {
                name: name.clone(),
                reason,
            })?;
        Ok(Self {
            name,
            data: Arc::new(data),
            font,
            bundled: false,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, FontError> {
        let data = std::fs::read(path).map_err(|source| FontError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("custom")
            .to_string();
        Self::from_bytes(name, data)
    }

    pub fn bundled() -> Result<Self, FontError> {
        let defs = egui::FontDefinitions::default();
        let (name, data) = defs
            .font_data
            .get_key_value(BUNDLED_FACE)
            .or_else(|| defs.font_data.iter().next())
            .ok_or(FontError::NoFallback)?;
        let mut font = Self::from_bytes(name.clone(), data.font.to_vec())?;
        font.bundled = true;
        Ok(font)
    }

    // Best-effort lookup: the preferred file, then common system faces, then
    // the bundled face.
    pub fn resolve(preferred: Option<&Path>) -> Result<Self, FontError> {
        if let Some(path) = preferred {
            match Self::from_path(path) {
                Ok(font) => return Ok(font),
                Err(e) => log::warn!("label font unavailable, falling back: {e}"),
            }
        }
        for candidate in SYSTEM_FACES {
            let path = Path::new(candidate);
            if !path.exists() {
                continue;
            }
            match Self::from_path(path) {
                Ok(font) => return Ok(font),
                Err(e) => log::debug!("skipping system font: {e}"),
            }
        }
        log::warn!("no system label font found, using bundled {BUNDLED_FACE}");
        Self::bundled()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_bundled(&self) -> bool {
        self.bundled
    }

    pub fn font(&self) -> &fontdue::Font {
        &self.font
    }

    // Makes the face available to egui as `LABEL_FONT_FAMILY`, with the
    // default proportional faces behind it for missing glyphs.
    pub fn register_with(&self, ctx: &egui::Context) {
        let mut fonts = egui::FontDefinitions::default();
        fonts.font_data.insert(
            LABEL_FONT_FAMILY.to_string(),
            Arc::new(egui::FontData::from_owned(self.data.as_ref().clone())),
        );
        let mut family = vec![LABEL_FONT_FAMILY.to_string()];
        if let Some(proportional) = fonts.families.get(&egui::FontFamily::Proportional) {
            family.extend(proportional.iter().cloned());
        }
        fonts
            .families
            .insert(egui::FontFamily::Name(LABEL_FONT_FAMILY.into()), family);
        ctx.set_fonts(fonts);
    }
}

impl TextMeasure for LabelFont {
    fn measure(&self, text: &str, font_size: f32) -> egui::Vec2 {
        let w: f32 = text
            .chars()
            .filter(|&c| c != '\n')
            .map(|c| self.font.metrics(c, font_size).advance_width)
            .sum();
        let h = self
            .font
            .horizontal_line_metrics(font_size)
            .map(|m| m.new_line_size)
            .unwrap_or(font_size * 1.2);
        egui::vec2(w, h)
    }
}

pub fn label_font_id(size: f32) -> egui::FontId {
    egui::FontId::new(size, egui::FontFamily::Name(LABEL_FONT_FAMILY.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_is_added_to_both_dimensions() {
        let raw = ApproxMeasure.measure("Start", 12.0);
        let padded = measure_label(&ApproxMeasure, "Start", 12.0);
        assert_eq!(padded, raw + egui::vec2(20.0, 20.0));
    }

    #[test]
    fn bundled_face_loads_and_measures() {
        let font = LabelFont::bundled().expect("egui ships a default face");
        assert!(font.is_bundled());
        let short = font.measure("ab", 12.0);
        let long = font.measure("abcdef", 12.0);
        assert!(short.x > 0.0);
        assert!(long.x > short.x);
        assert!(long.y > 0.0);
        assert!(font.measure("abc", 24.0).x > font.measure("abc", 12.0).x);
    }

    #[test]
    fn missing_preferred_face_falls_back() {
        let missing = std::env::temp_dir().join("flowsketch-no-such-font.ttf");
        let font = LabelFont::resolve(Some(&missing)).expect("fallback face");
        assert!(!font.name().is_empty());
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let err = LabelFont::from_bytes("junk", vec![0, 1, 2, 3]).err();
        assert!(matches!(err, Some(FontError::Parse { .. })));
    }
}
