use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(super) struct AppSettings {
    // Target of quick export; updated after each dialog export.
    pub export_path: String,
    pub label_font: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            export_path: "flowchart.png".to_string(),
            label_font: None,
        }
    }
}

pub(super) fn parse_settings(path: &str, s: &str) -> Option<AppSettings> {
    if path.ends_with(".toml") {
        toml::from_str::<AppSettings>(s)
            .ok()
            .or_else(|| serde_json::from_str::<AppSettings>(s).ok())
    } else {
        serde_json::from_str::<AppSettings>(s)
            .ok()
            .or_else(|| toml::from_str::<AppSettings>(s).ok())
    }
}

pub(super) fn load_settings(path: &str) -> Option<AppSettings> {
    let s = std::fs::read_to_string(path).ok()?;
    let parsed = parse_settings(path, &s);
    if parsed.is_none() {
        log::warn!("ignoring unreadable settings file {path}");
    }
    parsed
}

pub(super) fn save_settings(path: &str, settings: &AppSettings) -> Result<(), String> {
    if path.ends_with(".toml") {
        let toml = toml::to_string_pretty(settings).map_err(|e| e.to_string())?;
        std::fs::write(path, toml).map_err(|e| e.to_string())
    } else {
        let json = serde_json::to_string_pretty(settings).map_err(|e| e.to_string())?;
        std::fs::write(path, json).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let s = parse_settings("settings.toml", "label_font = \"/fonts/a.ttf\"\n").unwrap();
        assert_eq!(s.export_path, "flowchart.png");
        assert_eq!(s.label_font.as_deref(), Some("/fonts/a.ttf"));
    }

    #[test]
    fn toml_file_may_hold_json() {
        let s = parse_settings("settings.toml", r#"{"export_path": "out/chart.png"}"#).unwrap();
        assert_eq!(s.export_path, "out/chart.png");
        assert_eq!(s.label_font, None);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_settings("settings.json", "export_path = [").is_none());
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = std::env::temp_dir();
        let settings = AppSettings {
            export_path: "diagram.png".to_string(),
            label_font: Some("DejaVuSans.ttf".to_string()),
        };
        for name in ["flowsketch-settings-test.toml", "flowsketch-settings-test.json"] {
            let path = dir.join(name).display().to_string();
            save_settings(&path, &settings).unwrap();
            assert_eq!(load_settings(&path), Some(settings.clone()));
            let _ = std::fs::remove_file(&path);
        }
    }
}
