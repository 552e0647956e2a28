use crate::canvas::CanvasEngine;
use crate::canvas::text_metrics::{ApproxMeasure, LabelFont};
use crate::model::EntityId;

mod actions;
mod command_palette;
mod help;
mod render;
mod settings;
mod update;

struct TextPrompt {
    shape: EntityId,
    text: String,
    request_focus: bool,
}

pub struct FlowchartEditor {
    engine: CanvasEngine,
    export_path: String,
    label_font: Option<String>,
    label_family_ready: bool,
    settings_path: String,
    status: Option<String>,
    text_prompt: Option<TextPrompt>,
    command_palette: command_palette::CommandPalette,
    show_help: bool,
}

impl FlowchartEditor {
    fn config_path() -> Option<String> {
        if let Some(home) = std::env::var_os("HOME") {
            let path = std::path::PathBuf::from(home)
                .join(".config")
                .join("flowsketch.toml");
            if path.exists() {
                return Some(path.display().to_string());
            }
        }
        if std::path::Path::new("settings.toml").exists() {
            return Some("settings.toml".to_string());
        }
        None
    }

    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings_path = Self::config_path().unwrap_or_else(|| "settings.toml".to_string());
        let settings = settings::load_settings(&settings_path)
            .or_else(|| settings::load_settings("settings.json"))
            .unwrap_or_default();

        let preferred = settings.label_font.as_deref().map(std::path::Path::new);
        let (engine, label_family_ready, status) = match LabelFont::resolve(preferred) {
            Ok(font) => {
                font.register_with(&cc.egui_ctx);
                let status = if font.is_bundled() {
                    format!("Label font: {} (bundled)", font.name())
                } else {
                    format!("Label font: {}", font.name())
                };
                (CanvasEngine::new(Box::new(font)), true, Some(status))
            }
            Err(e) => {
                log::warn!("label font unavailable, using estimated text metrics: {e}");
                (
                    CanvasEngine::new(Box::new(ApproxMeasure)),
                    false,
                    Some(format!("No label font: {e}")),
                )
            }
        };

        Self {
            engine,
            export_path: settings.export_path,
            label_font: settings.label_font,
            label_family_ready,
            settings_path,
            status,
            text_prompt: None,
            command_palette: command_palette::CommandPalette::default(),
            show_help: false,
        }
    }
}
