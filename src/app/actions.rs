use eframe::egui;
use std::path::{Path, PathBuf};

use crate::canvas::{CommandEffect, ToolCommand};

use super::{FlowchartEditor, TextPrompt, settings};

impl FlowchartEditor {
    pub(super) fn run_command(&mut self, command: ToolCommand) {
        if self.engine.apply_command(command) == CommandEffect::ExportRequested {
            self.export_dialog();
        }
    }

    pub(super) fn export_dialog(&mut self) {
        self.engine.abandon_gesture();
        let default_name = Path::new(&self.export_path)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("flowchart.png")
            .to_string();
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(&default_name)
            .add_filter("PNG", &["png"])
            .save_file()
        {
            self.export_to(path);
        }
    }

    pub(super) fn quick_export(&mut self) {
        let path = PathBuf::from(&self.export_path);
        self.export_to(path);
    }

    fn export_to(&mut self, path: PathBuf) {
        let path = if path.extension().is_some() {
            path
        } else {
            path.with_extension("png")
        };
        let font = self.label_font.as_deref().map(Path::new);
        match self.engine.export_png(&path, font) {
            Ok(report) => {
                let path_str = path.display().to_string();
                self.status = Some(format!(
                    "Exported {} ({} shapes, {} connectors, {} labels)",
                    path_str, report.shapes, report.lines, report.labels
                ));
                if self.export_path != path_str {
                    self.export_path = path_str;
                    self.persist_settings();
                }
            }
            Err(e) => {
                log::error!("export to {} failed: {e}", path.display());
                self.status = Some(format!("Export failed: {e}"));
            }
        }
    }

    pub(super) fn open_text_prompt(&mut self, shape: crate::model::EntityId) {
        self.text_prompt = Some(TextPrompt {
            shape,
            text: String::new(),
            request_focus: true,
        });
    }

    // Modal prompt for a shape's label. Enter or OK applies, Escape or
    // Cancel leaves the shape alone.
    pub(super) fn text_prompt_ui(&mut self, ctx: &egui::Context) {
        let Some(prompt) = self.text_prompt.as_mut() else {
            return;
        };
        let mut submit = false;
        let mut cancel = ctx.input(|i| i.key_pressed(egui::Key::Escape));
        egui::Window::new("Input")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label("Enter text for shape:");
                let resp = ui.text_edit_singleline(&mut prompt.text);
                if prompt.request_focus {
                    resp.request_focus();
                    prompt.request_focus = false;
                }
                if resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submit = true;
                }
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() {
                        submit = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                });
            });

        if submit {
            if let Some(prompt) = self.text_prompt.take() {
                if self.engine.attach_label(prompt.shape, &prompt.text) {
                    log::debug!("labelled {} as {:?}", prompt.shape, prompt.text);
                }
            }
        } else if cancel {
            self.text_prompt = None;
        }
    }

    pub(super) fn settings_snapshot(&self) -> settings::AppSettings {
        settings::AppSettings {
            export_path: self.export_path.clone(),
            label_font: self.label_font.clone(),
        }
    }

    pub(super) fn persist_settings(&mut self) {
        let snapshot = self.settings_snapshot();
        if let Err(e) = settings::save_settings(&self.settings_path, &snapshot) {
            self.status = Some(format!("Settings save failed: {e}"));
        }
    }

    // Re-reads the settings file. A changed label font is re-resolved and
    // existing labels are re-measured with it.
    pub(super) fn reload_settings(&mut self, ctx: &egui::Context) {
        let settings = settings::load_settings(&self.settings_path)
            .or_else(|| settings::load_settings("settings.json"))
            .unwrap_or_default();
        self.export_path = settings.export_path;

        if settings.label_font == self.label_font {
            self.status = Some("Settings reloaded".to_string());
            return;
        }
        self.label_font = settings.label_font;
        let preferred = self.label_font.as_deref().map(Path::new);
        match crate::canvas::text_metrics::LabelFont::resolve(preferred) {
            Ok(font) => {
                font.register_with(ctx);
                self.status = Some(format!("Settings reloaded, label font: {}", font.name()));
                self.label_family_ready = true;
                self.engine.set_measure(Box::new(font));
            }
            Err(e) => {
                log::warn!("label font unavailable after reload: {e}");
                self.status = Some(format!("Settings reloaded (label font unavailable: {e})"));
            }
        }
    }
}
