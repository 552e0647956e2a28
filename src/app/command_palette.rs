use eframe::egui;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::canvas::{ToolCommand, ToolMode};

use super::FlowchartEditor;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum CommandId {
    Tool(ToolCommand),
    QuickExport,
    ReloadSettings,
    Help,
}

pub(super) struct CommandSpec {
    pub id: CommandId,
    pub name: &'static str,
    pub search: &'static str,
}

const fn tool(mode: ToolMode) -> CommandId {
    CommandId::Tool(ToolCommand::Select(mode))
}

const COMMANDS: &[CommandSpec] = &[
    CommandSpec { id: tool(ToolMode::Pointer), name: "Tool: Pointer", search: "pointer select move tool v" },
    CommandSpec { id: tool(ToolMode::Rectangle), name: "Tool: Rectangle", search: "rectangle rect box process tool r" },
    CommandSpec { id: tool(ToolMode::Oval), name: "Tool: Oval", search: "oval ellipse start end terminal tool o" },
    CommandSpec { id: tool(ToolMode::Diamond), name: "Tool: Diamond", search: "diamond decision rhombus tool d" },
    CommandSpec { id: tool(ToolMode::Line), name: "Tool: Line", search: "line connector tool l" },
    CommandSpec { id: tool(ToolMode::Arrow), name: "Tool: Arrow", search: "arrow connector tool a" },
    CommandSpec { id: tool(ToolMode::Delete), name: "Tool: Delete", search: "delete remove erase tool x" },
    CommandSpec { id: tool(ToolMode::Text), name: "Tool: Text", search: "text label caption tool t" },
    CommandSpec { id: CommandId::Tool(ToolCommand::ZoomIn), name: "View: Zoom in", search: "zoom in bigger +" },
    CommandSpec { id: CommandId::Tool(ToolCommand::ZoomOut), name: "View: Zoom out", search: "zoom out smaller -" },
    CommandSpec { id: CommandId::Tool(ToolCommand::Export), name: "File: Export PNG...", search: "export png image save dialog" },
    CommandSpec { id: CommandId::QuickExport, name: "File: Quick export PNG", search: "quick export png image save" },
    CommandSpec { id: CommandId::ReloadSettings, name: "Settings: Reload", search: "reload settings config font" },
    CommandSpec { id: CommandId::Help, name: "Help: Shortcuts", search: "help shortcuts keys" },
];

#[derive(Default)]
pub(super) struct CommandPalette {
    pub open: bool,
    pub query: String,
    pub selected: usize,
    request_focus: bool,
}

#[derive(Clone, Copy)]
pub(super) struct CommandContext {
    pub has_export_path: bool,
}

impl CommandPalette {
    pub fn open(&mut self, query: impl Into<String>) {
        self.open = true;
        self.query = query.into();
        self.selected = 0;
        self.request_focus = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.query.clear();
        self.selected = 0;
        self.request_focus = false;
    }

    fn is_enabled(cx: CommandContext, id: CommandId) -> bool {
        match id {
            CommandId::QuickExport => cx.has_export_path,
            _ => true,
        }
    }

    pub(super) fn execute(app: &mut FlowchartEditor, ctx: &egui::Context, id: CommandId) {
        match id {
            CommandId::Tool(command) => app.run_command(command),
            CommandId::QuickExport => app.quick_export(),
            CommandId::ReloadSettings => app.reload_settings(ctx),
            CommandId::Help => app.show_help = true,
        }
        ctx.request_repaint();
    }

    fn filtered(&self) -> Vec<(&'static CommandSpec, i64)> {
        let matcher = SkimMatcherV2::default();
        let q = self.query.trim();
        if q.is_empty() {
            return COMMANDS.iter().map(|c| (c, 0)).collect();
        }
        let mut out = Vec::new();
        for c in COMMANDS {
            if let Some(score) = matcher.fuzzy_match(c.search, q) {
                out.push((c, score));
            }
        }
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.name.cmp(b.0.name)));
        out
    }

    pub fn ui(&mut self, ctx: &egui::Context, cx: CommandContext) -> Option<CommandId> {
        if !self.open {
            return None;
        }
        let matches = self.filtered();
        let last = matches.len().saturating_sub(1);
        let (escape, down, up, mut run) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Escape),
                i.key_pressed(egui::Key::ArrowDown),
                i.key_pressed(egui::Key::ArrowUp),
                i.key_pressed(egui::Key::Enter),
            )
        });
        if escape {
            self.close();
            return None;
        }
        if down {
            self.selected += 1;
        }
        if up {
            self.selected = self.selected.saturating_sub(1);
        }
        self.selected = self.selected.min(last);

        egui::Window::new("Commands")
            .title_bar(false)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 48.0))
            .fixed_size(egui::vec2(360.0, 0.0))
            .show(ctx, |ui| {
                let query = ui.add(
                    egui::TextEdit::singleline(&mut self.query)
                        .desired_width(f32::INFINITY)
                        .hint_text("Type a command"),
                );
                if std::mem::take(&mut self.request_focus) {
                    query.request_focus();
                }
                ui.separator();
                if matches.is_empty() {
                    ui.weak("No matching command");
                }
                for (idx, (spec, _)) in matches.iter().enumerate() {
                    let row = ui.add_enabled(
                        Self::is_enabled(cx, spec.id),
                        egui::Button::new(spec.name).selected(idx == self.selected),
                    );
                    if row.clicked() {
                        self.selected = idx;
                        run = true;
                    }
                }
            });

        let (spec, _) = matches.get(self.selected).filter(|_| run)?;
        if !Self::is_enabled(cx, spec.id) {
            return None;
        }
        let id = spec.id;
        self.close();
        Some(id)
    }
}
