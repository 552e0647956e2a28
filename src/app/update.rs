use eframe::egui;

use crate::canvas::{PointerOutcome, ToolCommand, ToolMode};

use super::FlowchartEditor;
use super::command_palette::{CommandContext, CommandPalette};
use super::render::{draw_background, draw_scene, tool_button};

const SCROLLBAR_WIDTH: f32 = 12.0;

const TOOL_KEYS: [(egui::Key, ToolMode); 8] = [
    (egui::Key::V, ToolMode::Pointer),
    (egui::Key::R, ToolMode::Rectangle),
    (egui::Key::O, ToolMode::Oval),
    (egui::Key::D, ToolMode::Diamond),
    (egui::Key::L, ToolMode::Line),
    (egui::Key::A, ToolMode::Arrow),
    (egui::Key::X, ToolMode::Delete),
    (egui::Key::T, ToolMode::Text),
];

impl eframe::App for FlowchartEditor {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(status) = &self.status {
                    ui.label(status);
                } else {
                    ui.label("Ready");
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let scene = self.engine.scene();
                    ui.label(format!("Zoom: {:.0}%", self.engine.view().zoom_factor * 100.0));
                    ui.separator();
                    ui.label(format!(
                        "Shapes: {}  Connectors: {}  Labels: {}",
                        scene.shapes().len(),
                        scene.lines().len(),
                        scene.labels().len()
                    ));
                    ui.separator();
                    ui.label(format!("Tool: {}", self.engine.tool().name()));
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| self.mount(ui));

        let cx = CommandContext {
            has_export_path: !self.export_path.trim().is_empty(),
        };
        if let Some(cmd) = self.command_palette.ui(ctx, cx) {
            CommandPalette::execute(self, ctx, cmd);
        }

        super::help::draw_help_window(ctx, &mut self.show_help);
    }
}

impl FlowchartEditor {
    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let mut command = None;
        let mut open_palette = false;
        let blocked = self.text_prompt.is_some() || self.command_palette.open;
        let skip_tools = blocked || ctx.wants_keyboard_input();

        ctx.input_mut(|i| {
            if i.consume_key(egui::Modifiers::NONE, egui::Key::F1) {
                self.show_help = true;
            }
            if blocked {
                return;
            }
            if i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::P) {
                open_palette = true;
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::E) {
                command = Some(ToolCommand::Export);
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::T) {
                command = Some(ToolCommand::Select(ToolMode::Text));
            }
            if skip_tools {
                return;
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Escape) {
                command = Some(ToolCommand::Select(ToolMode::Pointer));
            }
            for (key, mode) in TOOL_KEYS {
                if i.consume_key(egui::Modifiers::NONE, key) {
                    command = Some(ToolCommand::Select(mode));
                }
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Plus)
                || i.consume_key(egui::Modifiers::NONE, egui::Key::Equals)
                || i.consume_key(egui::Modifiers::SHIFT, egui::Key::Equals)
            {
                command = Some(ToolCommand::ZoomIn);
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Minus) {
                command = Some(ToolCommand::ZoomOut);
            }
        });

        if open_palette {
            self.engine.abandon_gesture();
            self.command_palette.open("");
        }
        if let Some(command) = command {
            if command == ToolCommand::Select(ToolMode::Pointer) {
                self.engine.abandon_gesture();
            }
            self.run_command(command);
        }
    }

    pub fn mount(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            for mode in ToolMode::ALL {
                tool_button(ui, mode.name(), mode, &mut self.engine);
            }
            ui.separator();
            if ui.button("Zoom In").clicked() {
                self.run_command(ToolCommand::ZoomIn);
            }
            if ui.button("Zoom Out").clicked() {
                self.run_command(ToolCommand::ZoomOut);
            }
            if ui.button("Export PNG").clicked() {
                self.run_command(ToolCommand::Export);
            }
        });
        self.canvas_ui(ui);
        self.text_prompt_ui(ui.ctx());
    }

    fn canvas_ui(&mut self, ui: &mut egui::Ui) {
        let ctx = ui.ctx().clone();
        let (outer, _) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
        let rect = egui::Rect::from_min_max(outer.min, outer.max - egui::Vec2::splat(SCROLLBAR_WIDTH));
        let response = ui.interact(rect, ui.id().with("canvas"), egui::Sense::click_and_drag());
        let origin = rect.min;
        self.engine.set_viewport_size(rect.size());

        let (focused, pointer, primary) = ctx.input(|i| {
            (
                i.focused,
                i.pointer.interact_pos(),
                (
                    i.pointer.primary_pressed(),
                    i.pointer.primary_down(),
                    i.pointer.primary_released(),
                ),
            )
        });
        let (primary_pressed, primary_down, primary_released) = primary;
        let (pan_pressed, pan_down) = ctx.input(|i| {
            let buttons = [egui::PointerButton::Secondary, egui::PointerButton::Middle];
            (
                buttons.iter().any(|b| i.pointer.button_pressed(*b)),
                buttons.iter().any(|b| i.pointer.button_down(*b)),
            )
        });

        // Releases can be lost to focus changes or other widgets.
        let drag_lost = self.engine.drag().is_some() && !primary_down && !primary_released;
        if self.engine.is_gesture_active() && (!focused || drag_lost) {
            self.engine.abandon_gesture();
        }

        let modal = self.text_prompt.is_some() || self.command_palette.open;
        let hovered = response.hovered() && !modal;

        if let Some(screen) = pointer {
            let scene_pos = self.engine.view().screen_to_scene(origin, screen);
            if hovered && primary_pressed {
                match self.engine.pointer_down(scene_pos) {
                    PointerOutcome::LabelRequested(shape) => self.open_text_prompt(shape),
                    PointerOutcome::Created(_) | PointerOutcome::Deleted(_) => {
                        self.status = None;
                    }
                    PointerOutcome::DragStarted(_) | PointerOutcome::Idle => {}
                }
            } else if primary_down && self.engine.drag().is_some() {
                self.engine.pointer_drag(scene_pos);
            }

            if hovered && pan_pressed {
                self.engine.pan_start(screen);
            } else if pan_down && self.engine.is_panning() {
                self.engine.pan_move(screen);
            }
        }
        if primary_released {
            self.engine.pointer_up();
        }
        if self.engine.is_panning() && !pan_down {
            self.engine.pan_end();
        }

        if hovered {
            let wheel = ctx.input(|i| i.smooth_scroll_delta);
            if wheel != egui::Vec2::ZERO {
                self.engine.scroll_by(-wheel);
            }
            ctx.set_cursor_icon(match self.engine.tool() {
                ToolMode::Pointer => egui::CursorIcon::Default,
                ToolMode::Text => egui::CursorIcon::Text,
                _ => egui::CursorIcon::Crosshair,
            });
        }

        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.engine.view());
        draw_scene(&painter, origin, &self.engine, self.label_family_ready);

        let vertical = egui::Rect::from_min_max(egui::pos2(rect.max.x, rect.min.y), egui::pos2(outer.max.x, rect.max.y));
        let horizontal = egui::Rect::from_min_max(egui::pos2(rect.min.x, rect.max.y), egui::pos2(rect.max.x, outer.max.y));
        self.scrollbar_ui(ui, horizontal, 0);
        self.scrollbar_ui(ui, vertical, 1);

        if self.engine.is_gesture_active() {
            ctx.request_repaint();
        }
    }

    // Scrollbar along `axis` (0 horizontal, 1 vertical). Dragging the thumb
    // scrolls proportionally; clicking the track pages by one viewport.
    fn scrollbar_ui(&mut self, ui: &egui::Ui, track: egui::Rect, axis: usize) {
        let response = ui.interact(track, ui.id().with(("scrollbar", axis)), egui::Sense::click_and_drag());
        let view = self.engine.view();
        let (lo, hi) = view.scroll_extent(axis);
        let track_len = track.size()[axis];
        let (start, len) = view.thumb(axis);

        let mut thumb = track;
        thumb.min[axis] = track.min[axis] + start * track_len;
        thumb.max[axis] = thumb.min[axis] + (len * track_len).max(SCROLLBAR_WIDTH);

        if track_len > 0.0 {
            let mut delta = egui::Vec2::ZERO;
            if response.dragged() {
                delta[axis] = response.drag_delta()[axis] * (hi - lo) / track_len;
            } else if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let page = view.viewport_size[axis];
                    if pos[axis] < thumb.min[axis] {
                        delta[axis] = -page;
                    } else if pos[axis] > thumb.max[axis] {
                        delta[axis] = page;
                    }
                }
            }
            if delta != egui::Vec2::ZERO {
                self.engine.scroll_by(delta);
            }
        }

        let visuals = ui.visuals();
        let thumb_color = if response.dragged() || response.hovered() {
            visuals.widgets.hovered.bg_fill
        } else {
            visuals.widgets.inactive.bg_fill
        };
        let painter = ui.painter_at(track);
        painter.rect_filled(track, 0.0, visuals.extreme_bg_color);
        painter.rect_filled(thumb.shrink(2.0), 3.0, thumb_color);
    }
}
