use eframe::egui;

use crate::constants;
use crate::model::{EntityId, Scene};

mod geometry;
mod interaction;
pub mod raster;
pub mod text_metrics;

use text_metrics::TextMeasure;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolMode {
    Pointer,
    Rectangle,
    Oval,
    Diamond,
    Line,
    Arrow,
    Delete,
    Text,
}

impl ToolMode {
    pub const ALL: [ToolMode; 8] = [
        ToolMode::Pointer,
        ToolMode::Rectangle,
        ToolMode::Oval,
        ToolMode::Diamond,
        ToolMode::Line,
        ToolMode::Arrow,
        ToolMode::Delete,
        ToolMode::Text,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolMode::Pointer => "Pointer",
            ToolMode::Rectangle => "Rectangle",
            ToolMode::Oval => "Oval",
            ToolMode::Diamond => "Diamond",
            ToolMode::Line => "Line",
            ToolMode::Arrow => "Arrow",
            ToolMode::Delete => "Delete",
            ToolMode::Text => "Text",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolCommand {
    Select(ToolMode),
    ZoomIn,
    ZoomOut,
    Export,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandEffect {
    None,
    // The host must pick a path and call `CanvasEngine::export_png`.
    ExportRequested,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerOutcome {
    Idle,
    DragStarted(EntityId),
    Created(EntityId),
    Deleted(EntityId),
    // The host must prompt for text and call `CanvasEngine::attach_label`.
    LabelRequested(EntityId),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragState {
    pub active_tool: ToolMode,
    pub anchor: egui::Pos2,
    pub entity: EntityId,
    pub last_pointer: egui::Pos2,
}

#[derive(Clone, Copy, Debug)]
pub struct View {
    pub zoom_factor: f32,
    pub scroll_region: egui::Rect,
    // Scene coordinate shown at the canvas widget's top-left corner.
    pub scroll_offset: egui::Vec2,
    pub viewport_size: egui::Vec2,
}

impl Default for View {
    fn default() -> Self {
        let (x0, y0, x1, y1) = constants::INITIAL_SCROLL_REGION;
        Self {
            zoom_factor: 1.0,
            scroll_region: egui::Rect::from_min_max(egui::pos2(x0, y0), egui::pos2(x1, y1)),
            scroll_offset: egui::Vec2::ZERO,
            viewport_size: egui::Vec2::ZERO,
        }
    }
}

impl View {
    pub fn screen_to_scene(&self, origin: egui::Pos2, screen: egui::Pos2) -> egui::Pos2 {
        screen - origin.to_vec2() + self.scroll_offset
    }

    pub fn scene_to_screen(&self, origin: egui::Pos2, scene: egui::Pos2) -> egui::Pos2 {
        scene + origin.to_vec2() - self.scroll_offset
    }

    pub fn scroll_by(&mut self, delta: egui::Vec2) {
        self.scroll_offset += delta;
        self.confine();
    }

    // Keeps the viewport inside the scroll region on axes where the region
    // is larger. On smaller axes the content inside the margin stays fully
    // on screen.
    pub fn confine(&mut self) {
        let region = self.scroll_region;
        for axis in 0..2 {
            let (lo, hi) = (region.min[axis], region.max[axis]);
            let span = self.viewport_size[axis];
            let offset = self.scroll_offset[axis];
            self.scroll_offset[axis] = if hi - lo >= span {
                offset.clamp(lo, hi - span)
            } else {
                let (lo, hi) = (lo + constants::SCROLL_MARGIN, hi - constants::SCROLL_MARGIN);
                offset.clamp((hi - span).min(lo), lo)
            };
        }
    }

    // Scrollable range along `axis`: the region, widened to whatever is on
    // screen.
    pub fn scroll_extent(&self, axis: usize) -> (f32, f32) {
        let start = self.scroll_offset[axis];
        let end = start + self.viewport_size[axis];
        (
            self.scroll_region.min[axis].min(start),
            self.scroll_region.max[axis].max(end),
        )
    }

    // Scrollbar thumb as `(start, length)` fractions of the track.
    pub fn thumb(&self, axis: usize) -> (f32, f32) {
        let (lo, hi) = self.scroll_extent(axis);
        let total = hi - lo;
        if total <= 0.0 {
            return (0.0, 1.0);
        }
        (
            (self.scroll_offset[axis] - lo) / total,
            (self.viewport_size[axis] / total).min(1.0),
        )
    }
}

pub struct CanvasEngine {
    scene: Scene,
    tool: ToolMode,
    drag: Option<DragState>,
    pan_last: Option<egui::Pos2>,
    view: View,
    measure: Box<dyn TextMeasure>,
}

impl CanvasEngine {
    pub fn new(measure: Box<dyn TextMeasure>) -> Self {
        Self {
            scene: Scene::default(),
            tool: ToolMode::Pointer,
            drag: None,
            pan_last: None,
            view: View::default(),
            measure,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn tool(&self) -> ToolMode {
        self.tool
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn is_gesture_active(&self) -> bool {
        self.drag.is_some() || self.pan_last.is_some()
    }

    pub fn is_panning(&self) -> bool {
        self.pan_last.is_some()
    }

    pub fn set_measure(&mut self, measure: Box<dyn TextMeasure>) {
        self.measure = measure;
        geometry::refresh_labels(&mut self.scene, self.measure.as_ref(), self.view.zoom_factor);
        let ids: Vec<EntityId> = self.scene.shapes().iter().map(|s| s.id).collect();
        for id in ids {
            geometry::fit_shape_to_label(
                &mut self.scene,
                id,
                self.measure.as_ref(),
                self.view.zoom_factor,
            );
        }
        self.update_scroll_region();
    }

    pub fn set_viewport_size(&mut self, size: egui::Vec2) {
        if self.view.viewport_size != size {
            self.view.viewport_size = size;
            self.confine_view();
        }
    }

    pub fn apply_command(&mut self, command: ToolCommand) -> CommandEffect {
        match command {
            ToolCommand::Select(tool) => {
                self.set_tool(tool);
                CommandEffect::None
            }
            ToolCommand::ZoomIn => {
                self.zoom(constants::ZOOM_IN_FACTOR);
                CommandEffect::None
            }
            ToolCommand::ZoomOut => {
                self.zoom(constants::ZOOM_OUT_FACTOR);
                CommandEffect::None
            }
            ToolCommand::Export => CommandEffect::ExportRequested,
        }
    }

    // Switches tool. A gesture still in flight is dropped so it cannot be
    // reinterpreted under the new mode.
    pub fn set_tool(&mut self, tool: ToolMode) {
        if self.drag.is_some() {
            self.abandon_gesture();
        }
        if self.tool != tool {
            log::debug!("tool changed: {} -> {}", self.tool.name(), tool.name());
        }
        self.tool = tool;
    }

    pub(crate) fn update_scroll_region(&mut self) {
        if let Some(region) = geometry::scroll_region_for(&self.scene) {
            self.view.scroll_region = region;
            self.confine_view();
        }
    }

    // The view stays put under a drag and catches up on release.
    pub(crate) fn confine_view(&mut self) {
        if self.drag.is_none() {
            self.view.confine();
        }
    }
}
