use eframe::egui;

use crate::model::{EntityId, LineKind, ShapeKind};

use super::geometry::{deletion_target, fit_shape_to_label, refresh_labels, scale_scene, topmost_shape, translate_shape};
use super::{CanvasEngine, DragState, PointerOutcome, ToolMode};

impl CanvasEngine {
    pub fn pointer_down(&mut self, pos: egui::Pos2) -> PointerOutcome {
        if self.drag.is_some() {
            // The release of the previous gesture never arrived.
            self.abandon_gesture();
        }
        match self.tool {
            ToolMode::Pointer => match topmost_shape(&self.scene, pos) {
                Some(id) => {
                    self.begin_drag(id, pos);
                    PointerOutcome::DragStarted(id)
                }
                None => PointerOutcome::Idle,
            },
            ToolMode::Rectangle | ToolMode::Oval | ToolMode::Diamond => {
                let kind = match self.tool {
                    ToolMode::Rectangle => ShapeKind::Rectangle,
                    ToolMode::Oval => ShapeKind::Oval,
                    _ => ShapeKind::Diamond,
                };
                let id = self.scene.add_shape(kind, pos);
                log::debug!("placed {kind:?} {id} at ({:.1}, {:.1})", pos.x, pos.y);
                self.update_scroll_region();
                PointerOutcome::Created(id)
            }
            ToolMode::Line | ToolMode::Arrow => {
                let kind = if self.tool == ToolMode::Arrow {
                    LineKind::Arrow
                } else {
                    LineKind::Line
                };
                let id = self.scene.add_line(kind, pos);
                log::debug!("started {kind:?} {id}");
                self.begin_drag(id, pos);
                self.update_scroll_region();
                PointerOutcome::Created(id)
            }
            ToolMode::Delete => match self.delete_at(pos) {
                Some(id) => PointerOutcome::Deleted(id),
                None => PointerOutcome::Idle,
            },
            ToolMode::Text => match topmost_shape(&self.scene, pos) {
                Some(id) => PointerOutcome::LabelRequested(id),
                None => PointerOutcome::Idle,
            },
        }
    }

    fn begin_drag(&mut self, entity: EntityId, pos: egui::Pos2) {
        self.drag = Some(DragState {
            active_tool: self.tool,
            anchor: pos,
            entity,
            last_pointer: pos,
        });
    }

    pub fn pointer_drag(&mut self, pos: egui::Pos2) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        match drag.active_tool {
            ToolMode::Pointer => {
                let delta = pos - drag.last_pointer;
                drag.anchor = pos;
                drag.last_pointer = pos;
                let entity = drag.entity;
                translate_shape(&mut self.scene, entity, delta);
                self.update_scroll_region();
            }
            ToolMode::Line | ToolMode::Arrow => {
                drag.last_pointer = pos;
                let entity = drag.entity;
                if let Some(line) = self.scene.line_mut(entity) {
                    line.end = pos;
                }
                self.update_scroll_region();
            }
            _ => {}
        }
    }

    // Primary button released. No snapping is applied.
    pub fn pointer_up(&mut self) {
        self.drag = None;
        self.confine_view();
    }

    // Clears every transient gesture, for focus loss or a release that
    // never arrived. Geometry is left where the last move put it.
    pub fn abandon_gesture(&mut self) {
        if self.drag.is_some() || self.pan_last.is_some() {
            log::debug!("gesture abandoned");
        }
        self.drag = None;
        self.pan_last = None;
        self.confine_view();
    }

    pub fn pan_start(&mut self, screen: egui::Pos2) {
        self.pan_last = Some(screen);
    }

    // Scrolls by the pixel delta since the last pan event; content follows
    // the pointer.
    pub fn pan_move(&mut self, screen: egui::Pos2) {
        let Some(last) = self.pan_last else {
            return;
        };
        self.view.scroll_by(last - screen);
        self.pan_last = Some(screen);
    }

    pub fn pan_end(&mut self) {
        self.pan_last = None;
    }

    pub fn scroll_by(&mut self, delta: egui::Vec2) {
        self.view.scroll_by(delta);
    }

    // Scales the whole scene about the origin. Factors accumulate and are
    // not clamped; non-finite or non-positive factors are ignored.
    pub fn zoom(&mut self, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            log::warn!("ignoring zoom factor {factor}");
            return;
        }
        self.view.zoom_factor *= factor;
        scale_scene(&mut self.scene, factor);
        refresh_labels(&mut self.scene, self.measure.as_ref(), self.view.zoom_factor);
        self.update_scroll_region();
        log::debug!("zoom factor now {:.3}", self.view.zoom_factor);
    }

    // Sets the text of `shape`'s label, creating it if needed, and refits
    // the shape. Empty text and stale handles leave the scene unchanged.
    pub fn attach_label(&mut self, shape: EntityId, text: &str) -> bool {
        if text.is_empty() || self.scene.shape(shape).is_none() {
            return false;
        }
        if self.scene.set_label_text(shape, text).is_none() {
            return false;
        }
        fit_shape_to_label(
            &mut self.scene,
            shape,
            self.measure.as_ref(),
            self.view.zoom_factor,
        );
        self.update_scroll_region();
        true
    }

    // Deletes the first entity under `pos`, shapes before lines before
    // labels. Returns the removed handle.
    pub fn delete_at(&mut self, pos: egui::Pos2) -> Option<EntityId> {
        let id = deletion_target(&self.scene, pos)?;
        self.delete(id)
    }

    pub fn delete(&mut self, id: EntityId) -> Option<EntityId> {
        let kind = self.scene.remove(id)?;
        if self.drag.is_some_and(|d| d.entity == id) {
            self.drag = None;
        }
        log::debug!("deleted {kind:?} {id}");
        self.update_scroll_region();
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::engine;
    use super::super::ToolCommand;
    use super::*;
    use crate::constants;

    fn place(engine: &mut CanvasEngine, tool: ToolMode, at: egui::Pos2) -> EntityId {
        engine.set_tool(tool);
        match engine.pointer_down(at) {
            PointerOutcome::Created(id) => {
                engine.pointer_up();
                id
            }
            other => panic!("expected a new entity, got {other:?}"),
        }
    }

    fn assert_near(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-3, "{a} != {b}");
    }

    #[test]
    fn rectangle_is_placed_with_default_size() {
        let mut engine = engine();
        let id = place(&mut engine, ToolMode::Rectangle, egui::pos2(100.0, 100.0));
        let bounds = engine.scene().shape(id).unwrap().bounds();
        assert_eq!(bounds.min, egui::pos2(50.0, 75.0));
        assert_eq!(bounds.max, egui::pos2(150.0, 125.0));
        // The tool stays selected after placing.
        assert_eq!(engine.tool(), ToolMode::Rectangle);
    }

    #[test]
    fn labelling_refits_around_the_same_centroid() {
        let mut engine = engine();
        let id = place(&mut engine, ToolMode::Rectangle, egui::pos2(100.0, 100.0));
        engine.set_tool(ToolMode::Text);
        assert_eq!(
            engine.pointer_down(egui::pos2(100.0, 100.0)),
            PointerOutcome::LabelRequested(id)
        );
        engine.pointer_up();
        assert!(engine.attach_label(id, "Start"));
        let shape = engine.scene().shape(id).unwrap();
        assert_eq!(shape.center, egui::pos2(100.0, 100.0));
        let size = shape.bounds().size();
        // "Start" at 12px: 36 x 14.4 text, padded to 56 x 34.4, fitted 2:1.
        assert_near(size.x, 68.8);
        assert_near(size.y, 34.4);
        let label = engine.scene().label_of(id).unwrap();
        assert_eq!(label.text, "Start");
        assert_eq!(label.position, egui::pos2(100.0, 100.0));
    }

    #[test]
    fn diamond_uses_its_own_default_extents() {
        let mut engine = engine();
        let id = place(&mut engine, ToolMode::Diamond, egui::pos2(0.0, 0.0));
        let pts = engine.scene().shape(id).unwrap().diamond_points();
        assert_eq!(
            pts,
            [
                egui::pos2(0.0, -30.0),
                egui::pos2(50.0, 0.0),
                egui::pos2(0.0, 30.0),
                egui::pos2(-50.0, 0.0)
            ]
        );
    }

    #[test]
    fn empty_text_is_a_no_op() {
        let mut engine = engine();
        let id = place(&mut engine, ToolMode::Oval, egui::pos2(10.0, 10.0));
        assert!(engine.attach_label(id, "First"));
        let before = engine.scene().shape(id).unwrap().bounds();
        assert!(!engine.attach_label(id, ""));
        assert_eq!(engine.scene().label_of(id).unwrap().text, "First");
        assert_eq!(engine.scene().shape(id).unwrap().bounds(), before);
    }

    #[test]
    fn text_tool_ignores_empty_canvas() {
        let mut engine = engine();
        engine.set_tool(ToolMode::Text);
        assert_eq!(engine.pointer_down(egui::pos2(5.0, 5.0)), PointerOutcome::Idle);
    }

    #[test]
    fn pointer_drag_moves_shape_and_label_incrementally() {
        let mut engine = engine();
        let id = place(&mut engine, ToolMode::Rectangle, egui::pos2(100.0, 100.0));
        engine.attach_label(id, "Go");
        engine.set_tool(ToolMode::Pointer);
        assert_eq!(
            engine.pointer_down(egui::pos2(110.0, 105.0)),
            PointerOutcome::DragStarted(id)
        );
        engine.pointer_drag(egui::pos2(120.0, 105.0));
        engine.pointer_drag(egui::pos2(130.0, 125.0));
        engine.pointer_up();
        assert!(engine.drag().is_none());
        assert_eq!(engine.scene().shape(id).unwrap().center, egui::pos2(120.0, 120.0));
        assert_eq!(
            engine.scene().label_of(id).unwrap().position,
            egui::pos2(120.0, 120.0)
        );
    }

    #[test]
    fn pointer_on_empty_canvas_starts_nothing() {
        let mut engine = engine();
        place(&mut engine, ToolMode::Rectangle, egui::pos2(100.0, 100.0));
        engine.set_tool(ToolMode::Pointer);
        assert_eq!(engine.pointer_down(egui::pos2(400.0, 400.0)), PointerOutcome::Idle);
        engine.pointer_drag(egui::pos2(450.0, 450.0));
        assert_eq!(
            engine.scene().shapes()[0].center,
            egui::pos2(100.0, 100.0)
        );
    }

    #[test]
    fn line_drag_moves_only_the_terminal_point() {
        let mut engine = engine();
        engine.set_tool(ToolMode::Arrow);
        let PointerOutcome::Created(id) = engine.pointer_down(egui::pos2(10.0, 10.0)) else {
            panic!("arrow not created");
        };
        let line = engine.scene().line(id).unwrap();
        assert!(line.is_arrow());
        assert_eq!(line.start, line.end);
        engine.pointer_drag(egui::pos2(50.0, 20.0));
        engine.pointer_drag(egui::pos2(90.0, 40.0));
        engine.pointer_up();
        let line = engine.scene().line(id).unwrap();
        assert_eq!(line.start, egui::pos2(10.0, 10.0));
        assert_eq!(line.end, egui::pos2(90.0, 40.0));
    }

    #[test]
    fn switching_tools_drops_the_gesture() {
        let mut engine = engine();
        let id = place(&mut engine, ToolMode::Rectangle, egui::pos2(100.0, 100.0));
        engine.set_tool(ToolMode::Pointer);
        engine.pointer_down(egui::pos2(100.0, 100.0));
        assert_eq!(engine.drag().unwrap().active_tool, ToolMode::Pointer);
        engine.set_tool(ToolMode::Line);
        assert!(engine.drag().is_none());
        engine.pointer_drag(egui::pos2(200.0, 200.0));
        assert_eq!(engine.scene().shape(id).unwrap().center, egui::pos2(100.0, 100.0));
    }

    #[test]
    fn abandoned_gesture_stops_further_moves() {
        let mut engine = engine();
        let id = place(&mut engine, ToolMode::Oval, egui::pos2(100.0, 100.0));
        engine.set_tool(ToolMode::Pointer);
        engine.pointer_down(egui::pos2(100.0, 100.0));
        engine.pointer_drag(egui::pos2(105.0, 100.0));
        engine.abandon_gesture();
        assert!(!engine.is_gesture_active());
        engine.pointer_drag(egui::pos2(300.0, 300.0));
        assert_eq!(engine.scene().shape(id).unwrap().center, egui::pos2(105.0, 100.0));
    }

    #[test]
    fn delete_cascades_to_the_label() {
        let mut engine = engine();
        let id = place(&mut engine, ToolMode::Rectangle, egui::pos2(100.0, 100.0));
        engine.attach_label(id, "Gone");
        engine.set_tool(ToolMode::Delete);
        assert_eq!(engine.pointer_down(egui::pos2(100.0, 100.0)), PointerOutcome::Deleted(id));
        assert!(engine.scene().is_empty());
    }

    #[test]
    fn delete_removes_one_entity_per_click() {
        let mut engine = engine();
        let below = place(&mut engine, ToolMode::Rectangle, egui::pos2(100.0, 100.0));
        let above = place(&mut engine, ToolMode::Rectangle, egui::pos2(110.0, 100.0));
        engine.set_tool(ToolMode::Delete);
        assert_eq!(engine.pointer_down(egui::pos2(105.0, 100.0)), PointerOutcome::Deleted(above));
        assert!(engine.scene().shape(below).is_some());
    }

    #[test]
    fn delete_on_empty_canvas_changes_nothing() {
        let mut engine = engine();
        let id = place(&mut engine, ToolMode::Oval, egui::pos2(100.0, 100.0));
        let region = engine.view().scroll_region;
        engine.set_tool(ToolMode::Delete);
        assert_eq!(engine.pointer_down(egui::pos2(600.0, 600.0)), PointerOutcome::Idle);
        assert!(engine.scene().shape(id).is_some());
        assert_eq!(engine.scene().entity_count(), 1);
        assert_eq!(engine.view().scroll_region, region);
    }

    #[test]
    fn deleting_a_stale_handle_is_harmless() {
        let mut engine = engine();
        let id = place(&mut engine, ToolMode::Line, egui::pos2(0.0, 0.0));
        assert_eq!(engine.delete(id), Some(id));
        assert_eq!(engine.delete(id), None);
        assert!(!engine.attach_label(id, "x"));
    }

    #[test]
    fn zoom_round_trip_restores_geometry() {
        let mut engine = engine();
        let a = place(&mut engine, ToolMode::Rectangle, egui::pos2(100.0, 80.0));
        let b = place(&mut engine, ToolMode::Diamond, egui::pos2(300.0, 240.0));
        engine.attach_label(a, "Start");
        let line = place(&mut engine, ToolMode::Arrow, egui::pos2(20.0, 30.0));
        let before_a = engine.scene().shape(a).unwrap().bounds();
        let before_b = engine.scene().shape(b).unwrap().bounds();
        let before_font = engine.scene().label_of(a).unwrap().rendered_font_size(1.0);

        engine.zoom(1.2);
        let zoomed = engine.scene().shape(a).unwrap().bounds();
        assert_near(zoomed.min.x, before_a.min.x * 1.2);
        assert_eq!(
            engine.scene().label_of(a).unwrap().rendered_font_size(engine.view().zoom_factor),
            14.0
        );

        engine.zoom(1.0 / 1.2);
        assert_near(engine.view().zoom_factor, 1.0);
        for (id, before) in [(a, before_a), (b, before_b)] {
            let after = engine.scene().shape(id).unwrap().bounds();
            assert_near(after.min.x, before.min.x);
            assert_near(after.min.y, before.min.y);
            assert_near(after.max.x, before.max.x);
            assert_near(after.max.y, before.max.y);
        }
        let font = engine
            .scene()
            .label_of(a)
            .unwrap()
            .rendered_font_size(engine.view().zoom_factor);
        assert_eq!(font, before_font);
        assert_near(engine.scene().line(line).unwrap().start.x, 20.0);
    }

    #[test]
    fn zoom_buttons_accumulate_multiplicatively() {
        let mut engine = engine();
        engine.apply_command(ToolCommand::ZoomIn);
        engine.apply_command(ToolCommand::ZoomIn);
        engine.apply_command(ToolCommand::ZoomOut);
        assert_near(engine.view().zoom_factor, 1.2 * 1.2 * 0.8);
    }

    #[test]
    fn invalid_zoom_factors_are_ignored() {
        let mut engine = engine();
        place(&mut engine, ToolMode::Rectangle, egui::pos2(100.0, 100.0));
        engine.zoom(0.0);
        engine.zoom(-2.0);
        engine.zoom(f32::NAN);
        assert_eq!(engine.view().zoom_factor, 1.0);
        assert_eq!(engine.scene().shapes()[0].center, egui::pos2(100.0, 100.0));
    }

    #[test]
    fn extreme_zoom_out_keeps_shapes_positive() {
        let mut engine = engine();
        let id = place(&mut engine, ToolMode::Oval, egui::pos2(100.0, 100.0));
        for _ in 0..200 {
            engine.zoom(constants::ZOOM_OUT_FACTOR);
        }
        let size = engine.scene().shape(id).unwrap().bounds().size();
        assert!(size.x > 0.0 && size.y > 0.0);
    }

    #[test]
    fn every_mutation_keeps_content_inside_the_scroll_region() {
        let mut engine = engine();
        let check = |engine: &CanvasEngine| {
            let inner = engine.view().scroll_region.shrink(constants::SCROLL_MARGIN - 1.0);
            let scene = engine.scene();
            for s in scene.shapes() {
                assert!(inner.contains_rect(s.visual_bounds()));
            }
            for l in scene.lines() {
                assert!(inner.contains_rect(l.visual_bounds()));
            }
            for l in scene.labels() {
                assert!(inner.contains_rect(l.bounds()));
            }
        };
        let a = place(&mut engine, ToolMode::Rectangle, egui::pos2(100.0, 100.0));
        check(&engine);
        place(&mut engine, ToolMode::Oval, egui::pos2(-400.0, 900.0));
        check(&engine);
        engine.set_tool(ToolMode::Line);
        engine.pointer_down(egui::pos2(0.0, 0.0));
        engine.pointer_drag(egui::pos2(1500.0, -300.0));
        engine.pointer_up();
        check(&engine);
        engine.attach_label(a, "a label long enough to grow the rectangle");
        check(&engine);
        engine.set_tool(ToolMode::Pointer);
        engine.pointer_down(egui::pos2(100.0, 100.0));
        engine.pointer_drag(egui::pos2(-2000.0, 100.0));
        engine.pointer_up();
        check(&engine);
        engine.zoom(1.2);
        check(&engine);
    }

    #[test]
    fn scroll_region_shrinks_after_deleting_the_extremum() {
        let mut engine = engine();
        place(&mut engine, ToolMode::Rectangle, egui::pos2(100.0, 100.0));
        let far = place(&mut engine, ToolMode::Oval, egui::pos2(900.0, 700.0));
        engine.zoom(1.2);
        engine.zoom(1.2);
        let before = engine.view().scroll_region;
        let center = engine.scene().shape(far).unwrap().center;
        engine.set_tool(ToolMode::Delete);
        assert_eq!(engine.pointer_down(center), PointerOutcome::Deleted(far));
        let after = engine.view().scroll_region;
        assert!(after.max.x < before.max.x);
        assert!(after.max.y < before.max.y);
        let far_extent = 900.0 * 1.44;
        assert!(after.max.x < far_extent);
    }

    #[test]
    fn pan_scrolls_opposite_to_the_pointer_and_rebases() {
        let mut engine = engine();
        engine.scroll_by(egui::vec2(500.0, 500.0));
        engine.pan_start(egui::pos2(100.0, 100.0));
        engine.pan_move(egui::pos2(130.0, 90.0));
        assert_eq!(engine.view().scroll_offset, egui::vec2(470.0, 510.0));
        engine.pan_move(egui::pos2(140.0, 90.0));
        assert_eq!(engine.view().scroll_offset, egui::vec2(460.0, 510.0));
        engine.pan_end();
        engine.pan_move(egui::pos2(0.0, 0.0));
        assert_eq!(engine.view().scroll_offset, egui::vec2(460.0, 510.0));
    }

    fn visible(engine: &CanvasEngine) -> egui::Rect {
        let view = engine.view();
        egui::Rect::from_min_size(view.scroll_offset.to_pos2(), view.viewport_size)
    }

    #[test]
    fn content_dragged_out_of_view_can_be_scrolled_back() {
        let mut engine = engine();
        engine.scroll_by(egui::vec2(2000.0, 2000.0));
        place(&mut engine, ToolMode::Rectangle, egui::pos2(2400.0, 2300.0));
        engine.set_tool(ToolMode::Pointer);
        let id = match engine.pointer_down(egui::pos2(2400.0, 2300.0)) {
            PointerOutcome::DragStarted(id) => id,
            other => panic!("expected a drag, got {other:?}"),
        };
        engine.pointer_drag(egui::pos2(1700.0, 2300.0));
        // No view movement while the shape is held.
        assert_eq!(engine.view().scroll_offset, egui::vec2(2000.0, 2000.0));
        engine.pointer_up();

        let bounds = engine.scene().shape(id).unwrap().bounds();
        assert!(visible(&engine).contains_rect(bounds));
        for _ in 0..10 {
            engine.scroll_by(egui::vec2(-500.0, 0.0));
            assert!(visible(&engine).contains_rect(bounds));
        }
        for _ in 0..10 {
            engine.pan_start(egui::pos2(100.0, 100.0));
            engine.pan_move(egui::pos2(600.0, 100.0));
            engine.pan_end();
            assert!(visible(&engine).contains_rect(bounds));
        }
    }

    #[test]
    fn placing_near_the_origin_leaves_the_view_alone() {
        let mut engine = engine();
        place(&mut engine, ToolMode::Rectangle, egui::pos2(100.0, 100.0));
        place(&mut engine, ToolMode::Diamond, egui::pos2(700.0, 500.0));
        assert_eq!(engine.view().scroll_offset, egui::Vec2::ZERO);
    }

    #[test]
    fn pan_is_independent_of_the_tool() {
        let mut engine = engine();
        engine.scroll_by(egui::vec2(100.0, 100.0));
        engine.set_tool(ToolMode::Delete);
        engine.pan_start(egui::pos2(0.0, 0.0));
        engine.pan_move(egui::pos2(-10.0, -10.0));
        assert_eq!(engine.view().scroll_offset, egui::vec2(110.0, 110.0));
        assert_eq!(engine.tool(), ToolMode::Delete);
    }
}
