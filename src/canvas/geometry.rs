use eframe::egui;

use crate::constants;
use crate::model::{self, EntityId, Scene, Shape, ShapeKind};

use super::text_metrics::{TextMeasure, measure_label};

// Refits a labelled shape around its text at a 2:1 aspect, keeping its
// centroid, and re-centres the label. Shapes without a label are untouched.
pub(super) fn fit_shape_to_label(
    scene: &mut Scene,
    shape_id: EntityId,
    measure: &dyn TextMeasure,
    zoom_factor: f32,
) -> bool {
    let Some((label_id, center)) = scene
        .shape(shape_id)
        .and_then(|s| s.label.map(|l| (l, s.center)))
    else {
        return false;
    };
    let Some(label) = scene.label(label_id) else {
        return false;
    };
    let font_size = label.rendered_font_size(zoom_factor);
    let text_size = measure_label(measure, &label.text, font_size);
    let half = fitted_half_extents(text_size);

    if let Some(shape) = scene.shape_mut(shape_id) {
        shape.set_half_extents(half);
    }
    if let Some(label) = scene.label_mut(label_id) {
        label.position = center;
        label.extent = text_size - egui::Vec2::splat(constants::LABEL_PADDING);
    }
    true
}

// `width = max(tw, th * aspect)`, `height = width / aspect`, halved.
pub(super) fn fitted_half_extents(padded_text: egui::Vec2) -> egui::Vec2 {
    let aspect = constants::LABEL_FIT_ASPECT;
    let width = padded_text.x.max(padded_text.y * aspect);
    let height = width / aspect;
    egui::vec2(width, height) * 0.5
}

pub(super) fn translate_shape(scene: &mut Scene, shape_id: EntityId, delta: egui::Vec2) {
    let Some(shape) = scene.shape_mut(shape_id) else {
        return;
    };
    shape.center += delta;
    let label_id = shape.label;
    if let Some(label) = label_id.and_then(|id| scene.label_mut(id)) {
        label.position += delta;
    }
}

pub(super) fn scale_scene(scene: &mut Scene, factor: f32) {
    for shape in scene.shapes_mut() {
        shape.center = (shape.center.to_vec2() * factor).to_pos2();
        let half = shape.half_extents() * factor;
        shape.set_half_extents(half);
    }
    for line in scene.lines_mut() {
        line.start = (line.start.to_vec2() * factor).to_pos2();
        line.end = (line.end.to_vec2() * factor).to_pos2();
    }
    for label in scene.labels_mut() {
        label.position = (label.position.to_vec2() * factor).to_pos2();
    }
}

// Re-measures every label at its rendered size and pins it to its owner's
// centroid. Shape sizes are not refitted.
pub(super) fn refresh_labels(scene: &mut Scene, measure: &dyn TextMeasure, zoom_factor: f32) {
    let centers: Vec<(EntityId, egui::Pos2)> =
        scene.shapes().iter().map(|s| (s.id, s.center)).collect();
    for label in scene.labels_mut() {
        let size = label.rendered_font_size(zoom_factor);
        label.extent = measure.measure(&label.text, size);
        if let Some((_, c)) = centers.iter().find(|(id, _)| *id == label.owner) {
            label.position = *c;
        }
    }
}

// Content bounds grown by the scroll margin, or `None` for an empty scene.
pub(super) fn scroll_region_for(scene: &Scene) -> Option<egui::Rect> {
    scene
        .content_bounds()
        .map(|r| r.expand(constants::SCROLL_MARGIN))
}

fn tolerance_window(p: egui::Pos2) -> egui::Rect {
    egui::Rect::from_center_size(p, egui::Vec2::splat(constants::HIT_TOLERANCE * 2.0))
}

pub(super) fn hit_test_shape(shape: &Shape, p: egui::Pos2) -> bool {
    let slack = constants::HIT_TOLERANCE + constants::SHAPE_OUTLINE_WIDTH * 0.5;
    let half = shape.half_extents();
    let v = p - shape.center;
    match shape.kind {
        ShapeKind::Rectangle => shape.visual_bounds().intersects(tolerance_window(p)),
        ShapeKind::Oval => {
            let rx = half.x + slack;
            let ry = half.y + slack;
            let dx = v.x / rx;
            let dy = v.y / ry;
            dx * dx + dy * dy <= 1.0
        }
        ShapeKind::Diamond => {
            let rx = half.x + slack;
            let ry = half.y + slack;
            v.x.abs() / rx + v.y.abs() / ry <= 1.0
        }
    }
}

pub(super) fn hit_test_line(line: &model::Line, p: egui::Pos2) -> bool {
    model::distance_to_segment(p, line.start, line.end)
        <= constants::HIT_TOLERANCE + constants::CONNECTOR_WIDTH * 0.5
}

pub(super) fn hit_test_label(label: &model::Label, p: egui::Pos2) -> bool {
    label.bounds().intersects(tolerance_window(p))
}

pub(super) fn topmost_shape(scene: &Scene, p: egui::Pos2) -> Option<EntityId> {
    scene
        .shapes()
        .iter()
        .rev()
        .find(|s| hit_test_shape(s, p))
        .map(|s| s.id)
}

// Deletion target under `p`: shapes first, then lines, then labels.
pub(super) fn deletion_target(scene: &Scene, p: egui::Pos2) -> Option<EntityId> {
    topmost_shape(scene, p)
        .or_else(|| {
            scene
                .lines()
                .iter()
                .rev()
                .find(|l| hit_test_line(l, p))
                .map(|l| l.id)
        })
        .or_else(|| {
            scene
                .labels()
                .iter()
                .rev()
                .find(|l| hit_test_label(l, p))
                .map(|l| l.id)
        })
}
