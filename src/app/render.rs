use eframe::egui;

use crate::canvas::text_metrics::label_font_id;
use crate::canvas::{CanvasEngine, ToolCommand, ToolMode, View};
use crate::constants;
use crate::model::{self, ShapeKind};

const ELLIPSE_SEGMENTS: usize = 48;

pub(super) fn tool_button(ui: &mut egui::Ui, label: &str, tool: ToolMode, engine: &mut CanvasEngine) {
    let active = engine.tool() == tool;
    if ui.selectable_label(active, label).clicked() {
        engine.apply_command(ToolCommand::Select(tool));
    }
}

pub(super) fn draw_background(painter: &egui::Painter, rect: egui::Rect, view: &View) {
    painter.rect_filled(rect, 0.0, constants::CANVAS_BACKGROUND.to_color32());

    // Dots cover a fixed block of scene space and do not follow zoom.
    let origin = rect.min;
    let visible = egui::Rect::from_min_size(
        view.screen_to_scene(origin, rect.min),
        rect.size(),
    );
    let step = constants::GRID_STEP;
    let extent = constants::GRID_EXTENT;
    let x0 = (visible.min.x / step).ceil().max(0.0) * step;
    let y0 = (visible.min.y / step).ceil().max(0.0) * step;
    let x1 = visible.max.x.min(extent);
    let y1 = visible.max.y.min(extent);
    let color = constants::GRID_DOT_COLOR.to_color32();
    let mut y = y0;
    while y <= y1 {
        let mut x = x0;
        while x <= x1 {
            let p = view.scene_to_screen(origin, egui::pos2(x, y));
            painter.circle_filled(p, constants::GRID_DOT_RADIUS, color);
            x += step;
        }
        y += step;
    }
}

pub(super) fn draw_scene(
    painter: &egui::Painter,
    origin: egui::Pos2,
    engine: &CanvasEngine,
    label_family_ready: bool,
) {
    let view = engine.view();
    let scene = engine.scene();
    let fill = constants::SHAPE_FILL.to_color32();
    let outline = egui::Stroke::new(
        constants::SHAPE_OUTLINE_WIDTH,
        constants::SHAPE_OUTLINE.to_color32(),
    );

    for shape in scene.shapes() {
        let to_screen = |p: egui::Pos2| view.scene_to_screen(origin, p);
        match shape.kind {
            ShapeKind::Rectangle => {
                let bounds = shape.bounds();
                let rect = egui::Rect::from_min_max(to_screen(bounds.min), to_screen(bounds.max));
                painter.rect_filled(rect, 0.0, fill);
                painter.rect_stroke(rect, 0.0, outline, egui::StrokeKind::Middle);
            }
            ShapeKind::Oval => {
                let points = ellipse_points(to_screen(shape.center), shape.half_extents());
                painter.add(egui::Shape::convex_polygon(points, fill, outline));
            }
            ShapeKind::Diamond => {
                let points = shape.diamond_points().map(to_screen).to_vec();
                painter.add(egui::Shape::convex_polygon(points, fill, outline));
            }
        }
    }

    let stroke = egui::Stroke::new(
        constants::CONNECTOR_WIDTH,
        constants::CONNECTOR_COLOR.to_color32(),
    );
    for line in scene.lines() {
        let a = view.scene_to_screen(origin, line.start);
        let b = view.scene_to_screen(origin, line.end);
        painter.line_segment([a, b], stroke);
        if line.kind == model::LineKind::Arrow {
            draw_arrowhead(painter, a, b, stroke);
        }
    }

    let color = constants::LABEL_COLOR.to_color32();
    for label in scene.labels() {
        let size = label.rendered_font_size(view.zoom_factor);
        let font_id = if label_family_ready {
            label_font_id(size)
        } else {
            egui::FontId::proportional(size)
        };
        painter.text(
            view.scene_to_screen(origin, label.position),
            egui::Align2::CENTER_CENTER,
            &label.text,
            font_id,
            color,
        );
    }
}

fn ellipse_points(center: egui::Pos2, radii: egui::Vec2) -> Vec<egui::Pos2> {
    (0..ELLIPSE_SEGMENTS)
        .map(|i| {
            let t = i as f32 / ELLIPSE_SEGMENTS as f32 * std::f32::consts::TAU;
            center + egui::vec2(t.cos() * radii.x, t.sin() * radii.y)
        })
        .collect()
}

fn draw_arrowhead(painter: &egui::Painter, a: egui::Pos2, b: egui::Pos2, stroke: egui::Stroke) {
    let v = b - a;
    if v.length_sq() <= f32::EPSILON {
        return;
    }
    let dir = v.normalized();
    let perp = egui::vec2(-dir.y, dir.x);
    let base = b - dir * constants::ARROW_HEAD_LENGTH;
    let left = base + perp * constants::ARROW_HEAD_HALF_WIDTH;
    let right = base - perp * constants::ARROW_HEAD_HALF_WIDTH;
    painter.add(egui::Shape::convex_polygon(
        vec![b, left, right],
        stroke.color,
        egui::Stroke::NONE,
    ));
}
