use eframe::egui;
use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use image::RgbImage;
use std::path::Path;
use thiserror::Error;

use crate::constants;
use crate::model::{self, Rgba, Scene, ShapeKind};

use super::text_metrics::{FontError, LabelFont};
use super::{CanvasEngine, View};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("canvas viewport is empty ({width}x{height})")]
    EmptyViewport { width: u32, height: u32 },
    #[error("no usable label font: {0}")]
    Font(#[from] FontError),
    #[error("failed to write PNG: {0}")]
    Encode(#[from] image::ImageError),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub shapes: usize,
    pub lines: usize,
    pub labels: usize,
}

impl CanvasEngine {
    pub fn export_png(
        &self,
        path: &Path,
        preferred_font: Option<&Path>,
    ) -> Result<ExportReport, ExportError> {
        let font = LabelFont::resolve(preferred_font)?;
        let (image, report) = render(&self.scene, &self.view, &font)?;
        image.save_with_format(path, image::ImageFormat::Png)?;
        log::info!("Flowchart exported to {}", path.display());
        Ok(report)
    }
}

pub fn render(
    scene: &Scene,
    view: &View,
    font: &LabelFont,
) -> Result<(RgbImage, ExportReport), ExportError> {
    let width = view.viewport_size.x.round().max(0.0) as u32;
    let height = view.viewport_size.y.round().max(0.0) as u32;
    if width == 0 || height == 0 {
        return Err(ExportError::EmptyViewport { width, height });
    }

    let mut canvas = Canvas {
        image: RgbImage::from_pixel(width, height, constants::CANVAS_BACKGROUND.to_pixel()),
        offset: view.scroll_offset,
    };
    let mut report = ExportReport::default();

    for shape in scene.shapes() {
        match shape.kind {
            ShapeKind::Rectangle => canvas.rectangle(shape.bounds()),
            ShapeKind::Oval => canvas.ellipse(shape.center, shape.half_extents()),
            ShapeKind::Diamond => canvas.polygon(&shape.diamond_points()),
        }
        report.shapes += 1;
    }

    for line in scene.lines() {
        canvas.segment(
            line.start,
            line.end,
            constants::CONNECTOR_WIDTH,
            constants::CONNECTOR_COLOR,
        );
        if line.is_arrow() {
            canvas.fill_polygon(&arrowhead(line.end), constants::CONNECTOR_COLOR);
        }
        report.lines += 1;
    }

    for label in scene.labels() {
        let size = label.rendered_font_size(view.zoom_factor);
        canvas.text(font, &label.text, size, label.position, constants::LABEL_COLOR);
        report.labels += 1;
    }

    Ok((canvas.image, report))
}

// Fixed triangle pointing along +x, whatever the line's direction.
fn arrowhead(tip: egui::Pos2) -> [egui::Pos2; 3] {
    let len = constants::ARROW_HEAD_LENGTH;
    let half = constants::ARROW_HEAD_HALF_WIDTH;
    [
        tip,
        egui::pos2(tip.x - len, tip.y - half),
        egui::pos2(tip.x - len, tip.y + half),
    ]
}

struct Canvas {
    image: RgbImage,
    offset: egui::Vec2,
}

impl Canvas {
    // Calls `f` with the scene-space centre of every pixel whose centre
    // lies inside `area` and inside the image.
    fn for_each_pixel(&mut self, area: egui::Rect, mut f: impl FnMut(egui::Pos2) -> Option<Rgba>) {
        let area = area.translate(-self.offset);
        let w = self.image.width() as i64;
        let h = self.image.height() as i64;
        let x0 = (area.min.x.floor() as i64).clamp(0, w);
        let x1 = (area.max.x.ceil() as i64).clamp(0, w);
        let y0 = (area.min.y.floor() as i64).clamp(0, h);
        let y1 = (area.max.y.ceil() as i64).clamp(0, h);
        for y in y0..y1 {
            for x in x0..x1 {
                let scene = egui::pos2(x as f32 + 0.5, y as f32 + 0.5) + self.offset;
                if let Some(color) = f(scene) {
                    self.image.put_pixel(x as u32, y as u32, color.to_pixel());
                }
            }
        }
    }

    fn rectangle(&mut self, rect: egui::Rect) {
        let half_stroke = constants::SHAPE_OUTLINE_WIDTH * 0.5;
        let outer = rect.expand(half_stroke);
        let inner = rect.shrink(half_stroke);
        self.for_each_pixel(outer, |p| {
            if inner.contains(p) {
                Some(constants::SHAPE_FILL)
            } else {
                Some(constants::SHAPE_OUTLINE)
            }
        });
    }

    fn ellipse(&mut self, center: egui::Pos2, radii: egui::Vec2) {
        let half_stroke = constants::SHAPE_OUTLINE_WIDTH * 0.5;
        let inside = |p: egui::Pos2, r: egui::Vec2| {
            if r.x <= 0.0 || r.y <= 0.0 {
                return false;
            }
            let d = p - center;
            (d.x / r.x).powi(2) + (d.y / r.y).powi(2) <= 1.0
        };
        let outer = radii + egui::Vec2::splat(half_stroke);
        let inner = radii - egui::Vec2::splat(half_stroke);
        let area = egui::Rect::from_center_size(center, outer * 2.0);
        self.for_each_pixel(area, |p| {
            if inside(p, inner) {
                Some(constants::SHAPE_FILL)
            } else if inside(p, outer) {
                Some(constants::SHAPE_OUTLINE)
            } else {
                None
            }
        });
    }

    fn polygon(&mut self, points: &[egui::Pos2]) {
        self.fill_polygon(points, constants::SHAPE_FILL);
        for (i, &a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            self.segment(a, b, constants::SHAPE_OUTLINE_WIDTH, constants::SHAPE_OUTLINE);
        }
    }

    fn fill_polygon(&mut self, points: &[egui::Pos2], color: Rgba) {
        let Some(area) = points
            .iter()
            .map(|&p| egui::Rect::from_min_max(p, p))
            .reduce(|a, b| a.union(b))
        else {
            return;
        };
        self.for_each_pixel(area, |p| contains_point(points, p).then_some(color));
    }

    fn segment(&mut self, a: egui::Pos2, b: egui::Pos2, width: f32, color: Rgba) {
        let half = width * 0.5;
        let area = egui::Rect::from_two_pos(a, b).expand(half);
        self.for_each_pixel(area, |p| {
            (model::distance_to_segment(p, a, b) <= half).then_some(color)
        });
    }

    fn text(&mut self, font: &LabelFont, text: &str, size: f32, center: egui::Pos2, color: Rgba) {
        let face = font.font();
        let center = center - self.offset;

        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        let mut settings = LayoutSettings::default();
        settings.y = match face.horizontal_line_metrics(size) {
            Some(metrics) => {
                let baseline = center.y + (metrics.ascent + metrics.descent) * 0.5;
                baseline - metrics.ascent
            }
            None => center.y - size * 0.5,
        };
        layout.reset(&settings);
        layout.append(&[face], &TextStyle::new(text, size, 0));
        let dx = center.x - laid_out_width(face, &layout) * 0.5;

        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let (metrics, bitmap) = face.rasterize_indexed(glyph.key.glyph_index, glyph.key.px);
            let x0 = (glyph.x + dx).floor() as i64;
            let y0 = glyph.y.floor() as i64;
            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let coverage = bitmap[row * metrics.width + col];
                    if coverage > 0 {
                        self.blend(x0 + col as i64, y0 + row as i64, color, coverage);
                    }
                }
            }
        }
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgba, coverage: u8) {
        if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            return;
        }
        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        let alpha = (color.a as f32 / 255.0) * (coverage as f32 / 255.0);
        let src = [color.r, color.g, color.b];
        for (dst, src) in pixel.0.iter_mut().zip(src) {
            *dst = (src as f32 * alpha + *dst as f32 * (1.0 - alpha)).round() as u8;
        }
    }
}

// Pen advance of a layout laid out from x = 0, kerning included.
fn laid_out_width(face: &fontdue::Font, layout: &Layout) -> f32 {
    layout.glyphs().last().map_or(0.0, |g| {
        let metrics = face.metrics_indexed(g.key.glyph_index, g.key.px);
        g.x - metrics.xmin as f32 + metrics.advance_width
    })
}

// Even-odd point-in-polygon test.
fn contains_point(points: &[egui::Pos2], p: egui::Pos2) -> bool {
    let mut inside = false;
    let mut j = points.len().wrapping_sub(1);
    for (i, &a) in points.iter().enumerate() {
        let b = points[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
