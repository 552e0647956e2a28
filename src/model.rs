use eframe::egui;
use std::fmt;

use crate::constants;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgba_premultiplied(self.r, self.g, self.b, self.a)
    }

    pub fn to_pixel(self) -> image::Rgb<u8> {
        image::Rgb([self.r, self.g, self.b])
    }
}

// Stable handle for anything placed in a `Scene`. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Shape,
    Line,
    Label,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Oval,
    Diamond,
}

impl ShapeKind {
    pub fn default_half_extents(self) -> egui::Vec2 {
        match self {
            ShapeKind::Rectangle | ShapeKind::Oval => {
                egui::vec2(constants::BOX_HALF_WIDTH, constants::BOX_HALF_HEIGHT)
            }
            ShapeKind::Diamond => {
                egui::vec2(constants::DIAMOND_HALF_WIDTH, constants::DIAMOND_HALF_HEIGHT)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub id: EntityId,
    pub kind: ShapeKind,
    pub center: egui::Pos2,
    half_extents: egui::Vec2,
    pub label: Option<EntityId>,
}

impl Shape {
    fn new(id: EntityId, kind: ShapeKind, center: egui::Pos2) -> Self {
        Self {
            id,
            kind,
            center,
            half_extents: kind.default_half_extents(),
            label: None,
        }
    }

    pub fn half_extents(&self) -> egui::Vec2 {
        self.half_extents
    }

    // Clamps each extent so the shape keeps a positive size.
    pub fn set_half_extents(&mut self, half: egui::Vec2) {
        let min_half = constants::MIN_SHAPE_EXTENT * 0.5;
        let clamp = |v: f32| if v.is_finite() { v.max(min_half) } else { min_half };
        self.half_extents = egui::vec2(clamp(half.x), clamp(half.y));
    }

    // Geometric bounds, `(x0, y0, x1, y1)` for boxes and the diamond's hull.
    pub fn bounds(&self) -> egui::Rect {
        egui::Rect::from_center_size(self.center, self.half_extents * 2.0)
    }

    // Bounds including the outline stroke.
    pub fn visual_bounds(&self) -> egui::Rect {
        self.bounds().expand(constants::SHAPE_OUTLINE_WIDTH * 0.5)
    }

    // Diamond corners in top, right, bottom, left order.
    pub fn diamond_points(&self) -> [egui::Pos2; 4] {
        let c = self.center;
        let h = self.half_extents;
        [
            egui::pos2(c.x, c.y - h.y),
            egui::pos2(c.x + h.x, c.y),
            egui::pos2(c.x, c.y + h.y),
            egui::pos2(c.x - h.x, c.y),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Line,
    Arrow,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub id: EntityId,
    pub kind: LineKind,
    pub start: egui::Pos2,
    pub end: egui::Pos2,
}

impl Line {
    pub fn is_arrow(&self) -> bool {
        self.kind == LineKind::Arrow
    }

    pub fn visual_bounds(&self) -> egui::Rect {
        let mut pad = constants::CONNECTOR_WIDTH * 0.5;
        if self.is_arrow() {
            pad = pad.max(constants::ARROW_HEAD_LENGTH);
        }
        egui::Rect::from_two_pos(self.start, self.end).expand(pad)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub id: EntityId,
    pub owner: EntityId,
    pub text: String,
    pub base_font_size: f32,
    pub position: egui::Pos2,
    // Measured text size at the current rendered font size, unpadded.
    pub extent: egui::Vec2,
}

impl Label {
    pub fn rendered_font_size(&self, zoom_factor: f32) -> f32 {
        rendered_font_size(self.base_font_size, zoom_factor)
    }

    pub fn bounds(&self) -> egui::Rect {
        egui::Rect::from_center_size(self.position, self.extent)
    }
}

pub fn rendered_font_size(base_font_size: f32, zoom_factor: f32) -> f32 {
    (base_font_size * zoom_factor).round().max(1.0)
}

// Retained set of everything drawn on one flowchart canvas.
// Each list is kept in creation order, which is also the drawing order.
#[derive(Clone, Debug)]
pub struct Scene {
    shapes: Vec<Shape>,
    lines: Vec<Line>,
    labels: Vec<Label>,
    next_id: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            shapes: vec![],
            lines: vec![],
            labels: vec![],
            next_id: 1,
        }
    }
}

impl Scene {
    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn add_shape(&mut self, kind: ShapeKind, center: egui::Pos2) -> EntityId {
        let id = self.allocate_id();
        self.shapes.push(Shape::new(id, kind, center));
        id
    }

    pub fn add_line(&mut self, kind: LineKind, at: egui::Pos2) -> EntityId {
        let id = self.allocate_id();
        self.lines.push(Line {
            id,
            kind,
            start: at,
            end: at,
        });
        id
    }

    // Creates the shape's label, or replaces the text of the existing one.
    // Returns the label handle, or `None` if `shape_id` is not a live shape.
    pub fn set_label_text(&mut self, shape_id: EntityId, text: &str) -> Option<EntityId> {
        let (existing, center) = {
            let shape = self.shape(shape_id)?;
            (shape.label, shape.center)
        };
        if let Some(label_id) = existing {
            if let Some(label) = self.label_mut(label_id) {
                label.text = text.to_string();
                return Some(label_id);
            }
        }
        let id = self.allocate_id();
        self.labels.push(Label {
            id,
            owner: shape_id,
            text: text.to_string(),
            base_font_size: constants::LABEL_BASE_FONT_SIZE,
            position: center,
            extent: egui::Vec2::ZERO,
        });
        if let Some(shape) = self.shape_mut(shape_id) {
            shape.label = Some(id);
        }
        Some(id)
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn shape(&self, id: EntityId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn shape_mut(&mut self, id: EntityId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    pub fn line(&self, id: EntityId) -> Option<&Line> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn line_mut(&mut self, id: EntityId) -> Option<&mut Line> {
        self.lines.iter_mut().find(|l| l.id == id)
    }

    pub fn label(&self, id: EntityId) -> Option<&Label> {
        self.labels.iter().find(|l| l.id == id)
    }

    pub fn label_mut(&mut self, id: EntityId) -> Option<&mut Label> {
        self.labels.iter_mut().find(|l| l.id == id)
    }

    pub fn label_of(&self, shape_id: EntityId) -> Option<&Label> {
        self.shape(shape_id)
            .and_then(|s| s.label)
            .and_then(|id| self.label(id))
    }

    pub(crate) fn shapes_mut(&mut self) -> &mut [Shape] {
        &mut self.shapes
    }

    pub(crate) fn lines_mut(&mut self) -> &mut [Line] {
        &mut self.lines
    }

    pub(crate) fn labels_mut(&mut self) -> &mut [Label] {
        &mut self.labels
    }

    // Removes an entity. A shape takes its label with it; a label detaches
    // from its owner. Stale handles are ignored.
    pub fn remove(&mut self, id: EntityId) -> Option<EntityKind> {
        if let Some(idx) = self.shapes.iter().position(|s| s.id == id) {
            let shape = self.shapes.remove(idx);
            if let Some(label_id) = shape.label {
                self.labels.retain(|l| l.id != label_id);
            }
            return Some(EntityKind::Shape);
        }
        if let Some(idx) = self.lines.iter().position(|l| l.id == id) {
            self.lines.remove(idx);
            return Some(EntityKind::Line);
        }
        if let Some(idx) = self.labels.iter().position(|l| l.id == id) {
            let label = self.labels.remove(idx);
            if let Some(owner) = self.shape_mut(label.owner) {
                if owner.label == Some(id) {
                    owner.label = None;
                }
            }
            return Some(EntityKind::Label);
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.lines.is_empty() && self.labels.is_empty()
    }

    pub fn entity_count(&self) -> usize {
        self.shapes.len() + self.lines.len() + self.labels.len()
    }

    pub fn content_bounds(&self) -> Option<egui::Rect> {
        self.shapes
            .iter()
            .map(Shape::visual_bounds)
            .chain(self.lines.iter().map(Line::visual_bounds))
            .chain(self.labels.iter().map(Label::bounds))
            .reduce(|a, b| a.union(b))
    }
}

pub fn distance_to_segment(p: egui::Pos2, a: egui::Pos2, b: egui::Pos2) -> f32 {
    let ab = b - a;
    let ap = p - a;
    let ab_len2 = ab.x * ab.x + ab.y * ab.y;
    if ab_len2 <= f32::EPSILON {
        return (p - a).length();
    }
    let t = (ap.x * ab.x + ap.y * ab.y) / ab_len2;
    let t = t.clamp(0.0, 1.0);
    let closest = a + ab * t;
    (p - closest).length()
}
