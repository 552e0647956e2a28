use crate::model::Rgba;

// Colours
pub const CANVAS_BACKGROUND: Rgba = Rgba::rgb(0x1e, 0x1e, 0x1e);
pub const SHAPE_FILL: Rgba = Rgba::rgb(0x33, 0x33, 0x33);
pub const SHAPE_OUTLINE: Rgba = Rgba::rgb(0xcc, 0xcc, 0xcc);
pub const CONNECTOR_COLOR: Rgba = Rgba::rgb(0xcc, 0xcc, 0xcc);
pub const LABEL_COLOR: Rgba = Rgba::rgb(0xcc, 0xcc, 0xcc);
pub const GRID_DOT_COLOR: Rgba = Rgba::rgb(0x33, 0x33, 0x33);

// Strokes
pub const SHAPE_OUTLINE_WIDTH: f32 = 2.0;
pub const CONNECTOR_WIDTH: f32 = 2.0;

// Default shape sizes, as half extents around the click point.
pub const BOX_HALF_WIDTH: f32 = 50.0;
pub const BOX_HALF_HEIGHT: f32 = 25.0;
pub const DIAMOND_HALF_WIDTH: f32 = 50.0;
pub const DIAMOND_HALF_HEIGHT: f32 = 30.0;
// Smallest width or height any shape may collapse to.
pub const MIN_SHAPE_EXTENT: f32 = 1.0;

// Labels
pub const LABEL_BASE_FONT_SIZE: f32 = 12.0;
// Added to both measured text dimensions before fitting a shape.
pub const LABEL_PADDING: f32 = 20.0;
// Width:height ratio every labelled shape is refitted to.
pub const LABEL_FIT_ASPECT: f32 = 2.0;

// Arrowheads
pub const ARROW_HEAD_LENGTH: f32 = 10.0;
pub const ARROW_HEAD_HALF_WIDTH: f32 = 5.0;

// Hit testing
// Half size of the square window around the pointer used for hit tests.
pub const HIT_TOLERANCE: f32 = 1.0;

// Grid
pub const GRID_STEP: f32 = 20.0;
pub const GRID_DOT_RADIUS: f32 = 1.0;
pub const GRID_EXTENT: f32 = 2000.0;

// View
pub const SCROLL_MARGIN: f32 = 200.0;
pub const INITIAL_SCROLL_REGION: (f32, f32, f32, f32) = (0.0, 0.0, 3000.0, 3000.0);
pub const ZOOM_IN_FACTOR: f32 = 1.2;
pub const ZOOM_OUT_FACTOR: f32 = 0.8;
