use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point in canvas pixel space. `y` grows downward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Static description of a grid as it appears in layout files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub rows: u32,
    pub cols: u32,
    pub cell_width: f32,
    pub cell_height: f32,
    #[serde(default)]
    pub origin: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDisplay {
    pub outlines_visible: bool,
    pub center_line_visible: bool,
}

impl Default for GridDisplay {
    fn default() -> Self {
        Self {
            outlines_visible: false,
            center_line_visible: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GridError {
    #[error("grid must have at least one row")]
    ZeroRows,
    #[error("grid must have at least one column")]
    ZeroColumns,
    #[error("cell size must be finite and positive, got {width}x{height}")]
    InvalidCellSize { width: f32, height: f32 },
    #[error("grid origin must be finite, got ({x}, {y})")]
    InvalidOrigin { x: f32, y: f32 },
}

/// Pixel bounds of a whole lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl PixelRect {
    pub fn overlaps(&self, other: &PixelRect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

/// Rectangular tile lattice anchored at a pixel origin.
///
/// Cell `(row, col)` spans `(origin + index * size, origin + index * size + size]` on each
/// axis: the lower edge is excluded and the upper edge is included, so a boundary pixel
/// between two neighbours always belongs to the lower-index cell. The origin edge itself
/// belongs to no cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: u32,
    cols: u32,
    cell_width: f32,
    cell_height: f32,
    origin: Vec2,
    display: GridDisplay,
}

impl Grid {
    pub fn new(spec: GridSpec) -> Result<Self, GridError> {
        if spec.rows == 0 {
            return Err(GridError::ZeroRows);
        }
        if spec.cols == 0 {
            return Err(GridError::ZeroColumns);
        }
        let sizes_valid = spec.cell_width.is_finite()
            && spec.cell_height.is_finite()
            && spec.cell_width > 0.0
            && spec.cell_height > 0.0;
        if !sizes_valid {
            return Err(GridError::InvalidCellSize {
                width: spec.cell_width,
                height: spec.cell_height,
            });
        }
        if !spec.origin.x.is_finite() || !spec.origin.y.is_finite() {
            return Err(GridError::InvalidOrigin {
                x: spec.origin.x,
                y: spec.origin.y,
            });
        }
        Ok(Self {
            rows: spec.rows,
            cols: spec.cols,
            cell_width: spec.cell_width,
            cell_height: spec.cell_height,
            origin: spec.origin,
            display: GridDisplay::default(),
        })
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn cell_width(&self) -> f32 {
        self.cell_width
    }

    pub fn cell_height(&self) -> f32 {
        self.cell_height
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Top-left pixel of a cell. Defined for any index so render loops may step past the
    /// lattice edge.
    pub fn cell_origin(&self, row: i64, col: i64) -> Vec2 {
        Vec2 {
            x: self.origin.x + col as f32 * self.cell_width,
            y: self.origin.y + row as f32 * self.cell_height,
        }
    }

    pub fn cell_at(&self, point: Vec2) -> Option<CellCoord> {
        let col = axis_index(point.x, self.origin.x, self.cell_width, self.cols)?;
        let row = axis_index(point.y, self.origin.y, self.cell_height, self.rows)?;
        Some(CellCoord { row, col })
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.cell_at(point).is_some()
    }

    pub fn pixel_bounds(&self) -> PixelRect {
        PixelRect {
            left: self.origin.x,
            top: self.origin.y,
            right: self.origin.x + self.cols as f32 * self.cell_width,
            bottom: self.origin.y + self.rows as f32 * self.cell_height,
        }
    }

    /// Column whose left edge carries the vertical split line. Only grids with an even
    /// column count have one.
    pub fn center_line_column(&self) -> Option<u32> {
        (self.cols % 2 == 0).then_some(self.cols / 2)
    }

    pub fn display(&self) -> GridDisplay {
        self.display
    }

    pub fn set_display(&mut self, display: GridDisplay) {
        self.display = display;
    }

    pub fn toggle_outlines(&mut self) -> bool {
        self.display.outlines_visible = !self.display.outlines_visible;
        self.display.outlines_visible
    }

    pub fn toggle_center_line(&mut self) -> bool {
        self.display.center_line_visible = !self.display.center_line_visible;
        self.display.center_line_visible
    }
}

fn axis_index(coordinate: f32, origin: f32, size: f32, count: u32) -> Option<u32> {
    if !coordinate.is_finite() {
        return None;
    }
    // Edges come from the same expression as `cell_origin`, so neighbours share them bit
    // for bit.
    let edge = |index: i64| origin + index as f32 * size;
    let claims = |index: i64| coordinate > edge(index) && coordinate <= edge(index + 1);
    // The closed form can land one cell off when float error sits on an edge; the
    // neighbours are checked against the exact predicate.
    // Clamped so far-off points stay within integer range; they then fail the predicate.
    let estimate = (((coordinate - origin) / size).ceil() as i64)
        .saturating_sub(1)
        .clamp(-1, i64::from(count));
    let index = [estimate, estimate - 1, estimate + 1]
        .into_iter()
        .find(|&candidate| claims(candidate))?;
    if index < 0 || index >= i64::from(count) {
        return None;
    }
    Some(index as u32)
}
