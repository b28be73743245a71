use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest width/height (in CSS pixels) a region must reach to be kept.
pub const MIN_REGION_EXTENT: f64 = 6.0;

/// Width of the accent border drawn around reveal regions. Draft clamping
/// keeps this much margin at the document edge so the border stays visible.
pub const BORDER_WIDTH: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, by: Point) -> Self {
        Self::new(self.x + by.x, self.y + by.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whole-pixel dimensions for allocating a surface of this size.
    pub fn to_pixels(self) -> (u32, u32) {
        (
            self.width.max(0.0).round() as u32,
            self.height.max(0.0).round() as u32,
        )
    }
}

/// Axis-aligned rectangle. Width and height may be negative while a gesture
/// is in progress; see [`Rect::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Folds negative extents into an origin shift. The covered area is the same.
    pub fn normalized(self) -> Self {
        let (x, width) = fold_axis(self.x, self.width);
        let (y, height) = fold_axis(self.y, self.height);
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn meets_min_extent(self, min_extent: f64) -> bool {
        self.width.abs() >= min_extent && self.height.abs() >= min_extent
    }

    pub fn exceeds_extent(self, extent: f64) -> bool {
        self.width.abs() > extent && self.height.abs() > extent
    }

    pub fn left(self) -> f64 {
        self.normalized().x
    }

    pub fn top(self) -> f64 {
        self.normalized().y
    }

    pub fn right(self) -> f64 {
        let r = self.normalized();
        r.x + r.width
    }

    pub fn bottom(self) -> f64 {
        let r = self.normalized();
        r.y + r.height
    }

    pub fn translate(self, by: Point) -> Self {
        Self {
            x: self.x + by.x,
            y: self.y + by.y,
            ..self
        }
    }

    /// Part of the rectangle inside `(0, 0)..size`, normalized. `None` when
    /// nothing of it lies inside or an edge is not a number.
    pub fn clip_to(self, size: Size) -> Option<Rect> {
        let left = self.left().max(0.0);
        let top = self.top().max(0.0);
        let right = self.right().min(size.width);
        let bottom = self.bottom().min(size.height);
        if right > left && bottom > top {
            Some(Rect::new(left, top, right - left, bottom - top))
        } else {
            None
        }
    }

    pub fn contains(self, point: Point) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }
}

fn fold_axis(start: f64, extent: f64) -> (f64, f64) {
    if extent < 0.0 {
        (start + extent, -extent)
    } else {
        (start, extent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionMode {
    /// Highlight: the region is cut out of the scrim.
    #[default]
    Reveal,
    /// Blackout: the region is painted over.
    Conceal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u64);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An uncommitted rectangle: the in-progress draft or a hover candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionDraft {
    pub bounds: Rect,
    pub mode: RegionMode,
}

impl RegionDraft {
    pub const fn new(bounds: Rect, mode: RegionMode) -> Self {
        Self { bounds, mode }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    /// Normalized bounds in document space.
    pub bounds: Rect,
    pub mode: RegionMode,
}

impl Region {
    pub fn is_reveal(&self) -> bool {
        self.mode == RegionMode::Reveal
    }

    pub fn is_conceal(&self) -> bool {
        self.mode == RegionMode::Conceal
    }
}
