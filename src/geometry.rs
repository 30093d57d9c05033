//! Geometry value types: pointer positions, raw layout boxes, and owned rects.
//!
//! `Bounds` is what the host reports for a node (a `getBoundingClientRect`
//! style box). `Rect` is the engine's own copy, tagged with the id of the
//! model that owns it and always carrying consistent derived edges
//! (`right = left + width`, `bottom = top + height`). Rects are only ever
//! replaced wholesale; every operation here returns a new value.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

/// A point in viewport space (CSS pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// This position shifted by `(dx, dy)`.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

/// A raw layout box as measured by the host.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// This box shifted by `(dx, dy)`.
    #[must_use]
    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self { left: self.left + dx, top: self.top + dy, ..self }
    }
}

/// An axis-aligned box owned by a draggable, droppable, or the overlay.
///
/// Fields are private so the derived edges can never disagree with the
/// origin and size.
#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    id: String,
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
    width: f64,
    height: f64,
}

impl Rect {
    /// Build a rect for owner `id` from a measured box.
    #[must_use]
    pub fn new(id: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            id: id.into(),
            left: bounds.left,
            top: bounds.top,
            right: bounds.left + bounds.width,
            bottom: bounds.top + bounds.height,
            width: bounds.width,
            height: bounds.height,
        }
    }

    /// Id of the model that owns this rect.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn left(&self) -> f64 {
        self.left
    }

    #[must_use]
    pub fn top(&self) -> f64 {
        self.top
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.right
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// The origin and size this rect was built from.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.left, self.top, self.width, self.height)
    }

    /// Shallow field comparison against a freshly measured box.
    #[must_use]
    pub fn matches(&self, bounds: &Bounds) -> bool {
        self.bounds() == *bounds
    }

    /// All four edges moved by `(dx, dy)`; size unchanged.
    #[must_use]
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            id: self.id.clone(),
            left: self.left + dx,
            top: self.top + dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
            width: self.width,
            height: self.height,
        }
    }

    /// Same size with its top-left corner at `position`.
    #[must_use]
    pub fn at_position(&self, position: Position) -> Self {
        Self::new(self.id.clone(), Bounds::new(position.x, position.y, self.width, self.height))
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    #[must_use]
    pub fn center(&self) -> Position {
        Position::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Corners in fixed order: top-left, top-right, bottom-left, bottom-right.
    #[must_use]
    pub fn corners(&self) -> [Position; 4] {
        [
            Position::new(self.left, self.top),
            Position::new(self.right, self.top),
            Position::new(self.left, self.bottom),
            Position::new(self.right, self.bottom),
        ]
    }

    /// Area of the overlap with `other`, or `0.0` when they are disjoint or
    /// only touch along an edge.
    #[must_use]
    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let width = self.right.min(other.right) - self.left.max(other.left);
        let height = self.bottom.min(other.bottom) - self.top.max(other.top);
        if width <= 0.0 || height <= 0.0 {
            return 0.0;
        }
        width * height
    }
}
