//! Overlay position modifiers.
//!
//! A modifier maps a position to a position, given the dragging, dropping,
//! and overlay rects of the current frame. A [`Pipeline`] folds its
//! modifiers left to right, each one consuming the previous output; an empty
//! pipeline returns its input unchanged.

#[cfg(test)]
#[path = "modifier_test.rs"]
mod modifier_test;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::{Position, Rect};

/// Rects a modifier may consult.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModifierRects<'a> {
    pub dragging: Option<&'a Rect>,
    pub dropping: Option<&'a Rect>,
    pub overlay: Option<&'a Rect>,
}

pub trait Modifier {
    fn modify(&self, position: Position, rects: &ModifierRects<'_>) -> Position;
}

impl<F> Modifier for F
where
    F: Fn(Position, &ModifierRects<'_>) -> Position,
{
    fn modify(&self, position: Position, rects: &ModifierRects<'_>) -> Position {
        self(position, rects)
    }
}

/// Ordered modifier list.
#[derive(Default)]
pub struct Pipeline {
    modifiers: Vec<Box<dyn Modifier>>,
}

impl Pipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, modifier: impl Modifier + 'static) {
        self.modifiers.push(Box::new(modifier));
    }

    pub fn push_boxed(&mut self, modifier: Box<dyn Modifier>) {
        self.modifiers.push(modifier);
    }

    /// Install `modifier` as the first stage.
    pub fn prepend(&mut self, modifier: impl Modifier + 'static) {
        self.modifiers.insert(0, Box::new(modifier));
    }

    #[must_use]
    pub fn apply(&self, position: Position, rects: &ModifierRects<'_>) -> Position {
        self.modifiers.iter().fold(position, |current, modifier| modifier.modify(current, rects))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("len", &self.modifiers.len()).finish()
    }
}

// =============================================================================
// OFFSET MODIFIER
// =============================================================================

/// Symbolic position along one overlay axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Start,
    Center,
    End,
}

/// One axis of an [`OffsetModifier`]: an anchor resolved against the
/// overlay's size, or a literal pixel amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Offset {
    Anchor(Anchor),
    Px(f64),
}

impl Default for Offset {
    fn default() -> Self {
        Self::Px(0.0)
    }
}

impl Offset {
    /// Pixel amount for an overlay extent of `size`.
    #[must_use]
    pub fn resolve(self, size: f64) -> f64 {
        match self {
            Self::Anchor(Anchor::Start) => 0.0,
            Self::Anchor(Anchor::Center) => -size / 2.0,
            Self::Anchor(Anchor::End) => -size,
            Self::Px(px) => px,
        }
    }
}

impl FromStr for Offset {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "start" => Ok(Self::Anchor(Anchor::Start)),
            "center" => Ok(Self::Anchor(Anchor::Center)),
            "end" => Ok(Self::Anchor(Anchor::End)),
            other => match other.parse::<f64>() {
                Ok(px) if px.is_finite() => Ok(Self::Px(px)),
                _ => Err(format!("invalid offset '{other}' (expected start, center, end, or a number)")),
            },
        }
    }
}

/// Shift the position by a per-axis offset. Anchors resolve against the
/// overlay's width and height (zero without an overlay rect).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OffsetModifier {
    #[serde(default)]
    pub x: Offset,
    #[serde(default)]
    pub y: Offset,
}

impl OffsetModifier {
    #[must_use]
    pub fn new(x: Offset, y: Offset) -> Self {
        Self { x, y }
    }
}

impl Modifier for OffsetModifier {
    fn modify(&self, position: Position, rects: &ModifierRects<'_>) -> Position {
        let (width, height) = rects.overlay.map_or((0.0, 0.0), |r| (r.width(), r.height()));
        position.offset(self.x.resolve(width), self.y.resolve(height))
    }
}

/// Shorthand for `OffsetModifier::new(x, y)`.
#[must_use]
pub fn offset_modifier(x: Offset, y: Offset) -> OffsetModifier {
    OffsetModifier::new(x, y)
}
