//! Intersection strategies: rank drop candidates against the drag state.
//!
//! A strategy is a pure function of the pointer, the dragging rect, the
//! overlay rect, and the candidate rects. It returns candidates best-first;
//! an empty result means "no collision". All reference strategies use a
//! stable sort, so ties keep candidate order.

#[cfg(test)]
#[path = "strategy_test.rs"]
mod strategy_test;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::{Position, Rect};

/// One ranked candidate. `value` is strategy-specific (a distance or a
/// ratio); `rect` identifies the droppable through its owner id.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    pub value: f64,
    pub rect: Rect,
}

/// Everything a strategy may look at.
#[derive(Debug, Clone, Copy)]
pub struct CollisionInput<'a> {
    pub pointer: Position,
    pub dragging: Option<&'a Rect>,
    pub overlay: Option<&'a Rect>,
    pub droppables: &'a [Rect],
}

pub trait IntersectionStrategy {
    /// Candidates best match first.
    fn rank(&self, input: &CollisionInput<'_>) -> Vec<Collision>;
}

impl<F> IntersectionStrategy for F
where
    F: Fn(&CollisionInput<'_>) -> Vec<Collision>,
{
    fn rank(&self, input: &CollisionInput<'_>) -> Vec<Collision> {
        self(input)
    }
}

fn ascending(collisions: &mut [Collision]) {
    collisions.sort_by(|a, b| a.value.total_cmp(&b.value));
}

fn descending(collisions: &mut [Collision]) {
    collisions.sort_by(|a, b| b.value.total_cmp(&a.value));
}

// =============================================================================
// CLOSEST CENTER
// =============================================================================

/// Ascending distance from the pointer to each candidate's center.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosestCenter;

#[must_use]
pub fn closest_center(input: &CollisionInput<'_>) -> Vec<Collision> {
    let mut collisions: Vec<Collision> = input
        .droppables
        .iter()
        .map(|rect| Collision { value: input.pointer.distance(rect.center()), rect: rect.clone() })
        .collect();
    ascending(&mut collisions);
    collisions
}

impl IntersectionStrategy for ClosestCenter {
    fn rank(&self, input: &CollisionInput<'_>) -> Vec<Collision> {
        closest_center(input)
    }
}

// =============================================================================
// RECTANGLE INTERSECTION
// =============================================================================

/// Descending `overlap / overlay area`. Candidates that do not overlap the
/// overlay are left out; a zero-area (or missing) overlay yields nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct RectangleIntersection;

#[must_use]
pub fn rectangle_intersection(input: &CollisionInput<'_>) -> Vec<Collision> {
    let Some(overlay) = input.overlay else {
        return Vec::new();
    };
    let overlay_area = overlay.area();
    if overlay_area <= 0.0 {
        return Vec::new();
    }
    let mut collisions: Vec<Collision> = input
        .droppables
        .iter()
        .filter_map(|rect| {
            let overlap = overlay.intersection_area(rect);
            (overlap > 0.0).then(|| Collision { value: overlap / overlay_area, rect: rect.clone() })
        })
        .collect();
    descending(&mut collisions);
    collisions
}

impl IntersectionStrategy for RectangleIntersection {
    fn rank(&self, input: &CollisionInput<'_>) -> Vec<Collision> {
        rectangle_intersection(input)
    }
}

// =============================================================================
// CLOSEST CORNER
// =============================================================================

/// How the four corner distances collapse into one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    Min,
    Average,
}

impl Aggregation {
    #[must_use]
    pub fn reduce(self, distances: [f64; 4]) -> f64 {
        match self {
            Self::Sum => distances.iter().sum(),
            Self::Min => distances.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Average => distances.iter().sum::<f64>() / 4.0,
        }
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "sum" => Ok(Self::Sum),
            "min" => Ok(Self::Min),
            "average" | "avg" => Ok(Self::Average),
            other => Err(format!("unknown corner aggregation '{other}' (expected sum, min, or average)")),
        }
    }
}

/// Ascending aggregate of the distances between the overlay's corners and
/// each candidate's same-indexed corners. Without a mounted overlay the
/// dragging rect stands in; with neither there is nothing to measure from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosestCorner {
    pub aggregation: Aggregation,
}

impl ClosestCorner {
    #[must_use]
    pub fn new(aggregation: Aggregation) -> Self {
        Self { aggregation }
    }
}

#[must_use]
pub fn closest_corner(input: &CollisionInput<'_>, aggregation: Aggregation) -> Vec<Collision> {
    let Some(source) = input.overlay.or(input.dragging) else {
        return Vec::new();
    };
    let from = source.corners();
    let mut collisions: Vec<Collision> = input
        .droppables
        .iter()
        .map(|rect| {
            let to = rect.corners();
            let distances = [0, 1, 2, 3].map(|i| from[i].distance(to[i]));
            Collision { value: aggregation.reduce(distances), rect: rect.clone() }
        })
        .collect();
    ascending(&mut collisions);
    collisions
}

impl IntersectionStrategy for ClosestCorner {
    fn rank(&self, input: &CollisionInput<'_>) -> Vec<Collision> {
        closest_corner(input, self.aggregation)
    }
}
