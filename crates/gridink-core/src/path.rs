//! Gap filling between a committed lattice point and a fast-moving cursor.

use crate::lattice::Delta;
use kurbo::{Point, Vec2};

/// Greedy walk from a lattice point toward a cursor using only permitted moves.
///
/// Each [`step`](HopStraight::step) applies the delta that minimises the
/// distance to the cursor plus the distance from the ideal straight line, so
/// the produced chain hugs the segment between the two positions. The walk
/// stops once it has travelled as far from the start as the cursor is.
///
/// Callers may round the returned point and hand it back through
/// [`resume_from`](HopStraight::resume_from) to stop floating point drift.
#[derive(Debug, Clone)]
pub struct HopStraight {
    start: Point,
    cursor: Point,
    current: Point,
    deltas: Vec<Vec2>,
    target_distance: f64,
}

impl HopStraight {
    /// Prepare a walk. Deltas pointing more than 90 degrees away from the
    /// cursor are discarded so the walk can never double back.
    pub fn new(start: Point, cursor: Point, deltas: &[Delta]) -> Self {
        let heading = cursor - start;
        let deltas = if heading.hypot2() == 0.0 {
            Vec::new()
        } else {
            deltas
                .iter()
                .map(|d| d.to_vec2())
                .filter(|d| d.dot(heading) > 0.0)
                .collect()
        };
        Self {
            start,
            cursor,
            current: start,
            deltas,
            target_distance: heading.hypot(),
        }
    }

    /// Position reached so far.
    pub fn current(&self) -> Point {
        self.current
    }

    /// Whether any delta survived the direction filter.
    pub fn is_degenerate(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Replace the current position, typically with a rounded copy of the
    /// last point returned by [`step`](Self::step).
    pub fn resume_from(&mut self, point: Point) {
        self.current = point;
    }

    /// Advance by one delta, or `None` once the walk is complete.
    pub fn step(&mut self) -> Option<Point> {
        if self.current.distance(self.start) >= self.target_distance {
            return None;
        }
        let best = self
            .deltas
            .iter()
            .map(|&delta| self.current + delta)
            .min_by(|a, b| self.cost(*a).total_cmp(&self.cost(*b)))?;
        self.current = best;
        Some(best)
    }

    fn cost(&self, candidate: Point) -> f64 {
        candidate.distance(self.cursor) + self.distance_to_line(candidate)
    }

    /// Distance from `point` to the start-to-cursor segment.
    fn distance_to_line(&self, point: Point) -> f64 {
        let segment = self.cursor - self.start;
        let t = ((point - self.start).dot(segment) / segment.hypot2()).clamp(0.0, 1.0);
        point.distance(self.start + segment * t)
    }
}

impl Iterator for HopStraight {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        self.step()
    }
}
