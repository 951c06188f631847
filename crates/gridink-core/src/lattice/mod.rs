//! Square lattice addressed by doubled integer coordinates.
//!
//! Cells sit at odd/odd coordinates, corners at even/even and edges at the
//! mixed-parity positions between them. Doubling keeps every feature of the
//! grid on integer coordinates, so one point type covers all three.

mod id;
mod query;

pub use id::{OBJECT_ID_SEPARATOR, object_id, parse_object_id, parse_point_id, point_id};
pub use query::{PointResult, Query, QueryLeaf, QueryOptions, QueryResult, RowsResult};

use crate::settings::Settings;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Kind of lattice point, derived from coordinate parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointKind {
    Cell,
    Edge,
    Corner,
}

impl PointKind {
    /// All kinds, in a stable order.
    pub const ALL: [PointKind; 3] = [PointKind::Cell, PointKind::Edge, PointKind::Corner];
}

/// Classify a doubled coordinate pair.
pub fn point_kind(x: i32, y: i32) -> PointKind {
    match (x.rem_euclid(2) == 0, y.rem_euclid(2) == 0) {
        (true, true) => PointKind::Corner,
        (false, false) => PointKind::Cell,
        _ => PointKind::Edge,
    }
}

/// A point on the doubled lattice. Its kind is always derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LatticePoint {
    pub x: i32,
    pub y: i32,
}

impl LatticePoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn kind(self) -> PointKind {
        point_kind(self.x, self.y)
    }

    /// Offset by a lattice delta.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The point as floating coordinates in lattice space.
    pub fn to_f64(self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }

    /// Nearest lattice point to a floating lattice-space position.
    pub fn round(point: Point) -> Self {
        Self::new(point.x.round() as i32, point.y.round() as i32)
    }

    /// Canonical id string (`"x,y"`).
    pub fn id(self) -> String {
        point_id(self)
    }
}

impl fmt::Display for LatticePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// A unit move on the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delta {
    pub dx: i32,
    pub dy: i32,
}

impl Delta {
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(f64::from(self.dx), f64::from(self.dy))
    }

    /// Moves between edge-adjacent cells (or corners).
    pub const ORTHOGONAL: [Delta; 4] = [
        Delta::new(0, -2),
        Delta::new(2, 0),
        Delta::new(0, 2),
        Delta::new(-2, 0),
    ];

    /// Moves between cells (or corners) sharing an edge or a corner.
    pub const ALL_NEIGHBORS: [Delta; 8] = [
        Delta::new(0, -2),
        Delta::new(2, -2),
        Delta::new(2, 0),
        Delta::new(2, 2),
        Delta::new(0, 2),
        Delta::new(-2, 2),
        Delta::new(-2, 0),
        Delta::new(-2, -2),
    ];
}

/// Compass direction used to order points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compass {
    North,
    East,
    South,
    West,
}

/// Shape whose inscribed radius is requested through [`QueryLeaf::MaxRadius`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RadiusShape {
    Circle,
    Square,
}

const DIAGONAL: [(i32, i32); 4] = [(-1, -1), (1, -1), (1, 1), (-1, 1)];
const AXIS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
const AXIS_DOUBLE: [(i32, i32); 4] = [(0, -2), (2, 0), (0, 2), (-2, 0)];
const HORIZONTAL: [(i32, i32); 2] = [(-1, 0), (1, 0)];
const VERTICAL: [(i32, i32); 2] = [(0, -1), (0, 1)];

/// Deltas that expand `point` to its neighbours of kind `to`.
///
/// Returns `None` for transitions the lattice does not define.
pub fn neighbor_deltas(point: LatticePoint, to: PointKind) -> Option<&'static [(i32, i32)]> {
    let horizontal_edge = point.x.rem_euclid(2) == 1;
    match (point.kind(), to) {
        (PointKind::Cell, PointKind::Corner) | (PointKind::Corner, PointKind::Cell) => {
            Some(&DIAGONAL)
        }
        (PointKind::Cell, PointKind::Edge) | (PointKind::Corner, PointKind::Edge) => Some(&AXIS),
        (PointKind::Cell, PointKind::Cell) | (PointKind::Corner, PointKind::Corner) => {
            Some(&AXIS_DOUBLE)
        }
        (PointKind::Edge, PointKind::Cell) if horizontal_edge => Some(&VERTICAL),
        (PointKind::Edge, PointKind::Cell) => Some(&HORIZONTAL),
        (PointKind::Edge, PointKind::Corner) if horizontal_edge => Some(&HORIZONTAL),
        (PointKind::Edge, PointKind::Corner) => Some(&VERTICAL),
        (PointKind::Edge, PointKind::Edge) => None,
    }
}

/// Grid extent in cell units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridBounds {
    pub x0: i32,
    pub y0: i32,
    pub width: u32,
    pub height: u32,
}

impl GridBounds {
    pub fn new(x0: i32, y0: i32, width: u32, height: u32) -> Self {
        Self { x0, y0, width, height }
    }

    /// Whether a lattice point lies inside the bounds (edges of the outer
    /// border included).
    pub fn contains(&self, point: LatticePoint) -> bool {
        let x = f64::from(point.x) / 2.0;
        let y = f64::from(point.y) / 2.0;
        let (x0, y0) = (f64::from(self.x0), f64::from(self.y0));
        x0 <= x && x <= x0 + f64::from(self.width) && y0 <= y && y <= y0 + f64::from(self.height)
    }

    /// Pull a lattice-space position onto the bounds.
    pub fn clamp_lattice(&self, point: Point) -> Point {
        let (xs, ys) = (self.lattice_range_x(), self.lattice_range_y());
        Point::new(
            point.x.clamp(f64::from(*xs.start()), f64::from(*xs.end())),
            point.y.clamp(f64::from(*ys.start()), f64::from(*ys.end())),
        )
    }

    fn lattice_range_x(&self) -> RangeInclusive<i32> {
        lattice_span(self.x0, self.width)
    }

    fn lattice_range_y(&self) -> RangeInclusive<i32> {
        lattice_span(self.y0, self.height)
    }
}

fn lattice_span(origin: i32, extent: u32) -> RangeInclusive<i32> {
    let end = origin.saturating_add(i32::try_from(extent).unwrap_or(i32::MAX));
    origin.saturating_mul(2)..=end.saturating_mul(2)
}

/// Coordinate closest to `v` inside `range` with the requested parity.
fn nearest_with_parity(v: f64, odd: bool, range: &RangeInclusive<i32>) -> Option<i32> {
    let matches = |n: i32| (n.rem_euclid(2) == 1) == odd;
    let (lo, hi) = (*range.start(), *range.end());
    let first = if matches(lo) { lo } else { lo.checked_add(1)? };
    let last = if matches(hi) { hi } else { hi.checked_sub(1)? };
    if first > last {
        return None;
    }
    let offset = if odd { 1.0 } else { 0.0 };
    let guess = 2.0 * ((v - offset) / 2.0).round() + offset;
    Some(guess.clamp(f64::from(first), f64::from(last)) as i32)
}

/// A bounded square lattice with its pixel mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquareGrid {
    pub bounds: GridBounds,
    pub cell_size: f64,
    pub border_padding: f64,
}

impl SquareGrid {
    pub fn new(bounds: GridBounds, settings: &Settings) -> Self {
        Self {
            bounds,
            cell_size: settings.cell_size,
            border_padding: settings.border_padding,
        }
    }

    /// Classify a coordinate pair.
    pub fn point_kind(&self, x: i32, y: i32) -> PointKind {
        point_kind(x, y)
    }

    pub fn in_bounds(&self, point: LatticePoint) -> bool {
        self.bounds.contains(point)
    }

    /// Closest in-bounds point of any of `kinds` to a lattice-space position.
    pub fn nearest_point(&self, position: Point, kinds: &[PointKind]) -> Option<LatticePoint> {
        let (xs, ys) = (self.bounds.lattice_range_x(), self.bounds.lattice_range_y());
        let position = self.bounds.clamp_lattice(position);
        kinds
            .iter()
            .flat_map(|kind| -> &'static [(bool, bool)] {
                match kind {
                    PointKind::Cell => &[(true, true)],
                    PointKind::Corner => &[(false, false)],
                    PointKind::Edge => &[(true, false), (false, true)],
                }
            })
            .filter_map(|&(odd_x, odd_y)| {
                Some(LatticePoint::new(
                    nearest_with_parity(position.x, odd_x, &xs)?,
                    nearest_with_parity(position.y, odd_y, &ys)?,
                ))
            })
            .min_by(|a, b| {
                a.to_f64()
                    .distance(position)
                    .total_cmp(&b.to_f64().distance(position))
            })
    }

    /// All in-bounds points of one kind, row by row.
    pub fn all_points(&self, kind: PointKind) -> impl Iterator<Item = LatticePoint> + use<> {
        let xs = self.bounds.lattice_range_x();
        self.bounds
            .lattice_range_y()
            .flat_map(move |y| xs.clone().map(move |x| LatticePoint::new(x, y)))
            .filter(move |p| p.kind() == kind)
    }

    /// Size of the drawing surface including padding.
    pub fn pixel_bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            f64::from(self.bounds.width) * self.cell_size + self.border_padding * 2.0,
            f64::from(self.bounds.height) * self.cell_size + self.border_padding * 2.0,
        )
    }

    fn half_cell(&self) -> f64 {
        self.cell_size / 2.0
    }

    /// Map a floating lattice-space position to pixels.
    pub fn lattice_to_pixel(&self, point: Point) -> Point {
        Point::new(
            self.border_padding + (point.x - f64::from(self.bounds.x0) * 2.0) * self.half_cell(),
            self.border_padding + (point.y - f64::from(self.bounds.y0) * 2.0) * self.half_cell(),
        )
    }

    /// Map pixels back into floating lattice space.
    pub fn pixel_to_lattice(&self, point: Point) -> Point {
        Point::new(
            (point.x - self.border_padding) / self.half_cell() + f64::from(self.bounds.x0) * 2.0,
            (point.y - self.border_padding) / self.half_cell() + f64::from(self.bounds.y0) * 2.0,
        )
    }

    /// Pixel position of a lattice point.
    pub fn svg_point(&self, point: LatticePoint) -> Point {
        self.lattice_to_pixel(point.to_f64())
    }

    /// The four corners of a cell, clockwise from the top left.
    pub fn svg_outline(&self, cell: LatticePoint) -> [Point; 4] {
        [(-1, -1), (1, -1), (1, 1), (-1, 1)].map(|(dx, dy)| self.svg_point(cell.offset(dx, dy)))
    }

    /// Largest radius of a shape centred on a point of `kind` that stays
    /// clear of its neighbours.
    pub fn max_radius(&self, kind: PointKind, shape: RadiusShape) -> f64 {
        let factor = match (kind, shape) {
            (PointKind::Cell, _) => 0.5,
            (PointKind::Edge, RadiusShape::Circle) => 0.25,
            (PointKind::Edge, RadiusShape::Square) => 0.2,
            (PointKind::Corner, RadiusShape::Circle) => 0.35,
            (PointKind::Corner, RadiusShape::Square) => 0.25,
        };
        self.cell_size * factor
    }
}
