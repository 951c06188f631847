//! Cursor to lattice point selection.

use crate::error::{CoreError, CoreResult};
use crate::lattice::{Delta, LatticePoint, PointKind, SquareGrid};
use crate::path::HopStraight;
use kurbo::Point;

/// Upper bound on path-filling steps for one input sample.
pub const MAX_PATH_STEPS: usize = 100;

/// Largest lattice coordinate magnitude that survives doubling as `i32`.
const COORD_LIMIT: f64 = (i32::MAX / 4) as f64;

/// Nearest point of each kind around a lattice-space position, closest first.
///
/// The cell is the one containing the position, the corner is whichever of
/// its four corners is nearest and the edge is the side of that cell the
/// position leans toward.
pub fn candidates(position: Point) -> [LatticePoint; 3] {
    let position = Point::new(
        position.x.clamp(-COORD_LIMIT, COORD_LIMIT),
        position.y.clamp(-COORD_LIMIT, COORD_LIMIT),
    );
    let cell = LatticePoint::new(
        2 * (position.x / 2.0).floor() as i32 + 1,
        2 * (position.y / 2.0).floor() as i32 + 1,
    );
    let corner = LatticePoint::new(
        2 * (position.x / 2.0).round() as i32,
        2 * (position.y / 2.0).round() as i32,
    );
    let dx = position.x - f64::from(cell.x);
    let dy = position.y - f64::from(cell.y);
    let sign = |v: f64| if v < 0.0 { -1 } else { 1 };
    let edge = if dx.abs() >= dy.abs() {
        cell.offset(sign(dx), 0)
    } else {
        cell.offset(0, sign(dy))
    };

    let mut points = [cell, edge, corner];
    points.sort_by(|a, b| {
        a.to_f64()
            .distance(position)
            .total_cmp(&b.to_f64().distance(position))
    });
    points
}

/// Turn a cursor position (grid pixels) into the lattice points it selects.
///
/// Without a `previous` point the in-bounds candidates of the requested kinds
/// are returned as-is. With one, a candidate one permitted delta away is
/// returned alone; otherwise the gap is filled with [`HopStraight`]. A cursor
/// off the grid fills toward the nearest in-bounds point of the requested
/// kinds.
pub fn select_points(
    grid: &SquareGrid,
    cursor: Point,
    kinds: &[PointKind],
    deltas: &[Delta],
    previous: Option<LatticePoint>,
) -> CoreResult<Vec<LatticePoint>> {
    let position = grid.pixel_to_lattice(cursor);
    let accepted = |p: &LatticePoint| kinds.contains(&p.kind()) && grid.in_bounds(*p);
    let found: Vec<LatticePoint> = candidates(position).into_iter().filter(accepted).collect();

    let Some(previous) = previous else {
        return Ok(found);
    };
    if found.first() == Some(&previous) {
        return Ok(Vec::new());
    }
    let adjacent = found.iter().find(|c| {
        deltas
            .iter()
            .any(|d| previous.offset(d.dx, d.dy) == **c)
    });
    if let Some(&point) = adjacent {
        return Ok(vec![point]);
    }
    if found.contains(&previous) {
        return Ok(Vec::new());
    }

    // An off-grid cursor steers toward the closest point still on the grid.
    let target = match found.first() {
        Some(point) => *point,
        None => match grid.nearest_point(position, kinds) {
            Some(point) if point != previous => point,
            _ => return Ok(Vec::new()),
        },
    };
    let mut walk = HopStraight::new(previous.to_f64(), target.to_f64(), deltas);
    let mut points = Vec::new();
    let mut steps = 0;
    while let Some(next) = walk.step() {
        steps += 1;
        if steps > MAX_PATH_STEPS {
            return Err(CoreError::PathLimitExceeded {
                limit: MAX_PATH_STEPS,
            });
        }
        let point = LatticePoint::round(next);
        walk.resume_from(point.to_f64());
        if accepted(&point) {
            points.push(point);
        }
    }
    log::debug!("path fill from {previous} produced {} points", points.len());
    Ok(points)
}
