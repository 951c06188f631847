//! Boundary polygons ("shrinkwrap") for sets of cells.
//!
//! Every cell toggles its four edges in a parity set so that shared edges
//! cancel and only the outer boundary remains. The boundary is then walked
//! wall-follower style with the region on the right-hand side, recording a
//! corner at every turn. Coordinates are doubled lattice units throughout.

use crate::error::{CoreError, CoreResult};
use crate::lattice::{LatticePoint, PointKind};
use kurbo::Point;
use std::collections::{BTreeSet, HashSet};

type Dir = (i32, i32);

const CELL_EDGES: [Dir; 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

fn right((dx, dy): Dir) -> Dir {
    (-dy, dx)
}

fn left((dx, dy): Dir) -> Dir {
    (dy, -dx)
}

fn step(point: LatticePoint, (dx, dy): Dir, times: i32) -> LatticePoint {
    point.offset(dx * times, dy * times)
}

/// A corner of the walked boundary with the directions entering and leaving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Turn {
    corner: LatticePoint,
    incoming: Dir,
    outgoing: Dir,
}

/// Compute the boundary loops of every contiguous group of `cells`.
///
/// A positive `inset` walks each region clockwise and pulls the corners into
/// it. A negative `inset` walks the complement instead (counter-clockwise
/// around the region) and pushes corners outward by `|inset|`, which merges
/// diagonally touching cells into one loop instead of two overlapping ones.
/// Non-cell points are ignored.
pub fn shrinkwrap<I>(cells: I, inset: f64) -> CoreResult<Vec<Vec<Point>>>
where
    I: IntoIterator<Item = LatticePoint>,
{
    let cells: HashSet<LatticePoint> = cells
        .into_iter()
        .filter(|c| c.kind() == PointKind::Cell)
        .collect();
    let outward = inset < 0.0;
    let inside = |cell: LatticePoint| cells.contains(&cell) != outward;

    let mut edges_left = BTreeSet::new();
    for &cell in &cells {
        for dir in CELL_EDGES {
            let edge = step(cell, dir, 1);
            if !edges_left.remove(&edge) {
                edges_left.insert(edge);
            }
        }
    }

    let limit = edges_left.len() + 1;
    let mut loops = Vec::new();
    let mut walks = 0;
    while let Some(&first) = edges_left.iter().next() {
        walks += 1;
        if walks > limit {
            return Err(CoreError::OutlineLimitExceeded { limit });
        }
        let turns = walk_loop(first, &inside, &mut edges_left, limit)?;
        loops.push(apply_inset(&turns, inset.abs()));
    }
    log::debug!("shrinkwrap: {} cells -> {} loops", cells.len(), loops.len());
    Ok(loops)
}

/// Starting corner and direction for an edge so that the inside lies to the right.
fn start_of(edge: LatticePoint, inside: &impl Fn(LatticePoint) -> bool) -> (LatticePoint, Dir) {
    if edge.x.rem_euclid(2) == 1 {
        // Horizontal edge: cells above and below.
        if inside(edge.offset(0, 1)) {
            (edge.offset(-1, 0), (1, 0))
        } else {
            (edge.offset(1, 0), (-1, 0))
        }
    } else if inside(edge.offset(1, 0)) {
        (edge.offset(0, 1), (0, -1))
    } else {
        (edge.offset(0, -1), (0, 1))
    }
}

fn walk_loop(
    first: LatticePoint,
    inside: &impl Fn(LatticePoint) -> bool,
    edges_left: &mut BTreeSet<LatticePoint>,
    limit: usize,
) -> CoreResult<Vec<Turn>> {
    let (start, start_dir) = start_of(first, inside);
    let mut corner = start;
    let mut dir = start_dir;
    let mut turns = Vec::new();

    for _ in 0..limit {
        edges_left.remove(&step(corner, dir, 1));
        corner = step(corner, dir, 2);

        let ahead = step(corner, dir, 1);
        let side = right(dir);
        let next = if !inside(step(ahead, side, 1)) {
            side
        } else if inside(step(ahead, side, -1)) {
            left(dir)
        } else {
            dir
        };
        if next != dir {
            turns.push(Turn {
                corner,
                incoming: dir,
                outgoing: next,
            });
        }
        dir = next;

        if corner == start && dir == start_dir {
            return Ok(turns);
        }
    }
    Err(CoreError::OutlineLimitExceeded { limit })
}

/// Offset each corner perpendicular to both of its edges. Summing the two
/// right-hand normals lands exactly on the mitred corner for right angles,
/// whether the turn is convex or concave.
fn apply_inset(turns: &[Turn], distance: f64) -> Vec<Point> {
    turns
        .iter()
        .map(|turn| {
            let (ax, ay) = right(turn.incoming);
            let (bx, by) = right(turn.outgoing);
            Point::new(
                f64::from(turn.corner.x) + distance * f64::from(ax + bx),
                f64::from(turn.corner.y) + distance * f64::from(ay + by),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(x: i32, y: i32) -> LatticePoint {
        LatticePoint::new(x, y)
    }

    #[test]
    fn test_single_cell() {
        let loops = shrinkwrap([cell(1, 1)], 0.0).unwrap();
        assert_eq!(loops.len(), 1);
        assert_eq!(
            loops[0],
            vec![
                Point::new(0.0, 0.0),
                Point::new(2.0, 0.0),
                Point::new(2.0, 2.0),
                Point::new(0.0, 2.0),
            ]
        );
    }

    #[test]
    fn test_single_cell_inset() {
        let loops = shrinkwrap([cell(1, 1)], 0.25).unwrap();
        assert_eq!(
            loops[0],
            vec![
                Point::new(0.25, 0.25),
                Point::new(1.75, 0.25),
                Point::new(1.75, 1.75),
                Point::new(0.25, 1.75),
            ]
        );
    }

    #[test]
    fn test_single_cell_negative_inset_grows() {
        let loops = shrinkwrap([cell(1, 1)], -0.5).unwrap();
        assert_eq!(loops.len(), 1);
        let xs: Vec<f64> = loops[0].iter().map(|p| p.x).collect();
        let ys: Vec<f64> = loops[0].iter().map(|p| p.y).collect();
        assert_eq!(loops[0].len(), 4);
        assert!(xs.iter().all(|&x| (x + 0.5).abs() < 1e-9 || (x - 2.5).abs() < 1e-9));
        assert!(ys.iter().all(|&y| (y + 0.5).abs() < 1e-9 || (y - 2.5).abs() < 1e-9));
    }

    #[test]
    fn test_adjacent_cells_merge() {
        let loops = shrinkwrap([cell(1, 1), cell(3, 1)], 0.0).unwrap();
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 4);
        assert!(loops[0].contains(&Point::new(4.0, 2.0)));
    }

    #[test]
    fn test_diagonal_cells_stay_separate() {
        let loops = shrinkwrap([cell(1, 1), cell(3, 3)], 0.0).unwrap();
        assert_eq!(loops.len(), 2);
        assert!(loops.iter().all(|l| l.len() == 4));
    }

    #[test]
    fn test_diagonal_cells_negative_inset_single_walk() {
        let loops = shrinkwrap([cell(1, 1), cell(3, 3)], -0.25).unwrap();
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 8);
    }

    #[test]
    fn test_l_shape_has_concave_corner() {
        let loops = shrinkwrap([cell(1, 1), cell(1, 3), cell(3, 3)], 0.5).unwrap();
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 6);
        // The inner corner at (2, 2) moves into the region on both axes.
        assert!(loops[0].contains(&Point::new(1.5, 2.5)));
    }

    #[test]
    fn test_ring_produces_hole() {
        let ring: Vec<_> = [(1, 1), (3, 1), (5, 1), (1, 3), (5, 3), (1, 5), (3, 5), (5, 5)]
            .into_iter()
            .map(|(x, y)| cell(x, y))
            .collect();
        let loops = shrinkwrap(ring, 0.0).unwrap();
        assert_eq!(loops.len(), 2);
        assert!(loops.iter().all(|l| l.len() == 4));
    }

    #[test]
    fn test_empty_and_non_cells() {
        assert!(shrinkwrap([], 0.0).unwrap().is_empty());
        assert!(shrinkwrap([LatticePoint::new(0, 0)], 0.0).unwrap().is_empty());
    }
}
