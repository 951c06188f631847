//! Property tests for lattice geometry.
//!
//! 1. Point kind follows coordinate parity
//! 2. Selected points always match the requested kinds
//! 3. Shrinkwrap loops trace exactly the region boundary, for positive and
//!    negative insets
//! 4. With previous-point exclusion a query reaches every point at most once

use gridink_core::lattice::{
    Delta, GridBounds, LatticePoint, PointKind, Query, QueryOptions, QueryResult, SquareGrid,
    point_kind,
};
use gridink_core::{CoreError, Settings, select_points, shrinkwrap};
use kurbo::Point;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};

fn grid() -> SquareGrid {
    SquareGrid::new(GridBounds::new(0, 0, 5, 5), &Settings::default())
}

fn kinds_strategy() -> impl Strategy<Value = Vec<PointKind>> {
    prop::sample::subsequence(PointKind::ALL.to_vec(), 1..=3)
}

fn cells_strategy() -> impl Strategy<Value = BTreeSet<LatticePoint>> {
    prop::collection::btree_set((0i32..5, 0i32..5), 0..14).prop_map(|cells| {
        cells
            .into_iter()
            .map(|(x, y)| LatticePoint::new(2 * x + 1, 2 * y + 1))
            .collect()
    })
}

/// Number of cell edges bordering exactly one cell of the set.
fn boundary_edges(cells: &BTreeSet<LatticePoint>) -> usize {
    let mut counts: HashMap<LatticePoint, usize> = HashMap::new();
    for cell in cells {
        for (dx, dy) in [(0, -1), (1, 0), (0, 1), (-1, 0)] {
            *counts.entry(cell.offset(dx, dy)).or_default() += 1;
        }
    }
    counts.values().filter(|&&n| n == 1).count()
}

fn perimeter(points: &[Point]) -> f64 {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.distance(*b))
        .sum()
}

fn collect_points(results: &[QueryResult], into: &mut Vec<LatticePoint>) {
    for result in results {
        if let Some(points) = result.points() {
            for p in points {
                into.push(p.point);
                collect_points(&p.results, into);
            }
        }
    }
}

proptest! {
    #[test]
    fn point_kind_follows_parity(x in -10_000i32..10_000, y in -10_000i32..10_000) {
        let expected = match (x % 2 == 0, y % 2 == 0) {
            (true, true) => PointKind::Corner,
            (false, false) => PointKind::Cell,
            _ => PointKind::Edge,
        };
        prop_assert_eq!(point_kind(x, y), expected);
        prop_assert_eq!(LatticePoint::new(x, y).kind(), expected);
    }

    #[test]
    fn selection_respects_kind_filter(
        x in 0.0f64..360.0,
        y in 0.0f64..360.0,
        kinds in kinds_strategy(),
        previous in prop::option::of((0i32..=10, 0i32..=10)),
        all_neighbors in any::<bool>(),
    ) {
        let deltas: &[Delta] = if all_neighbors { &Delta::ALL_NEIGHBORS } else { &Delta::ORTHOGONAL };
        let grid = grid();
        let previous = previous.map(|(px, py)| LatticePoint::new(px, py));
        match select_points(&grid, Point::new(x, y), &kinds, deltas, previous) {
            Ok(points) => {
                for p in points {
                    prop_assert!(kinds.contains(&p.kind()), "{p} not in {kinds:?}");
                    prop_assert!(grid.in_bounds(p));
                }
            }
            Err(err) => prop_assert!(matches!(err, CoreError::PathLimitExceeded { .. }), "{err:?}"),
        }
    }

    #[test]
    fn shrinkwrap_traces_boundary(cells in cells_strategy(), negative in any::<bool>()) {
        let inset = if negative { -1e-6 } else { 1e-6 };
        let loops = shrinkwrap(cells.iter().copied(), inset).unwrap();
        if cells.is_empty() {
            prop_assert!(loops.is_empty());
        } else {
            prop_assert!(!loops.is_empty());
        }

        let mut total = 0.0;
        for l in &loops {
            prop_assert!(l.len() >= 4);
            prop_assert_eq!(l.len() % 2, 0);
            for (a, b) in l.iter().zip(l.iter().cycle().skip(1)) {
                let axis_aligned = (a.x - b.x).abs() < 1e-3 || (a.y - b.y).abs() < 1e-3;
                prop_assert!(axis_aligned, "{a:?} -> {b:?}");
            }
            total += perimeter(l);
        }
        // Every boundary edge is two lattice units long and walked once.
        let expected = 2.0 * boundary_edges(&cells) as f64;
        prop_assert!((total - expected).abs() < 1e-3, "{total} != {expected}");
    }

    #[test]
    fn shrinkwrap_inset_moves_corners_inward(cells in cells_strategy()) {
        prop_assume!(!cells.is_empty());
        let inset = shrinkwrap(cells.iter().copied(), 0.25).unwrap();
        for corner in inset.iter().flatten() {
            let cell = LatticePoint::new(
                2 * (corner.x / 2.0).floor() as i32 + 1,
                2 * (corner.y / 2.0).floor() as i32 + 1,
            );
            prop_assert!(cells.contains(&cell), "{corner:?} outside region");
        }
    }

    #[test]
    fn query_reaches_points_once(
        start in cells_strategy(),
        exclude in any::<bool>(),
    ) {
        let grid = grid();
        let start: Vec<LatticePoint> = start.into_iter().collect();
        let query = [Query::expand(
            PointKind::Corner,
            vec![Query::expand(PointKind::Cell, vec![Query::expand(PointKind::Edge, vec![])])],
        )];
        let options = QueryOptions { exclude_previous_points: exclude, ..Default::default() };
        let results = grid.query(&start, &query, &options).unwrap();

        let mut reached = Vec::new();
        collect_points(&results, &mut reached);
        prop_assert!(reached.iter().all(|p| grid.in_bounds(*p)));
        if exclude {
            let unique: HashSet<_> = reached.iter().collect();
            prop_assert_eq!(unique.len(), reached.len());
            prop_assert!(reached.iter().all(|p| !start.contains(p)));
        }
    }
}
