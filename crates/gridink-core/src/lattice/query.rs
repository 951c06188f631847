//! Declarative traversal over the lattice.
//!
//! A query is a tree. Expansion nodes step from every current point to its
//! neighbours of one kind; leaves turn the current points into geometry a
//! renderer can use. Transitions and leaves the lattice does not define are
//! reported when the traversal reaches them.

use super::{Compass, LatticePoint, PointKind, RadiusShape, SquareGrid};
use crate::error::{CoreError, CoreResult};
use crate::outline::shrinkwrap;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One node of a query tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Query {
    /// Step to neighbours of `kind`, then evaluate `then` on each of them.
    Expand { kind: PointKind, then: Vec<Query> },
    Leaf(QueryLeaf),
}

impl Query {
    pub fn expand(kind: PointKind, then: Vec<Query>) -> Self {
        Self::Expand { kind, then }
    }
}

impl From<QueryLeaf> for Query {
    fn from(leaf: QueryLeaf) -> Self {
        Self::Leaf(leaf)
    }
}

/// Derived values computed from the current set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryLeaf {
    /// Pixel position of every point.
    SvgPoint,
    /// Pixel polygon of every cell.
    SvgOutline,
    /// Inscribed radius of a shape drawn on every point.
    MaxRadius(RadiusShape),
    /// In-bounds points of the same kind sharing each point's row and column,
    /// the point itself included in both.
    Rows,
    /// The points ordered along a direction, grouped by the orthogonal axis.
    Sorted(Compass),
    /// Boundary loops of the cells, inset by the given pixel distance.
    Shrinkwrap(f64),
}

impl QueryLeaf {
    fn name(self) -> &'static str {
        match self {
            Self::SvgPoint => "svgPoint",
            Self::SvgOutline => "svgOutline",
            Self::MaxRadius(_) => "maxRadius",
            Self::Rows => "rows",
            Self::Sorted(_) => "sorted",
            Self::Shrinkwrap(_) => "shrinkwrap",
        }
    }
}

/// Traversal options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Points that are never reached nor expanded from.
    pub blacklist: HashSet<LatticePoint>,
    pub include_out_of_bounds: bool,
    /// Reach every point at most once per query, whichever path gets there
    /// first.
    pub exclude_previous_points: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            blacklist: HashSet::new(),
            include_out_of_bounds: false,
            exclude_previous_points: true,
        }
    }
}

/// A reached point with the results of its sub-queries.
#[derive(Debug, Clone, PartialEq)]
pub struct PointResult {
    pub point: LatticePoint,
    pub results: Vec<QueryResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowsResult {
    pub point: LatticePoint,
    pub row: Vec<LatticePoint>,
    pub column: Vec<LatticePoint>,
}

/// Result of one query node. Per-point leaves keep the order of the points
/// they were evaluated on.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Points(Vec<PointResult>),
    SvgPoints(Vec<Point>),
    SvgOutlines(Vec<[Point; 4]>),
    MaxRadius(Vec<f64>),
    Rows(Vec<RowsResult>),
    Sorted(Vec<LatticePoint>),
    Shrinkwrap(Vec<Vec<Point>>),
}

impl QueryResult {
    pub fn points(&self) -> Option<&[PointResult]> {
        match self {
            Self::Points(points) => Some(points),
            _ => None,
        }
    }
}

struct Traversal<'a> {
    grid: &'a SquareGrid,
    options: &'a QueryOptions,
    visited: HashSet<LatticePoint>,
}

impl SquareGrid {
    /// Evaluate `queries` starting from `points`, returning one result per
    /// query.
    pub fn query(
        &self,
        points: &[LatticePoint],
        queries: &[Query],
        options: &QueryOptions,
    ) -> CoreResult<Vec<QueryResult>> {
        let start: Vec<LatticePoint> = points
            .iter()
            .copied()
            .filter(|p| !options.blacklist.contains(p))
            .collect();
        let mut traversal = Traversal {
            grid: self,
            options,
            visited: start.iter().copied().collect(),
        };
        traversal.evaluate(&start, queries)
    }
}

impl Traversal<'_> {
    fn evaluate(
        &mut self,
        points: &[LatticePoint],
        queries: &[Query],
    ) -> CoreResult<Vec<QueryResult>> {
        queries
            .iter()
            .map(|query| match query {
                Query::Expand { kind, then } => {
                    let reached = self.expand(points, *kind)?;
                    let mut results = Vec::with_capacity(reached.len());
                    for point in reached {
                        results.push(PointResult {
                            point,
                            results: self.evaluate(&[point], then)?,
                        });
                    }
                    Ok(QueryResult::Points(results))
                }
                Query::Leaf(leaf) => self.leaf(points, *leaf),
            })
            .collect()
    }

    fn expand(&mut self, points: &[LatticePoint], to: PointKind) -> CoreResult<Vec<LatticePoint>> {
        let mut reached = Vec::new();
        let mut seen = HashSet::new();
        for &point in points {
            let deltas = super::neighbor_deltas(point, to).ok_or(
                CoreError::UnsupportedTransition {
                    from: point.kind(),
                    to,
                },
            )?;
            for &(dx, dy) in deltas {
                let next = point.offset(dx, dy);
                if self.options.blacklist.contains(&next)
                    || (!self.options.include_out_of_bounds && !self.grid.in_bounds(next))
                    || !seen.insert(next)
                {
                    continue;
                }
                if self.options.exclude_previous_points && !self.visited.insert(next) {
                    continue;
                }
                reached.push(next);
            }
        }
        Ok(reached)
    }

    fn leaf(&self, points: &[LatticePoint], leaf: QueryLeaf) -> CoreResult<QueryResult> {
        let grid = self.grid;
        let require_cells = || {
            match points.iter().find(|p| p.kind() != PointKind::Cell) {
                Some(p) => Err(CoreError::UnsupportedLeaf {
                    kind: p.kind(),
                    leaf: leaf.name(),
                }),
                None => Ok(()),
            }
        };
        Ok(match leaf {
            QueryLeaf::SvgPoint => {
                QueryResult::SvgPoints(points.iter().map(|&p| grid.svg_point(p)).collect())
            }
            QueryLeaf::SvgOutline => {
                require_cells()?;
                QueryResult::SvgOutlines(points.iter().map(|&p| grid.svg_outline(p)).collect())
            }
            QueryLeaf::MaxRadius(shape) => QueryResult::MaxRadius(
                points.iter().map(|p| grid.max_radius(p.kind(), shape)).collect(),
            ),
            QueryLeaf::Rows => QueryResult::Rows(
                points
                    .iter()
                    .map(|&point| {
                        let (row, column) = grid
                            .all_points(point.kind())
                            .filter(|p| p.y == point.y || p.x == point.x)
                            .fold((Vec::new(), Vec::new()), |(mut row, mut column), p| {
                                if p.y == point.y {
                                    row.push(p);
                                }
                                if p.x == point.x {
                                    column.push(p);
                                }
                                (row, column)
                            });
                        RowsResult { point, row, column }
                    })
                    .collect(),
            ),
            QueryLeaf::Sorted(direction) => {
                let mut sorted = points.to_vec();
                sorted.sort_by_key(|&p| sort_key(p, direction));
                QueryResult::Sorted(sorted)
            }
            QueryLeaf::Shrinkwrap(inset) => {
                require_cells()?;
                let loops = shrinkwrap(points.iter().copied(), inset / grid.half_cell())?;
                QueryResult::Shrinkwrap(
                    loops
                        .into_iter()
                        .map(|l| l.into_iter().map(|p| grid.lattice_to_pixel(p)).collect())
                        .collect(),
                )
            }
        })
    }
}

/// Orthogonal axis first, then the position along `direction`.
fn sort_key(point: LatticePoint, direction: Compass) -> (i32, i32) {
    match direction {
        Compass::East => (point.y, point.x),
        Compass::West => (point.y, -point.x),
        Compass::South => (point.x, point.y),
        Compass::North => (point.x, -point.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::GridBounds;
    use crate::settings::Settings;

    fn grid() -> SquareGrid {
        SquareGrid::new(GridBounds::new(0, 0, 3, 3), &Settings::default())
    }

    fn reached(result: &QueryResult) -> Vec<LatticePoint> {
        result.points().unwrap().iter().map(|r| r.point).collect()
    }

    #[test]
    fn test_cell_to_corners() {
        let results = grid()
            .query(
                &[LatticePoint::new(1, 1)],
                &[Query::expand(PointKind::Corner, vec![])],
                &QueryOptions::default(),
            )
            .unwrap();
        assert_eq!(
            reached(&results[0]),
            [(0, 0), (2, 0), (2, 2), (0, 2)].map(|(x, y)| LatticePoint::new(x, y))
        );
    }

    #[test]
    fn test_out_of_bounds_filtered() {
        let grid = grid();
        let corner = LatticePoint::new(0, 0);
        let query = [Query::expand(PointKind::Cell, vec![])];

        let inside = grid.query(&[corner], &query, &QueryOptions::default()).unwrap();
        assert_eq!(reached(&inside[0]), [LatticePoint::new(1, 1)]);

        let options = QueryOptions {
            include_out_of_bounds: true,
            ..Default::default()
        };
        let all = grid.query(&[corner], &query, &options).unwrap();
        assert_eq!(reached(&all[0]).len(), 4);
    }

    #[test]
    fn test_blacklist() {
        let options = QueryOptions {
            blacklist: HashSet::from([LatticePoint::new(2, 1)]),
            ..Default::default()
        };
        let results = grid()
            .query(&[LatticePoint::new(1, 1)], &[Query::expand(PointKind::Edge, vec![])], &options)
            .unwrap();
        let edges = reached(&results[0]);
        assert_eq!(edges.len(), 3);
        assert!(!edges.contains(&LatticePoint::new(2, 1)));
    }

    #[test]
    fn test_exclude_previous_points() {
        let grid = grid();
        let query = [Query::expand(
            PointKind::Corner,
            vec![Query::expand(PointKind::Cell, vec![])],
        )];
        let start = [LatticePoint::new(3, 3)];

        let results = grid.query(&start, &query, &QueryOptions::default()).unwrap();
        let corners = results[0].points().unwrap();
        let cells: Vec<_> = corners
            .iter()
            .flat_map(|c| reached(&c.results[0]))
            .collect();
        assert!(!cells.contains(&start[0]));
        let unique: HashSet<_> = cells.iter().collect();
        assert_eq!(unique.len(), cells.len());
        assert_eq!(cells.len(), 8);

        let options = QueryOptions {
            exclude_previous_points: false,
            ..Default::default()
        };
        let results = grid.query(&start, &query, &options).unwrap();
        let total: usize = results[0]
            .points()
            .unwrap()
            .iter()
            .map(|c| c.results[0].points().unwrap().len())
            .sum();
        assert_eq!(total, 16);
    }

    #[test]
    fn test_unsupported_transition() {
        let err = grid()
            .query(
                &[LatticePoint::new(1, 0)],
                &[Query::expand(PointKind::Edge, vec![])],
                &QueryOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnsupportedTransition {
                from: PointKind::Edge,
                to: PointKind::Edge
            }
        ));
    }

    #[test]
    fn test_svg_outline_requires_cells() {
        let err = grid()
            .query(
                &[LatticePoint::new(0, 0)],
                &[QueryLeaf::SvgOutline.into()],
                &QueryOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedLeaf { leaf: "svgOutline", .. }));
    }

    #[test]
    fn test_nested_leaves() {
        let grid = grid();
        let query = [Query::expand(
            PointKind::Edge,
            vec![QueryLeaf::SvgPoint.into(), QueryLeaf::MaxRadius(RadiusShape::Circle).into()],
        )];
        let results = grid
            .query(&[LatticePoint::new(1, 1)], &query, &QueryOptions::default())
            .unwrap();
        let top = &results[0].points().unwrap()[0];
        assert_eq!(top.point, LatticePoint::new(1, 0));
        assert_eq!(top.results[0], QueryResult::SvgPoints(vec![Point::new(60.0, 30.0)]));
        assert_eq!(top.results[1], QueryResult::MaxRadius(vec![15.0]));
    }

    #[test]
    fn test_rows() {
        let results = grid()
            .query(&[LatticePoint::new(3, 1)], &[QueryLeaf::Rows.into()], &QueryOptions::default())
            .unwrap();
        let QueryResult::Rows(rows) = &results[0] else {
            panic!("expected rows");
        };
        assert_eq!(rows[0].row, [1, 3, 5].map(|x| LatticePoint::new(x, 1)));
        assert_eq!(rows[0].column, [1, 3, 5].map(|y| LatticePoint::new(3, y)));
        assert!(rows[0].row.contains(&rows[0].point));
    }

    #[test]
    fn test_sorted() {
        let points = [(3, 1), (1, 3), (1, 1), (3, 3)].map(|(x, y)| LatticePoint::new(x, y));
        let grid = grid();
        let sorted = |direction| {
            let results = grid
                .query(&points, &[QueryLeaf::Sorted(direction).into()], &QueryOptions::default())
                .unwrap();
            match &results[0] {
                QueryResult::Sorted(points) => points.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>(),
                other => panic!("unexpected {other:?}"),
            }
        };
        assert_eq!(sorted(Compass::East), [(1, 1), (3, 1), (1, 3), (3, 3)]);
        assert_eq!(sorted(Compass::North), [(1, 3), (1, 1), (3, 3), (3, 1)]);
    }

    #[test]
    fn test_shrinkwrap_in_pixels() {
        let results = grid()
            .query(
                &[LatticePoint::new(1, 1)],
                &[QueryLeaf::Shrinkwrap(0.0).into()],
                &QueryOptions::default(),
            )
            .unwrap();
        let QueryResult::Shrinkwrap(loops) = &results[0] else {
            panic!("expected loops");
        };
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 4);
        assert!(loops[0].contains(&Point::new(30.0, 30.0)));
        assert!(loops[0].contains(&Point::new(90.0, 90.0)));
    }
}
