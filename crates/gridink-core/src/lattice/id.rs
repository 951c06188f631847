//! String ids for lattice points and multi-point objects.

use super::LatticePoint;
use crate::error::{CoreError, CoreResult};

/// Separator between point ids inside a composite object id.
pub const OBJECT_ID_SEPARATOR: char = ';';

/// Format a point as `"x,y"`.
pub fn point_id(point: LatticePoint) -> String {
    format!("{},{}", point.x, point.y)
}

/// Parse a `"x,y"` id. Anything not matching `-?\d+,-?\d+` is rejected.
pub fn parse_point_id(id: &str) -> CoreResult<LatticePoint> {
    let invalid = || CoreError::InvalidPointId(id.to_string());
    let (x, y) = id.split_once(',').ok_or_else(invalid)?;
    Ok(LatticePoint::new(
        parse_coordinate(x).ok_or_else(invalid)?,
        parse_coordinate(y).ok_or_else(invalid)?,
    ))
}

fn parse_coordinate(text: &str) -> Option<i32> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Build the id of an object spanning several points.
///
/// Non-directional objects sort their points first so that the same set of
/// points always yields the same id.
pub fn object_id(points: &[LatticePoint], directional: bool) -> String {
    let mut points = points.to_vec();
    if !directional {
        points.sort();
    }
    points
        .iter()
        .map(|&p| point_id(p))
        .collect::<Vec<_>>()
        .join(&OBJECT_ID_SEPARATOR.to_string())
}

/// Split a composite object id back into its points.
pub fn parse_object_id(id: &str) -> CoreResult<Vec<LatticePoint>> {
    id.split(OBJECT_ID_SEPARATOR).map(parse_point_id).collect()
}
