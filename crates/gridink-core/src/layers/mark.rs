//! Single-character marks written into cells.

use super::{
    LayerBehavior, LayerEvent, LayerEventKind, LayerOutcome, PointFilter, Primitive, PuzzleObject,
    parse_points, point_set,
};
use crate::error::CoreResult;
use crate::history::{LayerStorage, ObjectChange};
use crate::lattice::{Delta, PointKind, RadiusShape, SquareGrid, parse_point_id, point_id};

pub const MARK_LAYER_ID: &str = "mark";

/// Values a tap cycles through, in order. A tap on the last value clears it.
pub const MARK_VALUES: [char; 9] = ['1', '2', '3', '4', '5', '6', '7', '8', '9'];

#[derive(Debug, Clone, Default)]
pub struct MarkLayer;

impl MarkLayer {
    pub fn new() -> Self {
        Self
    }

    fn next_value(current: Option<&PuzzleObject>) -> Option<char> {
        match current {
            Some(PuzzleObject::Mark { value }) => MARK_VALUES
                .iter()
                .position(|v| v == value)
                .and_then(|i| MARK_VALUES.get(i + 1))
                .copied(),
            _ => MARK_VALUES.first().copied(),
        }
    }
}

impl LayerBehavior for MarkLayer {
    fn id(&self) -> &str {
        MARK_LAYER_ID
    }

    fn gather_points(&self) -> PointFilter {
        PointFilter {
            kinds: &[PointKind::Cell],
            deltas: &Delta::ORTHOGONAL,
        }
    }

    fn handle_event(
        &mut self,
        event: &LayerEvent,
        storage: &LayerStorage<PuzzleObject>,
    ) -> CoreResult<LayerOutcome> {
        let mut outcome = LayerOutcome::default();
        match &event.kind {
            LayerEventKind::PointerDown => {
                if let Some(&cell) = parse_points(event)?.first() {
                    let id = point_id(cell);
                    outcome.history.push(match Self::next_value(storage.get(&id)) {
                        Some(value) => ObjectChange::set(id, PuzzleObject::Mark { value }),
                        None => ObjectChange::delete(id),
                    });
                }
                outcome.discontinue_input = true;
            }
            LayerEventKind::Key(key) => {
                let cells = point_set(event)?;
                let digit = key.chars().next().filter(|c| key.len() == 1 && MARK_VALUES.contains(c));
                if let Some(value) = digit {
                    outcome.history.extend(
                        cells
                            .iter()
                            .map(|&c| ObjectChange::set(point_id(c), PuzzleObject::Mark { value })),
                    );
                } else if key == "Delete" || key == "Backspace" {
                    outcome.history.extend(
                        cells
                            .iter()
                            .map(|&c| point_id(c))
                            .filter(|id| storage.contains(id))
                            .map(ObjectChange::delete),
                    );
                }
            }
            LayerEventKind::PointerMove | LayerEventKind::PointerUp => {}
        }
        Ok(outcome)
    }

    fn display(
        &self,
        grid: &SquareGrid,
        storage: &LayerStorage<PuzzleObject>,
    ) -> CoreResult<Vec<Primitive>> {
        let radius = grid.max_radius(PointKind::Cell, RadiusShape::Circle) * 0.8;
        let mut shapes = Vec::with_capacity(storage.len());
        for (id, object) in storage.ordered() {
            if let PuzzleObject::Mark { value } = object {
                shapes.push(Primitive::Circle {
                    center: grid.svg_point(parse_point_id(id)?),
                    radius,
                    label: *value,
                });
            }
        }
        Ok(shapes)
    }
}
