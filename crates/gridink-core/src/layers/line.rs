//! Lines drawn through cell centres, stored one segment per object.

use super::{
    LayerBehavior, LayerEvent, LayerEventKind, LayerOutcome, PointFilter, Primitive, PuzzleObject,
    parse_points,
};
use crate::error::CoreResult;
use crate::history::{LayerStorage, ObjectChange};
use crate::lattice::{Delta, LatticePoint, PointKind, SquareGrid, object_id, parse_object_id};
use std::collections::HashMap;

pub const LINE_LAYER_ID: &str = "line";

/// Dragging across cells toggles the segment between each consecutive pair.
/// The first toggle of a drag decides whether the whole drag draws or erases.
#[derive(Debug, Clone, Default)]
pub struct LineLayer {
    last: Option<LatticePoint>,
    drawing: Option<bool>,
}

impl LineLayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LayerBehavior for LineLayer {
    fn id(&self) -> &str {
        LINE_LAYER_ID
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
        match event.kind {
            LayerEventKind::PointerDown => {
                self.last = None;
                self.drawing = None;
            }
            LayerEventKind::PointerMove => {}
            LayerEventKind::PointerUp => {
                self.last = None;
                self.drawing = None;
                return Ok(LayerOutcome::default());
            }
            LayerEventKind::Key(_) => return Ok(LayerOutcome::default()),
        }

        // Segments toggled earlier in this event, not yet in storage.
        let mut pending: HashMap<String, bool> = HashMap::new();
        let mut history = Vec::new();
        for point in parse_points(event)? {
            let Some(last) = self.last.replace(point) else {
                continue;
            };
            let is_step = Delta::ORTHOGONAL
                .iter()
                .any(|d| last.offset(d.dx, d.dy) == point);
            if !is_step {
                continue;
            }
            let id = object_id(&[last, point], false);
            let exists = pending.get(&id).copied().unwrap_or_else(|| storage.contains(&id));
            let drawing = *self.drawing.get_or_insert(!exists);
            if drawing == exists {
                continue;
            }
            pending.insert(id.clone(), drawing);
            history.push(if drawing {
                let mut points = vec![last, point];
                points.sort();
                ObjectChange::set(id, PuzzleObject::Segment { points })
            } else {
                ObjectChange::delete(id)
            });
        }
        Ok(LayerOutcome {
            history,
            discontinue_input: false,
        })
    }

    fn display(
        &self,
        grid: &SquareGrid,
        storage: &LayerStorage<PuzzleObject>,
    ) -> CoreResult<Vec<Primitive>> {
        let mut shapes = Vec::new();
        for (id, object) in storage.ordered() {
            let PuzzleObject::Segment { .. } = object else {
                log::warn!("line layer holds a non-segment object {id}");
                continue;
            };
            let points = parse_object_id(id)?;
            shapes.extend(points.windows(2).map(|pair| Primitive::Line {
                from: grid.svg_point(pair[0]),
                to: grid.svg_point(pair[1]),
            }));
        }
        Ok(shapes)
    }
}
