//! Cell selection. Selected cells live on the layer, not in history.

use super::{
    LayerBehavior, LayerEvent, LayerEventKind, LayerOutcome, PointFilter, Primitive, PuzzleObject,
    parse_points,
};
use crate::error::CoreResult;
use crate::history::LayerStorage;
use crate::lattice::{Delta, LatticePoint, PointKind, QueryLeaf, QueryOptions, QueryResult, SquareGrid};
use std::collections::BTreeSet;

pub const SELECTION_LAYER_ID: &str = "selection";

/// Pixel inset of the drawn selection outline.
const OUTLINE_INSET: f64 = 4.0;

#[derive(Debug, Clone, Default)]
pub struct SelectionLayer {
    selected: BTreeSet<LatticePoint>,
    /// `Some(true)` while a drag adds cells, `Some(false)` while it removes.
    adding: Option<bool>,
}

impl SelectionLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &BTreeSet<LatticePoint> {
        &self.selected
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    fn apply(&mut self, cells: &[LatticePoint]) {
        let adding = self.adding.unwrap_or(true);
        for &cell in cells {
            if adding {
                self.selected.insert(cell);
            } else {
                self.selected.remove(&cell);
            }
        }
    }
}

impl LayerBehavior for SelectionLayer {
    fn id(&self) -> &str {
        SELECTION_LAYER_ID
    }

    fn gather_points(&self) -> PointFilter {
        PointFilter {
            kinds: &[PointKind::Cell],
            deltas: &Delta::ALL_NEIGHBORS,
        }
    }

    fn handle_event(
        &mut self,
        event: &LayerEvent,
        _storage: &LayerStorage<PuzzleObject>,
    ) -> CoreResult<LayerOutcome> {
        match &event.kind {
            LayerEventKind::PointerDown => {
                let cells = parse_points(event)?;
                let extend = event.modifiers.shift || event.modifiers.ctrl;
                let removing = extend && cells.first().is_some_and(|c| self.selected.contains(c));
                if !extend {
                    self.selected.clear();
                }
                self.adding = Some(!removing);
                self.apply(&cells);
            }
            LayerEventKind::PointerMove => {
                let cells = parse_points(event)?;
                self.apply(&cells);
            }
            LayerEventKind::PointerUp => self.adding = None,
            LayerEventKind::Key(key) if key == "Escape" => self.selected.clear(),
            LayerEventKind::Key(_) => {}
        }
        Ok(LayerOutcome::default())
    }

    fn display(
        &self,
        grid: &SquareGrid,
        _storage: &LayerStorage<PuzzleObject>,
    ) -> CoreResult<Vec<Primitive>> {
        if self.selected.is_empty() {
            return Ok(Vec::new());
        }
        let cells: Vec<LatticePoint> = self.selected.iter().copied().collect();
        let results = grid.query(
            &cells,
            &[QueryLeaf::Shrinkwrap(OUTLINE_INSET).into()],
            &QueryOptions::default(),
        )?;
        Ok(results
            .into_iter()
            .flat_map(|result| match result {
                QueryResult::Shrinkwrap(loops) => loops,
                _ => Vec::new(),
            })
            .map(|points| Primitive::Polygon { points })
            .collect())
    }
}
