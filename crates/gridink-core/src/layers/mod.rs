//! Layer kinds: what each layer selects, how it turns selections into
//! object changes and what it draws.

mod line;
mod mark;
mod selection;

pub use line::{LINE_LAYER_ID, LineLayer};
pub use mark::{MARK_LAYER_ID, MARK_VALUES, MarkLayer};
pub use selection::{SELECTION_LAYER_ID, SelectionLayer};

use crate::error::CoreResult;
use crate::history::{LayerStorage, ObjectChange};
use crate::input::Modifiers;
use crate::lattice::{Delta, LatticePoint, PointKind, SquareGrid};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Payload stored in layer storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PuzzleObject {
    /// Segment between consecutive points of a line.
    Segment { points: Vec<LatticePoint> },
    /// A symbol written into a cell.
    Mark { value: char },
}

/// What a layer listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointFilter {
    pub kinds: &'static [PointKind],
    pub deltas: &'static [Delta],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerEventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    Key(String),
}

/// Input routed to a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerEvent {
    pub kind: LayerEventKind,
    /// Ids of the selected lattice points. For key events these are the
    /// currently selected cells.
    pub points: Vec<String>,
    /// Grid-pixel cursor, absent for key events.
    pub cursor: Option<Point>,
    pub modifiers: Modifiers,
}

/// Changes a layer asks the editor to record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerOutcome {
    pub history: Vec<ObjectChange<PuzzleObject>>,
    /// Stop feeding the current interaction to the layer.
    pub discontinue_input: bool,
}

/// Primitive geometry handed to a renderer, in grid pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Primitive {
    Polygon { points: Vec<Point> },
    Line { from: Point, to: Point },
    Circle { center: Point, radius: f64, label: char },
}

/// Shared capability of every layer kind.
pub trait LayerBehavior {
    /// Storage key of the layer.
    fn id(&self) -> &str;

    /// Point kinds and drag deltas this layer selects with.
    fn gather_points(&self) -> PointFilter;

    /// React to input, reading the layer's committed objects.
    fn handle_event(
        &mut self,
        event: &LayerEvent,
        storage: &LayerStorage<PuzzleObject>,
    ) -> CoreResult<LayerOutcome>;

    /// Geometry for the current state.
    fn display(
        &self,
        grid: &SquareGrid,
        storage: &LayerStorage<PuzzleObject>,
    ) -> CoreResult<Vec<Primitive>>;
}

/// Closed set of layer kinds.
#[derive(Debug, Clone)]
pub enum Layer {
    Selection(SelectionLayer),
    Line(LineLayer),
    Mark(MarkLayer),
}

impl Layer {
    pub fn id(&self) -> &str {
        match self {
            Layer::Selection(l) => l.id(),
            Layer::Line(l) => l.id(),
            Layer::Mark(l) => l.id(),
        }
    }

    pub fn gather_points(&self) -> PointFilter {
        match self {
            Layer::Selection(l) => l.gather_points(),
            Layer::Line(l) => l.gather_points(),
            Layer::Mark(l) => l.gather_points(),
        }
    }

    pub fn handle_event(
        &mut self,
        event: &LayerEvent,
        storage: &LayerStorage<PuzzleObject>,
    ) -> CoreResult<LayerOutcome> {
        match self {
            Layer::Selection(l) => l.handle_event(event, storage),
            Layer::Line(l) => l.handle_event(event, storage),
            Layer::Mark(l) => l.handle_event(event, storage),
        }
    }

    pub fn display(
        &self,
        grid: &SquareGrid,
        storage: &LayerStorage<PuzzleObject>,
    ) -> CoreResult<Vec<Primitive>> {
        match self {
            Layer::Selection(l) => l.display(grid, storage),
            Layer::Line(l) => l.display(grid, storage),
            Layer::Mark(l) => l.display(grid, storage),
        }
    }

    pub fn as_selection(&self) -> Option<&SelectionLayer> {
        match self {
            Layer::Selection(l) => Some(l),
            _ => None,
        }
    }
}

/// Parse every id of an event, failing on the first malformed one.
fn parse_points(event: &LayerEvent) -> CoreResult<Vec<LatticePoint>> {
    event
        .points
        .iter()
        .map(|id| crate::lattice::parse_point_id(id))
        .collect()
}

/// Cells of an event as an ordered set.
fn point_set(event: &LayerEvent) -> CoreResult<BTreeSet<LatticePoint>> {
    Ok(parse_points(event)?.into_iter().collect())
}
