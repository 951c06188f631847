//! The editing session: routes input through gesture classification, point
//! selection and the active layer into history.

use crate::camera::Camera;
use crate::error::{CoreError, CoreResult};
use crate::gesture::{GestureAction, GestureClassifier, GestureMode};
use crate::history::{BatchId, GridId, HistoryAction, HistoryStore, LayerStorage};
use crate::input::{KeyEvent, Modifiers, PointerEvent, PointerId};
use crate::layers::{
    Layer, LayerEvent, LayerEventKind, LineLayer, MarkLayer, Primitive, PuzzleObject,
    SelectionLayer,
};
use crate::lattice::{GridBounds, LatticePoint, SquareGrid, point_id};
use crate::selector::select_points;
use crate::settings::Settings;
use crate::timer::ReleaseTimer;
use kurbo::Point;
use serde::Serialize;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};
#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Grid id used by single-grid editors.
pub const DEFAULT_GRID_ID: &str = "main";

/// A press not yet shown to the layer.
#[derive(Debug, Clone)]
struct PendingDown {
    cursor: Point,
    points: Vec<LatticePoint>,
}

/// State of the pointer interaction in progress.
#[derive(Debug, Clone)]
struct Interaction {
    layer: usize,
    batch_id: BatchId,
    previous: Option<LatticePoint>,
    discontinued: bool,
    /// Held until the gesture turns out to be a tap or a drag. A pinch drops it.
    pending_down: Option<PendingDown>,
}

/// Geometry of one layer for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDisplay {
    pub layer_id: String,
    pub primitives: Vec<Primitive>,
}

/// One grid being edited with its layers, view and history.
#[derive(Debug)]
pub struct Editor {
    grid_id: GridId,
    grid: SquareGrid,
    settings: Settings,
    camera: Camera,
    gestures: GestureClassifier,
    release: ReleaseTimer,
    history: HistoryStore<PuzzleObject>,
    layers: Vec<Layer>,
    current_layer: usize,
    modifiers: Modifiers,
    interaction: Option<Interaction>,
    last_key: Option<(Instant, BatchId)>,
}

impl Editor {
    /// Create an editor with a selection, a line and a mark layer.
    pub fn new(bounds: GridBounds, settings: Settings) -> Self {
        Self::with_layers(
            bounds,
            settings,
            vec![
                Layer::Selection(SelectionLayer::new()),
                Layer::Line(LineLayer::new()),
                Layer::Mark(MarkLayer::new()),
            ],
        )
    }

    pub fn with_layers(bounds: GridBounds, settings: Settings, layers: Vec<Layer>) -> Self {
        let grid_id = DEFAULT_GRID_ID.to_string();
        let mut history = HistoryStore::new();
        for layer in &layers {
            history.add_storage(&grid_id, layer.id());
        }
        log::info!(
            "editor for {}x{} grid with {} layers",
            bounds.width,
            bounds.height,
            layers.len()
        );
        Self {
            grid: SquareGrid::new(bounds, &settings),
            gestures: GestureClassifier::new(settings.drag_threshold),
            grid_id,
            settings,
            camera: Camera::new(),
            release: ReleaseTimer::default(),
            history,
            layers,
            current_layer: 0,
            modifiers: Modifiers::default(),
            interaction: None,
            last_key: None,
        }
    }

    pub fn grid(&self) -> &SquareGrid {
        &self.grid
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn gestures(&self) -> &GestureClassifier {
        &self.gestures
    }

    pub fn history(&self) -> &HistoryStore<PuzzleObject> {
        &self.history
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn storage(&self, layer_id: &str) -> Option<&LayerStorage<PuzzleObject>> {
        self.history.storage(&self.grid_id, layer_id)
    }

    pub fn current_layer(&self) -> &str {
        self.layers
            .get(self.current_layer)
            .map_or("", |layer| layer.id())
    }

    /// Make `layer_id` receive pointer input. Returns false for unknown ids.
    pub fn set_current_layer(&mut self, layer_id: &str) -> bool {
        match self.layers.iter().position(|l| l.id() == layer_id) {
            Some(index) => {
                self.current_layer = index;
                true
            }
            None => false,
        }
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    /// Currently selected cells, empty without a selection layer.
    pub fn selection(&self) -> Vec<LatticePoint> {
        self.layers
            .iter()
            .find_map(Layer::as_selection)
            .map(|s| s.selected().iter().copied().collect())
            .unwrap_or_default()
    }

    /// Feed a pointer event (screen coordinates).
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> CoreResult<GestureAction> {
        let action = self.gestures.process(event)?;
        match action {
            GestureAction::Down { position, .. } => self.begin_interaction(position)?,
            GestureAction::Draw { position } => self.continue_interaction(position)?,
            GestureAction::Pan { delta } => self.camera.pan(delta),
            GestureAction::Scale { origin, from, to } => self.camera.apply_scale(origin, from, to),
            GestureAction::Up => self.end_interaction()?,
            GestureAction::Ignore if self.gestures.mode() == GestureMode::PanZoom => {
                self.abandon_interaction();
            }
            GestureAction::Ignore => {}
        }
        Ok(action)
    }

    /// A pressed pointer left the surface; it is released unless it comes
    /// back before the delay runs out.
    pub fn pointer_leave(&mut self, pointer_id: PointerId, position: Point, now: Instant) {
        self.release.arm(pointer_id, position, now);
    }

    /// The pointer came back. Returns whether a pending release was dropped.
    pub fn pointer_enter(&mut self) -> bool {
        self.release.cancel()
    }

    /// Fire the delayed release if it is due.
    pub fn tick(&mut self, now: Instant) -> CoreResult<Option<GestureAction>> {
        match self.release.poll(now) {
            Some(event) => {
                log::debug!("pointer {} released after leaving", event.pointer_id);
                self.handle_pointer(&event).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Abandon the current interaction.
    pub fn cancel_interaction(&mut self) -> CoreResult<()> {
        self.release.cancel();
        let action = self.gestures.cancel();
        if self.interaction.as_ref().is_some_and(|i| i.pending_down.is_some()) {
            self.abandon_interaction();
        } else if action == GestureAction::Up {
            self.end_interaction()?;
        }
        Ok(())
    }

    /// Handle a key press. Undo and redo shortcuts are handled here; any
    /// other key goes to every layer together with the selected cells.
    /// Keys pressed within `action_window_ms` of each other share a batch.
    pub fn handle_key(
        &mut self,
        key: &KeyEvent,
        now: Instant,
    ) -> CoreResult<Vec<HistoryAction<PuzzleObject>>> {
        let KeyEvent::Pressed(key) = key else {
            return Ok(Vec::new());
        };
        let command = self.modifiers.ctrl || self.modifiers.meta;
        match key.as_str() {
            "z" | "Z" if command && self.modifiers.shift => return Ok(self.redo()),
            "z" | "Z" if command => return Ok(self.undo()),
            "y" | "Y" if command => return Ok(self.redo()),
            _ => {}
        }

        let window = Duration::from_millis(self.settings.action_window_ms);
        let batch_id = match self.last_key {
            Some((at, batch_id)) if now.saturating_duration_since(at) <= window => batch_id,
            _ => self.history.new_batch_id(),
        };
        self.last_key = Some((now, batch_id));

        let points: Vec<String> = self.selection().into_iter().map(point_id).collect();
        let mut recorded = Vec::new();
        for index in 0..self.layers.len() {
            let event = LayerEvent {
                kind: LayerEventKind::Key(key.clone()),
                points: points.clone(),
                cursor: None,
                modifiers: self.modifiers,
            };
            recorded.extend(self.dispatch(index, &event, batch_id)?.0);
        }
        Ok(recorded)
    }

    /// Undo the latest step, returning the inverse actions applied.
    pub fn undo(&mut self) -> Vec<HistoryAction<PuzzleObject>> {
        self.last_key = None;
        self.history.undo_history(&self.grid_id)
    }

    pub fn redo(&mut self) -> Vec<HistoryAction<PuzzleObject>> {
        self.last_key = None;
        self.history.redo_history(&self.grid_id)
    }

    /// Geometry of every layer, bottom layer first.
    pub fn display(&self) -> CoreResult<Vec<LayerDisplay>> {
        self.layers
            .iter()
            .map(|layer| {
                let storage = self.storage(layer.id()).ok_or_else(|| self.missing(layer.id()))?;
                Ok(LayerDisplay {
                    layer_id: layer.id().to_string(),
                    primitives: layer.display(&self.grid, storage)?,
                })
            })
            .collect()
    }

    fn begin_interaction(&mut self, screen: Point) -> CoreResult<()> {
        self.last_key = None;
        let layer = self.current_layer;
        let cursor = self.camera.screen_to_grid(screen);
        let points = self.select(layer, cursor, None)?;
        self.interaction = Some(Interaction {
            layer,
            batch_id: self.history.new_batch_id(),
            previous: None,
            discontinued: false,
            pending_down: Some(PendingDown { cursor, points }),
        });
        log::debug!("interaction started on layer {}", self.current_layer());
        Ok(())
    }

    /// Deliver a held press to the layer.
    fn flush_down(&mut self) -> CoreResult<()> {
        let Some(pending) = self
            .interaction
            .as_mut()
            .and_then(|interaction| interaction.pending_down.take())
        else {
            return Ok(());
        };
        self.send_pointer(LayerEventKind::PointerDown, pending.points, Some(pending.cursor))
    }

    fn continue_interaction(&mut self, screen: Point) -> CoreResult<()> {
        self.flush_down()?;
        let Some(interaction) = &self.interaction else {
            return Ok(());
        };
        if interaction.discontinued {
            return Ok(());
        }
        let (layer, previous) = (interaction.layer, interaction.previous);
        let cursor = self.camera.screen_to_grid(screen);
        let points = self.select(layer, cursor, previous)?;
        if points.is_empty() {
            return Ok(());
        }
        self.send_pointer(LayerEventKind::PointerMove, points, Some(cursor))
    }

    fn end_interaction(&mut self) -> CoreResult<()> {
        if self.interaction.is_none() {
            return Ok(());
        }
        let result = self
            .flush_down()
            .and_then(|()| self.send_pointer(LayerEventKind::PointerUp, Vec::new(), None));
        if let Some(interaction) = self.interaction.take() {
            log::debug!("interaction on layer {} ended", interaction.layer);
        }
        result
    }

    /// Forget the interaction without the layer ever seeing it.
    fn abandon_interaction(&mut self) {
        if let Some(interaction) = self.interaction.take() {
            log::debug!("interaction on layer {} abandoned", interaction.layer);
        }
    }

    fn select(
        &self,
        layer: usize,
        cursor: Point,
        previous: Option<LatticePoint>,
    ) -> CoreResult<Vec<LatticePoint>> {
        let Some(filter) = self.layers.get(layer).map(Layer::gather_points) else {
            return Ok(Vec::new());
        };
        select_points(&self.grid, cursor, filter.kinds, filter.deltas, previous)
    }

    /// Send a pointer event of the running interaction to its layer.
    fn send_pointer(
        &mut self,
        kind: LayerEventKind,
        points: Vec<LatticePoint>,
        cursor: Option<Point>,
    ) -> CoreResult<()> {
        let Some(interaction) = self.interaction.as_mut() else {
            return Ok(());
        };
        if let Some(&last) = points.last() {
            interaction.previous = Some(last);
        }
        let (layer, batch_id) = (interaction.layer, interaction.batch_id);
        let event = LayerEvent {
            kind,
            points: points.into_iter().map(point_id).collect(),
            cursor,
            modifiers: self.modifiers,
        };
        let (_, discontinue) = self.dispatch(layer, &event, batch_id)?;
        if let Some(interaction) = self.interaction.as_mut() {
            interaction.discontinued |= discontinue;
        }
        Ok(())
    }

    /// Run one event through a layer and record its changes under `batch_id`.
    fn dispatch(
        &mut self,
        index: usize,
        event: &LayerEvent,
        batch_id: BatchId,
    ) -> CoreResult<(Vec<HistoryAction<PuzzleObject>>, bool)> {
        let Some(layer) = self.layers.get_mut(index) else {
            return Ok((Vec::new(), false));
        };
        let layer_id = layer.id().to_string();
        let storage = self
            .history
            .storage(&self.grid_id, &layer_id)
            .ok_or_else(|| CoreError::MissingStorage {
                grid: self.grid_id.clone(),
                layer: layer_id.clone(),
            })?;
        let outcome = layer.handle_event(event, storage)?;
        if outcome.history.is_empty() {
            return Ok((Vec::new(), outcome.discontinue_input));
        }
        let changes = outcome
            .history
            .into_iter()
            .map(|change| change.in_batch(Some(batch_id)))
            .collect();
        let recorded = self
            .history
            .add_to_history(&self.grid_id, &layer_id, changes)?;
        Ok((recorded, outcome.discontinue_input))
    }

    fn missing(&self, layer_id: &str) -> CoreError {
        CoreError::MissingStorage {
            grid: self.grid_id.clone(),
            layer: layer_id.to_string(),
        }
    }
}
