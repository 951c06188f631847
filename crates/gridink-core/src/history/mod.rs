//! Per-grid undo history over per-layer object storage.
//!
//! Each grid owns one linear action log shared by all of its layers.
//! Entries before `index` are applied and can be undone; entries from
//! `index` on can be redone until a new edit truncates them.

mod layer;

pub use layer::LayerStorage;

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub type GridId = String;
pub type LayerId = String;
pub type ObjectId = String;

/// Token grouping related actions into one undo step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

/// A requested change to one object; `object: None` deletes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectChange<T> {
    pub id: ObjectId,
    #[serde(default)]
    pub batch_id: Option<BatchId>,
    pub object: Option<T>,
}

impl<T> ObjectChange<T> {
    pub fn set(id: impl Into<ObjectId>, object: T) -> Self {
        Self {
            id: id.into(),
            batch_id: None,
            object: Some(object),
        }
    }

    pub fn delete(id: impl Into<ObjectId>) -> Self {
        Self {
            id: id.into(),
            batch_id: None,
            object: None,
        }
    }

    pub fn in_batch(mut self, batch_id: Option<BatchId>) -> Self {
        self.batch_id = batch_id;
        self
    }
}

/// A recorded change to one object of one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryAction<T> {
    pub id: ObjectId,
    pub layer_id: LayerId,
    pub batch_id: Option<BatchId>,
    pub object: Option<T>,
}

#[derive(Debug, Clone)]
struct HistoryEntry<T> {
    action: HistoryAction<T>,
    previous: Option<T>,
    previous_stamp: Option<u64>,
    stamp: Option<u64>,
}

/// Ordered action log with a cursor between applied and redoable entries.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: Vec<HistoryEntry<T>>,
    index: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: 0,
        }
    }
}

impl<T> History<T> {
    pub fn actions(&self) -> impl Iterator<Item = &HistoryAction<T>> {
        self.entries.iter().map(|e| &e.action)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.entries.len()
    }
}

#[derive(Debug, Clone)]
struct GridHistory<T> {
    layers: HashMap<LayerId, LayerStorage<T>>,
    history: History<T>,
}

impl<T> Default for GridHistory<T> {
    fn default() -> Self {
        Self {
            layers: HashMap::new(),
            history: History::default(),
        }
    }
}

/// Layer storage and undo logs for every grid of a puzzle.
#[derive(Debug, Clone)]
pub struct HistoryStore<T> {
    grids: HashMap<GridId, GridHistory<T>>,
}

impl<T> Default for HistoryStore<T> {
    fn default() -> Self {
        Self {
            grids: HashMap::new(),
        }
    }
}

impl<T: Clone + PartialEq> HistoryStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty storage for a layer. Existing storage is left untouched.
    pub fn add_storage(&mut self, grid_id: &str, layer_id: &str) {
        self.grids
            .entry(grid_id.to_string())
            .or_default()
            .layers
            .entry(layer_id.to_string())
            .or_default();
    }

    /// Drop a layer's storage. Its history entries stay in the log and are
    /// skipped by undo and redo, even when this was the grid's last layer.
    pub fn remove_storage(&mut self, grid_id: &str, layer_id: &str) -> Option<LayerStorage<T>> {
        self.grids.get_mut(grid_id)?.layers.remove(layer_id)
    }

    /// Replace a layer's storage wholesale, e.g. after loading a document.
    pub fn load_storage(&mut self, grid_id: &str, layer_id: &str, storage: LayerStorage<T>) {
        self.grids
            .entry(grid_id.to_string())
            .or_default()
            .layers
            .insert(layer_id.to_string(), storage);
    }

    pub fn storage(&self, grid_id: &str, layer_id: &str) -> Option<&LayerStorage<T>> {
        self.grids.get(grid_id)?.layers.get(layer_id)
    }

    /// Scratch state of a layer. Object changes must go through
    /// [`add_to_history`](Self::add_to_history).
    pub fn extra_mut(&mut self, grid_id: &str, layer_id: &str) -> Option<&mut serde_json::Value> {
        Some(self.grids.get_mut(grid_id)?.layers.get_mut(layer_id)?.extra_mut())
    }

    pub fn history(&self, grid_id: &str) -> Option<&History<T>> {
        self.grids.get(grid_id).map(|g| &g.history)
    }

    /// A fresh token for grouping an upcoming set of changes.
    pub fn new_batch_id(&self) -> BatchId {
        BatchId::new()
    }

    /// Apply changes to a layer and record them.
    ///
    /// Any redo branch is discarded first. Within one call, a change sharing
    /// a batch and an id with the latest recorded change for that id replaces
    /// its object; batched entries whose net effect is nothing (including
    /// create-then-delete) are dropped. Unbatched changes never merge.
    /// Returns the recorded actions.
    pub fn add_to_history(
        &mut self,
        grid_id: &str,
        layer_id: &str,
        changes: Vec<ObjectChange<T>>,
    ) -> CoreResult<Vec<HistoryAction<T>>> {
        let missing = || CoreError::MissingStorage {
            grid: grid_id.to_string(),
            layer: layer_id.to_string(),
        };
        let grid = self.grids.get_mut(grid_id).ok_or_else(missing)?;
        let storage = grid.layers.get_mut(layer_id).ok_or_else(missing)?;

        let history = &mut grid.history;
        if history.index < history.entries.len() {
            log::debug!(
                "discarding {} redo entries in grid {grid_id}",
                history.entries.len() - history.index
            );
            history.entries.truncate(history.index);
        }

        let mut pending: Vec<HistoryEntry<T>> = Vec::new();
        let mut latest: HashMap<ObjectId, usize> = HashMap::new();
        for change in changes {
            let applied = storage.apply(&change.id, change.object.clone());
            let merge_into = latest.get(&change.id).copied().filter(|&i| {
                change.batch_id.is_some() && pending[i].action.batch_id == change.batch_id
            });
            if let Some(i) = merge_into {
                pending[i].action.object = change.object;
                pending[i].stamp = applied.stamp;
                continue;
            }
            latest.insert(change.id.clone(), pending.len());
            pending.push(HistoryEntry {
                action: HistoryAction {
                    id: change.id,
                    layer_id: layer_id.to_string(),
                    batch_id: change.batch_id,
                    object: change.object,
                },
                previous: applied.previous,
                previous_stamp: applied.previous_stamp,
                stamp: applied.stamp,
            });
        }

        // A pruned entry followed by another entry for the same id hands its
        // previous stamp on, so undoing the later entry restores the original
        // position.
        let before = pending.len();
        let mut carried: HashMap<ObjectId, Option<u64>> = HashMap::new();
        let mut kept = Vec::with_capacity(pending.len());
        for (i, mut entry) in pending.into_iter().enumerate() {
            if let Some(stamp) = carried.remove(&entry.action.id) {
                entry.previous_stamp = stamp;
            }
            let no_op = entry.action.batch_id.is_some() && entry.previous == entry.action.object;
            if !no_op {
                kept.push(entry);
            } else if latest.get(&entry.action.id) == Some(&i) {
                storage.restore(&entry.action.id, entry.previous, entry.previous_stamp);
            } else {
                carried.insert(entry.action.id, entry.previous_stamp);
            }
        }
        if kept.len() < before {
            log::debug!("pruned {} no-op batched actions", before - kept.len());
        }

        let recorded: Vec<HistoryAction<T>> = kept.iter().map(|e| e.action.clone()).collect();
        history.entries.extend(kept);
        history.index = history.entries.len();
        log::debug!(
            "grid {grid_id} layer {layer_id}: recorded {} actions (log length {})",
            recorded.len(),
            history.index
        );
        Ok(recorded)
    }

    /// Undo the latest applied step. A step is one action, or every
    /// adjacent action of the same batch. Returns the inverse actions that
    /// were applied, newest first; empty at the start of the log.
    pub fn undo_history(&mut self, grid_id: &str) -> Vec<HistoryAction<T>> {
        let Some(grid) = self.grids.get_mut(grid_id) else {
            return Vec::new();
        };
        let GridHistory { layers, history } = grid;
        let mut applied = Vec::new();
        let Some(batch) = history.index.checked_sub(1).map(|i| history.entries[i].action.batch_id)
        else {
            return applied;
        };

        while history.index > 0 {
            let entry = &history.entries[history.index - 1];
            if !applied.is_empty() && (batch.is_none() || entry.action.batch_id != batch) {
                break;
            }
            history.index -= 1;
            let action = &entry.action;
            match layers.get_mut(&action.layer_id) {
                Some(storage) => {
                    storage.restore(&action.id, entry.previous.clone(), entry.previous_stamp)
                }
                None => log::warn!("undo skipped: layer {} was removed", action.layer_id),
            }
            applied.push(HistoryAction {
                object: entry.previous.clone(),
                ..action.clone()
            });
        }
        applied
    }

    /// Redo the next undone step. Returns the actions that were applied,
    /// oldest first; empty at the end of the log.
    pub fn redo_history(&mut self, grid_id: &str) -> Vec<HistoryAction<T>> {
        let Some(grid) = self.grids.get_mut(grid_id) else {
            return Vec::new();
        };
        let GridHistory { layers, history } = grid;
        let mut applied = Vec::new();
        let Some(batch) = history.entries.get(history.index).map(|e| e.action.batch_id) else {
            return applied;
        };

        while let Some(entry) = history.entries.get(history.index) {
            if !applied.is_empty() && (batch.is_none() || entry.action.batch_id != batch) {
                break;
            }
            history.index += 1;
            let action = &entry.action;
            match layers.get_mut(&action.layer_id) {
                Some(storage) => storage.restore(&action.id, action.object.clone(), entry.stamp),
                None => log::warn!("redo skipped: layer {} was removed", action.layer_id),
            }
            applied.push(action.clone());
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: &str = "grid";
    const LAYER: &str = "layer";

    fn store() -> HistoryStore<&'static str> {
        let mut store = HistoryStore::new();
        store.add_storage(GRID, LAYER);
        store
    }

    fn layer<'a>(store: &'a HistoryStore<&'static str>) -> &'a LayerStorage<&'static str> {
        store.storage(GRID, LAYER).unwrap()
    }

    #[test]
    fn test_merges_batched_changes() {
        let mut store = store();
        let batch = Some(store.new_batch_id());
        let recorded = store
            .add_to_history(
                GRID,
                LAYER,
                vec![
                    ObjectChange::set("a", "X"),
                    ObjectChange::set("b", "Y").in_batch(batch),
                    ObjectChange::set("b", "Z").in_batch(batch),
                ],
            )
            .unwrap();

        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].id, "a");
        assert_eq!(recorded[1].object, Some("Z"));
        assert_eq!(store.history(GRID).unwrap().len(), 2);
        assert_eq!(layer(&store).get("b"), Some(&"Z"));
    }

    #[test]
    fn test_unbatched_changes_never_merge() {
        let mut store = store();
        store
            .add_to_history(
                GRID,
                LAYER,
                vec![ObjectChange::set("a", "X"), ObjectChange::set("a", "Y")],
            )
            .unwrap();
        assert_eq!(store.history(GRID).unwrap().len(), 2);
    }

    #[test]
    fn test_create_then_delete_is_pruned() {
        let mut store = store();
        let batch = Some(store.new_batch_id());
        let recorded = store
            .add_to_history(
                GRID,
                LAYER,
                vec![
                    ObjectChange::set("a", "X").in_batch(batch),
                    ObjectChange::delete("a").in_batch(batch),
                ],
            )
            .unwrap();
        assert!(recorded.is_empty());
        assert!(store.history(GRID).unwrap().is_empty());
        assert!(layer(&store).is_empty());
    }

    #[test]
    fn test_batched_round_trip_restores_order() {
        let mut store = store();
        store
            .add_to_history(
                GRID,
                LAYER,
                vec![ObjectChange::set("a", "A"), ObjectChange::set("b", "B")],
            )
            .unwrap();
        let before = layer(&store).clone();

        let batch = Some(store.new_batch_id());
        let recorded = store
            .add_to_history(
                GRID,
                LAYER,
                vec![
                    ObjectChange::set("a", "A2").in_batch(batch),
                    ObjectChange::set("a", "A").in_batch(batch),
                ],
            )
            .unwrap();
        assert!(recorded.is_empty());
        assert_eq!(layer(&store), &before);
    }

    #[test]
    fn test_undo_redo() {
        let mut store = store();
        store.add_to_history(GRID, LAYER, vec![ObjectChange::set("a", "X")]).unwrap();
        store.add_to_history(GRID, LAYER, vec![ObjectChange::set("a", "Y")]).unwrap();

        let undone = store.undo_history(GRID);
        assert_eq!(undone.len(), 1);
        assert_eq!(undone[0].object, Some("X"));
        assert_eq!(layer(&store).get("a"), Some(&"X"));

        let undone = store.undo_history(GRID);
        assert_eq!(undone[0].object, None);
        assert!(layer(&store).is_empty());
        assert!(store.undo_history(GRID).is_empty());

        let redone = store.redo_history(GRID);
        assert_eq!(redone[0].object, Some("X"));
        store.redo_history(GRID);
        assert_eq!(layer(&store).get("a"), Some(&"Y"));
        assert!(store.redo_history(GRID).is_empty());
    }

    #[test]
    fn test_undo_groups_batch_across_calls() {
        let mut store = store();
        store.add_storage(GRID, "other");
        store.add_to_history(GRID, LAYER, vec![ObjectChange::set("z", "Z")]).unwrap();

        let batch = Some(store.new_batch_id());
        store
            .add_to_history(GRID, LAYER, vec![ObjectChange::set("a", "A").in_batch(batch)])
            .unwrap();
        store
            .add_to_history(GRID, "other", vec![ObjectChange::set("b", "B").in_batch(batch)])
            .unwrap();

        let undone = store.undo_history(GRID);
        assert_eq!(undone.len(), 2);
        assert_eq!(undone[0].layer_id, "other");
        assert_eq!(undone[1].layer_id, LAYER);
        assert_eq!(store.history(GRID).unwrap().index(), 1);
        assert!(layer(&store).contains("z"));

        let redone = store.redo_history(GRID);
        assert_eq!(redone.len(), 2);
        assert!(store.storage(GRID, "other").unwrap().contains("b"));
    }

    #[test]
    fn test_new_edit_discards_redo_branch() {
        let mut store = store();
        store.add_to_history(GRID, LAYER, vec![ObjectChange::set("a", "X")]).unwrap();
        store.add_to_history(GRID, LAYER, vec![ObjectChange::set("b", "Y")]).unwrap();
        store.undo_history(GRID);
        store.add_to_history(GRID, LAYER, vec![ObjectChange::set("c", "Z")]).unwrap();

        let history = store.history(GRID).unwrap();
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(history.actions().map(|a| a.id.as_str()).collect::<Vec<_>>(), ["a", "c"]);
    }

    #[test]
    fn test_missing_storage() {
        let mut store: HistoryStore<&str> = HistoryStore::new();
        assert!(matches!(
            store.add_to_history("g", "l", vec![ObjectChange::set("a", "X")]),
            Err(CoreError::MissingStorage { .. })
        ));
        assert!(store.undo_history("g").is_empty());
    }

    #[test]
    fn test_undo_into_removed_layer_is_skipped() {
        let mut store = store();
        store.add_storage(GRID, "other");
        store.add_to_history(GRID, "other", vec![ObjectChange::set("a", "X")]).unwrap();
        assert!(store.remove_storage(GRID, "other").is_some());

        let undone = store.undo_history(GRID);
        assert_eq!(undone.len(), 1);
        assert_eq!(store.history(GRID).unwrap().index(), 0);
    }

    #[test]
    fn test_removing_last_layer_keeps_history() {
        let mut store = store();
        store.add_to_history(GRID, LAYER, vec![ObjectChange::set("a", "X")]).unwrap();
        assert!(store.remove_storage(GRID, LAYER).is_some());

        let history = store.history(GRID).unwrap();
        assert_eq!(history.len(), 1);
        assert!(history.can_undo());
        assert_eq!(store.undo_history(GRID).len(), 1);

        store.add_storage(GRID, LAYER);
        assert!(store.storage(GRID, LAYER).unwrap().objects().is_empty());
        assert_eq!(store.history(GRID).unwrap().len(), 1);
    }

    #[test]
    fn test_recorded_actions_json_roundtrip() {
        let mut store = store();
        let batch = Some(store.new_batch_id());
        let recorded = store
            .add_to_history(
                GRID,
                LAYER,
                vec![ObjectChange::set("a", "X").in_batch(batch), ObjectChange::delete("b")],
            )
            .unwrap();
        let json = serde_json::to_string(&recorded).unwrap();
        let loaded: Vec<HistoryAction<String>> = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded[0].batch_id, batch);
        assert_eq!(loaded[0].object.as_deref(), Some("X"));
        assert_eq!(loaded[1].object, None);
        assert_eq!(loaded[1].layer_id, LAYER);
    }
}
