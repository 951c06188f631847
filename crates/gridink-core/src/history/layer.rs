//! Object storage for one layer of one grid.

use super::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Objects of a layer plus the order they are drawn in (topmost last).
///
/// Every mutation stamps the touched id with a fresh counter value and
/// `render_order` is kept sorted by stamp. Restoring an earlier stamp puts
/// an object back exactly where it was, which is what makes undo exact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStorage<T> {
    objects: HashMap<ObjectId, T>,
    render_order: Vec<ObjectId>,
    /// Layer-private scratch state.
    #[serde(default)]
    extra: serde_json::Value,
    #[serde(skip)]
    stamps: HashMap<ObjectId, u64>,
    #[serde(skip)]
    next_stamp: u64,
}

/// Stamps before and after one mutation.
#[derive(Debug, Clone)]
pub(crate) struct Applied<T> {
    pub previous: Option<T>,
    pub previous_stamp: Option<u64>,
    pub stamp: Option<u64>,
}

impl<T> Default for LayerStorage<T> {
    fn default() -> Self {
        Self {
            objects: HashMap::new(),
            render_order: Vec::new(),
            extra: serde_json::Value::Null,
            stamps: HashMap::new(),
            next_stamp: 0,
        }
    }
}

impl<T: PartialEq> PartialEq for LayerStorage<T> {
    fn eq(&self, other: &Self) -> bool {
        self.objects == other.objects
            && self.render_order == other.render_order
            && self.extra == other.extra
    }
}

impl<T: Clone> LayerStorage<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.objects.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &HashMap<ObjectId, T> {
        &self.objects
    }

    /// Ids in draw order, topmost last.
    pub fn render_order(&self) -> &[ObjectId] {
        &self.render_order
    }

    /// Objects in draw order.
    pub fn ordered(&self) -> impl Iterator<Item = (&ObjectId, &T)> {
        self.render_order
            .iter()
            .filter_map(|id| self.objects.get(id).map(|object| (id, object)))
    }

    pub fn extra(&self) -> &serde_json::Value {
        &self.extra
    }

    pub fn extra_mut(&mut self) -> &mut serde_json::Value {
        &mut self.extra
    }

    /// Whether `render_order` holds exactly the object keys, once each.
    pub fn is_consistent(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.render_order.len() == self.objects.len()
            && self
                .render_order
                .iter()
                .all(|id| self.objects.contains_key(id) && seen.insert(id))
    }

    /// Insert (moving the id to the top) or delete an object.
    pub(crate) fn apply(&mut self, id: &str, object: Option<T>) -> Applied<T> {
        self.sync_stamps();
        let previous_stamp = self.stamps.get(id).copied();
        let stamp = object.is_some().then(|| {
            let stamp = self.next_stamp;
            self.next_stamp += 1;
            stamp
        });
        let previous = self.set(id, object, stamp);
        Applied {
            previous,
            previous_stamp,
            stamp,
        }
    }

    /// Put an object back with a stamp recorded earlier.
    pub(crate) fn restore(&mut self, id: &str, object: Option<T>, stamp: Option<u64>) {
        self.sync_stamps();
        self.set(id, object, stamp);
    }

    fn set(&mut self, id: &str, object: Option<T>, stamp: Option<u64>) -> Option<T> {
        self.render_order.retain(|o| o != id);
        self.stamps.remove(id);
        let previous = match (object, stamp) {
            (Some(object), Some(stamp)) => {
                let at = self
                    .render_order
                    .partition_point(|o| self.stamps.get(o).is_some_and(|&s| s < stamp));
                self.render_order.insert(at, id.to_string());
                self.stamps.insert(id.to_string(), stamp);
                self.next_stamp = self.next_stamp.max(stamp + 1);
                self.objects.insert(id.to_string(), object)
            }
            _ => self.objects.remove(id),
        };
        previous
    }

    /// Rebuild stamps from the render order after deserialization.
    fn sync_stamps(&mut self) {
        if self.stamps.len() == self.render_order.len() {
            return;
        }
        self.stamps = self
            .render_order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i as u64))
            .collect();
        self.next_stamp = self.render_order.len() as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_moves_to_top() {
        let mut layer = LayerStorage::new();
        layer.apply("a", Some(1));
        layer.apply("b", Some(2));
        layer.apply("a", Some(3));
        assert_eq!(layer.render_order(), ["b", "a"]);
        assert_eq!(layer.get("a"), Some(&3));
        assert!(layer.is_consistent());
    }

    #[test]
    fn test_delete_removes_from_order() {
        let mut layer = LayerStorage::new();
        layer.apply("a", Some(1));
        let applied = layer.apply("a", None);
        assert_eq!(applied.previous, Some(1));
        assert!(layer.is_empty());
        assert!(layer.render_order().is_empty());
    }

    #[test]
    fn test_restore_returns_to_old_position() {
        let mut layer = LayerStorage::new();
        layer.apply("a", Some(1));
        layer.apply("b", Some(2));
        layer.apply("c", Some(3));
        let applied = layer.apply("a", Some(10));
        assert_eq!(layer.render_order(), ["b", "c", "a"]);

        layer.restore("a", applied.previous, applied.previous_stamp);
        assert_eq!(layer.render_order(), ["a", "b", "c"]);
        assert_eq!(layer.get("a"), Some(&1));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut once = LayerStorage::new();
        once.apply("a", Some(1));
        once.apply("b", Some(2));
        let mut twice = once.clone();

        once.apply("a", Some(5));
        twice.apply("a", Some(5));
        twice.apply("a", Some(5));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_json_roundtrip_keeps_order() {
        let mut layer = LayerStorage::new();
        layer.apply("x", Some("first".to_string()));
        layer.apply("y", Some("second".to_string()));
        layer.apply("x", Some("third".to_string()));
        *layer.extra_mut() = serde_json::json!({"cursor": 3});

        let json = serde_json::to_string(&layer).unwrap();
        let mut loaded: LayerStorage<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, layer);

        // Stamps are rebuilt on the first mutation after loading.
        loaded.apply("z", Some("fourth".to_string()));
        assert_eq!(loaded.render_order(), ["y", "x", "z"]);
    }
}
