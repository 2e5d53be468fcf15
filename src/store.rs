use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// In-memory mapping from receipt identifier to awarded points.
///
/// Records are write-once: [`PointsStore::put`] never replaces an existing
/// entry. A single mutex guards the map and is held only for the lookup or
/// insert itself.
#[derive(Debug, Default)]
pub struct PointsStore {
    records: Mutex<HashMap<String, i64>>,
}

impl PointsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new record. Returns `false`, leaving the store untouched,
    /// when `id` is already present.
    pub fn put(&self, id: &str, points: i64) -> bool {
        match self.records.lock().entry(id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(points);
                true
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<i64> {
        self.records.lock().get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
