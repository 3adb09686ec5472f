use std::collections::{HashMap, HashSet};

use crate::bank::Category;
use crate::session::PracticeOrder;
use crate::store::schema::pending_key;
use crate::store::{Collection, KvStore, PendingSessionRecord, StoreError};

/// Counters shown next to each category in the menu.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    counts: HashMap<(Collection, Category), usize>,
    pending: HashSet<(Category, PracticeOrder)>,
}

impl StoreStats {
    pub fn count(&self, collection: Collection, category: Category) -> usize {
        self.counts.get(&(collection, category)).copied().unwrap_or(0)
    }

    pub fn has_pending(&self, category: Category, order: PracticeOrder) -> bool {
        self.pending.contains(&(category, order))
    }
}

/// Typed repositories over a key-value store: wrong ids, favorite ids and
/// pending practice sessions. Unreadable values read as absent.
pub struct ProgressStore<K> {
    kv: K,
    stats: StoreStats,
}

impl<K: KvStore> ProgressStore<K> {
    pub fn new(kv: K) -> Self {
        let mut store = Self {
            kv,
            stats: StoreStats::default(),
        };
        for category in Category::ALL {
            store.refresh_stats(category);
        }
        store
    }

    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// Ids in insertion order, without duplicates.
    pub fn ids(&self, collection: Collection, category: Category) -> Vec<String> {
        let key = collection.key(category);
        let Some(raw) = self.kv.get(&key) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => {
                let mut seen = HashSet::new();
                ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "ignoring malformed id list");
                Vec::new()
            }
        }
    }

    pub fn id_set(&self, collection: Collection, category: Category) -> HashSet<String> {
        self.ids(collection, category).into_iter().collect()
    }

    pub fn contains(&self, collection: Collection, category: Category, id: &str) -> bool {
        self.ids(collection, category).iter().any(|i| i == id)
    }

    /// Returns whether the id was newly added.
    pub fn add_id(
        &mut self,
        collection: Collection,
        category: Category,
        id: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.add_ids(collection, category, [id])? > 0)
    }

    /// Add several ids with a single write. Returns how many were new.
    pub fn add_ids<'a>(
        &mut self,
        collection: Collection,
        category: Category,
        new_ids: impl IntoIterator<Item = &'a str>,
    ) -> Result<usize, StoreError> {
        let mut ids = self.ids(collection, category);
        let before = ids.len();
        for id in new_ids {
            if !ids.iter().any(|i| i == id) {
                ids.push(id.to_string());
            }
        }
        let added = ids.len() - before;
        if added > 0 {
            self.write_ids(collection, category, &ids)?;
        }
        self.refresh_stats(category);
        Ok(added)
    }

    /// Returns whether the id was present.
    pub fn remove_id(
        &mut self,
        collection: Collection,
        category: Category,
        id: &str,
    ) -> Result<bool, StoreError> {
        let mut ids = self.ids(collection, category);
        let before = ids.len();
        ids.retain(|i| i != id);
        let removed = ids.len() != before;
        if removed {
            self.write_ids(collection, category, &ids)?;
        }
        self.refresh_stats(category);
        Ok(removed)
    }

    /// Returns whether the id is present afterwards.
    pub fn toggle_id(
        &mut self,
        collection: Collection,
        category: Category,
        id: &str,
    ) -> Result<bool, StoreError> {
        if self.contains(collection, category, id) {
            self.remove_id(collection, category, id)?;
            Ok(false)
        } else {
            self.add_id(collection, category, id)?;
            Ok(true)
        }
    }

    pub fn clear_ids(&mut self, collection: Collection, category: Category) -> Result<(), StoreError> {
        self.kv.delete(&collection.key(category))?;
        self.refresh_stats(category);
        Ok(())
    }

    pub fn pending(&self, category: Category, order: PracticeOrder) -> Option<PendingSessionRecord> {
        let key = pending_key(category, order);
        let raw = self.kv.get(&key)?;
        match serde_json::from_str::<PendingSessionRecord>(&raw) {
            Ok(record) if record.is_consistent() => Some(record),
            Ok(_) => {
                tracing::warn!(%key, "ignoring inconsistent pending session");
                None
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "ignoring malformed pending session");
                None
            }
        }
    }

    pub fn save_pending(
        &mut self,
        category: Category,
        order: PracticeOrder,
        record: &PendingSessionRecord,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        self.kv.set(&pending_key(category, order), &json)?;
        self.refresh_stats(category);
        Ok(())
    }

    pub fn clear_pending(&mut self, category: Category, order: PracticeOrder) -> Result<(), StoreError> {
        self.kv.delete(&pending_key(category, order))?;
        self.refresh_stats(category);
        Ok(())
    }

    fn write_ids(
        &mut self,
        collection: Collection,
        category: Category,
        ids: &[String],
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(ids)?;
        self.kv.set(&collection.key(category), &json)?;
        tracing::debug!(?collection, %category, count = ids.len(), "id list saved");
        Ok(())
    }

    fn refresh_stats(&mut self, category: Category) {
        for collection in [Collection::Wrong, Collection::Favorite] {
            let count = self.ids(collection, category).len();
            self.stats.counts.insert((collection, category), count);
        }
        for order in PracticeOrder::ALL {
            if self.pending(category, order).is_some() {
                self.stats.pending.insert((category, order));
            } else {
                self.stats.pending.remove(&(category, order));
            }
        }
    }
}
