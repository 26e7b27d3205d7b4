// ── Keyed device storage ──
//
// An `IndexMap` behind an `RwLock`, republished as a `watch` snapshot
// after each write so readers never hold the lock.

use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use tokio::sync::watch;

/// Insertion-ordered map whose writes are visible to the very next read
/// and to every snapshot subscriber.
pub(crate) struct EntityCollection<T: Clone + Send + Sync + 'static> {
    by_key: RwLock<IndexMap<String, Arc<T>>>,
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_key: RwLock::new(IndexMap::new()),
            snapshot,
        }
    }

    /// Insert only if `key` is absent. Returns the stored entity and whether
    /// it was inserted by this call.
    pub(crate) fn insert_if_absent(&self, key: String, entity: T) -> (Arc<T>, bool) {
        let mut map = self.by_key.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = map.get(&key) {
            return (Arc::clone(existing), false);
        }
        let stored = Arc::new(entity);
        map.insert(key, Arc::clone(&stored));
        self.publish(&map);
        (stored, true)
    }

    /// Insert a new entity under a key produced by `next_key`, calling it
    /// again while the key is taken. Gives up after `max_attempts` calls.
    pub(crate) fn insert_with_fresh_key(
        &self,
        max_attempts: u32,
        mut next_key: impl FnMut() -> String,
        build: impl FnOnce(&str) -> T,
    ) -> Option<Arc<T>> {
        let mut map = self.by_key.write().unwrap_or_else(PoisonError::into_inner);
        for _ in 0..max_attempts {
            let key = next_key();
            if map.contains_key(&key) {
                continue;
            }
            let stored = Arc::new(build(&key));
            map.insert(key, Arc::clone(&stored));
            self.publish(&map);
            return Some(stored);
        }
        None
    }

    /// Apply `f` to a copy of the entity and store the result in place.
    /// Returns `false` if the key is unknown.
    pub(crate) fn modify(&self, key: &str, f: impl FnOnce(&mut T)) -> bool {
        let mut map = self.by_key.write().unwrap_or_else(PoisonError::into_inner);
        let Some(slot) = map.get_mut(key) else {
            return false;
        };
        let mut updated = T::clone(&**slot);
        f(&mut updated);
        *slot = Arc::new(updated);
        self.publish(&map);
        true
    }

    /// Look up an entity by its key.
    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        self.by_key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map(Arc::clone)
    }

    /// Snapshot as of the last write.
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Receiver that observes every republished snapshot.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Rebuild the snapshot from the locked map.
    /// Called with the write lock held so snapshots never interleave.
    fn publish(&self, map: &IndexMap<String, Arc<T>>) {
        let values: Vec<Arc<T>> = map.values().map(Arc::clone).collect();
        // send_modify stores even when nobody is subscribed.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_preserves_insertion_order() {
        let col: EntityCollection<String> = EntityCollection::new();
        for key in ["c", "a", "b"] {
            col.insert_if_absent(key.into(), key.to_uppercase());
        }
        assert!(col.modify("a", |s| s.push('2')));
        let snap: Vec<String> = col.snapshot().iter().map(|s| (**s).clone()).collect();
        assert_eq!(snap, ["C", "A2", "B"]);
    }

    #[test]
    fn insert_if_absent_keeps_existing() {
        let col: EntityCollection<String> = EntityCollection::new();
        let (_, inserted) = col.insert_if_absent("k".into(), "first".into());
        assert!(inserted);
        let (stored, inserted) = col.insert_if_absent("k".into(), "second".into());
        assert!(!inserted);
        assert_eq!(*stored, "first");
    }

    #[test]
    fn insert_with_fresh_key_skips_taken_keys() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.insert_if_absent("k1".into(), "taken".into());
        let mut keys = ["k1", "k1", "k2"].into_iter();
        let stored = col
            .insert_with_fresh_key(5, || keys.next().unwrap().to_owned(), |k| format!("v-{k}"))
            .unwrap();
        assert_eq!(*stored, "v-k2");
        assert_eq!(col.len(), 2);
    }

    #[test]
    fn insert_with_fresh_key_gives_up() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.insert_if_absent("same".into(), "taken".into());
        let result = col.insert_with_fresh_key(3, || "same".to_owned(), str::to_owned);
        assert!(result.is_none());
        assert_eq!(col.len(), 1);
    }

    #[test]
    fn modify_unknown_key_is_noop() {
        let col: EntityCollection<String> = EntityCollection::new();
        let before = col.snapshot();
        assert!(!col.modify("missing", |s| s.push('!')));
        assert!(Arc::ptr_eq(&before, &col.snapshot()));
    }

    #[test]
    fn modify_republishes_snapshot() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.insert_if_absent("k".into(), "v".into());
        let before = col.snapshot();
        assert!(col.modify("k", |s| s.push('!')));
        assert!(!Arc::ptr_eq(&before, &col.snapshot()));
        assert_eq!(*col.snapshot()[0], "v!");
    }

    #[tokio::test]
    async fn subscribers_see_mutations() {
        let col: EntityCollection<String> = EntityCollection::new();
        let mut rx = col.subscribe();
        col.insert_if_absent("k".into(), "v".into());
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);
    }
}
