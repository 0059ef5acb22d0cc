//! Publishing of immutable index snapshots.
//!
//! Readers grab an `Arc` to the current index and query it without holding
//! any lock. Writers build a complete new index off to the side and swap the
//! pointer; a reader sees either the old index or the new one, never a mix.

use crate::config::SearchConfig;
use crate::document::Document;
use crate::error::{Result, SearchError};
use crate::index::{build_index, InvertedIndex};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

pub struct IndexStore {
    current: RwLock<Arc<InvertedIndex>>,
    build_lock: Mutex<()>,
}

impl IndexStore {
    pub fn new(index: InvertedIndex) -> Self {
        Self { current: RwLock::new(Arc::new(index)), build_lock: Mutex::new(()) }
    }

    pub fn empty() -> Self { Self::new(InvertedIndex::new()) }

    /// The index currently published.
    pub fn snapshot(&self) -> Arc<InvertedIndex> {
        self.current.read().clone()
    }

    /// Replace the published index. Returns the previous one.
    pub fn publish(&self, index: InvertedIndex) -> Arc<InvertedIndex> {
        let next = Arc::new(index);
        tracing::info!(num_docs = next.num_docs(), num_terms = next.num_terms(), "publishing index snapshot");
        std::mem::replace(&mut *self.current.write(), next)
    }

    /// Build a new index from `documents` and publish it.
    ///
    /// Only one build may run per store; a second caller gets
    /// [`SearchError::BuildInProgress`]. If the build fails the published
    /// index is left as it was.
    pub fn rebuild<I>(&self, documents: I, config: &SearchConfig) -> Result<Arc<InvertedIndex>>
    where
        I: IntoIterator<Item = Document>,
    {
        let _guard = self.build_lock.try_lock().ok_or(SearchError::BuildInProgress)?;
        let index = build_index(documents, config)?;
        self.publish(index);
        Ok(self.snapshot())
    }

    pub fn is_building(&self) -> bool {
        self.build_lock.is_locked()
    }
}

impl Default for IndexStore {
    fn default() -> Self { Self::empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(ids: &[&str]) -> Vec<Document> {
        ids.iter().map(|id| Document::new(*id).with_field("title", format!("page {id}"))).collect()
    }

    #[test]
    fn rebuild_publishes_new_snapshot() {
        let store = IndexStore::empty();
        let before = store.snapshot();
        store.rebuild(docs(&["a", "b"]), &SearchConfig::default()).unwrap();
        assert!(before.is_empty());
        assert_eq!(store.snapshot().num_docs(), 2);
    }

    #[test]
    fn failed_rebuild_keeps_previous_index() {
        let store = IndexStore::empty();
        store.rebuild(docs(&["a"]), &SearchConfig::default()).unwrap();
        let err = store.rebuild(docs(&["x", "x"]), &SearchConfig::default()).unwrap_err();
        assert_eq!(err, SearchError::DuplicateDocument { id: "x".into() });
        assert_eq!(store.snapshot().docs[0].id, "a");
        assert!(!store.is_building());
    }

    #[test]
    fn readers_only_see_complete_snapshots() {
        let store = IndexStore::new(build_index(docs(&["a"]), &SearchConfig::default()).unwrap());
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..200 {
                        let snap = store.snapshot();
                        assert!(snap.num_docs() == 1 || snap.num_docs() == 3);
                        assert_eq!(snap.num_docs(), snap.docs.len());
                    }
                });
            }
            for _ in 0..20 {
                store.rebuild(docs(&["a", "b", "c"]), &SearchConfig::default()).unwrap();
            }
        });
        assert_eq!(store.snapshot().num_docs(), 3);
    }

    #[test]
    fn concurrent_build_is_rejected() {
        let store = IndexStore::empty();
        let held = store.build_lock.lock();
        let err = store.rebuild(docs(&["a"]), &SearchConfig::default()).unwrap_err();
        assert_eq!(err, SearchError::BuildInProgress);
        drop(held);
        assert!(store.rebuild(docs(&["a"]), &SearchConfig::default()).is_ok());
    }
}
