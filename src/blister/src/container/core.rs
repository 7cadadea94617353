use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;

use crate::wrapper::Resolver;

pub struct ContainerCore {
    parent: Option<Arc<Self>>,
    entries: RwLock<IndexMap<String, Arc<dyn Resolver>>>,
    depth: usize,
}

impl ContainerCore {
    pub fn new_root() -> Self {
        Self::new_impl(None, 0)
    }

    pub fn new_sub(parent: Arc<Self>) -> Self {
        let depth = parent.depth + 1;
        Self::new_impl(Some(parent), depth)
    }

    fn new_impl(parent: Option<Arc<Self>>, depth: usize) -> Self {
        Self {
            parent,
            entries: RwLock::new(IndexMap::new()),
            depth,
        }
    }

    pub fn parent(&self) -> Option<&Arc<Self>> {
        self.parent.as_ref()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Finds the resolver of `id` in this core or, on a miss, in the
    /// closest ancestor which has one.
    pub fn lookup(&self, id: &str) -> Option<Arc<dyn Resolver>> {
        let mut core = self;
        loop {
            if let Some(resolver) = core.entries.read().get(id) {
                return Some(Arc::clone(resolver));
            }
            core = core.parent.as_deref()?;
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        let mut core = self;
        loop {
            if core.entries.read().contains_key(id) {
                return true;
            }
            match core.parent.as_deref() {
                Some(parent) => core = parent,
                None => return false,
            }
        }
    }

    /// Stores `resolver` locally, keeping the position of a replaced entry.
    pub fn insert(&self, id: &str, resolver: Arc<dyn Resolver>) -> Option<Arc<dyn Resolver>> {
        self.entries.write().insert(id.to_owned(), resolver)
    }

    /// Returns local keys in insertion order followed by inherited keys which
    /// aren't shadowed.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: IndexSet<String> = self.entries.read().keys().cloned().collect();
        if let Some(parent) = self.parent.as_deref() {
            keys.extend(parent.keys());
        }
        keys.into_iter().collect()
    }
}
