use parking_lot::RwLock;
use std::sync::Arc;

use techlingo_text::Index;

/// Holds the current index snapshot. Readers take an `Arc` and keep it for
/// as long as they need; publishing swaps the pointer and never blocks them
/// beyond the swap itself.
#[derive(Debug)]
pub struct IndexStore {
    current: RwLock<Arc<Index>>,
}

impl IndexStore {
    /// Starts with an empty index at generation 0.
    pub fn new() -> Self {
        Self { current: RwLock::new(Arc::new(Index::empty())) }
    }

    /// Replace the current index and return its generation, one above the previous.
    pub fn publish(&self, index: Index) -> u64 {
        let mut current = self.current.write();
        let generation = current.generation() + 1;
        *current = Arc::new(index.with_generation(generation));
        tracing::info!(generation, chunks = current.len(), "index published");
        generation
    }

    pub fn snapshot(&self) -> Arc<Index> {
        Arc::clone(&self.current.read())
    }

    pub fn generation(&self) -> u64 {
        self.current.read().generation()
    }
}

impl Default for IndexStore {
    fn default() -> Self {
        Self::new()
    }
}
