//! Write-once dataset store.
//!
//! The first `get()` generates the dataset; every later call hands out the
//! same `Arc` until `reset()` drops it. Generation runs under the lock, so
//! concurrent first readers never produce two datasets.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::generate::GeneratorConfig;
use crate::Dataset;

#[derive(Debug, Default)]
pub struct DatasetStore {
    config: GeneratorConfig,
    slot: Mutex<Option<Arc<Dataset>>>,
    generations: AtomicUsize,
}

impl DatasetStore {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            slot: Mutex::new(None),
            generations: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn get(&self) -> Arc<Dataset> {
        let mut slot = self.lock();
        if let Some(dataset) = slot.as_ref() {
            debug!("Dataset store hit");
            return Arc::clone(dataset);
        }
        let dataset = Arc::new(self.config.generate());
        self.generations.fetch_add(1, Ordering::SeqCst);
        *slot = Some(Arc::clone(&dataset));
        dataset
    }

    /// Drop the cached dataset; the next `get()` generates a fresh one.
    /// Readers holding the old `Arc` keep their snapshot.
    pub fn reset(&self) {
        let previous = self.lock().take();
        if previous.is_some() {
            debug!("Dataset store reset");
        }
    }

    pub fn is_populated(&self) -> bool {
        self.lock().is_some()
    }

    /// How many datasets this store has generated.
    pub fn generations(&self) -> usize {
        self.generations.load(Ordering::SeqCst)
    }

    // The slot only ever holds a complete Arc, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Option<Arc<Dataset>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
