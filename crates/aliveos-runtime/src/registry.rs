//! [`ConceptRegistry`] – write-once store of concept descriptors.
//!
//! Descriptors are keyed by concept name and live for the process lifetime.
//! There is no update or delete: registering a name twice is rejected with
//! [`C2cError::DuplicateConcept`] and the first descriptor stays in place.
//! Concurrent registrations of the same name are linearized by the map's
//! entry API, so exactly one of them wins.

use std::sync::Arc;

use aliveos_types::{C2cError, ConceptDescriptor};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{error, info};

#[derive(Debug, Default)]
pub struct ConceptRegistry {
    concepts: DashMap<String, Arc<ConceptDescriptor>>,
}

impl ConceptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `descriptor` under its own name.
    ///
    /// # Errors
    ///
    /// [`C2cError::DuplicateConcept`] when the name is already registered.
    pub fn register(&self, descriptor: ConceptDescriptor) -> Result<(), C2cError> {
        match self.concepts.entry(descriptor.name.clone()) {
            Entry::Occupied(_) => {
                error!(concept = %descriptor.name, "Command concept already exists!");
                Err(C2cError::DuplicateConcept(descriptor.name))
            }
            Entry::Vacant(slot) => {
                info!(
                    concept = %descriptor.name,
                    modifiers = descriptor.entries.len(),
                    "concept registered"
                );
                slot.insert(Arc::new(descriptor));
                Ok(())
            }
        }
    }

    /// Pure read.  `None` lets the caller pick its own error.
    pub fn lookup(&self, name: &str) -> Option<Arc<ConceptDescriptor>> {
        self.concepts.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Registered concept names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.concepts.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }
}
