//! [`CommandResolver`] – concept name + modifier → command list.
//!
//! 1. A modifier equal to `"()"` is treated as the empty modifier.
//! 2. Unknown concept → [`C2cError::UnknownConcept`].
//! 3. First entry whose modifier matches wins.
//! 4. No match → [`C2cError::UnknownModifier`].

use std::sync::Arc;

use aliveos_types::{C2cError, CommandSpec, EMPTY_CALL_MODIFIER};

use crate::registry::ConceptRegistry;

pub struct CommandResolver {
    registry: Arc<ConceptRegistry>,
}

impl CommandResolver {
    pub fn new(registry: Arc<ConceptRegistry>) -> Self {
        Self { registry }
    }

    /// Map the call-style `"()"` token onto the empty modifier.
    pub fn normalize_modifier(modifier: &str) -> &str {
        if modifier == EMPTY_CALL_MODIFIER { "" } else { modifier }
    }

    pub fn resolve(&self, concept: &str, modifier: &str) -> Result<Vec<CommandSpec>, C2cError> {
        let modifier = Self::normalize_modifier(modifier);
        let descriptor = self
            .registry
            .lookup(concept)
            .ok_or_else(|| C2cError::UnknownConcept(concept.to_string()))?;
        descriptor
            .entry_for(modifier)
            .map(|entry| entry.commands.clone())
            .ok_or_else(|| C2cError::UnknownModifier {
                concept: concept.to_string(),
                modifier: modifier.to_string(),
            })
    }
}
