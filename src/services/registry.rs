use crate::models::RegisteredImage;
use dashmap::DashMap;

/// In-flight association between an entity id and its most recent upload.
///
/// Process-scoped and volatile: nothing expires and nothing survives a
/// restart. Writes to one key are atomic; concurrent uploads for the same
/// entity resolve to whichever `put` lands last.
#[derive(Debug, Default)]
pub struct FileRegistry {
    entries: DashMap<String, RegisteredImage>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditional overwrite. Returns the entry that was replaced, if any.
    pub fn put(&self, entity_id: &str, entry: RegisteredImage) -> Option<RegisteredImage> {
        self.entries.insert(entity_id.to_string(), entry)
    }

    /// A miss only logs a warning.
    pub fn get(&self, entity_id: &str) -> Option<RegisteredImage> {
        let found = self.entries.get(entity_id).map(|entry| entry.value().clone());
        if found.is_none() {
            tracing::warn!("No registered upload for entity {}", entity_id);
        }
        found
    }

    /// Removing a missing id only logs a warning.
    pub fn remove(&self, entity_id: &str) -> Option<RegisteredImage> {
        let removed = self.entries.remove(entity_id).map(|(_, entry)| entry);
        if removed.is_none() {
            tracing::warn!("No registered upload to remove for entity {}", entity_id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
