//! Per-consumer active-incident registry.
//!
//! Incidents for different consumers run concurrently with no shared state;
//! this map only enforces that a single consumer never has two incidents in
//! flight at once.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Tracks which consumers currently have an active incident.
pub struct IncidentRegistry {
    active: DashMap<String, Uuid>,
}

impl IncidentRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            active: DashMap::new(),
        })
    }

    /// Claim a consumer for an incident. Fails if one is already active.
    ///
    /// The returned guard releases the claim on drop, so every exit path
    /// out of the orchestrator (terminal, interrupted, error) frees the
    /// consumer.
    pub fn begin(
        self: &Arc<Self>,
        consumer_id: &str,
        incident_id: Uuid,
    ) -> Result<RegistryGuard, Uuid> {
        match self.active.entry(consumer_id.to_string()) {
            Entry::Occupied(existing) => Err(*existing.get()),
            Entry::Vacant(slot) => {
                slot.insert(incident_id);
                Ok(RegistryGuard {
                    registry: Arc::clone(self),
                    consumer_id: consumer_id.to_string(),
                })
            }
        }
    }

    /// The incident currently active for a consumer, if any.
    pub fn active_incident(&self, consumer_id: &str) -> Option<Uuid> {
        self.active.get(consumer_id).map(|entry| *entry.value())
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

/// RAII claim on a consumer slot.
pub struct RegistryGuard {
    registry: Arc<IncidentRegistry>,
    consumer_id: String,
}

impl std::fmt::Debug for RegistryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryGuard")
            .field("consumer_id", &self.consumer_id)
            .finish()
    }
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        self.registry.active.remove(&self.consumer_id);
    }
}
