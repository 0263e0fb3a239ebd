//! Memoized input snapshots.

use std::collections::HashMap;

use {serde_json::Value, uuid::Uuid};

use crate::event::InboundEvent;

/// Read-only input-property snapshot for one request.
///
/// Built once per event by [`PropertyRegistry::snapshot`]; every extractor
/// has already run, so repeated reads of the same property during matching
/// and dispatch are lookups, never recomputation. Conditions and responders
/// read from it and must not mutate it.
///
/// [`PropertyRegistry::snapshot`]: crate::property::PropertyRegistry::snapshot
#[derive(Debug, Clone)]
pub struct Input {
    event_id: Uuid,
    interface: String,
    values: HashMap<String, Value>,
}

impl Input {
    pub(crate) fn new(event: &InboundEvent, values: HashMap<String, Value>) -> Self {
        Self {
            event_id: event.id(),
            interface: event.interface().to_string(),
            values,
        }
    }

    /// Correlation id of the event this snapshot was taken from.
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    /// Id of the interface the event arrived through.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Memoized value of a registered input property; `None` when no
    /// extractor of that name is registered.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// String view of a property; `None` when absent or not a string.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Integer view of a property; `None` when absent or not an integer.
    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    /// Boolean view of a property; `None` when absent or not a boolean.
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Number of properties in the snapshot.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
