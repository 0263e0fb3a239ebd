//! Inbound events as interfaces hand them to the core.

use {serde_json::Value, uuid::Uuid};

/// One normalized inbound platform event.
///
/// Interfaces convert whatever their platform delivers (a webhook payload, a
/// long-poll update, a line on stdin) into one of these before handing it to
/// [`Core::handle`](crate::Core::handle). The payload shape is
/// interface-specific; only that interface's input extractors need to
/// understand it.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    id: Uuid,
    interface: String,
    payload: Value,
}

impl InboundEvent {
    pub fn new(interface: impl Into<String>, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            interface: interface.into(),
            payload,
        }
    }

    /// Correlation id carried into every log event for this request.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Id of the interface that received the event and will deliver replies.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Raw platform payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn events_get_distinct_ids() {
        let a = InboundEvent::new("shell", json!({ "text": "hi" }));
        let b = InboundEvent::new("shell", json!({ "text": "hi" }));
        assert_ne!(a.id(), b.id());
        assert_eq!(a.interface(), "shell");
        assert_eq!(a.payload()["text"], "hi");
    }
}
