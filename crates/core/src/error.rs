//! Error taxonomy: fatal configuration errors and recoverable dispatch
//! errors.

use std::{error::Error as StdError, fmt};

use crate::property::Direction;

/// Configuration-time failure. Any of these means [`CoreBuilder`] refused to
/// produce a core; they must stop the process before it accepts traffic.
///
/// [`CoreBuilder`]: crate::CoreBuilder
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A property name was registered twice in the same direction.
    #[error("duplicate {direction} property \"{name}\" (already registered by interface \"{owner}\")")]
    DuplicateProperty {
        direction: Direction,
        name: String,
        /// Interface that registered the name first.
        owner: String,
    },

    /// A condition pack id was registered twice.
    #[error("duplicate condition pack \"{pack}\"")]
    DuplicatePack { pack: String },

    /// Two interfaces were attached under the same id.
    #[error("duplicate interface \"{id}\"")]
    DuplicateInterface { id: String },

    /// A route references a pack/kind no registered pack provides.
    #[error("unknown condition {pack}/{kind}")]
    UnknownCondition { pack: String, kind: String },

    /// A response writes an output property no interface registered.
    #[error("unknown output property \"{name}\"")]
    UnknownOutput { name: String },

    /// A route is declared after an unconditional catch-all sibling, so no
    /// event can ever reach it.
    #[error("route {route} is unreachable: declared after catch-all sibling {catch_all}")]
    UnreachableRoute {
        /// Condition list of the dead route.
        route: String,
        /// Condition list of the catch-all shadowing it.
        catch_all: String,
    },
}

/// Per-request failure of one response action, recovered by the router.
///
/// An immediate action failing this way aborts the rest of its sequence and
/// triggers the error response list; a deferred action failing this way is
/// only logged.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The action body itself failed (responder returned an error, or wrote
    /// an unregistered output property).
    #[error("response action failed: {source:#}")]
    Action {
        #[source]
        source: anyhow::Error,
    },

    /// The interface could not deliver the finalized bundle.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Transport failure reported by an interface while delivering a bundle.
#[derive(Debug, thiserror::Error)]
#[error("delivery via interface \"{interface}\" failed: {message}")]
pub struct DeliveryError {
    interface: String,
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl DeliveryError {
    #[must_use]
    pub fn new(interface: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            interface: interface.into(),
            message: message.to_string(),
            source: None,
        }
    }

    /// Wrap an underlying transport error, keeping it as the source chain.
    #[must_use]
    pub fn from_source(
        interface: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            interface: interface.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Id of the interface that failed to deliver.
    pub fn interface(&self) -> &str {
        &self.interface
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_render_the_offender() {
        let err = ConfigError::DuplicateProperty {
            direction: Direction::Input,
            name: "text".into(),
            owner: "shell".into(),
        };
        assert_eq!(
            err.to_string(),
            "duplicate input property \"text\" (already registered by interface \"shell\")"
        );

        let err = ConfigError::UnknownCondition {
            pack: "flow".into(),
            kind: "never".into(),
        };
        assert_eq!(err.to_string(), "unknown condition flow/never");
    }

    #[test]
    fn delivery_error_keeps_its_source() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = DeliveryError::from_source("shell", io);
        assert_eq!(err.interface(), "shell");
        assert!(err.to_string().contains("pipe closed"));
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn dispatch_error_wraps_delivery() {
        let err = DispatchError::from(DeliveryError::new("shell", "socket gone"));
        assert!(matches!(err, DispatchError::Delivery(_)));
        assert!(err.to_string().contains("socket gone"));
    }
}
