//! Output bundles and the validated builder that produces them.

use std::sync::Arc;

use {
    serde::Serialize,
    serde_json::{Map, Value},
};

use crate::{error::ConfigError, property::PropertyRegistry};

/// Finalized set of output-property writes for one deliverable message.
///
/// Bundles are immutable once built; an interface receives one per delivery
/// and turns it into a platform call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputBundle {
    values: Map<String, Value>,
}

impl OutputBundle {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// String view of a property; `None` when absent or not a string.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// JSON object view, for transports that ship bundles verbatim.
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Build from pre-validated name/value pairs; later pairs win.
    pub(crate) fn from_pairs(pairs: &[(String, Value)]) -> Self {
        let mut values = Map::new();
        for (name, value) in pairs {
            values.insert(name.clone(), value.clone());
        }
        Self { values }
    }

    /// Apply `overlay` on top of this bundle, overwriting shared names.
    pub(crate) fn merge(&mut self, overlay: &OutputBundle) {
        for (name, value) in &overlay.values {
            self.values.insert(name.clone(), value.clone());
        }
    }
}

/// Write-validated builder for one [`OutputBundle`].
///
/// `set` rejects names no interface registered, so a typo in a dynamic
/// responder surfaces as a dispatch error on that action instead of a
/// malformed platform call. Writing the same name twice keeps the last
/// value.
pub struct OutputBuilder {
    registry: Arc<PropertyRegistry>,
    values: Map<String, Value>,
}

impl std::fmt::Debug for OutputBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputBuilder")
            .field("values", &self.values)
            .finish()
    }
}

impl OutputBuilder {
    pub(crate) fn new(registry: Arc<PropertyRegistry>) -> Self {
        Self {
            registry,
            values: Map::new(),
        }
    }

    /// Write `value` into registered output property `name`.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self, ConfigError> {
        if !self.registry.has_output(name) {
            return Err(ConfigError::UnknownOutput {
                name: name.to_string(),
            });
        }
        self.values.insert(name.to_string(), value.into());
        Ok(self)
    }

    /// Finalize into an immutable bundle.
    pub fn finish(self) -> OutputBundle {
        OutputBundle {
            values: self.values,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Arc<PropertyRegistry> {
        let mut registry = PropertyRegistry::new();
        registry.register_output("shell", "text").unwrap();
        registry.register_output("shell", "attachment").unwrap();
        Arc::new(registry)
    }

    #[test]
    fn set_rejects_unregistered_names() {
        let mut builder = OutputBuilder::new(registry());
        let err = builder.set("nope", "x").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOutput { name } if name == "nope"));
    }

    #[test]
    fn last_write_wins() {
        let mut builder = OutputBuilder::new(registry());
        builder.set("text", "first").unwrap();
        builder.set("text", "second").unwrap();
        let bundle = builder.finish();
        assert_eq!(bundle.str("text"), Some("second"));
        assert_eq!(bundle.len(), 1);
    }

    #[test]
    fn from_pairs_keeps_the_last_duplicate() {
        let bundle = OutputBundle::from_pairs(&[
            ("text".into(), "a".into()),
            ("attachment".into(), "file.pdf".into()),
            ("text".into(), "b".into()),
        ]);
        assert_eq!(bundle.str("text"), Some("b"));
        assert_eq!(bundle.str("attachment"), Some("file.pdf"));
    }

    #[test]
    fn merge_overwrites_shared_names_only() {
        let mut base = OutputBundle::from_pairs(&[
            ("text".into(), "hello".into()),
            ("attachment".into(), "a.pdf".into()),
        ]);
        let overlay = OutputBundle::from_pairs(&[("text".into(), "bye".into())]);
        base.merge(&overlay);
        assert_eq!(base.str("text"), Some("bye"));
        assert_eq!(base.str("attachment"), Some("a.pdf"));
    }
}
