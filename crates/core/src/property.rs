//! Input/output property registry.
//!
//! Interfaces declare the named fields they contribute: input properties
//! carry an extractor run once per event, output properties are the names a
//! response is allowed to write. Names live in one flat namespace per
//! direction, and collisions are a configuration error, so a route tree can
//! rely on `"text"` meaning one thing.

use std::{collections::HashMap, fmt, sync::Arc};

use serde_json::Value;

use crate::{error::ConfigError, event::InboundEvent, input::Input};

/// Extractor run against the raw event to produce one input property value.
///
/// Extractors are pure projections: absent or inapplicable data is expressed
/// as a null or empty value, never as a failure.
pub type Extractor = Arc<dyn Fn(&InboundEvent) -> Value + Send + Sync>;

/// Whether a property feeds conditions (input) or deliveries (output).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

struct InputProperty {
    owner: String,
    extract: Extractor,
}

struct OutputProperty {
    owner: String,
}

/// All registered properties, frozen once the core is built.
#[derive(Default)]
pub struct PropertyRegistry {
    inputs: HashMap<String, InputProperty>,
    outputs: HashMap<String, OutputProperty>,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input extractor under `name`, owned by `owner`.
    pub fn register_input(
        &mut self,
        owner: &str,
        name: &str,
        extract: impl Fn(&InboundEvent) -> Value + Send + Sync + 'static,
    ) -> Result<(), ConfigError> {
        if let Some(existing) = self.inputs.get(name) {
            return Err(ConfigError::DuplicateProperty {
                direction: Direction::Input,
                name: name.to_string(),
                owner: existing.owner.clone(),
            });
        }
        self.inputs.insert(name.to_string(), InputProperty {
            owner: owner.to_string(),
            extract: Arc::new(extract),
        });
        Ok(())
    }

    /// Declare an output property name responses may write into.
    pub fn register_output(&mut self, owner: &str, name: &str) -> Result<(), ConfigError> {
        if let Some(existing) = self.outputs.get(name) {
            return Err(ConfigError::DuplicateProperty {
                direction: Direction::Output,
                name: name.to_string(),
                owner: existing.owner.clone(),
            });
        }
        self.outputs.insert(name.to_string(), OutputProperty {
            owner: owner.to_string(),
        });
        Ok(())
    }

    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.contains_key(name)
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Run every registered extractor exactly once against `event` and
    /// memoize the results for the lifetime of the request.
    pub fn snapshot(&self, event: &InboundEvent) -> Input {
        let mut values = HashMap::with_capacity(self.inputs.len());
        for (name, property) in &self.inputs {
            values.insert(name.clone(), (property.extract)(event));
        }
        Input::new(event, values)
    }
}
