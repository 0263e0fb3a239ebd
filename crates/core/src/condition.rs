//! Conditions, condition packs, and the registry routes resolve against.

use std::{collections::HashMap, fmt, sync::Arc};

use serde_json::Value;

use crate::{error::ConfigError, input::Input};

/// Predicate over an input snapshot.
///
/// Evaluators must be deterministic and side-effect-free for a given
/// snapshot: they read the memoized input and their arguments, nothing else.
pub type ConditionFn = Arc<dyn Fn(&Input, &Value) -> bool + Send + Sync>;

/// Reference to a registered condition kind plus the arguments it is
/// evaluated with.
///
/// Building one performs no lookup; unknown pack/kind pairs surface as
/// [`ConfigError::UnknownCondition`] when the route tree is compiled.
#[derive(Debug, Clone)]
pub struct Condition {
    pack: String,
    kind: String,
    args: Value,
}

impl Condition {
    pub fn new(pack: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            pack: pack.into(),
            kind: kind.into(),
            args: Value::Null,
        }
    }

    /// Attach arguments the evaluator receives alongside the input.
    #[must_use]
    pub fn arg(mut self, args: impl Into<Value>) -> Self {
        self.args = args.into();
        self
    }

    pub fn pack(&self) -> &str {
        &self.pack
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn args(&self) -> &Value {
        &self.args
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pack, self.kind)?;
        if !self.args.is_null() {
            write!(f, "({})", self.args)?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub(crate) struct ConditionDef {
    pub(crate) eval: ConditionFn,
    /// Marks a kind that passes for every input. The router uses this to
    /// reject siblings declared after it.
    pub(crate) catch_all: bool,
}

/// Namespace of related condition kinds, registered as one unit.
///
/// Interfaces contribute packs for their platform's concepts; libraries can
/// ship platform-independent ones. The pack name prefixes every kind, so two
/// packs never collide on kind names.
pub struct ConditionPack {
    name: String,
    kinds: HashMap<String, ConditionDef>,
}

impl ConditionPack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kinds: HashMap::new(),
        }
    }

    /// Register an evaluator under `kind`. Re-adding a kind replaces it.
    #[must_use]
    pub fn kind(
        mut self,
        kind: impl Into<String>,
        eval: impl Fn(&Input, &Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.kinds.insert(kind.into(), ConditionDef {
            eval: Arc::new(eval),
            catch_all: false,
        });
        self
    }

    /// Register `kind` as an unconditional catch-all: it passes for every
    /// input, and routes declared after a sibling using it are rejected as
    /// unreachable when the tree is compiled.
    #[must_use]
    pub fn catch_all(mut self, kind: impl Into<String>) -> Self {
        self.kinds.insert(kind.into(), ConditionDef {
            eval: Arc::new(|_, _| true),
            catch_all: true,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// All registered packs, consulted when the route tree is compiled.
#[derive(Default)]
pub struct ConditionRegistry {
    packs: HashMap<String, HashMap<String, ConditionDef>>,
}

impl ConditionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, pack: ConditionPack) -> Result<(), ConfigError> {
        if self.packs.contains_key(&pack.name) {
            return Err(ConfigError::DuplicatePack { pack: pack.name });
        }
        self.packs.insert(pack.name, pack.kinds);
        Ok(())
    }

    /// Evaluate `condition` against `input`, failing for unknown pack/kind
    /// pairs.
    pub fn matches(&self, condition: &Condition, input: &Input) -> Result<bool, ConfigError> {
        let def = self.resolve(condition)?;
        Ok((def.eval)(input, condition.args()))
    }

    pub(crate) fn resolve(&self, condition: &Condition) -> Result<ConditionDef, ConfigError> {
        self.packs
            .get(condition.pack())
            .and_then(|kinds| kinds.get(condition.kind()))
            .cloned()
            .ok_or_else(|| ConfigError::UnknownCondition {
                pack: condition.pack().to_string(),
                kind: condition.kind().to_string(),
            })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{event::InboundEvent, property::PropertyRegistry},
        serde_json::json,
    };

    fn input(text: &str) -> Input {
        let mut properties = PropertyRegistry::new();
        properties
            .register_input("test", "text", |e| e.payload()["text"].clone())
            .unwrap();
        properties.snapshot(&InboundEvent::new("test", json!({ "text": text })))
    }

    fn sample_pack() -> ConditionPack {
        ConditionPack::new("sample")
            .kind("is", |input, args| input.str("text") == args.as_str())
            .catch_all("any")
    }

    #[test]
    fn display_includes_args_when_present() {
        let bare = Condition::new("flow", "any");
        assert_eq!(bare.to_string(), "flow/any");

        let with_args = Condition::new("sample", "is").arg("help");
        assert_eq!(with_args.to_string(), "sample/is(\"help\")");
    }

    #[test]
    fn matches_evaluates_registered_kinds() {
        let mut registry = ConditionRegistry::new();
        registry.register(sample_pack()).unwrap();

        let cond = Condition::new("sample", "is").arg("hello");
        assert!(registry.matches(&cond, &input("hello")).unwrap());
        assert!(!registry.matches(&cond, &input("goodbye")).unwrap());
    }

    #[test]
    fn catch_all_passes_for_any_input() {
        let mut registry = ConditionRegistry::new();
        registry.register(sample_pack()).unwrap();

        let cond = Condition::new("sample", "any");
        assert!(registry.matches(&cond, &input("anything at all")).unwrap());
        assert!(registry.resolve(&cond).unwrap().catch_all);
    }

    #[test]
    fn unknown_kind_is_a_config_error() {
        let mut registry = ConditionRegistry::new();
        registry.register(sample_pack()).unwrap();

        let err = registry
            .matches(&Condition::new("sample", "never"), &input("x"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownCondition { pack, kind }
            if pack == "sample" && kind == "never"));
    }

    #[test]
    fn duplicate_pack_is_rejected() {
        let mut registry = ConditionRegistry::new();
        registry.register(sample_pack()).unwrap();
        let err = registry.register(ConditionPack::new("sample")).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePack { pack } if pack == "sample"));
    }
}
