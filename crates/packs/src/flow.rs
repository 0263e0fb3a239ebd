//! Flow-control conditions.

use weir_core::{Condition, ConditionPack};

/// Pack id.
pub const PACK: &str = "flow";

/// The `flow` pack: a single unconditional `any` kind.
pub fn flow_pack() -> ConditionPack {
    ConditionPack::new(PACK).catch_all("any")
}

/// Condition that passes for every input.
///
/// Legal only as the last sibling of its level; the router rejects routes
/// declared after it as unreachable.
pub fn any() -> Condition {
    Condition::new(PACK, "any")
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        serde_json::json,
        weir_core::{ConditionRegistry, InboundEvent, PropertyRegistry},
    };

    use super::*;

    #[test]
    fn any_passes_for_arbitrary_input() {
        let mut conditions = ConditionRegistry::new();
        conditions.register(flow_pack()).unwrap();

        let properties = PropertyRegistry::new();
        let input = properties.snapshot(&InboundEvent::new("test", json!({ "x": 1 })));
        assert!(conditions.matches(&any(), &input).unwrap());
    }
}
