//! Route-tree compilation and match selection.
//!
//! [`CoreBuilder::build`](crate::CoreBuilder::build) compiles the declared
//! [`Route`] tree against the condition and property registries. Compilation
//! inlines every evaluator and pre-builds every static bundle, so matching
//! and dispatch never perform a registry lookup, and every unknown condition
//! kind, unknown output name, and unreachable route is rejected before the
//! first event arrives.

use std::sync::Arc;

use crate::{
    condition::{Condition, ConditionFn, ConditionRegistry},
    error::ConfigError,
    input::Input,
    output::OutputBundle,
    property::PropertyRegistry,
    response::{Responder, Response, ResponseMode},
    route::Route,
};

struct CompiledCondition {
    reference: Condition,
    eval: ConditionFn,
    catch_all: bool,
}

impl CompiledCondition {
    fn passes(&self, input: &Input) -> bool {
        (self.eval)(input, self.reference.args())
    }
}

/// One response action with its body resolved: the optional responder plus
/// the pre-built static overlay.
#[derive(Clone)]
pub(crate) struct CompiledResponse {
    pub(crate) mode: ResponseMode,
    pub(crate) responder: Option<Arc<dyn Responder>>,
    pub(crate) overlay: OutputBundle,
}

pub(crate) struct RouteNode {
    conditions: Vec<CompiledCondition>,
    pub(crate) actions: Vec<CompiledResponse>,
    children: Vec<RouteNode>,
}

impl RouteNode {
    fn matches(&self, input: &Input) -> bool {
        self.conditions.iter().all(|c| c.passes(input))
    }

    fn is_catch_all(&self) -> bool {
        self.conditions.iter().all(|c| c.catch_all)
    }

    /// Human-readable condition list, for logs and config errors.
    pub(crate) fn describe(&self) -> String {
        let conditions: Vec<String> =
            self.conditions.iter().map(|c| c.reference.to_string()).collect();
        format!("[{}]", conditions.join(" & "))
    }
}

/// Immutable routing table: the compiled top-level nodes plus the default
/// and error response lists.
pub struct Router {
    roots: Vec<RouteNode>,
    pub(crate) default_actions: Vec<CompiledResponse>,
    pub(crate) error_actions: Vec<CompiledResponse>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("roots", &self.roots.len())
            .field("default_actions", &self.default_actions.len())
            .field("error_actions", &self.error_actions.len())
            .finish()
    }
}

impl Router {
    pub(crate) fn compile(
        routes: Vec<Route>,
        default_responses: Vec<(ResponseMode, Response)>,
        error_responses: Vec<(ResponseMode, Response)>,
        conditions: &ConditionRegistry,
        properties: &PropertyRegistry,
    ) -> Result<Self, ConfigError> {
        let roots = routes
            .into_iter()
            .map(|route| compile_node(route, conditions, properties))
            .collect::<Result<Vec<_>, _>>()?;
        check_reachability(&roots)?;

        Ok(Self {
            roots,
            default_actions: compile_actions(default_responses, properties)?,
            error_actions: compile_actions(error_responses, properties)?,
        })
    }

    pub(crate) fn route_count(&self) -> usize {
        self.roots.len()
    }

    /// Select the node whose actions run for `input`.
    ///
    /// Top-level nodes are tried in declaration order and the first passing
    /// one is entered. From there the walk descends: at each node the first
    /// passing child becomes current, and a node with no passing child is
    /// final. There is no backtracking out of an entered subtree, so the
    /// winner is the deepest passing node along one leftmost chain — which
    /// may be an interior node, and may have no actions at all.
    pub(crate) fn select(&self, input: &Input) -> Option<&RouteNode> {
        let mut current = self.roots.iter().find(|node| node.matches(input))?;
        loop {
            match current.children.iter().find(|child| child.matches(input)) {
                Some(child) => current = child,
                None => return Some(current),
            }
        }
    }
}

fn compile_node(
    route: Route,
    conditions: &ConditionRegistry,
    properties: &PropertyRegistry,
) -> Result<RouteNode, ConfigError> {
    let compiled_conditions = route
        .conditions
        .into_iter()
        .map(|reference| {
            let def = conditions.resolve(&reference)?;
            Ok(CompiledCondition {
                eval: def.eval,
                catch_all: def.catch_all,
                reference,
            })
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    let actions = compile_actions(route.actions, properties)?;

    let children = route
        .children
        .into_iter()
        .map(|child| compile_node(child, conditions, properties))
        .collect::<Result<Vec<_>, _>>()?;
    check_reachability(&children)?;

    Ok(RouteNode {
        conditions: compiled_conditions,
        actions,
        children,
    })
}

fn compile_actions(
    responses: Vec<(ResponseMode, Response)>,
    properties: &PropertyRegistry,
) -> Result<Vec<CompiledResponse>, ConfigError> {
    responses
        .into_iter()
        .map(|(mode, response)| {
            for (name, _) in &response.writes {
                if !properties.has_output(name) {
                    return Err(ConfigError::UnknownOutput { name: name.clone() });
                }
            }
            Ok(CompiledResponse {
                mode,
                responder: response.responder,
                overlay: OutputBundle::from_pairs(&response.writes),
            })
        })
        .collect()
}

/// Reject siblings declared after an unconditional catch-all node.
fn check_reachability(siblings: &[RouteNode]) -> Result<(), ConfigError> {
    for (i, node) in siblings.iter().enumerate() {
        if node.is_catch_all() && i + 1 < siblings.len() {
            return Err(ConfigError::UnreachableRoute {
                route: siblings[i + 1].describe(),
                catch_all: node.describe(),
            });
        }
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{condition::ConditionPack, event::InboundEvent},
        serde_json::json,
    };

    fn conditions() -> ConditionRegistry {
        let mut registry = ConditionRegistry::new();
        registry
            .register(
                ConditionPack::new("t")
                    .kind("cmd", |input, args| input.str("cmd") == args.as_str())
                    .kind("word", |input, args| input.str("word") == args.as_str())
                    .catch_all("any"),
            )
            .unwrap();
        registry
    }

    fn properties() -> PropertyRegistry {
        let mut registry = PropertyRegistry::new();
        registry
            .register_input("test", "cmd", |e| e.payload()["cmd"].clone())
            .unwrap();
        registry
            .register_input("test", "word", |e| e.payload()["word"].clone())
            .unwrap();
        registry.register_output("test", "text").unwrap();
        registry
    }

    fn input(properties: &PropertyRegistry, cmd: &str, word: &str) -> Input {
        properties.snapshot(&InboundEvent::new(
            "test",
            json!({ "cmd": cmd, "word": word }),
        ))
    }

    fn cmd(value: &str) -> Condition {
        Condition::new("t", "cmd").arg(value)
    }

    fn word(value: &str) -> Condition {
        Condition::new("t", "word").arg(value)
    }

    fn tagged(tag: &str) -> Response {
        Response::new().set("text", tag)
    }

    fn compile(routes: Vec<Route>) -> Result<Router, ConfigError> {
        Router::compile(routes, Vec::new(), Vec::new(), &conditions(), &properties())
    }

    fn selected_tag<'a>(router: &'a Router, input: &Input) -> Option<&'a str> {
        router
            .select(input)
            .and_then(|node| node.actions.first())
            .and_then(|action| action.overlay.str("text"))
    }

    #[test]
    fn first_passing_root_wins() {
        let router = compile(vec![
            Route::on(cmd("help")).respond(tagged("first")),
            Route::on(cmd("help")).respond(tagged("second")),
        ])
        .unwrap();

        let properties = properties();
        assert_eq!(
            selected_tag(&router, &input(&properties, "help", "")),
            Some("first")
        );
    }

    #[test]
    fn walk_descends_to_the_deepest_passing_node() {
        let router = compile(vec![Route::on(cmd("help"))
            .respond(tagged("parent"))
            .child(Route::on(word("hours")).respond(tagged("hours")))
            .child(Route::on(word("address")).respond(tagged("address")))])
        .unwrap();

        let properties = properties();
        assert_eq!(
            selected_tag(&router, &input(&properties, "help", "address")),
            Some("address")
        );
        // No child passes: the interior node itself is the winner.
        assert_eq!(
            selected_tag(&router, &input(&properties, "help", "other")),
            Some("parent")
        );
    }

    #[test]
    fn entered_subtree_is_never_abandoned() {
        // Second root would pass, but the first root already matched and its
        // subtree has no passing child.
        let router = compile(vec![
            Route::on(cmd("help"))
                .respond(tagged("general"))
                .child(Route::on(word("hours")).respond(tagged("hours"))),
            Route::on(cmd("help")).when(word("pay")).respond(tagged("pay")),
        ])
        .unwrap();

        let properties = properties();
        assert_eq!(
            selected_tag(&router, &input(&properties, "help", "pay")),
            Some("general")
        );
    }

    #[test]
    fn multi_condition_nodes_require_every_condition() {
        let router =
            compile(vec![Route::on(cmd("help")).when(word("pay")).respond(tagged("pay"))])
                .unwrap();

        let properties = properties();
        assert_eq!(
            selected_tag(&router, &input(&properties, "help", "pay")),
            Some("pay")
        );
        assert!(router.select(&input(&properties, "help", "other")).is_none());
        assert!(router.select(&input(&properties, "other", "pay")).is_none());
    }

    #[test]
    fn no_passing_root_selects_nothing() {
        let router = compile(vec![Route::on(cmd("help")).respond(tagged("help"))]).unwrap();
        let properties = properties();
        assert!(router.select(&input(&properties, "weather", "")).is_none());
    }

    #[test]
    fn catch_all_child_as_last_sibling_is_accepted() {
        let router = compile(vec![Route::on(cmd("help"))
            .child(Route::on(word("hours")).respond(tagged("hours")))
            .child(Route::on(Condition::new("t", "any")).respond(tagged("fallback")))])
        .unwrap();

        let properties = properties();
        assert_eq!(
            selected_tag(&router, &input(&properties, "help", "whatever")),
            Some("fallback")
        );
    }

    #[test]
    fn sibling_after_catch_all_fails_compilation() {
        let err = compile(vec![Route::on(cmd("help"))
            .child(Route::on(Condition::new("t", "any")).respond(tagged("fallback")))
            .child(Route::on(word("hours")).respond(tagged("hours")))])
        .unwrap_err();

        assert!(matches!(err, ConfigError::UnreachableRoute { ref route, ref catch_all }
            if route.contains("t/word") && catch_all.contains("t/any")));
    }

    #[test]
    fn top_level_route_after_catch_all_fails_compilation() {
        let err = compile(vec![
            Route::on(Condition::new("t", "any")).respond(tagged("everything")),
            Route::on(cmd("help")).respond(tagged("help")),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnreachableRoute { .. }));
    }

    #[test]
    fn catch_all_with_extra_condition_is_not_unreachable_guard() {
        // `any & word(x)` is conditional, so a later sibling stays legal.
        let router = compile(vec![Route::on(cmd("help"))
            .child(
                Route::on(Condition::new("t", "any"))
                    .when(word("hours"))
                    .respond(tagged("hours")),
            )
            .child(Route::on(word("address")).respond(tagged("address")))])
        .unwrap();

        let properties = properties();
        assert_eq!(
            selected_tag(&router, &input(&properties, "help", "address")),
            Some("address")
        );
    }

    #[test]
    fn unknown_condition_fails_compilation() {
        let err = compile(vec![Route::on(Condition::new("t", "never"))]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownCondition { pack, kind }
            if pack == "t" && kind == "never"));
    }

    #[test]
    fn unknown_static_output_fails_compilation() {
        let err = compile(vec![
            Route::on(cmd("help")).respond(Response::new().set("nope", "x")),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOutput { name } if name == "nope"));
    }

    #[test]
    fn default_and_error_lists_are_validated_too() {
        let err = Router::compile(
            Vec::new(),
            vec![(ResponseMode::Immediate, Response::new().set("nope", "x"))],
            Vec::new(),
            &conditions(),
            &properties(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOutput { .. }));
    }
}
