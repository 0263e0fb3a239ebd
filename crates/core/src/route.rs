//! Declarative route-tree nodes.

use crate::{
    condition::Condition,
    response::{Response, ResponseMode},
};

/// One node of the route tree: conditions, response actions, children.
///
/// Routes are plain declarations; registering them through
/// [`CoreBuilder::route`](crate::CoreBuilder::route) compiles and validates
/// the whole tree. Declaration order is meaningful: siblings are tried
/// first to last and the first one whose conditions pass wins, with no
/// backtracking to later siblings once a subtree is entered.
pub struct Route {
    pub(crate) conditions: Vec<Condition>,
    pub(crate) actions: Vec<(ResponseMode, Response)>,
    pub(crate) children: Vec<Route>,
}

impl Route {
    /// Start a node matching on `condition`.
    pub fn on(condition: Condition) -> Self {
        Self {
            conditions: vec![condition],
            actions: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add another condition; a node matches only when every condition
    /// passes.
    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Append an immediate response action.
    #[must_use]
    pub fn respond(mut self, response: Response) -> Self {
        self.actions.push((ResponseMode::Immediate, response));
        self
    }

    /// Append a deferred response action, detached onto its own task when
    /// the dispatch sequence reaches it.
    #[must_use]
    pub fn respond_deferred(mut self, response: Response) -> Self {
        self.actions.push((ResponseMode::Deferred, response));
        self
    }

    /// Append a child route. Children are tried in declaration order.
    #[must_use]
    pub fn child(mut self, child: Route) -> Self {
        self.children.push(child);
        self
    }
}
