//! Core composition: one router, its interfaces, its log sinks.

use std::{collections::HashMap, sync::Arc};

use tracing::{error, info};

use crate::{
    condition::{ConditionPack, ConditionRegistry},
    dispatch::{self, DispatchContext, Handled, Outcome},
    error::{ConfigError, DispatchError},
    event::InboundEvent,
    interface::{Interface, Registrar},
    log::{BufferSink, LogEvent, LogEventKind, LogFanout, LogSink, Severity},
    property::PropertyRegistry,
    response::{Response, ResponseMode},
    route::Route,
    router::Router,
};

/// The composition root: an immutable compiled router, the property
/// registry, the attached interfaces, and the log sinks.
///
/// Built once at startup through [`Core::builder`]; after that it holds no
/// per-request state and is cheap to share behind an `Arc` across however
/// many transport tasks feed it.
pub struct Core {
    router: Router,
    registry: Arc<PropertyRegistry>,
    interfaces: HashMap<String, Arc<dyn Interface>>,
    log: LogFanout,
}

impl std::fmt::Debug for Core {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut interfaces: Vec<&str> = self.interfaces.keys().map(String::as_str).collect();
        interfaces.sort_unstable();
        f.debug_struct("Core")
            .field("interfaces", &interfaces)
            .field("routes", &self.router.route_count())
            .finish()
    }
}

impl Core {
    pub fn builder() -> CoreBuilder {
        CoreBuilder::default()
    }

    /// Attached interface by id.
    pub fn interface(&self, id: &str) -> Option<Arc<dyn Interface>> {
        self.interfaces.get(id).cloned()
    }

    /// Handle one inbound event to completion.
    ///
    /// Snapshots the input, selects a route, and runs the selected action
    /// sequence — or the default list when nothing matches, or the error
    /// list when an immediate action fails. Always returns: every failure
    /// mode ends in logging, not propagation. Deferred actions may still be
    /// running when this returns; their handles are in the outcomes.
    pub async fn handle(&self, event: InboundEvent) -> Handled {
        let Some(interface) = self.interface(event.interface()) else {
            error!(
                interface = %event.interface(),
                event_id = %event.id(),
                "event from unregistered interface dropped"
            );
            return Handled {
                matched: false,
                outcomes: Vec::new(),
            };
        };

        let input = Arc::new(self.registry.snapshot(&event));
        let ctx = DispatchContext {
            input,
            interface,
            registry: Arc::clone(&self.registry),
            log: self.log.clone(),
        };

        let mut outcomes = Vec::new();
        match self.router.select(&ctx.input) {
            Some(node) => {
                if let Err(error) =
                    dispatch::run_sequence(&ctx, &node.actions, &mut outcomes).await
                {
                    self.recover(&ctx, error, &mut outcomes).await;
                }
                Handled {
                    matched: true,
                    outcomes,
                }
            },
            None => {
                ctx.log.emit(LogEvent::new(
                    LogEventKind::RouteMiss,
                    Severity::Warn,
                    ctx.input.interface(),
                    ctx.input.event_id(),
                    "no route matched; running default responses".to_string(),
                ));
                if let Err(error) =
                    dispatch::run_sequence(&ctx, &self.router.default_actions, &mut outcomes).await
                {
                    self.recover(&ctx, error, &mut outcomes).await;
                }
                Handled {
                    matched: false,
                    outcomes,
                }
            },
        }
    }

    /// Run the error response list after an immediate-action failure. A
    /// failure inside the error list itself is logged and abandoned; it
    /// never recurses.
    async fn recover(
        &self,
        ctx: &DispatchContext,
        error: DispatchError,
        outcomes: &mut Vec<Outcome>,
    ) {
        ctx.log.emit(LogEvent::new(
            LogEventKind::DispatchError,
            Severity::Error,
            ctx.input.interface(),
            ctx.input.event_id(),
            format!("{error}; running error responses"),
        ));
        if let Err(inner) =
            dispatch::run_sequence(ctx, &self.router.error_actions, outcomes).await
        {
            ctx.log.emit(LogEvent::new(
                LogEventKind::DispatchError,
                Severity::Error,
                ctx.input.interface(),
                ctx.input.event_id(),
                format!("error response failed, abandoning the rest: {inner}"),
            ));
        }
    }
}

/// Registration API for assembling a [`Core`].
///
/// Chaining collects declarations without validating anything; [`build`]
/// runs every interface's registration, compiles the route tree, and
/// validates the lot, so every configuration mistake surfaces before the
/// first event is accepted.
///
/// [`build`]: CoreBuilder::build
#[derive(Default)]
pub struct CoreBuilder {
    packs: Vec<ConditionPack>,
    interfaces: Vec<Arc<dyn Interface>>,
    routes: Vec<Route>,
    default_responses: Vec<(ResponseMode, Response)>,
    error_responses: Vec<(ResponseMode, Response)>,
    sinks: Vec<Arc<dyn LogSink>>,
}

impl CoreBuilder {
    /// Register a condition pack not tied to any interface.
    #[must_use]
    pub fn pack(mut self, pack: ConditionPack) -> Self {
        self.packs.push(pack);
        self
    }

    /// Attach an interface. Its registrations run at build time.
    #[must_use]
    pub fn interface(mut self, interface: Arc<dyn Interface>) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Add a top-level route. Declaration order is match order.
    #[must_use]
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Append an immediate action to the default response list, which runs
    /// when no top-level route matches.
    #[must_use]
    pub fn default_response(mut self, response: Response) -> Self {
        self.default_responses.push((ResponseMode::Immediate, response));
        self
    }

    /// Append a deferred action to the default response list.
    #[must_use]
    pub fn default_response_deferred(mut self, response: Response) -> Self {
        self.default_responses.push((ResponseMode::Deferred, response));
        self
    }

    /// Append an immediate action to the error response list, which runs
    /// when an immediate action fails.
    #[must_use]
    pub fn error_response(mut self, response: Response) -> Self {
        self.error_responses.push((ResponseMode::Immediate, response));
        self
    }

    /// Append a deferred action to the error response list.
    #[must_use]
    pub fn error_response_deferred(mut self, response: Response) -> Self {
        self.error_responses.push((ResponseMode::Deferred, response));
        self
    }

    /// Attach a log sink.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Attach a [`BufferSink`] and hand back a clone for reading.
    #[must_use]
    pub fn buffer_sink(self, sink: &BufferSink) -> Self {
        self.sink(Arc::new(sink.clone()))
    }

    /// Validate everything and produce an immutable [`Core`].
    pub fn build(self) -> Result<Core, ConfigError> {
        let mut properties = PropertyRegistry::new();
        let mut conditions = ConditionRegistry::new();

        for pack in self.packs {
            conditions.register(pack)?;
        }

        let mut interfaces: HashMap<String, Arc<dyn Interface>> = HashMap::new();
        for interface in self.interfaces {
            let id = interface.id().to_string();
            if interfaces.contains_key(&id) {
                return Err(ConfigError::DuplicateInterface { id });
            }
            let mut registrar = Registrar::new(&id, &mut properties, &mut conditions);
            interface.describe(&mut registrar)?;
            interfaces.insert(id, interface);
        }

        let router = Router::compile(
            self.routes,
            self.default_responses,
            self.error_responses,
            &conditions,
            &properties,
        )?;

        info!(
            interfaces = interfaces.len(),
            routes = router.route_count(),
            inputs = properties.input_count(),
            outputs = properties.output_count(),
            "core configured"
        );

        Ok(Core {
            router,
            registry: Arc::new(properties),
            interfaces,
            log: LogFanout::new(self.sinks),
        })
    }
}
