//! Response actions: static output writes and dynamic responders.

use std::{future::Future, pin::Pin, sync::Arc};

use {async_trait::async_trait, serde_json::Value};

use crate::{
    input::Input,
    output::{OutputBuilder, OutputBundle},
    property::PropertyRegistry,
};

/// When a response action runs relative to its dispatch sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Rendered and delivered before the next action starts; a failure
    /// aborts the rest of the sequence.
    Immediate,
    /// Detached onto its own task at its declared position; never blocks
    /// the sequence, and a failure is only logged.
    Deferred,
}

/// Per-request context handed to dynamic responders.
#[derive(Clone)]
pub struct ResponseContext {
    input: Arc<Input>,
    registry: Arc<PropertyRegistry>,
}

impl ResponseContext {
    pub(crate) fn new(input: Arc<Input>, registry: Arc<PropertyRegistry>) -> Self {
        Self { input, registry }
    }

    /// Memoized input snapshot of the event being handled.
    pub fn input(&self) -> &Input {
        &self.input
    }

    /// Fresh builder validated against the registered output properties.
    pub fn output(&self) -> OutputBuilder {
        OutputBuilder::new(Arc::clone(&self.registry))
    }
}

/// Computes one output bundle from the request input.
///
/// Implement this directly for responders carrying state (HTTP clients,
/// caches); plain closures go through [`Response::from_fn`] or
/// [`Response::from_async`].
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, ctx: &ResponseContext) -> anyhow::Result<OutputBundle>;
}

struct FnResponder<F>(F);

#[async_trait]
impl<F> Responder for FnResponder<F>
where
    F: Fn(&ResponseContext) -> anyhow::Result<OutputBundle> + Send + Sync,
{
    async fn respond(&self, ctx: &ResponseContext) -> anyhow::Result<OutputBundle> {
        (self.0)(ctx)
    }
}

type BoxedAsyncFn = Box<
    dyn Fn(ResponseContext) -> Pin<Box<dyn Future<Output = anyhow::Result<OutputBundle>> + Send>>
        + Send
        + Sync,
>;

struct AsyncFnResponder(BoxedAsyncFn);

#[async_trait]
impl Responder for AsyncFnResponder {
    async fn respond(&self, ctx: &ResponseContext) -> anyhow::Result<OutputBundle> {
        (self.0)(ctx.clone()).await
    }
}

/// Body of one response action, declared on a route and compiled with it.
///
/// A response has an optional responder and a list of static writes. At
/// render time the responder (if any) produces a bundle first and the static
/// writes land on top, later writes of the same name winning. Static write
/// names are validated when the core is built, so a pure-static response can
/// never fail at dispatch time.
pub struct Response {
    pub(crate) responder: Option<Arc<dyn Responder>>,
    pub(crate) writes: Vec<(String, Value)>,
}

impl Response {
    /// Empty static response; chain [`set`](Self::set) to add writes.
    pub fn new() -> Self {
        Self {
            responder: None,
            writes: Vec::new(),
        }
    }

    /// Dynamic response from a synchronous closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&ResponseContext) -> anyhow::Result<OutputBundle> + Send + Sync + 'static,
    {
        Self::from_responder(Arc::new(FnResponder(f)))
    }

    /// Dynamic response from an async closure. The closure receives the
    /// context by value so the returned future owns everything it needs.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(ResponseContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<OutputBundle>> + Send + 'static,
    {
        let boxed: BoxedAsyncFn = Box::new(move |ctx| Box::pin(f(ctx)));
        Self::from_responder(Arc::new(AsyncFnResponder(boxed)))
    }

    /// Dynamic response from a responder instance.
    pub fn from_responder(responder: Arc<dyn Responder>) -> Self {
        Self {
            responder: Some(responder),
            writes: Vec::new(),
        }
    }

    /// Write `value` into output property `name`. Names are validated when
    /// the core is built.
    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.writes.push((name.into(), value.into()));
        self
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    use crate::event::InboundEvent;

    fn context() -> ResponseContext {
        let mut properties = PropertyRegistry::new();
        properties
            .register_input("test", "text", |e| e.payload()["text"].clone())
            .unwrap();
        properties.register_output("test", "text").unwrap();
        let registry = Arc::new(properties);
        let input = Arc::new(registry.snapshot(&InboundEvent::new("test", json!({ "text": "hi" }))));
        ResponseContext::new(input, registry)
    }

    #[tokio::test]
    async fn sync_responder_sees_the_input() {
        let response = Response::from_fn(|ctx| {
            let mut out = ctx.output();
            out.set("text", format!("echo: {}", ctx.input().str("text").unwrap_or("")))?;
            Ok(out.finish())
        });

        let responder = response.responder.unwrap();
        let bundle = responder.respond(&context()).await.unwrap();
        assert_eq!(bundle.str("text"), Some("echo: hi"));
    }

    #[tokio::test]
    async fn async_responder_owns_its_context() {
        let response = Response::from_async(|ctx| async move {
            tokio::task::yield_now().await;
            let mut out = ctx.output();
            out.set("text", "later")?;
            Ok(out.finish())
        });

        let responder = response.responder.unwrap();
        let bundle = responder.respond(&context()).await.unwrap();
        assert_eq!(bundle.str("text"), Some("later"));
    }

    #[test]
    fn static_writes_accumulate_in_order() {
        let response = Response::new().set("text", "a").set("text", "b");
        assert!(response.responder.is_none());
        assert_eq!(response.writes.len(), 2);
        assert_eq!(response.writes[1].1, json!("b"));
    }
}
