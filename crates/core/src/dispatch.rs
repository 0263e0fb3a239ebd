//! Action-sequence execution: immediate delivery and deferred tasks.

use std::sync::Arc;

use {tokio::task::JoinHandle, tracing::debug};

use crate::{
    error::DispatchError,
    input::Input,
    interface::Interface,
    log::{LogEvent, LogEventKind, LogFanout, Severity},
    output::OutputBundle,
    property::PropertyRegistry,
    response::{ResponseContext, ResponseMode},
    router::CompiledResponse,
};

/// Result of handling one inbound event.
#[derive(Debug)]
pub struct Handled {
    /// Whether a route node matched, even one with an empty action list.
    /// `false` means the default response list ran (or would have, were it
    /// not empty) — or that nothing ran at all because the event named an
    /// unregistered interface and was dropped.
    pub matched: bool,
    /// One entry per executed action, in declared order.
    pub outcomes: Vec<Outcome>,
}

impl Handled {
    /// Bundles delivered synchronously, in delivery order.
    pub fn delivered(&self) -> Vec<&OutputBundle> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                Outcome::Delivered(bundle) => Some(bundle),
                Outcome::Detached(_) => None,
            })
            .collect()
    }

    /// Number of deferred actions detached onto their own tasks.
    pub fn detached(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, Outcome::Detached(_)))
            .count()
    }

    /// Consume, keeping only the deferred-task handles.
    pub fn into_deferred(self) -> Vec<Deferred> {
        self.outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                Outcome::Detached(deferred) => Some(deferred),
                Outcome::Delivered(_) => None,
            })
            .collect()
    }
}

/// Outcome of one action slot.
#[derive(Debug)]
pub enum Outcome {
    /// Immediate action: the rendered bundle, already delivered.
    Delivered(OutputBundle),
    /// Deferred action: running detached on its own task.
    Detached(Deferred),
}

/// Handle on one detached deferred action.
///
/// Dropping it does not cancel the task; deferred work always runs to
/// completion (success, or a logged failure).
#[derive(Debug)]
pub struct Deferred {
    task: JoinHandle<()>,
}

impl Deferred {
    /// Wait for the action to finish.
    pub async fn wait(self) {
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Everything one dispatch (and its deferred offspring) needs.
#[derive(Clone)]
pub(crate) struct DispatchContext {
    pub(crate) input: Arc<Input>,
    pub(crate) interface: Arc<dyn Interface>,
    pub(crate) registry: Arc<PropertyRegistry>,
    pub(crate) log: LogFanout,
}

impl DispatchContext {
    fn response_context(&self) -> ResponseContext {
        ResponseContext::new(Arc::clone(&self.input), Arc::clone(&self.registry))
    }
}

/// Run `actions` in declared order, appending an outcome per action.
///
/// Immediate actions render and deliver inline; the first failure is
/// returned and the remaining actions do not run. Already-delivered bundles
/// stay delivered and stay in `outcomes`. Deferred actions are detached at
/// their declared position and never produce a failure here.
pub(crate) async fn run_sequence(
    ctx: &DispatchContext,
    actions: &[CompiledResponse],
    outcomes: &mut Vec<Outcome>,
) -> Result<(), DispatchError> {
    for action in actions {
        match action.mode {
            ResponseMode::Immediate => {
                let bundle = render(ctx, action)
                    .await
                    .map_err(|source| DispatchError::Action { source })?;
                ctx.interface.deliver(&bundle).await?;
                debug!(
                    interface = %ctx.input.interface(),
                    event_id = %ctx.input.event_id(),
                    fields = bundle.len(),
                    "bundle delivered"
                );
                outcomes.push(Outcome::Delivered(bundle));
            },
            ResponseMode::Deferred => {
                outcomes.push(Outcome::Detached(spawn_deferred(
                    ctx.clone(),
                    action.clone(),
                )));
            },
        }
    }
    Ok(())
}

async fn render(ctx: &DispatchContext, action: &CompiledResponse) -> anyhow::Result<OutputBundle> {
    match &action.responder {
        Some(responder) => {
            let response_ctx = ctx.response_context();
            let mut bundle = responder.respond(&response_ctx).await?;
            bundle.merge(&action.overlay);
            Ok(bundle)
        },
        None => Ok(action.overlay.clone()),
    }
}

/// Detach one deferred action. Render and delivery failures are terminal
/// for the action: logged, never escalated to the error response list.
fn spawn_deferred(ctx: DispatchContext, action: CompiledResponse) -> Deferred {
    let task = tokio::spawn(async move {
        let result = async {
            let bundle = render(&ctx, &action)
                .await
                .map_err(|source| DispatchError::Action { source })?;
            ctx.interface.deliver(&bundle).await?;
            Ok::<_, DispatchError>(())
        }
        .await;

        match result {
            Ok(()) => debug!(
                interface = %ctx.input.interface(),
                event_id = %ctx.input.event_id(),
                "deferred action finished"
            ),
            Err(error) => ctx.log.emit(LogEvent::new(
                LogEventKind::DeferredActionFailure,
                Severity::Error,
                ctx.input.interface(),
                ctx.input.event_id(),
                format!("deferred action failed: {error}"),
            )),
        }
    });
    Deferred { task }
}
