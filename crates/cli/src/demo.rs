//! The bundled demo route tree.
//!
//! A small helpdesk bot: `/help` with two topics and a fallback listing
//! them, `/weather <place>` answered by a dynamic responder, and `/oops`
//! for watching the error path do its job.

use std::{sync::Arc, time::Duration};

use {
    weir_core::{BufferSink, ConfigError, Core, CoreBuilder, Response, Route},
    weir_packs::{flow, text},
};

use crate::{config::WeirConfig, shell};

const HELP_TOPICS: &str = "I can't help you with this information.
Available help topics (write after /help command):

working hours
office 1 address";

pub fn build_core(
    interface: Arc<shell::ShellInterface>,
    config: &WeirConfig,
) -> Result<Core, ConfigError> {
    demo_builder(interface, config).build()
}

/// Like [`build_core`], with a buffer sink attached for reading router
/// events back out.
pub fn build_core_with_sink(
    interface: Arc<shell::ShellInterface>,
    config: &WeirConfig,
    sink: &BufferSink,
) -> Result<Core, ConfigError> {
    demo_builder(interface, config).buffer_sink(sink).build()
}

fn demo_builder(interface: Arc<shell::ShellInterface>, config: &WeirConfig) -> CoreBuilder {
    Core::builder()
        .pack(flow::flow_pack())
        .pack(text::text_pack())
        .interface(interface)
        .route(
            Route::on(shell::command("help"))
                .child(
                    Route::on(text::equals("working hours"))
                        .respond(
                            Response::new()
                                .set("text", "Working hours for our company: 10.00 AM - 7.00 PM"),
                        )
                        .respond(
                            Response::new()
                                .set("text", "Remember to be in time for work!")
                                .set("attachment", "./sample_file.zip"),
                        )
                        .respond_deferred(Response::from_async(|ctx| async move {
                            tokio::time::sleep(Duration::from_secs(5)).await;
                            let mut out = ctx.output();
                            out.set(
                                "text",
                                "Also this not so useful message is sent after 5 seconds of wait",
                            )?;
                            Ok(out.finish())
                        })),
                )
                .child(Route::on(text::equals("office 1 address")).respond(
                    Response::new().set("text", "Office 1 address is: Budapest, Andrássy út"),
                ))
                .child(Route::on(flow::any()).respond(Response::new().set("text", HELP_TOPICS))),
        )
        .route(
            Route::on(shell::command("weather")).respond(Response::from_fn(|ctx| {
                let place = ctx.input().str("text").unwrap_or("").trim().to_string();
                let mut out = ctx.output();
                if place.is_empty() {
                    out.set("text", "I can't fetch weather without a place name!")?;
                } else {
                    out.set("text", format!("Parsed weather for: {place}"))?;
                }
                Ok(out.finish())
            })),
        )
        .route(
            Route::on(shell::command("oops")).respond(Response::from_fn(|_| {
                Err(anyhow::anyhow!("the /oops command always fails"))
            })),
        )
        .default_response(Response::new().set("text", config.responses.default.clone()))
        .error_response(Response::new().set("text", config.responses.error.clone()))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        serde_json::json,
        weir_core::{InboundEvent, LogEventKind},
    };

    fn demo() -> Core {
        build_core(shell::ShellInterface::new(), &WeirConfig::default()).unwrap()
    }

    fn message(text: &str) -> InboundEvent {
        InboundEvent::new(shell::SHELL, json!({ "text": text }))
    }

    #[tokio::test]
    async fn help_topic_routes_to_its_subroute() {
        let core = demo();

        let handled = core.handle(message("/help working hours")).await;
        assert!(handled.matched);
        // Two immediate messages plus the late reminder.
        assert_eq!(handled.delivered().len(), 2);
        assert_eq!(handled.detached(), 1);

        let handled = core.handle(message("/help office 1 address")).await;
        assert_eq!(handled.delivered().len(), 1);
        assert!(
            handled.delivered()[0]
                .str("text")
                .unwrap()
                .contains("Budapest")
        );
    }

    #[tokio::test]
    async fn unknown_help_topic_lists_the_available_ones() {
        let core = demo();
        let handled = core.handle(message("/help quantum chromodynamics")).await;
        assert!(handled.matched);
        assert!(
            handled.delivered()[0]
                .str("text")
                .unwrap()
                .contains("Available help topics")
        );
    }

    #[tokio::test]
    async fn weather_answers_dynamically() {
        let core = demo();

        let handled = core.handle(message("/weather Vienna")).await;
        assert_eq!(
            handled.delivered()[0].str("text"),
            Some("Parsed weather for: Vienna")
        );

        let handled = core.handle(message("/weather")).await;
        assert!(handled.delivered()[0].str("text").unwrap().contains("place name"));
    }

    #[tokio::test]
    async fn unroutable_message_gets_the_default_response() {
        let core = demo();
        let handled = core.handle(message("what do you know")).await;
        assert!(!handled.matched);
        assert_eq!(
            handled.delivered()[0].str("text"),
            Some(WeirConfig::default().responses.default.as_str())
        );
    }

    #[tokio::test]
    async fn oops_triggers_the_error_response() {
        let sink = BufferSink::default();
        let core = build_core_with_sink(
            shell::ShellInterface::new(),
            &WeirConfig::default(),
            &sink,
        )
        .unwrap();

        let handled = core.handle(message("/oops")).await;
        assert!(handled.matched);
        assert!(
            handled.delivered()[0]
                .str("text")
                .unwrap()
                .contains("error occurred")
        );
        assert_eq!(sink.count(LogEventKind::DispatchError), 1);
    }
}
