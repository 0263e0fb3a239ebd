//! Stdin/stdout demo interface.
//!
//! Plays the role a real platform adapter would: it owns the transport
//! (reading lines), normalizes each line into an event payload of the shape
//! `{ "text": "<line>" }`, and prints every delivered bundle. It registers
//! the slash-command style inputs the demo routes match on:
//!
//! - `query` — the full trimmed line, e.g. `/weather Vienna`
//! - `command` — the leading command without its slash (`weather`), empty
//!   for plain messages
//! - `text` — everything after the command (`Vienna`), or the whole line
//!   for plain messages

use std::sync::Arc;

use {
    async_trait::async_trait,
    serde_json::Value,
    tokio::io::{AsyncBufReadExt, BufReader},
    tracing::debug,
};

use weir_core::{
    Condition, ConditionPack, ConfigError, Core, DeliveryError, InboundEvent, Interface,
    OutputBundle, Registrar,
};

/// Interface id, and the id of its condition pack.
pub const SHELL: &str = "shell";

/// `shell/command` — the line's leading command equals `name`, with or
/// without trailing text.
pub fn command(name: impl Into<String>) -> Condition {
    Condition::new(SHELL, "command").arg(name.into())
}

#[derive(Default)]
pub struct ShellInterface;

impl ShellInterface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

#[async_trait]
impl Interface for ShellInterface {
    fn id(&self) -> &str {
        SHELL
    }

    fn name(&self) -> &str {
        "Shell"
    }

    fn describe(&self, registrar: &mut Registrar<'_>) -> Result<(), ConfigError> {
        registrar.input("query", |event| Value::String(line(event).to_string()))?;
        registrar.input("command", |event| {
            Value::String(split_command(line(event)).0.to_string())
        })?;
        registrar.input("text", |event| {
            Value::String(split_command(line(event)).1.to_string())
        })?;
        registrar.output("text")?;
        registrar.output("attachment")?;
        registrar.pack(ConditionPack::new(SHELL).kind("command", |input, args| {
            input.str("command") == args.as_str()
        }))
    }

    async fn deliver(&self, bundle: &OutputBundle) -> Result<(), DeliveryError> {
        let mut wrote = false;
        if let Some(text) = bundle.str("text") {
            println!("{text}");
            wrote = true;
        }
        if let Some(path) = bundle.str("attachment") {
            println!("[attachment] {path}");
            wrote = true;
        }
        if !wrote {
            return Err(DeliveryError::new(
                SHELL,
                "bundle has neither text nor attachment",
            ));
        }
        debug!(fields = bundle.len(), "delivered to stdout");
        Ok(())
    }
}

fn line(event: &InboundEvent) -> &str {
    event
        .payload()
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// Split `/weather Vienna` into `("weather", "Vienna")`. Plain messages
/// have an empty command and keep the whole line as text.
fn split_command(line: &str) -> (&str, &str) {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return ("", trimmed);
    };
    match rest.split_once(char::is_whitespace) {
        Some((command, text)) => (command, text.trim_start()),
        None => (rest, ""),
    }
}

/// Read lines from stdin and route each one. EOF or `/quit` ends the loop;
/// deferred responses may still print afterwards.
pub async fn chat_loop(core: Arc<Core>) -> anyhow::Result<()> {
    println!("weir demo bot — try /help, /quit exits");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "/quit" {
            break;
        }
        core.handle(InboundEvent::new(SHELL, serde_json::json!({ "text": trimmed })))
            .await;
    }
    Ok(())
}
