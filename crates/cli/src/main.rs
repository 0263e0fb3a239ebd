//! Command-line entry point for the weir demo bot.

mod config;
mod demo;
mod shell;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    tokio_util::sync::CancellationToken,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    weir_core::BufferSink,
    weir_webhook::WebhookState,
};

use crate::config::WeirConfig;

#[derive(Parser)]
#[command(name = "weir", version, about = "Condition-tree message router demo bot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Path to a weir.toml (default: ./weir.toml when present).
    #[arg(long, global = true, env = "WEIR_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address for the webhook listener (overrides config).
    #[arg(long, global = true)]
    bind: Option<String>,

    /// Port for the webhook listener (overrides config).
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the demo bot on stdin/stdout (the default).
    Chat,
    /// Feed the demo bot through the webhook listener.
    Serve,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "weir starting");

    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        None | Some(Commands::Chat) => chat(config).await,
        Some(Commands::Serve) => serve(&cli, config).await,
    }
}

async fn chat(config: WeirConfig) -> anyhow::Result<()> {
    // Capture router events so the session can report what it swallowed.
    let sink = BufferSink::default();
    let interface = shell::ShellInterface::new();
    let core = Arc::new(demo::build_core_with_sink(interface, &config, &sink)?);

    shell::chat_loop(core).await?;

    let events = sink.events();
    if !events.is_empty() {
        info!(
            captured = events.len(),
            "router reported conditions this session"
        );
    }
    Ok(())
}

async fn serve(cli: &Cli, config: WeirConfig) -> anyhow::Result<()> {
    let bind = cli.bind.clone().unwrap_or(config.server.bind.clone());
    let port = cli.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid listen address {bind}:{port}: {e}"))?;

    let interface = shell::ShellInterface::new();
    let core = Arc::new(demo::build_core(interface, &config)?);

    let mut state = WebhookState::new(core, shell::SHELL);
    if let Some(token) = config.webhook.token {
        state = state.with_token(token);
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown requested");
                cancel.cancel();
            }
        });
    }

    weir_webhook::serve(addr, state, cancel).await
}
