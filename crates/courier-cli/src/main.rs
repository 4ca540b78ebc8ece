//! CLI entry point for courier.
//!
//! This binary provides the `courier` command with subcommands for starting
//! the HTTP server, routing a single request from the command line, and
//! checking which integrations are configured.

mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use courier_dispatch::{ActionRequest, PipelineReply};
use courier_web::{WebConfig, WebServer};

use crate::config::CourierConfig;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// courier — natural-language request router.
#[derive(Parser)]
#[command(
    name = "courier",
    version,
    about = "courier — natural-language request router",
    long_about = "Accepts free-form text describing an intent, classifies it into one of a \
                  fixed set of actions, and dispatches the call to the matching \
                  messaging or calendar integration."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    Serve,

    /// Route a single request from the command line.
    Ask {
        /// The request text.
        message: String,

        /// Produce a side-effect-free preview instead of dispatching.
        #[arg(long)]
        preview: bool,

        /// Restrict dispatch to these action names.
        #[arg(long, value_delimiter = ',')]
        channels: Option<Vec<String>>,
    },

    /// Show which integrations are configured.
    Status,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => cmd_serve().await,
        Commands::Ask {
            message,
            preview,
            channels,
        } => cmd_ask(message, preview, channels).await,
        Commands::Status => cmd_status(),
    }
}

// ---------------------------------------------------------------------------
// Subcommand: serve
// ---------------------------------------------------------------------------

async fn cmd_serve() -> Result<()> {
    init_tracing("info");

    let config = CourierConfig::from_env();
    let pipeline = config::build_pipeline(&config);

    info!(resolver = ?config.resolver, "starting courier");

    let web_config = WebConfig {
        bind_addr: config.bind_addr.clone(),
        port: config.port,
    };
    let server = WebServer::new(web_config, pipeline);

    server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))
}

// ---------------------------------------------------------------------------
// Subcommand: ask
// ---------------------------------------------------------------------------

async fn cmd_ask(message: String, preview: bool, channels: Option<Vec<String>>) -> Result<()> {
    init_tracing("warn");

    let config = CourierConfig::from_env();
    let pipeline = config::build_pipeline(&config);

    let request = ActionRequest {
        text: message,
        explicit_channels: channels,
        callback_url: None,
    };

    let reply = pipeline.handle(&request, preview).await;
    let output = match reply {
        PipelineReply::Outcomes(outcomes) => json!({"results": outcomes}),
        PipelineReply::NoAction { message } | PipelineReply::Invalid { message } => {
            json!({"error": message})
        }
        PipelineReply::ResolverError { message } => json!({"error": message}),
        PipelineReply::ChannelMismatch { resolved, requested } => json!({
            "error": "resolved actions are not among the requested channels",
            "resolved": resolved,
            "requested": requested,
        }),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: status
// ---------------------------------------------------------------------------

fn cmd_status() -> Result<()> {
    init_tracing("warn");

    let config = CourierConfig::from_env();

    println!();
    println!("  courier status");
    println!("  ==============");
    println!();
    println!("  Resolver:          {:?}", config.resolver);
    println!("  Anthropic API:     {}", configured(config.anthropic_api_key.is_some()));
    println!("  OpenAI API:        {}", configured(config.openai_api_key.is_some()));
    println!("  Slack bot:         {}", configured(config.slack_bot_token.is_some()));
    println!("  Telegram bot:      {}", configured(config.telegram_bot_token.is_some()));
    println!("  Email gateway:     {}", configured(config.email_webhook_url.is_some()));
    println!("  Calendar gateway:  {}", configured(config.calendar_webhook_url.is_some()));
    println!("  Proxy apps:        {}", config.proxy_endpoints.len());
    println!("  Bind address:      {}:{}", config.bind_addr, config.port);
    println!();

    Ok(())
}

fn configured(set: bool) -> &'static str {
    if set { "CONFIGURED" } else { "NOT SET" }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
