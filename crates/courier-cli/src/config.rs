//! Environment configuration and pipeline wiring.
//!
//! All credentials and endpoints come from env-style keys (a `.env` file is
//! honored).  Missing adapter credentials never fail startup — the affected
//! adapter degrades to per-call authorization errors instead.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use courier_dispatch::{
    CalendarWebhookAdapter, Dispatcher, EmailWebhookAdapter, Pipeline, ProxyAdapter, SlackAdapter,
    TelegramAdapter,
};
use courier_intent::{IntentResolver, KeywordResolver, ModelResolver};
use courier_llm::{LlmClient, LlmClientConfig};

/// Env prefix for per-app proxy endpoints (`PROXY_ENDPOINT_JIRA=...`).
const PROXY_ENDPOINT_PREFIX: &str = "PROXY_ENDPOINT_";

/// Default model ids per provider.
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Which resolver strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverChoice {
    /// LLM-backed function calling.
    Model,
    /// Local keyword routing.
    Keyword,
}

/// Everything courier reads from the environment.
#[derive(Debug, Clone)]
pub struct CourierConfig {
    pub resolver: ResolverChoice,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub model: Option<String>,
    pub slack_bot_token: Option<String>,
    pub default_slack_channel: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_default_chat_id: Option<String>,
    pub email_webhook_url: Option<String>,
    pub calendar_webhook_url: Option<String>,
    pub webhook_api_key: Option<String>,
    pub proxy_endpoints: HashMap<String, String>,
    pub bind_addr: String,
    pub port: u16,
}

impl CourierConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        let anthropic_api_key = env_opt("ANTHROPIC_API_KEY");
        let openai_api_key = env_opt("OPENAI_API_KEY");
        let has_model_key = anthropic_api_key.is_some() || openai_api_key.is_some();

        Self {
            resolver: resolver_choice(env_opt("COURIER_RESOLVER").as_deref(), has_model_key),
            anthropic_api_key,
            openai_api_key,
            model: env_opt("COURIER_MODEL"),
            slack_bot_token: env_opt("SLACK_BOT_TOKEN"),
            default_slack_channel: env_opt("DEFAULT_SLACK_CHANNEL"),
            telegram_bot_token: env_opt("TELEGRAM_BOT_TOKEN"),
            telegram_default_chat_id: env_opt("TELEGRAM_DEFAULT_CHAT_ID"),
            email_webhook_url: env_opt("EMAIL_WEBHOOK_URL"),
            calendar_webhook_url: env_opt("CALENDAR_WEBHOOK_URL"),
            webhook_api_key: env_opt("WEBHOOK_API_KEY"),
            proxy_endpoints: proxy_endpoints_from_env(),
            bind_addr: env_opt("COURIER_BIND_ADDR").unwrap_or_else(|| "127.0.0.1".into()),
            port: env_opt("COURIER_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
        }
    }
}

/// Decide the resolver strategy from the config key and key availability.
fn resolver_choice(configured: Option<&str>, has_model_key: bool) -> ResolverChoice {
    match configured {
        Some("keyword") => ResolverChoice::Keyword,
        Some("model") => ResolverChoice::Model,
        Some(other) => {
            warn!(value = other, "unknown COURIER_RESOLVER value, using keyword routing");
            ResolverChoice::Keyword
        }
        None if has_model_key => ResolverChoice::Model,
        None => ResolverChoice::Keyword,
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Collect `PROXY_ENDPOINT_<APP>` keys into an app → endpoint table.
fn proxy_endpoints_from_env() -> HashMap<String, String> {
    std::env::vars()
        .filter_map(|(key, value)| {
            key.strip_prefix(PROXY_ENDPOINT_PREFIX)
                .map(|app| (app.to_lowercase(), value))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Build the resolver selected by configuration.
///
/// Falls back to keyword routing when the model strategy is selected but no
/// usable API key exists — startup never crashes over a missing credential.
pub fn build_resolver(config: &CourierConfig) -> Arc<dyn IntentResolver> {
    if config.resolver == ResolverChoice::Model {
        let llm_config = if let Some(key) = &config.anthropic_api_key {
            Some(LlmClientConfig::anthropic(
                key,
                config.model.as_deref().unwrap_or(DEFAULT_ANTHROPIC_MODEL),
            ))
        } else {
            config.openai_api_key.as_ref().map(|key| {
                LlmClientConfig::openai(
                    key,
                    config.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL),
                )
            })
        };

        if let Some(llm_config) = llm_config {
            let model = llm_config.default_model.clone();
            match LlmClient::new(llm_config) {
                Ok(client) => {
                    info!(model = %model, "model-backed resolver ready");
                    return Arc::new(ModelResolver::new(Arc::new(client), model));
                }
                Err(e) => {
                    warn!(error = %e, "LLM client construction failed, using keyword routing");
                }
            }
        } else {
            warn!("model resolver selected but no API key set, using keyword routing");
        }
    }

    info!("keyword resolver ready");
    Arc::new(KeywordResolver::new())
}

/// Build the dispatcher over all configured adapters.
pub fn build_dispatcher(config: &CourierConfig) -> Dispatcher {
    let email = match &config.email_webhook_url {
        Some(url) => EmailWebhookAdapter::with_config(url, config.webhook_api_key.clone()),
        None => EmailWebhookAdapter::new(),
    };

    let chat = match &config.slack_bot_token {
        Some(token) => SlackAdapter::with_token(token, config.default_slack_channel.clone()),
        None => SlackAdapter::new(),
    };

    let direct = match &config.telegram_bot_token {
        Some(token) => TelegramAdapter::with_token(token, config.telegram_default_chat_id.clone()),
        None => TelegramAdapter::new(),
    };

    let calendar = match &config.calendar_webhook_url {
        Some(url) => CalendarWebhookAdapter::with_config(url, config.webhook_api_key.clone()),
        None => CalendarWebhookAdapter::new(),
    };

    let proxy =
        ProxyAdapter::with_endpoints(config.proxy_endpoints.clone(), config.webhook_api_key.clone());

    Dispatcher::new(
        Arc::new(email),
        Arc::new(chat),
        Arc::new(direct),
        Arc::new(calendar),
        Arc::new(proxy),
    )
}

/// Build the full pipeline from configuration.
pub fn build_pipeline(config: &CourierConfig) -> Arc<Pipeline> {
    let resolver = build_resolver(config);
    let dispatcher = Arc::new(build_dispatcher(config));
    Arc::new(Pipeline::new(resolver, dispatcher))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
