//! Application state initialization
//!
//! Turns a [`ServerConfig`] into the [`AppState`] shared by every handler:
//! the project store, token verifier, generators and session store.

use crate::api::rest::AppState;
use crate::auth::JwtVerifier;
use crate::config::{LlmSettings, ServerConfig};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use universe_llm::{
    classify, BotGenerator, BotGeneratorConfig, FlowGenerator, GeneratorConfig, LLMClient,
    ModelChain, ProviderRouter, QuestionGenerator, RetryPolicy,
};
use universe_repository::{InMemorySessionStore, ProjectService, SessionStore};

/// Secret used when none is configured and dev mode is on
const DEV_JWT_SECRET: &str = "universe-dev-secret";

/// Build the application state from configuration
pub async fn init_state(config: &ServerConfig) -> Result<AppState> {
    let store = config.store_config().open().await?;
    let projects = ProjectService::new(store).with_classifier(classify);

    let secret = match config.jwt_secret.as_deref() {
        Some(secret) => secret,
        None if config.dev_mode => {
            warn!("jwt_secret not set, using the development secret");
            DEV_JWT_SECRET
        }
        None => anyhow::bail!("jwt_secret (or JWT_SECRET) must be configured"),
    };
    let verifier = Arc::new(JwtVerifier::new(secret));

    let llm = &config.llm;
    let router = ProviderRouter::from_keys(
        llm.gemini_api_key.as_deref(),
        llm.openrouter_api_key.as_deref(),
        llm.timeout(),
    );
    let generator_config = select_generator_config(llm, router.as_ref());
    let client: Option<Arc<dyn LLMClient>> =
        router.map(|router| Arc::new(router) as Arc<dyn LLMClient>);

    if client.is_some() {
        info!(
            generator_model = %generator_config.model,
            primary = ?llm.primary_models,
            fallback = ?llm.fallback_models,
            "LLM providers configured"
        );
    } else {
        warn!("No LLM provider key configured; questions and flows use templates, bot generation is disabled");
    }

    let chain = client.clone().map(|client| {
        ModelChain::new(
            client,
            llm.primary_models.clone(),
            llm.fallback_models.clone(),
        )
        .with_policy(RetryPolicy::new(llm.max_attempts, llm.retry_backoff()))
    });

    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(config.sessions.ttl()));

    Ok(AppState::new(projects, verifier)
        .with_sessions(sessions)
        .with_question_generator(QuestionGenerator::from_optional(
            client.clone(),
            generator_config.clone(),
        ))
        .with_flow_generator(FlowGenerator::from_optional(client, generator_config))
        .with_bot_generator(BotGenerator::new(chain, BotGeneratorConfig::default()))
        .with_dev_mode(config.dev_mode))
}

/// Generator settings on the first configured model the router can reach
fn select_generator_config(llm: &LlmSettings, router: Option<&ProviderRouter>) -> GeneratorConfig {
    let Some(router) = router else {
        return GeneratorConfig::default();
    };
    match llm.default_model(|model| router.serves(model)) {
        Some(model) => GeneratorConfig::new(model),
        None => {
            warn!("no configured model is served by the available providers");
            GeneratorConfig::default()
        }
    }
}

/// Periodically drop expired generation sessions
pub fn spawn_session_eviction(sessions: Arc<dyn SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let evicted = sessions.evict_expired();
            debug!(evicted, remaining = sessions.len(), "session sweep");
        }
    })
}
