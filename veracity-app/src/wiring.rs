use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use veracity_actors::{ChatSessions, FactChecker};
use veracity_config::VeracityConfig;
use veracity_llm::{ensure_llm_ready, verdict::GenerationOpts};
use veracity_server::AppState;
use veracity_web::{build_evidence_source, WebExtractor};

/// Build the model, search and extraction clients named in `config`.
pub async fn build_checker(config: &VeracityConfig) -> Result<FactChecker> {
    let llm = ensure_llm_ready(&config.llm)
        .await
        .context("failed to set up the LLM client")?;
    let evidence =
        build_evidence_source(&config.search).context("failed to set up the search client")?;
    let extractor =
        WebExtractor::new(&config.extractor).context("failed to set up the content extractor")?;

    tracing::info!(
        model = llm.model_name(),
        search = evidence.name(),
        "wiring.checker.ready"
    );

    Ok(
        FactChecker::new(llm, evidence, Arc::new(extractor), config.agent.clone())
            .with_max_results(config.search.max_results())
            .with_generation(generation_opts(config)),
    )
}

fn generation_opts(config: &VeracityConfig) -> GenerationOpts {
    GenerationOpts {
        max_tokens: config.llm.max_tokens(),
        temperature: config.llm.temperature(),
    }
}

pub fn app_state(
    checker: FactChecker,
    config: &VeracityConfig,
    shutdown: &CancellationToken,
) -> AppState {
    let sessions = ChatSessions::new(
        Arc::new(checker),
        config.server.session_mailbox,
        shutdown.child_token(),
    )
    .with_idle_timeout(config.server.session_idle());
    AppState::new(sessions)
}

pub fn listen_addr(config: &VeracityConfig) -> Result<SocketAddr> {
    let address = config.server.address();
    address
        .parse()
        .with_context(|| format!("invalid listen address {address}"))
}

/// Cancel `token` on the first Ctrl-C.
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown.requested");
        }
        token.cancel();
    });
}
