use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use beacon_analysis::AnalysisClient;
use beacon_auth::TokenVerifier;
use beacon_config::BeaconConfig;
use beacon_db::BeaconService;
use beacon_server::{AppState, create_app, serve};

pub async fn handle(config: &BeaconConfig, service: BeaconService, bind: Option<&str>) -> anyhow::Result<()> {
    let auth = config.require_auth()?;
    let verifier = TokenVerifier::from_config(auth).context("failed to build token verifier")?;

    let mut state = AppState::new(service, verifier);
    if config.analysis.is_configured() {
        let client = AnalysisClient::from_config(&config.analysis).context("failed to build analysis client")?;
        state = state.with_analyzer(Arc::new(client));
    } else {
        warn!("analysis endpoint not configured; analyze and test-ai routes will return 503");
    }
    if config.server.is_permissive_cors() {
        warn!("no allowed_origins configured; CORS accepts any origin");
    }

    let addr = match bind {
        Some(addr) => addr.parse().with_context(|| format!("invalid --bind address: {addr}"))?,
        None => config.server.socket_addr()?,
    };
    info!(%addr, db = %config.database.path, "starting beacon server");
    serve(create_app(state, &config.server), addr).await?;
    Ok(())
}
