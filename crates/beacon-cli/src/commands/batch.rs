//! Batch jobs run by a scheduler or by hand, one company at a time.

use anyhow::Context;
use tracing::info;

use beacon_core::responses::{BulkRunResponse, DiscoveryResponse};
use beacon_db::BeaconService;

async fn company_scope(service: &BeaconService, company_id: &str) -> anyhow::Result<BeaconService> {
    let company = service
        .get_company(company_id)
        .await
        .with_context(|| format!("unknown company {company_id}"))?;
    Ok(service.for_company(company.id))
}

pub async fn discover_themes(service: &BeaconService, company_id: &str) -> anyhow::Result<DiscoveryResponse> {
    let response = company_scope(service, company_id).await?.discover_themes().await?;
    info!(
        company_id,
        created = response.themes_created.len(),
        "theme discovery finished"
    );
    Ok(response)
}

pub async fn score_themes(service: &BeaconService, company_id: &str) -> anyhow::Result<BulkRunResponse> {
    let summary = company_scope(service, company_id)
        .await?
        .score_all_themes()
        .await
        .context("scoring failed")?;
    info!(company_id, processed = summary.processed, failed = summary.failed, "themes scored");
    Ok(summary)
}

pub async fn recompute_health(service: &BeaconService, company_id: &str) -> anyhow::Result<BulkRunResponse> {
    let summary = company_scope(service, company_id).await?.recompute_all_health().await?;
    info!(company_id, processed = summary.processed, failed = summary.failed, "health recomputed");
    Ok(summary)
}
