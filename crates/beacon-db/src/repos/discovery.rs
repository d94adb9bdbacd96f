//! Theme discovery over stored feedback.

use tracing::{debug, info};

use beacon_core::responses::DiscoveryResponse;
use beacon_scoring::DiscoveryItem;

use crate::error::DatabaseError;
use crate::service::BeaconService;

impl BeaconService {
    /// Group analysed, unassigned feedback into new themes.
    ///
    /// Each candidate becomes a theme in status `new` and its member
    /// feedback items are assigned to it.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if reading feedback or writing themes fails.
    pub async fn discover_themes(&self) -> Result<DiscoveryResponse, DatabaseError> {
        let items: Vec<DiscoveryItem> = self
            .unassigned_analyzed_feedback()
            .await?
            .into_iter()
            .map(|f| DiscoveryItem {
                id: f.id,
                customer_id: f.customer_id,
                tags: f.tags,
                sentiment: f.sentiment_score,
            })
            .collect();

        let candidates = beacon_scoring::discover_themes(&items, &self.settings().scoring.discovery);
        let mut themes_created = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let theme = self.create_theme_from_candidate(candidate).await?;
            let assigned = self
                .assign_feedback_to_theme(&candidate.item_ids, &theme.id)
                .await?;
            if assigned == 0 {
                // A concurrent run claimed every item first.
                debug!(theme_id = %theme.id, "discarding theme with no unclaimed feedback");
                self.delete_theme(&theme.id).await?;
                continue;
            }
            themes_created.push(theme);
        }

        info!(
            company_id = self.company_id()?,
            items = items.len(),
            themes = themes_created.len(),
            "theme discovery stored"
        );
        Ok(DiscoveryResponse {
            items_considered: u32::try_from(items.len()).unwrap_or(u32::MAX),
            themes_created,
        })
    }
}
