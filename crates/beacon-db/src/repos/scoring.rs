//! Strategic alignment scoring of stored themes.

use tracing::{info, warn};

use beacon_core::entities::{ProductStrategy, Theme};
use beacon_core::responses::BulkRunResponse;
use beacon_scoring::{StrategyProfile, ThemeSignal, require_active_strategy, score_alignment};

use crate::error::DatabaseError;
use crate::service::BeaconService;

impl BeaconService {
    /// Score one theme against the active strategy and persist the result.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Scoring` when no strategy is active, or
    /// `DatabaseError::NotFound` for an unknown theme.
    pub async fn score_theme(&self, theme_id: &str) -> Result<Theme, DatabaseError> {
        let strategy = require_active_strategy(self.current_strategy().await?)?;
        let theme = self.get_theme(theme_id).await?;
        self.score_with(&theme, &strategy).await
    }

    /// Score every theme in the scoped company against the active strategy.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Scoring` when no strategy is active. Failures
    /// on individual themes are logged and counted.
    pub async fn score_all_themes(&self) -> Result<BulkRunResponse, DatabaseError> {
        let strategy = require_active_strategy(self.current_strategy().await?)?;
        let mut summary = BulkRunResponse {
            processed: 0,
            failed: 0,
        };
        for theme in self.all_themes().await? {
            match self.score_with(&theme, &strategy).await {
                Ok(_) => summary.processed += 1,
                Err(e) => {
                    warn!(theme_id = %theme.id, error = %e, "theme scoring failed");
                    summary.failed += 1;
                }
            }
        }
        info!(
            strategy_version = strategy.version,
            processed = summary.processed,
            failed = summary.failed,
            "scored themes"
        );
        Ok(summary)
    }

    async fn score_with(&self, theme: &Theme, strategy: &ProductStrategy) -> Result<Theme, DatabaseError> {
        let params = &self.settings().scoring;
        let outcome = score_alignment(
            &ThemeSignal::from(theme),
            &StrategyProfile::from(strategy),
            &params.alignment,
            &params.recommendation,
        );
        self.record_theme_score(&theme.id, &outcome, strategy.version)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::strategy::NewStrategy;
    use crate::repos::theme::NewTheme;
    use crate::test_support::scoped_service;
    use beacon_core::entities::StrategicKeyword;
    use beacon_core::enums::Recommendation;
    use beacon_scoring::ScoringError;
    use pretty_assertions::assert_eq;

    async fn theme(svc: &BeaconService, title: &str, tags: &[&str], signal: u8) -> Theme {
        svc.create_theme(&NewTheme {
            title: title.into(),
            description: None,
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            customer_signal_score: Some(signal),
        })
        .await
        .unwrap()
    }

    fn strategy() -> NewStrategy {
        NewStrategy {
            target_customer: "Finance teams at SMBs".into(),
            problems_solved: vec!["financial reporting".into()],
            problems_not_solved: vec!["payroll".into()],
            strategic_keywords: vec![StrategicKeyword {
                keyword: "reporting".into(),
                weight: 0.8,
                reasoning: "Core differentiator".into(),
            }],
        }
    }

    #[tokio::test]
    async fn scoring_without_strategy_fails() {
        let svc = scoped_service().await;
        let t = theme(&svc, "Reporting exports", &["reporting"], 90).await;
        let err = svc.score_theme(&t.id).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Scoring(ScoringError::NoActiveStrategy)));
        assert_eq!(err.to_string(), "no strategy configured");
    }

    #[tokio::test]
    async fn score_theme_persists_outcome() {
        let svc = scoped_service().await;
        svc.create_strategy(&strategy()).await.unwrap();
        let t = theme(&svc, "Better reporting", &["reporting"], 90).await;

        let scored = svc.score_theme(&t.id).await.unwrap();
        let alignment = scored.strategic_alignment_score.unwrap();
        assert!(alignment > 50);
        assert_eq!(
            scored.final_priority_score,
            Some(beacon_scoring::alignment::final_priority(90, alignment))
        );
        assert_eq!(scored.scored_strategy_version, Some(1));
        assert_eq!(scored.recommendation, Some(Recommendation::HighPriority));
        assert!(!scored.opportunities.is_empty());
    }

    #[tokio::test]
    async fn score_all_rescores_with_new_version() {
        let svc = scoped_service().await;
        svc.create_strategy(&strategy()).await.unwrap();
        theme(&svc, "Payroll sync", &["payroll"], 40).await;
        theme(&svc, "Reporting", &["reporting"], 70).await;

        let summary = svc.score_all_themes().await.unwrap();
        assert_eq!(summary, BulkRunResponse { processed: 2, failed: 0 });

        svc.create_strategy(&strategy()).await.unwrap();
        svc.score_all_themes().await.unwrap();
        let payroll = svc
            .list_themes(&Default::default())
            .await
            .unwrap()
            .into_iter()
            .find(|t| t.title == "Payroll sync")
            .unwrap();
        assert_eq!(payroll.scored_strategy_version, Some(2));
        assert!(payroll.strategic_alignment_score.unwrap() < 50);
        assert_eq!(payroll.conflicts.len(), 1);
    }
}
