//! Theme repository: manual creation, review workflow, scoring results.

use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use beacon_core::audit_detail::{ReviewedDetail, ScoredDetail};
use beacon_core::entities::Theme;
use beacon_core::enums::{AuditAction, EntityType, Recommendation, ReviewDecision, ThemeStatus};
use beacon_core::ids::PREFIX_THEME;
use beacon_core::responses::{BatchItemResult, BatchReviewResponse};
use beacon_scoring::{AlignmentOutcome, CandidateTheme};

use crate::error::DatabaseError;
use crate::helpers::{
    get_opt_string, get_opt_u8, get_u8, get_u32, normalize_tags, opt_value, parse_datetime,
    parse_enum, parse_json, parse_optional_datetime, parse_optional_enum, to_json_text,
};
use crate::service::BeaconService;
use crate::updates::theme::ThemeUpdate;

const SELECT_COLS: &str = "id, company_id, title, description, tags, status, mention_count, \
     customer_count, avg_sentiment, customer_signal_score, strategic_alignment_score, \
     final_priority_score, recommendation, alignment_reasoning, conflicts, opportunities, \
     scored_strategy_version, pm_notes, declined_reason, reviewed_by, reviewed_at, \
     created_at, updated_at";

fn row_to_theme(row: &libsql::Row) -> Result<Theme, DatabaseError> {
    Ok(Theme {
        id: row.get(0)?,
        company_id: row.get(1)?,
        title: row.get(2)?,
        description: get_opt_string(row, 3)?,
        tags: parse_json(&row.get::<String>(4)?)?,
        status: parse_enum(&row.get::<String>(5)?)?,
        mention_count: get_u32(row, 6)?,
        customer_count: get_u32(row, 7)?,
        avg_sentiment: row.get(8)?,
        customer_signal_score: get_u8(row, 9)?,
        strategic_alignment_score: get_opt_u8(row, 10)?,
        final_priority_score: get_opt_u8(row, 11)?,
        recommendation: parse_optional_enum(get_opt_string(row, 12)?.as_deref())?,
        alignment_reasoning: get_opt_string(row, 13)?,
        conflicts: parse_json(&row.get::<String>(14)?)?,
        opportunities: parse_json(&row.get::<String>(15)?)?,
        scored_strategy_version: row
            .get::<Option<i64>>(16)?
            .map(u32::try_from)
            .transpose()
            .map_err(|e| DatabaseError::Query(format!("scored_strategy_version: {e}")))?,
        pm_notes: get_opt_string(row, 17)?,
        declined_reason: get_opt_string(row, 18)?,
        reviewed_by: get_opt_string(row, 19)?,
        reviewed_at: parse_optional_datetime(get_opt_string(row, 20)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(21)?)?,
        updated_at: parse_datetime(&row.get::<String>(22)?)?,
    })
}

/// Input for creating a theme by hand.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTheme {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Manual themes start with no customer signal unless one is given.
    #[serde(default)]
    pub customer_signal_score: Option<u8>,
}

/// Filter criteria for theme listing.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ThemeFilter {
    pub status: Option<ThemeStatus>,
    pub recommendation: Option<Recommendation>,
    pub limit: Option<u32>,
}

/// A product manager's review of one or more themes.
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeReview {
    pub decision: ReviewDecision,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub declined_reason: Option<String>,
}

impl ThemeReview {
    fn validate(&self) -> Result<(), DatabaseError> {
        if self.decision == ReviewDecision::Decline
            && self
                .declined_reason
                .as_deref()
                .is_none_or(|r| r.trim().is_empty())
        {
            return Err(DatabaseError::Validation(
                "declined_reason is required when declining a theme".into(),
            ));
        }
        Ok(())
    }
}

impl BeaconService {
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for an empty title or an
    /// out-of-range signal score.
    pub async fn create_theme(&self, input: &NewTheme) -> Result<Theme, DatabaseError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(DatabaseError::Validation("theme title must not be empty".into()));
        }
        let signal = input.customer_signal_score.unwrap_or(0);
        if signal > 100 {
            return Err(DatabaseError::Validation(format!(
                "customer_signal_score {signal} outside [0, 100]"
            )));
        }
        self.insert_theme(
            title,
            input.description.as_deref(),
            &normalize_tags(&input.tags),
            0,
            0,
            0.0,
            signal,
        )
        .await
    }

    /// Persist a discovered candidate as a `new` theme.
    pub(crate) async fn create_theme_from_candidate(
        &self,
        candidate: &CandidateTheme,
    ) -> Result<Theme, DatabaseError> {
        let description = format!(
            "Discovered from {} feedback items across {} customers.",
            candidate.mention_count, candidate.customer_count
        );
        self.insert_theme(
            &candidate.title,
            Some(&description),
            &candidate.tags,
            candidate.mention_count,
            candidate.customer_count,
            candidate.avg_sentiment,
            candidate.customer_signal_score,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_theme(
        &self,
        title: &str,
        description: Option<&str>,
        tags: &[String],
        mention_count: u32,
        customer_count: u32,
        avg_sentiment: f64,
        customer_signal_score: u8,
    ) -> Result<Theme, DatabaseError> {
        let company_id = self.company_id()?.to_string();
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_THEME).await?;
        let tags_json = to_json_text(tags)?;
        self.db()
            .execute_with(
                "INSERT INTO themes (id, company_id, title, description, tags, status, mention_count,
                     customer_count, avg_sentiment, customer_signal_score, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'new', ?6, ?7, ?8, ?9, ?10, ?10)",
                || {
                    libsql::params![
                        id.as_str(),
                        company_id.as_str(),
                        title,
                        description,
                        tags_json.as_str(),
                        i64::from(mention_count),
                        i64::from(customer_count),
                        avg_sentiment,
                        i64::from(customer_signal_score),
                        now.to_rfc3339()
                    ]
                },
            )
            .await?;

        self.audit_simple(EntityType::Theme, &id, AuditAction::Created)
            .await?;

        Ok(Theme {
            id,
            company_id,
            title: title.to_string(),
            description: description.map(String::from),
            tags: tags.to_vec(),
            status: ThemeStatus::New,
            mention_count,
            customer_count,
            avg_sentiment,
            customer_signal_score,
            strategic_alignment_score: None,
            final_priority_score: None,
            recommendation: None,
            alignment_reasoning: None,
            conflicts: Vec::new(),
            opportunities: Vec::new(),
            scored_strategy_version: None,
            pm_notes: None,
            declined_reason: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the theme is not in the scoped company.
    pub async fn get_theme(&self, id: &str) -> Result<Theme, DatabaseError> {
        let company_id = self.company_id()?;
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {SELECT_COLS} FROM themes WHERE id = ?1 AND company_id = ?2"),
                || [id, company_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("theme", id))?;
        row_to_theme(&row)
    }

    /// Highest final priority first; unscored themes last by signal.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_themes(&self, filter: &ThemeFilter) -> Result<Vec<Theme>, DatabaseError> {
        let mut conditions = vec!["company_id = ?1".to_string()];
        let mut params: Vec<libsql::Value> = vec![self.company_id()?.into()];

        if let Some(status) = filter.status {
            params.push(status.as_str().into());
            conditions.push(format!("status = ?{}", params.len()));
        }
        if let Some(recommendation) = filter.recommendation {
            params.push(recommendation.as_str().into());
            conditions.push(format!("recommendation = ?{}", params.len()));
        }

        let limit = self.limit(filter.limit);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM themes WHERE {}
             ORDER BY final_priority_score IS NULL, final_priority_score DESC,
                      customer_signal_score DESC, title
             LIMIT {limit}",
            conditions.join(" AND ")
        );
        let mut rows = self
            .db()
            .query_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        let mut themes = Vec::new();
        while let Some(row) = rows.next().await? {
            themes.push(row_to_theme(&row)?);
        }
        Ok(themes)
    }

    /// Every theme in the scoped company, no limit.
    pub(crate) async fn all_themes(&self) -> Result<Vec<Theme>, DatabaseError> {
        let company_id = self.company_id()?;
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {SELECT_COLS} FROM themes WHERE company_id = ?1 ORDER BY created_at, rowid"),
                || [company_id],
            )
            .await?;
        let mut themes = Vec::new();
        while let Some(row) = rows.next().await? {
            themes.push(row_to_theme(&row)?);
        }
        Ok(themes)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown theme or
    /// `DatabaseError::Validation` for an empty title.
    pub async fn update_theme(&self, theme_id: &str, update: ThemeUpdate) -> Result<Theme, DatabaseError> {
        let company_id = self.company_id()?.to_string();
        if update.is_empty() {
            return self.get_theme(theme_id).await;
        }

        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref title) = update.title {
            if title.trim().is_empty() {
                return Err(DatabaseError::Validation("theme title must not be empty".into()));
            }
            params.push(title.trim().into());
            sets.push(format!("title = ?{}", params.len()));
        }
        if let Some(ref description) = update.description {
            params.push(opt_value(description.as_deref()));
            sets.push(format!("description = ?{}", params.len()));
        }
        if let Some(ref tags) = update.tags {
            params.push(to_json_text(&normalize_tags(tags))?.into());
            sets.push(format!("tags = ?{}", params.len()));
        }
        if let Some(ref notes) = update.pm_notes {
            params.push(opt_value(notes.as_deref()));
            sets.push(format!("pm_notes = ?{}", params.len()));
        }

        params.push(Utc::now().to_rfc3339().into());
        sets.push(format!("updated_at = ?{}", params.len()));
        params.push(theme_id.into());
        let id_idx = params.len();
        params.push(company_id.into());
        let company_idx = params.len();

        let sql = format!(
            "UPDATE themes SET {} WHERE id = ?{id_idx} AND company_id = ?{company_idx}",
            sets.join(", ")
        );
        let changed = self
            .db()
            .execute_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("theme", theme_id));
        }

        self.audit_detail(EntityType::Theme, theme_id, AuditAction::Updated, &update)
            .await?;
        self.get_theme(theme_id).await
    }

    /// Apply a review decision.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` when declining without a reason,
    /// `DatabaseError::InvalidState` when the theme's status does not allow
    /// the decision, or `DatabaseError::NotFound`.
    pub async fn review_theme(&self, theme_id: &str, review: &ThemeReview) -> Result<Theme, DatabaseError> {
        review.validate()?;
        let theme = self.get_theme(theme_id).await?;
        let target = review.decision.target_status();
        if !theme.status.can_transition_to(target) {
            return Err(DatabaseError::InvalidState(format!(
                "cannot {} a theme in status {}",
                review.decision, theme.status
            )));
        }

        let company_id = self.company_id()?;
        let now = Utc::now().to_rfc3339();
        let declined_reason = if review.decision == ReviewDecision::Decline {
            review.declined_reason.as_deref().map(str::trim)
        } else {
            None
        };
        let notes = review.notes.as_deref().or(theme.pm_notes.as_deref());
        self.db()
            .execute_with(
                "UPDATE themes
                 SET status = ?1, pm_notes = ?2, declined_reason = ?3, reviewed_by = ?4,
                     reviewed_at = ?5, updated_at = ?5
                 WHERE id = ?6 AND company_id = ?7",
                || {
                    libsql::params![
                        target.as_str(),
                        notes,
                        declined_reason,
                        self.actor_id(),
                        now.as_str(),
                        theme_id,
                        company_id
                    ]
                },
            )
            .await?;

        self.audit_detail(
            EntityType::Theme,
            theme_id,
            AuditAction::Reviewed,
            &ReviewedDetail {
                decision: review.decision,
                from: theme.status.to_string(),
                to: target.to_string(),
                notes: review.notes.clone(),
                declined_reason: declined_reason.map(String::from),
            },
        )
        .await?;

        self.get_theme(theme_id).await
    }

    /// Review several themes with the same decision.
    ///
    /// Items are processed one at a time and independently. A failure is
    /// reported in its result entry and does not undo earlier successes.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` before touching any theme when the
    /// review itself is invalid.
    pub async fn batch_review_themes(
        &self,
        theme_ids: &[String],
        review: &ThemeReview,
    ) -> Result<BatchReviewResponse, DatabaseError> {
        review.validate()?;
        let mut results = Vec::with_capacity(theme_ids.len());
        let (mut succeeded, mut failed) = (0u32, 0u32);
        for id in theme_ids {
            match self.review_theme(id, review).await {
                Ok(theme) => {
                    succeeded += 1;
                    results.push(BatchItemResult {
                        id: id.clone(),
                        ok: true,
                        error: None,
                        theme: Some(theme),
                    });
                }
                Err(e) => {
                    warn!(theme_id = %id, error = %e, "batch review item failed");
                    failed += 1;
                    results.push(BatchItemResult {
                        id: id.clone(),
                        ok: false,
                        error: Some(e.to_string()),
                        theme: None,
                    });
                }
            }
        }
        Ok(BatchReviewResponse {
            succeeded,
            failed,
            results,
        })
    }

    /// Persist an alignment outcome computed against strategy `version`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown theme.
    pub async fn record_theme_score(
        &self,
        theme_id: &str,
        outcome: &AlignmentOutcome,
        strategy_version: u32,
    ) -> Result<Theme, DatabaseError> {
        let company_id = self.company_id()?;
        let now = Utc::now().to_rfc3339();
        let conflicts = to_json_text(&outcome.conflicts)?;
        let opportunities = to_json_text(&outcome.opportunities)?;
        let changed = self
            .db()
            .execute_with(
                "UPDATE themes
                 SET strategic_alignment_score = ?1, final_priority_score = ?2, recommendation = ?3,
                     alignment_reasoning = ?4, conflicts = ?5, opportunities = ?6,
                     scored_strategy_version = ?7, updated_at = ?8
                 WHERE id = ?9 AND company_id = ?10",
                || {
                    libsql::params![
                        i64::from(outcome.alignment_score),
                        i64::from(outcome.final_priority_score),
                        outcome.recommendation.as_str(),
                        outcome.reasoning.as_str(),
                        conflicts.as_str(),
                        opportunities.as_str(),
                        i64::from(strategy_version),
                        now.as_str(),
                        theme_id,
                        company_id
                    ]
                },
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("theme", theme_id));
        }

        self.audit_detail(
            EntityType::Theme,
            theme_id,
            AuditAction::Scored,
            &ScoredDetail {
                strategy_version,
                alignment_score: outcome.alignment_score,
                final_priority_score: outcome.final_priority_score,
                recommendation: outcome.recommendation,
            },
        )
        .await?;

        self.get_theme(theme_id).await
    }

    /// Delete a theme. Its feedback items become unassigned.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown theme.
    pub async fn delete_theme(&self, theme_id: &str) -> Result<(), DatabaseError> {
        let company_id = self.company_id()?;
        let changed = self
            .db()
            .execute_with(
                "DELETE FROM themes WHERE id = ?1 AND company_id = ?2",
                || [theme_id, company_id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("theme", theme_id));
        }
        self.audit_simple(EntityType::Theme, theme_id, AuditAction::Deleted)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::audit::AuditFilter;
    use crate::repos::feedback::NewFeedback;
    use crate::test_support::scoped_service;
    use crate::updates::theme::ThemeUpdateBuilder;
    use beacon_core::enums::FeedbackSource;
    use pretty_assertions::assert_eq;

    fn new_theme(title: &str) -> NewTheme {
        NewTheme {
            title: title.into(),
            description: Some("Customers want faster exports".into()),
            tags: vec!["Export".into(), "csv".into()],
            customer_signal_score: Some(80),
        }
    }

    fn review(decision: ReviewDecision) -> ThemeReview {
        ThemeReview {
            decision,
            notes: Some("looked at it".into()),
            declined_reason: None,
        }
    }

    #[tokio::test]
    async fn create_and_get() {
        let svc = scoped_service().await;
        let theme = svc.create_theme(&new_theme("Faster exports")).await.unwrap();
        assert_eq!(theme.status, ThemeStatus::New);
        assert_eq!(theme.tags, vec!["export", "csv"]);

        let fetched = svc.get_theme(&theme.id).await.unwrap();
        assert_eq!(fetched, theme);
    }

    #[tokio::test]
    async fn approve_sets_reviewer() {
        let svc = scoped_service().await;
        let theme = svc.create_theme(&new_theme("Faster exports")).await.unwrap();
        let reviewed = svc
            .review_theme(&theme.id, &review(ReviewDecision::Approve))
            .await
            .unwrap();
        assert_eq!(reviewed.status, ThemeStatus::Approved);
        assert_eq!(reviewed.reviewed_by.as_deref(), svc.actor_id());
        assert_eq!(reviewed.pm_notes.as_deref(), Some("looked at it"));

        let audit = svc
            .query_audit(&AuditFilter {
                action: Some(AuditAction::Reviewed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(audit.len(), 1);
        let detail = audit[0].detail.clone().unwrap();
        assert_eq!(detail["from"], "new");
        assert_eq!(detail["to"], "approved");
    }

    #[tokio::test]
    async fn decline_requires_reason() {
        let svc = scoped_service().await;
        let theme = svc.create_theme(&new_theme("Dark mode")).await.unwrap();
        let err = svc
            .review_theme(&theme.id, &review(ReviewDecision::Decline))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));

        let mut decline = review(ReviewDecision::Decline);
        decline.declined_reason = Some("Not our market".into());
        let declined = svc.review_theme(&theme.id, &decline).await.unwrap();
        assert_eq!(declined.status, ThemeStatus::Declined);
        assert_eq!(declined.declined_reason.as_deref(), Some("Not our market"));
    }

    #[tokio::test]
    async fn terminal_status_rejects_review() {
        let svc = scoped_service().await;
        let theme = svc.create_theme(&new_theme("SSO")).await.unwrap();
        svc.review_theme(&theme.id, &review(ReviewDecision::Approve))
            .await
            .unwrap();
        let err = svc
            .review_theme(&theme.id, &review(ReviewDecision::ExploreLightweight))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)));
    }

    #[tokio::test]
    async fn batch_review_reports_per_item() {
        let svc = scoped_service().await;
        let a = svc.create_theme(&new_theme("A")).await.unwrap();
        let b = svc.create_theme(&new_theme("B")).await.unwrap();
        svc.review_theme(&b.id, &review(ReviewDecision::Approve))
            .await
            .unwrap();

        let ids = vec![a.id.clone(), b.id.clone(), "thm-missing".to_string()];
        let result = svc
            .batch_review_themes(&ids, &review(ReviewDecision::NeedsMoreResearch))
            .await
            .unwrap();
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failed, 2);
        assert!(result.results[0].ok);
        assert!(!result.results[1].ok);
        assert!(result.results[2].error.as_deref().unwrap().contains("not found"));

        let a = svc.get_theme(&a.id).await.unwrap();
        assert_eq!(a.status, ThemeStatus::NeedsResearch);
    }

    #[tokio::test]
    async fn update_and_filter() {
        let svc = scoped_service().await;
        let theme = svc.create_theme(&new_theme("Exports")).await.unwrap();
        let updated = svc
            .update_theme(
                &theme.id,
                ThemeUpdateBuilder::new()
                    .title("CSV exports")
                    .pm_notes(Some("talk to Priya".into()))
                    .build(),
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "CSV exports");
        assert_eq!(updated.tags, theme.tags);

        let approved = svc
            .list_themes(&ThemeFilter {
                status: Some(ThemeStatus::Approved),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(approved.is_empty());
        assert_eq!(svc.list_themes(&ThemeFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_unassigns_feedback() {
        let svc = scoped_service().await;
        let theme = svc.create_theme(&new_theme("Exports")).await.unwrap();
        let item = svc
            .create_feedback(&NewFeedback {
                customer_id: None,
                source: FeedbackSource::Interview,
                content: "exports are slow".into(),
                tags: vec![],
            })
            .await
            .unwrap();
        svc.assign_feedback_to_theme(&[item.id.clone()], &theme.id)
            .await
            .unwrap();

        svc.delete_theme(&theme.id).await.unwrap();
        assert!(svc.get_feedback(&item.id).await.unwrap().theme_id.is_none());
        let err = svc.delete_theme(&theme.id).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
