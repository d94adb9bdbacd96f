//! Feedback repository: ingestion, AI analysis results, theme assignment,
//! and tag usage.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use beacon_core::analysis::AnalysisResult;
use beacon_core::entities::FeedbackItem;
use beacon_core::enums::{AuditAction, EntityType, FeedbackSource};
use beacon_core::ids::PREFIX_FEEDBACK;
use beacon_core::responses::TagCount;

use crate::error::DatabaseError;
use crate::helpers::{
    get_opt_string, get_opt_u8, get_u32, normalize_tags, parse_datetime, parse_enum, parse_json,
    parse_optional_datetime, parse_optional_enum, to_json_text,
};
use crate::service::BeaconService;

const SELECT_COLS: &str = "id, company_id, customer_id, theme_id, source, content, summary, \
     sentiment_score, sentiment_label, priority_score, tags, analyzed_at, created_at";

fn row_to_feedback(row: &libsql::Row) -> Result<FeedbackItem, DatabaseError> {
    Ok(FeedbackItem {
        id: row.get(0)?,
        company_id: row.get(1)?,
        customer_id: get_opt_string(row, 2)?,
        theme_id: get_opt_string(row, 3)?,
        source: parse_enum(&row.get::<String>(4)?)?,
        content: row.get(5)?,
        summary: get_opt_string(row, 6)?,
        sentiment_score: row.get::<Option<f64>>(7)?,
        sentiment_label: parse_optional_enum(get_opt_string(row, 8)?.as_deref())?,
        priority_score: get_opt_u8(row, 9)?,
        tags: parse_json(&row.get::<String>(10)?)?,
        analyzed_at: parse_optional_datetime(get_opt_string(row, 11)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(12)?)?,
    })
}

const fn default_source() -> FeedbackSource {
    FeedbackSource::Other
}

/// Input for ingesting one piece of feedback.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFeedback {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default = "default_source")]
    pub source: FeedbackSource,
    pub content: String,
    /// Manual tags. Analysis replaces them.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Filter criteria for feedback listing.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FeedbackFilter {
    pub customer_id: Option<String>,
    pub theme_id: Option<String>,
    pub source: Option<FeedbackSource>,
    /// Only items with (`true`) or without (`false`) an analysis.
    pub analyzed: Option<bool>,
    pub limit: Option<u32>,
}

#[derive(Serialize)]
struct AnalyzedDetail<'a> {
    sentiment_score: f64,
    priority_score: u8,
    tags: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    cost: Option<f64>,
}

impl BeaconService {
    /// Store a feedback item. Counts as customer activity.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for empty content and
    /// `DatabaseError::NotFound` for an unknown customer.
    pub async fn create_feedback(&self, input: &NewFeedback) -> Result<FeedbackItem, DatabaseError> {
        let company_id = self.company_id()?.to_string();
        let content = input.content.trim();
        if content.is_empty() {
            return Err(DatabaseError::Validation("feedback content must not be empty".into()));
        }
        if let Some(ref customer_id) = input.customer_id {
            self.get_customer(customer_id).await?;
        }

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_FEEDBACK).await?;
        let tags = normalize_tags(&input.tags);
        let tags_json = to_json_text(&tags)?;
        self.db()
            .execute_with(
                "INSERT INTO feedback_items (id, company_id, customer_id, source, content, tags, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                || {
                    libsql::params![
                        id.as_str(),
                        company_id.as_str(),
                        input.customer_id.as_deref(),
                        input.source.as_str(),
                        content,
                        tags_json.as_str(),
                        now.to_rfc3339()
                    ]
                },
            )
            .await?;

        if let Some(ref customer_id) = input.customer_id {
            self.touch_customer_activity(customer_id, now).await?;
            self.db()
                .execute_with(
                    "UPDATE customers SET feedback_count = feedback_count + 1 WHERE id = ?1 AND company_id = ?2",
                    || [customer_id.as_str(), company_id.as_str()],
                )
                .await?;
        }

        self.audit_simple(EntityType::Feedback, &id, AuditAction::Created)
            .await?;

        Ok(FeedbackItem {
            id,
            company_id,
            customer_id: input.customer_id.clone(),
            theme_id: None,
            source: input.source,
            content: content.to_string(),
            summary: None,
            sentiment_score: None,
            sentiment_label: None,
            priority_score: None,
            tags,
            analyzed_at: None,
            created_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the item is not in the scoped company.
    pub async fn get_feedback(&self, id: &str) -> Result<FeedbackItem, DatabaseError> {
        let company_id = self.company_id()?;
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {SELECT_COLS} FROM feedback_items WHERE id = ?1 AND company_id = ?2"),
                || [id, company_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("feedback", id))?;
        row_to_feedback(&row)
    }

    /// Newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_feedback(&self, filter: &FeedbackFilter) -> Result<Vec<FeedbackItem>, DatabaseError> {
        let mut conditions = vec!["company_id = ?1".to_string()];
        let mut params: Vec<libsql::Value> = vec![self.company_id()?.into()];

        if let Some(ref customer_id) = filter.customer_id {
            params.push(customer_id.clone().into());
            conditions.push(format!("customer_id = ?{}", params.len()));
        }
        if let Some(ref theme_id) = filter.theme_id {
            params.push(theme_id.clone().into());
            conditions.push(format!("theme_id = ?{}", params.len()));
        }
        if let Some(source) = filter.source {
            params.push(source.as_str().into());
            conditions.push(format!("source = ?{}", params.len()));
        }
        match filter.analyzed {
            Some(true) => conditions.push("analyzed_at IS NOT NULL".into()),
            Some(false) => conditions.push("analyzed_at IS NULL".into()),
            None => {}
        }

        let limit = self.limit(filter.limit);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM feedback_items WHERE {}
             ORDER BY created_at DESC, rowid DESC LIMIT {limit}",
            conditions.join(" AND ")
        );
        let mut rows = self
            .db()
            .query_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(row_to_feedback(&row)?);
        }
        Ok(items)
    }

    /// Analysed items not yet assigned to a theme, oldest first.
    pub(crate) async fn unassigned_analyzed_feedback(&self) -> Result<Vec<FeedbackItem>, DatabaseError> {
        let company_id = self.company_id()?;
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT {SELECT_COLS} FROM feedback_items
                     WHERE company_id = ?1 AND theme_id IS NULL AND analyzed_at IS NOT NULL
                     ORDER BY created_at, rowid"
                ),
                || [company_id],
            )
            .await?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(row_to_feedback(&row)?);
        }
        Ok(items)
    }

    /// Store the output of the AI analysis service on a feedback item.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` when the result is out of range,
    /// or `DatabaseError::NotFound` for an unknown item.
    pub async fn apply_analysis(
        &self,
        feedback_id: &str,
        result: &AnalysisResult,
    ) -> Result<FeedbackItem, DatabaseError> {
        let company_id = self.company_id()?.to_string();
        let score = result.sentiment.score;
        if !(-1.0..=1.0).contains(&score) {
            return Err(DatabaseError::Validation(format!(
                "sentiment score {score} outside [-1, 1]"
            )));
        }
        if result.priority_score > 100 {
            return Err(DatabaseError::Validation(format!(
                "priority score {} outside [0, 100]",
                result.priority_score
            )));
        }

        let now = Utc::now();
        let tags = normalize_tags(&result.tags);
        let tags_json = to_json_text(&tags)?;
        let changed = self
            .db()
            .execute_with(
                "UPDATE feedback_items
                 SET summary = ?1, sentiment_score = ?2, sentiment_label = ?3,
                     priority_score = ?4, tags = ?5, analyzed_at = ?6
                 WHERE id = ?7 AND company_id = ?8",
                || {
                    libsql::params![
                        result.summary.as_str(),
                        score,
                        result.sentiment.label.as_str(),
                        i64::from(result.priority_score),
                        tags_json.as_str(),
                        now.to_rfc3339(),
                        feedback_id,
                        company_id.as_str()
                    ]
                },
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("feedback", feedback_id));
        }

        self.audit_detail(
            EntityType::Feedback,
            feedback_id,
            AuditAction::Analyzed,
            &AnalyzedDetail {
                sentiment_score: score,
                priority_score: result.priority_score,
                tags: &tags,
                cost: result.cost,
            },
        )
        .await?;

        self.get_feedback(feedback_id).await
    }

    /// Point unassigned feedback items at a theme. Items outside the company
    /// or already assigned to a theme are left alone.
    ///
    /// Returns the number of items updated.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the UPDATE fails.
    pub async fn assign_feedback_to_theme(
        &self,
        feedback_ids: &[String],
        theme_id: &str,
    ) -> Result<u64, DatabaseError> {
        if feedback_ids.is_empty() {
            return Ok(0);
        }
        let company_id = self.company_id()?;
        let mut params: Vec<libsql::Value> = vec![theme_id.into(), company_id.into()];
        let placeholders: Vec<String> = feedback_ids
            .iter()
            .map(|id| {
                params.push(id.clone().into());
                format!("?{}", params.len())
            })
            .collect();
        let sql = format!(
            "UPDATE feedback_items SET theme_id = ?1
             WHERE company_id = ?2 AND theme_id IS NULL AND id IN ({})",
            placeholders.join(", ")
        );
        self.db()
            .execute_with(&sql, || libsql::params_from_iter(params.clone()))
            .await
    }

    /// Tag usage across the company's feedback, most used first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn tag_counts(&self, limit: Option<u32>) -> Result<Vec<TagCount>, DatabaseError> {
        let company_id = self.company_id()?;
        let limit = self.limit(limit);
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT j.value, COUNT(*) AS n
                     FROM feedback_items f, json_each(f.tags) j
                     WHERE f.company_id = ?1
                     GROUP BY j.value
                     ORDER BY n DESC, j.value
                     LIMIT {limit}"
                ),
                || [company_id],
            )
            .await?;
        let mut counts = Vec::new();
        while let Some(row) = rows.next().await? {
            counts.push(TagCount {
                tag: row.get(0)?,
                count: get_u32(&row, 1)?,
            });
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::customer::NewCustomer;
    use crate::repos::theme::NewTheme;
    use crate::test_support::scoped_service;
    use beacon_core::analysis::Sentiment;
    use beacon_core::enums::SentimentLabel;
    use pretty_assertions::assert_eq;

    fn feedback(content: &str, tags: &[&str]) -> NewFeedback {
        NewFeedback {
            customer_id: None,
            source: FeedbackSource::SupportTicket,
            content: content.into(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    fn analysis(score: f64, tags: &[&str]) -> AnalysisResult {
        AnalysisResult {
            summary: "summary".into(),
            sentiment: Sentiment {
                score,
                label: SentimentLabel::from_score(score),
            },
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            priority_score: 60,
            cost: Some(0.002),
        }
    }

    #[tokio::test]
    async fn create_with_customer_counts_activity() {
        let svc = scoped_service().await;
        let customer = svc
            .create_customer(&NewCustomer {
                name: "Globex".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let mut input = feedback("Export keeps timing out", &["Export", " export "]);
        input.customer_id = Some(customer.id.clone());

        let item = svc.create_feedback(&input).await.unwrap();
        assert_eq!(item.tags, vec!["export"]);

        let customer = svc.get_customer(&customer.id).await.unwrap();
        assert_eq!(customer.feedback_count, 1);
        assert!(customer.last_activity_at.is_some());
    }

    #[tokio::test]
    async fn empty_content_and_unknown_customer_are_rejected() {
        let svc = scoped_service().await;
        let err = svc.create_feedback(&feedback("   ", &[])).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));

        let mut input = feedback("hello", &[]);
        input.customer_id = Some("cus-missing".into());
        let err = svc.create_feedback(&input).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn apply_analysis_stores_result() {
        let svc = scoped_service().await;
        let item = svc.create_feedback(&feedback("CSV export is slow", &[])).await.unwrap();

        let analyzed = svc
            .apply_analysis(&item.id, &analysis(-0.6, &["CSV", "performance"]))
            .await
            .unwrap();
        assert_eq!(analyzed.sentiment_label, Some(SentimentLabel::Negative));
        assert_eq!(analyzed.priority_score, Some(60));
        assert_eq!(analyzed.tags, vec!["csv", "performance"]);
        assert!(analyzed.analyzed_at.is_some());

        let unanalyzed = svc
            .list_feedback(&FeedbackFilter {
                analyzed: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(unanalyzed.is_empty());
    }

    #[tokio::test]
    async fn out_of_range_analysis_is_rejected() {
        let svc = scoped_service().await;
        let item = svc.create_feedback(&feedback("hmm", &[])).await.unwrap();
        let err = svc.apply_analysis(&item.id, &analysis(1.7, &[])).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[tokio::test]
    async fn tag_counts_are_ordered() {
        let svc = scoped_service().await;
        svc.create_feedback(&feedback("a", &["export", "csv"])).await.unwrap();
        svc.create_feedback(&feedback("b", &["export"])).await.unwrap();
        svc.create_feedback(&feedback("c", &["sso"])).await.unwrap();

        let counts = svc.tag_counts(None).await.unwrap();
        assert_eq!(
            counts,
            vec![
                TagCount { tag: "export".into(), count: 2 },
                TagCount { tag: "csv".into(), count: 1 },
                TagCount { tag: "sso".into(), count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn list_filters_by_source() {
        let svc = scoped_service().await;
        svc.create_feedback(&feedback("a", &[])).await.unwrap();
        let mut review = feedback("b", &[]);
        review.source = FeedbackSource::Review;
        svc.create_feedback(&review).await.unwrap();

        let reviews = svc
            .list_feedback(&FeedbackFilter {
                source: Some(FeedbackSource::Review),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].content, "b");
    }

    #[tokio::test]
    async fn assignment_skips_items_already_in_a_theme() {
        let svc = scoped_service().await;
        let theme = |title: &str| NewTheme {
            title: title.into(),
            description: None,
            tags: vec!["export".into()],
            customer_signal_score: None,
        };
        let first = svc.create_theme(&theme("Exports")).await.unwrap();
        let second = svc.create_theme(&theme("Exports again")).await.unwrap();
        let a = svc.create_feedback(&feedback("a", &["export"])).await.unwrap();
        let b = svc.create_feedback(&feedback("b", &["export"])).await.unwrap();

        let ids = vec![a.id.clone()];
        assert_eq!(svc.assign_feedback_to_theme(&ids, &first.id).await.unwrap(), 1);

        let both = vec![a.id.clone(), b.id.clone()];
        assert_eq!(svc.assign_feedback_to_theme(&both, &second.id).await.unwrap(), 1);
        assert_eq!(
            svc.get_feedback(&a.id).await.unwrap().theme_id.as_deref(),
            Some(first.id.as_str())
        );
        assert_eq!(
            svc.get_feedback(&b.id).await.unwrap().theme_id.as_deref(),
            Some(second.id.as_str())
        );
    }
}
