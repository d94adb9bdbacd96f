//! Customer health cache.
//!
//! Reports are recomputed in full from stored feedback and cached per
//! customer until `expires_at`. There is no incremental update path.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use beacon_core::entities::{CustomerHealthScore, HealthReport};
use beacon_core::enums::{AuditAction, EntityType};
use beacon_core::responses::{BulkRunResponse, CustomerDetailResponse};
use beacon_scoring::{HealthInput, SentimentPoint, compute_health};

use crate::error::DatabaseError;
use crate::helpers::{days_after, get_u32, parse_datetime, parse_json, to_json_text};
use crate::repos::feedback::FeedbackFilter;
use crate::service::BeaconService;

/// Feedback items shown on the customer detail view.
const RECENT_FEEDBACK: u32 = 10;

#[derive(Serialize)]
struct RecomputedDetail {
    health_score: u8,
    churn_risk_score: u8,
}

impl BeaconService {
    /// The cached report when still fresh, otherwise a recomputed one.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the customer is not in the scoped company.
    pub async fn get_customer_health(&self, customer_id: &str) -> Result<CustomerHealthScore, DatabaseError> {
        if let Some(cached) = self.cached_health(customer_id).await?
            && !cached.is_expired(Utc::now())
        {
            debug!(customer_id, "health cache hit");
            return Ok(cached);
        }
        self.recompute_customer_health(customer_id).await
    }

    async fn cached_health(&self, customer_id: &str) -> Result<Option<CustomerHealthScore>, DatabaseError> {
        let company_id = self.company_id()?;
        let mut rows = self
            .db()
            .query_with(
                "SELECT h.customer_id, h.report, h.computed_at, h.expires_at
                 FROM customer_health_scores h
                 JOIN customers c ON c.id = h.customer_id
                 WHERE h.customer_id = ?1 AND c.company_id = ?2",
                || [customer_id, company_id],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        Ok(Some(CustomerHealthScore {
            customer_id: row.get(0)?,
            report: parse_json::<HealthReport>(&row.get::<String>(1)?)?,
            computed_at: parse_datetime(&row.get::<String>(2)?)?,
            expires_at: parse_datetime(&row.get::<String>(3)?)?,
        }))
    }

    /// Recompute from all of the customer's feedback, refresh the cache,
    /// and write the headline numbers onto the customer row.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the customer is not in the scoped company.
    pub async fn recompute_customer_health(
        &self,
        customer_id: &str,
    ) -> Result<CustomerHealthScore, DatabaseError> {
        let customer = self.get_customer(customer_id).await?;
        let company_id = self.company_id()?;

        let mut rows = self
            .db()
            .query_with(
                "SELECT sentiment_score, created_at FROM feedback_items
                 WHERE customer_id = ?1 AND company_id = ?2",
                || [customer_id, company_id],
            )
            .await?;
        let mut points = Vec::new();
        let mut feedback_count = 0u32;
        while let Some(row) = rows.next().await? {
            feedback_count += 1;
            if let Some(sentiment) = row.get::<Option<f64>>(0)? {
                points.push(SentimentPoint {
                    sentiment,
                    at: parse_datetime(&row.get::<String>(1)?)?,
                });
            }
        }
        drop(rows);

        let now = Utc::now();
        let report = compute_health(
            &HealthInput {
                feedback: points,
                last_activity_at: customer.last_activity_at,
                now,
            },
            &self.settings().scoring.health,
        );
        let expires_at = days_after(
            now,
            self.settings().health_cache_ttl_days,
            "health_cache_ttl_days",
        )?;
        let report_json = to_json_text(&report)?;

        self.db()
            .execute_with(
                "INSERT INTO customer_health_scores (customer_id, report, computed_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(customer_id) DO UPDATE SET
                     report = excluded.report,
                     computed_at = excluded.computed_at,
                     expires_at = excluded.expires_at",
                || {
                    libsql::params![
                        customer_id,
                        report_json.as_str(),
                        now.to_rfc3339(),
                        expires_at.to_rfc3339()
                    ]
                },
            )
            .await?;
        self.write_customer_metrics(
            customer_id,
            report.health_score,
            report.churn_risk_score,
            report.avg_sentiment,
            feedback_count,
        )
        .await?;
        self.audit_detail(
            EntityType::Customer,
            customer_id,
            AuditAction::Recomputed,
            &RecomputedDetail {
                health_score: report.health_score,
                churn_risk_score: report.churn_risk_score,
            },
        )
        .await?;

        Ok(CustomerHealthScore {
            customer_id: customer_id.to_string(),
            report,
            computed_at: now,
            expires_at,
        })
    }

    /// Recompute every customer in the scoped company.
    ///
    /// A failure for one customer is logged and counted; the run continues.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` only if the customer list cannot be read.
    pub async fn recompute_all_health(&self) -> Result<BulkRunResponse, DatabaseError> {
        let mut summary = BulkRunResponse {
            processed: 0,
            failed: 0,
        };
        for id in self.customer_ids().await? {
            match self.recompute_customer_health(&id).await {
                Ok(_) => summary.processed += 1,
                Err(e) => {
                    warn!(customer_id = %id, error = %e, "health recompute failed");
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }

    /// Customer, health report, and most recent feedback in one call.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the customer is not in the scoped company.
    pub async fn customer_detail(&self, customer_id: &str) -> Result<CustomerDetailResponse, DatabaseError> {
        let health = self.get_customer_health(customer_id).await?;
        let customer = self.get_customer(customer_id).await?;
        let recent_feedback = self
            .list_feedback(&FeedbackFilter {
                customer_id: Some(customer_id.to_string()),
                limit: Some(RECENT_FEEDBACK),
                ..Default::default()
            })
            .await?;
        Ok(CustomerDetailResponse {
            customer,
            health: health.report,
            recent_feedback,
        })
    }

    /// Number of cached reports in the scoped company.
    #[cfg(test)]
    pub(crate) async fn cached_health_count(&self) -> Result<u32, DatabaseError> {
        let company_id = self.company_id()?;
        let mut rows = self
            .db()
            .query_with(
                "SELECT COUNT(*) FROM customer_health_scores h
                 JOIN customers c ON c.id = h.customer_id WHERE c.company_id = ?1",
                || [company_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        get_u32(&row, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::customer::NewCustomer;
    use chrono::Duration;
    use crate::repos::feedback::NewFeedback;
    use crate::service::ServiceSettings;
    use crate::test_support::scoped_service;
    use beacon_core::analysis::{AnalysisResult, Sentiment};
    use beacon_core::enums::{FeedbackSource, SentimentLabel};
    use pretty_assertions::assert_eq;

    async fn customer_with_feedback(svc: &BeaconService, sentiments: &[f64]) -> String {
        let customer = svc
            .create_customer(&NewCustomer {
                name: "Globex".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        for (i, score) in sentiments.iter().enumerate() {
            let item = svc
                .create_feedback(&NewFeedback {
                    customer_id: Some(customer.id.clone()),
                    source: FeedbackSource::SupportTicket,
                    content: format!("ticket {i}"),
                    tags: vec![],
                })
                .await
                .unwrap();
            svc.apply_analysis(
                &item.id,
                &AnalysisResult {
                    summary: "s".into(),
                    sentiment: Sentiment {
                        score: *score,
                        label: SentimentLabel::from_score(*score),
                    },
                    tags: vec![],
                    priority_score: 50,
                    cost: None,
                },
            )
            .await
            .unwrap();
        }
        customer.id
    }

    #[tokio::test]
    async fn recompute_writes_cache_and_customer_row() {
        let svc = scoped_service().await;
        let id = customer_with_feedback(&svc, &[-0.8, -0.7, -0.2]).await;

        let score = svc.recompute_customer_health(&id).await.unwrap();
        assert_eq!(score.report.recent_negative_count, 2);
        assert!(score.expires_at > score.computed_at);

        let customer = svc.get_customer(&id).await.unwrap();
        assert_eq!(customer.health_score, Some(score.report.health_score));
        assert_eq!(customer.churn_risk_score, Some(score.report.churn_risk_score));
        assert_eq!(customer.feedback_count, 3);
        assert_eq!(svc.cached_health_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn fresh_cache_is_reused() {
        let svc = scoped_service().await;
        let id = customer_with_feedback(&svc, &[0.5]).await;
        let first = svc.get_customer_health(&id).await.unwrap();
        let second = svc.get_customer_health(&id).await.unwrap();
        assert_eq!(first.computed_at, second.computed_at);
    }

    #[tokio::test]
    async fn expired_cache_is_recomputed() {
        let svc = scoped_service().await;
        let id = customer_with_feedback(&svc, &[0.5]).await;
        let first = svc.get_customer_health(&id).await.unwrap();
        let past = (Utc::now() - Duration::days(1)).to_rfc3339();
        svc.db()
            .conn()
            .execute(
                "UPDATE customer_health_scores SET expires_at = ?1 WHERE customer_id = ?2",
                libsql::params![past, id.as_str()],
            )
            .await
            .unwrap();
        let second = svc.get_customer_health(&id).await.unwrap();
        assert!(second.computed_at > first.computed_at);
    }

    #[tokio::test]
    async fn oversized_cache_ttl_is_a_validation_error() {
        let svc = scoped_service().await;
        let id = customer_with_feedback(&svc, &[0.5]).await;
        let settings = ServiceSettings {
            health_cache_ttl_days: 1_000_000_000_000_000,
            ..ServiceSettings::default()
        };
        let svc = svc.with_settings(settings);

        let err = svc.recompute_customer_health(&id).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[tokio::test]
    async fn recompute_all_counts_customers() {
        let svc = scoped_service().await;
        customer_with_feedback(&svc, &[0.1]).await;
        customer_with_feedback(&svc, &[]).await;
        let summary = svc.recompute_all_health().await.unwrap();
        assert_eq!(summary, BulkRunResponse { processed: 2, failed: 0 });
    }

    #[tokio::test]
    async fn detail_includes_recent_feedback() {
        let svc = scoped_service().await;
        let id = customer_with_feedback(&svc, &[0.3, 0.4]).await;
        let detail = svc.customer_detail(&id).await.unwrap();
        assert_eq!(detail.recent_feedback.len(), 2);
        assert_eq!(detail.customer.id, id);
    }
}
