//! Product strategy repository.
//!
//! Strategies are append-only versions. Creating one deactivates the
//! previous active version in the same transaction.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use beacon_core::entities::{ProductStrategy, StrategicKeyword};
use beacon_core::enums::{AuditAction, EntityType};
use beacon_core::ids::PREFIX_STRATEGY;

use crate::error::DatabaseError;
use crate::helpers::{get_bool, get_opt_string, get_u32, parse_datetime, parse_json, to_json_text};
use crate::service::BeaconService;

const SELECT_COLS: &str = "id, company_id, version, is_active, target_customer, problems_solved, \
     problems_not_solved, strategic_keywords, created_by, created_at";

fn row_to_strategy(row: &libsql::Row) -> Result<ProductStrategy, DatabaseError> {
    Ok(ProductStrategy {
        id: row.get(0)?,
        company_id: row.get(1)?,
        version: get_u32(row, 2)?,
        is_active: get_bool(row, 3)?,
        target_customer: row.get(4)?,
        problems_solved: parse_json(&row.get::<String>(5)?)?,
        problems_not_solved: parse_json(&row.get::<String>(6)?)?,
        strategic_keywords: parse_json(&row.get::<String>(7)?)?,
        created_by: get_opt_string(row, 8)?,
        created_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

/// Input for a new strategy version.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStrategy {
    pub target_customer: String,
    #[serde(default)]
    pub problems_solved: Vec<String>,
    #[serde(default)]
    pub problems_not_solved: Vec<String>,
    #[serde(default)]
    pub strategic_keywords: Vec<StrategicKeyword>,
}

fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl NewStrategy {
    fn validate(&self) -> Result<(), DatabaseError> {
        if self.target_customer.trim().is_empty() {
            return Err(DatabaseError::Validation("target_customer must not be empty".into()));
        }
        for kw in &self.strategic_keywords {
            if kw.keyword.trim().is_empty() {
                return Err(DatabaseError::Validation("strategic keyword must not be empty".into()));
            }
            if !(-1.0..=1.0).contains(&kw.weight) {
                return Err(DatabaseError::Validation(format!(
                    "weight {} for keyword '{}' outside [-1, 1]",
                    kw.weight, kw.keyword
                )));
            }
        }
        Ok(())
    }

    fn keywords(&self) -> Vec<StrategicKeyword> {
        self.strategic_keywords
            .iter()
            .map(|kw| StrategicKeyword {
                keyword: kw.keyword.trim().to_string(),
                weight: kw.weight,
                reasoning: kw.reasoning.trim().to_string(),
            })
            .collect()
    }
}

impl BeaconService {
    /// Store a new strategy version and make it the active one.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for an empty target customer or a
    /// keyword weight outside `[-1, 1]`.
    pub async fn create_strategy(&self, input: &NewStrategy) -> Result<ProductStrategy, DatabaseError> {
        input.validate()?;
        let company_id = self.company_id()?.to_string();
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_STRATEGY).await?;

        let strategy = ProductStrategy {
            id,
            company_id,
            version: 0,
            is_active: true,
            target_customer: input.target_customer.trim().to_string(),
            problems_solved: clean_list(&input.problems_solved),
            problems_not_solved: clean_list(&input.problems_not_solved),
            strategic_keywords: input.keywords(),
            created_by: self.actor_id().map(String::from),
            created_at: now,
        };

        let guard = self.db().lock_transaction().await;
        let tx = self.db().conn().transaction().await?;
        let version = match insert_version(&tx, &strategy).await {
            Ok(version) => {
                tx.commit().await?;
                version
            }
            Err(e) => {
                tx.rollback().await?;
                return Err(e);
            }
        };
        drop(guard);

        self.audit_simple(EntityType::Strategy, &strategy.id, AuditAction::Created)
            .await?;
        info!(company_id = %strategy.company_id, version, "strategy version activated");

        Ok(ProductStrategy { version, ..strategy })
    }

    /// The active strategy, if one has been configured.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn current_strategy(&self) -> Result<Option<ProductStrategy>, DatabaseError> {
        let company_id = self.company_id()?;
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT {SELECT_COLS} FROM product_strategies
                     WHERE company_id = ?1 AND is_active = 1"
                ),
                || [company_id],
            )
            .await?;
        rows.next().await?.map(|row| row_to_strategy(&row)).transpose()
    }

    /// Every version, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn strategy_history(&self) -> Result<Vec<ProductStrategy>, DatabaseError> {
        let company_id = self.company_id()?;
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT {SELECT_COLS} FROM product_strategies
                     WHERE company_id = ?1 ORDER BY version DESC"
                ),
                || [company_id],
            )
            .await?;
        let mut versions = Vec::new();
        while let Some(row) = rows.next().await? {
            versions.push(row_to_strategy(&row)?);
        }
        Ok(versions)
    }
}

async fn insert_version(tx: &libsql::Transaction, strategy: &ProductStrategy) -> Result<u32, DatabaseError> {
    let mut rows = tx
        .query(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM product_strategies WHERE company_id = ?1",
            [strategy.company_id.as_str()],
        )
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    let version = get_u32(&row, 0)?;
    drop(rows);

    tx.execute(
        "UPDATE product_strategies SET is_active = 0 WHERE company_id = ?1 AND is_active = 1",
        [strategy.company_id.as_str()],
    )
    .await?;

    tx.execute(
        &format!(
            "INSERT INTO product_strategies ({SELECT_COLS})
             VALUES (?1, ?2, ?3, 1, ?4, ?5, ?6, ?7, ?8, ?9)"
        ),
        libsql::params![
            strategy.id.as_str(),
            strategy.company_id.as_str(),
            i64::from(version),
            strategy.target_customer.as_str(),
            to_json_text(&strategy.problems_solved)?,
            to_json_text(&strategy.problems_not_solved)?,
            to_json_text(&strategy.strategic_keywords)?,
            strategy.created_by.as_deref(),
            strategy.created_at.to_rfc3339()
        ],
    )
    .await?;
    Ok(version)
}
