//! Roadmap initiative repository.

use chrono::Utc;
use serde::Deserialize;

use beacon_core::audit_detail::StatusChangedDetail;
use beacon_core::entities::Initiative;
use beacon_core::enums::{AuditAction, EntityType, InitiativeStatus, ThemeStatus, Timeline};
use beacon_core::ids::PREFIX_INITIATIVE;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, get_opt_u8, opt_value, parse_datetime, parse_enum};
use crate::service::BeaconService;
use crate::updates::initiative::InitiativeUpdate;

const SELECT_COLS: &str = "id, company_id, theme_id, objective_id, title, description, timeline, \
     status, priority_score, owner, created_at, updated_at";

fn row_to_initiative(row: &libsql::Row) -> Result<Initiative, DatabaseError> {
    Ok(Initiative {
        id: row.get(0)?,
        company_id: row.get(1)?,
        theme_id: get_opt_string(row, 2)?,
        objective_id: get_opt_string(row, 3)?,
        title: row.get(4)?,
        description: get_opt_string(row, 5)?,
        timeline: parse_enum(&row.get::<String>(6)?)?,
        status: parse_enum(&row.get::<String>(7)?)?,
        priority_score: get_opt_u8(row, 8)?,
        owner: get_opt_string(row, 9)?,
        created_at: parse_datetime(&row.get::<String>(10)?)?,
        updated_at: parse_datetime(&row.get::<String>(11)?)?,
    })
}

const fn default_timeline() -> Timeline {
    Timeline::Later
}

/// Input for creating an initiative, optionally from an approved theme.
#[derive(Debug, Clone, Deserialize)]
pub struct NewInitiative {
    #[serde(default)]
    pub theme_id: Option<String>,
    #[serde(default)]
    pub objective_id: Option<String>,
    /// Defaults to the theme's title when created from a theme.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_timeline")]
    pub timeline: Timeline,
    #[serde(default)]
    pub owner: Option<String>,
}

impl Default for NewInitiative {
    fn default() -> Self {
        Self {
            theme_id: None,
            objective_id: None,
            title: None,
            description: None,
            timeline: default_timeline(),
            owner: None,
        }
    }
}

/// Filter criteria for initiative listing.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct InitiativeFilter {
    pub status: Option<InitiativeStatus>,
    pub timeline: Option<Timeline>,
    pub limit: Option<u32>,
}

impl BeaconService {
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` when the source theme is not
    /// approved, `DatabaseError::Validation` when no title can be resolved,
    /// or `DatabaseError::NotFound` for an unknown theme or objective.
    pub async fn create_initiative(&self, input: &NewInitiative) -> Result<Initiative, DatabaseError> {
        let company_id = self.company_id()?.to_string();

        let theme = match input.theme_id {
            Some(ref theme_id) => {
                let theme = self.get_theme(theme_id).await?;
                if theme.status != ThemeStatus::Approved {
                    return Err(DatabaseError::InvalidState(format!(
                        "theme {theme_id} is {} and must be approved first",
                        theme.status
                    )));
                }
                Some(theme)
            }
            None => None,
        };
        if let Some(ref objective_id) = input.objective_id {
            self.get_objective(objective_id).await?;
        }

        let title = input
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or_else(|| theme.as_ref().map(|t| t.title.as_str()))
            .ok_or_else(|| DatabaseError::Validation("initiative title must not be empty".into()))?
            .to_string();
        let priority_score = theme.as_ref().and_then(|t| t.final_priority_score);
        let description = input
            .description
            .clone()
            .or_else(|| theme.as_ref().and_then(|t| t.description.clone()));

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_INITIATIVE).await?;
        self.db()
            .execute_with(
                &format!(
                    "INSERT INTO initiatives ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'planned', ?8, ?9, ?10, ?10)"
                ),
                || {
                    libsql::params![
                        id.as_str(),
                        company_id.as_str(),
                        input.theme_id.as_deref(),
                        input.objective_id.as_deref(),
                        title.as_str(),
                        description.as_deref(),
                        input.timeline.as_str(),
                        priority_score.map(i64::from),
                        input.owner.as_deref(),
                        now.to_rfc3339()
                    ]
                },
            )
            .await?;

        self.audit_simple(EntityType::Initiative, &id, AuditAction::Created)
            .await?;

        Ok(Initiative {
            id,
            company_id,
            theme_id: input.theme_id.clone(),
            objective_id: input.objective_id.clone(),
            title,
            description,
            timeline: input.timeline,
            status: InitiativeStatus::Planned,
            priority_score,
            owner: input.owner.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the initiative is not in the scoped company.
    pub async fn get_initiative(&self, id: &str) -> Result<Initiative, DatabaseError> {
        let company_id = self.company_id()?;
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {SELECT_COLS} FROM initiatives WHERE id = ?1 AND company_id = ?2"),
                || [id, company_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("initiative", id))?;
        row_to_initiative(&row)
    }

    /// Grouped by timeline (now, next, later), then by priority.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_initiatives(&self, filter: &InitiativeFilter) -> Result<Vec<Initiative>, DatabaseError> {
        let mut conditions = vec!["company_id = ?1".to_string()];
        let mut params: Vec<libsql::Value> = vec![self.company_id()?.into()];

        if let Some(status) = filter.status {
            params.push(status.as_str().into());
            conditions.push(format!("status = ?{}", params.len()));
        }
        if let Some(timeline) = filter.timeline {
            params.push(timeline.as_str().into());
            conditions.push(format!("timeline = ?{}", params.len()));
        }

        let limit = self.limit(filter.limit);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM initiatives WHERE {}
             ORDER BY CASE timeline WHEN 'now' THEN 0 WHEN 'next' THEN 1 ELSE 2 END,
                      priority_score IS NULL, priority_score DESC, created_at
             LIMIT {limit}",
            conditions.join(" AND ")
        );
        let mut rows = self
            .db()
            .query_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        let mut initiatives = Vec::new();
        while let Some(row) = rows.next().await? {
            initiatives.push(row_to_initiative(&row)?);
        }
        Ok(initiatives)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` for a disallowed status change,
    /// `DatabaseError::Validation` for an empty title, or `DatabaseError::NotFound`.
    pub async fn update_initiative(
        &self,
        initiative_id: &str,
        update: InitiativeUpdate,
    ) -> Result<Initiative, DatabaseError> {
        let current = self.get_initiative(initiative_id).await?;
        let company_id = self.company_id()?.to_string();
        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref title) = update.title {
            if title.trim().is_empty() {
                return Err(DatabaseError::Validation("initiative title must not be empty".into()));
            }
            params.push(title.trim().into());
            sets.push(format!("title = ?{}", params.len()));
        }
        if let Some(ref description) = update.description {
            params.push(opt_value(description.as_deref()));
            sets.push(format!("description = ?{}", params.len()));
        }
        if let Some(ref owner) = update.owner {
            params.push(opt_value(owner.as_deref()));
            sets.push(format!("owner = ?{}", params.len()));
        }
        if let Some(ref objective_id) = update.objective_id {
            if let Some(id) = objective_id {
                self.get_objective(id).await?;
            }
            params.push(opt_value(objective_id.as_deref()));
            sets.push(format!("objective_id = ?{}", params.len()));
        }
        if let Some(timeline) = update.timeline {
            params.push(timeline.as_str().into());
            sets.push(format!("timeline = ?{}", params.len()));
        }
        if let Some(status) = update.status
            && status != current.status
        {
            if !current.status.can_transition_to(status) {
                return Err(DatabaseError::InvalidState(format!(
                    "cannot move initiative from {} to {status}",
                    current.status
                )));
            }
            params.push(status.as_str().into());
            sets.push(format!("status = ?{}", params.len()));
        }

        if sets.is_empty() {
            return Ok(current);
        }

        params.push(Utc::now().to_rfc3339().into());
        sets.push(format!("updated_at = ?{}", params.len()));
        params.push(initiative_id.into());
        let id_idx = params.len();
        params.push(company_id.into());
        let company_idx = params.len();

        let sql = format!(
            "UPDATE initiatives SET {} WHERE id = ?{id_idx} AND company_id = ?{company_idx}",
            sets.join(", ")
        );
        self.db()
            .execute_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;

        self.audit_detail(EntityType::Initiative, initiative_id, AuditAction::Updated, &update)
            .await?;
        self.get_initiative(initiative_id).await
    }

    /// Move an initiative to another roadmap bucket.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown initiative.
    pub async fn set_initiative_timeline(
        &self,
        initiative_id: &str,
        timeline: Timeline,
    ) -> Result<Initiative, DatabaseError> {
        let company_id = self.company_id()?;
        let now = Utc::now().to_rfc3339();
        let changed = self
            .db()
            .execute_with(
                "UPDATE initiatives SET timeline = ?1, updated_at = ?2 WHERE id = ?3 AND company_id = ?4",
                || libsql::params![timeline.as_str(), now.as_str(), initiative_id, company_id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("initiative", initiative_id));
        }
        self.audit_detail(
            EntityType::Initiative,
            initiative_id,
            AuditAction::Updated,
            &serde_json::json!({ "timeline": timeline }),
        )
        .await?;
        self.get_initiative(initiative_id).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` when the state machine forbids
    /// the move, or `DatabaseError::NotFound`.
    pub async fn transition_initiative(
        &self,
        initiative_id: &str,
        next: InitiativeStatus,
        reason: Option<&str>,
    ) -> Result<Initiative, DatabaseError> {
        let current = self.get_initiative(initiative_id).await?;
        if !current.status.can_transition_to(next) {
            return Err(DatabaseError::InvalidState(format!(
                "cannot move initiative from {} to {next}",
                current.status
            )));
        }
        let company_id = self.company_id()?;
        let now = Utc::now().to_rfc3339();
        self.db()
            .execute_with(
                "UPDATE initiatives SET status = ?1, updated_at = ?2 WHERE id = ?3 AND company_id = ?4",
                || libsql::params![next.as_str(), now.as_str(), initiative_id, company_id],
            )
            .await?;
        self.audit_detail(
            EntityType::Initiative,
            initiative_id,
            AuditAction::StatusChanged,
            &StatusChangedDetail {
                from: current.status.to_string(),
                to: next.to_string(),
                reason: reason.map(String::from),
            },
        )
        .await?;
        self.get_initiative(initiative_id).await
    }
}
