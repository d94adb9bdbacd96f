//! Service layer orchestrating scoped database access with audit.
//!
//! `BeaconService` wraps `BeaconDb` together with the runtime settings the
//! repositories need and an optional company scope. All repo methods are
//! implemented as `impl BeaconService` blocks in [`crate::repos`].

use std::sync::Arc;

use beacon_config::BeaconConfig;
use beacon_core::identity::AdminIdentity;
use beacon_scoring::ScoringParams;

use crate::BeaconDb;
use crate::error::DatabaseError;

/// Settings consumed by repository methods.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub scoring: ScoringParams,
    pub health_cache_ttl_days: i64,
    pub survey_link_ttl_days: i64,
    pub public_base_url: String,
    pub default_limit: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from_config(&BeaconConfig::default())
    }
}

impl ServiceSettings {
    #[must_use]
    pub fn from_config(config: &BeaconConfig) -> Self {
        Self {
            scoring: config.scoring.clone(),
            health_cache_ttl_days: config.general.health_cache_ttl_days,
            survey_link_ttl_days: config.general.survey_link_ttl_days,
            public_base_url: config.general.public_base_url.trim_end_matches('/').to_string(),
            default_limit: config.general.default_limit,
        }
    }
}

/// Whose data a service instance may touch.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope {
    /// No company. Only public and bootstrap operations are allowed.
    None,
    /// An authenticated admin acting within their company.
    Admin(AdminIdentity),
    /// A system job (CLI batch command) acting within one company.
    System { company_id: String },
}

/// Orchestrates database access with company scoping and audit.
///
/// Every mutation method:
/// 1. Resolves the caller's company from the scope
/// 2. Executes SQL constrained by `company_id`
/// 3. Appends an audit entry attributed to the caller
///
/// Cloning is cheap; scoped views share the same connection.
#[derive(Clone)]
pub struct BeaconService {
    db: Arc<BeaconDb>,
    settings: Arc<ServiceSettings>,
    scope: Scope,
}

impl BeaconService {
    /// Open a local database and wrap it in an unscoped service.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn open_local(path: &str, settings: ServiceSettings) -> Result<Self, DatabaseError> {
        let db = BeaconDb::open_local(path).await?;
        Ok(Self::new(db, settings))
    }

    #[must_use]
    pub fn new(db: BeaconDb, settings: ServiceSettings) -> Self {
        Self {
            db: Arc::new(db),
            settings: Arc::new(settings),
            scope: Scope::None,
        }
    }

    /// A view scoped to an authenticated admin's company.
    #[must_use]
    pub fn for_identity(&self, identity: AdminIdentity) -> Self {
        Self {
            db: Arc::clone(&self.db),
            settings: Arc::clone(&self.settings),
            scope: Scope::Admin(identity),
        }
    }

    /// A view scoped to one company with no acting admin.
    #[must_use]
    pub fn for_company(&self, company_id: impl Into<String>) -> Self {
        Self {
            db: Arc::clone(&self.db),
            settings: Arc::clone(&self.settings),
            scope: Scope::System {
                company_id: company_id.into(),
            },
        }
    }

    /// A view with no company scope.
    #[must_use]
    pub fn unscoped(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            settings: Arc::clone(&self.settings),
            scope: Scope::None,
        }
    }

    /// The same scope over the same connection with different settings.
    #[cfg(test)]
    pub(crate) fn with_settings(&self, settings: ServiceSettings) -> Self {
        Self {
            db: Arc::clone(&self.db),
            settings: Arc::new(settings),
            scope: self.scope.clone(),
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub fn db(&self) -> &BeaconDb {
        &self.db
    }

    #[must_use]
    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// The authenticated admin, when scoped to one.
    #[must_use]
    pub fn identity(&self) -> Option<&AdminIdentity> {
        match &self.scope {
            Scope::Admin(identity) => Some(identity),
            _ => None,
        }
    }

    /// The company every query is constrained to.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Unscoped` for an unscoped service.
    pub fn company_id(&self) -> Result<&str, DatabaseError> {
        match &self.scope {
            Scope::Admin(identity) => Ok(&identity.company_id),
            Scope::System { company_id } => Ok(company_id),
            Scope::None => Err(DatabaseError::Unscoped),
        }
    }

    /// Admin user recorded as the actor in audit entries.
    #[must_use]
    pub fn actor_id(&self) -> Option<&str> {
        self.identity().map(|i| i.user_id.as_str())
    }

    /// Resolve a caller-supplied limit against the configured default.
    #[must_use]
    pub fn limit(&self, requested: Option<u32>) -> u32 {
        requested
            .filter(|l| *l > 0)
            .unwrap_or(self.settings.default_limit)
            .min(500)
    }
}
