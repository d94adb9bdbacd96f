//! # beacon-config
//!
//! Layered configuration loading for Beacon using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`BEACON_*` prefix, `__` as separator)
//! 2. Project-level `.beacon/config.toml`
//! 3. User-level `~/.config/beacon/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `BEACON_AUTH__JWT_SECRET` -> `auth.jwt_secret`,
//! `BEACON_SCORING__ALIGNMENT__KEYWORD_SCALE` -> `scoring.alignment.keyword_scale`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use beacon_config::BeaconConfig;
//!
//! let config = BeaconConfig::load_with_dotenv().expect("config");
//! config.validate().expect("valid config");
//!
//! if config.analysis.is_configured() {
//!     println!("AI endpoint: {}", config.analysis.endpoint);
//! }
//! ```

mod analysis;
mod auth;
mod database;
mod error;
mod general;
mod server;

pub use analysis::AnalysisConfig;
pub use auth::AuthConfig;
pub use beacon_scoring::ScoringParams;
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use server::ServerConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding the project-local config file and the default database.
pub const PROJECT_DIR: &str = ".beacon";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BeaconConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub scoring: ScoringParams,
}

impl BeaconConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` when a source cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load with the project-local layer read from `dir/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` when a source cannot be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        Self::figment_with_project_dir(dir)
            .extract()
            .map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` when a source cannot be parsed.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Build the figment provider chain.
    pub fn figment() -> Figment {
        Self::figment_with_project_dir(Path::new(PROJECT_DIR))
    }

    /// Provider chain with an explicit project config directory.
    pub fn figment_with_project_dir(dir: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        let local_path = dir.join("config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("BEACON_").split("__"))
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server
            .socket_addr()
            .map_err(|e| ConfigError::invalid("server.bind_addr", e.to_string()))?;
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "server.request_timeout_secs",
                "must be positive",
            ));
        }
        if self.database.path.is_empty() {
            return Err(ConfigError::invalid("database.path", "must not be empty"));
        }
        if self.general.default_limit == 0 {
            return Err(ConfigError::invalid("general.default_limit", "must be positive"));
        }
        for (field, days) in [
            ("general.health_cache_ttl_days", self.general.health_cache_ttl_days),
            ("general.survey_link_ttl_days", self.general.survey_link_ttl_days),
        ] {
            if !(1..=beacon_scoring::MAX_DAYS).contains(&days) {
                return Err(ConfigError::invalid(field, "must be between 1 and 36500"));
            }
        }
        self.scoring
            .validate()
            .map_err(|(field, reason)| ConfigError::InvalidValue { field, reason })
    }

    /// Fail unless bearer-token verification can run.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` when `auth.jwt_secret` is empty.
    pub fn require_auth(&self) -> Result<&AuthConfig, ConfigError> {
        if self.auth.is_configured() {
            Ok(&self.auth)
        } else {
            Err(ConfigError::NotConfigured {
                section: "auth".to_string(),
            })
        }
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("beacon").join("config.toml"))
    }

    /// Load `.env` from the workspace root.
    ///
    /// Walks up from `CARGO_MANIFEST_DIR` (if available) or the current dir.
    /// Silently does nothing if no `.env` is found.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            // crate -> crates/ -> workspace root
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = BeaconConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.auth.is_configured());
        assert!(!config.analysis.is_configured());
        assert_eq!(config.database.path, ".beacon/beacon.db");
    }

    #[test]
    fn require_auth_reports_section() {
        let err = BeaconConfig::default().require_auth().unwrap_err();
        assert!(matches!(err, ConfigError::NotConfigured { ref section } if section == "auth"));
    }

    #[test]
    fn invalid_bind_addr_is_rejected() {
        let mut config = BeaconConfig::default();
        config.server.bind_addr = "not an address".into();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "server.bind_addr"));
    }

    #[test]
    fn scoring_errors_surface_as_invalid_value() {
        let mut config = BeaconConfig::default();
        config.scoring.recommendation.high = 120;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field.starts_with("scoring.recommendation")));
    }

    #[test]
    fn oversized_cache_ttl_is_rejected() {
        let mut config = BeaconConfig::default();
        config.general.health_cache_ttl_days = 1_000_000_000_000_000;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "general.health_cache_ttl_days"));
    }

    #[test]
    fn oversized_health_window_is_rejected() {
        let mut config = BeaconConfig::default();
        config.scoring.health.window_days = 1_000_000_000_000_000;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "scoring.health.window_days"));
    }
}
