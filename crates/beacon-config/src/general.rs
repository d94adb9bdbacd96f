//! General application configuration.

use serde::{Deserialize, Serialize};

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

/// Default result limit.
const fn default_limit() -> u32 {
    50
}

const fn default_health_cache_ttl_days() -> i64 {
    7
}

const fn default_survey_link_ttl_days() -> i64 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Base URL used when building public survey links.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Default result limit for list endpoints.
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    /// How long a computed customer health report stays fresh.
    #[serde(default = "default_health_cache_ttl_days")]
    pub health_cache_ttl_days: i64,

    /// Lifetime of a generated survey link.
    #[serde(default = "default_survey_link_ttl_days")]
    pub survey_link_ttl_days: i64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            public_base_url: default_public_base_url(),
            default_limit: default_limit(),
            health_cache_ttl_days: default_health_cache_ttl_days(),
            survey_link_ttl_days: default_survey_link_ttl_days(),
        }
    }
}
