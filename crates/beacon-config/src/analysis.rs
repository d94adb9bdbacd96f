//! External AI analysis service configuration.

use serde::{Deserialize, Serialize};

const fn default_timeout_secs() -> u64 {
    20
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// Full URL of the analysis endpoint.
    #[serde(default)]
    pub endpoint: String,

    /// Sent as a bearer token when non-empty.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Model hint forwarded to the service.
    #[serde(default)]
    pub model: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            model: None,
        }
    }
}

impl AnalysisConfig {
    pub fn is_configured(&self) -> bool {
        !self.endpoint.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = AnalysisConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.timeout_secs, 20);
        assert!(config.model.is_none());
    }
}
