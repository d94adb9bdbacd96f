//! Bearer token verification settings.

use serde::{Deserialize, Serialize};

const fn default_leeway_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the identity provider.
    #[serde(default)]
    pub jwt_secret: String,

    /// Expected `iss` claim. Not checked when empty.
    #[serde(default)]
    pub issuer: String,

    /// Expected `aud` claim. Not checked when empty.
    #[serde(default)]
    pub audience: String,

    /// Clock skew tolerance for `exp`, in seconds.
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            issuer: String::new(),
            audience: String::new(),
            leeway_secs: default_leeway_secs(),
        }
    }
}

impl AuthConfig {
    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = AuthConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.leeway_secs, 30);
    }

    #[test]
    fn configured_when_secret_set() {
        let config = AuthConfig {
            jwt_secret: "super-secret".into(),
            ..Default::default()
        };
        assert!(config.is_configured());
    }
}
