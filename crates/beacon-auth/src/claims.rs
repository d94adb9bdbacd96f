use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Validated claims from an admin bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Identity-provider user ID.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiry as seconds since the Unix epoch.
    pub exp: u64,
}

impl AuthClaims {
    /// Expiry as a timestamp. `None` if `exp` is out of range.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.exp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_at_converts_epoch_seconds() {
        let claims = AuthClaims {
            sub: "auth|123".into(),
            email: None,
            exp: 1_800_000_000,
        };
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_800_000_000);
    }

    #[test]
    fn email_is_optional_on_the_wire() {
        let claims: AuthClaims = serde_json::from_str(r#"{"sub":"auth|1","exp":10}"#).unwrap();
        assert!(claims.email.is_none());
    }
}
