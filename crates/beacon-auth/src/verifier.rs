//! HS256 token verification.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use beacon_config::AuthConfig;

use crate::claims::AuthClaims;
use crate::error::AuthError;

/// Extract the token from an `Authorization` header value.
///
/// # Errors
///
/// Returns `AuthError::MissingToken` when the header is absent, uses another
/// scheme, or carries an empty token.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingToken)?.trim();
    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingToken);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Verifies admin bearer tokens against a shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Build a verifier from the `[auth]` config section.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotConfigured` when no secret is set.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        if !config.is_configured() {
            return Err(AuthError::NotConfigured);
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        if config.issuer.is_empty() {
            validation.iss = None;
        } else {
            validation.set_issuer(&[config.issuer.as_str()]);
        }
        if config.audience.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&[config.audience.as_str()]);
        }
        Ok(Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        })
    }

    /// Check signature, expiry, and the configured issuer and audience.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` for an expired token and
    /// `AuthError::InvalidToken` for anything else that fails validation.
    pub fn verify(&self, token: &str) -> Result<AuthClaims, AuthError> {
        let data = decode::<AuthClaims>(token, &self.key, &self.validation)?;
        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("empty subject".into()));
        }
        debug!(sub = %data.claims.sub, "token verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde::Serialize;

    const SECRET: &str = "test-secret-with-enough-length";

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        email: &'a str,
        exp: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        iss: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        aud: Option<&'a str>,
    }

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: SECRET.into(),
            ..Default::default()
        }
    }

    fn token(secret: &str, exp_offset: i64, iss: Option<&str>, aud: Option<&str>) -> String {
        let claims = TestClaims {
            sub: "auth|owner",
            email: "owner@acme.test",
            exp: Utc::now().timestamp() + exp_offset,
            iss,
            aud,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn valid_token_yields_claims() {
        let verifier = TokenVerifier::from_config(&config()).unwrap();
        let claims = verifier.verify(&token(SECRET, 3600, None, None)).unwrap();
        assert_eq!(claims.sub, "auth|owner");
        assert_eq!(claims.email.as_deref(), Some("owner@acme.test"));
    }

    #[test]
    fn expired_token_is_reported() {
        let verifier = TokenVerifier::from_config(&config()).unwrap();
        let err = verifier.verify(&token(SECRET, -3600, None, None)).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn leeway_accepts_recent_expiry() {
        let verifier = TokenVerifier::from_config(&config()).unwrap();
        assert!(verifier.verify(&token(SECRET, -5, None, None)).is_ok());
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let verifier = TokenVerifier::from_config(&config()).unwrap();
        let err = verifier
            .verify(&token("another-secret-entirely", 3600, None, None))
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn issuer_and_audience_are_checked_when_configured() {
        let verifier = TokenVerifier::from_config(&AuthConfig {
            issuer: "https://id.acme.test".into(),
            audience: "beacon".into(),
            ..config()
        })
        .unwrap();
        assert!(
            verifier
                .verify(&token(SECRET, 3600, Some("https://id.acme.test"), Some("beacon")))
                .is_ok()
        );
        assert!(
            verifier
                .verify(&token(SECRET, 3600, Some("https://evil.test"), Some("beacon")))
                .is_err()
        );
        assert!(
            verifier
                .verify(&token(SECRET, 3600, Some("https://id.acme.test"), Some("other")))
                .is_err()
        );
    }

    #[test]
    fn unconfigured_secret_is_rejected() {
        let err = TokenVerifier::from_config(&AuthConfig::default()).unwrap_err();
        assert!(matches!(err, AuthError::NotConfigured));
    }

    #[rstest]
    #[case(Some("Bearer abc.def"), Some("abc.def"))]
    #[case(Some("bearer   abc.def "), Some("abc.def"))]
    #[case(Some("Basic dXNlcg=="), None)]
    #[case(Some("Bearer "), None)]
    #[case(Some("abc.def"), None)]
    #[case(None, None)]
    fn bearer_extraction(#[case] header: Option<&str>, #[case] expected: Option<&str>) {
        assert_eq!(bearer_token(header).ok(), expected);
    }
}
