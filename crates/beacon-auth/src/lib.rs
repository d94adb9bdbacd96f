//! # beacon-auth
//!
//! Verifies the bearer tokens issued by the identity provider in front of
//! the admin dashboard. Tokens are HS256 JWTs; the `sub` claim is the
//! identity-provider user ID that admin rows are keyed by.
//!
//! Login flows and token issuance happen outside Beacon.

pub mod claims;
pub mod error;
pub mod verifier;

pub use claims::AuthClaims;
pub use error::AuthError;
pub use verifier::{TokenVerifier, bearer_token};
