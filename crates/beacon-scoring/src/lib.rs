//! # beacon-scoring
//!
//! Rule-based scoring heuristics for Beacon:
//! - [`alignment`]: score a theme against the active product strategy
//! - [`recommendation`]: bucket (signal, alignment) pairs into recommendations
//! - [`health`]: customer health and churn risk from feedback history
//! - [`discovery`]: group tagged feedback into candidate themes by tag co-occurrence
//!
//! Every threshold and point value lives in a parameter table in [`params`] so
//! it can be reviewed and overridden through configuration.
//!
//! The crate is pure: no I/O, no clock reads. Callers pass `now` explicitly.

pub mod alignment;
pub mod discovery;
pub mod error;
pub mod health;
pub mod params;
pub mod recommendation;
pub mod text;

pub use alignment::{AlignmentOutcome, KeywordMatch, StrategyProfile, ThemeSignal, score_alignment};
pub use discovery::{CandidateTheme, DiscoveryItem, discover_themes};
pub use error::{ScoringError, require_active_strategy};
pub use health::{HealthInput, SentimentPoint, compute_health};
pub use params::{
    AlignmentParams, DiscoveryParams, HealthParams, MAX_DAYS, RecommendationThresholds,
    ScoringParams,
};
pub use recommendation::recommend;
