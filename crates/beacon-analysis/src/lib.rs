//! # beacon-analysis
//!
//! Client for the external AI service that summarises feedback text and
//! scores its sentiment and priority. Beacon never runs the analysis itself;
//! it posts text and validates what comes back against the
//! [`AnalysisResult`](beacon_core::analysis::AnalysisResult) contract.

mod client;
mod error;
mod http;

pub use client::{AnalysisClient, AnalyzeFuture, Analyzer};
pub use error::AnalysisError;
