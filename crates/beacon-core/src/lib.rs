//! # beacon-core
//!
//! Core types, ID prefixes, and error types for Beacon.
//!
//! This crate provides the foundational types shared across all Beacon crates:
//! - Entity structs for all domain objects (customers, feedback, themes, strategy, etc.)
//! - Status enums with state machine transitions
//! - ID prefix constants
//! - Cross-cutting error types
//! - The AI analysis contract consumed from the external analysis service
//! - API response types
//! - Audit detail sub-types

pub mod analysis;
pub mod audit_detail;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod ids;
pub mod responses;
