//! Repository methods on [`BeaconService`](crate::service::BeaconService).
//!
//! Each module adds methods via `impl BeaconService` blocks. Every query is
//! constrained to the caller's company and every mutation is audited.

pub mod audit;
pub mod company;
pub mod customer;
pub mod discovery;
pub mod feedback;
pub mod health;
pub mod initiative;
pub mod objective;
pub mod scoring;
pub mod strategy;
pub mod survey;
pub mod theme;
