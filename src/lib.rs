//! `mailcases`: group flat message streams into cases.
//!
//! Records are clustered one at a time: an explicit `In-Reply-To` reference
//! wins, otherwise a shared actor within a day window, otherwise the record
//! starts a new case. The finished collection feeds median statistics,
//! label-quality scores, and flat event logs for process mining.

pub mod cluster;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod stats;
