//! Core data model types: records, cases, and label state.

pub mod case;
pub mod label;
pub mod record;
