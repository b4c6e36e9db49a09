//! Export: event-log and debug-log projections and their file writers.

pub mod csv;
pub mod projection;
