//! Readers for the tabular inputs: the message export and detected labels.

pub mod input;
pub mod labels;
pub mod table;
