//! Case formation: the collection of cases and the engine that fills it.

pub mod collection;
pub mod engine;

pub use collection::CaseCollection;
pub use engine::{AssignReason, Assignment, CaseEngine};
