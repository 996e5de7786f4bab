//! # Domain Layer
//!
//! Pure types and validation with no I/O: the canonical filter record,
//! catalog rows and aggregates, credit status and subscription mirrors.

pub mod billing;
pub mod catalog;
pub mod credits;
pub mod errors;
pub mod filters;
