//! Error response types for the preference service
//!
//! - RFC 9457 Problem Details (`Problem`)
//! - Static error catalog entries (`ErrDef`)
#![forbid(unsafe_code)]

pub mod catalog;
pub mod problem;

pub use catalog::ErrDef;
pub use problem::{APPLICATION_PROBLEM_JSON, Problem, ValidationViolation};
