//! Shared utilities: duration parsing and command line validation.

pub mod duration;
pub mod validation;

pub use duration::parse_duration;
pub use validation::{check_reachability, validate_score_range};
