//! Threshold classification of scorer output and human-readable reasons for
//! flagged rows.

mod engine;
mod explain;

pub use engine::{classify, AnomalyClassifier, ScoredResult};
pub use explain::{explain, format_amount};
pub(crate) use explain::group_digits;
