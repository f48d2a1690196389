//! Record quality validators
//!
//! # Validators
//! 1. **completeness_scorer** - weighted completeness score used to pick the
//!    keeper among duplicate records

pub mod completeness_scorer;

pub use completeness_scorer::{CompletenessScore, CompletenessScorer};
