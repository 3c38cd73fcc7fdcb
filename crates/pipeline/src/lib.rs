//! Pure candidate-pipeline logic shared by the store service and the board
//! controller: aggregation, the search/filter predicate, and form validation.

pub mod analytics;
pub mod filter;
pub mod validation;

pub use analytics::compute_analytics;
pub use filter::{distinct_roles, CandidateFilter};
pub use validation::validate;
