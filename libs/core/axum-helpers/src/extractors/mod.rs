//! Extractors that reject bad input with the standard [`ErrorResponse`](crate::ErrorResponse) body.

pub mod validated_json;
pub mod validated_query;

pub use validated_json::ValidatedJson;
pub use validated_query::ValidatedQuery;
