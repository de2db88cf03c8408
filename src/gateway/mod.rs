//! Gateway module - request dispatch, context retrieval and provider health aggregation

pub mod dispatcher;
pub mod health_check;
pub mod retrieval;

pub use dispatcher::{ChatRequest, ChatResult, Dispatcher};
pub use health_check::{AvailabilityMap, HealthAggregator};
pub use retrieval::ContextRetriever;
