//! MongoDB connection management
//!
//! Config, connect-with-retry, and a ping-based health probe.

mod config;
mod connector;
mod health;

pub use config::{DEFAULT_DATABASE, DEFAULT_MONGO_URL, MongoConfig};
pub use connector::{
    MongoError, client_options, connect_from_config, connect_from_config_with_retry,
};
pub use health::{HealthStatus, check_health_detailed};

// Re-export MongoDB types for convenience
pub use mongodb::{Client, Collection, Database};
