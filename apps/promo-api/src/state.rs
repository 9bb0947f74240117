//! Shared application state, built once in `main` and passed to the routers.

use mongodb::{Client, Database};

#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// Pooled client; clones share connections
    pub mongo_client: Client,
    pub db: Database,
}
