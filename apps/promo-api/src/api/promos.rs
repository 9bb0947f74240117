//! Wires the promos domain to HTTP routes.

use axum::Router;
use domain_promos::{MongoPromoRepository, PromoService, handlers};
use mongodb::Database;

use crate::state::AppState;

pub fn repository(db: &Database, collection: &str) -> MongoPromoRepository {
    MongoPromoRepository::with_collection(db, collection)
}

/// Create the unique promo code index and the listing indexes.
pub async fn init_indexes(db: &Database, collection: &str) -> eyre::Result<()> {
    repository(db, collection).create_indexes().await?;
    tracing::info!(collection, "Promo indexes ensured");
    Ok(())
}

pub fn router(state: &AppState) -> Router {
    let repository = repository(&state.db, &state.config.events_collection);
    handlers::router(PromoService::new(repository))
}
