//! MongoDB implementation of PromoRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc},
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
};
use tracing::instrument;

use crate::error::{PromoError, PromoResult};
use crate::models::{Event, EventFilter};
use crate::repository::PromoRepository;

/// Collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "events";

const DUPLICATE_KEY: i32 = 11000;

/// MongoDB-backed event store
#[derive(Clone)]
pub struct MongoPromoRepository {
    collection: Collection<Event>,
}

impl MongoPromoRepository {
    /// ```ignore
    /// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
    /// let repo = MongoPromoRepository::new(&client.database("safepromo"));
    /// repo.create_indexes().await?;
    /// ```
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, DEFAULT_COLLECTION)
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<Event>(collection_name),
        }
    }

    pub fn collection(&self) -> &Collection<Event> {
        &self.collection
    }

    /// Unique index on `promo_code`, plus indexes backing the list queries.
    pub async fn create_indexes(&self) -> PromoResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "promo_code": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("promo_code_unique".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "is_enabled": 1, "created_at": 1 })
                .build(),
            IndexModel::builder().keys(doc! { "created_at": 1 }).build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!(collection = %self.collection.name(), "Promo indexes ensured");
        Ok(())
    }

    fn build_filter(filter: &EventFilter) -> Document {
        let mut doc = doc! {};
        if let Some(enabled) = filter.is_enabled {
            doc.insert("is_enabled", enabled);
        }
        doc
    }

    /// Guard for consuming a ride: enabled and still below the allowance
    fn redeemable_filter(code: &str) -> Document {
        doc! {
            "promo_code": code,
            "is_enabled": true,
            "$expr": { "$lt": ["$current_ride_count", "$number_of_rides_allowed"] },
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY,
        _ => false,
    }
}

#[async_trait]
impl PromoRepository for MongoPromoRepository {
    #[instrument(skip(self, event), fields(event_id = %event.id, promo_code = %event.promo_code))]
    async fn insert(&self, event: &Event) -> PromoResult<()> {
        match self.collection.insert_one(event).await {
            Ok(_) => {
                tracing::info!("Event stored");
                Ok(())
            }
            Err(e) if is_duplicate_key(&e) => Err(PromoError::DuplicateCode(event.promo_code.clone())),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn find_by_code(&self, promo_code: &str) -> PromoResult<Vec<Event>> {
        let cursor = self
            .collection
            .find(doc! { "promo_code": promo_code })
            .limit(2)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: EventFilter) -> PromoResult<Vec<Event>> {
        let cursor = self
            .collection
            .find(Self::build_filter(&filter))
            .sort(doc! { "created_at": 1, "_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self))]
    async fn set_enabled(&self, promo_code: &str, enabled: bool) -> PromoResult<u64> {
        let result = self
            .collection
            .update_one(
                doc! { "promo_code": promo_code },
                doc! { "$set": { "is_enabled": enabled } },
            )
            .await?;

        tracing::info!(matched = result.matched_count, enabled, "Promo code state updated");
        Ok(result.matched_count)
    }

    #[instrument(skip(self))]
    async fn increment_ride_count(&self, promo_code: &str) -> PromoResult<Option<Event>> {
        let updated = self
            .collection
            .find_one_and_update(
                Self::redeemable_filter(promo_code),
                doc! { "$inc": { "current_ride_count": 1 } },
            )
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_empty() {
        assert!(MongoPromoRepository::build_filter(&EventFilter::default()).is_empty());
    }

    #[test]
    fn test_build_filter_active() {
        let doc = MongoPromoRepository::build_filter(&EventFilter::active());
        assert!(doc.get_bool("is_enabled").unwrap());
    }

    #[test]
    fn test_redeemable_filter_guards_allowance() {
        let doc = MongoPromoRepository::redeemable_filter("abc");
        assert_eq!(doc.get_str("promo_code").unwrap(), "abc");
        assert!(doc.get_bool("is_enabled").unwrap());
        assert!(doc.contains_key("$expr"));
    }
}
