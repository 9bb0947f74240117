use async_trait::async_trait;

use crate::error::PromoResult;
use crate::models::{Event, EventFilter};

/// Persistence interface for events and their promo codes.
///
/// Implementations never cache; every call reflects stored state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PromoRepository: Send + Sync {
    /// Insert a new event.
    ///
    /// Fails with `PromoError::DuplicateCode` when the promo code is taken.
    async fn insert(&self, event: &Event) -> PromoResult<()>;

    /// Every event whose code equals `code`; more than one is a broken invariant.
    async fn find_by_code(&self, code: &str) -> PromoResult<Vec<Event>>;

    /// Events matching `filter`, oldest first.
    async fn list(&self, filter: EventFilter) -> PromoResult<Vec<Event>>;

    /// Set `is_enabled`; returns how many records matched `code`.
    async fn set_enabled(&self, code: &str, enabled: bool) -> PromoResult<u64>;

    /// Consume one ride if the code is enabled and below its allowance.
    ///
    /// Returns the updated event, or `None` when nothing matched the guard.
    async fn increment_ride_count(&self, code: &str) -> PromoResult<Option<Event>>;
}
