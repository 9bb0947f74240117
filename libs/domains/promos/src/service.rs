//! Promo service - business rules over the repository

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::error::{PromoError, PromoResult};
use crate::models::{Coordinate, CreateEvent, Event, EventFilter};
use crate::repository::PromoRepository;
use crate::validity::{self, Validity};

/// Attempts at finding an unused promo code before giving up
pub const MAX_CODE_ATTEMPTS: usize = 3;

pub struct PromoService<R: PromoRepository> {
    repository: Arc<R>,
}

impl<R: PromoRepository> PromoService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a disabled event with a fresh promo code.
    pub async fn create_event(&self, draft: CreateEvent) -> PromoResult<Event> {
        self.create_event_at(draft, Utc::now()).await
    }

    #[instrument(skip(self, draft), fields(event_name = %draft.name))]
    pub async fn create_event_at(&self, draft: CreateEvent, now: DateTime<Utc>) -> PromoResult<Event> {
        draft.validate()?;

        let mut event = Event::new(draft, now);
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            match self.repository.insert(&event).await {
                Ok(()) => {
                    tracing::info!(event_id = %event.id, promo_code = %event.promo_code, "Event created");
                    return Ok(event);
                }
                Err(PromoError::DuplicateCode(code)) => {
                    tracing::warn!(attempt, promo_code = %code, "Promo code collision, regenerating");
                    event.regenerate_code();
                }
                Err(e) => return Err(e),
            }
        }

        Err(PromoError::Internal(format!(
            "no unique promo code after {MAX_CODE_ATTEMPTS} attempts"
        )))
    }

    /// The single event holding `code`.
    #[instrument(skip(self))]
    pub async fn find_by_code(&self, code: &str) -> PromoResult<Event> {
        let mut matches = self.repository.find_by_code(code).await?;
        match matches.len() {
            0 => Err(PromoError::NotFound(code.to_string())),
            1 => Ok(matches.remove(0)),
            n => {
                tracing::error!(promo_code = %code, matches = n, "Promo code is not unique");
                Err(PromoError::Internal(format!(
                    "promo code '{code}' matches more than one event"
                )))
            }
        }
    }

    /// Every event, oldest first
    #[instrument(skip(self))]
    pub async fn list_events(&self) -> PromoResult<Vec<Event>> {
        self.repository.list(EventFilter::default()).await
    }

    /// Enabled events, oldest first
    #[instrument(skip(self))]
    pub async fn list_active_events(&self) -> PromoResult<Vec<Event>> {
        self.repository.list(EventFilter::active()).await
    }

    pub async fn activate(&self, code: &str) -> PromoResult<()> {
        self.activate_at(code, Utc::now()).await
    }

    /// Enable `code` unless its window no longer contains `now`.
    ///
    /// Works from the stored record, not any caller-held copy.
    #[instrument(skip(self))]
    pub async fn activate_at(&self, code: &str, now: DateTime<Utc>) -> PromoResult<()> {
        let event = self.find_by_code(code).await?;

        if event.is_expired(now) {
            tracing::info!(promo_code = %code, "Refusing to activate expired promo code");
            return Err(PromoError::Expired {
                code: code.to_string(),
                action: "activate",
            });
        }

        self.set_enabled(code, true).await
    }

    /// Disable `code`; no window check.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, code: &str) -> PromoResult<()> {
        self.set_enabled(code, false).await
    }

    async fn set_enabled(&self, code: &str, enabled: bool) -> PromoResult<()> {
        let matched = self.repository.set_enabled(code, enabled).await?;
        if matched == 0 {
            return Err(PromoError::NotFound(code.to_string()));
        }
        Ok(())
    }

    /// Evaluate `code` at `at` without changing anything.
    #[instrument(skip(self))]
    pub async fn check_validity(
        &self,
        code: &str,
        at: DateTime<Utc>,
        location: Option<Coordinate>,
    ) -> PromoResult<Validity> {
        let event = self.find_by_code(code).await?;
        Ok(validity::evaluate(&event, at, location))
    }

    pub async fn redeem(&self, code: &str, location: Option<Coordinate>) -> PromoResult<u32> {
        self.redeem_at(code, location, Utc::now()).await
    }

    /// Consume one ride; returns the rides left afterwards.
    #[instrument(skip(self))]
    pub async fn redeem_at(
        &self,
        code: &str,
        location: Option<Coordinate>,
        now: DateTime<Utc>,
    ) -> PromoResult<u32> {
        let event = self.find_by_code(code).await?;

        if let Validity::Invalid(reason) = validity::evaluate(&event, now, location) {
            return Err(PromoError::from_reason(code, reason, "redeem"));
        }

        match self.repository.increment_ride_count(code).await? {
            Some(updated) => {
                tracing::info!(promo_code = %code, rides_remaining = updated.rides_remaining(), "Ride redeemed");
                Ok(updated.rides_remaining())
            }
            // Lost a race with another redemption or a deactivation.
            None => {
                let current = self.find_by_code(code).await?;
                if !current.is_enabled {
                    Err(PromoError::Disabled(code.to_string()))
                } else {
                    Err(PromoError::RidesExhausted(code.to_string()))
                }
            }
        }
    }
}

impl<R: PromoRepository> Clone for PromoService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
