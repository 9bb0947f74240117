//! Pure validity rules for a promo code at a given instant and place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use crate::models::{Coordinate, Event};

pub const VALID_MESSAGE: &str = "Valid Promo Code";
pub const INVALID_MESSAGE: &str = "Invalid Promo Code";

/// Why a promo code cannot be used right now.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvalidReason {
    /// Never activated, or deactivated
    Disabled,
    /// Outside `[start_date, end_date]`, before or after
    Expired,
    /// Every allowed ride has been redeemed
    RidesExhausted,
    /// Requester is outside the event's geofence
    OutsideGeofence,
}

impl InvalidReason {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Disabled => "promo code is not active",
            Self::Expired => "promo code is outside its validity window",
            Self::RidesExhausted => "all rides for this promo code have been used",
            Self::OutsideGeofence => "requester is outside the event area",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid(InvalidReason),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }

    pub fn reason(&self) -> Option<InvalidReason> {
        match self {
            Validity::Valid => None,
            Validity::Invalid(reason) => Some(*reason),
        }
    }
}

/// Evaluate `event` at `at`, checking in order: enabled, window, rides, geofence.
///
/// The geofence is only consulted when a `location` is supplied.
pub fn evaluate(event: &Event, at: DateTime<Utc>, location: Option<Coordinate>) -> Validity {
    if !event.is_enabled {
        return Validity::Invalid(InvalidReason::Disabled);
    }
    if event.is_expired(at) {
        return Validity::Invalid(InvalidReason::Expired);
    }
    if event.current_ride_count >= event.number_of_rides_allowed {
        return Validity::Invalid(InvalidReason::RidesExhausted);
    }
    if let Some(point) = location {
        if !event.geofence().contains(point) {
            return Validity::Invalid(InvalidReason::OutsideGeofence);
        }
    }
    Validity::Valid
}

/// Body of `GET /validity/{promoCode}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidityResponse {
    pub valid: bool,
    pub reason: Option<InvalidReason>,
    #[schema(example = "Valid Promo Code")]
    pub message: String,
}

impl From<Validity> for ValidityResponse {
    fn from(validity: Validity) -> Self {
        match validity {
            Validity::Valid => Self {
                valid: true,
                reason: None,
                message: VALID_MESSAGE.to_string(),
            },
            Validity::Invalid(reason) => Self {
                valid: false,
                reason: Some(reason),
                message: format!("{INVALID_MESSAGE}: {}", reason.describe()),
            },
        }
    }
}
