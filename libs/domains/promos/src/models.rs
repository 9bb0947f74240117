use chrono::{DateTime, Datelike, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::geofence::Geofence;

/// Timestamp (de)serialization shared by storage and the HTTP surface.
///
/// Output is RFC 3339 with millisecond precision and a `Z` suffix. Within
/// years 0000-9999, which `CreateEvent` enforces, stored values sort
/// chronologically as strings. Input accepts RFC 3339 or
/// RFC 2822 / RFC 1123 (`Mon, 15 Jan 2024 00:00:00 GMT`).
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use std::borrow::Cow;

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }

        // RFC 1123 producers often write "UTC" where RFC 2822 expects "GMT".
        let rfc2822 = match raw.strip_suffix(" UTC") {
            Some(head) => Cow::Owned(format!("{head} GMT")),
            None => Cow::Borrowed(raw),
        };
        DateTime::parse_from_rfc2822(&rfc2822)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| {
                format!("invalid timestamp '{raw}': expected RFC 3339 or RFC 1123 format")
            })
    }

    pub fn format(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(D::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => super::serialize(dt, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) if !raw.trim().is_empty() => parse(&raw).map(Some).map_err(D::Error::custom),
                _ => Ok(None),
            }
        }
    }
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Coordinate {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}

/// Largest amount BSON can hold; it has no unsigned 64-bit integer.
pub const MAX_MINOR_UNITS: u64 = i64::MAX as u64;

/// Monetary value of a promo code in the currency's minor unit (e.g. kobo, cents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromoAmount {
    #[validate(range(max = MAX_MINOR_UNITS))]
    pub minor_units: u64,
    /// ISO 4217 code, e.g. "NGN"
    #[validate(custom(function = "validate_currency"))]
    #[schema(example = "NGN")]
    pub currency: String,
}

fn validate_currency(currency: &str) -> Result<(), ValidationError> {
    if currency.len() == 3 && currency.bytes().all(|b| b.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(ValidationError::new("currency")
            .with_message(Cow::Borrowed("currency must be a 3-letter uppercase ISO 4217 code")))
    }
}

/// Event entity as stored in MongoDB.
///
/// Field names are the BSON keys used in filters, so they stay snake_case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    pub name: String,
    pub promo_code: String,
    pub promo_code_amount: PromoAmount,
    pub number_of_rides_allowed: u32,
    #[serde(default)]
    pub current_ride_count: u32,
    /// Polygon vertices; empty means no geofence
    #[serde(default)]
    pub event_location: Vec<Coordinate>,
    pub is_enabled: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub end_date: DateTime<Utc>,
}

impl Event {
    /// Build a fresh, disabled event with a newly generated promo code.
    ///
    /// Timestamps are truncated to milliseconds to match their stored form.
    pub fn new(draft: CreateEvent, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: draft.name,
            promo_code: generate_promo_code(),
            promo_code_amount: draft.promo_code_amount,
            number_of_rides_allowed: draft.number_of_rides_allowed,
            current_ride_count: 0,
            event_location: draft.event_location,
            is_enabled: false,
            created_at: now.trunc_subsecs(3),
            start_date: draft.start_date.trunc_subsecs(3),
            end_date: draft.end_date.trunc_subsecs(3),
        }
    }

    /// True unless `start_date <= now <= end_date`.
    ///
    /// Not-yet-started and already-ended windows are both "expired"; splitting
    /// them into separate reasons is a product decision that has not been made.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now < self.start_date || now > self.end_date
    }

    pub fn rides_remaining(&self) -> u32 {
        self.number_of_rides_allowed
            .saturating_sub(self.current_ride_count)
    }

    pub fn geofence(&self) -> Geofence<'_> {
        Geofence::new(&self.event_location)
    }

    /// Replace the promo code after a uniqueness collision.
    pub fn regenerate_code(&mut self) {
        self.promo_code = generate_promo_code();
    }
}

fn generate_promo_code() -> String {
    Uuid::new_v4().to_string()
}

/// Event as returned by the HTTP API.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    pub id: Uuid,
    pub name: String,
    pub promo_code: String,
    pub promo_code_amount: PromoAmount,
    pub number_of_rides_allowed: u32,
    pub current_ride_count: u32,
    pub event_location: Vec<Coordinate>,
    pub is_enabled: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub end_date: DateTime<Utc>,
}

impl From<Event> for EventView {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            name: event.name,
            promo_code: event.promo_code,
            promo_code_amount: event.promo_code_amount,
            number_of_rides_allowed: event.number_of_rides_allowed,
            current_ride_count: event.current_ride_count,
            event_location: event.event_location,
            is_enabled: event.is_enabled,
            created_at: event.created_at,
            start_date: event.start_date,
            end_date: event.end_date,
        }
    }
}

/// Request body for creating an event and its promo code.
///
/// The allowance may be sent as `ridesTaken`. An incoming `allowedRides` is
/// ignored since new events always start at zero rides.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_date_window"))]
pub struct CreateEvent {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(nested)]
    pub promo_code_amount: PromoAmount,
    #[serde(alias = "ridesTaken")]
    #[validate(range(min = 1))]
    pub number_of_rides_allowed: u32,
    /// RFC 3339 or RFC 1123
    #[serde(with = "timestamp")]
    #[schema(value_type = String, example = "Mon, 01 Jan 2024 00:00:00 GMT")]
    #[validate(custom(function = "validate_storable_date"))]
    pub start_date: DateTime<Utc>,
    /// RFC 3339 or RFC 1123; must not precede `startDate`
    #[serde(with = "timestamp")]
    #[schema(value_type = String, example = "2024-01-31T23:59:59Z")]
    #[validate(custom(function = "validate_storable_date"))]
    pub end_date: DateTime<Utc>,
    /// Polygon of at least three vertices, or empty for no geofence
    #[serde(default)]
    #[validate(custom(function = "validate_geofence"))]
    pub event_location: Vec<Coordinate>,
}

fn validate_date_window(draft: &CreateEvent) -> Result<(), ValidationError> {
    if draft.start_date > draft.end_date {
        return Err(ValidationError::new("date_window")
            .with_message(Cow::Borrowed("startDate must not be after endDate")));
    }
    Ok(())
}

/// Four-digit years only; wider years break the string ordering of stored dates.
fn validate_storable_date(date: &DateTime<Utc>) -> Result<(), ValidationError> {
    if (0..=9999).contains(&date.year()) {
        Ok(())
    } else {
        Err(ValidationError::new("date_range")
            .with_message(Cow::Borrowed("dates must fall within years 0000 to 9999")))
    }
}

fn validate_geofence(points: &[Coordinate]) -> Result<(), ValidationError> {
    if !points.is_empty() && points.len() < 3 {
        return Err(ValidationError::new("geofence")
            .with_message(Cow::Borrowed("eventLocation needs at least 3 points or none")));
    }
    if points.iter().any(|p| p.validate().is_err()) {
        return Err(ValidationError::new("coordinate")
            .with_message(Cow::Borrowed("lat must be within ±90 and lng within ±180")));
    }
    Ok(())
}

/// Storage-level listing filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub is_enabled: Option<bool>,
}

impl EventFilter {
    pub fn active() -> Self {
        Self {
            is_enabled: Some(true),
        }
    }
}

/// Optional requester location, sent as `?lat=&lng=`.
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[validate(schema(function = "validate_location_pair"))]
#[into_params(parameter_in = Query)]
pub struct LocationQuery {
    /// Requester latitude; requires `lng`
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,
    /// Requester longitude; requires `lat`
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: Option<f64>,
}

impl LocationQuery {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinate { lat, lng }),
            _ => None,
        }
    }
}

fn validate_location_pair(query: &LocationQuery) -> Result<(), ValidationError> {
    location_pair(query.lat, query.lng)
}

fn location_pair(lat: Option<f64>, lng: Option<f64>) -> Result<(), ValidationError> {
    if lat.is_some() != lng.is_some() {
        return Err(ValidationError::new("location")
            .with_message(Cow::Borrowed("lat and lng must be given together")));
    }
    Ok(())
}

/// Query for the validity endpoint.
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[validate(schema(function = "validate_validity_location"))]
#[into_params(parameter_in = Query)]
pub struct ValidityQuery {
    /// Instant to evaluate at (RFC 3339 or RFC 1123); defaults to now
    #[serde(default, with = "timestamp::option")]
    #[param(value_type = Option<String>)]
    pub at: Option<DateTime<Utc>>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: Option<f64>,
}

impl ValidityQuery {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinate { lat, lng }),
            _ => None,
        }
    }
}

fn validate_validity_location(query: &ValidityQuery) -> Result<(), ValidationError> {
    location_pair(query.lat, query.lng)
}

/// Outcome of a mutation that returns no data.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedeemResponse {
    pub success: bool,
    pub rides_remaining: u32,
}
