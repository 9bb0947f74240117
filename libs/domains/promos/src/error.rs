use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use validator::ValidationErrors;

use crate::validity::InvalidReason;

#[derive(Debug, Error)]
pub enum PromoError {
    #[error("Promo code '{0}' not found")]
    NotFound(String),

    #[error("You cannot {action} an expired promo code")]
    Expired { code: String, action: &'static str },

    #[error("Promo code '{0}' is not active")]
    Disabled(String),

    #[error("Promo code '{0}' has no rides remaining")]
    RidesExhausted(String),

    #[error("Location is outside the area of promo code '{0}'")]
    OutsideGeofence(String),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Promo code '{0}' already exists")]
    DuplicateCode(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type PromoResult<T> = Result<T, PromoError>;

impl PromoError {
    /// Map a failed validity check onto the matching named error
    pub fn from_reason(code: &str, reason: InvalidReason, action: &'static str) -> Self {
        let code = code.to_string();
        match reason {
            InvalidReason::Disabled => PromoError::Disabled(code),
            InvalidReason::Expired => PromoError::Expired { code, action },
            InvalidReason::RidesExhausted => PromoError::RidesExhausted(code),
            InvalidReason::OutsideGeofence => PromoError::OutsideGeofence(code),
        }
    }

    /// Identifier sent as `error` for business-rule failures
    pub fn identifier(&self) -> Option<&'static str> {
        match self {
            PromoError::Expired { .. } => Some("PROMO_CODE_EXPIRED"),
            PromoError::Disabled(_) => Some("PROMO_CODE_DISABLED"),
            PromoError::RidesExhausted(_) => Some("RIDES_EXHAUSTED"),
            PromoError::OutsideGeofence(_) => Some("OUTSIDE_GEOFENCE"),
            _ => None,
        }
    }
}

impl From<PromoError> for AppError {
    fn from(err: PromoError) -> Self {
        if let Some(identifier) = err.identifier() {
            return AppError::BusinessRule {
                error: identifier,
                message: err.to_string(),
            };
        }

        match err {
            PromoError::NotFound(_) => AppError::NotFound(err.to_string()),
            PromoError::Validation(errors) => AppError::ValidationError(errors),
            PromoError::DuplicateCode(_) => AppError::InternalServerError(err.to_string()),
            PromoError::Database(msg) => AppError::Database(msg),
            PromoError::Internal(msg) => AppError::InternalServerError(msg),
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

impl IntoResponse for PromoError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

impl From<mongodb::error::Error> for PromoError {
    fn from(err: mongodb::error::Error) -> Self {
        PromoError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (PromoError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                PromoError::Expired {
                    code: "x".into(),
                    action: "activate",
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (PromoError::RidesExhausted("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (PromoError::Database("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (PromoError::Internal("dup".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                PromoError::Validation(ValidationErrors::new()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_expired_activation_message() {
        let err = PromoError::Expired {
            code: "x".into(),
            action: "activate",
        };
        assert_eq!(err.to_string(), "You cannot activate an expired promo code");
        assert_eq!(err.identifier(), Some("PROMO_CODE_EXPIRED"));
    }

    #[test]
    fn test_from_reason() {
        assert!(matches!(
            PromoError::from_reason("c", InvalidReason::OutsideGeofence, "redeem"),
            PromoError::OutsideGeofence(code) if code == "c"
        ));
        assert!(matches!(
            PromoError::from_reason("c", InvalidReason::Expired, "redeem"),
            PromoError::Expired { action: "redeem", .. }
        ));
    }
}
