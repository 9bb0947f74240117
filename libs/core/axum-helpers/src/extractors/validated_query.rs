use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Query-string counterpart of [`ValidatedJson`](super::ValidatedJson).
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(data) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        data.validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedQuery(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, extract::Request, http::StatusCode, routing::get};
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct Point {
        #[validate(range(min = -90.0, max = 90.0))]
        lat: Option<f64>,
    }

    async fn get_status(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = Router::new().route(
            "/",
            get(|ValidatedQuery(p): ValidatedQuery<Point>| async move {
                axum::Json(serde_json::json!({ "lat": p.lat }))
            }),
        );
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_optional_field_is_ok() {
        let (status, body) = get_status("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["lat"].is_null());
    }

    #[tokio::test]
    async fn test_unparseable_value_is_invalid_query() {
        let (status, body) = get_status("/?lat=north").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_QUERY");
    }

    #[tokio::test]
    async fn test_out_of_range_value_is_validation_error() {
        let (status, body) = get_status("/?lat=120").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
}
