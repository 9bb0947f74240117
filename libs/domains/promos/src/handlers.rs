use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_helpers::{
    ValidatedJson, ValidatedQuery,
    errors::responses::{
        BadRequestQueryResponse, BadRequestValidationResponse, InternalServerErrorResponse,
        NotFoundResponse, ServiceUnavailableResponse, UnprocessableEntityResponse,
    },
};
use chrono::Utc;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::PromoResult;
use crate::models::{
    Coordinate, CreateEvent, EventView, LocationQuery, PromoAmount, RedeemResponse,
    SuccessResponse, ValidityQuery,
};
use crate::repository::PromoRepository;
use crate::service::PromoService;
use crate::validity::{InvalidReason, ValidityResponse};

/// OpenAPI documentation for the promo code API
#[derive(OpenApi)]
#[openapi(
    paths(
        create_event,
        list_all_codes,
        list_active_codes,
        get_event,
        check_validity,
        activate_code,
        deactivate_code,
        redeem_code,
    ),
    components(
        schemas(
            CreateEvent,
            EventView,
            PromoAmount,
            Coordinate,
            SuccessResponse,
            RedeemResponse,
            ValidityResponse,
            InvalidReason
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestQueryResponse,
            UnprocessableEntityResponse,
            ServiceUnavailableResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Promos", description = "Event promo code issuance, activation and redemption")
    )
)]
pub struct ApiDoc;

/// Create the promo router with all HTTP endpoints
pub fn router<R: PromoRepository + 'static>(service: PromoService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", post(create_event))
        .route("/all", get(list_all_codes))
        .route("/active", get(list_active_codes))
        .route("/{promo_code}", get(get_event))
        .route("/validity/{promo_code}", get(check_validity))
        .route("/activate/{promo_code}", put(activate_code))
        .route("/deactivate/{promo_code}", put(deactivate_code))
        .route("/redeem/{promo_code}", post(redeem_code))
        .with_state(shared_service)
}

/// Create an event and issue its promo code
///
/// The code starts disabled and is not returned; use `/all` to discover it.
#[utoipa::path(
    post,
    path = "",
    tag = "Promos",
    request_body = CreateEvent,
    responses(
        (status = 201, description = "Event created", body = SuccessResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_event<R: PromoRepository>(
    State(service): State<Arc<PromoService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateEvent>,
) -> PromoResult<impl IntoResponse> {
    service.create_event(input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::ok())))
}

/// List every promo code, oldest first
#[utoipa::path(
    get,
    path = "/all",
    tag = "Promos",
    responses(
        (status = 200, description = "All promo codes", body = Vec<String>),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn list_all_codes<R: PromoRepository>(
    State(service): State<Arc<PromoService<R>>>,
) -> PromoResult<Json<Vec<String>>> {
    let events = service.list_events().await?;
    Ok(Json(events.into_iter().map(|e| e.promo_code).collect()))
}

/// List enabled promo codes, oldest first
#[utoipa::path(
    get,
    path = "/active",
    tag = "Promos",
    responses(
        (status = 200, description = "Enabled promo codes", body = Vec<String>),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn list_active_codes<R: PromoRepository>(
    State(service): State<Arc<PromoService<R>>>,
) -> PromoResult<Json<Vec<String>>> {
    let events = service.list_active_events().await?;
    Ok(Json(events.into_iter().map(|e| e.promo_code).collect()))
}

/// Get the event behind a promo code
#[utoipa::path(
    get,
    path = "/{promo_code}",
    tag = "Promos",
    params(
        ("promo_code" = String, Path, description = "Promo code")
    ),
    responses(
        (status = 200, description = "Event found", body = EventView),
        (status = 404, response = NotFoundResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn get_event<R: PromoRepository>(
    State(service): State<Arc<PromoService<R>>>,
    Path(promo_code): Path<String>,
) -> PromoResult<Json<EventView>> {
    let event = service.find_by_code(&promo_code).await?;
    Ok(Json(event.into()))
}

/// Check whether a promo code can be used
///
/// Read-only. `at` defaults to now; `lat`/`lng` enable the geofence check.
#[utoipa::path(
    get,
    path = "/validity/{promo_code}",
    tag = "Promos",
    params(
        ("promo_code" = String, Path, description = "Promo code"),
        ValidityQuery
    ),
    responses(
        (status = 200, description = "Validity verdict", body = ValidityResponse),
        (status = 400, response = BadRequestQueryResponse),
        (status = 404, response = NotFoundResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn check_validity<R: PromoRepository>(
    State(service): State<Arc<PromoService<R>>>,
    Path(promo_code): Path<String>,
    ValidatedQuery(query): ValidatedQuery<ValidityQuery>,
) -> PromoResult<Json<ValidityResponse>> {
    let at = query.at.unwrap_or_else(Utc::now);
    let validity = service
        .check_validity(&promo_code, at, query.coordinate())
        .await?;
    Ok(Json(validity.into()))
}

/// Enable a promo code
#[utoipa::path(
    put,
    path = "/activate/{promo_code}",
    tag = "Promos",
    params(
        ("promo_code" = String, Path, description = "Promo code")
    ),
    responses(
        (status = 200, description = "Promo code enabled", body = SuccessResponse),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn activate_code<R: PromoRepository>(
    State(service): State<Arc<PromoService<R>>>,
    Path(promo_code): Path<String>,
) -> PromoResult<Json<SuccessResponse>> {
    service.activate(&promo_code).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Disable a promo code
#[utoipa::path(
    put,
    path = "/deactivate/{promo_code}",
    tag = "Promos",
    params(
        ("promo_code" = String, Path, description = "Promo code")
    ),
    responses(
        (status = 200, description = "Promo code disabled", body = SuccessResponse),
        (status = 404, response = NotFoundResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn deactivate_code<R: PromoRepository>(
    State(service): State<Arc<PromoService<R>>>,
    Path(promo_code): Path<String>,
) -> PromoResult<Json<SuccessResponse>> {
    service.deactivate(&promo_code).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Consume one ride from a promo code
#[utoipa::path(
    post,
    path = "/redeem/{promo_code}",
    tag = "Promos",
    params(
        ("promo_code" = String, Path, description = "Promo code"),
        LocationQuery
    ),
    responses(
        (status = 200, description = "Ride redeemed", body = RedeemResponse),
        (status = 400, response = BadRequestQueryResponse),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn redeem_code<R: PromoRepository>(
    State(service): State<Arc<PromoService<R>>>,
    Path(promo_code): Path<String>,
    ValidatedQuery(query): ValidatedQuery<LocationQuery>,
) -> PromoResult<Json<RedeemResponse>> {
    let rides_remaining = service.redeem(&promo_code, query.coordinate()).await?;
    Ok(Json(RedeemResponse {
        success: true,
        rides_remaining,
    }))
}
