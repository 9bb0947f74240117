//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for the promo service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "SafePromo API",
        version = "0.1.0",
        description = "Event promo code issuance, activation and validity checks"
    ),
    nest(
        (path = "/api/events", api = domain_promos::ApiDoc)
    ),
    tags(
        (name = "Promos", description = "Event promo code issuance, activation and redemption")
    )
)]
pub struct ApiDoc;
