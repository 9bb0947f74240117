use super::shutdown::ShutdownCoordinator;
use crate::errors::handlers::not_found;
use crate::http::{cors::cors_layer_from_config, security::security_headers};
use axum::{Router, extract::Request, http::StatusCode, middleware};
use core_config::server::ServerConfig;
use std::future::Future;
use std::io;
use std::time::Duration;
use tower::Layer;
use tower_http::compression::CompressionLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;

/// Path of the generated OpenAPI document.
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// Strip a trailing slash before routing, so `/api/events/` reaches `/api/events`.
///
/// Must wrap the whole router; a `Router::layer` runs after the route is chosen.
pub fn normalize_trailing_slash(router: Router) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

/// Wrap already-stated API routes with docs and cross-cutting middleware.
///
/// - `apis` is nested under `/api`
/// - `/api-docs/openapi.json`, `/scalar` and `/redoc` serve the `T` document
/// - unknown paths get the JSON 404 body
/// - layers: request timeout, tracing, security headers, CORS, compression
///
/// Health endpoints are merged by the caller with [`health_router`](super::health_router).
///
/// # Errors
/// Fails when a configured CORS origin is not a valid header value.
pub fn create_router<T>(apis: Router, server_config: &ServerConfig) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    use utoipa_redoc::{Redoc, Servable as RedocServable};
    use utoipa_scalar::{Scalar, Servable as ScalarServable};

    let cors_layer = cors_layer_from_config(server_config)?;
    let openapi = T::openapi();

    let router = Router::new()
        .route(
            OPENAPI_JSON_PATH,
            axum::routing::get({
                let doc = openapi.clone();
                move || async move { axum::Json(doc) }
            }),
        )
        .merge(Redoc::with_url("/redoc", openapi.clone()))
        .merge(Scalar::with_url("/scalar", openapi))
        .nest("/api", apis)
        .fallback(not_found)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            server_config.request_timeout,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(security_headers))
        .layer(cors_layer)
        .layer(CompressionLayer::new());

    Ok(router)
}

/// Serve `router` with coordinated shutdown.
///
/// On SIGINT/SIGTERM the server stops accepting connections, drains in-flight
/// requests, then runs `cleanup` bounded by `shutdown_timeout`.
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let coordinator = ShutdownCoordinator::default();
    let signal_handle = coordinator.clone();
    let mut shutdown_rx = coordinator.subscribe();

    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    let signal_task = tokio::spawn(async move { signal_handle.wait_for_signal().await });

    let app = normalize_trailing_slash(router);
    let serve_result = axum::serve(listener, axum::ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        });

    signal_task.abort();

    info!("Starting cleanup tasks (timeout: {:?})", shutdown_timeout);
    match tokio::time::timeout(shutdown_timeout, cleanup).await {
        Ok(()) => info!("Cleanup completed successfully"),
        Err(_) => tracing::warn!(
            "Cleanup exceeded timeout of {:?}, forcing shutdown",
            shutdown_timeout
        ),
    }

    serve_result
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::{get, post}};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[derive(OpenApi)]
    #[openapi(info(title = "test"))]
    struct TestDoc;

    fn app(config: &ServerConfig) -> Router {
        let api = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            );
        create_router::<TestDoc>(api, config).unwrap()
    }

    async fn get_path(router: Router, path: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_api_routes_are_nested() {
        let (status, body) = get_path(app(&ServerConfig::default()), "/api/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"pong");
    }

    #[tokio::test]
    async fn test_unknown_path_returns_json_404() {
        let (status, body) = get_path(app(&ServerConfig::default()), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let (status, body) = get_path(app(&ServerConfig::default()), OPENAPI_JSON_PATH).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["info"]["title"], "test");
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let config = ServerConfig {
            request_timeout: Duration::from_millis(50),
            ..ServerConfig::default()
        };
        let (status, _) = get_path(app(&config), "/api/slow").await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_trailing_slash_reaches_route() {
        let api = Router::new().nest(
            "/events",
            Router::new().route("/", post(|| async { StatusCode::CREATED })),
        );
        let router = create_router::<TestDoc>(api, &ServerConfig::default()).unwrap();

        for path in ["/api/events", "/api/events/"] {
            let response = normalize_trailing_slash(router.clone())
                .oneshot(Request::post(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED, "{path}");
        }
    }
}
