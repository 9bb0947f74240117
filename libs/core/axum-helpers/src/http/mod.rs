//! HTTP middleware: CORS and security headers.
//!
//! ```ignore
//! use axum_helpers::http::{cors_layer_from_config, security_headers};
//!
//! let app = Router::new()
//!     .layer(axum::middleware::from_fn(security_headers))
//!     .layer(cors_layer_from_config(&server_config)?);
//! ```

pub mod cors;
pub mod security;

pub use cors::{cors_layer_from_config, create_cors_layer, create_permissive_cors_layer};
pub use security::security_headers;
