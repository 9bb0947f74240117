//! Promos Domain
//!
//! Issues promo codes for events and decides whether a code can be used at a
//! given instant and place. Records live in MongoDB.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints under /api/events
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Activation rules, redemption, code generation
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐     ┌─────────────┐
//! │ Repository  │     │  Validity   │  ← Pure evaluation (window, rides, geofence)
//! └──────┬──────┘     └─────────────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Event, CreateEvent, query types
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_promos::{handlers, MongoPromoRepository, PromoService};
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("safepromo");
//!
//! let repository = MongoPromoRepository::new(&db);
//! repository.create_indexes().await?;
//!
//! let router = handlers::router(PromoService::new(repository));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod geofence;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;
pub mod validity;

pub use error::{PromoError, PromoResult};
pub use geofence::Geofence;
pub use handlers::ApiDoc;
pub use models::{Coordinate, CreateEvent, Event, EventFilter, EventView, PromoAmount};
pub use mongodb::MongoPromoRepository;
pub use repository::PromoRepository;
pub use service::PromoService;
pub use validity::{InvalidReason, Validity, ValidityResponse};
