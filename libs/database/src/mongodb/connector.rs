use mongodb::bson::doc;
use mongodb::options::{ClientOptions, Credential};
use mongodb::Client;
use std::time::Duration;
use tracing::{info, instrument};

use super::MongoConfig;
use crate::common::{RetryConfig, retry, retry_with_backoff};

/// Error type for MongoDB connection setup
#[derive(Debug, thiserror::Error)]
pub enum MongoError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

/// Translate a [`MongoConfig`] into driver options.
///
/// Credentials from the config take precedence over any embedded in the URL.
pub async fn client_options(config: &MongoConfig) -> Result<ClientOptions, MongoError> {
    let mut options = ClientOptions::parse(&config.url).await?;

    options.max_pool_size = Some(config.max_pool_size);
    options.min_pool_size = Some(config.min_pool_size);
    options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_secs));

    if let Some(ref app_name) = config.app_name {
        options.app_name = Some(app_name.clone());
    }

    if let Some((username, password)) = config.credentials() {
        options.credential = Some(
            Credential::builder()
                .username(username.to_string())
                .password(password.to_string())
                .build(),
        );
    }

    Ok(options)
}

/// Connect using a [`MongoConfig`] and verify the deployment answers a ping.
///
/// ```ignore
/// use database::mongodb::{MongoConfig, connect_from_config};
///
/// let config = MongoConfig::with_database("mongodb://localhost:27017", "safepromo");
/// let client = connect_from_config(&config).await?;
/// ```
#[instrument(skip(config), fields(database = %config.database))]
pub async fn connect_from_config(config: &MongoConfig) -> Result<Client, MongoError> {
    info!("Connecting to MongoDB");

    let options = client_options(config).await?;
    let client = Client::with_options(options)?;

    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| MongoError::ConnectionFailed(e.to_string()))?;

    info!("Connected to MongoDB");
    Ok(client)
}

/// [`connect_from_config`] with exponential backoff.
///
/// `None` uses [`RetryConfig::default`].
pub async fn connect_from_config_with_retry(
    config: &MongoConfig,
    retry_config: Option<RetryConfig>,
) -> Result<Client, MongoError> {
    match retry_config {
        Some(policy) => retry_with_backoff(|| connect_from_config(config), policy).await,
        None => retry(|| connect_from_config(config)).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_options_apply_pool_and_credentials() {
        let config = MongoConfig::with_database("mongodb://localhost:27017", "safepromo")
            .with_credentials("svc", "pw")
            .with_app_name("promo-api")
            .with_pool_size(20, 2);

        let options = client_options(&config).await.unwrap();

        assert_eq!(options.max_pool_size, Some(20));
        assert_eq!(options.min_pool_size, Some(2));
        assert_eq!(options.app_name.as_deref(), Some("promo-api"));
        let credential = options.credential.unwrap();
        assert_eq!(credential.username.as_deref(), Some("svc"));
        assert_eq!(credential.password.as_deref(), Some("pw"));
    }

    #[tokio::test]
    async fn test_client_options_parse_seed_list() {
        let options = client_options(&MongoConfig::default()).await.unwrap();
        assert_eq!(options.hosts.len(), 2);
        assert!(options.credential.is_none());
    }

    #[tokio::test]
    async fn test_client_options_reject_bad_url() {
        let config = MongoConfig::new("postgres://localhost:5432");
        assert!(matches!(
            client_options(&config).await,
            Err(MongoError::Mongo(_))
        ));
    }

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn test_connect() {
        let mongo_url = std::env::var("MONGODB_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        assert!(connect_from_config(&MongoConfig::new(mongo_url)).await.is_ok());
    }
}
