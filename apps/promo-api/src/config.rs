use core_config::{AppInfo, FromEnv, app_info, env_or_default, server::ServerConfig};
use database::mongodb::MongoConfig;
use domain_promos::mongodb::DEFAULT_COLLECTION;

pub use core_config::Environment;

/// Application configuration, composed from the shared config components
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    /// Collection holding events; `MONGODB_EVENTS_COLLECTION`
    pub events_collection: String,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let mongodb = MongoConfig::from_env()?;
        let server = ServerConfig::from_env()?;
        let events_collection = env_or_default("MONGODB_EVENTS_COLLECTION", DEFAULT_COLLECTION);

        if events_collection.trim().is_empty() {
            eyre::bail!("MONGODB_EVENTS_COLLECTION must not be empty");
        }

        Ok(Self {
            app: app_info!(),
            mongodb,
            server,
            environment,
            events_collection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        temp_env::with_vars_unset(
            [
                "APP_ENV",
                "PORT",
                "REQUEST_TIMEOUT_SECS",
                "MONGODB_URL",
                "MONGO_URL",
                "MONGODB_DATABASE",
                "MONGO_DATABASE",
                "MONGODB_EVENTS_COLLECTION",
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.app.name, "promo_api");
                assert_eq!(config.server.port, 3000);
                assert_eq!(config.mongodb.database(), "safepromo");
                assert_eq!(config.events_collection, "events");
                assert!(!config.environment.is_production());
            },
        );
    }

    #[test]
    fn test_config_custom_collection() {
        temp_env::with_vars(
            [
                ("PORT", None),
                ("REQUEST_TIMEOUT_SECS", None),
                ("MONGODB_EVENTS_COLLECTION", Some("promo_events")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.events_collection, "promo_events");
            },
        );
    }

    #[test]
    fn test_config_rejects_blank_collection() {
        temp_env::with_vars(
            [
                ("PORT", None),
                ("REQUEST_TIMEOUT_SECS", None),
                ("MONGODB_EVENTS_COLLECTION", Some("  ")),
            ],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }

    #[test]
    fn test_config_surfaces_bad_port() {
        temp_env::with_var("PORT", Some("http"), || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("PORT"));
        });
    }
}
