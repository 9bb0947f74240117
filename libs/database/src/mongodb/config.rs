#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_parse_or};

/// Seed list used when no URL is configured: a local two-member replica set.
pub const DEFAULT_MONGO_URL: &str = "mongodb://127.0.0.1:27017,127.0.0.1:27018/";

/// Database used when `MONGODB_DATABASE` is unset.
pub const DEFAULT_DATABASE: &str = "safepromo";

/// MongoDB connection settings.
///
/// Build it by hand or, with the `config` feature, from the environment:
///
/// ```ignore
/// use database::mongodb::MongoConfig;
///
/// let config = MongoConfig::with_database("mongodb://localhost:27017", "safepromo")
///     .with_credentials("promo", "secret");
///
/// let config = MongoConfig::from_env()?;
/// ```
#[derive(Clone)]
pub struct MongoConfig {
    /// Connection string, `mongodb://host[:port][,host[:port]...][/][?options]`
    pub url: String,
    pub database: String,
    /// Username applied on top of the URL; ignored when `password` is unset
    pub username: Option<String>,
    pub password: Option<String>,
    /// Reported to the server for its logs
    pub app_name: Option<String>,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connect_timeout_secs: u64,
    pub server_selection_timeout_secs: u64,
}

impl MongoConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_database(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn with_pool_size(mut self, max_pool_size: u32, min_pool_size: u32) -> Self {
        self.max_pool_size = max_pool_size;
        self.min_pool_size = min_pool_size;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// `url` with any `user:password@` userinfo masked, for logs
    pub fn redacted_url(&self) -> String {
        let Some((scheme, rest)) = self.url.split_once("://") else {
            return self.url.clone();
        };
        let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
        match rest[..authority_end].rfind('@') {
            Some(at) => format!("{scheme}://<redacted>@{}", &rest[at + 1..]),
            None => self.url.clone(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Username and password, only when both are present
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_MONGO_URL.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            username: None,
            password: None,
            app_name: None,
            max_pool_size: 100,
            min_pool_size: 5,
            connect_timeout_secs: 10,
            server_selection_timeout_secs: 30,
        }
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for MongoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoConfig")
            .field("url", &self.redacted_url())
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("app_name", &self.app_name)
            .field("max_pool_size", &self.max_pool_size)
            .field("min_pool_size", &self.min_pool_size)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field(
                "server_selection_timeout_secs",
                &self.server_selection_timeout_secs,
            )
            .finish()
    }
}

#[cfg(feature = "config")]
fn first_var(keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| std::env::var(key).ok())
        .filter(|value| !value.trim().is_empty())
}

/// Environment variables, each with an older `MONGO_*` spelling as fallback:
/// - `MONGODB_URL` / `MONGO_URL` (default: [`DEFAULT_MONGO_URL`])
/// - `MONGODB_DATABASE` / `MONGO_DATABASE` (default: [`DEFAULT_DATABASE`])
/// - `MONGODB_USERNAME` / `MONGO_USERNAME`
/// - `MONGODB_PASSWORD` / `MONGO_PASSWD`
/// - `MONGODB_APP_NAME`
/// - `MONGODB_MAX_POOL_SIZE` (100), `MONGODB_MIN_POOL_SIZE` (5)
/// - `MONGODB_CONNECT_TIMEOUT_SECS` (10), `MONGODB_SERVER_SELECTION_TIMEOUT_SECS` (30)
#[cfg(feature = "config")]
impl FromEnv for MongoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            url: first_var(&["MONGODB_URL", "MONGO_URL"]).unwrap_or(defaults.url),
            database: first_var(&["MONGODB_DATABASE", "MONGO_DATABASE"])
                .unwrap_or(defaults.database),
            username: first_var(&["MONGODB_USERNAME", "MONGO_USERNAME"]),
            password: first_var(&["MONGODB_PASSWORD", "MONGO_PASSWD"]),
            app_name: first_var(&["MONGODB_APP_NAME"]),
            max_pool_size: env_parse_or("MONGODB_MAX_POOL_SIZE", defaults.max_pool_size)?,
            min_pool_size: env_parse_or("MONGODB_MIN_POOL_SIZE", defaults.min_pool_size)?,
            connect_timeout_secs: env_parse_or(
                "MONGODB_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            )?,
            server_selection_timeout_secs: env_parse_or(
                "MONGODB_SERVER_SELECTION_TIMEOUT_SECS",
                defaults.server_selection_timeout_secs,
            )?,
        })
    }
}
