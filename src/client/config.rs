use crate::client::consts::{
    ANALYZE_PATH, BASE_URL, DEFAULT_USER_ID, PROFILE_PATH, STYLIST_ANALYZE_PATH, STYLIST_BASE_URL,
    STYLIST_PROFILE_PATH, STYLIST_TURN_PATH, STYLIST_USER_ID, TURN_PATH,
};

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    base_url: String,
    user_id: String,
    turn_path: String,
    analyze_path: String,
    profile_path: String,
}

pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_id(mut self, user_id: &str) -> Self {
        self.config.user_id = user_id.to_string();
        self
    }

    pub fn with_turn_path(mut self, path: &str) -> Self {
        self.config.turn_path = normalize_path(path);
        self
    }

    pub fn with_analyze_path(mut self, path: &str) -> Self {
        self.config.analyze_path = normalize_path(path);
        self
    }

    pub fn with_profile_path(mut self, path: &str) -> Self {
        self.config.profile_path = normalize_path(path);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            turn_path: TURN_PATH.to_string(),
            analyze_path: ANALYZE_PATH.to_string(),
            profile_path: PROFILE_PATH.to_string(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn into_builder(self) -> ConfigBuilder {
        ConfigBuilder { config: self }
    }

    /// Loads configuration from environment variables.
    ///
    /// A `.env` file in the current directory is honoured. Recognised variables:
    ///
    /// *   `STYLIST_BASE_URL`: Agent service root, e.g. "http://localhost:8000" (the default).
    /// *   `STYLIST_USER_ID`: Identity sent with every turn. Defaults to "demo-user".
    /// *   `STYLIST_TURN_PATH`, `STYLIST_ANALYZE_PATH`, `STYLIST_PROFILE_PATH`: endpoint overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(base_url) = lookup(STYLIST_BASE_URL) {
            let parsed = reqwest::Url::parse(&base_url)
                .map_err(|e| ConfigError::InvalidValue(STYLIST_BASE_URL.to_string(), e.to_string()))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidValue(
                    STYLIST_BASE_URL.to_string(),
                    format!("unsupported scheme '{}'", parsed.scheme()),
                ));
            }
            builder = builder.with_base_url(&base_url);
        }
        if let Some(user_id) = lookup(STYLIST_USER_ID) {
            if user_id.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    STYLIST_USER_ID.to_string(),
                    "must not be empty".to_string(),
                ));
            }
            builder = builder.with_user_id(user_id.trim());
        }
        if let Some(path) = lookup(STYLIST_TURN_PATH) {
            builder = builder.with_turn_path(&path);
        }
        if let Some(path) = lookup(STYLIST_ANALYZE_PATH) {
            builder = builder.with_analyze_path(&path);
        }
        if let Some(path) = lookup(STYLIST_PROFILE_PATH) {
            builder = builder.with_profile_path(&path);
        }

        Ok(builder.build())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn turn_url(&self) -> String {
        format!("{}{}", self.base_url, self.turn_path)
    }

    pub fn analyze_url(&self) -> String {
        format!("{}{}", self.base_url, self.analyze_path)
    }

    pub fn profile_url(&self) -> String {
        format!("{}{}", self.base_url, self.profile_path)
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.trim().trim_end_matches('/');
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
