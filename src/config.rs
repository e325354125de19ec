use config::{Config, ConfigError, Environment, File};
use reqwest::Url;
use serde::Deserialize;

use crate::error::MenuError;

/// Main client configuration
#[derive(Debug, Deserialize, Clone)]
pub struct MenuConfig {
    /// Base URL of the running drinks API
    #[serde(default = "default_api_server_url")]
    pub api_server_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Identity provider settings
    #[serde(default)]
    pub auth0: Auth0Config,
}

/// Settings for the Auth0 tenant issuing access tokens
#[derive(Debug, Deserialize, Clone)]
pub struct Auth0Config {
    /// Tenant prefix, the part before `.auth0.com`
    #[serde(default)]
    pub url: String,
    /// API audience the token is requested for
    #[serde(default)]
    pub audience: String,
    /// Client id of the registered application
    #[serde(default)]
    pub client_id: String,
    /// Where the identity provider redirects after login
    #[serde(default = "default_callback_url")]
    pub callback_url: String,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            api_server_url: default_api_server_url(),
            timeout: default_timeout(),
            auth0: Auth0Config::default(),
        }
    }
}

impl Default for Auth0Config {
    fn default() -> Self {
        Self {
            url: String::new(),
            audience: String::new(),
            client_id: String::new(),
            callback_url: default_callback_url(),
        }
    }
}

// Default value functions
fn default_api_server_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_callback_url() -> String {
    "http://localhost:8100".to_string()
}

impl Auth0Config {
    /// Link that starts the implicit-grant login flow
    ///
    /// `callback_path` is appended to the configured callback URL, e.g. `/tabs/user-page`.
    pub fn login_link(&self, callback_path: &str) -> Result<Url, MenuError> {
        if self.url.is_empty() || self.client_id.is_empty() {
            return Err(MenuError::Builder(
                "auth0.url and auth0.client_id must be configured".to_string(),
            ));
        }

        let authorize = format!("https://{}.auth0.com/authorize", self.url);
        let mut link = Url::parse(&authorize).map_err(|e| MenuError::InvalidUrl(e.to_string()))?;
        link.query_pairs_mut()
            .append_pair("audience", &self.audience)
            .append_pair("response_type", "token")
            .append_pair("client_id", &self.client_id)
            .append_pair(
                "redirect_uri",
                &format!("{}{}", self.callback_url, callback_path),
            );
        Ok(link)
    }
}

impl MenuConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with DRINK_MENU__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: DRINK_MENU__AUTH0__CLIENT_ID
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    /// The API base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.api_server_url.trim_end_matches('/')
    }
}

/// Load configuration from file and environment variables
///
/// See [`MenuConfig::load`] for the lookup order.
pub fn load_config() -> Result<MenuConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested: DRINK_MENU__AUTH0__AUDIENCE
        .add_source(
            Environment::with_prefix("DRINK_MENU")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
