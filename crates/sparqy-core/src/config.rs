//! Configuration for connecting the adapter to a SPARQL endpoint.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`SPARQY__STORE__` prefix)
//! 2. Config file (`sparqy.toml`, `[store]` section)
//! 3. Defaults

use serde::Deserialize;

use crate::error::SparqyError;
use crate::types::ArrowStyle;

/// HTTP authentication scheme applied when credentials are configured.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HttpAuth {
    /// Challenge-response digest authentication (RFC 7616, MD5).
    #[default]
    Digest,
    /// Plain basic authentication.
    Basic,
}

/// Connection and behaviour settings for one adapter instance.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// SPARQL endpoint URL used for reads (and writes unless `update_endpoint` is set).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Separate SPARQL Update endpoint, for stores that split the two.
    #[serde(default)]
    pub update_endpoint: Option<String>,

    /// Named graph holding every reified statement.
    #[serde(default = "default_graph")]
    pub graph: String,

    /// `BASE` IRI against which minted resource fragments resolve.
    #[serde(default = "default_base_uri")]
    pub base_uri: String,

    /// Issue `CREATE GRAPH` when the adapter is constructed.
    #[serde(default = "default_true")]
    pub create_graph: bool,

    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub user_password: Option<String>,

    #[serde(default)]
    pub http_auth: HttpAuth,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Length of generated resource identifier tokens.
    #[serde(default = "default_id_length")]
    pub id_length: usize,

    #[serde(default)]
    pub arrow_style: ArrowStyle,
}

fn default_endpoint() -> String {
    "http://localhost:8890/sparql".to_string()
}

fn default_graph() -> String {
    "http://purl.org/stuff/guardians".to_string()
}

fn default_base_uri() -> String {
    "http://purl.org/stuff/data".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_id_length() -> usize {
    16
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            update_endpoint: None,
            graph: default_graph(),
            base_uri: default_base_uri(),
            create_graph: default_true(),
            user_name: None,
            user_password: None,
            http_auth: HttpAuth::default(),
            timeout_secs: default_timeout_secs(),
            id_length: default_id_length(),
            arrow_style: ArrowStyle::default(),
        }
    }
}

impl StoreConfig {
    pub fn new(
        endpoint: impl Into<String>,
        graph: impl Into<String>,
        base_uri: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            graph: graph.into(),
            base_uri: base_uri.into(),
            ..Default::default()
        }
    }

    pub fn with_credentials(
        mut self,
        user_name: impl Into<String>,
        user_password: impl Into<String>,
        http_auth: HttpAuth,
    ) -> Self {
        self.user_name = Some(user_name.into());
        self.user_password = Some(user_password.into());
        self.http_auth = http_auth;
        self
    }

    /// Credentials, present only when both name and password are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.user_name, &self.user_password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }

    /// Endpoint that receives SPARQL Update requests.
    pub fn update_url(&self) -> &str {
        self.update_endpoint.as_deref().unwrap_or(&self.endpoint)
    }

    /// Load the `[store]` section from `<file_prefix>.toml` and `SPARQY__STORE__*` variables.
    ///
    /// A missing file or section yields the defaults.
    pub fn load(file_prefix: &str) -> Result<Self, SparqyError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("SPARQY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_config(&cfg)
    }

    fn from_config(cfg: &config::Config) -> Result<Self, SparqyError> {
        match cfg.get::<StoreConfig>("store") {
            Ok(c) => Ok(c),
            Err(config::ConfigError::NotFound(_)) => {
                tracing::debug!("No [store] section found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}
