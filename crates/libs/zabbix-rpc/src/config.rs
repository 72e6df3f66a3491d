use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_USER_AGENT: &str = concat!("zabbix-rpc/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config format: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where the session token travels on authenticated calls.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthPlacement {
    /// `auth` member of the request envelope.
    #[default]
    Envelope,
    /// `Authorization: Bearer` request header; the envelope carries no token.
    BearerHeader,
}

/// Value sent as the `output` parameter of `*.get` calls.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OutputSelection {
    Keyword(String),
    Fields(Vec<String>),
}

impl OutputSelection {
    pub fn extend() -> Self {
        Self::Keyword("extend".to_owned())
    }

    pub fn to_value(&self) -> JsonValue {
        match self {
            Self::Keyword(keyword) => JsonValue::String(keyword.clone()),
            Self::Fields(fields) => {
                JsonValue::Array(fields.iter().cloned().map(JsonValue::String).collect())
            }
        }
    }
}

impl Default for OutputSelection {
    fn default() -> Self {
        Self::extend()
    }
}

/// Default field selection for queries that do not name an explicit `output`.
///
/// Some deployments restrict which properties a non-super-admin role may read
/// (notably on `user.get`); an override per API prefix covers that case.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueryDefaults {
    pub default_output: OutputSelection,
    pub overrides: BTreeMap<String, OutputSelection>,
}

impl QueryDefaults {
    pub fn output_for(&self, api: &str) -> JsonValue {
        self.overrides.get(api).unwrap_or(&self.default_output).to_value()
    }

    pub fn with_override(mut self, api: impl Into<String>, output: OutputSelection) -> Self {
        self.overrides.insert(api.into(), output);
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Full JSON-RPC endpoint, e.g. `https://zabbix.example/api_jsonrpc.php`.
    pub url: String,
    /// Run every request/response cycle under one lock.
    pub serialize: bool,
    pub user_agent: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    pub proxy: Option<String>,
    pub trace_wire: bool,
    pub auth_placement: AuthPlacement,
    /// Skip detection and pin the wire generation to this version.
    pub forced_version: Option<String>,
    pub query: QueryDefaults,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            serialize: false,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            connect_timeout_ms: 3_000,
            read_timeout_ms: 10_000,
            write_timeout_ms: 10_000,
            proxy: None,
            trace_wire: true,
            auth_placement: AuthPlacement::Envelope,
            forced_version: None,
            query: QueryDefaults::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Self::default() }
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        Self::from_toml(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Invalid("url must not be empty".to_owned()));
        }
        if let Some(version) = self.forced_version.as_deref() {
            if version.trim().is_empty() {
                return Err(ConfigError::Invalid("forced_version must not be empty".to_owned()));
            }
        }
        Ok(())
    }

    /// Endpoint with an `http://` scheme added when none was given.
    pub fn endpoint(&self) -> String {
        let url = self.url.trim();
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_owned()
        } else {
            format!("http://{url}")
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}
