use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{debug, warn};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid listen address {0}")]
    InvalidAddress(String),
}

/// How new meeting identifiers are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MeetingIdStyle {
    /// 8 random alphanumeric characters
    Random,
    /// Two-word readable names such as `brave-otter`
    Petname,
}

/// Runtime configuration for the relay server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Origins allowed to call the HTTP API. `*` allows any origin.
    pub allowed_origins: Vec<String>,
    /// Whether a sender receives its own relayed messages
    pub echo_to_sender: bool,
    pub meeting_id_style: MeetingIdStyle,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            allowed_origins: vec!["*".to_string()],
            echo_to_sender: false,
            meeting_id_style: MeetingIdStyle::Random,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from `MEETING_RELAY_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, falling back to
    /// defaults for missing keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_address = lookup("MEETING_RELAY_BIND_ADDRESS").unwrap_or(defaults.bind_address);

        let port = match lookup("MEETING_RELAY_PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "MEETING_RELAY_PORT",
                value,
            })?,
            None => defaults.port,
        };

        let allowed_origins = lookup("MEETING_RELAY_ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or(defaults.allowed_origins);

        let echo_to_sender = match lookup("MEETING_RELAY_ECHO_TO_SENDER") {
            Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidValue {
                key: "MEETING_RELAY_ECHO_TO_SENDER",
                value,
            })?,
            None => defaults.echo_to_sender,
        };

        let meeting_id_style = match lookup("MEETING_RELAY_ID_STYLE") {
            Some(value) => {
                MeetingIdStyle::from_str(value.trim()).map_err(|_| ConfigError::InvalidValue {
                    key: "MEETING_RELAY_ID_STYLE",
                    value,
                })?
            }
            None => defaults.meeting_id_style,
        };

        let config = Self {
            bind_address,
            port,
            allowed_origins,
            echo_to_sender,
            meeting_id_style,
        };
        debug!(config = ?config, "Loaded server configuration");
        Ok(config)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let address = format!("{}:{}", self.bind_address, self.port);
        address
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(address))
    }

    /// CORS layer for the HTTP API built from the configured allow-list
    pub fn cors_layer(&self) -> CorsLayer {
        let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

        if self.allowed_origins.iter().any(|origin| origin == "*") {
            warn!("CORS allows any origin; restrict MEETING_RELAY_ALLOWED_ORIGINS in production");
            return base.allow_origin(Any);
        }

        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Skipping invalid CORS origin");
                    None
                }
            })
            .collect();

        base.allow_origin(AllowOrigin::list(origins))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
