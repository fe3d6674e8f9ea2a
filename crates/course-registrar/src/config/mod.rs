use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::registration::RequestIdFormat;

const MAX_REQUEST_ID_WIDTH: usize = 12;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub registration: RegistrationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let request_prefix =
            env::var("REGISTRAR_REQUEST_PREFIX").unwrap_or_else(|_| "REQ".to_string());
        if request_prefix.trim().is_empty() {
            return Err(ConfigError::EmptyRequestPrefix);
        }

        let request_id_width = match env::var("REGISTRAR_REQUEST_ID_WIDTH") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|width| (1..=MAX_REQUEST_ID_WIDTH).contains(width))
                .ok_or(ConfigError::InvalidRequestIdWidth { value: raw })?,
            Err(_) => 4,
        };

        let snapshot_path = env::var("REGISTRAR_SNAPSHOT_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            registration: RegistrationConfig {
                request_prefix: request_prefix.trim().to_string(),
                request_id_width,
                snapshot_path,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Request numbering and optional seed data for the registrar.
#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    pub request_prefix: String,
    pub request_id_width: usize,
    pub snapshot_path: Option<PathBuf>,
}

impl RegistrationConfig {
    pub fn request_id_format(&self) -> RequestIdFormat {
        RequestIdFormat::new(self.request_prefix.clone(), self.request_id_width)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    EmptyRequestPrefix,
    InvalidRequestIdWidth { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::EmptyRequestPrefix => {
                write!(f, "REGISTRAR_REQUEST_PREFIX must not be blank")
            }
            ConfigError::InvalidRequestIdWidth { value } => write!(
                f,
                "REGISTRAR_REQUEST_ID_WIDTH must be between 1 and {MAX_REQUEST_ID_WIDTH} (found '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::EmptyRequestPrefix
            | ConfigError::InvalidRequestIdWidth { .. } => None,
        }
    }
}
