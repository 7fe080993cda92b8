use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use chrono::Duration;

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
    pub economy: EconomyConfig,
    pub seed: SeedConfig,
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
        let format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        let defaults = EconomyConfig::default();
        let economy = EconomyConfig {
            rates: RateCard {
                family: numeric_var("FARMHOUSE_FAMILY_RATE", defaults.rates.family)?,
                friends: numeric_var("FARMHOUSE_FRIENDS_RATE", defaults.rates.friends)?,
            },
            pending_window_hours: bounded_var(
                "FARMHOUSE_PENDING_WINDOW_HOURS",
                defaults.pending_window_hours,
                MAX_PENDING_WINDOW_HOURS,
            )?,
            grace_minutes: bounded_var(
                "FARMHOUSE_GRACE_MINUTES",
                defaults.grace_minutes,
                MAX_GRACE_MINUTES,
            )?,
            max_active_bookings: numeric_var(
                "FARMHOUSE_MAX_ACTIVE_BOOKINGS",
                defaults.max_active_bookings,
            )?,
            season_score: numeric_var("FARMHOUSE_SEASON_SCORE", defaults.season_score)?,
            condition_penalty: numeric_var(
                "FARMHOUSE_CONDITION_PENALTY",
                defaults.condition_penalty,
            )?,
        };

        let families = env::var("FARMHOUSE_FAMILIES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, format },
            economy,
            seed: SeedConfig { families },
        })
    }
}

/// One year.
const MAX_PENDING_WINDOW_HOURS: i64 = 24 * 365;
/// One week.
const MAX_GRACE_MINUTES: i64 = 60 * 24 * 7;

fn bounded_var(name: &'static str, default: i64, max: i64) -> Result<i64, ConfigError> {
    let value = numeric_var(name, default)?;
    if !(0..=max).contains(&value) {
        return Err(ConfigError::OutOfRange {
            var: name,
            value,
            max,
        });
    }
    Ok(value)
}

fn numeric_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var: name, value: raw }),
        Err(_) => Ok(default),
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

/// Output layout for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

/// Points charged per night for each kind of stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateCard {
    pub family: i64,
    pub friends: i64,
}

impl Default for RateCard {
    fn default() -> Self {
        Self {
            family: 5,
            friends: 8,
        }
    }
}

/// Knobs of the priority-score economy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EconomyConfig {
    pub rates: RateCard,
    pub pending_window_hours: i64,
    pub grace_minutes: i64,
    pub max_active_bookings: usize,
    pub season_score: i64,
    pub condition_penalty: i64,
}

impl EconomyConfig {
    pub fn pending_window(&self) -> Duration {
        Duration::hours(self.pending_window_hours)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::minutes(self.grace_minutes)
    }
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            rates: RateCard::default(),
            pending_window_hours: 48,
            grace_minutes: 60,
            max_active_bookings: 2,
            season_score: 250,
            condition_penalty: 5,
        }
    }
}

/// Households registered when the service boots against an empty store.
#[derive(Debug, Clone, Default)]
pub struct SeedConfig {
    pub families: Vec<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { var: &'static str, value: String },
    OutOfRange { var: &'static str, value: i64, max: i64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { var, value } => {
                write!(f, "{var} must be a whole number (got '{value}')")
            }
            ConfigError::OutOfRange { var, value, max } => {
                write!(f, "{var} must be between 0 and {max} (got {value})")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::OutOfRange { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
