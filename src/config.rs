use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use time::UtcOffset;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: Option<DatabaseConfig>,
    /// Coaches registered in the in-memory directory when no database is configured.
    pub seed_coach_ids: Vec<Uuid>,
    pub booking: BookingConfig,
    pub app: AppConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

/// Knobs of the scheduling core.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Days shown by the booking calendar, and the most a caller may ask for.
    pub horizon_days: u32,
    pub default_duration_minutes: i32,
    /// Offset in which template wall-clock times and calendar dates are read.
    pub utc_offset: UtcOffset,
    /// Upper bound for the best-effort confirmation notification.
    pub notify_timeout: Duration,
    pub event_buffer: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            horizon_days: 14,
            default_duration_minutes: 60,
            utc_offset: UtcOffset::from_hms(3, 0, 0).unwrap_or(UtcOffset::UTC),
            notify_timeout: Duration::from_secs(5),
            event_buffer: 256,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Coach Booking".to_string(),
            environment: Environment::Development,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Server configuration
        let host = env::var("SERVER_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string())
            .parse::<IpAddr>()
            .context("Failed to parse SERVER_HOST")?;

        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .context("Failed to parse SERVER_PORT")?;

        let request_timeout_secs: u64 = parse_var("REQUEST_TIMEOUT_SECS", 10)?;

        // Database configuration (optional, in-memory storage without it)
        let database = match env::var("DATABASE_URL") {
            Ok(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: parse_var("DATABASE_MIN_CONNECTIONS", 1)?,
                acquire_timeout_secs: request_timeout_secs,
            }),
            Err(_) => None,
        };

        let seed_coach_ids = match env::var("SEED_COACH_IDS") {
            Ok(val) => parse_uuid_list(&val).context("Failed to parse SEED_COACH_IDS")?,
            Err(_) => Vec::new(),
        };

        // Booking configuration
        let defaults = BookingConfig::default();
        let utc_offset = match env::var("BOOKING_UTC_OFFSET") {
            Ok(val) => parse_utc_offset(&val).context("Failed to parse BOOKING_UTC_OFFSET")?,
            Err(_) => defaults.utc_offset,
        };
        let horizon_days: u32 = parse_var("BOOKING_HORIZON_DAYS", defaults.horizon_days)?;
        if horizon_days == 0 {
            return Err(anyhow!("BOOKING_HORIZON_DAYS must be at least 1"));
        }

        let booking = BookingConfig {
            horizon_days,
            default_duration_minutes: parse_var(
                "BOOKING_DEFAULT_DURATION_MINUTES",
                defaults.default_duration_minutes,
            )?,
            utc_offset,
            notify_timeout: Duration::from_secs(parse_var(
                "NOTIFY_TIMEOUT_SECS",
                defaults.notify_timeout.as_secs(),
            )?),
            event_buffer: parse_var("EVENT_BUFFER", defaults.event_buffer)?,
        };

        // App configuration
        let environment = env::var("APP_ENVIRONMENT")
            .ok()
            .and_then(|val| val.parse::<Environment>().ok())
            .unwrap_or_default();
        let name = env::var("APP_NAME").unwrap_or_else(|_| AppConfig::default().name);

        Ok(Config {
            server: ServerConfig {
                host,
                port,
                request_timeout: Duration::from_secs(request_timeout_secs),
            },
            database,
            seed_coach_ids,
            booking,
            app: AppConfig { name, environment },
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(val) => val
            .trim()
            .parse::<T>()
            .with_context(|| format!("Failed to parse {}", name)),
        Err(_) => Ok(default),
    }
}

fn parse_uuid_list(value: &str) -> Result<Vec<Uuid>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| Uuid::parse_str(part).with_context(|| format!("invalid coach id: {}", part)))
        .collect()
}

/// Parses `+03:00`, `-05:30`, `Z` or `UTC`.
pub fn parse_utc_offset(value: &str) -> Result<UtcOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return Ok(UtcOffset::UTC);
    }
    let (sign, rest) = match value.as_bytes().first() {
        Some(b'+') => (1i8, &value[1..]),
        Some(b'-') => (-1i8, &value[1..]),
        _ => return Err(anyhow!("UTC offset must start with '+' or '-': {}", value)),
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i8 = hours.parse().context("invalid offset hours")?;
    let minutes: i8 = minutes.parse().context("invalid offset minutes")?;
    UtcOffset::from_hms(sign * hours, sign * minutes, 0)
        .map_err(|e| anyhow!("UTC offset out of range: {}", e))
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" => Ok(Environment::Development),
            _ => Err(format!("Unknown environment: {}", s)),
        }
    }
}

// Use once_cell for a global config instance that's initialized once
use once_cell::sync::OnceCell;

static CONFIG: OnceCell<Config> = OnceCell::new();

pub fn init() -> Result<&'static Config> {
    CONFIG.get_or_try_init(Config::from_env)
}
