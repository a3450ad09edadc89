use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} must be a valid number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("{name} is out of range: {value}")]
    OutOfRange { name: &'static str, value: i64 },
}

/// One year
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Clone, Debug)]
pub struct Config {
    /// Service key guarding session issuance
    pub secret_key: String,
    pub port: u16,
    pub database_url: String,
    pub session_ttl_hours: i64,
    /// When set, bearer tokens are validated by the external auth provider
    pub auth_provider_url: Option<String>,
    pub auth_provider_api_key: Option<String>,
    /// Clock-ins after start hour + grace minutes (UTC) are recorded as late
    pub workday_start_hour: u32,
    pub workday_grace_minutes: u32,
    pub frontend_dist: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let workday_start_hour = parse_or(&non_empty, "WORKDAY_START_HOUR", 9u32)?;
        if workday_start_hour > 23 {
            return Err(ConfigError::OutOfRange {
                name: "WORKDAY_START_HOUR",
                value: workday_start_hour.into(),
            });
        }
        let workday_grace_minutes = parse_or(&non_empty, "WORKDAY_GRACE_MINUTES", 15u32)?;
        if workday_grace_minutes > 59 {
            return Err(ConfigError::OutOfRange {
                name: "WORKDAY_GRACE_MINUTES",
                value: workday_grace_minutes.into(),
            });
        }

        let session_ttl_hours = parse_or(&non_empty, "SESSION_TTL_HOURS", 24i64)?;
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&session_ttl_hours) {
            return Err(ConfigError::OutOfRange {
                name: "SESSION_TTL_HOURS",
                value: session_ttl_hours,
            });
        }

        Ok(Self {
            secret_key: non_empty("SECRET_KEY").ok_or(ConfigError::Missing("SECRET_KEY"))?,
            port: parse_or(&non_empty, "PORT", 8080u16)?,
            database_url: non_empty("DATABASE_URL").unwrap_or_else(|| "./.db/admin.db".to_string()),
            session_ttl_hours,
            auth_provider_url: non_empty("AUTH_PROVIDER_URL"),
            auth_provider_api_key: non_empty("AUTH_PROVIDER_API_KEY"),
            workday_start_hour,
            workday_grace_minutes,
            frontend_dist: non_empty("FRONTEND_DIST"),
        })
    }
}

fn parse_or<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}
