use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::entities::ride::{OTP_MAX_LENGTH, OTP_MIN_LENGTH};
use crate::error::Error;

/// Knobs of the ride lifecycle engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of digits in a trip-start code.
    pub otp_length: usize,
    /// Inclusive range a default fare is drawn from when a parent leaves the
    /// price unset, in minor currency units.
    pub default_fare_min: i64,
    pub default_fare_max: i64,
    /// When set, rides can only be rated once completed.
    pub rating_requires_completion: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            otp_length: 4,
            default_fare_min: 500,
            default_fare_max: 1500,
            rating_requires_completion: false,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !(OTP_MIN_LENGTH..=OTP_MAX_LENGTH).contains(&self.otp_length) {
            return Err(Error::field_error(
                "OTP_LENGTH",
                format!("must be between {} and {}", OTP_MIN_LENGTH, OTP_MAX_LENGTH),
            ));
        }

        if self.default_fare_min <= 0 || self.default_fare_min > self.default_fare_max {
            return Err(Error::field_error(
                "DEFAULT_FARE_MIN",
                "default fare range must be positive and ordered",
            ));
        }

        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Postgres connection string. Without one the server keeps its state in
    /// memory.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub listen_addr: SocketAddr,
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from the environment (after `.env`, if present).
    ///
    /// | Env Var                      | Default          |
    /// |------------------------------|------------------|
    /// | `DATABASE_URL`               | unset            |
    /// | `DATABASE_MAX_CONNECTIONS`   | `5`              |
    /// | `LISTEN_ADDR`                | `127.0.0.1:3000` |
    /// | `OTP_LENGTH`                 | `4`              |
    /// | `DEFAULT_FARE_MIN`           | `500`            |
    /// | `DEFAULT_FARE_MAX`           | `1500`           |
    /// | `RATING_REQUIRES_COMPLETION` | `false`          |
    pub fn from_env() -> Result<Self, Error> {
        let defaults = EngineConfig::default();

        let engine = EngineConfig {
            otp_length: parse_var("OTP_LENGTH", defaults.otp_length)?,
            default_fare_min: parse_var("DEFAULT_FARE_MIN", defaults.default_fare_min)?,
            default_fare_max: parse_var("DEFAULT_FARE_MAX", defaults.default_fare_max)?,
            rating_requires_completion: parse_var(
                "RATING_REQUIRES_COMPLETION",
                defaults.rating_requires_completion,
            )?,
        };
        engine.validate()?;

        let database_url = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => Some(url),
            Ok(_) | Err(env::VarError::NotPresent) => None,
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            database_url,
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            listen_addr: parse_var("LISTEN_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?,
            engine,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, Error> {
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(_) => Err(Error::env_var_error(name)),
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T, Error> {
    raw.trim()
        .parse()
        .map_err(|_| Error::field_error(name, format!("invalid value {:?}", raw)))
}
