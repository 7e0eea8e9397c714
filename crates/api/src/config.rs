//! Process configuration, read once at startup.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use chrono::Duration;
use thiserror::Error;

pub const ENV_JWT_SECRET: &str = "JWT_SECRET";
pub const ENV_BCRYPT_COST: &str = "BCRYPT_COST";
pub const ENV_TOKEN_TTL_SECS: &str = "TOKEN_TTL_SECS";
pub const ENV_PORT: &str = "PORT";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";

const DEFAULT_BCRYPT_COST: u32 = 10;
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
const MAX_TOKEN_TTL_SECS: i64 = 30 * 24 * 3600;
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{ENV_JWT_SECRET} is not set")]
    MissingSigningSecret,

    #[error("invalid {var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Clone)]
pub struct ServerConfig {
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
    pub token_ttl: Duration,
    pub bind_addr: IpAddr,
    pub port: u16,
}

impl ServerConfig {
    /// Read from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary lookup (tests, embedding).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup(ENV_JWT_SECRET)
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingSigningSecret)?;

        let bcrypt_cost = match lookup(ENV_BCRYPT_COST) {
            None => DEFAULT_BCRYPT_COST,
            Some(raw) => {
                let cost: u32 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::invalid(ENV_BCRYPT_COST, &raw, "not an integer"))?;
                if !(4..=31).contains(&cost) {
                    return Err(ConfigError::invalid(ENV_BCRYPT_COST, &raw, "must be within 4..=31"));
                }
                cost
            }
        };

        let token_ttl = match lookup(ENV_TOKEN_TTL_SECS) {
            None => Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            Some(raw) => {
                let secs: i64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::invalid(ENV_TOKEN_TTL_SECS, &raw, "not an integer"))?;
                if !(1..=MAX_TOKEN_TTL_SECS).contains(&secs) {
                    return Err(ConfigError::invalid(
                        ENV_TOKEN_TTL_SECS,
                        &raw,
                        format!("must be within 1..={MAX_TOKEN_TTL_SECS}"),
                    ));
                }
                Duration::try_seconds(secs)
                    .ok_or_else(|| ConfigError::invalid(ENV_TOKEN_TTL_SECS, &raw, "out of range"))?
            }
        };

        let port = match lookup(ENV_PORT) {
            None => DEFAULT_PORT,
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid(ENV_PORT, &raw, "not a port number"))?,
        };

        let bind_addr = match lookup(ENV_BIND_ADDR) {
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid(ENV_BIND_ADDR, &raw, "not an IP address"))?,
        };

        Ok(Self {
            jwt_secret,
            bcrypt_cost,
            token_ttl,
            bind_addr,
            port,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

impl core::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("jwt_secret", &"<redacted>")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("token_ttl", &self.token_ttl)
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn missing_secret_is_fatal() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::MissingSigningSecret);
        assert_eq!(
            config(&[(ENV_JWT_SECRET, "  ")]).unwrap_err(),
            ConfigError::MissingSigningSecret
        );
    }

    #[test]
    fn defaults() {
        let c = config(&[(ENV_JWT_SECRET, "s3cret")]).unwrap();
        assert_eq!(c.bcrypt_cost, 10);
        assert_eq!(c.token_ttl, Duration::hours(1));
        assert_eq!(c.listen_addr().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn overrides_and_validation() {
        let c = config(&[
            (ENV_JWT_SECRET, "s3cret"),
            (ENV_BCRYPT_COST, "12"),
            (ENV_TOKEN_TTL_SECS, "60"),
            (ENV_PORT, "8080"),
            (ENV_BIND_ADDR, "127.0.0.1"),
        ])
        .unwrap();
        assert_eq!(c.bcrypt_cost, 12);
        assert_eq!(c.token_ttl, Duration::seconds(60));
        assert_eq!(c.listen_addr().to_string(), "127.0.0.1:8080");

        assert!(matches!(
            config(&[(ENV_JWT_SECRET, "s"), (ENV_BCRYPT_COST, "3")]),
            Err(ConfigError::Invalid { var: ENV_BCRYPT_COST, .. })
        ));
        assert!(matches!(
            config(&[(ENV_JWT_SECRET, "s"), (ENV_TOKEN_TTL_SECS, "0")]),
            Err(ConfigError::Invalid { var: ENV_TOKEN_TTL_SECS, .. })
        ));
    }

    #[test]
    fn oversized_ttl_is_rejected() {
        let max = MAX_TOKEN_TTL_SECS.to_string();
        let over = (MAX_TOKEN_TTL_SECS + 1).to_string();
        for raw in ["9223372036854775807", over.as_str()] {
            assert!(matches!(
                config(&[(ENV_JWT_SECRET, "s"), (ENV_TOKEN_TTL_SECS, raw)]),
                Err(ConfigError::Invalid { var: ENV_TOKEN_TTL_SECS, .. })
            ));
        }

        let c = config(&[(ENV_JWT_SECRET, "s"), (ENV_TOKEN_TTL_SECS, &max)]).unwrap();
        assert_eq!(c.token_ttl, Duration::days(30));
    }

    #[test]
    fn debug_redacts_secret() {
        let c = config(&[(ENV_JWT_SECRET, "s3cret")]).unwrap();
        assert!(!format!("{c:?}").contains("s3cret"));
    }
}
