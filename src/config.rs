//! Service configuration, read from environment variables

use std::net::{Ipv4Addr, SocketAddr};

const DEFAULT_TABLE_PREFIX: &str = "wp_";
const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// MySQL connection URL
    pub database_url: String,
    /// Prefix of the WordPress tables, such as `wp_`
    pub table_prefix: String,
    pub http_port: u16,
    pub max_connections: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .ok_or(Error::Missing("DATABASE_URL"))?;

        let table_prefix = lookup("TABLE_PREFIX").unwrap_or_else(|| DEFAULT_TABLE_PREFIX.into());
        // Interpolated into SQL, so only identifier characters are allowed
        if !table_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(Error::Invalid {
                name: "TABLE_PREFIX",
                value: table_prefix,
            });
        }

        Ok(Self {
            database_url,
            table_prefix,
            http_port: parse_or(&lookup, "HTTP_PORT", DEFAULT_HTTP_PORT)?,
            max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            )?,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.http_port))
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, Error> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| Error::Invalid { name, value }),
    }
}
