//! Configuration for route53-ddns.
//!
//! Settings are environment-style keys. They are read exactly once at
//! startup and handed to the updater as a plain value.

use crate::error::{DdnsError, Result};
use std::fmt;
use std::path::Path;

/// Record type managed by the updater.
pub const RECORD_TYPE: &str = "A";

/// TTL advertised for the managed record, in seconds.
pub const RECORD_TTL: u32 = 300;

pub const KEY_SERVICE: &str = "SERVICE";
pub const KEY_REGION: &str = "AWS_REGION";
pub const KEY_ACCESS_KEY: &str = "AWS_KEY";
pub const KEY_SECRET_KEY: &str = "AWS_SECRET";
pub const KEY_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const KEY_ZONE: &str = "ROUTE53_ZONE";
pub const KEY_RECORD: &str = "ROUTE53_RECORD";
pub const KEY_ENDPOINT: &str = "ROUTE53_ENDPOINT";

/// Main configuration structure.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL answering with the caller's public IPv4 address as plain text.
    pub service_url: String,

    /// AWS access settings.
    pub aws: AwsConfig,

    /// The record kept in sync with the public address.
    pub target: RecordTarget,
}

/// AWS access settings.
#[derive(Clone)]
pub struct AwsConfig {
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    /// Session token for temporary credentials.
    pub session_token: Option<String>,
    /// Overrides the Route 53 endpoint derived from the region.
    pub endpoint_url: Option<String>,
}

impl fmt::Debug for AwsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsConfig")
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

/// Provider-side identity of the managed record. Type and TTL are fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTarget {
    /// Hosted zone id, without any `/hostedzone/` prefix.
    pub zone_id: String,
    /// Fully-qualified record name, e.g. `home.example.com.`.
    pub record_name: String,
}

impl RecordTarget {
    pub fn new(zone_id: &str, record_name: impl Into<String>) -> Self {
        let zone_id = zone_id.strip_prefix("/hostedzone/").unwrap_or(zone_id);
        Self {
            zone_id: zone_id.to_string(),
            record_name: record_name.into(),
        }
    }

    pub fn record_type(&self) -> &'static str {
        RECORD_TYPE
    }

    pub fn ttl(&self) -> u32 {
        RECORD_TTL
    }
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            optional(&lookup, key)
                .ok_or_else(|| DdnsError::Config(format!("{} is not set", key)))
        };

        let service_url = required(KEY_SERVICE)?;
        let aws = AwsConfig {
            region: required(KEY_REGION)?,
            access_key: required(KEY_ACCESS_KEY)?,
            secret_key: required(KEY_SECRET_KEY)?,
            session_token: optional(&lookup, KEY_SESSION_TOKEN),
            endpoint_url: optional(&lookup, KEY_ENDPOINT),
        };
        let target = RecordTarget::new(&required(KEY_ZONE)?, required(KEY_RECORD)?);

        if target.zone_id.is_empty() {
            return Err(DdnsError::Config(format!("{} is empty", KEY_ZONE)));
        }

        Ok(Self {
            service_url,
            aws,
            target,
        })
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Load `.env` style settings into the process environment.
///
/// Without an explicit path a missing `.env` in the working directory is fine.
/// Variables already present in the environment are never overridden.
pub fn load_env_file(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => dotenvy::from_path(path)
            .map_err(|e| DdnsError::Config(format!("{}: {}", path.display(), e))),
        None => match dotenvy::dotenv() {
            Ok(_) => Ok(()),
            Err(e) if e.not_found() => Ok(()),
            Err(e) => Err(DdnsError::Config(format!(".env: {}", e))),
        },
    }
}
