//! Public IP discovery.

use crate::error::{DdnsError, Result};
use std::fmt;
use std::time::Duration;

/// A public IPv4 address in dotted-quad form, as reported by the discovery service.
///
/// Only the shape is checked: four groups of ASCII digits separated by dots.
/// Octet values are deliberately not range-checked, so `999.999.999.999` is
/// accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicAddress(String);

impl PublicAddress {
    /// Trim surrounding whitespace and validate the dotted-quad shape.
    pub fn parse(raw: &str) -> Result<Self> {
        let candidate = raw.trim();
        if is_dotted_quad(candidate) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(DdnsError::DiscoveryMalformed(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublicAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_dotted_quad(s: &str) -> bool {
    let groups: Vec<&str> = s.split('.').collect();
    groups.len() == 4
        && groups
            .iter()
            .all(|g| !g.is_empty() && g.bytes().all(|b| b.is_ascii_digit()))
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Asks a single configured service for the caller's public address.
pub struct IpDetector {
    client: reqwest::Client,
    service: String,
}

impl IpDetector {
    /// Create a detector for the given service URL.
    pub fn new(service: impl Into<String>) -> Self {
        Self::with_timeout(service, DEFAULT_TIMEOUT)
    }

    /// Create a detector with a custom request timeout.
    pub fn with_timeout(service: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            service: service.into(),
        }
    }

    /// Detect the public IPv4 address.
    pub async fn detect_ipv4(&self) -> Result<PublicAddress> {
        let response = self
            .client
            .get(&self.service)
            .send()
            .await
            .map_err(|e| DdnsError::DiscoveryUnreachable(format!("{}: {}", self.service, e)))?;

        if !response.status().is_success() {
            return Err(DdnsError::DiscoveryUnreachable(format!(
                "HTTP {} from {}",
                response.status(),
                self.service
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DdnsError::DiscoveryUnreachable(format!("{}: {}", self.service, e)))?;

        let text = String::from_utf8(body.to_vec())
            .map_err(|e| DdnsError::DiscoveryMalformed(e.to_string()))?;

        let address = PublicAddress::parse(&text)?;
        tracing::debug!("Detected IPv4 {} from {}", address, self.service);
        Ok(address)
    }
}
