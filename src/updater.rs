//! The fetch, compare, apply, persist cycle.

use crate::cache::AddressCache;
use crate::config::{Config, RecordTarget};
use crate::detector::{IpDetector, PublicAddress};
use crate::error::Result;
use crate::logging::FILE_TARGET;
use crate::route53::{ChangeInfo, Route53Client};
use crate::storage::Storage;

/// What a run ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The public address matches the cache; nothing was touched.
    Unchanged { address: String },
    /// Route 53 accepted the new address and the cache now holds it.
    Updated {
        old: String,
        new: String,
        change: ChangeInfo,
    },
}

/// Read-only view used by `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub public: PublicAddress,
    pub cached: String,
}

impl Status {
    pub fn update_pending(&self) -> bool {
        self.public.as_str() != self.cached
    }
}

/// Keeps one Route 53 `A` record in line with the public address.
pub struct Updater {
    detector: IpDetector,
    cache: AddressCache,
    route53: Route53Client,
    target: RecordTarget,
}

impl Updater {
    pub fn new(config: &Config, storage: &Storage) -> Self {
        Self::from_parts(
            IpDetector::new(config.service_url.clone()),
            AddressCache::new(storage.cache_file()),
            Route53Client::new(&config.aws),
            config.target.clone(),
        )
    }

    pub fn from_parts(
        detector: IpDetector,
        cache: AddressCache,
        route53: Route53Client,
        target: RecordTarget,
    ) -> Self {
        Self {
            detector,
            cache,
            route53,
            target,
        }
    }

    /// Run the cycle once.
    ///
    /// The cache is only written after Route 53 has accepted the change.
    pub async fn run(&self) -> Result<Outcome> {
        let public = self.detector.detect_ipv4().await?;
        let cached = self.cache.load()?;

        if public.as_str() == cached {
            tracing::debug!("Address unchanged ({})", public);
            return Ok(Outcome::Unchanged { address: cached });
        }

        let change = self.route53.upsert_a_record(&self.target, &public).await?;
        self.cache.store(public.as_str())?;

        tracing::debug!(target: FILE_TARGET, old = %cached, new = %public, "Address updated");

        Ok(Outcome::Updated {
            old: cached,
            new: public.to_string(),
            change,
        })
    }

    /// Discover and read the cache without touching Route 53 or writing anything.
    pub async fn status(&self) -> Result<Status> {
        let public = self.detector.detect_ipv4().await?;
        let cached = self.cache.load()?;
        Ok(Status { public, cached })
    }
}
