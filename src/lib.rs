//! # route53-ddns
//!
//! Keeps one AWS Route 53 `A` record pointed at the caller's public IPv4
//! address.
//!
//! Each invocation runs a single pass:
//!
//! 1. ask the configured discovery service for the public address,
//! 2. compare it with the last address pushed (`<storage>/cache/current.ip`),
//! 3. when they differ, UPSERT the record (TTL 300) and then update the cache.
//!
//! Scheduling is left to the caller (cron, systemd timers, ...).
//!
//! ## Usage
//!
//! ```bash
//! # Update the record if the address changed
//! route53-ddns
//!
//! # Show the public and cached addresses without changing anything
//! route53-ddns status
//! ```

pub mod cache;
pub mod config;
pub mod detector;
pub mod error;
pub mod logging;
pub mod route53;
pub mod storage;
pub mod updater;

pub use config::Config;
pub use detector::{IpDetector, PublicAddress};
pub use error::{DdnsError, Result};
pub use updater::{Outcome, Updater};
