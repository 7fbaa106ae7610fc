//! Log sinks: a daily rotating file under the storage root plus stderr.

use crate::error::{DdnsError, Result};
use crate::storage::ensure_dir;
use std::fmt;
use std::path::Path;
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{filter_fn, EnvFilter};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Name used for the log file and the channel column of each entry.
pub const CHANNEL: &str = "route53";

/// Target of the events kept in the log file. Everything else is stderr only.
pub const FILE_TARGET: &str = "route53";

/// Rotated files kept on disk.
pub const MAX_LOG_FILES: usize = 7;

/// Install the global subscriber.
///
/// Events with target [`FILE_TARGET`] at DEBUG and above go to
/// `<log_dir>/route53.<date>.log`; stderr follows `RUST_LOG`.
pub fn init(log_dir: &Path, verbose: bool) -> Result<()> {
    ensure_dir(log_dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(CHANNEL)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(log_dir)
        .map_err(|e| DdnsError::FilesystemSetupFailed {
            path: log_dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        })?;

    let default_filter = if verbose { "debug" } else { "info" };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        );

    tracing_subscriber::registry()
        .with(file_layer(appender))
        .with(stderr_layer)
        .try_init()
        .map_err(|e| DdnsError::Config(format!("logging already initialised: {}", e)))
}

/// The log file layer, writing to `writer`.
pub fn file_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .event_format(ChannelFormat::new(CHANNEL))
        .with_filter(filter_fn(is_file_event))
}

fn is_file_event(metadata: &Metadata<'_>) -> bool {
    // exact match: module targets such as `route53_ddns::updater` share the prefix
    metadata.target() == FILE_TARGET && *metadata.level() <= Level::DEBUG
}

/// Terminal log entries for a failed run: the category headline, then the message.
pub fn record_failure(err: &DdnsError) {
    if let Some(headline) = err.headline() {
        tracing::error!(target: FILE_TARGET, "{}", headline);
    }
    tracing::error!(target: FILE_TARGET, "{}", err.detail());
}

/// `[timestamp] channel.LEVEL: message fields memory_peak_usage="N MB"`
pub struct ChannelFormat {
    channel: &'static str,
}

impl ChannelFormat {
    pub fn new(channel: &'static str) -> Self {
        Self { channel }
    }
}

impl<S, N> FormatEvent<S, N> for ChannelFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "[{}] {}.{}: ",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f%:z"),
            self.channel,
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        if let Some(peak) = memory::peak_usage() {
            write!(writer, " memory_peak_usage=\"{}\"", peak)?;
        }
        writeln!(writer)
    }
}

mod memory {
    /// Peak resident set size, formatted in megabytes.
    #[cfg(target_os = "linux")]
    pub fn peak_usage() -> Option<String> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        let kib: u64 = status
            .lines()
            .find_map(|line| line.strip_prefix("VmHWM:"))?
            .trim()
            .trim_end_matches("kB")
            .trim()
            .parse()
            .ok()?;
        Some(format_megabytes(kib))
    }

    #[cfg(not(target_os = "linux"))]
    pub fn peak_usage() -> Option<String> {
        None
    }

    pub fn format_megabytes(kib: u64) -> String {
        let mb = kib as f64 / 1024.0;
        let rounded = format!("{:.2}", mb);
        let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
        format!("{} MB", trimmed)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_format_megabytes() {
            assert_eq!(format_megabytes(2048), "2 MB");
            assert_eq!(format_megabytes(3584), "3.5 MB");
            assert_eq!(format_megabytes(1300), "1.27 MB");
        }

        #[cfg(target_os = "linux")]
        #[test]
        fn test_peak_usage_is_reported() {
            let peak = peak_usage().unwrap();
            assert!(peak.ends_with(" MB"));
        }
    }
}
