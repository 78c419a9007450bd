//! Logging setup for bridge consumers.
//!
//! The bridge only emits `tracing` events (unroller rewrites, diff
//! fallbacks, conversion decisions). Binaries that embed it install a
//! subscriber once with [`init_logging`]; everything is written to
//! **stderr** so stdout stays free for the plugin protocol.
//!
//! There is no global log redirection. Code that needs the bridge's logs for
//! a single call, such as a test asserting on a decision, installs a scoped
//! subscriber with [`with_scoped_logging`] or [`capture_logs`].
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: log filter (e.g. `info`, `hemmer_tf_bridge=debug`)
//!
//! ```bash
//! # Show the unroller's root and rewrite decisions
//! RUST_LOG=hemmer_tf_bridge::unrec=debug ./my-provider
//! ```

use std::io;
use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

/// Install the global subscriber, filtered by `RUST_LOG` (default `info`).
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Like [`init_logging`], with `default_level` used when `RUST_LOG` is unset.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(stderr_layer())
        .init();
}

/// Try to install the global subscriber, returning false if one is already
/// set.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(stderr_layer())
        .try_init()
        .is_ok()
}

/// Run `f` with a subscriber printing events up to `level` to stderr.
///
/// The subscriber is only active on the current thread for the duration of
/// `f`; the global subscriber is untouched.
pub fn with_scoped_logging<T>(level: Level, f: impl FnOnce() -> T) -> T {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(true)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

/// Run `f` and return its result with the events up to `level` it emitted,
/// rendered without timestamps or colors.
pub fn capture_logs<T>(level: Level, f: impl FnOnce() -> T) -> (T, String) {
    let sink = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(sink.clone())
        .with_ansi(false)
        .without_time()
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, sink.contents())
}

#[derive(Debug, Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        match self.0.lock() {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self
            .0
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    // The global subscriber can only be set once per process, so only the
    // scoped helpers are exercised here.

    use super::*;

    #[test]
    fn test_env_filter_parsing() {
        assert!(EnvFilter::try_new("info").is_ok());
        assert!(EnvFilter::try_new("hemmer_tf_bridge=debug").is_ok());
        assert!(EnvFilter::try_new("warn,hemmer_tf_bridge::unrec=debug").is_ok());
    }

    #[test]
    fn test_capture_logs_respects_level() {
        let (value, logs) = capture_logs(Level::INFO, || {
            tracing::info!(token = "pkg:index:Type", "Unrolled type");
            tracing::debug!("hidden");
            7
        });
        assert_eq!(value, 7);
        assert!(logs.contains("Unrolled type"));
        assert!(logs.contains("token=\"pkg:index:Type\""));
        assert!(!logs.contains("hidden"));
    }

    #[test]
    fn test_with_scoped_logging_returns_result() {
        assert_eq!(with_scoped_logging(Level::WARN, || 1 + 1), 2);
    }
}
