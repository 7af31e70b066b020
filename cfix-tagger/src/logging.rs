//! Log subscriber setup for the `cfix` binary
//!
//! The subscriber is installed before the configuration is read, filtered by
//! `RUST_LOG` or [`DEFAULT_LOG_LEVEL`]. Once the config is loaded,
//! [`LogControl::apply_config_level`] swaps in the configured level unless
//! `RUST_LOG` was set.

use cfix_common::{Error, Result};
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Filter used until the configured level is known
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Handle for replacing the filter of an installed subscriber
pub struct LogControl {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogControl {
    /// True when the filter came from `RUST_LOG`
    pub fn from_env(&self) -> bool {
        self.from_env
    }

    /// Switch to the configured level; returns false when `RUST_LOG` wins
    ///
    /// # Errors
    /// `Error::Config` if `level` is not a valid filter directive.
    pub fn apply_config_level(&self, level: &str) -> Result<bool> {
        if self.from_env {
            return Ok(false);
        }
        let filter = EnvFilter::try_new(level)
            .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", level, e)))?;
        self.handle
            .reload(filter)
            .map_err(|e| Error::Internal(format!("Failed to apply log level: {}", e)))?;
        Ok(true)
    }
}

/// `RUST_LOG` if set and valid, else [`DEFAULT_LOG_LEVEL`]
pub fn startup_filter() -> (EnvFilter, bool) {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(DEFAULT_LOG_LEVEL), false),
    }
}

/// Fmt subscriber behind a reloadable filter, writing to `make_writer`
pub fn subscriber<W>(
    filter: EnvFilter,
    from_env: bool,
    make_writer: W,
) -> (impl Subscriber + Send + Sync + 'static, LogControl)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(filter);
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer));
    (subscriber, LogControl { handle, from_env })
}

/// Install the global subscriber on stdout
pub fn init() -> LogControl {
    let (filter, from_env) = startup_filter();
    let (subscriber, control) = subscriber(filter, from_env, std::io::stdout);
    subscriber.init();
    control
}
