// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./lib_test.rs"]
mod lib_test;

pub mod rate_limit_log;

use parking_lot::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::reload::Handle as ReloadHandle;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

const DEFAULT_FILTER_RULES: &str = "info";

//
// LogConfig
//

#[derive(Debug, Clone)]
pub struct LogConfig {
  /// Filter rules used when `RUST_LOG` is not set.
  pub default_filter: String,
  /// Colorize output. Defaults to whether `BD_LOG_ANSI` is set.
  pub ansi: bool,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      default_filter: DEFAULT_FILTER_RULES.to_string(),
      ansi: std::env::var("BD_LOG_ANSI").is_ok(),
    }
  }
}

//
// SwapLogger
//

// Installs a stderr tracing subscriber that also receives `log` records, and allows the filter to
// be swapped at runtime.
pub struct SwapLogger {
  handle: Mutex<Option<ReloadHandle<EnvFilter, Registry>>>,
}

impl SwapLogger {
  const fn new() -> Self {
    Self {
      handle: Mutex::new(None),
    }
  }

  fn get() -> &'static Self {
    static LOGGER: SwapLogger = SwapLogger::new();

    &LOGGER
  }

  // Initialize the logger with the default config. Later calls are ignored.
  pub fn initialize() {
    Self::initialize_with(&LogConfig::default());
  }

  pub fn initialize_with(config: &LogConfig) {
    let mut handle = Self::get().handle.lock();
    if handle.is_some() {
      return;
    }

    let stderr = tracing_subscriber::fmt::layer()
      .with_writer(std::io::stderr)
      .with_ansi(config.ansi)
      .with_line_number(true)
      .with_thread_names(true)
      .compact();

    let filter = EnvFilter::new(
      std::env::var("RUST_LOG")
        .as_deref()
        .unwrap_or(&config.default_filter),
    );

    let (filter, reload_handle) = tracing_subscriber::reload::Layer::new(filter);
    if let Err(e) = Registry::default().with(filter).with(stderr).try_init() {
      // Someone else installed a global subscriber first. Their output wins.
      eprintln!("failed to install logger: {e}");
      return;
    }

    *handle = Some(reload_handle);
  }

  // Swap in a new filter with the provided RUST_LOG string.
  pub fn swap(new_rust_log: &str) -> anyhow::Result<()> {
    Self::get()
      .handle
      .lock()
      .as_mut()
      .ok_or_else(|| anyhow::anyhow!("logger has not been initialized"))?
      .reload(new_rust_log)?;

    // During init the log level is set based on the initial RUST_LOG value. We need to manually
    // update it each time we reload the config as tracing_subscriber does not do this for us.
    log::set_max_level(tracing_log::AsLog::as_log(
      &tracing_subscriber::filter::LevelFilter::current(),
    ));

    Ok(())
  }
}
