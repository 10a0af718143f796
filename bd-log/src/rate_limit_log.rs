// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./rate_limit_log_test.rs"]
mod rate_limit_log_test;

use parking_lot::Mutex;
use time::Duration;
use tokio::time::Instant;

//
// LogTracker
//

/// Remembers when a call site last logged at full level.
#[derive(Default)]
pub struct LogTracker {
  last_logged: Mutex<Option<Instant>>,
}

impl LogTracker {
  pub fn should_log(&self, interval: Duration) -> bool {
    let now = Instant::now();
    let mut last_logged = self.last_logged.lock();
    if last_logged.is_some_and(|last_logged| now - last_logged <= interval) {
      return false;
    }

    *last_logged = Some(now);
    true
  }
}

// Logs at warn at most once per interval for a given call site. Suppressed logs are emitted at
// debug instead. Evaluates to whether the record was logged at full level.
#[macro_export]
macro_rules! warn_every {
  ($interval:expr, $first:tt) => {
    $crate::log_every!(log::Level::Warn, $interval, "{}", $first)
  };
  ($interval:expr, $first:tt, $($arg:tt)+) => {
    $crate::log_every!(log::Level::Warn, $interval, $first, $($arg)+)
  };
}

#[macro_export]
macro_rules! error_every {
  ($interval:expr, $first:tt, $($arg:tt)+) => {
    $crate::log_every!(log::Level::Error, $interval, $first, $($arg)+)
  };
}

#[macro_export]
macro_rules! log_every {
  ($level:expr, $interval:expr, $first:tt, $($arg:tt)+) => {
    {
      use $crate::rate_limit_log::LogTracker;
      use std::sync::OnceLock;

      static TRACKER: OnceLock<LogTracker> = OnceLock::new();

      let full = TRACKER.get_or_init(LogTracker::default).should_log($interval);
      if full {
        log::log!($level, $first, $($arg)+);
      } else {
        log::debug!($first, $($arg)+);
      }
      full
    }
  };
}

pub use {error_every, log_every, warn_every};
