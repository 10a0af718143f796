// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use bd_reachability::WildcardTarget;
use clap::Parser;
use std::time::Duration;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliFamily {
  V4,
  V6,
}

impl From<CliFamily> for WildcardTarget {
  fn from(family: CliFamily) -> Self {
    match family {
      CliFamily::V4 => Self::V4,
      CliFamily::V6 => Self::V6,
    }
  }
}

/// Waits until the network can route to the wildcard address of the given family.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Options {
  /// Address family whose default route to wait for
  #[clap(env = "WAIT_ONLINE_FAMILY", long, value_enum, default_value = "v4")]
  pub family: CliFamily,

  /// Give up after this many seconds. Waits forever when unset
  #[clap(env = "WAIT_ONLINE_TIMEOUT", long)]
  pub timeout: Option<u64>,

  /// How often to re-read the routing table, in milliseconds
  #[clap(env = "WAIT_ONLINE_POLL_INTERVAL_MS", long, default_value = "1000")]
  pub poll_interval_ms: u64,

  /// Log at debug level
  #[clap(short, long)]
  pub verbose: bool,
}

impl Options {
  #[must_use]
  pub fn timeout(&self) -> Option<Duration> {
    self.timeout.map(Duration::from_secs)
  }

  #[must_use]
  pub fn poll_interval(&self) -> Duration {
    Duration::from_millis(self.poll_interval_ms.max(1))
  }
}
