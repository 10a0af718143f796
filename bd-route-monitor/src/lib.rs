// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#![deny(
  clippy::expect_used,
  clippy::panic,
  clippy::todo,
  clippy::unimplemented,
  clippy::unreachable,
  clippy::unwrap_used
)]

pub mod monitor;
pub mod route_table;

#[cfg(test)]
#[ctor::ctor]
fn test_global_init() {
  bd_test_helpers::test_global_init();
}

pub use monitor::RouteTablePlatform;

use std::path::PathBuf;
use std::time::Duration;

//
// RouteMonitorConfig
//

/// Configuration for the routing table backed reachability platform.
#[derive(Debug, Clone)]
pub struct RouteMonitorConfig {
  /// How often a registered target re-reads its routing table. Defaults to 1 second.
  pub poll_interval: Duration,
  /// Defaults to `/proc/net/route`.
  pub ipv4_route_table: PathBuf,
  /// Defaults to `/proc/net/ipv6_route`.
  pub ipv6_route_table: PathBuf,
}

impl Default for RouteMonitorConfig {
  fn default() -> Self {
    Self {
      poll_interval: Duration::from_secs(1),
      ipv4_route_table: PathBuf::from("/proc/net/route"),
      ipv6_route_table: PathBuf::from("/proc/net/ipv6_route"),
    }
  }
}
