// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use crate::dispatch::DispatchQueue;
use crate::flags::ReachabilityFlags;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

/// Invoked by the platform with the latest flags whenever they change.
pub type ReachabilityCallback = Arc<dyn Fn(ReachabilityFlags) + Send + Sync>;

//
// WildcardTarget
//

/// The only target that is ever monitored: the zero address of an address family, which the
/// platform reports as reachable as soon as any route is up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WildcardTarget {
  #[default]
  V4,
  V6,
}

impl WildcardTarget {
  #[must_use]
  pub const fn socket_addr(self) -> SocketAddr {
    match self {
      Self::V4 => SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
      Self::V6 => SocketAddr::new(std::net::IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
    }
  }
}

//
// ReachabilityPlatform
//

/// The platform reachability service.
#[cfg_attr(test, mockall::automock)]
pub trait ReachabilityPlatform: Send + Sync {
  /// Allocates a reachability reference for the wildcard target.
  fn create_target(&self, target: WildcardTarget) -> anyhow::Result<Box<dyn ReachabilityTarget>>;
}

//
// ReachabilityTarget
//

/// A platform reachability reference. Callbacks are only delivered once both a callback and an
/// execution context are set, and are always delivered on that execution context.
#[cfg_attr(test, mockall::automock)]
pub trait ReachabilityTarget: Send + Sync {
  /// Synchronously reads the current flags.
  fn flags(&self) -> anyhow::Result<ReachabilityFlags>;

  fn set_callback(&self, callback: ReachabilityCallback) -> anyhow::Result<()>;

  fn set_execution_context(&self, queue: DispatchQueue) -> anyhow::Result<()>;

  // Best effort.
  fn clear_callback(&self);

  // Best effort.
  fn clear_execution_context(&self);
}
