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

//! Turns a platform reachability callback API into a one-shot future that completes once the
//! network can route to the wildcard ("any route") address.

pub mod awaiter;
pub mod dispatch;
pub mod flags;
pub mod platform;
mod registration;
pub mod test;

#[cfg(test)]
#[ctor::ctor]
fn test_global_init() {
  bd_test_helpers::test_global_init();
}

pub use awaiter::{CancelHandle, Reachable, ReachabilityAwaiter, ReachabilityConfig};
pub use dispatch::DispatchQueue;
pub use flags::ReachabilityFlags;
pub use platform::{ReachabilityCallback, ReachabilityPlatform, ReachabilityTarget, WildcardTarget};

//
// ReachabilityError
//

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReachabilityError {
  /// Any platform setup step failed: target creation, callback attach or execution context bind.
  #[error("could not initialize reachability")]
  InitializationFailed,
  #[error("reachability wait was cancelled")]
  Cancelled,
}

pub type Result<T> = std::result::Result<T, ReachabilityError>;
