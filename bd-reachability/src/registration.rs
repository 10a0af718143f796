// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use crate::dispatch::DispatchQueue;
use crate::platform::{ReachabilityCallback, ReachabilityTarget};
use std::sync::atomic::{AtomicBool, Ordering};

//
// Registration
//

/// Owns a platform target that has a callback attached and is bound to an execution context.
/// `release()` detaches both exactly once no matter how many terminal paths race to call it.
pub struct Registration {
  target: Box<dyn ReachabilityTarget>,
  released: AtomicBool,
}

impl Registration {
  /// Attaches the callback and binds the queue. On failure whatever was already attached is
  /// detached again before returning.
  pub fn register(
    target: Box<dyn ReachabilityTarget>,
    callback: ReachabilityCallback,
    queue: DispatchQueue,
  ) -> anyhow::Result<Self> {
    target.set_callback(callback)?;

    if let Err(e) = target.set_execution_context(queue) {
      target.clear_callback();
      return Err(e);
    }

    Ok(Self {
      target,
      released: AtomicBool::new(false),
    })
  }

  /// Returns whether this call performed the teardown.
  pub fn release(&self) -> bool {
    if self.released.swap(true, Ordering::AcqRel) {
      return false;
    }

    log::debug!("releasing reachability registration");
    self.target.clear_callback();
    self.target.clear_execution_context();
    true
  }
}

impl Drop for Registration {
  fn drop(&mut self) {
    self.release();
  }
}
