// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

// Test code only.
#![allow(clippy::unwrap_used)]

use crate::dispatch::DispatchQueue;
use crate::flags::ReachabilityFlags;
use crate::platform::{ReachabilityCallback, ReachabilityPlatform, ReachabilityTarget, WildcardTarget};
use anyhow::anyhow;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

//
// Call
//

/// A platform call recorded by `FakeReachabilityPlatform`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
  CreateTarget(WildcardTarget),
  Flags,
  SetCallback,
  SetExecutionContext,
  ClearCallback,
  ClearExecutionContext,
}

//
// Failures
//

/// Which platform steps should fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct Failures {
  pub create_target: bool,
  pub flags: bool,
  pub set_callback: bool,
  pub set_execution_context: bool,
}

#[derive(Default)]
struct Shared {
  flags: ReachabilityFlags,
  failures: Failures,
  calls: Vec<Call>,
  callback: Option<ReachabilityCallback>,
  queue: Option<DispatchQueue>,
  // The last callback/queue pair that was ever attached, kept around after clearing so tests can
  // simulate a callback that was already in flight when the registration was torn down.
  last_registration: Option<(ReachabilityCallback, DispatchQueue)>,
  // How long clear_callback() blocks before detaching, to widen the window between the terminal
  // transition and teardown.
  teardown_delay: Option<Duration>,
}

//
// FakeReachabilityPlatform
//

/// An in-memory platform that records every call and lets the test drive callbacks.
#[derive(Clone, Default)]
pub struct FakeReachabilityPlatform {
  shared: Arc<Mutex<Shared>>,
}

impl FakeReachabilityPlatform {
  #[must_use]
  pub fn new(flags: ReachabilityFlags) -> Self {
    let platform = Self::default();
    platform.shared.lock().flags = flags;
    platform
  }

  #[must_use]
  pub fn failing(failures: Failures) -> Self {
    let platform = Self::default();
    platform.shared.lock().failures = failures;
    platform
  }

  pub fn set_flags(&self, flags: ReachabilityFlags) {
    self.shared.lock().flags = flags;
  }

  /// Makes `clear_callback()` sleep for `delay` before it detaches the callback.
  pub fn set_teardown_delay(&self, delay: Duration) {
    self.shared.lock().teardown_delay = Some(delay);
  }

  #[must_use]
  pub fn calls(&self) -> Vec<Call> {
    self.shared.lock().calls.clone()
  }

  #[must_use]
  pub fn call_count(&self, call: Call) -> usize {
    self.shared.lock().calls.iter().filter(|c| **c == call).count()
  }

  /// Whether a callback is attached and bound to an execution context.
  #[must_use]
  pub fn is_registered(&self) -> bool {
    let shared = self.shared.lock();
    shared.callback.is_some() && shared.queue.is_some()
  }

  /// Updates the flags and, if registered, delivers them to the callback on the bound queue,
  /// waiting for the callback to finish. Returns whether the callback was invoked.
  pub fn fire(&self, flags: ReachabilityFlags) -> bool {
    let registration = {
      let mut shared = self.shared.lock();
      shared.flags = flags;
      shared.callback.clone().zip(shared.queue.clone())
    };

    registration.is_some_and(|(callback, queue)| {
      queue.dispatch_sync(move || callback(flags));
      true
    })
  }

  /// Delivers flags to the most recently attached callback even if it has since been cleared.
  pub fn fire_stale(&self, flags: ReachabilityFlags) {
    let (callback, queue) = self.shared.lock().last_registration.clone().unwrap();
    queue.dispatch_sync(move || callback(flags));
  }
}

impl ReachabilityPlatform for FakeReachabilityPlatform {
  fn create_target(&self, target: WildcardTarget) -> anyhow::Result<Box<dyn ReachabilityTarget>> {
    let mut shared = self.shared.lock();
    shared.calls.push(Call::CreateTarget(target));
    if shared.failures.create_target {
      return Err(anyhow!("target allocation failed"));
    }

    Ok(Box::new(FakeTarget {
      shared: self.shared.clone(),
    }))
  }
}

//
// FakeTarget
//

struct FakeTarget {
  shared: Arc<Mutex<Shared>>,
}

impl ReachabilityTarget for FakeTarget {
  fn flags(&self) -> anyhow::Result<ReachabilityFlags> {
    let mut shared = self.shared.lock();
    shared.calls.push(Call::Flags);
    if shared.failures.flags {
      return Err(anyhow!("flags unavailable"));
    }
    Ok(shared.flags)
  }

  fn set_callback(&self, callback: ReachabilityCallback) -> anyhow::Result<()> {
    let mut shared = self.shared.lock();
    shared.calls.push(Call::SetCallback);
    if shared.failures.set_callback {
      return Err(anyhow!("callback rejected"));
    }
    shared.callback = Some(callback);
    Ok(())
  }

  fn set_execution_context(&self, queue: DispatchQueue) -> anyhow::Result<()> {
    let mut shared = self.shared.lock();
    shared.calls.push(Call::SetExecutionContext);
    if shared.failures.set_execution_context {
      return Err(anyhow!("queue rejected"));
    }
    let callback = shared.callback.clone().unwrap();
    shared.last_registration = Some((callback, queue.clone()));
    shared.queue = Some(queue);
    Ok(())
  }

  fn clear_callback(&self) {
    let teardown_delay = self.shared.lock().teardown_delay;
    if let Some(delay) = teardown_delay {
      std::thread::sleep(delay);
    }

    let mut shared = self.shared.lock();
    shared.calls.push(Call::ClearCallback);
    shared.callback = None;
  }

  fn clear_execution_context(&self) {
    let mut shared = self.shared.lock();
    shared.calls.push(Call::ClearExecutionContext);
    shared.queue = None;
  }
}
