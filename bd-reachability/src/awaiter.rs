// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./awaiter_test.rs"]
mod awaiter_test;

use crate::dispatch::DispatchQueue;
use crate::flags::ReachabilityFlags;
use crate::platform::{ReachabilityCallback, ReachabilityPlatform, ReachabilityTarget, WildcardTarget};
use crate::registration::Registration;
use crate::{ReachabilityError, Result};
use bd_completion::{RecvWithTimeoutError, Resolver};
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

//
// ReachabilityConfig
//

#[derive(Debug, Clone, Default)]
pub struct ReachabilityConfig {
  /// Which wildcard address to watch. Defaults to the IPv4 zero address.
  pub target: WildcardTarget,
  /// The execution context callbacks are delivered on. Defaults to `DispatchQueue::main()`.
  pub queue: Option<DispatchQueue>,
}

//
// ReachabilityAwaiter
//

/// Hands out futures that complete once the network is reachable. Every call to
/// `await_reachable()` is an independent attempt with its own platform registration.
pub struct ReachabilityAwaiter {
  platform: Arc<dyn ReachabilityPlatform>,
  config: ReachabilityConfig,
}

impl ReachabilityAwaiter {
  #[must_use]
  pub fn new(platform: Arc<dyn ReachabilityPlatform>) -> Self {
    Self::with_config(platform, ReachabilityConfig::default())
  }

  #[must_use]
  pub fn with_config(platform: Arc<dyn ReachabilityPlatform>, config: ReachabilityConfig) -> Self {
    Self { platform, config }
  }

  /// A single synchronous query. Nothing is registered.
  pub fn is_reachable_now(&self) -> Result<bool> {
    let target = self.create_target()?;
    let flags = target.flags().map_err(|e| {
      log::warn!("failed to query reachability flags: {e}");
      ReachabilityError::InitializationFailed
    })?;

    Ok(flags.is_reachable())
  }

  /// Returns a future that resolves once the network is reachable. If it already is, the future
  /// is complete before this returns and no callback is registered.
  #[must_use]
  pub fn await_reachable(&self) -> Reachable {
    match self.start() {
      Ok(Some((operation, rx))) => Reachable {
        state: State::Pending { operation, rx },
      },
      Ok(None) => Reachable::ready(Ok(())),
      Err(e) => Reachable::ready(Err(e)),
    }
  }

  fn create_target(&self) -> Result<Box<dyn ReachabilityTarget>> {
    self
      .platform
      .create_target(self.config.target)
      .map_err(|e| {
        log::warn!(
          "failed to create reachability target for {}: {e}",
          self.config.target.socket_addr()
        );
        ReachabilityError::InitializationFailed
      })
  }

  fn start(&self) -> Result<Option<(Arc<PendingOperation>, Receiver)>> {
    let target = self.create_target()?;

    // A failed flag query is treated the same as "not reachable yet" and we go on to wait for
    // the first callback.
    match target.flags() {
      Ok(flags) if flags.is_reachable() => {
        log::debug!("network already reachable ({flags})");
        return Ok(None);
      },
      Ok(flags) => log::debug!("network not reachable ({flags}), waiting for a route"),
      Err(e) => log::debug!("failed to query reachability flags, waiting for a route: {e}"),
    }

    let queue = match &self.config.queue {
      Some(queue) => queue.clone(),
      None => DispatchQueue::main().map_err(|e| {
        log::warn!("failed to start reachability dispatch queue: {e}");
        ReachabilityError::InitializationFailed
      })?,
    };

    PendingOperation::register(target, queue).map(Some)
  }
}

type Outcome = Result<()>;
type Receiver = bd_completion::Receiver<Outcome>;

//
// PendingOperation
//

/// Shared state of a wait that has a live platform registration. Completing it (by a reachable
/// callback, cancellation, or drop) tears the registration down before the outcome becomes
/// visible to the `Reachable` future.
struct PendingOperation {
  resolver: Resolver<Outcome>,
  registration: OnceLock<Registration>,
  // Set once the registration has been released after a terminal transition.
  terminal: AtomicBool,
}

impl PendingOperation {
  fn register(
    target: Box<dyn ReachabilityTarget>,
    queue: DispatchQueue,
  ) -> Result<(Arc<Self>, Receiver)> {
    let (resolver, rx) = Resolver::new();
    let operation = Arc::new(Self {
      resolver,
      registration: OnceLock::new(),
      terminal: AtomicBool::new(false),
    });

    let weak = Arc::downgrade(&operation);
    let callback: ReachabilityCallback = Arc::new(move |flags| {
      if let Some(operation) = weak.upgrade() {
        operation.on_flags(flags);
      }
    });

    // Setup runs on the queue so that no callback can be delivered before the registration is
    // stored.
    let result = Arc::new(Mutex::new(None));
    let setup_result = result.clone();
    let setup_operation = operation.clone();
    let setup_queue = queue.clone();
    queue.dispatch_sync(move || {
      let registered = Registration::register(target, callback, setup_queue).map(|registration| {
        let _ignored = setup_operation.registration.set(registration);
      });
      *setup_result.lock() = Some(registered);
    });

    let registered = result.lock().take();
    match registered {
      Some(Ok(())) => {
        log::debug!("registered for reachability changes on {}", queue.label());
        Ok((operation, rx))
      },
      Some(Err(e)) => {
        log::warn!("failed to register for reachability changes: {e}");
        Err(ReachabilityError::InitializationFailed)
      },
      None => {
        log::warn!(
          "dispatch queue {} dropped the reachability registration",
          queue.label()
        );
        Err(ReachabilityError::InitializationFailed)
      },
    }
  }

  fn on_flags(&self, flags: ReachabilityFlags) {
    if !flags.is_reachable() {
      log::debug!("reachability changed ({flags}), still waiting");
      return;
    }

    if self.complete(Ok(())) {
      log::debug!("network became reachable ({flags})");
    }
  }

  /// Performs the terminal transition. Returns false if some other path already did.
  fn complete(&self, outcome: Outcome) -> bool {
    let Some(tx) = self.resolver.claim() else {
      return false;
    };

    if let Some(registration) = self.registration.get() {
      registration.release();
    }
    self.terminal.store(true, Ordering::Release);
    tx.send(outcome);
    true
  }

  fn cancel(&self) -> bool {
    let cancelled = self.complete(Err(ReachabilityError::Cancelled));
    if cancelled {
      log::debug!("reachability wait cancelled");
    }
    cancelled
  }
}

//
// Reachable
//

/// Resolves with `Ok(())` once the network is reachable. Dropping it before it completes cancels
/// the wait.
#[must_use = "dropping the future cancels the wait"]
pub struct Reachable {
  state: State,
}

enum State {
  Ready(Outcome),
  Pending {
    operation: Arc<PendingOperation>,
    rx: Receiver,
  },
}

impl Reachable {
  fn ready(outcome: Outcome) -> Self {
    Self {
      state: State::Ready(outcome),
    }
  }

  /// Whether the wait has completed. A pending wait only reports terminal once its platform
  /// registration has been torn down.
  #[must_use]
  pub fn is_terminal(&self) -> bool {
    match &self.state {
      State::Ready(_) => true,
      State::Pending { operation, .. } => operation.terminal.load(Ordering::Acquire),
    }
  }

  /// A handle that can cancel this wait from any thread. Cancelling a completed wait is a no-op.
  #[must_use]
  pub fn cancel_handle(&self) -> CancelHandle {
    CancelHandle {
      operation: match &self.state {
        State::Ready(_) => None,
        State::Pending { operation, .. } => Some(Arc::downgrade(operation)),
      },
    }
  }

  pub fn cancel(&self) {
    if let State::Pending { operation, .. } = &self.state {
      operation.cancel();
    }
  }

  /// Blocks the calling thread until the wait completes. If the timeout expires first the wait is
  /// cancelled, unless it completed concurrently, in which case that outcome is returned. Must not
  /// be called from within an async execution context.
  pub fn wait_blocking(mut self, timeout: Option<Duration>) -> Outcome {
    let state = std::mem::replace(
      &mut self.state,
      State::Ready(Err(ReachabilityError::Cancelled)),
    );
    let (operation, mut rx) = match state {
      State::Ready(outcome) => return outcome,
      State::Pending { operation, rx } => (operation, rx),
    };

    let Some(timeout) = timeout else {
      return rx.blocking_recv().unwrap_or(Err(ReachabilityError::Cancelled));
    };

    match rx.blocking_recv_with_timeout(timeout) {
      Ok(outcome) => outcome,
      Err(RecvWithTimeoutError::Timeout) => {
        log::debug!("timed out after {timeout:?} waiting for reachability");
        if operation.cancel() {
          return Err(ReachabilityError::Cancelled);
        }

        // Lost the claim to a concurrent completion whose teardown is still running. Its outcome
        // is sent once teardown finishes.
        rx.blocking_recv().unwrap_or(Err(ReachabilityError::Cancelled))
      },
      Err(RecvWithTimeoutError::ChannelClosed) => Err(ReachabilityError::Cancelled),
    }
  }
}

impl Future for Reachable {
  type Output = Outcome;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();
    let outcome = match &mut this.state {
      State::Ready(outcome) => return Poll::Ready(*outcome),
      State::Pending { rx, .. } => match Pin::new(rx).poll(cx) {
        Poll::Pending => return Poll::Pending,
        Poll::Ready(received) => received.unwrap_or(Err(ReachabilityError::Cancelled)),
      },
    };

    this.state = State::Ready(outcome);
    Poll::Ready(outcome)
  }
}

impl Drop for Reachable {
  fn drop(&mut self) {
    if let State::Pending { operation, .. } = &self.state {
      operation.cancel();
    }
  }
}

impl std::fmt::Debug for Reachable {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Reachable")
      .field("terminal", &self.is_terminal())
      .finish()
  }
}

//
// CancelHandle
//

#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
  operation: Option<Weak<PendingOperation>>,
}

impl CancelHandle {
  /// Transitions a pending wait to cancelled and tears down its registration. Returns whether this
  /// call was the one that completed the wait.
  pub fn cancel(&self) -> bool {
    self
      .operation
      .as_ref()
      .and_then(Weak::upgrade)
      .is_some_and(|operation| operation.cancel())
  }
}
