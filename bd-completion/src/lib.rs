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


use parking_lot::Mutex;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

//
// Resolver
//

/// A shareable, single-assignment completion handle. Any number of parties may race to complete
/// the value but only the first one to claim the sender wins; everyone after that observes `None`.
#[derive(Debug)]
pub struct Resolver<T: Debug> {
  tx: Mutex<Option<Sender<T>>>,
}

impl<T: Debug> Resolver<T> {
  #[must_use]
  pub fn new() -> (Self, Receiver<T>) {
    let (tx, rx) = Sender::new();

    (
      Self {
        tx: Mutex::new(Some(tx)),
      },
      rx,
    )
  }

  /// Takes the one-shot sender if no one has done so yet. Winning the claim is the terminal
  /// transition; the value is not observable by the receiver until the returned sender is used.
  #[must_use]
  pub fn claim(&self) -> Option<Sender<T>> {
    self.tx.lock().take()
  }

  /// Claims and sends in one step. Returns whether this call completed the value.
  pub fn resolve(&self, value: T) -> bool {
    self.claim().is_some_and(|tx| {
      tx.send(value);
      true
    })
  }

  #[must_use]
  pub fn is_claimed(&self) -> bool {
    self.tx.lock().is_none()
  }
}

//
// Sender
//

#[derive(Debug)]
pub struct Sender<T: Debug> {
  tx: tokio::sync::oneshot::Sender<T>,
}

impl<T: Debug> Sender<T> {
  #[must_use]
  pub fn new() -> (Self, Receiver<T>) {
    let (tx, rx) = tokio::sync::oneshot::channel();

    (Self { tx }, Receiver { rx })
  }

  pub fn send(self, value: T) {
    if let Err(e) = self.tx.send(value) {
      log::debug!("failed to send completion signal: {e:?}");
    }
  }
}

//
// Closed
//

/// Every sender was dropped without a value being sent.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("completion dropped without a value")]
pub struct Closed;

//
// Receiver
//

#[derive(Debug)]
pub struct Receiver<T: Debug> {
  rx: tokio::sync::oneshot::Receiver<T>,
}

impl<T: Debug> Receiver<T> {
  pub async fn recv(self) -> anyhow::Result<T> {
    match self.await {
      Ok(value) => Ok(value),
      Err(e) => anyhow::bail!("failed to receive completion signal: {e:?}"),
    }
  }

  /// Returns the value if it has already been sent, without waiting.
  pub fn try_recv(&mut self) -> Option<Result<T, Closed>> {
    match self.rx.try_recv() {
      Ok(value) => Some(Ok(value)),
      Err(tokio::sync::oneshot::error::TryRecvError::Closed) => Some(Err(Closed)),
      Err(tokio::sync::oneshot::error::TryRecvError::Empty) => None,
    }
  }

  /// Blocks the current thread until the value arrives. Must not be called from within an async
  /// execution context.
  pub fn blocking_recv(self) -> Result<T, Closed> {
    self.rx.blocking_recv().map_err(|_| Closed)
  }

  /// Waits up to `timeout` for the value. The receiver is left intact on timeout so the caller can
  /// keep waiting.
  pub fn blocking_recv_with_timeout(
    &mut self,
    timeout: Duration,
  ) -> Result<T, RecvWithTimeoutError> {
    let deadline = Instant::now() + timeout;

    loop {
      match self.try_recv() {
        Some(Ok(value)) => return Ok(value),
        Some(Err(Closed)) => return Err(RecvWithTimeoutError::ChannelClosed),
        None => {},
      }

      if Instant::now() > deadline {
        return Err(RecvWithTimeoutError::Timeout);
      }

      std::thread::sleep(Duration::from_millis(5));
    }
  }
}

impl<T: Debug> Future for Receiver<T> {
  type Output = Result<T, Closed>;

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    Pin::new(&mut self.rx).poll(cx).map_err(|_| Closed)
  }
}

#[derive(thiserror::Error, Debug)]
pub enum RecvWithTimeoutError {
  #[error("timeout duration reached")]
  Timeout,
  #[error("the oneshot channel was closed")]
  ChannelClosed,
}
