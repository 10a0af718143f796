// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./dispatch_test.rs"]
mod dispatch_test;

use parking_lot::{Condvar, Mutex};
use std::sync::{Arc, OnceLock};
use std::thread::ThreadId;
use tokio::sync::mpsc;

type Job = Box<dyn FnOnce() + Send>;

const MAIN_QUEUE_LABEL: &str = "reachability.main";

//
// DispatchQueue
//

/// A serial execution context. Jobs run one at a time, in submission order, on a dedicated named
/// thread. The thread exits once every handle to the queue has been dropped and the backlog has
/// drained.
#[derive(Clone)]
pub struct DispatchQueue {
  inner: Arc<Inner>,
}

struct Inner {
  label: String,
  tx: mpsc::UnboundedSender<Job>,
  thread_id: ThreadId,
}

impl DispatchQueue {
  pub fn new(label: impl Into<String>) -> anyhow::Result<Self> {
    let label = label.into();
    let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

    let worker = std::thread::Builder::new()
      .name(label.clone())
      .spawn(move || {
        while let Some(job) = rx.blocking_recv() {
          job();
        }
      })?;

    log::debug!("started dispatch queue {label}");

    Ok(Self {
      inner: Arc::new(Inner {
        thread_id: worker.thread().id(),
        label,
        tx,
      }),
    })
  }

  /// The process wide default queue, created on first use and never torn down.
  pub fn main() -> anyhow::Result<Self> {
    static MAIN: OnceLock<DispatchQueue> = OnceLock::new();

    if let Some(queue) = MAIN.get() {
      return Ok(queue.clone());
    }

    // If two threads race here the loser's queue is dropped, which stops its worker.
    let queue = Self::new(MAIN_QUEUE_LABEL)?;
    Ok(MAIN.get_or_init(|| queue).clone())
  }

  #[must_use]
  pub fn label(&self) -> &str {
    &self.inner.label
  }

  /// Whether the calling thread is this queue's worker.
  #[must_use]
  pub fn is_current(&self) -> bool {
    std::thread::current().id() == self.inner.thread_id
  }

  /// Enqueues a job and returns immediately.
  pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) {
    if self.inner.tx.send(Box::new(job)).is_err() {
      log::debug!("dispatch queue {} is gone, dropping job", self.inner.label);
    }
  }

  /// Runs a job on the queue and waits for it to finish. When called from the queue itself the
  /// job runs inline.
  pub fn dispatch_sync(&self, job: impl FnOnce() + Send + 'static) {
    if self.is_current() {
      job();
      return;
    }

    let done = Arc::new((Mutex::new(false), Condvar::new()));
    let signal = done.clone();
    // If the job is dropped without running (the worker is gone) the guard still wakes us up.
    let guard = DoneGuard(signal);
    self.dispatch(move || {
      let _guard = guard;
      job();
    });

    let (lock, condvar) = &*done;
    let mut finished = lock.lock();
    while !*finished {
      condvar.wait(&mut finished);
    }
  }
}

impl std::fmt::Debug for DispatchQueue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("DispatchQueue")
      .field("label", &self.inner.label)
      .finish_non_exhaustive()
  }
}

//
// DoneGuard
//

struct DoneGuard(Arc<(Mutex<bool>, Condvar)>);

impl Drop for DoneGuard {
  fn drop(&mut self) {
    let (lock, condvar) = &*self.0;
    *lock.lock() = true;
    condvar.notify_all();
  }
}
