// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./monitor_test.rs"]
mod monitor_test;

use crate::RouteMonitorConfig;
use crate::route_table::{parse_routes, wildcard_flags};
use anyhow::{Context, bail};
use bd_log::warn_every;
use bd_reachability::{
  DispatchQueue,
  ReachabilityCallback,
  ReachabilityFlags,
  ReachabilityPlatform,
  ReachabilityTarget,
  WildcardTarget,
};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::ext::NumericalDuration;
use tokio::sync::oneshot;

//
// RouteTablePlatform
//

/// A reachability platform backed by the kernel routing tables. A target is reachable when its
/// address family has a usable default route. Registered targets poll their table and report
/// changes on the bound dispatch queue.
pub struct RouteTablePlatform {
  config: RouteMonitorConfig,
  runtime: tokio::runtime::Handle,
}

impl RouteTablePlatform {
  /// Pollers are spawned onto `runtime`.
  #[must_use]
  pub fn new(config: RouteMonitorConfig, runtime: tokio::runtime::Handle) -> Self {
    Self { config, runtime }
  }

  fn table_path(&self, target: WildcardTarget) -> &Path {
    match target {
      WildcardTarget::V4 => &self.config.ipv4_route_table,
      WildcardTarget::V6 => &self.config.ipv6_route_table,
    }
  }
}

impl ReachabilityPlatform for RouteTablePlatform {
  fn create_target(&self, target: WildcardTarget) -> anyhow::Result<Box<dyn ReachabilityTarget>> {
    let path = self.table_path(target);
    if !path.is_file() {
      bail!("route table {} is not available", path.display());
    }

    log::debug!(
      "created route table target for {} from {}",
      target.socket_addr(),
      path.display()
    );

    Ok(Box::new(RouteTarget {
      target,
      path: path.to_path_buf(),
      poll_interval: self.config.poll_interval,
      runtime: self.runtime.clone(),
      state: Mutex::default(),
    }))
  }
}

fn flags_from_contents(
  target: WildcardTarget,
  path: &Path,
  contents: &str,
) -> anyhow::Result<ReachabilityFlags> {
  let routes = parse_routes(target, contents)
    .with_context(|| format!("failed to parse {}", path.display()))?;
  Ok(wildcard_flags(&routes))
}

//
// RouteTarget
//

#[derive(Default)]
struct TargetState {
  callback: Option<ReachabilityCallback>,
  queue: Option<DispatchQueue>,
  shutdown_tx: Option<oneshot::Sender<()>>,
}

struct RouteTarget {
  target: WildcardTarget,
  path: PathBuf,
  poll_interval: Duration,
  runtime: tokio::runtime::Handle,
  state: Mutex<TargetState>,
}

impl RouteTarget {
  // Starts polling once both a callback and a queue are set.
  fn maybe_start_polling(&self, state: &mut TargetState) {
    if state.shutdown_tx.is_some() {
      return;
    }
    let (Some(callback), Some(queue)) = (state.callback.clone(), state.queue.clone()) else {
      return;
    };

    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
    state.shutdown_tx = Some(shutdown_tx);

    let target = self.target;
    let path = self.path.clone();
    let poll_interval = self.poll_interval;

    log::debug!(
      "polling {} every {poll_interval:?} for {}",
      path.display(),
      queue.label()
    );

    self.runtime.spawn(async move {
      let mut interval = tokio::time::interval(poll_interval);
      interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
      let mut last_flags = None;

      loop {
        tokio::select! {
          _ = interval.tick() => {
            let flags = match tokio::fs::read_to_string(&path).await {
              Ok(contents) => flags_from_contents(target, &path, &contents),
              Err(e) => Err(e.into()),
            };

            match flags {
              Ok(flags) if last_flags != Some(flags) => {
                last_flags = Some(flags);
                let callback = callback.clone();
                queue.dispatch(move || callback(flags));
              },
              Ok(_) => {},
              Err(e) => {
                warn_every!(
                  30.seconds(),
                  "failed to read route table {}: {:?}",
                  path.display(),
                  e
                );
              },
            }
          }
          _ = &mut shutdown_rx => {
            break;
          }
        }
      }

      log::debug!("stopped polling {}", path.display());
    });
  }

  fn stop_polling(state: &mut TargetState) {
    if let Some(shutdown_tx) = state.shutdown_tx.take() {
      let _ignored = shutdown_tx.send(());
    }
  }
}

impl ReachabilityTarget for RouteTarget {
  fn flags(&self) -> anyhow::Result<ReachabilityFlags> {
    let contents = std::fs::read_to_string(&self.path)
      .with_context(|| format!("failed to read {}", self.path.display()))?;
    flags_from_contents(self.target, &self.path, &contents)
  }

  fn set_callback(&self, callback: ReachabilityCallback) -> anyhow::Result<()> {
    let mut state = self.state.lock();
    state.callback = Some(callback);
    self.maybe_start_polling(&mut state);
    Ok(())
  }

  fn set_execution_context(&self, queue: DispatchQueue) -> anyhow::Result<()> {
    let mut state = self.state.lock();
    state.queue = Some(queue);
    self.maybe_start_polling(&mut state);
    Ok(())
  }

  fn clear_callback(&self) {
    let mut state = self.state.lock();
    state.callback = None;
    Self::stop_polling(&mut state);
  }

  fn clear_execution_context(&self) {
    let mut state = self.state.lock();
    state.queue = None;
    Self::stop_polling(&mut state);
  }
}

impl Drop for RouteTarget {
  fn drop(&mut self) {
    Self::stop_polling(self.state.get_mut());
  }
}
