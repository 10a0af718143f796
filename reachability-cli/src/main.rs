// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use crate::cli::Options;
use bd_reachability::{ReachabilityAwaiter, ReachabilityConfig};
use bd_route_monitor::{RouteMonitorConfig, RouteTablePlatform};
use clap::Parser;
use std::sync::Arc;
use std::time::{Duration, Instant};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let options = Options::parse();

  bd_log::SwapLogger::initialize();
  if options.verbose {
    bd_log::SwapLogger::swap("debug")?;
  }

  let platform = Arc::new(RouteTablePlatform::new(
    RouteMonitorConfig {
      poll_interval: options.poll_interval(),
      ..Default::default()
    },
    tokio::runtime::Handle::current(),
  ));
  let awaiter = ReachabilityAwaiter::with_config(
    platform,
    ReachabilityConfig {
      target: options.family.into(),
      queue: None,
    },
  );

  let started = Instant::now();
  let mut reachable = awaiter.await_reachable();
  if !reachable.is_terminal() {
    log::info!("waiting for a {:?} default route", options.family);
  }

  let cancel = reachable.cancel_handle();
  let outcome = tokio::select! {
    outcome = &mut reachable => Some(outcome),
    () = expire(options.timeout()) => {
      log::warn!("gave up after {:?}", started.elapsed());
      cancel.cancel();
      None
    },
    _ = tokio::signal::ctrl_c() => {
      log::info!("interrupted");
      cancel.cancel();
      None
    },
  };

  // After a cancel the future reports the terminal outcome, which may still be success if the
  // route showed up at the same moment.
  match outcome {
    Some(outcome) => outcome?,
    None => reachable.await?,
  }
  log::info!("network reachable after {:?}", started.elapsed());
  Ok(())
}

async fn expire(timeout: Option<Duration>) {
  match timeout {
    Some(timeout) => tokio::time::sleep(timeout).await,
    None => std::future::pending().await,
  }
}
