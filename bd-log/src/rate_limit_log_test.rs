// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use super::LogTracker;
use crate::{error_every, warn_every};
use time::ext::NumericalDuration;

#[tokio::test(start_paused = true)]
async fn tracker_limits_per_interval() {
  let tracker = LogTracker::default();

  assert!(tracker.should_log(1.seconds()));
  assert!(!tracker.should_log(1.seconds()));

  tokio::time::sleep(std::time::Duration::from_millis(500)).await;
  assert!(!tracker.should_log(1.seconds()));

  tokio::time::sleep(std::time::Duration::from_millis(501)).await;
  assert!(tracker.should_log(1.seconds()));
  assert!(!tracker.should_log(1.seconds()));
}

fn route_table_unreadable() -> bool {
  warn_every!(1.seconds(), "{}", "route table unreadable")
}

fn poll_failed(attempt: u32) -> bool {
  error_every!(1.seconds(), "poll {} failed", attempt)
}

fn plain_message() -> bool {
  warn_every!(1.seconds(), "plain message")
}

#[tokio::test(start_paused = true)]
async fn separate_call_sites_track_separately() {
  assert!(route_table_unreadable());
  assert!(!route_table_unreadable());

  // Each call site owns its own tracker, so the ones above don't suppress these.
  assert!(poll_failed(1));
  assert!(!poll_failed(2));
  assert!(plain_message());
  assert!(!plain_message());

  tokio::time::sleep(std::time::Duration::from_millis(1001)).await;
  assert!(route_table_unreadable());
  assert!(poll_failed(3));
  assert!(plain_message());
}
