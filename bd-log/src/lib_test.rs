// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use super::*;

// The logger is process global, so the whole lifecycle lives in one test.
#[test]
fn swap_requires_initialization() {
  assert_eq!(
    SwapLogger::swap("debug").unwrap_err().to_string(),
    "logger has not been initialized"
  );

  SwapLogger::initialize_with(&LogConfig {
    default_filter: "warn".to_string(),
    ansi: false,
  });
  // Already initialized, ignored.
  SwapLogger::initialize();

  SwapLogger::swap("debug").unwrap();
  assert_eq!(log::max_level(), log::LevelFilter::Debug);

  SwapLogger::swap("error").unwrap();
  assert_eq!(log::max_level(), log::LevelFilter::Error);
}
