// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

// Test code only.
#![allow(clippy::unwrap_used)]

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub fn test_global_init() {
  bd_log::SwapLogger::initialize_with(&bd_log::LogConfig {
    default_filter: "debug".to_string(),
    ..Default::default()
  });
}

/// Writes `contents` to a fresh temporary file that lives as long as the returned handle.
#[must_use]
pub fn temp_file_with(contents: &str) -> NamedTempFile {
  let mut file = NamedTempFile::new().unwrap();
  file.write_all(contents.as_bytes()).unwrap();
  file.flush().unwrap();
  file
}

/// Replaces the contents of an existing file.
pub fn rewrite_file(path: &Path, contents: &str) {
  std::fs::write(path, contents).unwrap();
}
