// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use super::ReachabilityFlags;
use pretty_assertions::assert_eq;

#[test]
fn reachable_predicate() {
  assert!(!ReachabilityFlags::empty().is_reachable());
  assert!(ReachabilityFlags::REACHABLE.is_reachable());
  assert!((ReachabilityFlags::REACHABLE | ReachabilityFlags::IS_DIRECT).is_reachable());
  assert!(
    !(ReachabilityFlags::CONNECTION_REQUIRED | ReachabilityFlags::TRANSIENT_CONNECTION)
      .is_reachable()
  );
}

#[test]
fn reachable_with_connection_required_is_still_reachable() {
  // Only the reachable bit matters, the rest is passed through.
  let flags = ReachabilityFlags::REACHABLE | ReachabilityFlags::CONNECTION_REQUIRED;
  assert!(flags.is_reachable());
  assert!(flags.contains(ReachabilityFlags::CONNECTION_REQUIRED));
}

#[test]
fn bits_round_trip_unknown_bits() {
  let flags = ReachabilityFlags::from_bits(0x8000_0002);
  assert_eq!(flags.bits(), 0x8000_0002);
  assert!(flags.is_reachable());
}

#[test]
fn display() {
  assert_eq!(ReachabilityFlags::empty().to_string(), "none");
  assert_eq!(ReachabilityFlags::REACHABLE.to_string(), "reachable");

  let mut flags = ReachabilityFlags::REACHABLE;
  flags |= ReachabilityFlags::IS_DIRECT;
  assert_eq!(flags.to_string(), "reachable|is_direct");

  assert_eq!(
    ReachabilityFlags::from_bits(0x4000_0002).to_string(),
    "reachable|0x40000000"
  );
  assert_eq!(
    format!("{:?}", ReachabilityFlags::CONNECTION_ON_DEMAND),
    "ReachabilityFlags(connection_on_demand)"
  );
}
