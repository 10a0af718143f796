// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./flags_test.rs"]
mod flags_test;

use std::fmt::Display;
use std::ops::{BitOr, BitOrAssign};

//
// ReachabilityFlags
//

/// The flag set a platform reports for a reachability target. Other than `is_reachable()` the
/// bits are passed through untouched.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ReachabilityFlags(u32);

impl ReachabilityFlags {
  pub const TRANSIENT_CONNECTION: Self = Self(1 << 0);
  pub const REACHABLE: Self = Self(1 << 1);
  pub const CONNECTION_REQUIRED: Self = Self(1 << 2);
  pub const CONNECTION_ON_TRAFFIC: Self = Self(1 << 3);
  pub const INTERVENTION_REQUIRED: Self = Self(1 << 4);
  pub const CONNECTION_ON_DEMAND: Self = Self(1 << 5);
  pub const IS_LOCAL_ADDRESS: Self = Self(1 << 16);
  pub const IS_DIRECT: Self = Self(1 << 17);

  const NAMES: [(Self, &'static str); 8] = [
    (Self::TRANSIENT_CONNECTION, "transient_connection"),
    (Self::REACHABLE, "reachable"),
    (Self::CONNECTION_REQUIRED, "connection_required"),
    (Self::CONNECTION_ON_TRAFFIC, "connection_on_traffic"),
    (Self::INTERVENTION_REQUIRED, "intervention_required"),
    (Self::CONNECTION_ON_DEMAND, "connection_on_demand"),
    (Self::IS_LOCAL_ADDRESS, "is_local_address"),
    (Self::IS_DIRECT, "is_direct"),
  ];

  #[must_use]
  pub const fn empty() -> Self {
    Self(0)
  }

  #[must_use]
  pub const fn from_bits(bits: u32) -> Self {
    Self(bits)
  }

  #[must_use]
  pub const fn bits(self) -> u32 {
    self.0
  }

  #[must_use]
  pub const fn is_empty(self) -> bool {
    self.0 == 0
  }

  #[must_use]
  pub const fn contains(self, other: Self) -> bool {
    self.0 & other.0 == other.0
  }

  /// The only predicate the awaiter consults.
  #[must_use]
  pub const fn is_reachable(self) -> bool {
    self.contains(Self::REACHABLE)
  }
}

impl BitOr for ReachabilityFlags {
  type Output = Self;

  fn bitor(self, rhs: Self) -> Self {
    Self(self.0 | rhs.0)
  }
}

impl BitOrAssign for ReachabilityFlags {
  fn bitor_assign(&mut self, rhs: Self) {
    self.0 |= rhs.0;
  }
}

impl Display for ReachabilityFlags {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if self.is_empty() {
      return write!(f, "none");
    }

    let mut remaining = self.0;
    let mut first = true;
    for (flag, name) in Self::NAMES {
      if self.contains(flag) {
        if !first {
          write!(f, "|")?;
        }
        write!(f, "{name}")?;
        first = false;
        remaining &= !flag.0;
      }
    }

    // Bits we don't have a name for.
    if remaining != 0 {
      if !first {
        write!(f, "|")?;
      }
      write!(f, "{remaining:#x}")?;
    }

    Ok(())
  }
}

impl std::fmt::Debug for ReachabilityFlags {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "ReachabilityFlags({self})")
  }
}
