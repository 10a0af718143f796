// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./route_table_test.rs"]
mod route_table_test;

use anyhow::{Context, anyhow, bail};
use bd_reachability::{ReachabilityFlags, WildcardTarget};

// Route flags from linux/route.h.
const RTF_UP: u32 = 0x0001;
const RTF_GATEWAY: u32 = 0x0002;
const RTF_REJECT: u32 = 0x0200;

const LOOPBACK_IFACE: &str = "lo";

//
// Route
//

/// The parts of a kernel routing table entry that matter for wildcard reachability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
  pub iface: String,
  /// Destination and prefix are both zero.
  pub default: bool,
  pub up: bool,
  pub reject: bool,
  /// Traffic goes through a next hop rather than directly out of the interface.
  pub gateway: bool,
}

impl Route {
  fn routes_wildcard(&self) -> bool {
    self.default && self.up && !self.reject && self.iface != LOOPBACK_IFACE
  }
}

fn hex_u32(field: &str, name: &str) -> anyhow::Result<u32> {
  u32::from_str_radix(field, 16).with_context(|| format!("invalid {name} {field:?}"))
}

fn is_zero_hex(field: &str) -> bool {
  field.bytes().all(|b| b == b'0')
}

/// Parses the contents of `/proc/net/route`. The first line is a column header.
pub fn parse_ipv4_routes(contents: &str) -> anyhow::Result<Vec<Route>> {
  contents
    .lines()
    .skip(1)
    .filter(|line| !line.trim().is_empty())
    .enumerate()
    .map(|(index, line)| {
      let fields: Vec<&str> = line.split_whitespace().collect();
      if fields.len() < 8 {
        bail!("route line {} has {} fields", index + 1, fields.len());
      }

      let destination = hex_u32(fields[1], "destination")?;
      let gateway = hex_u32(fields[2], "gateway")?;
      let flags = hex_u32(fields[3], "flags")?;
      let mask = hex_u32(fields[7], "mask")?;

      Ok(Route {
        iface: fields[0].to_string(),
        default: destination == 0 && mask == 0,
        up: flags & RTF_UP != 0,
        reject: flags & RTF_REJECT != 0,
        gateway: flags & RTF_GATEWAY != 0 || gateway != 0,
      })
    })
    .collect()
}

/// Parses the contents of `/proc/net/ipv6_route`, which has no header.
pub fn parse_ipv6_routes(contents: &str) -> anyhow::Result<Vec<Route>> {
  contents
    .lines()
    .filter(|line| !line.trim().is_empty())
    .enumerate()
    .map(|(index, line)| {
      let fields: Vec<&str> = line.split_whitespace().collect();
      if fields.len() < 10 {
        bail!("ipv6 route line {} has {} fields", index + 1, fields.len());
      }

      let destination = fields[0];
      let next_hop = fields[4];
      for (name, address) in [("destination", destination), ("next hop", next_hop)] {
        if address.len() != 32 || !address.bytes().all(|b| b.is_ascii_hexdigit()) {
          return Err(anyhow!("invalid {name} {address:?}"));
        }
      }

      let prefix = hex_u32(fields[1], "prefix length")?;
      let flags = hex_u32(fields[8], "flags")?;

      Ok(Route {
        iface: fields[9].to_string(),
        default: is_zero_hex(destination) && prefix == 0,
        up: flags & RTF_UP != 0,
        reject: flags & RTF_REJECT != 0,
        gateway: flags & RTF_GATEWAY != 0 || !is_zero_hex(next_hop),
      })
    })
    .collect()
}

pub fn parse_routes(target: WildcardTarget, contents: &str) -> anyhow::Result<Vec<Route>> {
  match target {
    WildcardTarget::V4 => parse_ipv4_routes(contents),
    WildcardTarget::V6 => parse_ipv6_routes(contents),
  }
}

/// The flags for the wildcard address: reachable as soon as one usable default route exists,
/// and direct if any such route needs no gateway.
#[must_use]
pub fn wildcard_flags(routes: &[Route]) -> ReachabilityFlags {
  let mut flags = ReachabilityFlags::empty();
  for route in routes.iter().filter(|route| route.routes_wildcard()) {
    flags |= ReachabilityFlags::REACHABLE;
    if !route.gateway {
      flags |= ReachabilityFlags::IS_DIRECT;
    }
  }
  flags
}
