// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use core::fmt;

/// Identifies one BSS, used as the key for its timer and beacon
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApId(pub u32);

impl fmt::Display for ApId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bss{}", self.0)
    }
}

/// Operational state of an access point as far as the sampler cares
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AccessPoint {
    pub id: ApId,
    /// Beacon template has been handed to the driver
    pub beacon_set_done: bool,
    /// AP is up and serving stations
    pub started: bool,
    /// Associated stations, reported in the BSS Load element
    pub station_count: u16,
}

impl AccessPoint {
    pub fn new(id: ApId) -> Self {
        Self {
            id,
            beacon_set_done: false,
            started: false,
            station_count: 0,
        }
    }

    /// Updates only run once the beacon is set and the AP is started
    pub fn is_ready(&self) -> bool {
        self.beacon_set_done && self.started
    }
}
