// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::config::{Config, ConfigError};
use crate::trace::{debug, error};

use core::time::Duration;
use derive_new::new;

/// Delay before the next channel utilization update, split the way the timer service takes it.
///
/// `usecs` is not normalized and may exceed one second.
#[derive(new, Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct UpdateTimeout {
    pub secs: u64,
    pub usecs: u32,
}

impl UpdateTimeout {
    /// Rescale a millisecond timeout by 1024/1000 to the radio's time unit base.
    ///
    /// Whole seconds are truncated before scaling, so the scaled fraction of the last second is
    /// dropped from `secs` and only the sub-second remainder lands in `usecs`.
    pub const fn from_millis(timeout_ms: u64) -> Self {
        Self {
            secs: (((timeout_ms / 1000) as u128 * 1024) / 1000) as u64,
            // (999 * 1024) fits in a u32
            usecs: ((timeout_ms % 1000) * 1024) as u32,
        }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.secs).saturating_add(Duration::from_micros(self.usecs.into()))
    }
}

/// Compute the update timeout for `update_period` beacon intervals of `beacon_interval` ms.
///
/// This is the only place the sampler validates its configuration, both values must be
/// non-zero.
pub fn update_timeout(
    update_period: u32,
    beacon_interval: u32,
) -> Result<UpdateTimeout, ConfigError> {
    debug!(update_period, beacon_interval, "BSS load: computing update timeout");

    if update_period == 0 || beacon_interval == 0 {
        error!(
            "BSS load: invalid BSS load update configuration (period={} beacon_int={})",
            update_period, beacon_interval
        );
        return Err(ConfigError::InvalidUpdateTimeout {
            update_period,
            beacon_interval,
        });
    }

    let timeout_ms = u64::from(update_period) * u64::from(beacon_interval);
    let timeout = UpdateTimeout::from_millis(timeout_ms);
    debug!(
        timeout_ms,
        secs = timeout.secs,
        usecs = timeout.usecs,
        "BSS load: calculated update timeout"
    );
    Ok(timeout)
}

impl Config {
    pub fn update_timeout(&self) -> Result<UpdateTimeout, ConfigError> {
        update_timeout(self.update_period, self.beacon_interval)
    }
}
