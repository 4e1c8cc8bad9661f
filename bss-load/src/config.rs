// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use derive_new::new;
use thiserror::Error;

use core::ops::RangeInclusive;
use core::str::FromStr;

pub const UPDATE_PERIOD_KEY: &str = "bss_load_update_period";
pub const AVG_PERIOD_KEY: &str = "chan_util_avg_period";
pub const BEACON_INTERVAL_KEY: &str = "beacon_int";

pub const UPDATE_PERIOD_RANGE: RangeInclusive<u32> = 0..=100;
pub const AVG_PERIOD_RANGE: RangeInclusive<u32> = 0..=u32::MAX;
pub const BEACON_INTERVAL_RANGE: RangeInclusive<u32> = 15..=65535;

pub const DEFAULT_BEACON_INTERVAL: u32 = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "invalid BSS load update configuration (period={update_period} beacon_int={beacon_interval})"
    )]
    InvalidUpdateTimeout {
        update_period: u32,
        beacon_interval: u32,
    },
    #[error("invalid {key} {value} (expected {min}..={max})")]
    OutOfRange {
        key: &'static str,
        value: i64,
        min: u32,
        max: u32,
    },
    #[error("invalid {key} value '{value}'")]
    NotANumber { key: &'static str, value: String },
    #[error("line {0}: expected key=value")]
    MalformedLine(usize),
    #[error("line {line}: {source}")]
    Line {
        line: usize,
        source: Box<ConfigError>,
    },
}

/// Per access point sampler configuration
///
/// Read only while a sampler is armed, swap it through
/// [crate::sampler::Sampler::reload].
#[derive(new, Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Number of beacon intervals between channel utilization updates, 0 disables updates
    pub update_period: u32,
    /// Beacon interval in milliseconds
    pub beacon_interval: u32,
    /// Number of update periods to average over, 0 disables averaging
    pub avg_period: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            update_period: 0,
            beacon_interval: DEFAULT_BEACON_INTERVAL,
            avg_period: 0,
        }
    }
}

impl Config {
    /// BSS load updates only run when an update period is configured
    pub fn is_enabled(&self) -> bool {
        self.update_period != 0
    }

    pub fn is_averaging(&self) -> bool {
        self.avg_period != 0
    }

    /// Apply a single `key=value` pair.
    ///
    /// Returns `Ok(false)` for keys owned by other subsystems so callers can pass every line of a
    /// shared configuration file through.
    pub fn set(&mut self, key: &str, value: &str) -> Result<bool, ConfigError> {
        match key {
            UPDATE_PERIOD_KEY => {
                self.update_period =
                    parse_in_range(UPDATE_PERIOD_KEY, value, UPDATE_PERIOD_RANGE)?
            }
            AVG_PERIOD_KEY => {
                self.avg_period = parse_in_range(AVG_PERIOD_KEY, value, AVG_PERIOD_RANGE)?
            }
            BEACON_INTERVAL_KEY => {
                self.beacon_interval =
                    parse_in_range(BEACON_INTERVAL_KEY, value, BEACON_INTERVAL_RANGE)?
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

fn parse_in_range(
    key: &'static str,
    value: &str,
    range: RangeInclusive<u32>,
) -> Result<u32, ConfigError> {
    let parsed: i64 = value.parse().map_err(|_| ConfigError::NotANumber {
        key,
        value: value.into(),
    })?;
    match u32::try_from(parsed) {
        Ok(v) if range.contains(&v) => Ok(v),
        _ => Err(ConfigError::OutOfRange {
            key,
            value: parsed,
            min: *range.start(),
            max: *range.end(),
        }),
    }
}

/// Parses hostapd style configuration text, blank lines and `#` comments are skipped
impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config = Config::default();
        for (index, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or(ConfigError::MalformedLine(index + 1))?;
            config
                .set(key.trim(), value.trim())
                .map_err(|e| ConfigError::Line {
                    line: index + 1,
                    source: Box::new(e),
                })?;
        }
        Ok(config)
    }
}
