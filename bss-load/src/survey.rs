// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::interface::Interface;
use crate::trace::warn;

use const_utils::u64::min;
use derive_new::new;
use thiserror::Error;

/// Full scale of the channel utilization field, 255 means the channel was always busy
pub const CHANNEL_UTILIZATION_MAX: u8 = 255;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurveyError {
    #[error("driver does not support channel surveys")]
    NotSupported,
    #[error("survey of {freq} MHz failed: {reason}")]
    Failed { freq: u32, reason: String },
}

/// Driver side of the sampler, asks the radio for channel survey counters.
pub trait SurveyProvider {
    /// Request a survey of `freq` for `iface`.
    ///
    /// Results are reported through [Interface::record_survey]. Providers that answer before
    /// returning give the sampler same tick values, asynchronous providers are observed one
    /// update period later.
    fn request_survey(&mut self, iface: &Interface, freq: u32) -> Result<(), SurveyError>;
}

/// Cumulative survey counters reported by the driver for one frequency.
///
/// Drivers may omit either counter, such reports carry no utilization information.
#[derive(new, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SurveyCounters {
    /// Frequency in MHz
    pub freq: u32,
    /// Time the radio spent on the channel
    pub channel_time: Option<u64>,
    /// Time the channel was sensed busy
    pub channel_time_busy: Option<u64>,
}

/// Previous counter values, utilization is computed from the delta against them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct SurveyBaseline {
    channel_time: u64,
    channel_time_busy: u64,
}

impl SurveyBaseline {
    /// Advance the baseline and return the busy ratio since the last report, scaled to
    /// [CHANNEL_UTILIZATION_MAX].
    pub(crate) fn update(&mut self, survey: &SurveyCounters) -> Option<u8> {
        let (Some(channel_time), Some(channel_time_busy)) =
            (survey.channel_time, survey.channel_time_busy)
        else {
            return None;
        };

        if channel_time < self.channel_time || channel_time_busy < self.channel_time_busy {
            warn!(
                freq = survey.freq,
                channel_time, channel_time_busy, "BSS load: survey counters went backwards"
            );
            self.channel_time = channel_time;
            self.channel_time_busy = channel_time_busy;
            return None;
        }

        let divisor = channel_time - self.channel_time;
        if divisor == 0 {
            return None;
        }
        let dividend = channel_time_busy - self.channel_time_busy;
        self.channel_time = channel_time;
        self.channel_time_busy = channel_time_busy;

        let scaled =
            (u128::from(dividend) * u128::from(CHANNEL_UTILIZATION_MAX)) / u128::from(divisor);
        let scaled = u64::try_from(scaled).unwrap_or(u64::MAX);
        Some(min(scaled, CHANNEL_UTILIZATION_MAX as u64) as u8)
    }
}
