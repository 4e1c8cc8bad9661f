// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

/// Channel utilization averaged over a window of update periods.
///
/// The window is counted in beacon intervals: each sample advances it by the update period of
/// the BSS that took it. Once the window reaches the averaging period the average is recomputed
/// from the samples collected and both accumulators restart from zero.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct UtilizationAverage {
    samples_sum: u32,
    num_sample_periods: u32,
    average: u32,
}

impl UtilizationAverage {
    pub const fn new() -> Self {
        Self {
            samples_sum: 0,
            num_sample_periods: 0,
            average: 0,
        }
    }

    pub fn samples_sum(&self) -> u32 {
        self.samples_sum
    }

    pub fn num_sample_periods(&self) -> u32 {
        self.num_sample_periods
    }

    /// Last computed average, 0 until the first window completes
    pub fn average(&self) -> u32 {
        self.average
    }

    /// Fold in one sample taken every `update_period` beacon intervals.
    ///
    /// Returns the new average when this sample completes an `avg_period` window. Does nothing
    /// when averaging is disabled (`avg_period == 0`) or `update_period` is 0.
    pub fn accumulate(&mut self, sample: u8, update_period: u32, avg_period: u32) -> Option<u32> {
        if avg_period == 0 || update_period == 0 {
            return None;
        }

        self.samples_sum = self.samples_sum.saturating_add(sample.into());
        self.num_sample_periods = self.num_sample_periods.saturating_add(update_period);
        if self.num_sample_periods < avg_period {
            return None;
        }

        // num_sample_periods >= update_period here, whole periods is never 0
        let whole_periods = self.num_sample_periods / update_period;
        self.average = self.samples_sum / whole_periods;
        self.samples_sum = 0;
        self.num_sample_periods = 0;
        Some(self.average)
    }
}
