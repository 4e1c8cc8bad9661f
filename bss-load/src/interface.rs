// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::average::UtilizationAverage;
use crate::survey::{SurveyBaseline, SurveyCounters};
use crate::trace::debug;

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug)]
struct InterfaceState {
    /// Operating frequency in MHz
    freq: u32,
    channel: u8,
    channel_utilization: u8,
    baseline: SurveyBaseline,
    average: UtilizationAverage,
}

/// Handle to the channel utilization state of one radio interface.
///
/// Every BSS on the radio holds a clone of the same handle, so samples from all of them land in a
/// single accumulator. The handle is neither `Send` nor `Sync` and all access goes through the
/// methods below, none of which hold a borrow across a call out of this module.
#[derive(Clone, Debug)]
pub struct Interface {
    state: Rc<RefCell<InterfaceState>>,
}

impl Interface {
    pub fn new(freq: u32, channel: u8) -> Self {
        Self {
            state: Rc::new(RefCell::new(InterfaceState {
                freq,
                channel,
                channel_utilization: 0,
                baseline: SurveyBaseline::default(),
                average: UtilizationAverage::new(),
            })),
        }
    }

    pub fn freq(&self) -> u32 {
        self.state.borrow().freq
    }

    pub fn channel(&self) -> u8 {
        self.state.borrow().channel
    }

    /// Move the radio to a new channel. Survey counters from the old frequency are forgotten.
    pub fn set_operating_channel(&self, freq: u32, channel: u8) {
        let mut state = self.state.borrow_mut();
        state.freq = freq;
        state.channel = channel;
        state.baseline = SurveyBaseline::default();
    }

    /// Latest instantaneous channel utilization, 0-255
    pub fn channel_utilization(&self) -> u8 {
        self.state.borrow().channel_utilization
    }

    /// For drivers that compute channel utilization themselves
    pub fn set_channel_utilization(&self, channel_utilization: u8) {
        self.state.borrow_mut().channel_utilization = channel_utilization;
    }

    /// Fold a survey report into the channel utilization.
    ///
    /// Returns the new utilization, or `None` when the report was for another frequency or did not
    /// carry enough information. The previous value is kept in that case.
    pub fn record_survey(&self, survey: &SurveyCounters) -> Option<u8> {
        let mut state = self.state.borrow_mut();
        if survey.freq != state.freq {
            debug!(
                survey_freq = survey.freq,
                freq = state.freq,
                "BSS load: ignoring survey for another frequency"
            );
            return None;
        }
        let channel_utilization = state.baseline.update(survey)?;
        state.channel_utilization = channel_utilization;
        debug!(
            freq = state.freq,
            channel_utilization, "BSS load: channel utilization updated"
        );
        Some(channel_utilization)
    }

    /// Snapshot of the running average
    pub fn average(&self) -> UtilizationAverage {
        self.state.borrow().average
    }

    /// Fold the current channel utilization into the running average
    pub(crate) fn accumulate(&self, update_period: u32, avg_period: u32) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        let sample = state.channel_utilization;
        state.average.accumulate(sample, update_period, avg_period)
    }

    /// True when both handles refer to the same radio
    pub fn same_radio(&self, other: &Interface) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let iface = Interface::new(5180, 36);
        let other = iface.clone();
        other.set_channel_utilization(42);
        assert_eq!(iface.channel_utilization(), 42);
        assert!(iface.same_radio(&other));
        assert!(!iface.same_radio(&Interface::new(5180, 36)));
    }

    #[test]
    fn survey_for_operating_frequency() {
        let iface = Interface::new(2412, 1);
        let survey = SurveyCounters::new(2412, Some(1000), Some(250));
        assert_eq!(iface.record_survey(&survey), Some(63));
        assert_eq!(iface.channel_utilization(), 63);
    }

    #[test]
    fn survey_for_other_frequency_ignored() {
        let iface = Interface::new(2412, 1);
        iface.set_channel_utilization(7);
        let survey = SurveyCounters::new(2437, Some(1000), Some(1000));
        assert_eq!(iface.record_survey(&survey), None);
        assert_eq!(iface.channel_utilization(), 7);
    }

    #[test]
    fn channel_switch_resets_baseline() {
        let iface = Interface::new(2412, 1);
        iface.record_survey(&SurveyCounters::new(2412, Some(10_000), Some(0)));
        iface.set_operating_channel(2437, 6);
        assert_eq!((iface.freq(), iface.channel()), (2437, 6));
        // Counters start over from zero on the new channel
        assert_eq!(
            iface.record_survey(&SurveyCounters::new(2437, Some(100), Some(100))),
            Some(255)
        );
    }

    #[test]
    fn accumulate_uses_current_utilization() {
        let iface = Interface::new(2412, 1);
        iface.set_channel_utilization(100);
        assert_eq!(iface.accumulate(1, 2), None);
        iface.set_channel_utilization(50);
        assert_eq!(iface.accumulate(1, 2), Some(75));
        assert_eq!(iface.average().average(), 75);
    }
}
