// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::ap::{AccessPoint, ApId};
use crate::config::{Config, ConfigError};
use crate::element::{BeaconPublisher, BssLoad};
use crate::interface::Interface;
use crate::survey::{SurveyError, SurveyProvider};
use crate::timeout::UpdateTimeout;
use crate::timer::TimerService;
use crate::trace::{debug, error, info};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SamplerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to get survey data: {0}")]
    Survey(#[from] SurveyError),
}

/// Why the update chain stopped. A stopped sampler only resumes through [Sampler::init].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Beacon not set or AP not started when the timer fired
    NotReady,
    SurveyFailed,
    InvalidConfig,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SamplerState {
    /// Never armed or deinitialized
    Idle,
    /// Exactly one timer is pending with this timeout
    Scheduled(UpdateTimeout),
    Stopped(StopReason),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// No timer was pending for this sampler, nothing was done
    Ignored,
    /// The AP was not ready, the chain is stopped
    Skipped,
    /// Utilization was published and the next update armed. `average` is set when this tick
    /// completed an averaging window.
    Rescheduled {
        timeout: UpdateTimeout,
        average: Option<u32>,
    },
}

/// Periodic channel utilization updates for one BSS
///
/// Lifecycle: [Sampler::init] arms the first timer, the host calls [Sampler::tick] each time the
/// timer of [Sampler::id] expires and every successful tick arms the next one. [Sampler::deinit]
/// breaks the chain.
pub struct Sampler {
    ap: AccessPoint,
    iface: Interface,
    config: Config,
    state: SamplerState,
}

impl Sampler {
    pub fn new(ap: AccessPoint, iface: Interface, config: Config) -> Self {
        Self {
            ap,
            iface,
            config,
            state: SamplerState::Idle,
        }
    }

    pub fn id(&self) -> ApId {
        self.ap.id
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn is_scheduled(&self) -> bool {
        matches!(self.state, SamplerState::Scheduled(_))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn interface(&self) -> &Interface {
        &self.iface
    }

    pub fn access_point(&self) -> &AccessPoint {
        &self.ap
    }

    /// Used by the host to flip `started`/`beacon_set_done` and track stations
    pub fn access_point_mut(&mut self) -> &mut AccessPoint {
        &mut self.ap
    }

    /// Arm the first update.
    ///
    /// Nothing is scheduled if the configuration is invalid. Calling this while an update is
    /// already pending restarts the period.
    pub fn init<T: TimerService>(&mut self, timers: &mut T) -> Result<UpdateTimeout, ConfigError> {
        let id = self.ap.id;
        debug!(ap = %id, "BSS load: initializing BSS load update");

        let timeout = self.config.update_timeout()?;
        if self.is_scheduled() {
            timers.cancel(id);
        }

        debug!(
            ap = %id,
            secs = timeout.secs,
            usecs = timeout.usecs,
            "BSS load: registering first update"
        );
        timers.schedule(id, timeout);
        self.state = SamplerState::Scheduled(timeout);
        Ok(timeout)
    }

    /// [Sampler::init] when updates are enabled, returns `None` otherwise
    pub fn start<T: TimerService>(
        &mut self,
        timers: &mut T,
    ) -> Result<Option<UpdateTimeout>, ConfigError> {
        if !self.config.is_enabled() {
            debug!(ap = %self.ap.id, "BSS load: updates disabled");
            return Ok(None);
        }
        self.init(timers).map(Some)
    }

    /// Cancel any pending update. Safe to call in any state.
    pub fn deinit<T: TimerService>(&mut self, timers: &mut T) {
        debug!(ap = %self.ap.id, "BSS load: deinitializing BSS load update");
        timers.cancel(self.ap.id);
        self.state = SamplerState::Idle;
    }

    /// Swap the configuration, re-arming with the new period when updates stay enabled
    pub fn reload<T: TimerService>(
        &mut self,
        config: Config,
        timers: &mut T,
    ) -> Result<Option<UpdateTimeout>, ConfigError> {
        self.deinit(timers);
        self.config = config;
        self.start(timers)
    }

    /// Handle expiry of this sampler's timer.
    ///
    /// Errors stop the chain without re-arming, as does an AP that is not ready.
    pub fn tick<T, S, B>(
        &mut self,
        timers: &mut T,
        survey: &mut S,
        beacon: &mut B,
    ) -> Result<TickOutcome, SamplerError>
    where
        T: TimerService,
        S: SurveyProvider,
        B: BeaconPublisher,
    {
        let id = self.ap.id;
        debug!(ap = %id, "BSS load: update channel utilization");

        if !self.is_scheduled() {
            debug!(ap = %id, state = ?self.state, "BSS load: no update pending, ignoring");
            return Ok(TickOutcome::Ignored);
        }

        if !self.ap.is_ready() {
            debug!(ap = %id, "BSS load: beacon not set or AP not started, skipping update");
            self.state = SamplerState::Stopped(StopReason::NotReady);
            return Ok(TickOutcome::Skipped);
        }

        let freq = self.iface.freq();
        if let Err(e) = survey.request_survey(&self.iface, freq) {
            error!(ap = %id, freq, error = %e, "BSS load: failed to get survey data");
            self.state = SamplerState::Stopped(StopReason::SurveyFailed);
            return Err(e.into());
        }
        debug!(ap = %id, freq, "BSS load: survey data retrieved");

        let channel_utilization = self.iface.channel_utilization();
        beacon.publish_bss_load(id, &BssLoad::new(self.ap.station_count, channel_utilization));

        let timeout = match self.config.update_timeout() {
            Ok(timeout) => timeout,
            Err(e) => {
                self.state = SamplerState::Stopped(StopReason::InvalidConfig);
                return Err(e.into());
            }
        };

        let average = if self.config.is_averaging() {
            let average = self
                .iface
                .accumulate(self.config.update_period, self.config.avg_period);
            let window = self.iface.average();
            debug!(
                ap = %id,
                avg_period = self.config.avg_period,
                samples_sum = window.samples_sum(),
                num_sample_periods = window.num_sample_periods(),
                "BSS load: averaging channel utilization"
            );
            if let Some(average) = average {
                info!(
                    average,
                    channel = self.iface.channel(),
                    "BSS load: channel utilization average"
                );
            }
            average
        } else {
            None
        };

        debug!(
            ap = %id,
            secs = timeout.secs,
            usecs = timeout.usecs,
            "BSS load: registering next update"
        );
        timers.schedule(id, timeout);
        self.state = SamplerState::Scheduled(timeout);
        Ok(TickOutcome::Rescheduled { timeout, average })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::SurveyCounters;

    #[derive(Default)]
    struct Timers {
        pending: Vec<(ApId, UpdateTimeout)>,
        calls: usize,
    }

    impl TimerService for Timers {
        fn schedule(&mut self, ap: ApId, timeout: UpdateTimeout) {
            self.calls += 1;
            self.pending.push((ap, timeout));
        }

        fn cancel(&mut self, ap: ApId) -> usize {
            self.calls += 1;
            let before = self.pending.len();
            self.pending.retain(|(id, _)| *id != ap);
            before - self.pending.len()
        }
    }

    impl Timers {
        // The host pops the timer before dispatching the tick
        fn fire(&mut self, ap: ApId) {
            let index = self
                .pending
                .iter()
                .position(|(id, _)| *id == ap)
                .expect("No timer pending");
            self.pending.remove(index);
        }
    }

    struct Survey {
        result: Result<(), SurveyError>,
        report: Option<SurveyCounters>,
        calls: usize,
    }

    impl Default for Survey {
        fn default() -> Self {
            Self {
                result: Ok(()),
                report: None,
                calls: 0,
            }
        }
    }

    impl SurveyProvider for Survey {
        fn request_survey(&mut self, iface: &Interface, freq: u32) -> Result<(), SurveyError> {
            self.calls += 1;
            assert_eq!(freq, iface.freq());
            if let Some(report) = &self.report {
                iface.record_survey(report);
            }
            self.result.clone()
        }
    }

    #[derive(Default)]
    struct Beacon {
        published: Vec<(ApId, BssLoad)>,
    }

    impl BeaconPublisher for Beacon {
        fn publish_bss_load(&mut self, ap: ApId, element: &BssLoad) {
            self.published.push((ap, *element));
        }
    }

    fn get_sampler(config: Config) -> Sampler {
        let mut ap = AccessPoint::new(ApId(1));
        ap.started = true;
        ap.beacon_set_done = true;
        Sampler::new(ap, Interface::new(2412, 1), config)
    }

    #[test]
    fn inert_start() {
        let sampler = get_sampler(Config::new(2, 100, 0));
        assert_eq!(sampler.state(), SamplerState::Idle);
        assert!(!sampler.is_scheduled());
    }

    #[test]
    fn init_schedules_first_update() {
        let mut timers = Timers::default();
        let mut sampler = get_sampler(Config::new(2, 100, 0));
        let timeout = sampler.init(&mut timers).unwrap();
        assert_eq!(timeout, UpdateTimeout::new(0, 204800));
        assert_eq!(timers.pending, vec![(ApId(1), timeout)]);
        assert_eq!(sampler.state(), SamplerState::Scheduled(timeout));
    }

    #[test]
    fn init_invalid_config() {
        let mut timers = Timers::default();
        let mut sampler = get_sampler(Config::new(0, 100, 0));
        assert!(matches!(
            sampler.init(&mut timers),
            Err(ConfigError::InvalidUpdateTimeout { .. })
        ));
        assert_eq!(timers.calls, 0);
        assert_eq!(sampler.state(), SamplerState::Idle);
    }

    #[test]
    fn init_twice_keeps_one_timer() {
        let mut timers = Timers::default();
        let mut sampler = get_sampler(Config::new(2, 100, 0));
        sampler.init(&mut timers).unwrap();
        sampler.init(&mut timers).unwrap();
        assert_eq!(timers.pending.len(), 1);
    }

    #[test]
    fn tick_reschedules() {
        let mut timers = Timers::default();
        let mut survey = Survey::default();
        let mut beacon = Beacon::default();
        let mut sampler = get_sampler(Config::new(2, 100, 0));
        sampler.iface.set_channel_utilization(90);
        sampler.ap.station_count = 4;
        sampler.init(&mut timers).unwrap();

        timers.fire(ApId(1));
        let outcome = sampler.tick(&mut timers, &mut survey, &mut beacon).unwrap();
        let timeout = UpdateTimeout::new(0, 204800);
        assert_eq!(
            outcome,
            TickOutcome::Rescheduled {
                timeout,
                average: None
            }
        );
        assert_eq!(survey.calls, 1);
        assert_eq!(beacon.published, vec![(ApId(1), BssLoad::new(4, 90))]);
        assert_eq!(timers.pending, vec![(ApId(1), timeout)]);
        assert_eq!(sampler.state(), SamplerState::Scheduled(timeout));
    }

    #[test]
    fn tick_not_started() {
        let mut timers = Timers::default();
        let mut survey = Survey::default();
        let mut beacon = Beacon::default();
        let mut sampler = get_sampler(Config::new(2, 100, 5));
        sampler.init(&mut timers).unwrap();
        timers.fire(ApId(1));
        sampler.access_point_mut().started = false;
        let calls = timers.calls;

        assert_eq!(
            sampler.tick(&mut timers, &mut survey, &mut beacon),
            Ok(TickOutcome::Skipped)
        );
        assert_eq!(timers.calls, calls);
        assert_eq!(survey.calls, 0);
        assert!(beacon.published.is_empty());
        assert_eq!(sampler.interface().average(), Default::default());
        assert_eq!(sampler.state(), SamplerState::Stopped(StopReason::NotReady));
    }

    #[test]
    fn tick_beacon_not_set() {
        let mut timers = Timers::default();
        let mut sampler = get_sampler(Config::new(2, 100, 0));
        sampler.init(&mut timers).unwrap();
        timers.fire(ApId(1));
        sampler.access_point_mut().beacon_set_done = false;
        assert_eq!(
            sampler.tick(&mut timers, &mut Survey::default(), &mut Beacon::default()),
            Ok(TickOutcome::Skipped)
        );
        assert!(timers.pending.is_empty());
    }

    #[test]
    fn tick_survey_failure_stops() {
        let mut timers = Timers::default();
        let mut survey = Survey {
            result: Err(SurveyError::NotSupported),
            ..Survey::default()
        };
        let mut beacon = Beacon::default();
        let mut sampler = get_sampler(Config::new(1, 100, 1));
        sampler.init(&mut timers).unwrap();
        timers.fire(ApId(1));

        assert_eq!(
            sampler.tick(&mut timers, &mut survey, &mut beacon),
            Err(SamplerError::Survey(SurveyError::NotSupported))
        );
        assert!(beacon.published.is_empty());
        assert!(timers.pending.is_empty());
        assert_eq!(sampler.interface().average(), Default::default());
        assert_eq!(
            sampler.state(),
            SamplerState::Stopped(StopReason::SurveyFailed)
        );

        // Only an explicit init restarts the chain
        survey.result = Ok(());
        assert_eq!(
            sampler.tick(&mut timers, &mut survey, &mut beacon),
            Ok(TickOutcome::Ignored)
        );
        sampler.init(&mut timers).unwrap();
        assert_eq!(timers.pending.len(), 1);
    }

    #[test]
    fn tick_publishes_fresh_survey() {
        let mut timers = Timers::default();
        let mut survey = Survey {
            report: Some(SurveyCounters::new(2412, Some(1000), Some(500))),
            ..Survey::default()
        };
        let mut beacon = Beacon::default();
        let mut sampler = get_sampler(Config::new(1, 100, 0));
        sampler.init(&mut timers).unwrap();
        timers.fire(ApId(1));
        sampler.tick(&mut timers, &mut survey, &mut beacon).unwrap();
        assert_eq!(beacon.published[0].1.channel_utilization, 127);
    }

    #[test]
    fn tick_averages() {
        let mut timers = Timers::default();
        let mut survey = Survey::default();
        let mut beacon = Beacon::default();
        let mut sampler = get_sampler(Config::new(2, 100, 6));
        sampler.init(&mut timers).unwrap();

        let mut averages = Vec::new();
        for utilization in [10, 20, 30, 40] {
            sampler.interface().set_channel_utilization(utilization);
            timers.fire(ApId(1));
            match sampler.tick(&mut timers, &mut survey, &mut beacon).unwrap() {
                TickOutcome::Rescheduled { average, .. } => averages.push(average),
                outcome => panic!("Unexpected outcome {:?}", outcome),
            }
        }
        assert_eq!(averages, vec![None, None, Some(20), None]);
        let window = sampler.interface().average();
        assert_eq!(window.average(), 20);
        assert_eq!(window.samples_sum(), 40);
        assert_eq!(window.num_sample_periods(), 2);
    }

    #[test]
    fn tick_averaging_disabled() {
        let mut timers = Timers::default();
        let mut sampler = get_sampler(Config::new(2, 100, 0));
        sampler.interface().set_channel_utilization(200);
        sampler.init(&mut timers).unwrap();
        for _ in 0..5 {
            timers.fire(ApId(1));
            sampler
                .tick(&mut timers, &mut Survey::default(), &mut Beacon::default())
                .unwrap();
        }
        assert_eq!(sampler.interface().average(), Default::default());
    }

    #[test]
    fn stale_tick_ignored() {
        let mut timers = Timers::default();
        let mut survey = Survey::default();
        let mut beacon = Beacon::default();
        let mut sampler = get_sampler(Config::new(2, 100, 0));
        assert_eq!(
            sampler.tick(&mut timers, &mut survey, &mut beacon),
            Ok(TickOutcome::Ignored)
        );
        assert_eq!(timers.calls, 0);
        assert_eq!(survey.calls, 0);
        assert!(beacon.published.is_empty());
    }

    #[test]
    fn deinit_cancels() {
        let mut timers = Timers::default();
        let mut sampler = get_sampler(Config::new(2, 100, 0));
        sampler.init(&mut timers).unwrap();
        sampler.deinit(&mut timers);
        assert!(timers.pending.is_empty());
        assert_eq!(sampler.state(), SamplerState::Idle);
    }

    #[test]
    fn deinit_without_timer() {
        let mut timers = Timers::default();
        let mut sampler = get_sampler(Config::new(2, 100, 0));
        sampler.deinit(&mut timers);
        sampler.deinit(&mut timers);
        assert!(timers.pending.is_empty());
        assert_eq!(sampler.state(), SamplerState::Idle);
    }

    #[test]
    fn start_disabled() {
        let mut timers = Timers::default();
        let mut sampler = get_sampler(Config::new(0, 100, 0));
        assert_eq!(sampler.start(&mut timers), Ok(None));
        assert_eq!(timers.calls, 0);
    }

    #[test]
    fn reload_rearms_with_new_period() {
        let mut timers = Timers::default();
        let mut sampler = get_sampler(Config::new(2, 100, 0));
        sampler.init(&mut timers).unwrap();
        let timeout = sampler
            .reload(Config::new(10, 100, 0), &mut timers)
            .unwrap();
        assert_eq!(timeout, Some(UpdateTimeout::new(1, 0)));
        assert_eq!(timers.pending, vec![(ApId(1), UpdateTimeout::new(1, 0))]);

        assert_eq!(sampler.reload(Config::default(), &mut timers), Ok(None));
        assert!(timers.pending.is_empty());
        assert_eq!(sampler.state(), SamplerState::Idle);
    }
}
