#[macro_use]
extern crate afl;
extern crate bss_load;
use bss_load::ap::{AccessPoint, ApId};
use bss_load::config::Config;
use bss_load::element::{BeaconPublisher, BssLoad};
use bss_load::interface::Interface;
use bss_load::sampler::Sampler;
use bss_load::survey::{SurveyCounters, SurveyError, SurveyProvider};
use bss_load::timeout::UpdateTimeout;
use bss_load::timer::TimerService;

const FREQ: u32 = 2412;

struct TimerMock {
    pending: Vec<ApId>,
}

impl TimerService for TimerMock {
    fn schedule(&mut self, ap: ApId, _timeout: UpdateTimeout) {
        self.pending.push(ap);
    }
    fn cancel(&mut self, ap: ApId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|x| *x != ap);
        before - self.pending.len()
    }
}

struct SurveyMock {
    report: Option<SurveyCounters>,
    fail: bool,
}

impl SurveyProvider for SurveyMock {
    fn request_survey(&mut self, iface: &Interface, _freq: u32) -> Result<(), SurveyError> {
        if self.fail {
            return Err(SurveyError::NotSupported);
        }
        if let Some(report) = self.report.take() {
            iface.record_survey(&report);
        }
        Ok(())
    }
}

struct BeaconMock {}

impl BeaconPublisher for BeaconMock {
    fn publish_bss_load(&mut self, _ap: ApId, _element: &BssLoad) {}
}

fn read_u32(data: &[u8]) -> u32 {
    let mut buf = [0; 4];
    buf.copy_from_slice(&data[..4]);
    u32::from_le_bytes(buf)
}

fn read_u64(data: &[u8]) -> u64 {
    let mut buf = [0; 8];
    buf.copy_from_slice(&data[..8]);
    u64::from_le_bytes(buf)
}

fn main() {
    fuzz!(|data: &[u8]| {
        if data.len() < 12 {
            return;
        }
        let config = Config::new(read_u32(&data[0..]), read_u32(&data[4..]), read_u32(&data[8..]));
        let mut ap = AccessPoint::new(ApId(1));
        ap.started = true;
        ap.beacon_set_done = true;
        let mut sampler = Sampler::new(ap, Interface::new(FREQ, 1), config);
        let mut timers = TimerMock { pending: Vec::new() };
        let mut beacon = BeaconMock {};
        let _ = sampler.init(&mut timers);

        // flags, channel_time, channel_time_busy per tick
        for chunk in data[12..].chunks_exact(17) {
            let flags = chunk[0];
            let ap = sampler.access_point_mut();
            ap.started = flags & 0x01 == 0;
            ap.beacon_set_done = flags & 0x02 == 0;
            let mut survey = SurveyMock {
                report: Some(SurveyCounters::new(
                    FREQ,
                    Some(read_u64(&chunk[1..])),
                    Some(read_u64(&chunk[9..])),
                )),
                fail: flags & 0x04 != 0,
            };
            if flags & 0x08 != 0 {
                let _ = sampler.init(&mut timers);
            }
            timers.pending.retain(|x| *x != ApId(1));
            let _ = sampler.tick(&mut timers, &mut survey, &mut beacon);
            assert!(timers.pending.len() <= 1);
            assert_eq!(sampler.is_scheduled(), timers.pending.len() == 1);
        }
        sampler.deinit(&mut timers);
        assert!(timers.pending.is_empty());
    });
}
