// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::ap::ApId;
use crate::timeout::UpdateTimeout;

/// One-shot timers of the host event loop, keyed by access point.
///
/// When a timer expires the host calls [crate::sampler::Sampler::tick] for that access point.
/// The sampler keeps at most one timer pending per key.
pub trait TimerService {
    fn schedule(&mut self, ap: ApId, timeout: UpdateTimeout);
    /// Cancel the pending timer of `ap`, returns how many were removed
    fn cancel(&mut self, ap: ApId) -> usize;
}
