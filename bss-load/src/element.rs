// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::ap::ApId;

use derive_new::new;
use packed_struct::prelude::*;

pub const BSS_LOAD_ELEMENT_ID: u8 = 11;
/// Length of the element body, excluding the id and length octets
pub const BSS_LOAD_LENGTH: u8 = 5;

/// Beacon side of the sampler
pub trait BeaconPublisher {
    /// Put `element` in the next beacon of `ap`. Other BSSes on the radio keep their beacons.
    fn publish_bss_load(&mut self, ap: ApId, element: &BssLoad);
}

/// BSS Load element as carried in beacons, IEEE 802.11 9.4.2.27
#[derive(PackedStruct, new, Copy, Clone, Debug, PartialEq, Eq)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "7")]
pub struct BssLoad {
    #[new(value = "BSS_LOAD_ELEMENT_ID")]
    #[packed_field(bytes = "0")]
    element_id: u8,
    #[new(value = "BSS_LOAD_LENGTH")]
    #[packed_field(bytes = "1")]
    length: u8,
    #[packed_field(bytes = "2:3")]
    pub station_count: u16,
    #[packed_field(bytes = "4")]
    pub channel_utilization: u8,
    /// Admission control is not supported, always sent as 0
    #[new(value = "0")]
    #[packed_field(bytes = "5:6")]
    pub available_admission_capacity: u16,
}

impl BssLoad {
    pub fn element_id(&self) -> u8 {
        self.element_id
    }

    pub fn length(&self) -> u8 {
        self.length
    }
}
