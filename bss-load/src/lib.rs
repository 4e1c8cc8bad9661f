// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # BSS Load channel utilization sampler
//!
//! ## Introduction
//!
//! This crate keeps the channel utilization advertised in an access point's BSS Load element up to
//! date. Every `update_period` beacon intervals it asks the driver for channel survey counters,
//! publishes the resulting busy ratio to the beacon and optionally folds it into an average over
//! `avg_period` beacon intervals shared by every BSS on the radio.
//!
//! The crate owns none of the machinery around it. Timers, driver surveys and beacon updates are
//! reached through the [timer::TimerService], [survey::SurveyProvider] and
//! [element::BeaconPublisher] traits so any event loop and driver can be plugged in.
//!
//! ## Usage
//!
//!  * Create one [interface::Interface] per radio and clone it into a [sampler::Sampler] per BSS
//!  * Call [sampler::Sampler::start] once the BSS is configured
//!  * Call [sampler::Sampler::tick] whenever the timer of [sampler::Sampler::id] expires
//!  * Call [sampler::Sampler::deinit] when the BSS is torn down
//!
//! ## Features
//!  * `tracing` (default): log through the `tracing` crate, see [init_tracing]
//!  * `serde`: serialize and deserialize [config::Config]

pub mod ap;
pub mod average;
pub mod config;
pub mod element;
pub mod interface;
pub mod sampler;
pub mod survey;
pub mod timeout;
pub mod timer;
mod trace;

pub use trace::init_tracing;
