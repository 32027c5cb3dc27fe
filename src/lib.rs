//! Skynode firmware library.
//!
//! Three periodic tasks — sample producer, indicator engine, connectivity
//! manager — run under the FreeRTOS preemptive scheduler with fixed
//! priorities (sampler > indicator > wifi). All ESP-IDF-specific code is
//! guarded by `#[cfg(target_os = "espidf")]` within each module, so the
//! full crate builds and tests on the host.

#![deny(unused_must_use)]

pub mod config;
pub mod error;
mod esp_link_shims;
pub mod indicator;
pub mod net;
pub mod pins;
pub mod runtime;
pub mod sampler;
pub mod status;
