//! Host-testable core of the padlink controller firmware.
//!
//! Everything here is pure logic: HID descriptor and report
//! composition, advertising payloads, debouncing, d-pad mapping, the
//! rotary sensor driver, the debug console and the inactivity policy.
//! It builds for the nRF52840 target as `no_std` and on the host with
//! `std` for tests.
//!
//! Usage: `cargo test --lib` / `cargo test`
//!
//! Note: the firmware binary (`src/main.rs`, `embedded` feature) links
//! this library and adds the BLE transport, GPIO/ADC tasks and power
//! handling on top.

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to every module.
#[macro_use]
mod fmt;

pub mod advertising;
pub mod config;
pub mod console;
pub mod error;
pub mod hid;
pub mod input;
pub mod power_logic;
pub mod profile;
pub mod sensor;

pub use error::{Error, TransportError};
pub use hid::{DeviceClass, PageId, ReportController, Transport};
