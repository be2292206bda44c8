//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

use crate::hid::spinner::RemainderPolicy;
use crate::input::debounce::DebouncePolicy;
use crate::profile::Profile;

// HID report composition

/// Marker byte at offset 0 of every input report (HID "DATA | INPUT" header).
pub const REPORT_MARKER: u8 = 0xA1;

/// Capacity of the assembled report descriptor (bytes).
pub const DESCRIPTOR_CAPACITY: usize = 1024;

/// Maximum length of one input report, marker byte included.
pub const MAX_REPORT_LEN: usize = 64;

/// Maximum number of input pages one controller can own.
pub const MAX_PAGES: usize = 8;

/// Maximum number of buttons in a single button bank (bits).
pub const MAX_BUTTONS: usize = 128;

/// Maximum length of the device name handed to the transport.
pub const MAX_NAME_LEN: usize = 32;

// Spinner

/// Relative ticks reported for one full revolution's worth of delta.
pub const SPINNER_TICKS_PER_UNIT: f32 = 1000.0;

/// Logical range of the spinner field (symmetric, in ticks).
pub const SPINNER_LOGICAL_MAX: i16 = 1000;

/// What happens to the sub-tick fraction after each report.
pub const SPINNER_REMAINDER_POLICY: RemainderPolicy = RemainderPolicy::Discard;

/// AS5600 I²C address.
pub const AS5600_ADDRESS: u8 = 0x36;

/// Raw-angle jitter (in sensor counts) that is ignored.
pub const AS5600_JITTER_COUNTS: u16 = 2;

/// Spinner sensor polling period (ms).
pub const SPINNER_POLL_MS: u64 = 10;

/// Delay between magnet-status checks while waiting for the magnet (ms).
pub const MAGNET_RETRY_MS: u64 = 100;

// Debounce

/// Consecutive matching samples needed before a button edge is accepted.
pub const DEBOUNCE_SAMPLES: u8 = 3;

/// Time a new level must be stable before it is accepted (ms).
pub const DEBOUNCE_MS: u32 = 5;

/// Default per-input debounce policy.
pub const DEFAULT_DEBOUNCE: DebouncePolicy = DebouncePolicy::Samples(DEBOUNCE_SAMPLES);

/// Button polling period (ms).
pub const BUTTON_POLL_MS: u64 = 1;

/// Thumbstick ADC polling period (ms).
pub const THUMBSTICK_POLL_MS: u64 = 5;

// Power

/// Reset the device after this long without a connection or a sent report.
pub const INACTIVITY_RESET_SECS: u64 = 10 * 60;

/// How often the inactivity check runs (seconds).
pub const INACTIVITY_CHECK_SECS: u64 = 60;

// Device

/// Which layout the firmware builds (also selects the advertised name).
pub const DEVICE_PROFILE: Profile = Profile::Joystick;

// BLE

/// Bonded hosts remembered until reset.
pub const BLE_MAX_BONDS: usize = 4;

/// BLE connection interval range (in 1.25 ms units).
/// 6 = 7.5 ms (lowest latency for HID).
pub const BLE_CONN_INTERVAL_MIN: u16 = 6;
pub const BLE_CONN_INTERVAL_MAX: u16 = 12;

/// BLE slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 0;

/// BLE supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;

/// Advertising interval (in 0.625 ms units). 48 = 30 ms.
pub const BLE_ADV_INTERVAL: u32 = 48;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   buttons 1..=4  up / down / left / right  -> P0.02 / P0.03 / P0.04 / P0.05
//   buttons 5..=7  b1 / b2 / b3              -> P0.06 / P0.07 / P0.08
//   buttons 8..=10 start / select / meta     -> P0.11 / P0.12 / P0.24
//   button  12     program mode (thumbstick) -> P0.25
//   stick X / Y (SAADC)                      -> P0.29 (AIN5) / P0.28 (AIN4)
//   AS5600 SDA / SCL (TWIM0)                 -> P0.26 / P0.27
//   Connected LED                            -> P0.13
//   Power LED                                -> P0.14

/// Number of physical buttons wired on the joystick board.
pub const JOYSTICK_BUTTONS: usize = 10;
