//! Spinner page - a rotary input reported as relative ticks.
//!
//! The sensor delivers an absolute angle as a fraction of a turn in
//! `[0.0, 1.0)`.  Successive readings are differenced along the shorter
//! arc and accumulated; each report emits the accumulated delta as
//! `floor(delta * 1000)` ticks on X and a zero Y.
//!
//! Layout (4 bytes):
//! ```text
//! Bytes 0-1: X ticks (i16 LE, -1000 ..= 1000)
//! Bytes 2-3: Y (always 0)
//! ```
//!
//! The accumulator is written from the sensor loop and consumed from the
//! transport context, so every access goes through one critical-section
//! lock: a read-then-reset can never interleave with an update.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::config::{SPINNER_LOGICAL_MAX, SPINNER_REMAINDER_POLICY, SPINNER_TICKS_PER_UNIT};
use crate::error::Error;
use crate::hid::descriptor::{DescriptorBuilder, DesktopUsage, UsagePage, DATA_VAR_REL};

/// Report bytes: two 16-bit relative fields.
const WIDTH: usize = 4;

/// What happens to the part of the accumulated delta a report did not emit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RemainderPolicy {
    /// Each report stands alone; the sub-tick fraction is dropped.
    #[default]
    Discard,
    /// The fraction (and anything clipped by the logical range) is kept
    /// for the next report, so slow rotation is never lost.
    Carry,
}

#[derive(Clone, Copy)]
struct SpinnerState {
    /// Last accepted position, `None` until the first reading.
    position: Option<f32>,
    /// Turns accumulated since the last report.
    accumulated: f32,
}

pub struct Spinner {
    policy: RemainderPolicy,
    state: Mutex<CriticalSectionRawMutex, RefCell<SpinnerState>>,
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

impl Spinner {
    pub const fn new() -> Self {
        Self::with_policy(SPINNER_REMAINDER_POLICY)
    }

    pub const fn with_policy(policy: RemainderPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(RefCell::new(SpinnerState {
                position: None,
                accumulated: 0.0,
            })),
        }
    }

    pub fn policy(&self) -> RemainderPolicy {
        self.policy
    }

    pub fn report_width(&self) -> usize {
        WIDTH
    }

    /// Feed a new absolute position (fraction of a turn).
    ///
    /// The first reading only establishes the reference point.  Readings
    /// outside `[0.0, 1.0)` are wrapped onto one turn first.  Returns
    /// `true` when the accumulated delta amounts to at least one tick and
    /// a report should be requested; the caller raises the request after
    /// this returns, outside the lock.
    pub fn set_position(&self, position: f32) -> bool {
        if !position.is_finite() {
            return false;
        }
        let position = wrap_turn(position);
        self.state.lock(|cell| {
            let mut state = cell.borrow_mut();
            if let Some(previous) = state.position {
                state.accumulated += shortest_arc(position - previous);
            }
            state.position = Some(position);
            ticks(state.accumulated) != 0
        })
    }

    /// Turns accumulated since the last report.
    pub fn accumulated(&self) -> f32 {
        self.state.lock(|cell| cell.borrow().accumulated)
    }

    /// Ticks the next report would carry.
    pub fn pending_ticks(&self) -> i16 {
        self.state.lock(|cell| ticks(cell.borrow().accumulated))
    }

    /// Descriptor fragment; returns the bytes written.
    ///
    /// ```text
    /// 05 01        Usage Page (Generic Desktop)
    /// 09 30        Usage (X)
    /// 09 31        Usage (Y)
    /// 16 18 FC     Logical Minimum (-1000)
    /// 26 E8 03     Logical Maximum (1000)
    /// 75 10        Report Size (16)
    /// 95 02        Report Count (2)
    /// 81 06        Input (Data, Variable, Relative)
    /// ```
    pub fn emit_descriptor<const N: usize>(
        &self,
        out: &mut DescriptorBuilder<N>,
    ) -> Result<usize, Error> {
        let start = out.len();
        out.usage_page(UsagePage::GenericDesktop)?
            .desktop_usage(DesktopUsage::X)?
            .desktop_usage(DesktopUsage::Y)?
            .logical_minimum(-i32::from(SPINNER_LOGICAL_MAX))?
            .logical_maximum(i32::from(SPINNER_LOGICAL_MAX))?
            .report_size(16)?
            .report_count(2)?
            .input(DATA_VAR_REL)?;
        Ok(out.len() - start)
    }

    /// Emit the pending ticks into `buf` and consume them.
    /// Returns the number of bytes written (0 if `buf` is too small).
    pub fn serialize_into(&self, buf: &mut [u8]) -> usize {
        if buf.len() < WIDTH {
            return 0;
        }
        let ticks = self.state.lock(|cell| {
            let mut state = cell.borrow_mut();
            let ticks = ticks(state.accumulated);
            state.accumulated = match self.policy {
                RemainderPolicy::Discard => 0.0,
                RemainderPolicy::Carry => {
                    state.accumulated - f32::from(ticks) / SPINNER_TICKS_PER_UNIT
                }
            };
            ticks
        });
        buf[..2].copy_from_slice(&ticks.to_le_bytes());
        buf[2..WIDTH].fill(0);
        WIDTH
    }
}

/// Map any finite position onto `[0.0, 1.0)`.
fn wrap_turn(position: f32) -> f32 {
    let wrapped = position % 1.0;
    let wrapped = if wrapped < 0.0 { wrapped + 1.0 } else { wrapped };
    // -tiny % 1.0 + 1.0 can round up to exactly 1.0.
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// Correct a raw delta that crossed the 1.0 -> 0.0 seam.
fn shortest_arc(delta: f32) -> f32 {
    if delta > 0.5 {
        delta - 1.0
    } else if delta < -0.5 {
        delta + 1.0
    } else {
        delta
    }
}

/// `floor(turns * 1000)`, clamped to the logical range.
fn ticks(turns: f32) -> i16 {
    let max = f32::from(SPINNER_LOGICAL_MAX);
    let scaled = (turns * SPINNER_TICKS_PER_UNIT).clamp(-max, max);
    let truncated = scaled as i16;
    if f32::from(truncated) > scaled {
        truncated - 1
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(spinner: &Spinner) -> ([u8; WIDTH], i16) {
        let mut buf = [0xAAu8; WIDTH];
        assert_eq!(spinner.serialize_into(&mut buf), WIDTH);
        (buf, i16::from_le_bytes([buf[0], buf[1]]))
    }

    #[test]
    fn descriptor_is_literal() {
        let mut out = DescriptorBuilder::<32>::new();
        let written = Spinner::new().emit_descriptor(&mut out).unwrap();
        assert_eq!(written, 18);
        assert_eq!(
            out.as_bytes(),
            &[
                0x05, 0x01, 0x09, 0x30, 0x09, 0x31, 0x16, 0x18, 0xFC, 0x26, 0xE8, 0x03, 0x75,
                0x10, 0x95, 0x02, 0x81, 0x06,
            ]
        );
    }

    #[test]
    fn first_reading_only_sets_reference() {
        let spinner = Spinner::new();
        assert!(!spinner.set_position(0.7));
        assert_eq!(spinner.accumulated(), 0.0);
    }

    #[test]
    fn forward_wrap_is_small_positive() {
        let spinner = Spinner::new();
        spinner.set_position(0.99);
        assert!(spinner.set_position(0.01));
        assert!((spinner.accumulated() - 0.02).abs() < 1e-4);
        assert!((19..=20).contains(&spinner.pending_ticks()));
    }

    #[test]
    fn backward_wrap_is_small_negative() {
        let spinner = Spinner::new();
        spinner.set_position(0.01);
        assert!(spinner.set_position(0.99));
        assert!((spinner.accumulated() + 0.02).abs() < 1e-4);
        assert!(spinner.pending_ticks() < 0);
    }

    #[test]
    fn sub_tick_motion_requests_nothing() {
        let spinner = Spinner::new();
        spinner.set_position(0.5);
        assert!(!spinner.set_position(0.5005));
    }

    #[test]
    fn negative_fraction_floors_away_from_zero() {
        let spinner = Spinner::new();
        spinner.set_position(0.5);
        assert!(spinner.set_position(0.4995));
        assert_eq!(spinner.pending_ticks(), -1);
    }

    #[test]
    fn report_consumes_accumulator() {
        let spinner = Spinner::new();
        spinner.set_position(0.0);
        spinner.set_position(0.25);
        spinner.set_position(0.5);
        let (buf, ticks) = emit(&spinner);
        assert!((499..=500).contains(&ticks));
        assert_eq!(buf[2..], [0, 0]);

        let (_, ticks) = emit(&spinner);
        assert_eq!(ticks, 0);
    }

    #[test]
    fn ticks_are_clamped_to_logical_range() {
        let spinner = Spinner::new();
        spinner.set_position(0.0);
        for step in 1..=12 {
            spinner.set_position((step as f32 * 0.4) % 1.0);
        }
        let (_, ticks) = emit(&spinner);
        assert_eq!(ticks, 1000);
    }

    #[test]
    fn discard_drops_fraction() {
        let spinner = Spinner::with_policy(RemainderPolicy::Discard);
        spinner.set_position(0.0);
        spinner.set_position(0.0015);
        assert_eq!(emit(&spinner).1, 1);
        assert_eq!(spinner.accumulated(), 0.0);
    }

    #[test]
    fn carry_keeps_fraction() {
        let spinner = Spinner::with_policy(RemainderPolicy::Carry);
        spinner.set_position(0.0);
        spinner.set_position(0.0015);
        assert_eq!(emit(&spinner).1, 1);
        assert!((spinner.accumulated() - 0.0005).abs() < 1e-5);

        spinner.set_position(0.0021);
        assert_eq!(emit(&spinner).1, 1);
    }

    #[test]
    fn carry_keeps_clipped_excess() {
        let spinner = Spinner::with_policy(RemainderPolicy::Carry);
        spinner.set_position(0.0);
        for step in 1..=6 {
            spinner.set_position((step as f32 * 0.25) % 1.0);
        }
        assert_eq!(emit(&spinner).1, 1000);
        assert!((spinner.accumulated() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn non_finite_position_is_ignored() {
        let spinner = Spinner::new();
        spinner.set_position(0.2);
        assert!(!spinner.set_position(f32::NAN));
        assert!(!spinner.set_position(f32::INFINITY));
        spinner.set_position(0.2);
        assert_eq!(spinner.accumulated(), 0.0);
    }

    #[test]
    fn out_of_range_position_moves_at_most_half_a_turn() {
        let spinner = Spinner::with_policy(RemainderPolicy::Carry);
        spinner.set_position(0.5);
        spinner.set_position(1.0e6);
        assert!(spinner.accumulated().abs() <= 0.5 + 1e-4);

        // One report drains it; nothing is left to trickle out.
        emit(&spinner);
        assert_eq!(spinner.pending_ticks(), 0);
    }

    #[test]
    fn positions_wrap_onto_one_turn() {
        let spinner = Spinner::new();
        spinner.set_position(0.25);
        spinner.set_position(3.3);
        assert!((spinner.accumulated() - 0.05).abs() < 1e-4);

        // -0.7 lands on 0.3, where the spinner already is.
        spinner.set_position(-0.7);
        assert!((spinner.accumulated() - 0.05).abs() < 1e-4);
        assert_eq!(wrap_turn(-1.0e-9), 0.0);
        assert_eq!(wrap_turn(1.0), 0.0);
    }

    #[test]
    fn short_buffer_writes_nothing() {
        let spinner = Spinner::new();
        let mut buf = [0u8; 3];
        assert_eq!(spinner.serialize_into(&mut buf), 0);
    }
}
