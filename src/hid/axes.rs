//! Axis pair page - an absolute X/Y stick position.
//!
//! Layout (2 bytes):
//! ```text
//! Byte 0: X (i8, -127 ..= 127)
//! Byte 1: Y (i8, -127 ..= 127)
//! ```
//!
//! Both axes are packed into one atomic word, so a reader always sees an
//! X and Y that were written together.

use core::sync::atomic::{AtomicU16, Ordering};

use crate::error::Error;
use crate::hid::descriptor::{DescriptorBuilder, DesktopUsage, UsagePage, DATA_VAR_ABS};

const WIDTH: usize = 2;

/// Convert a stick percentage to a signed axis value.
///
/// `0.0 -> -127`, `1.0 -> 127`; out-of-range input is clamped and NaN
/// maps to centre.
pub fn percent_to_axis(pct: f32) -> i8 {
    let pct = if pct.is_nan() { 0.5 } else { pct.clamp(0.0, 1.0) };
    // Non-negative, so truncating after +0.5 rounds half up.
    let scaled = (pct * 254.0 + 0.5) as i16;
    (scaled - 127) as i8
}

fn pack(x: i8, y: i8) -> u16 {
    u16::from_le_bytes([x as u8, y as u8])
}

fn unpack(word: u16) -> (i8, i8) {
    let [x, y] = word.to_le_bytes();
    (x as i8, y as i8)
}

#[derive(Default)]
pub struct AxisPair {
    value: AtomicU16,
}

impl AxisPair {
    /// Both axes start centred.
    pub const fn new() -> Self {
        Self {
            value: AtomicU16::new(0),
        }
    }

    pub fn report_width(&self) -> usize {
        WIDTH
    }

    /// Move the stick; returns `true` when either axis changed.
    pub fn move_to(&self, x_pct: f32, y_pct: f32) -> bool {
        let packed = pack(percent_to_axis(x_pct), percent_to_axis(y_pct));
        self.value.swap(packed, Ordering::AcqRel) != packed
    }

    /// Current `(x, y)`.
    pub fn position(&self) -> (i8, i8) {
        unpack(self.value.load(Ordering::Acquire))
    }

    /// Descriptor fragment; returns the bytes written.
    ///
    /// ```text
    /// 05 01        Usage Page (Generic Desktop)
    /// 09 30        Usage (X)
    /// 09 31        Usage (Y)
    /// 15 81        Logical Minimum (-127)
    /// 25 7F        Logical Maximum (127)
    /// 75 08        Report Size (8)
    /// 95 02        Report Count (2)
    /// 81 02        Input (Data, Variable, Absolute)
    /// ```
    pub fn emit_descriptor<const N: usize>(
        &self,
        out: &mut DescriptorBuilder<N>,
    ) -> Result<usize, Error> {
        let start = out.len();
        out.usage_page(UsagePage::GenericDesktop)?
            .desktop_usage(DesktopUsage::X)?
            .desktop_usage(DesktopUsage::Y)?
            .logical_minimum(-127)?
            .logical_maximum(127)?
            .report_size(8)?
            .report_count(2)?
            .input(DATA_VAR_ABS)?;
        Ok(out.len() - start)
    }

    /// Returns the number of bytes written (0 if `buf` is too small).
    pub fn serialize_into(&self, buf: &mut [u8]) -> usize {
        if buf.len() < WIDTH {
            return 0;
        }
        let (x, y) = self.position();
        buf[0] = x as u8;
        buf[1] = y as u8;
        WIDTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_mapping_endpoints() {
        assert_eq!(percent_to_axis(0.0), -127);
        assert_eq!(percent_to_axis(1.0), 127);
        assert!(matches!(percent_to_axis(0.5), -1 | 0));
    }

    #[test]
    fn percent_mapping_clamps() {
        assert_eq!(percent_to_axis(-3.0), -127);
        assert_eq!(percent_to_axis(7.5), 127);
        assert_eq!(percent_to_axis(f32::NAN), 0);
    }

    #[test]
    fn mapping_is_monotonic() {
        let mut last = i8::MIN;
        for step in 0..=100 {
            let v = percent_to_axis(step as f32 / 100.0);
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn move_reports_change_only_when_value_differs() {
        let axes = AxisPair::new();
        assert!(axes.move_to(1.0, 0.0));
        assert_eq!(axes.position(), (127, -127));
        assert!(!axes.move_to(1.0, 0.0));
        // Below one step of resolution.
        assert!(!axes.move_to(0.999, 0.0));
        assert!(axes.move_to(1.0, 0.1));
    }

    #[test]
    fn serializes_as_signed_bytes() {
        let axes = AxisPair::new();
        axes.move_to(0.0, 1.0);
        let mut buf = [0u8; 2];
        assert_eq!(axes.serialize_into(&mut buf), 2);
        assert_eq!(buf, [0x81, 0x7F]);
    }

    #[test]
    fn descriptor_is_literal() {
        let mut out = DescriptorBuilder::<32>::new();
        assert_eq!(AxisPair::new().emit_descriptor(&mut out).unwrap(), 16);
        assert_eq!(
            out.as_bytes(),
            &[
                0x05, 0x01, 0x09, 0x30, 0x09, 0x31, 0x15, 0x81, 0x25, 0x7F, 0x75, 0x08, 0x95,
                0x02, 0x81, 0x02,
            ]
        );
    }
}
