//! HID report descriptor assembly.
//!
//! A report descriptor is a sequence of *short items*: one prefix byte
//! followed by 0, 1, 2 or 4 little-endian data bytes.
//!
//! ```text
//! Prefix: bTag (4 bits) | bType (2 bits) | bSize (2 bits)
//!         bType 0 = Main, 1 = Global, 2 = Local
//!         bSize 0 = 0 bytes, 1 = 1 byte, 2 = 2 bytes, 3 = 4 bytes
//! ```
//!
//! [`DescriptorBuilder`] appends items into a fixed-capacity buffer and
//! always picks the smallest data size that holds the value, so the
//! output matches hand-written descriptors byte for byte.

use crate::error::Error;
use heapless::Vec;

// Item prefixes with the size bits cleared.
const INPUT: u8 = 0x80;
const COLLECTION: u8 = 0xA0;
const END_COLLECTION: u8 = 0xC0;
const USAGE_PAGE: u8 = 0x04;
const LOGICAL_MINIMUM: u8 = 0x14;
const LOGICAL_MAXIMUM: u8 = 0x24;
const REPORT_SIZE: u8 = 0x74;
const REPORT_COUNT: u8 = 0x94;
const USAGE: u8 = 0x08;
const USAGE_MINIMUM: u8 = 0x18;
const USAGE_MAXIMUM: u8 = 0x28;

/// Input item flag: Data, Variable, Absolute.
pub const DATA_VAR_ABS: u8 = 0x02;
/// Input item flag: Data, Variable, Relative.
pub const DATA_VAR_REL: u8 = 0x06;

/// Usage page codes used by this device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum UsagePage {
    /// Generic Desktop (pointer, joystick, gamepad, axes).
    GenericDesktop = 0x01,
    /// Button.
    Button = 0x09,
}

/// Generic Desktop usage codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum DesktopUsage {
    Pointer = 0x01,
    Mouse = 0x02,
    Joystick = 0x04,
    X = 0x30,
    Y = 0x31,
}

/// Collection types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CollectionKind {
    Physical = 0x00,
    Application = 0x01,
}

/// What kind of device the host should see.
///
/// Selects the application usage of the outer collection and the
/// class identifier handed to the transport (BLE GAP appearance).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceClass {
    Gamepad,
    Joystick,
    Mouse,
}

impl DeviceClass {
    /// Generic Desktop usage of the top-level application collection.
    ///
    /// Gamepads keep the Joystick usage (`09 04`) that existing hosts were
    /// paired against; only the BLE appearance tells the two apart.
    pub const fn usage(self) -> DesktopUsage {
        match self {
            DeviceClass::Gamepad | DeviceClass::Joystick => DesktopUsage::Joystick,
            DeviceClass::Mouse => DesktopUsage::Mouse,
        }
    }

    /// BLE GAP appearance value (HID category 0x03C0).
    pub const fn appearance(self) -> u16 {
        match self {
            DeviceClass::Gamepad => 0x03C4,
            DeviceClass::Joystick => 0x03C3,
            DeviceClass::Mouse => 0x03C2,
        }
    }
}

/// Append-only, bounds-checked descriptor writer.
///
/// Every append either fits completely or fails with
/// [`Error::DescriptorOverflow`] and leaves the buffer untouched.
#[derive(Clone, Debug, Default)]
pub struct DescriptorBuilder<const N: usize> {
    bytes: Vec<u8, N>,
}

impl<const N: usize> DescriptorBuilder<N> {
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8, N> {
        self.bytes
    }

    /// Append raw bytes verbatim.
    pub fn extend(&mut self, raw: &[u8]) -> Result<&mut Self, Error> {
        self.bytes
            .extend_from_slice(raw)
            .map_err(|_| Error::DescriptorOverflow)?;
        Ok(self)
    }

    pub fn usage_page(&mut self, page: UsagePage) -> Result<&mut Self, Error> {
        self.unsigned(USAGE_PAGE, page as u32)
    }

    pub fn usage(&mut self, usage: u16) -> Result<&mut Self, Error> {
        self.unsigned(USAGE, usage as u32)
    }

    pub fn desktop_usage(&mut self, usage: DesktopUsage) -> Result<&mut Self, Error> {
        self.usage(usage as u16)
    }

    pub fn usage_minimum(&mut self, usage: u16) -> Result<&mut Self, Error> {
        self.unsigned(USAGE_MINIMUM, usage as u32)
    }

    pub fn usage_maximum(&mut self, usage: u16) -> Result<&mut Self, Error> {
        self.unsigned(USAGE_MAXIMUM, usage as u32)
    }

    pub fn logical_minimum(&mut self, value: i32) -> Result<&mut Self, Error> {
        self.signed(LOGICAL_MINIMUM, value)
    }

    pub fn logical_maximum(&mut self, value: i32) -> Result<&mut Self, Error> {
        self.signed(LOGICAL_MAXIMUM, value)
    }

    /// Field width in bits.
    pub fn report_size(&mut self, bits: u32) -> Result<&mut Self, Error> {
        self.unsigned(REPORT_SIZE, bits)
    }

    /// Number of fields.
    pub fn report_count(&mut self, count: u32) -> Result<&mut Self, Error> {
        self.unsigned(REPORT_COUNT, count)
    }

    pub fn input(&mut self, flags: u8) -> Result<&mut Self, Error> {
        self.unsigned(INPUT, flags as u32)
    }

    pub fn collection(&mut self, kind: CollectionKind) -> Result<&mut Self, Error> {
        self.unsigned(COLLECTION, kind as u32)
    }

    pub fn end_collection(&mut self) -> Result<&mut Self, Error> {
        self.extend(&[END_COLLECTION])
    }

    /// Item with unsigned data: usages, sizes, counts, flags.
    fn unsigned(&mut self, prefix: u8, value: u32) -> Result<&mut Self, Error> {
        let le = value.to_le_bytes();
        match value {
            0..=0xFF => self.extend(&[prefix | 0x01, le[0]]),
            0x100..=0xFFFF => self.extend(&[prefix | 0x02, le[0], le[1]]),
            _ => self.extend(&[prefix | 0x03, le[0], le[1], le[2], le[3]]),
        }
    }

    /// Item with two's-complement data: logical extents.
    fn signed(&mut self, prefix: u8, value: i32) -> Result<&mut Self, Error> {
        let le = value.to_le_bytes();
        if i8::try_from(value).is_ok() {
            self.extend(&[prefix | 0x01, le[0]])
        } else if i16::try_from(value).is_ok() {
            self.extend(&[prefix | 0x02, le[0], le[1]])
        } else {
            self.extend(&[prefix | 0x03, le[0], le[1], le[2], le[3]])
        }
    }
}

/// Open the top-level application collection for `class`.
pub fn open_application<const N: usize>(
    out: &mut DescriptorBuilder<N>,
    class: DeviceClass,
) -> Result<(), Error> {
    out.usage_page(UsagePage::GenericDesktop)?
        .desktop_usage(class.usage())?
        .collection(CollectionKind::Application)?;
    Ok(())
}

/// Close the collection opened by [`open_application`].
pub fn close_application<const N: usize>(out: &mut DescriptorBuilder<N>) -> Result<(), Error> {
    out.end_collection()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_wrapper_matches_gamepad_header() {
        let mut b = DescriptorBuilder::<16>::new();
        open_application(&mut b, DeviceClass::Gamepad).unwrap();
        close_application(&mut b).unwrap();
        assert_eq!(b.as_bytes(), &[0x05, 0x01, 0x09, 0x04, 0xA1, 0x01, 0xC0]);
    }

    #[test]
    fn gamepad_and_joystick_share_application_usage() {
        assert_eq!(DeviceClass::Gamepad.usage(), DesktopUsage::Joystick);
        assert_eq!(DeviceClass::Joystick.usage(), DesktopUsage::Joystick);
        assert_eq!(DeviceClass::Mouse.usage(), DesktopUsage::Mouse);
    }

    #[test]
    fn unsigned_items_pick_smallest_size() {
        let mut b = DescriptorBuilder::<16>::new();
        b.usage_minimum(0).unwrap();
        b.usage_maximum(0x3FF).unwrap();
        b.report_count(0x1_0000).unwrap();
        assert_eq!(
            b.as_bytes(),
            &[0x19, 0x00, 0x2A, 0xFF, 0x03, 0x97, 0x00, 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn signed_items_use_twos_complement() {
        let mut b = DescriptorBuilder::<16>::new();
        b.logical_minimum(-127).unwrap();
        b.logical_maximum(127).unwrap();
        b.logical_minimum(-1000).unwrap();
        b.logical_maximum(255).unwrap();
        assert_eq!(
            b.as_bytes(),
            &[0x15, 0x81, 0x25, 0x7F, 0x16, 0x18, 0xFC, 0x26, 0xFF, 0x00]
        );
    }

    #[test]
    fn overflow_leaves_buffer_untouched() {
        let mut b = DescriptorBuilder::<3>::new();
        b.usage_page(UsagePage::Button).unwrap();
        assert_eq!(b.logical_minimum(-1000).unwrap_err(), Error::DescriptorOverflow);
        assert_eq!(b.as_bytes(), &[0x05, 0x09]);
        // A one-byte item still fits.
        b.end_collection().unwrap();
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn device_class_appearance() {
        assert_eq!(DeviceClass::Gamepad.appearance(), 0x03C4);
        assert_eq!(DeviceClass::Joystick.appearance(), 0x03C3);
        assert_eq!(DeviceClass::Mouse.appearance(), 0x03C2);
    }
}
