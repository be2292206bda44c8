//! Legacy advertising payloads for the HID peripheral.
//!
//! Both the advertising packet and the scan response are sequences of
//! AD structures: `[len, type, data..]` where `len` counts the type byte
//! plus the data.

use heapless::Vec;

use crate::error::TransportError;

/// Size of one legacy advertising (or scan response) packet.
pub const LEGACY_PAYLOAD_LEN: usize = 31;

/// HID service UUID (HOGP).
pub const HID_SERVICE_UUID: u16 = 0x1812;

pub const AD_FLAGS: u8 = 0x01;
pub const AD_UUID16_COMPLETE: u8 = 0x03;
pub const AD_SHORT_NAME: u8 = 0x08;
pub const AD_COMPLETE_NAME: u8 = 0x09;
pub const AD_APPEARANCE: u8 = 0x19;

/// LE General Discoverable, BR/EDR not supported.
const FLAGS_GENERAL_LE_ONLY: u8 = 0x06;

type Payload = Vec<u8, LEGACY_PAYLOAD_LEN>;

/// Advertising data plus scan response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdvertisingData {
    pub adv: Payload,
    pub scan_response: Payload,
}

impl AdvertisingData {
    /// Payloads announcing a HID device called `name` with `appearance`.
    ///
    /// The complete name goes in the advertising packet when it fits.
    /// Otherwise the packet carries a shortened name and the complete one
    /// moves to the scan response.
    pub fn hid(name: &str, appearance: u16) -> Result<Self, TransportError> {
        if name.len() > LEGACY_PAYLOAD_LEN - 2 {
            return Err(TransportError::NameTooLong);
        }

        let mut data = Self::default();
        push_field(&mut data.adv, AD_FLAGS, &[FLAGS_GENERAL_LE_ONLY])?;
        push_field(&mut data.adv, AD_APPEARANCE, &appearance.to_le_bytes())?;
        push_field(&mut data.adv, AD_UUID16_COMPLETE, &HID_SERVICE_UUID.to_le_bytes())?;

        let room = LEGACY_PAYLOAD_LEN - data.adv.len() - 2;
        if name.len() <= room {
            push_field(&mut data.adv, AD_COMPLETE_NAME, name.as_bytes())?;
        } else {
            let mut cut = room;
            while !name.is_char_boundary(cut) {
                cut -= 1;
            }
            push_field(&mut data.adv, AD_SHORT_NAME, &name.as_bytes()[..cut])?;
            push_field(&mut data.scan_response, AD_COMPLETE_NAME, name.as_bytes())?;
        }
        Ok(data)
    }
}

fn push_field(out: &mut Payload, ad_type: u8, data: &[u8]) -> Result<(), TransportError> {
    out.push(data.len() as u8 + 1)
        .and_then(|_| out.push(ad_type))
        .map_err(|_| TransportError::NameTooLong)?;
    out.extend_from_slice(data)
        .map_err(|_| TransportError::NameTooLong)
}

/// Iterate the `(type, data)` pairs of a raw payload.
///
/// Stops at the first zero-length or truncated structure.
pub fn fields(data: &[u8]) -> Fields<'_> {
    Fields { data }
}

pub struct Fields<'a> {
    data: &'a [u8],
}

impl<'a> Iterator for Fields<'a> {
    type Item = (u8, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let (&len, rest) = self.data.split_first()?;
        let len = len as usize;
        if len == 0 || len > rest.len() {
            self.data = &[];
            return None;
        }
        let (field, tail) = rest.split_at(len);
        self.data = tail;
        Some((field[0], &field[1..]))
    }
}

/// Local name carried by a payload, complete or shortened.
pub fn local_name(data: &[u8]) -> Option<&str> {
    fields(data)
        .find(|(ty, _)| *ty == AD_COMPLETE_NAME || *ty == AD_SHORT_NAME)
        .and_then(|(_, name)| core::str::from_utf8(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_fits_in_advert() {
        let data = AdvertisingData::hid("Pico Joystick", 0x03C4).unwrap();
        assert_eq!(
            &data.adv[..11],
            &[0x02, 0x01, 0x06, 0x03, 0x19, 0xC4, 0x03, 0x03, 0x03, 0x12, 0x18]
        );
        assert_eq!(local_name(&data.adv), Some("Pico Joystick"));
        assert!(data.scan_response.is_empty());
    }

    #[test]
    fn long_name_moves_to_scan_response() {
        let name = "Pico Arcade Stick Deluxe";
        let data = AdvertisingData::hid(name, 0x03C3).unwrap();
        assert_eq!(data.adv.len(), LEGACY_PAYLOAD_LEN);

        let (ty, short) = fields(&data.adv).last().unwrap();
        assert_eq!(ty, AD_SHORT_NAME);
        assert_eq!(short, &name.as_bytes()[..18]);
        assert_eq!(local_name(&data.scan_response), Some(name));
    }

    #[test]
    fn oversized_name_rejected() {
        let name = "abcdefghijklmnopqrstuvwxyz0123";
        assert_eq!(
            AdvertisingData::hid(name, 0),
            Err(TransportError::NameTooLong)
        );
    }

    #[test]
    fn parser_stops_on_truncated_field() {
        let raw = [0x02, 0x01, 0x06, 0x05, 0x09, b'a'];
        let parsed: std::vec::Vec<_> = fields(&raw).collect();
        assert_eq!(parsed, [(0x01, &[0x06][..])]);
        assert_eq!(local_name(&raw), None);
    }
}
