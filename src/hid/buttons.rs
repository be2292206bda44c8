//! Button bank page - a bit-packed block of on/off inputs.
//!
//! Layout (`button_count() / 8` bytes):
//! ```text
//! Byte 0: buttons first+0 .. first+7   (bit 0 = first)
//! Byte 1: buttons first+8 .. first+15
//! ...
//! ```
//!
//! The button count is rounded up to a whole byte; padding bits are
//! never addressable and always report 0.
//!
//! ## Transactions
//!
//! Writes made between [`ButtonBank::begin_transaction`] and the matching
//! [`ButtonBank::end_transaction`] go to a shadow copy.  The reported
//! state only changes when the outermost transaction ends, and then all
//! changes land at once, so the host never sees a combination of buttons
//! that did not exist (e.g. d-pad UP released before LEFT is pressed).

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::config::MAX_BUTTONS;
use crate::error::Error;
use crate::hid::descriptor::{DescriptorBuilder, UsagePage, DATA_VAR_ABS};

/// Bytes reserved for the largest supported bank.
const BANK_BYTES: usize = MAX_BUTTONS / 8;

#[derive(Clone, Copy)]
struct BankState {
    /// Reported state.
    live: [u8; BANK_BYTES],
    /// Pending state while a transaction is open.
    shadow: Option<[u8; BANK_BYTES]>,
    /// Nesting depth of open transactions.
    open: u16,
}

/// A contiguous range of button ids packed into bits.
pub struct ButtonBank {
    first: u16,
    last: u16,
    /// Buttons in the report, padded to a multiple of 8.
    count: u16,
    state: Mutex<CriticalSectionRawMutex, RefCell<BankState>>,
}

impl ButtonBank {
    /// Create a bank for button ids `first..=last`.
    pub fn new(first: u16, last: u16) -> Result<Self, Error> {
        if first > last || usize::from(last - first) >= MAX_BUTTONS {
            return Err(Error::InvalidButtonRange { first, last });
        }
        let count = (last - first + 1).div_ceil(8) * 8;
        Ok(Self {
            first,
            last,
            count,
            state: Mutex::new(RefCell::new(BankState {
                live: [0; BANK_BYTES],
                shadow: None,
                open: 0,
            })),
        })
    }

    /// First addressable button id.
    pub fn first(&self) -> u16 {
        self.first
    }

    /// Last addressable button id.
    pub fn last(&self) -> u16 {
        self.last
    }

    /// Buttons in the report, padding included.
    pub fn button_count(&self) -> u16 {
        self.count
    }

    /// Bytes this bank contributes to each report.
    pub fn report_width(&self) -> usize {
        usize::from(self.count / 8)
    }

    pub fn contains(&self, id: u16) -> bool {
        (self.first..=self.last).contains(&id)
    }

    /// Byte index and bit mask of button `id`.
    fn locate(&self, id: u16) -> Result<(usize, u8), Error> {
        if !self.contains(id) {
            return Err(Error::ButtonOutOfRange {
                id,
                first: self.first,
                last: self.last,
            });
        }
        let offset = id - self.first;
        Ok((usize::from(offset / 8), 1 << (offset % 8)))
    }

    /// Set or clear button `id`.
    ///
    /// Returns `true` when the reported state changed and a new report
    /// should be sent.  Inside a transaction the write goes to the shadow
    /// copy and this always returns `false`; the commit decides instead.
    pub fn set_button(&self, id: u16, pressed: bool) -> Result<bool, Error> {
        let (byte, mask) = self.locate(id)?;
        Ok(self.state.lock(|cell| {
            let mut guard = cell.borrow_mut();
            let state = &mut *guard;
            if let Some(shadow) = state.shadow.as_mut() {
                apply(&mut shadow[byte], mask, pressed);
                return false;
            }
            let before = state.live[byte];
            apply(&mut state.live[byte], mask, pressed);
            state.live[byte] != before
        }))
    }

    /// Current value of button `id` as seen by the writer.
    ///
    /// Inside a transaction this includes uncommitted writes.
    pub fn button(&self, id: u16) -> Result<bool, Error> {
        let (byte, mask) = self.locate(id)?;
        Ok(self.state.lock(|cell| {
            let state = cell.borrow();
            let bytes = state.shadow.as_ref().unwrap_or(&state.live);
            bytes[byte] & mask != 0
        }))
    }

    /// Value of button `id` as the next report will carry it.
    pub fn committed(&self, id: u16) -> Result<bool, Error> {
        let (byte, mask) = self.locate(id)?;
        Ok(self.state.lock(|cell| cell.borrow().live[byte] & mask != 0))
    }

    pub fn in_transaction(&self) -> bool {
        self.state.lock(|cell| cell.borrow().open > 0)
    }

    /// Open (or nest) a transaction.
    pub fn begin_transaction(&self) {
        self.state.lock(|cell| {
            let mut state = cell.borrow_mut();
            if state.open == 0 {
                state.shadow = Some(state.live);
            }
            state.open = state.open.saturating_add(1);
        });
    }

    /// Close one level of transaction.
    ///
    /// Returns `true` when the outermost level committed a change, in
    /// which case exactly one report should be requested for the batch.
    pub fn end_transaction(&self) -> bool {
        let width = self.report_width();
        let committed = self.state.lock(|cell| {
            let mut state = cell.borrow_mut();
            match state.open {
                0 => None,
                1 => {
                    state.open = 0;
                    let shadow = state.shadow.take()?;
                    if shadow[..width] == state.live[..width] {
                        return Some(false);
                    }
                    state.live = shadow;
                    Some(true)
                }
                _ => {
                    state.open -= 1;
                    Some(false)
                }
            }
        });
        match committed {
            Some(changed) => {
                if changed {
                    debug!("buttons {}..={}: transaction committed", self.first, self.last);
                }
                changed
            }
            None => {
                warn!("buttons {}..={}: end_transaction without begin", self.first, self.last);
                false
            }
        }
    }

    /// Append this bank's descriptor fragment; returns the bytes written.
    ///
    /// ```text
    /// 05 09        Usage Page (Button)
    /// 19 first     Usage Minimum
    /// 29 max       Usage Maximum (first + count - 1)
    /// 15 00        Logical Minimum (0)
    /// 25 01        Logical Maximum (1)
    /// 95 count     Report Count
    /// 75 01        Report Size (1)
    /// 81 02        Input (Data, Variable, Absolute)
    /// ```
    pub fn emit_descriptor<const N: usize>(
        &self,
        out: &mut DescriptorBuilder<N>,
    ) -> Result<usize, Error> {
        let start = out.len();
        out.usage_page(UsagePage::Button)?
            .usage_minimum(self.first)?
            .usage_maximum(self.first.saturating_add(self.count - 1))?
            .logical_minimum(0)?
            .logical_maximum(1)?
            .report_count(u32::from(self.count))?
            .report_size(1)?
            .input(DATA_VAR_ABS)?;
        Ok(out.len() - start)
    }

    /// Copy the committed state into `buf`.
    /// Returns the number of bytes written (0 if `buf` is too small).
    pub fn serialize_into(&self, buf: &mut [u8]) -> usize {
        let width = self.report_width();
        if buf.len() < width {
            return 0;
        }
        self.state
            .lock(|cell| buf[..width].copy_from_slice(&cell.borrow().live[..width]));
        width
    }
}

fn apply(byte: &mut u8, mask: u8, pressed: bool) {
    if pressed {
        *byte |= mask;
    } else {
        *byte &= !mask;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(bank: &ButtonBank) -> [u8; 4] {
        let mut buf = [0u8; 4];
        bank.serialize_into(&mut buf);
        buf
    }

    #[test]
    fn descriptor_for_eight_buttons_is_literal() {
        let bank = ButtonBank::new(1, 8).unwrap();
        let mut out = DescriptorBuilder::<32>::new();
        let written = bank.emit_descriptor(&mut out).unwrap();
        assert_eq!(written, 16);
        assert_eq!(
            out.as_bytes(),
            &[
                0x05, 0x09, 0x19, 0x01, 0x29, 0x08, 0x15, 0x00, 0x25, 0x01, 0x95, 0x08, 0x75,
                0x01, 0x81, 0x02,
            ]
        );
    }

    #[test]
    fn count_is_padded_to_whole_bytes() {
        let bank = ButtonBank::new(1, 3).unwrap();
        assert_eq!(bank.button_count(), 8);
        assert_eq!(bank.report_width(), 1);

        let bank = ButtonBank::new(1, 12).unwrap();
        assert_eq!(bank.button_count(), 16);
        assert_eq!(bank.report_width(), 2);

        let bank = ButtonBank::new(0, 31).unwrap();
        assert_eq!(bank.button_count(), 32);
    }

    #[test]
    fn rejects_inverted_or_oversized_range() {
        assert_eq!(
            ButtonBank::new(5, 4).err(),
            Some(Error::InvalidButtonRange { first: 5, last: 4 })
        );
        assert!(ButtonBank::new(0, MAX_BUTTONS as u16).is_err());
        assert!(ButtonBank::new(0, MAX_BUTTONS as u16 - 1).is_ok());
    }

    #[test]
    fn set_button_touches_only_its_bit() {
        let bank = ButtonBank::new(1, 16).unwrap();
        for id in 1..=16 {
            assert!(bank.set_button(id, true).unwrap());
            assert!(bank.button(id).unwrap());
            for other in (1..=16).filter(|&o| o != id) {
                assert!(!bank.button(other).unwrap());
            }
            assert!(bank.set_button(id, false).unwrap());
        }
    }

    #[test]
    fn ids_are_relative_to_first() {
        let bank = ButtonBank::new(10, 17).unwrap();
        bank.set_button(10, true).unwrap();
        bank.set_button(17, true).unwrap();
        assert_eq!(report(&bank)[0], 0b1000_0001);
    }

    #[test]
    fn repeated_write_does_not_request_send() {
        let bank = ButtonBank::new(1, 8).unwrap();
        assert!(bank.set_button(3, true).unwrap());
        assert!(!bank.set_button(3, true).unwrap());
        assert!(bank.set_button(3, false).unwrap());
        assert!(!bank.set_button(3, false).unwrap());
    }

    #[test]
    fn out_of_range_is_rejected() {
        let bank = ButtonBank::new(1, 8).unwrap();
        assert_eq!(
            bank.set_button(9, true),
            Err(Error::ButtonOutOfRange {
                id: 9,
                first: 1,
                last: 8
            })
        );
        assert!(bank.set_button(0, true).is_err());
        assert_eq!(report(&bank)[0], 0);
    }

    #[test]
    fn transaction_hides_writes_until_commit() {
        let bank = ButtonBank::new(1, 16).unwrap();
        bank.begin_transaction();
        assert!(!bank.set_button(1, true).unwrap());
        assert!(!bank.set_button(9, true).unwrap());

        // Writer sees its own writes, the report does not.
        assert!(bank.button(1).unwrap());
        assert!(!bank.committed(1).unwrap());
        assert_eq!(report(&bank)[..2], [0, 0]);

        assert!(bank.end_transaction());
        assert_eq!(report(&bank)[..2], [0x01, 0x01]);
        assert!(!bank.in_transaction());
    }

    #[test]
    fn transaction_without_net_change_commits_nothing() {
        let bank = ButtonBank::new(1, 8).unwrap();
        bank.set_button(2, true).unwrap();
        bank.begin_transaction();
        bank.set_button(2, false).unwrap();
        bank.set_button(2, true).unwrap();
        assert!(!bank.end_transaction());
    }

    #[test]
    fn nested_transactions_commit_on_outermost_end() {
        let bank = ButtonBank::new(1, 8).unwrap();
        bank.begin_transaction();
        bank.begin_transaction();
        assert!(!bank.end_transaction());
        bank.set_button(4, true).unwrap();
        assert!(!bank.committed(4).unwrap());
        assert!(bank.end_transaction());
        assert!(bank.committed(4).unwrap());
    }

    #[test]
    fn unbalanced_end_is_ignored() {
        let bank = ButtonBank::new(1, 8).unwrap();
        assert!(!bank.end_transaction());
        assert!(bank.set_button(1, true).unwrap());
    }

    #[test]
    fn serialize_into_short_buffer_writes_nothing() {
        let bank = ButtonBank::new(1, 16).unwrap();
        let mut buf = [0xFFu8; 1];
        assert_eq!(bank.serialize_into(&mut buf), 0);
        assert_eq!(buf, [0xFF]);
    }
}
