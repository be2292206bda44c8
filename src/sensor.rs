//! AS5600 magnetic rotary position sensor (spinner input).
//!
//! Register map used here:
//! ```text
//! 0x0B  STATUS     bit 5 MD (magnet detected)
//!                  bit 4 ML (magnet too weak)
//!                  bit 3 MH (magnet too strong)
//! 0x0C  RAW ANGLE  bits 11:8
//! 0x0D  RAW ANGLE  bits 7:0
//! ```

use embedded_hal::i2c::I2c;

use crate::config::{AS5600_ADDRESS, AS5600_JITTER_COUNTS};

const REG_STATUS: u8 = 0x0B;
const REG_RAW_ANGLE: u8 = 0x0C;

const STATUS_MD: u8 = 0x20;
const STATUS_ML: u8 = 0x10;
const STATUS_MH: u8 = 0x08;

/// Raw angle counts per revolution.
const COUNTS: u16 = 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MagnetStatus {
    Detected,
    /// Magnet too far from the sensor.
    TooWeak,
    /// Magnet too close to the sensor.
    TooStrong,
    Unknown(u8),
}

impl MagnetStatus {
    pub fn from_register(raw: u8) -> Self {
        if raw & STATUS_MD != 0 {
            MagnetStatus::Detected
        } else if raw & STATUS_MH != 0 {
            MagnetStatus::TooStrong
        } else if raw & STATUS_ML != 0 {
            MagnetStatus::TooWeak
        } else {
            MagnetStatus::Unknown(raw)
        }
    }
}

pub struct As5600<I2C> {
    i2c: I2C,
    address: u8,
    /// Last accepted raw angle.
    last: u16,
}

impl<I2C: I2c> As5600<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, AS5600_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            last: 0,
        }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    pub fn magnet_status(&mut self) -> Result<MagnetStatus, I2C::Error> {
        let mut status = [0u8; 1];
        self.i2c
            .write_read(self.address, &[REG_STATUS], &mut status)?;
        Ok(MagnetStatus::from_register(status[0]))
    }

    /// Unfiltered 12-bit angle register.
    pub fn read_raw_angle(&mut self) -> Result<u16, I2C::Error> {
        let mut angle = [0u8; 2];
        self.i2c
            .write_read(self.address, &[REG_RAW_ANGLE], &mut angle)?;
        Ok(u16::from_be_bytes(angle))
    }

    /// Filtered position as a fraction of a turn in `[0.0, 1.0]`.
    pub fn read_position(&mut self) -> Result<f32, I2C::Error> {
        let raw = self.read_raw_angle()?;
        self.last = filter(self.last, raw);
        Ok(f32::from(self.last) / f32::from(COUNTS - 1))
    }
}

/// Drop out-of-range readings and jitter around the last accepted value.
fn filter(last: u16, raw: u16) -> u16 {
    if raw >= COUNTS || raw.abs_diff(last) <= AS5600_JITTER_COUNTS {
        last
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

    #[derive(Debug)]
    struct BusFault;

    impl embedded_hal::i2c::Error for BusFault {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    type Regs = RefCell<[u8; 0x10]>;

    /// Register-file fake: a write selects the register, reads auto-increment.
    struct FakeBus<'a> {
        regs: &'a Regs,
        fail: bool,
    }

    impl<'a> FakeBus<'a> {
        fn new(regs: &'a Regs) -> Self {
            Self { regs, fail: false }
        }
    }

    fn set_angle(regs: &Regs, raw: u16) {
        let [hi, lo] = raw.to_be_bytes();
        let mut regs = regs.borrow_mut();
        regs[0x0C] = hi;
        regs[0x0D] = lo;
    }

    impl ErrorType for FakeBus<'_> {
        type Error = BusFault;
    }

    impl I2c for FakeBus<'_> {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), BusFault> {
            if self.fail || address != AS5600_ADDRESS {
                return Err(BusFault);
            }
            let regs = self.regs.borrow();
            let mut reg = 0usize;
            for op in operations {
                match op {
                    Operation::Write(bytes) => reg = usize::from(bytes[0]),
                    Operation::Read(buf) => {
                        for byte in buf.iter_mut() {
                            *byte = regs[reg];
                            reg += 1;
                        }
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn status_decoding() {
        assert_eq!(MagnetStatus::from_register(0x20), MagnetStatus::Detected);
        assert_eq!(MagnetStatus::from_register(0x37), MagnetStatus::Detected);
        assert_eq!(MagnetStatus::from_register(0x10), MagnetStatus::TooWeak);
        assert_eq!(MagnetStatus::from_register(0x08), MagnetStatus::TooStrong);
        assert_eq!(MagnetStatus::from_register(0x03), MagnetStatus::Unknown(0x03));
    }

    #[test]
    fn reads_status_register() {
        let regs = Regs::default();
        regs.borrow_mut()[0x0B] = 0x10;
        let mut sensor = As5600::new(FakeBus::new(&regs));
        assert_eq!(sensor.magnet_status().unwrap(), MagnetStatus::TooWeak);
        regs.borrow_mut()[0x0B] = 0x20;
        assert_eq!(sensor.magnet_status().unwrap(), MagnetStatus::Detected);
    }

    #[test]
    fn position_scales_to_fraction() {
        let regs = Regs::default();
        let mut sensor = As5600::new(FakeBus::new(&regs));
        set_angle(&regs, 4095);
        assert_eq!(sensor.read_position().unwrap(), 1.0);
        set_angle(&regs, 2048);
        assert!((sensor.read_position().unwrap() - 0.5).abs() < 1e-3);
        assert_eq!(sensor.read_raw_angle().unwrap(), 2048);
    }

    #[test]
    fn jitter_is_suppressed() {
        let regs = Regs::default();
        let mut sensor = As5600::new(FakeBus::new(&regs));
        set_angle(&regs, 1000);
        let settled = sensor.read_position().unwrap();
        set_angle(&regs, 1002);
        assert_eq!(sensor.read_position().unwrap(), settled);
        set_angle(&regs, 998);
        assert_eq!(sensor.read_position().unwrap(), settled);
        set_angle(&regs, 1003);
        assert!(sensor.read_position().unwrap() > settled);
    }

    #[test]
    fn out_of_range_reading_is_ignored() {
        let regs = Regs::default();
        let mut sensor = As5600::new(FakeBus::new(&regs));
        set_angle(&regs, 3000);
        let before = sensor.read_position().unwrap();
        set_angle(&regs, 0x1FFF);
        assert_eq!(sensor.read_position().unwrap(), before);
    }

    #[test]
    fn bus_errors_propagate() {
        let regs = Regs::default();
        let mut bus = FakeBus::new(&regs);
        bus.fail = true;
        let mut sensor = As5600::new(bus);
        assert!(sensor.read_position().is_err());
        assert!(sensor.magnet_status().is_err());
    }

    #[test]
    fn custom_address_is_used() {
        let regs = Regs::default();
        let mut sensor = As5600::with_address(FakeBus::new(&regs), 0x40);
        assert!(sensor.read_raw_angle().is_err());
        let _bus: FakeBus = sensor.release();
    }
}
