//! Ready-made device layouts.
//!
//! | Profile       | Class    | Pages                          |
//! |---------------|----------|--------------------------------|
//! | `Gamepad`     | Gamepad  | buttons 1..=32                 |
//! | `Joystick`    | Gamepad  | buttons 1..=JOYSTICK_BUTTONS   |
//! | `Thumbstick`  | Gamepad  | buttons 1..=12 (1-4 = d-pad)   |
//! | `Spinner`     | Mouse    | button 1, spinner              |
//! | `ArcadeStick` | Joystick | buttons 1..=JOYSTICK_BUTTONS, X/Y |

use crate::config::JOYSTICK_BUTTONS;
use crate::error::Error;
use crate::hid::axes::AxisPair;
use crate::hid::buttons::ButtonBank;
use crate::hid::controller::{PageId, ReportController, Transport};
use crate::hid::descriptor::DeviceClass;
use crate::hid::spinner::Spinner;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Profile {
    Gamepad,
    Joystick,
    Thumbstick,
    Spinner,
    ArcadeStick,
}

/// Where each page of a profile ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub buttons: PageId,
    pub axes: Option<PageId>,
    pub spinner: Option<PageId>,
}

impl Profile {
    pub fn class(self) -> DeviceClass {
        match self {
            Profile::Gamepad | Profile::Joystick | Profile::Thumbstick => DeviceClass::Gamepad,
            Profile::Spinner => DeviceClass::Mouse,
            Profile::ArcadeStick => DeviceClass::Joystick,
        }
    }

    /// Advertised device name.
    pub fn device_name(self) -> &'static str {
        match self {
            Profile::Gamepad => "Pico GamePad",
            Profile::Joystick => "Pico Joystick",
            Profile::Thumbstick => "Pico Thumbstick",
            Profile::Spinner => "Pico Spinner",
            Profile::ArcadeStick => "Pico Arcade Stick",
        }
    }

    /// Button ids of the profile's button bank.
    pub fn button_range(self) -> (u16, u16) {
        match self {
            Profile::Gamepad => (1, 32),
            Profile::Joystick | Profile::ArcadeStick => (1, JOYSTICK_BUTTONS as u16),
            Profile::Thumbstick => (1, 12),
            Profile::Spinner => (1, 1),
        }
    }

    /// Register the profile's pages on a fresh controller.
    ///
    /// The controller is returned un-initialized so the caller can still
    /// pick the name it registers with.
    pub fn build<T: Transport>(self, transport: T) -> Result<(ReportController<T>, Layout), Error> {
        let mut controller = ReportController::new(self.class(), transport);
        let (first, last) = self.button_range();
        let buttons = controller.register_page(ButtonBank::new(first, last)?)?;
        let mut layout = Layout {
            buttons,
            axes: None,
            spinner: None,
        };
        match self {
            Profile::Spinner => layout.spinner = Some(controller.register_page(Spinner::new())?),
            Profile::ArcadeStick => layout.axes = Some(controller.register_page(AxisPair::new())?),
            Profile::Gamepad | Profile::Joystick | Profile::Thumbstick => {}
        }
        debug!("profile {}: {} pages", self, controller.page_count());
        Ok((controller, layout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    struct Null;

    impl Transport for Null {
        fn initialize(&mut self, _: &str, _: &[u8], _: DeviceClass) -> Result<(), TransportError> {
            Ok(())
        }
        fn request_send_opportunity(&self) {}
        fn send_report(&self, _: &[u8]) {}
    }

    fn report_len(profile: Profile) -> usize {
        let (mut c, _) = profile.build(Null).unwrap();
        c.initialize(profile.device_name()).unwrap();
        c.report_len()
    }

    #[test]
    fn report_lengths() {
        assert_eq!(report_len(Profile::Gamepad), 1 + 4);
        assert_eq!(report_len(Profile::Joystick), 1 + 2);
        assert_eq!(report_len(Profile::Thumbstick), 1 + 2);
        assert_eq!(report_len(Profile::Spinner), 1 + 1 + 4);
        assert_eq!(report_len(Profile::ArcadeStick), 1 + 2 + 2);
    }

    #[test]
    fn spinner_layout() {
        let (c, layout) = Profile::Spinner.build(Null).unwrap();
        assert_eq!(c.class(), DeviceClass::Mouse);
        assert!(layout.axes.is_none());
        let spinner = layout.spinner.unwrap();
        assert!(c.spinner(spinner).is_ok());
        assert_eq!(c.buttons(layout.buttons).unwrap().last(), 1);
    }

    #[test]
    fn arcade_stick_layout() {
        let (c, layout) = Profile::ArcadeStick.build(Null).unwrap();
        assert_eq!(c.class(), DeviceClass::Joystick);
        assert!(c.axes(layout.axes.unwrap()).is_ok());
        assert!(layout.spinner.is_none());
    }

    #[test]
    fn gamepad_descriptor_header() {
        let (mut c, _) = Profile::Gamepad.build(Null).unwrap();
        c.initialize("Pico GamePad").unwrap();
        assert_eq!(&c.descriptor()[..6], &[0x05, 0x01, 0x09, 0x04, 0xA1, 0x01]);
    }

    #[test]
    fn every_gamepad_variant_uses_joystick_usage() {
        for profile in [Profile::Gamepad, Profile::Joystick, Profile::Thumbstick] {
            let (mut c, _) = profile.build(Null).unwrap();
            c.initialize(profile.device_name()).unwrap();
            assert_eq!(&c.descriptor()[2..4], &[0x09, 0x04], "{profile:?}");
        }
    }
}
