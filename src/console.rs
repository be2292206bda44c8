//! Line-oriented debug console for poking buttons by hand.
//!
//! ```text
//! <button> <0|1>   release / press a button
//! state            list pressed buttons
//! help             this text
//! ```
//!
//! The console is handed the controller it drives; output goes to any
//! `core::fmt::Write` sink (UART, RTT, a test buffer).

use core::fmt::Write;

use crate::hid::controller::{PageId, ReportController, Transport};

const USAGE: &str = "usage: <button #> <0|1> | state | help\n";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Set { button: u16, pressed: bool },
    State,
    Help,
    Empty,
    Unknown,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let (Some(first), second, None) = (words.next(), words.next(), words.next()) else {
            return if line.trim().is_empty() {
                Command::Empty
            } else {
                Command::Unknown
            };
        };
        match (first, second) {
            ("state", None) => Command::State,
            ("help", None) => Command::Help,
            (button, Some(value)) => match (button.parse::<u16>(), value.parse::<i32>()) {
                (Ok(button), Ok(value)) => Command::Set {
                    button,
                    pressed: value != 0,
                },
                _ => Command::Unknown,
            },
            _ => Command::Unknown,
        }
    }
}

/// Console bound to one button page.
pub struct Console {
    page: PageId,
}

impl Console {
    pub fn new(page: PageId) -> Self {
        Self { page }
    }

    /// Run one command line, writing any response to `out`.
    pub fn execute<T: Transport, const D: usize, W: Write>(
        &self,
        line: &str,
        controller: &ReportController<T, D>,
        out: &mut W,
    ) -> core::fmt::Result {
        match Command::parse(line) {
            Command::Set { button, pressed } => {
                if let Err(e) = controller.set_button(self.page, button, pressed) {
                    writeln!(out, "error: {:?}", e)?;
                }
                Ok(())
            }
            Command::State => {
                let bank = match controller.buttons(self.page) {
                    Ok(bank) => bank,
                    Err(e) => return writeln!(out, "error: {:?}", e),
                };
                out.write_str("buttons pressed:")?;
                for id in bank.first()..=bank.last() {
                    if bank.committed(id) == Ok(true) {
                        write!(out, " {}", id)?;
                    }
                }
                out.write_str("\n")
            }
            Command::Help | Command::Unknown => out.write_str(USAGE),
            Command::Empty => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::hid::{ButtonBank, DeviceClass};
    use heapless::String;

    struct Null;

    impl Transport for Null {
        fn initialize(&mut self, _: &str, _: &[u8], _: DeviceClass) -> Result<(), TransportError> {
            Ok(())
        }
        fn request_send_opportunity(&self) {}
        fn send_report(&self, _: &[u8]) {}
    }

    fn setup() -> (ReportController<Null>, Console) {
        let mut c = ReportController::new(DeviceClass::Gamepad, Null);
        let page = c.register_page(ButtonBank::new(1, 32).unwrap()).unwrap();
        c.initialize("console").unwrap();
        (c, Console::new(page))
    }

    fn run(console: &Console, c: &ReportController<Null>, line: &str) -> String<128> {
        let mut out = String::new();
        console.execute(line, c, &mut out).unwrap();
        out
    }

    #[test]
    fn parses_commands() {
        assert_eq!(
            Command::parse("3 1"),
            Command::Set {
                button: 3,
                pressed: true
            }
        );
        assert_eq!(
            Command::parse("  12   0 "),
            Command::Set {
                button: 12,
                pressed: false
            }
        );
        assert_eq!(Command::parse("state"), Command::State);
        assert_eq!(Command::parse("help"), Command::Help);
        assert_eq!(Command::parse(""), Command::Empty);
        assert_eq!(Command::parse("x 1"), Command::Unknown);
        assert_eq!(Command::parse("1 2 3"), Command::Unknown);
        assert_eq!(Command::parse("state now"), Command::Unknown);
    }

    #[test]
    fn set_then_state() {
        let (c, console) = setup();
        assert_eq!(run(&console, &c, "5 1"), "");
        run(&console, &c, "17 1");
        assert_eq!(run(&console, &c, "state"), "buttons pressed: 5 17\n");
        run(&console, &c, "5 0");
        assert_eq!(run(&console, &c, "state"), "buttons pressed: 17\n");
    }

    #[test]
    fn out_of_range_reports_error() {
        let (c, console) = setup();
        let out = run(&console, &c, "40 1");
        assert!(out.starts_with("error: ButtonOutOfRange"));
    }

    #[test]
    fn unknown_prints_usage() {
        let (c, console) = setup();
        assert_eq!(run(&console, &c, "reboot"), USAGE);
        assert_eq!(run(&console, &c, "help"), USAGE);
        assert_eq!(run(&console, &c, "   "), "");
    }
}
