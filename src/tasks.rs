//! Input polling loops feeding the report controller.
//!
//! Each loop owns its peripheral and talks to the controller through
//! shared references only; the controller serialises access internally.

use defmt::{info, warn};
use embassy_nrf::gpio::Input;
use embassy_nrf::peripherals::TWISPI0;
use embassy_nrf::saadc::Saadc;
use embassy_nrf::twim::Twim;
use embassy_time::{Duration, Instant, Ticker, Timer};
use heapless::Vec;

use padlink::config::{BUTTON_POLL_MS, MAGNET_RETRY_MS, SPINNER_POLL_MS, THUMBSTICK_POLL_MS};
use padlink::input::dpad::{self, DpadMap, ProgramChord};
use padlink::input::DebouncedInput;
use padlink::sensor::{As5600, MagnetStatus};
use padlink::PageId;

use crate::ble::Controller;

/// Most physical buttons one board wires up.
pub const MAX_INPUTS: usize = 16;

pub type Buttons = Vec<DebouncedInput<Input<'static>>, MAX_INPUTS>;
pub type Stick = Saadc<'static, 2>;
pub type Sensor = As5600<Twim<'static, TWISPI0>>;

/// Full-scale reading at 12-bit resolution.
const ADC_FULL_SCALE: f32 = 4095.0;

/// Sample every bound button and forward accepted edges.
pub async fn button_loop(controller: &'static Controller, mut buttons: Buttons) -> ! {
    info!("polling {} buttons", buttons.len());
    let mut ticker = Ticker::every(Duration::from_millis(BUTTON_POLL_MS));
    loop {
        let now = Instant::now().as_millis();
        for button in buttons.iter_mut() {
            if let Err(e) = button.poll(now, controller) {
                warn!("button update failed: {}", e);
            }
        }
        ticker.next().await;
    }
}

/// Thumbstick as d-pad.
///
/// Holding program mode freezes the d-pad and lets the chord buttons
/// pick a different map.
pub async fn thumbstick_loop(controller: &'static Controller, page: PageId, mut stick: Stick) -> ! {
    let mut map = DpadMap::default();
    info!("d-pad map: {}", map);
    let mut ticker = Ticker::every(Duration::from_millis(THUMBSTICK_POLL_MS));

    loop {
        ticker.next().await;

        let chord = controller
            .buttons(page)
            .and_then(ProgramChord::read);
        match chord {
            Ok(Some(chord)) => {
                if let Some(next) = chord.selected_map().filter(|m| *m != map) {
                    map = next;
                    info!("d-pad map: {}", map);
                }
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                warn!("program chord unreadable: {}", e);
                continue;
            }
        }

        let (x, y) = read_stick(&mut stick).await;
        let action = map.action(x, y);
        if let Err(e) = controller.transaction(page, |bank| dpad::apply(action, bank)) {
            warn!("d-pad update failed: {}", e);
        }
    }
}

/// Analog stick reported as an X/Y axis pair.
pub async fn axes_loop(controller: &'static Controller, page: PageId, mut stick: Stick) -> ! {
    let mut ticker = Ticker::every(Duration::from_millis(THUMBSTICK_POLL_MS));
    loop {
        let (x, y) = read_stick(&mut stick).await;
        if let Err(e) = controller.move_axes(page, x, y) {
            warn!("axis update failed: {}", e);
        }
        ticker.next().await;
    }
}

/// Wait for the magnet, then stream the rotor angle into the spinner page.
pub async fn spinner_loop(controller: &'static Controller, page: PageId, mut sensor: Sensor) -> ! {
    loop {
        match sensor.magnet_status() {
            Ok(MagnetStatus::Detected) => break,
            Ok(status) => warn!("waiting for magnet: {}", status),
            Err(e) => warn!("AS5600 not responding: {}", e),
        }
        Timer::after(Duration::from_millis(MAGNET_RETRY_MS)).await;
    }
    info!("magnet detected");

    let mut ticker = Ticker::every(Duration::from_millis(SPINNER_POLL_MS));
    loop {
        match sensor.read_position() {
            Ok(position) => {
                if let Err(e) = controller.set_spinner_position(page, position) {
                    warn!("spinner update failed: {}", e);
                }
            }
            Err(e) => warn!("AS5600 read failed: {}", e),
        }
        ticker.next().await;
    }
}

/// One X/Y sample as fractions of full scale.
async fn read_stick(stick: &mut Stick) -> (f32, f32) {
    let mut buf = [0i16; 2];
    stick.sample(&mut buf).await;
    (percent(buf[0]), percent(buf[1]))
}

fn percent(raw: i16) -> f32 {
    // Single-ended samples can dip slightly below zero.
    (f32::from(raw.max(0)) / ADC_FULL_SCALE).min(1.0)
}
