//! Power and status handling.
//!
//! - Power LED lit for as long as the firmware runs
//! - Connected LED follows the BLE link
//! - System reset after a period with no host and no reports
//!
//! nRF52840 note: there is no deep-sleep wake path here; a reset drops
//! the link and the device comes back up advertising.

use cortex_m::peripheral::SCB;
use defmt::info;
use embassy_futures::select::{select, Either};
use embassy_nrf::gpio::Output;
use embassy_time::{Duration, Instant, Ticker, Timer};

use padlink::config::{INACTIVITY_CHECK_SECS, INACTIVITY_RESET_SECS};
use padlink::power_logic::ActivityMonitor;

use crate::ble::{link_signal, Controller};

fn now_secs() -> u64 {
    Instant::now().as_secs()
}

/// Track link state and activity, resetting once idle for too long.
pub async fn power_loop(
    controller: &'static Controller,
    mut power_led: Output<'static>,
    mut connected_led: Output<'static>,
) -> ! {
    power_led.set_high();
    let mut monitor = ActivityMonitor::new(now_secs());
    let mut ticker = Ticker::every(Duration::from_secs(INACTIVITY_CHECK_SECS));
    connected_led.set_low();

    loop {
        match select(ticker.next(), link_signal().wait()).await {
            Either::First(()) => {
                let now = now_secs();
                monitor.observe_reports(now, controller.reports_sent());
                if monitor.should_reset(now, INACTIVITY_RESET_SECS) {
                    info!("Power: idle for {} s, resetting", monitor.idle_secs(now));
                    // Let the log drain.
                    Timer::after(Duration::from_millis(100)).await;
                    SCB::sys_reset();
                }
            }
            Either::Second(connected) => {
                info!("Power: connected={}", connected);
                if connected {
                    connected_led.set_high();
                    monitor.prod(now_secs());
                } else {
                    connected_led.set_low();
                }
            }
        }
    }
}
