//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **HID service** - HID-over-GATT (HOGP) attributes publishing the
//!    controller's report map and input report.
//! 2. **Transport** - the controller's [`padlink::Transport`], staging
//!    reports for notification.
//! 3. **Connection loop** - advertises, serves one host at a time and
//!    pushes reports whenever the controller asks to send.

pub mod hid_service;
pub mod security;
pub mod transport;

use defmt::{debug, info, warn};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use nrf_softdevice::ble::{gatt_server, peripheral, Connection};
use nrf_softdevice::{raw, Softdevice};

use padlink::advertising::AdvertisingData;
use padlink::config;
use padlink::ReportController;

use self::hid_service::HidService;
use self::security::bonder;
use self::transport::{outbox, send_opportunity, BleTransport};

pub type Controller = ReportController<BleTransport>;

/// Link state changes (`true` = host connected).
static LINK: Signal<CriticalSectionRawMutex, bool> = Signal::new();

pub fn link_signal() -> &'static Signal<CriticalSectionRawMutex, bool> {
    &LINK
}

/// Advertise, serve a host until it disconnects, repeat.
pub async fn peripheral_task(
    sd: &'static Softdevice,
    server: &'static HidService,
    controller: &'static Controller,
    adv: &'static AdvertisingData,
) -> ! {
    let adv_config = peripheral::Config {
        interval: config::BLE_ADV_INTERVAL,
        ..Default::default()
    };

    loop {
        let advertisement = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &adv.adv,
            scan_data: &adv.scan_response,
        };
        let conn = match peripheral::advertise_pairable(sd, advertisement, &adv_config, bonder())
            .await
        {
            Ok(conn) => conn,
            Err(e) => {
                warn!("advertising failed: {}", e);
                Timer::after(Duration::from_secs(1)).await;
                continue;
            }
        };

        info!("host connected (bonded: {})", bonder().is_bonded(&conn));
        LINK.signal(true);

        if conn
            .set_conn_params(raw::ble_gap_conn_params_t {
                min_conn_interval: config::BLE_CONN_INTERVAL_MIN,
                max_conn_interval: config::BLE_CONN_INTERVAL_MAX,
                slave_latency: config::BLE_SLAVE_LATENCY,
                conn_sup_timeout: config::BLE_SUP_TIMEOUT,
            })
            .is_err()
        {
            warn!("connection parameter update rejected");
        }

        let served = select(
            gatt_server::run(&conn, server, |_| {}),
            notify_loop(sd, &conn, server, controller),
        )
        .await;
        if let Either::First(_) = served {
            info!("host disconnected");
        }
        LINK.signal(false);
    }
}

/// Push the current state, then one report per send opportunity.
async fn notify_loop(
    sd: &Softdevice,
    conn: &Connection,
    server: &HidService,
    controller: &Controller,
) -> ! {
    // A fresh host has seen nothing; a stale opportunity is covered by this.
    send_opportunity().reset();
    push(sd, conn, server, controller);

    loop {
        send_opportunity().wait().await;
        push(sd, conn, server, controller);
    }
}

fn push(sd: &Softdevice, conn: &Connection, server: &HidService, controller: &Controller) {
    if let Err(e) = controller.on_send_opportunity() {
        warn!("report not built: {}", e);
        return;
    }
    let Some(report) = outbox().try_take() else {
        return;
    };
    if gatt_server::set_value(sd, server.input_report, &report).is_err() {
        warn!("input report value not stored");
    }
    // Fails until the host enables notifications; the value above still
    // answers reads.
    if let Err(e) = gatt_server::notify_value(conn, server.input_report, &report) {
        debug!("notify skipped: {}", e);
    }
}

