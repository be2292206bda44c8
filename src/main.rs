//! padlink - Bluetooth LE HID game controller firmware for the nRF52840.
//!
//! Builds the report controller for the configured profile, publishes it
//! through a HID-over-GATT peripheral on the S140 SoftDevice and feeds it
//! from GPIO buttons, the SAADC stick or the AS5600 spinner.
//!
//! ```text
//!  buttons ─┐
//!  stick   ─┼──> ReportController ──> BleTransport ──> HOGP notify
//!  spinner ─┘
//! ```

#![no_std]
#![no_main]

mod ble;
mod power;
mod tasks;

use defmt::{info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{AnyPin, Input, Level, Output, OutputDrive, Pin as _, Pull};
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::peripherals::{P0_28, P0_29, SAADC};
use embassy_nrf::{bind_interrupts, peripherals, saadc, twim};
use nrf_softdevice::{raw, Softdevice};
use static_cell::StaticCell;

use padlink::advertising::AdvertisingData;
use padlink::config::{self, AS5600_ADDRESS, DEFAULT_DEBOUNCE};
use padlink::input::dpad;
use padlink::input::DebouncedInput;
use padlink::profile::Profile;
use padlink::sensor::As5600;

use ble::hid_service::HidService;
use ble::transport::BleTransport;
use ble::Controller;

use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(struct Irqs {
    SAADC => saadc::InterruptHandler;
    TWISPI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

static CONTROLLER: StaticCell<Controller> = StaticCell::new();
static SERVER: StaticCell<HidService> = StaticCell::new();
static ADVERTISING: StaticCell<AdvertisingData> = StaticCell::new();

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn ble_task(
    sd: &'static Softdevice,
    server: &'static HidService,
    controller: &'static Controller,
    adv: &'static AdvertisingData,
) -> ! {
    ble::peripheral_task(sd, server, controller, adv).await
}

#[embassy_executor::task]
async fn button_task(controller: &'static Controller, buttons: tasks::Buttons) -> ! {
    tasks::button_loop(controller, buttons).await
}

#[embassy_executor::task]
async fn thumbstick_task(
    controller: &'static Controller,
    page: padlink::PageId,
    stick: tasks::Stick,
) -> ! {
    tasks::thumbstick_loop(controller, page, stick).await
}

#[embassy_executor::task]
async fn axes_task(controller: &'static Controller, page: padlink::PageId, stick: tasks::Stick) -> ! {
    tasks::axes_loop(controller, page, stick).await
}

#[embassy_executor::task]
async fn spinner_task(
    controller: &'static Controller,
    page: padlink::PageId,
    sensor: tasks::Sensor,
) -> ! {
    tasks::spinner_loop(controller, page, sensor).await
}

#[embassy_executor::task]
async fn power_task(
    controller: &'static Controller,
    power_led: Output<'static>,
    connected_led: Output<'static>,
) -> ! {
    power::power_loop(controller, power_led, connected_led).await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let profile = config::DEVICE_PROFILE;
    let name = profile.device_name();
    info!("padlink starting: {} ({})", name, profile);

    // SoftDevice reserves priorities 0, 1 and 4.
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(nrf_config);
    interrupt::SAADC.set_priority(Priority::P3);
    interrupt::TWISPI0.set_priority(Priority::P3);

    let power_led = Output::new(p.P0_14, Level::Low, OutputDrive::Standard);
    let connected_led = Output::new(p.P0_13, Level::Low, OutputDrive::Standard);

    let (mut controller, layout) = unwrap!(profile.build(BleTransport::new()));
    unwrap!(controller.initialize(name));
    let adv = ADVERTISING.init(unwrap!(AdvertisingData::hid(
        name,
        profile.class().appearance()
    )));

    let sd = Softdevice::enable(&softdevice_config(name));
    // The notified payload has no marker byte.
    let server = SERVER.init(unwrap!(HidService::new(
        sd,
        controller.descriptor(),
        controller.report_len() - 1
    )));
    let sd: &'static Softdevice = sd;
    unwrap!(spawner.spawn(softdevice_task(sd)));

    let controller: &'static Controller = CONTROLLER.init(controller);

    let bank = unwrap!(controller.buttons(layout.buttons));
    let wiring: [(u16, AnyPin); 11] = [
        (1, p.P0_02.degrade()),
        (2, p.P0_03.degrade()),
        (3, p.P0_04.degrade()),
        (4, p.P0_05.degrade()),
        (5, p.P0_06.degrade()),
        (6, p.P0_07.degrade()),
        (7, p.P0_08.degrade()),
        (8, p.P0_11.degrade()),
        (9, p.P0_12.degrade()),
        (10, p.P0_24.degrade()),
        (12, p.P0_25.degrade()),
    ];
    let mut buttons = tasks::Buttons::new();
    for (id, pin) in wiring {
        // The thumbstick drives the direction buttons itself.
        let from_stick = profile == Profile::Thumbstick && id <= dpad::RIGHT_BUTTON;
        if from_stick || !bank.contains(id) {
            continue;
        }
        let mut input = DebouncedInput::active_low(Input::new(pin, Pull::Up), DEFAULT_DEBOUNCE);
        unwrap!(input.bind(controller, layout.buttons, id));
        if buttons.push(input).is_err() {
            warn!("button {} not polled: input table full", id);
        }
    }
    unwrap!(spawner.spawn(button_task(controller, buttons)));

    match profile {
        Profile::Thumbstick => {
            let stick = stick(p.SAADC, p.P0_29, p.P0_28).await;
            unwrap!(spawner.spawn(thumbstick_task(controller, layout.buttons, stick)));
        }
        Profile::ArcadeStick => {
            let axes = unwrap!(layout.axes);
            let stick = stick(p.SAADC, p.P0_29, p.P0_28).await;
            unwrap!(spawner.spawn(axes_task(controller, axes, stick)));
        }
        Profile::Spinner => {
            let page = unwrap!(layout.spinner);
            let i2c = twim::Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim::Config::default());
            let sensor = As5600::with_address(i2c, AS5600_ADDRESS);
            unwrap!(spawner.spawn(spinner_task(controller, page, sensor)));
        }
        Profile::Gamepad | Profile::Joystick => {}
    }

    unwrap!(spawner.spawn(power_task(controller, power_led, connected_led)));
    unwrap!(spawner.spawn(ble_task(sd, server, controller, adv)));
    info!("padlink ready");
}

/// Stick on AIN5 (X) / AIN4 (Y), full scale = VDD.
async fn stick(adc: SAADC, x: P0_29, y: P0_28) -> tasks::Stick {
    let mut config = saadc::Config::default();
    config.resolution = saadc::Resolution::_12BIT;

    let mut x = saadc::ChannelConfig::single_ended(x);
    x.gain = saadc::Gain::GAIN1_4;
    x.reference = saadc::Reference::VDD1_4;
    let mut y = saadc::ChannelConfig::single_ended(y);
    y.gain = saadc::Gain::GAIN1_4;
    y.reference = saadc::Reference::VDD1_4;

    let stick = saadc::Saadc::new(adc, Irqs, config, [x, y]);
    stick.calibrate().await;
    stick
}

fn softdevice_config(name: &'static str) -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 128 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: name.as_ptr() as _,
            current_len: name.len() as u16,
            max_len: name.len() as u16,
            write_perm: unsafe { core::mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}
