//! HID-over-GATT service (0x1812) registered with the SoftDevice.

use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{Attribute, Metadata, Properties};
use nrf_softdevice::ble::gatt_server::{self, RegisterError, WriteOp};
use nrf_softdevice::ble::{Connection, SecurityMode, Uuid};
use nrf_softdevice::Softdevice;

use defmt::{debug, info};

const HID_SERVICE: Uuid = Uuid::new_16(0x1812);
const HID_INFORMATION: Uuid = Uuid::new_16(0x2A4A);
const REPORT_MAP: Uuid = Uuid::new_16(0x2A4B);
const HID_CONTROL_POINT: Uuid = Uuid::new_16(0x2A4C);
const REPORT: Uuid = Uuid::new_16(0x2A4D);
const PROTOCOL_MODE: Uuid = Uuid::new_16(0x2A4E);
const REPORT_REFERENCE: Uuid = Uuid::new_16(0x2908);

/// bcdHID 1.11, country 0, flags: remote wake + normally connectable.
const HID_INFO: [u8; 4] = [0x11, 0x01, 0x00, 0x03];

/// Report id 0 (no ids in the map), type Input.
const INPUT_REPORT_REF: [u8; 2] = [0x00, 0x01];

const PROTOCOL_MODE_REPORT: u8 = 0x01;

const CONTROL_SUSPEND: u8 = 0x00;
const CONTROL_EXIT_SUSPEND: u8 = 0x01;

/// Attribute handles of the registered service.
pub struct HidService {
    pub input_report: u16,
    input_cccd: u16,
    control_point: u16,
    protocol_mode: u16,
}

impl HidService {
    /// Register the service with `report_map` as its descriptor.
    ///
    /// `report_len` is the size of the notified payload (the report
    /// without its marker byte).
    pub fn new(
        sd: &mut Softdevice,
        report_map: &[u8],
        report_len: usize,
    ) -> Result<Self, RegisterError> {
        let mut sb = ServiceBuilder::new(sd, HID_SERVICE)?;

        sb.add_characteristic(
            HID_INFORMATION,
            Attribute::new(&HID_INFO).security(SecurityMode::JustWorks),
            Metadata::new(Properties::new().read()),
        )?
        .build();

        sb.add_characteristic(
            REPORT_MAP,
            Attribute::new(report_map).security(SecurityMode::JustWorks),
            Metadata::new(Properties::new().read()),
        )?
        .build();

        let control_point = sb
            .add_characteristic(
                HID_CONTROL_POINT,
                Attribute::new(&[0u8]).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().write_without_response()),
            )?
            .build();

        let protocol_mode = sb
            .add_characteristic(
                PROTOCOL_MODE,
                Attribute::new(&[PROTOCOL_MODE_REPORT]).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().read().write_without_response()),
            )?
            .build();

        let empty = [0u8; padlink::config::MAX_REPORT_LEN];
        let mut input = sb.add_characteristic(
            REPORT,
            Attribute::new(&empty[..report_len]).security(SecurityMode::JustWorks),
            Metadata::new(Properties::new().read().notify()),
        )?;
        input.add_descriptor(
            REPORT_REFERENCE,
            Attribute::new(&INPUT_REPORT_REF).security(SecurityMode::JustWorks),
        )?;
        let input = input.build();

        let _service = sb.build();
        info!(
            "HID service registered ({} byte report map, {} byte reports)",
            report_map.len(),
            report_len
        );

        Ok(Self {
            input_report: input.value_handle,
            input_cccd: input.cccd_handle,
            control_point: control_point.value_handle,
            protocol_mode: protocol_mode.value_handle,
        })
    }
}

impl gatt_server::Server for HidService {
    type Event = ();

    fn on_write(
        &self,
        _conn: &Connection,
        handle: u16,
        _op: WriteOp,
        _offset: usize,
        data: &[u8],
    ) -> Option<Self::Event> {
        if handle == self.input_cccd {
            debug!("input notifications: {=[u8]:x}", data);
        } else if handle == self.control_point {
            match data.first() {
                Some(&CONTROL_SUSPEND) => info!("host suspended"),
                Some(&CONTROL_EXIT_SUSPEND) => info!("host resumed"),
                _ => {}
            }
        } else if handle == self.protocol_mode {
            // Only report protocol exists for these devices.
            debug!("protocol mode write ignored: {=[u8]:x}", data);
        }
        None
    }
}
