//! `Transport` implementation backed by the HID-over-GATT service.
//!
//! The controller calls `send_report` while holding its report lock, so
//! nothing here touches the radio.  Reports are staged in a [`Signal`]
//! and the connection task notifies them once the lock is released.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use heapless::{String, Vec};

use padlink::config::{DESCRIPTOR_CAPACITY, MAX_NAME_LEN, MAX_REPORT_LEN};
use padlink::{DeviceClass, Transport, TransportError};

/// Report payload as notified (marker byte stripped).
pub type Payload = Vec<u8, MAX_REPORT_LEN>;

static SEND_OPPORTUNITY: Signal<CriticalSectionRawMutex, ()> = Signal::new();
static OUTBOX: Signal<CriticalSectionRawMutex, Payload> = Signal::new();

/// Raised whenever the controller has state the host has not seen.
pub fn send_opportunity() -> &'static Signal<CriticalSectionRawMutex, ()> {
    &SEND_OPPORTUNITY
}

/// The most recent report handed over by the controller.
pub fn outbox() -> &'static Signal<CriticalSectionRawMutex, Payload> {
    &OUTBOX
}

pub struct BleTransport {
    name: String<MAX_NAME_LEN>,
    descriptor: Vec<u8, DESCRIPTOR_CAPACITY>,
    class: Option<DeviceClass>,
}

impl BleTransport {
    pub const fn new() -> Self {
        Self {
            name: String::new(),
            descriptor: Vec::new(),
            class: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &[u8] {
        &self.descriptor
    }

    pub fn class(&self) -> Option<DeviceClass> {
        self.class
    }
}

impl Transport for BleTransport {
    fn initialize(
        &mut self,
        name: &str,
        descriptor: &[u8],
        class: DeviceClass,
    ) -> Result<(), TransportError> {
        let name = String::try_from(name).map_err(|_| TransportError::NameTooLong)?;
        let descriptor =
            Vec::from_slice(descriptor).map_err(|_| TransportError::DescriptorTooLarge)?;
        self.name = name;
        self.descriptor = descriptor;
        self.class = Some(class);
        Ok(())
    }

    fn request_send_opportunity(&self) {
        SEND_OPPORTUNITY.signal(());
    }

    fn send_report(&self, report: &[u8]) {
        // Skip the marker byte; HOGP reports carry only the payload.
        let payload = report.get(1..).unwrap_or_default();
        match Vec::from_slice(payload) {
            Ok(staged) => OUTBOX.signal(staged),
            Err(()) => defmt::warn!("report of {} bytes dropped", report.len()),
        }
    }
}
