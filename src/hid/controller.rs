//! Report controller - composes input pages into one HID device.
//!
//! Pages are registered in order, then [`ReportController::initialize`]
//! concatenates their descriptor fragments inside the application
//! collection and sizes the report buffer:
//!
//! ```text
//! Descriptor: 05 01 09 <class> A1 01 | page 0 | page 1 | ... | C0
//! Report:     A1 | page 0 bytes | page 1 bytes | ...
//! ```
//!
//! Input tasks mutate pages through the controller, which raises a send
//! request toward the [`Transport`].  The transport later calls
//! [`ReportController::on_send_opportunity`], the only place where the
//! report buffer is written.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;

use crate::config::{DESCRIPTOR_CAPACITY, MAX_PAGES, MAX_REPORT_LEN, REPORT_MARKER};
use crate::error::{Error, TransportError};
use crate::hid::axes::AxisPair;
use crate::hid::buttons::ButtonBank;
use crate::hid::descriptor::{close_application, open_application, DescriptorBuilder, DeviceClass};
use crate::hid::page::InputPage;
use crate::hid::spinner::Spinner;

/// The HID link the controller publishes through (BLE HOGP on target,
/// a recorder in tests).
pub trait Transport {
    /// Register the device with the HID layer.
    fn initialize(
        &mut self,
        name: &str,
        descriptor: &[u8],
        class: DeviceClass,
    ) -> Result<(), TransportError>;

    /// Ask for a later call to `on_send_opportunity`.
    ///
    /// May be called from any context and must tolerate redundant calls.
    fn request_send_opportunity(&self);

    /// Transmit one complete report (marker byte included).
    ///
    /// Called with the report buffer locked; must not block.
    fn send_report(&self, report: &[u8]);
}

/// Handle to a page registered with a [`ReportController`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PageId(u8);

impl PageId {
    /// Registration order of the page.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// The single outstanding "send requested" flag.
///
/// Any number of raises before the transport consumes the request
/// collapse into one report.
#[derive(Default)]
pub struct SendRequest {
    pending: AtomicBool,
    raised: AtomicU32,
}

impl SendRequest {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            raised: AtomicU32::new(0),
        }
    }

    /// Raise the request.  Returns `true` if it was not already pending,
    /// i.e. the transport has to be told.
    pub fn raise(&self) -> bool {
        self.raised.fetch_add(1, Ordering::Relaxed);
        !self.pending.swap(true, Ordering::AcqRel)
    }

    /// Consume the request; returns whether one was pending.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Total raises so far, coalesced or not.
    pub fn raised(&self) -> u32 {
        self.raised.load(Ordering::Relaxed)
    }
}

pub struct ReportController<T, const D: usize = { DESCRIPTOR_CAPACITY }> {
    class: DeviceClass,
    transport: T,
    pages: Vec<InputPage, MAX_PAGES>,
    descriptor: Vec<u8, D>,
    report: Mutex<CriticalSectionRawMutex, RefCell<Vec<u8, MAX_REPORT_LEN>>>,
    report_len: usize,
    initialized: bool,
    send_request: SendRequest,
    reports_sent: AtomicU32,
}

impl<T: Transport> ReportController<T> {
    pub fn new(class: DeviceClass, transport: T) -> Self {
        Self::with_descriptor_capacity(class, transport)
    }
}

impl<T: Transport, const D: usize> ReportController<T, D> {
    /// Like [`ReportController::new`] with a descriptor buffer of `D` bytes.
    pub fn with_descriptor_capacity(class: DeviceClass, transport: T) -> Self {
        Self {
            class,
            transport,
            pages: Vec::new(),
            descriptor: Vec::new(),
            report: Mutex::new(RefCell::new(Vec::new())),
            report_len: 0,
            initialized: false,
            send_request: SendRequest::new(),
            reports_sent: AtomicU32::new(0),
        }
    }

    // ── Construction ────────────────────────────────────────────────

    /// Append a page.  Field order in the descriptor and in every report
    /// follows registration order.
    pub fn register_page(&mut self, page: impl Into<InputPage>) -> Result<PageId, Error> {
        if self.initialized {
            return Err(Error::AlreadyInitialized);
        }
        let id = PageId(self.pages.len() as u8);
        self.pages.push(page.into()).map_err(|_| Error::TooManyPages)?;
        Ok(id)
    }

    /// Build the descriptor, size the report and register with the transport.
    pub fn initialize(&mut self, name: &str) -> Result<(), Error> {
        if self.initialized {
            return Err(Error::AlreadyInitialized);
        }

        let mut out = DescriptorBuilder::<D>::new();
        open_application(&mut out, self.class)?;
        for page in &self.pages {
            page.emit_descriptor(&mut out)?;
        }
        close_application(&mut out)?;

        let width = 1 + self.pages.iter().map(InputPage::report_width).sum::<usize>();
        let mut sized: Vec<u8, MAX_REPORT_LEN> = Vec::new();
        sized.resize(width, 0).map_err(|_| {
            error!("report of {} bytes exceeds {}", width, MAX_REPORT_LEN);
            Error::ReportOverflow
        })?;
        sized[0] = REPORT_MARKER;

        self.transport
            .initialize(name, out.as_bytes(), self.class)
            .inspect_err(|e| error!("transport rejected device: {}", e))?;

        self.report.lock(|cell| *cell.borrow_mut() = sized);
        self.report_len = width;
        self.descriptor = out.into_bytes();
        self.initialized = true;

        info!(
            "controller ready: {} pages, descriptor {} bytes, report {} bytes",
            self.pages.len(),
            self.descriptor.len(),
            width
        );
        Ok(())
    }

    // ── Introspection ───────────────────────────────────────────────

    pub fn class(&self) -> DeviceClass {
        self.class
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The assembled descriptor (empty before `initialize`).
    pub fn descriptor(&self) -> &[u8] {
        &self.descriptor
    }

    /// Report length including the marker byte (0 before `initialize`).
    pub fn report_len(&self) -> usize {
        self.report_len
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn send_request(&self) -> &SendRequest {
        &self.send_request
    }

    /// Reports handed to the transport since boot.
    pub fn reports_sent(&self) -> u32 {
        self.reports_sent.load(Ordering::Relaxed)
    }

    pub fn page(&self, id: PageId) -> Result<&InputPage, Error> {
        self.pages.get(id.index()).ok_or(Error::UnknownPage)
    }

    pub fn buttons(&self, id: PageId) -> Result<&ButtonBank, Error> {
        self.page(id)?.as_buttons().ok_or(Error::PageKind)
    }

    pub fn axes(&self, id: PageId) -> Result<&AxisPair, Error> {
        self.page(id)?.as_axes().ok_or(Error::PageKind)
    }

    pub fn spinner(&self, id: PageId) -> Result<&Spinner, Error> {
        self.page(id)?.as_spinner().ok_or(Error::PageKind)
    }

    // ── Input side ──────────────────────────────────────────────────

    /// Raise the send request, telling the transport only on the first raise.
    pub fn request_send(&self) {
        if self.send_request.raise() {
            self.transport.request_send_opportunity();
        }
    }

    pub fn set_button(&self, page: PageId, id: u16, pressed: bool) -> Result<(), Error> {
        if self.buttons(page)?.set_button(id, pressed)? {
            self.request_send();
        }
        Ok(())
    }

    /// Button state as seen by the writer (includes an open transaction).
    pub fn button(&self, page: PageId, id: u16) -> Result<bool, Error> {
        self.buttons(page)?.button(id)
    }

    pub fn begin_transaction(&self, page: PageId) -> Result<(), Error> {
        self.buttons(page)?.begin_transaction();
        Ok(())
    }

    /// Close one transaction level; the outermost close requests one
    /// report if anything changed.
    pub fn end_transaction(&self, page: PageId) -> Result<(), Error> {
        if self.buttons(page)?.end_transaction() {
            self.request_send();
        }
        Ok(())
    }

    /// Run `f` inside a transaction on `page`.
    ///
    /// The transaction is closed even when `f` fails, so the writes made
    /// before the failure are still committed together.
    pub fn transaction<R>(
        &self,
        page: PageId,
        f: impl FnOnce(&ButtonBank) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let bank = self.buttons(page)?;
        bank.begin_transaction();
        let result = f(bank);
        if bank.end_transaction() {
            self.request_send();
        }
        result
    }

    pub fn move_axes(&self, page: PageId, x_pct: f32, y_pct: f32) -> Result<(), Error> {
        if self.axes(page)?.move_to(x_pct, y_pct) {
            self.request_send();
        }
        Ok(())
    }

    pub fn set_spinner_position(&self, page: PageId, position: f32) -> Result<(), Error> {
        if self.spinner(page)?.set_position(position) {
            self.request_send();
        }
        Ok(())
    }

    // ── Transport side ──────────────────────────────────────────────

    /// Serialize every page into the report and hand it to the transport.
    ///
    /// Returns the report length.  Changes made after the request is
    /// consumed raise a fresh request.
    pub fn on_send_opportunity(&self) -> Result<usize, Error> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        self.send_request.take();
        self.report.lock(|cell| {
            let mut report = cell.borrow_mut();
            let mut offset = 1;
            for page in &self.pages {
                let width = page.report_width();
                page.serialize_into(&mut report[offset..offset + width]);
                offset += width;
            }
            trace!("report {=[u8]:x}", report.as_slice());
            self.transport.send_report(&report);
        });
        self.reports_sent.fetch_add(1, Ordering::Relaxed);
        Ok(self.report_len)
    }
}
