//! Unified error type for padlink.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.

/// Top-level error type used across the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Configuration (fatal at initialisation)
    /// The assembled report descriptor does not fit its fixed buffer.
    DescriptorOverflow,

    /// The pages' combined report width exceeds the report buffer.
    ReportOverflow,

    /// More pages were registered than the controller can hold.
    TooManyPages,

    /// A button bank was configured with `first > last` or too many buttons.
    InvalidButtonRange { first: u16, last: u16 },

    /// `register_page` or `initialize` was called after initialisation.
    AlreadyInitialized,

    // Runtime addressing
    /// A button id outside the bank's configured range was addressed.
    ButtonOutOfRange { id: u16, first: u16, last: u16 },

    /// The page handle names a page of a different kind.
    PageKind,

    /// The page handle does not belong to this controller.
    UnknownPage,

    /// A report was requested before `initialize`.
    NotInitialized,

    // Transport
    /// The transport refused the device registration.
    Transport(TransportError),
}

/// Subset of transport errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Registration was rejected by the HID layer.
    Rejected,
    /// The descriptor is larger than the transport can publish.
    DescriptorTooLarge,
    /// The device name is longer than the transport can advertise.
    NameTooLong,
}

// Convenience conversions

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}
