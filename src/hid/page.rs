//! The closed set of input pages a controller can compose.
//!
//! Each page owns one slice of the device state and knows how to
//! describe it (descriptor fragment), how wide it is, and how to write
//! it into its slot of the report.

use crate::error::Error;
use crate::hid::axes::AxisPair;
use crate::hid::buttons::ButtonBank;
use crate::hid::descriptor::DescriptorBuilder;
use crate::hid::spinner::Spinner;

/// Discriminant of an [`InputPage`], for logging and error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PageKind {
    Buttons,
    Axes,
    Spinner,
}

pub enum InputPage {
    Buttons(ButtonBank),
    Axes(AxisPair),
    Spinner(Spinner),
}

impl InputPage {
    pub fn kind(&self) -> PageKind {
        match self {
            InputPage::Buttons(_) => PageKind::Buttons,
            InputPage::Axes(_) => PageKind::Axes,
            InputPage::Spinner(_) => PageKind::Spinner,
        }
    }

    /// Append this page's descriptor fragment; returns the bytes written.
    pub fn emit_descriptor<const N: usize>(
        &self,
        out: &mut DescriptorBuilder<N>,
    ) -> Result<usize, Error> {
        match self {
            InputPage::Buttons(page) => page.emit_descriptor(out),
            InputPage::Axes(page) => page.emit_descriptor(out),
            InputPage::Spinner(page) => page.emit_descriptor(out),
        }
    }

    /// Fixed number of report bytes this page occupies.
    pub fn report_width(&self) -> usize {
        match self {
            InputPage::Buttons(page) => page.report_width(),
            InputPage::Axes(page) => page.report_width(),
            InputPage::Spinner(page) => page.report_width(),
        }
    }

    /// Write the current state into `buf`; returns the bytes written.
    pub fn serialize_into(&self, buf: &mut [u8]) -> usize {
        match self {
            InputPage::Buttons(page) => page.serialize_into(buf),
            InputPage::Axes(page) => page.serialize_into(buf),
            InputPage::Spinner(page) => page.serialize_into(buf),
        }
    }

    pub fn as_buttons(&self) -> Option<&ButtonBank> {
        match self {
            InputPage::Buttons(page) => Some(page),
            _ => None,
        }
    }

    pub fn as_axes(&self) -> Option<&AxisPair> {
        match self {
            InputPage::Axes(page) => Some(page),
            _ => None,
        }
    }

    pub fn as_spinner(&self) -> Option<&Spinner> {
        match self {
            InputPage::Spinner(page) => Some(page),
            _ => None,
        }
    }
}

impl From<ButtonBank> for InputPage {
    fn from(page: ButtonBank) -> Self {
        InputPage::Buttons(page)
    }
}

impl From<AxisPair> for InputPage {
    fn from(page: AxisPair) -> Self {
        InputPage::Axes(page)
    }
}

impl From<Spinner> for InputPage {
    fn from(page: Spinner) -> Self {
        InputPage::Spinner(page)
    }
}
