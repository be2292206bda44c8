//! HID report composition: descriptor assembly, input pages and the
//! controller that ties them to a transport.

pub mod axes;
pub mod buttons;
pub mod controller;
pub mod descriptor;
pub mod page;
pub mod spinner;


pub use axes::AxisPair;
pub use buttons::ButtonBank;
pub use controller::{PageId, ReportController, SendRequest, Transport};
pub use descriptor::{DescriptorBuilder, DeviceClass};
pub use page::{InputPage, PageKind};
pub use spinner::{RemainderPolicy, Spinner};
