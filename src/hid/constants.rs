//! HID class codes used on the wire
//!
//! Interface triplet values the class filter and boot detection compare
//! against, the class-specific descriptor types kept in the class
//! descriptor table, and the request and wValue codes of the class requests
//! the driver issues.

/// `bInterfaceClass` of every HID interface
pub const HID_CLASS: u8 = 0x03;

/// `bInterfaceSubClass` of a HID interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HidSubclass {
    /// Report protocol only
    None = 0x00,
    /// Supports the boot protocol
    Boot = 0x01,
}

/// `bInterfaceProtocol` of a boot-subclass interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HidProtocol {
    /// Not a boot device
    None = 0x00,
    /// Boot keyboard
    Keyboard = 0x01,
    /// Boot mouse
    Mouse = 0x02,
}

/// Class descriptor types listed in a HID descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HidDescriptorType {
    /// The HID descriptor itself
    Hid = 0x21,
    /// Report descriptor, fetched by report parsers
    Report = 0x22,
    /// Physical descriptor
    Physical = 0x23,
}

/// `bRequest` of the class requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HidRequest {
    /// GET_REPORT
    GetReport = 0x01,
    /// GET_IDLE
    GetIdle = 0x02,
    /// GET_PROTOCOL
    GetProtocol = 0x03,
    /// SET_REPORT
    SetReport = 0x09,
    /// SET_IDLE
    SetIdle = 0x0A,
    /// SET_PROTOCOL
    SetProtocol = 0x0B,
}

/// High byte of wValue in GET_REPORT and SET_REPORT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum HidReportType {
    /// Device to host data
    Input = 0x01,
    /// Host to device data, LEDs for keyboards
    Output = 0x02,
    /// Configuration data in either direction
    Feature = 0x03,
}

/// Protocol selected with SET_PROTOCOL
///
/// Devices come up in report protocol; boot protocol switches a boot
/// interface to its fixed report layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum HidProtocolMode {
    /// Fixed boot report layout
    Boot = 0x00,
    /// Layout given by the report descriptor
    Report = 0x01,
}

/// GET_PROTOCOL answers 0 for boot; any other byte is treated as report
/// protocol
impl From<u8> for HidProtocolMode {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Boot,
            _ => Self::Report,
        }
    }
}
