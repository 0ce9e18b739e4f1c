//! USB transfer vocabulary
//!
//! Setup packets for the standard and HID class control requests the driver
//! issues, plus the transfer type and direction enums used while classifying
//! endpoints.

use crate::hid::constants::{HidReportType, HidRequest};

/// USB transfer types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferType {
    /// Control transfer
    Control,
    /// Isochronous transfer
    Isochronous,
    /// Bulk transfer
    Bulk,
    /// Interrupt transfer
    Interrupt,
}

impl TransferType {
    /// Decode from endpoint `bmAttributes`
    pub const fn from_attributes(attributes: u8) -> Self {
        match attributes & 0x03 {
            0 => Self::Control,
            1 => Self::Isochronous,
            2 => Self::Bulk,
            _ => Self::Interrupt,
        }
    }
}

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Device to host
    In,
    /// Host to device
    Out,
}

impl Direction {
    /// Decode from the direction bit of an endpoint address
    pub const fn from_endpoint_address(address: u8) -> Self {
        if address & 0x80 != 0 {
            Self::In
        } else {
            Self::Out
        }
    }
}

/// Standard request codes
const GET_DESCRIPTOR: u8 = 0x06;
const SET_ADDRESS: u8 = 0x05;
const SET_CONFIGURATION: u8 = 0x09;

/// Descriptor type for GET_DESCRIPTOR(DEVICE)
pub const DESCRIPTOR_DEVICE: u8 = 0x01;
/// Descriptor type for GET_DESCRIPTOR(CONFIGURATION)
pub const DESCRIPTOR_CONFIGURATION: u8 = 0x02;

/// USB Setup packet (USB 2.0 section 9.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetupPacket {
    /// Direction, type and recipient
    pub request_type: u8,
    /// Request code
    pub request: u8,
    /// Request-specific value
    pub value: u16,
    /// Request-specific index (interface number for HID requests)
    pub index: u16,
    /// Data stage length
    pub length: u16,
}

impl SetupPacket {
    /// Host-to-device, class, interface
    const CLASS_INTERFACE_OUT: u8 = 0x21;
    /// Device-to-host, class, interface
    const CLASS_INTERFACE_IN: u8 = 0xA1;

    /// GET_DESCRIPTOR request
    pub const fn get_descriptor(desc_type: u8, desc_index: u8, length: u16) -> Self {
        Self {
            request_type: 0x80,
            request: GET_DESCRIPTOR,
            value: ((desc_type as u16) << 8) | (desc_index as u16),
            index: 0,
            length,
        }
    }

    /// SET_ADDRESS request
    pub const fn set_address(address: u8) -> Self {
        Self {
            request_type: 0x00,
            request: SET_ADDRESS,
            value: address as u16,
            index: 0,
            length: 0,
        }
    }

    /// SET_CONFIGURATION request
    pub const fn set_configuration(config: u8) -> Self {
        Self {
            request_type: 0x00,
            request: SET_CONFIGURATION,
            value: config as u16,
            index: 0,
            length: 0,
        }
    }

    /// HID SET_IDLE; `duration` in 4 ms units, 0 = only report on change
    pub const fn set_idle(interface: u8, duration: u8, report_id: u8) -> Self {
        Self {
            request_type: Self::CLASS_INTERFACE_OUT,
            request: HidRequest::SetIdle as u8,
            value: ((duration as u16) << 8) | (report_id as u16),
            index: interface as u16,
            length: 0,
        }
    }

    /// HID GET_IDLE
    pub const fn get_idle(interface: u8, report_id: u8) -> Self {
        Self {
            request_type: Self::CLASS_INTERFACE_IN,
            request: HidRequest::GetIdle as u8,
            value: report_id as u16,
            index: interface as u16,
            length: 1,
        }
    }

    /// HID SET_PROTOCOL (0 = boot, 1 = report)
    pub const fn set_protocol(interface: u8, protocol: u8) -> Self {
        Self {
            request_type: Self::CLASS_INTERFACE_OUT,
            request: HidRequest::SetProtocol as u8,
            value: protocol as u16,
            index: interface as u16,
            length: 0,
        }
    }

    /// HID GET_PROTOCOL
    pub const fn get_protocol(interface: u8) -> Self {
        Self {
            request_type: Self::CLASS_INTERFACE_IN,
            request: HidRequest::GetProtocol as u8,
            value: 0,
            index: interface as u16,
            length: 1,
        }
    }

    /// HID SET_REPORT over the control pipe
    pub const fn set_report(
        interface: u8,
        report_type: HidReportType,
        report_id: u8,
        length: u16,
    ) -> Self {
        Self {
            request_type: Self::CLASS_INTERFACE_OUT,
            request: HidRequest::SetReport as u8,
            value: ((report_type as u16) << 8) | (report_id as u16),
            index: interface as u16,
            length,
        }
    }

    /// HID GET_REPORT over the control pipe
    pub const fn get_report(
        interface: u8,
        report_type: HidReportType,
        report_id: u8,
        length: u16,
    ) -> Self {
        Self {
            request_type: Self::CLASS_INTERFACE_IN,
            request: HidRequest::GetReport as u8,
            value: ((report_type as u16) << 8) | (report_id as u16),
            index: interface as u16,
            length,
        }
    }

    /// Check if this is an IN transfer
    pub const fn is_in(&self) -> bool {
        (self.request_type & 0x80) != 0
    }

    /// Wire representation (little-endian fields)
    pub fn to_bytes(&self) -> [u8; 8] {
        let value = self.value.to_le_bytes();
        let index = self.index.to_le_bytes();
        let length = self.length.to_le_bytes();
        [
            self.request_type,
            self.request,
            value[0],
            value[1],
            index[0],
            index[1],
            length[0],
            length[1],
        ]
    }
}
