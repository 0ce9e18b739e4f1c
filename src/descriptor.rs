//! Typed USB descriptors
//!
//! The transport walks raw configuration descriptors and hands these typed
//! views to a [`DescriptorVisitor`](crate::transport::DescriptorVisitor).
//! Only the device descriptor is decoded here, since enumeration reads it
//! directly into a byte buffer.

use bitflags::bitflags;

use crate::transfer::{Direction, TransferType};

/// USB device class codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DeviceClass {
    /// Class defined per interface
    PerInterface = 0x00,
    /// Audio device
    Audio = 0x01,
    /// Communications device
    Cdc = 0x02,
    /// Human interface device
    Hid = 0x03,
    /// Mass storage device
    MassStorage = 0x08,
    /// Hub
    Hub = 0x09,
    /// Vendor specific
    VendorSpecific = 0xFF,
}

impl DeviceClass {
    /// Create from u8 value
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x00 => Self::PerInterface,
            0x01 => Self::Audio,
            0x02 => Self::Cdc,
            0x03 => Self::Hid,
            0x08 => Self::MassStorage,
            0x09 => Self::Hub,
            _ => Self::VendorSpecific,
        }
    }
}

/// USB device descriptor (18 bytes on the wire)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceDescriptor {
    /// Descriptor length in bytes
    pub b_length: u8,
    /// Descriptor type (0x01)
    pub b_descriptor_type: u8,
    /// USB release number in BCD
    pub bcd_usb: u16,
    /// Device class code, 0 when defined per interface
    pub b_device_class: u8,
    /// Device subclass code
    pub b_device_sub_class: u8,
    /// Device protocol code
    pub b_device_protocol: u8,
    /// Max packet size of endpoint 0
    pub b_max_packet_size0: u8,
    /// Vendor ID
    pub id_vendor: u16,
    /// Product ID
    pub id_product: u16,
    /// Device release number in BCD
    pub bcd_device: u16,
    /// Manufacturer string index
    pub i_manufacturer: u8,
    /// Product string index
    pub i_product: u8,
    /// Serial number string index
    pub i_serial_number: u8,
    /// Number of configurations
    pub b_num_configurations: u8,
}

impl DeviceDescriptor {
    /// Wire size
    pub const SIZE: usize = 18;

    /// Decode from raw bytes
    ///
    /// Missing trailing bytes read as zero; enumeration works from the
    /// first 8 bytes until the full descriptor has been fetched.
    pub fn from_bytes(data: &[u8]) -> Self {
        let byte = |i: usize| data.get(i).copied().unwrap_or(0);
        let word = |i: usize| u16::from_le_bytes([byte(i), byte(i + 1)]);

        Self {
            b_length: byte(0),
            b_descriptor_type: byte(1),
            bcd_usb: word(2),
            b_device_class: byte(4),
            b_device_sub_class: byte(5),
            b_device_protocol: byte(6),
            b_max_packet_size0: byte(7),
            id_vendor: word(8),
            id_product: word(10),
            bcd_device: word(12),
            i_manufacturer: byte(14),
            i_product: byte(15),
            i_serial_number: byte(16),
            b_num_configurations: byte(17),
        }
    }

    /// Get device class
    pub fn device_class(&self) -> DeviceClass {
        DeviceClass::from_u8(self.b_device_class)
    }
}

/// Configuration descriptor header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigurationDescriptor {
    /// Length of the whole configuration block
    pub w_total_length: u16,
    /// Number of interfaces
    pub b_num_interfaces: u8,
    /// Value passed to SET_CONFIGURATION
    pub b_configuration_value: u8,
    /// Configuration string index
    pub i_configuration: u8,
    /// Self-powered and remote wakeup bits
    pub bm_attributes: u8,
    /// Max bus current in 2 mA units
    pub b_max_power: u8,
}

/// Interface descriptor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterfaceDescriptor {
    /// Interface number
    pub b_interface_number: u8,
    /// Alternate setting
    pub b_alternate_setting: u8,
    /// Endpoints besides endpoint 0
    pub b_num_endpoints: u8,
    /// Interface class (0x03 for HID)
    pub b_interface_class: u8,
    /// Interface subclass (0x01 boot)
    pub b_interface_sub_class: u8,
    /// Boot protocol (1 keyboard, 2 mouse)
    pub b_interface_protocol: u8,
    /// Interface string index
    pub i_interface: u8,
}

/// Endpoint descriptor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndpointDescriptor {
    /// Endpoint address (includes direction bit)
    pub b_endpoint_address: u8,
    /// Transfer type in bits 0..1
    pub bm_attributes: u8,
    /// Max packet size
    pub w_max_packet_size: u16,
    /// Polling interval (frames) for interrupt endpoints
    pub b_interval: u8,
}

impl EndpointDescriptor {
    /// Get endpoint number (0-15)
    pub fn number(&self) -> u8 {
        self.b_endpoint_address & 0x0F
    }

    /// Get transfer direction
    pub fn direction(&self) -> Direction {
        Direction::from_endpoint_address(self.b_endpoint_address)
    }

    /// Get transfer type
    pub fn transfer_type(&self) -> TransferType {
        TransferType::from_attributes(self.bm_attributes)
    }
}

/// One entry of a HID descriptor's class-descriptor list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidClassDescriptor {
    /// Descriptor type (0x22 report, 0x23 physical)
    pub b_descriptor_type: u8,
    /// Length of that class descriptor
    pub w_descriptor_length: u16,
}

/// HID descriptor (type 0x21)
///
/// The transport decodes the variable-length class-descriptor list; entries
/// past `b_num_descriptors` are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidDescriptor {
    /// HID release number in BCD
    pub bcd_hid: u16,
    /// Country code of localized hardware, 0 if none
    pub b_country_code: u8,
    /// Number of class descriptors that follow
    pub b_num_descriptors: u8,
    /// Class descriptor list
    pub descriptors: [HidClassDescriptor; crate::hid::MAX_HID_CLASS_DESCRIPTORS],
}

impl HidDescriptor {
    /// Class descriptors actually present
    pub fn class_descriptors(&self) -> &[HidClassDescriptor] {
        let n = (self.b_num_descriptors as usize).min(self.descriptors.len());
        &self.descriptors[..n]
    }
}

bitflags! {
    /// Interface fields a [`ClassFilter`] compares
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClassMask: u8 {
        /// Compare `bInterfaceClass`
        const CLASS = 0x01;
        /// Compare `bInterfaceSubClass`
        const SUBCLASS = 0x02;
        /// Compare `bInterfaceProtocol`
        const PROTOCOL = 0x04;
    }
}

/// Interface class/subclass/protocol filter applied during the descriptor walk
///
/// # Example
///
/// ```
/// use usbh_hid_composite::descriptor::{ClassFilter, ClassMask};
///
/// // Boot keyboards only
/// let filter = ClassFilter::new(0x03, 0x01, 0x01, ClassMask::all());
/// assert!(filter.matches(0x03, 0x01, 0x01));
/// assert!(!filter.matches(0x03, 0x01, 0x02));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassFilter {
    /// Expected interface class
    pub class: u8,
    /// Expected interface subclass
    pub subclass: u8,
    /// Expected interface protocol
    pub protocol: u8,
    /// Which of the three fields are compared
    pub mask: ClassMask,
}

impl ClassFilter {
    /// Create a filter
    pub const fn new(class: u8, subclass: u8, protocol: u8, mask: ClassMask) -> Self {
        Self {
            class,
            subclass,
            protocol,
            mask,
        }
    }

    /// Any interface of the HID class
    pub const fn hid() -> Self {
        Self::new(crate::hid::constants::HID_CLASS, 0, 0, ClassMask::CLASS)
    }

    /// Check interface fields against this filter
    pub fn matches(&self, class: u8, subclass: u8, protocol: u8) -> bool {
        (!self.mask.contains(ClassMask::CLASS) || class == self.class)
            && (!self.mask.contains(ClassMask::SUBCLASS) || subclass == self.subclass)
            && (!self.mask.contains(ClassMask::PROTOCOL) || protocol == self.protocol)
    }

    /// Check an interface descriptor against this filter
    pub fn matches_interface(&self, iface: &InterfaceDescriptor) -> bool {
        self.matches(
            iface.b_interface_class,
            iface.b_interface_sub_class,
            iface.b_interface_protocol,
        )
    }
}

impl Default for ClassFilter {
    fn default() -> Self {
        Self::hid()
    }
}
