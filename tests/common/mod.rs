//! Shared test utilities for the HID composite driver tests
//!
//! Descriptor builders, a scripted transport, a manual clock and recording
//! parsers/hooks used across the integration tests.

#![allow(dead_code)]

pub mod mock_transport;

use std::cell::{Cell, RefCell};
use std::vec::Vec;

use usbh_hid_composite::descriptor::{
    ConfigurationDescriptor, EndpointDescriptor, HidClassDescriptor, HidDescriptor,
    InterfaceDescriptor,
};
use usbh_hid_composite::hid::{
    DeviceIdentity, HidHooks, HidSubclass, ReportContext, ReportParser, HID_CLASS,
    MAX_HID_CLASS_DESCRIPTORS,
};
use usbh_hid_composite::Clock;

pub use mock_transport::{Descriptor, MockTransport, HeaderReadRecord};

pub const VENDOR_ID: u16 = 0x046D;
pub const PRODUCT_ID: u16 = 0xC52B;

const ATTR_BULK: u8 = 0x02;
const ATTR_INTERRUPT: u8 = 0x03;

/// HID composite device descriptor (Logitech Unifying receiver ids)
pub fn create_hid_device_descriptor(num_configurations: u8) -> [u8; 18] {
    [
        0x12,       // bLength
        0x01,       // bDescriptorType (DEVICE)
        0x00, 0x02, // bcdUSB (2.0)
        0x00,       // bDeviceClass (defined at interface level)
        0x00,       // bDeviceSubClass
        0x00,       // bDeviceProtocol
        0x40,       // bMaxPacketSize0 (64 bytes)
        0x6D, 0x04, // idVendor (0x046D)
        0x2B, 0xC5, // idProduct (0xC52B)
        0x10, 0x12, // bcdDevice
        0x01,       // iManufacturer
        0x02,       // iProduct
        0x00,       // iSerialNumber
        num_configurations,
    ]
}

pub fn configuration(value: u8, num_interfaces: u8) -> Descriptor {
    Descriptor::Configuration(ConfigurationDescriptor {
        w_total_length: 0,
        b_num_interfaces: num_interfaces,
        b_configuration_value: value,
        i_configuration: 0,
        bm_attributes: 0xA0,
        b_max_power: 50,
    })
}

pub fn interface(number: u8, class: u8, protocol: u8, num_endpoints: u8) -> Descriptor {
    Descriptor::Interface(InterfaceDescriptor {
        b_interface_number: number,
        b_alternate_setting: 0,
        b_num_endpoints: num_endpoints,
        b_interface_class: class,
        b_interface_sub_class: if protocol != 0 {
            HidSubclass::Boot as u8
        } else {
            HidSubclass::None as u8
        },
        b_interface_protocol: protocol,
        i_interface: 0,
    })
}

pub fn hid_interface(number: u8, protocol: u8, num_endpoints: u8) -> Descriptor {
    interface(number, HID_CLASS, protocol, num_endpoints)
}

/// HID descriptor listing `(descriptor type, length)` class descriptors
pub fn hid_descriptor(class_descriptors: &[(u8, u16)]) -> Descriptor {
    let mut descriptors = [HidClassDescriptor::default(); MAX_HID_CLASS_DESCRIPTORS];
    for (slot, &(descriptor_type, length)) in descriptors.iter_mut().zip(class_descriptors) {
        *slot = HidClassDescriptor {
            b_descriptor_type: descriptor_type,
            w_descriptor_length: length,
        };
    }
    Descriptor::Hid(HidDescriptor {
        bcd_hid: 0x0111,
        b_country_code: 0,
        b_num_descriptors: class_descriptors.len() as u8,
        descriptors,
    })
}

fn endpoint(address: u8, attributes: u8, max_packet_size: u16, interval: u8) -> Descriptor {
    Descriptor::Endpoint(EndpointDescriptor {
        b_endpoint_address: address,
        bm_attributes: attributes,
        w_max_packet_size: max_packet_size,
        b_interval: interval,
    })
}

pub fn interrupt_in(number: u8, max_packet_size: u16, interval: u8) -> Descriptor {
    endpoint(0x80 | number, ATTR_INTERRUPT, max_packet_size, interval)
}

pub fn interrupt_out(number: u8, max_packet_size: u16, interval: u8) -> Descriptor {
    endpoint(number, ATTR_INTERRUPT, max_packet_size, interval)
}

pub fn bulk_in(number: u8, max_packet_size: u16) -> Descriptor {
    endpoint(0x80 | number, ATTR_BULK, max_packet_size, 0)
}

/// Boot keyboard on interface 0 (EP1 IN, 10 ms) and mouse on interface 1
/// (EP2 IN plus EP2 OUT, 4 ms)
pub fn keyboard_mouse_configuration() -> Vec<Descriptor> {
    vec![
        configuration(1, 2),
        hid_interface(0, 1, 1),
        hid_descriptor(&[(0x22, 63)]),
        interrupt_in(1, 8, 10),
        hid_interface(1, 2, 2),
        hid_descriptor(&[(0x22, 52)]),
        interrupt_in(2, 8, 4),
        interrupt_out(2, 8, 4),
    ]
}

pub fn keyboard_mouse_transport() -> MockTransport {
    MockTransport::new(create_hid_device_descriptor(1), vec![keyboard_mouse_configuration()])
}

/// Millisecond clock advanced by hand
pub struct ManualClock(Cell<u32>);

impl ManualClock {
    pub fn new(start: u32) -> Self {
        Self(Cell::new(start))
    }

    pub fn set(&self, now: u32) {
        self.0.set(now);
    }

    pub fn advance(&self, ms: u32) {
        self.0.set(self.0.get().wrapping_add(ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.0.get()
    }
}

/// One report as seen by a parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub ctx: ReportContext,
    pub has_report_id: bool,
    pub data: Vec<u8>,
}

/// Parser that keeps every report it is handed
#[derive(Default)]
pub struct RecordingParser {
    pub reports: RefCell<Vec<Received>>,
}

impl RecordingParser {
    pub fn count(&self) -> usize {
        self.reports.borrow().len()
    }

    pub fn last(&self) -> Option<Received> {
        self.reports.borrow().last().cloned()
    }
}

impl ReportParser for RecordingParser {
    fn parse(&self, ctx: &ReportContext, has_report_id: bool, data: &[u8]) {
        self.reports.borrow_mut().push(Received {
            ctx: *ctx,
            has_report_id,
            data: data.to_vec(),
        });
    }
}

/// Hooks that log every call and can veto interfaces by protocol
#[derive(Default)]
pub struct RecordingHooks {
    pub inits: Vec<DeviceIdentity>,
    pub raw_reports: Vec<(u8, Vec<u8>)>,
    pub rejected_protocol: Option<u8>,
}

impl HidHooks for RecordingHooks {
    fn on_init_successful(&mut self, device: &DeviceIdentity) {
        self.inits.push(*device);
    }

    fn select_interface(&mut self, _interface: u8, protocol: u8) -> bool {
        self.rejected_protocol != Some(protocol)
    }

    fn parse_hid_data(&mut self, endpoint: u8, _has_report_id: bool, data: &[u8]) {
        self.raw_reports.push((endpoint, data.to_vec()));
    }
}
