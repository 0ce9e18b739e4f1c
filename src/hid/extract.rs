//! Interface and endpoint extraction
//!
//! [`ConfigDescriptorParser`] sits between the transport's descriptor walk and
//! the driver: it tracks the current configuration and interface, drops
//! interfaces rejected by the [`ClassFilter`], and forwards each remaining
//! endpoint to an [`EndpointSink`]. [`HidComposite`] is the sink that fills
//! the interface and endpoint tables.

use crate::descriptor::{
    ClassFilter, ConfigurationDescriptor, EndpointDescriptor, HidDescriptor, InterfaceDescriptor,
};
use crate::perf::PollCounters;
use crate::transfer::{Direction, TransferType};
use crate::transport::DescriptorVisitor;

use super::tables::{EndpointInfo, EndpointRole, HidInterface};
use super::{HidComposite, HidHooks};

/// Receiver of filtered descriptor-walk results
pub trait EndpointSink {
    /// A new configuration descriptor starts
    fn configuration_start(&mut self, _conf: u8) {}

    /// HID class descriptor listed by an accepted interface's HID descriptor
    fn hid_class_descriptor(&mut self, _descriptor_type: u8, _length: u16) {}

    /// Endpoint of an accepted interface
    fn endpoint_extract(
        &mut self,
        conf: u8,
        interface: u8,
        alt_setting: u8,
        protocol: u8,
        ep: &EndpointDescriptor,
    );
}

/// Class-filtered descriptor visitor
pub struct ConfigDescriptorParser<'a, S: EndpointSink + ?Sized> {
    sink: &'a mut S,
    filter: ClassFilter,
    conf: u8,
    interface: Option<InterfaceDescriptor>,
}

impl<'a, S: EndpointSink + ?Sized> ConfigDescriptorParser<'a, S> {
    /// Forward endpoints of interfaces matching `filter` to `sink`
    pub fn new(sink: &'a mut S, filter: ClassFilter) -> Self {
        Self {
            sink,
            filter,
            conf: 0,
            interface: None,
        }
    }
}

impl<S: EndpointSink + ?Sized> DescriptorVisitor for ConfigDescriptorParser<'_, S> {
    fn configuration(&mut self, desc: &ConfigurationDescriptor) {
        self.conf = desc.b_configuration_value;
        self.interface = None;
        self.sink.configuration_start(self.conf);
    }

    fn interface(&mut self, desc: &InterfaceDescriptor) {
        self.interface = self.filter.matches_interface(desc).then_some(*desc);
    }

    fn hid(&mut self, desc: &HidDescriptor) {
        if self.interface.is_none() {
            return;
        }
        for class_desc in desc.class_descriptors() {
            self.sink
                .hid_class_descriptor(class_desc.b_descriptor_type, class_desc.w_descriptor_length);
        }
    }

    fn endpoint(&mut self, desc: &EndpointDescriptor) {
        if let Some(iface) = self.interface {
            self.sink.endpoint_extract(
                self.conf,
                iface.b_interface_number,
                iface.b_alternate_setting,
                iface.b_interface_protocol,
                desc,
            );
        }
    }
}

impl<'p, H: HidHooks, const IFACES: usize, const EPS: usize, const PARSERS: usize>
    HidComposite<'p, H, IFACES, EPS, PARSERS>
{
    /// Index of the interface with this identity
    pub fn find_interface(&self, interface: u8, alt_setting: u8, protocol: u8) -> Option<usize> {
        self.interfaces
            .iter()
            .position(|i| i.matches(interface, alt_setting, protocol))
    }
}

impl<'p, H: HidHooks, const IFACES: usize, const EPS: usize, const PARSERS: usize> EndpointSink
    for HidComposite<'p, H, IFACES, EPS, PARSERS>
{
    fn configuration_start(&mut self, _conf: u8) {
        // Class descriptor lengths describe the configuration walked last
        self.class_descriptors.clear();
    }

    fn hid_class_descriptor(&mut self, descriptor_type: u8, length: u16) {
        if !self.class_descriptors.insert(descriptor_type, length) {
            debug!(
                "HID class descriptor {:#x} ({} bytes) not recorded, table full",
                descriptor_type,
                length
            );
        }
    }

    fn endpoint_extract(
        &mut self,
        conf: u8,
        interface: u8,
        alt_setting: u8,
        protocol: u8,
        ep: &EndpointDescriptor,
    ) {
        self.conf_num = conf;

        let iface_index = match self.find_interface(interface, alt_setting, protocol) {
            Some(index) => index,
            None => {
                if self
                    .interfaces
                    .push(HidInterface::new(interface, alt_setting, protocol))
                    .is_err()
                {
                    PollCounters::bump(&self.counters.interfaces_dropped);
                    warn!(
                        "Not adding HID interface {}: already tracking {} interfaces",
                        interface,
                        self.interfaces.len()
                    );
                    return;
                }
                self.interfaces.len() - 1
            }
        };

        let mut role = match ep.transfer_type() {
            TransferType::Interrupt => match ep.direction() {
                Direction::In => Some(EndpointRole::InterruptIn),
                Direction::Out => Some(EndpointRole::InterruptOut),
            },
            _ => None,
        };

        if !self.hooks.select_interface(interface, protocol) {
            role = None;
        }

        let Some(role) = role else {
            return;
        };

        let slot = self.endpoint_count as usize;
        if slot >= EPS {
            PollCounters::bump(&self.counters.endpoints_dropped);
            warn!(
                "Not adding endpoint {:#x}: already tracking {} endpoints",
                ep.b_endpoint_address,
                self.endpoint_count
            );
            return;
        }

        self.endpoints[slot] = EndpointInfo::interrupt(ep.number(), ep.w_max_packet_size);
        self.interfaces[iface_index].bind(role, slot as u8);

        self.poll_interval = match self.config.poll_interval_override {
            Some(interval) => interval,
            None => self.poll_interval.max(ep.b_interval),
        };

        self.endpoint_count += 1;

        debug!(
            "Interface {} alt {} proto {}: {:?} endpoint {} in slot {}",
            interface,
            alt_setting,
            protocol,
            role,
            ep.number(),
            slot
        );
    }
}
