//! Scripted host stack for driving the HID driver without hardware
//!
//! [`MockTransport`] answers control requests from a canned device
//! descriptor, walks scripted configuration descriptors, serves interrupt IN
//! data from per-endpoint queues and records everything the driver sends.
//! A single enumeration step can be made to fail with [`MockTransport::fail_at`].

use std::collections::{HashMap, VecDeque};
use std::vec::Vec;

use usbh_hid_composite::descriptor::{
    ConfigurationDescriptor, EndpointDescriptor, HidDescriptor, InterfaceDescriptor,
};
use usbh_hid_composite::hid::EndpointInfo;
use usbh_hid_composite::transfer::{SetupPacket, DESCRIPTOR_DEVICE};
use usbh_hid_composite::transport::{
    AddressPool, DescriptorVisitor, StaticAddressPool, TransferResult, UsbTransport,
};
use usbh_hid_composite::{InitStage, UsbError};

const GET_DESCRIPTOR: u8 = 0x06;
const SET_ADDRESS: u8 = 0x05;
const SET_CONFIGURATION: u8 = 0x09;
const HID_SET_IDLE: u8 = 0x0A;
const STANDARD_DEVICE_OUT: u8 = 0x00;
const CLASS_INTERFACE_OUT: u8 = 0x21;

/// One descriptor of a scripted configuration, in wire order
#[derive(Debug, Clone, Copy)]
pub enum Descriptor {
    Configuration(ConfigurationDescriptor),
    Interface(InterfaceDescriptor),
    Hid(HidDescriptor),
    Endpoint(EndpointDescriptor),
}

/// Address-0 record as seen while the device descriptor header was read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderReadRecord {
    pub control: Option<EndpointInfo>,
    pub low_speed: bool,
    pub length: usize,
}

pub struct MockTransport {
    pub pool: StaticAddressPool<8>,
    pub device_descriptor: [u8; 18],
    pub configurations: Vec<Vec<Descriptor>>,
    /// Data stage returned by class GET requests
    pub control_in_data: Vec<u8>,

    pub setups: Vec<(u8, SetupPacket)>,
    pub control_out_data: Vec<Vec<u8>>,
    pub endpoint_tables: Vec<(u8, Vec<EndpointInfo>)>,
    pub config_requests: Vec<u8>,
    pub header_reads: Vec<HeaderReadRecord>,
    /// `(address, endpoint, requested length)` per interrupt IN attempt
    pub in_reads: Vec<(u8, u8, usize)>,
    pub out_writes: Vec<(u8, u8, Vec<u8>)>,

    in_responses: HashMap<u8, VecDeque<TransferResult<Vec<u8>>>>,
    out_error: Option<UsbError>,
    failure: Option<(InitStage, UsbError)>,
}

impl MockTransport {
    pub fn new(device_descriptor: [u8; 18], configurations: Vec<Vec<Descriptor>>) -> Self {
        Self {
            pool: StaticAddressPool::new(),
            device_descriptor,
            configurations,
            control_in_data: Vec::new(),
            setups: Vec::new(),
            control_out_data: Vec::new(),
            endpoint_tables: Vec::new(),
            config_requests: Vec::new(),
            header_reads: Vec::new(),
            in_reads: Vec::new(),
            out_writes: Vec::new(),
            in_responses: HashMap::new(),
            out_error: None,
            failure: None,
        }
    }

    /// Make the transport call behind `stage` fail with `error`
    pub fn fail_at(&mut self, stage: InitStage, error: UsbError) {
        self.failure = Some((stage, error));
    }

    pub fn clear_failure(&mut self) {
        self.failure = None;
    }

    /// Queue a report for the next read of interrupt IN `endpoint`
    pub fn queue_report(&mut self, endpoint: u8, data: &[u8]) {
        self.queue_result(endpoint, Ok(data.to_vec()));
    }

    /// Queue a failed read of interrupt IN `endpoint`
    pub fn queue_error(&mut self, endpoint: u8, error: UsbError) {
        self.queue_result(endpoint, Err(error));
    }

    fn queue_result(&mut self, endpoint: u8, result: TransferResult<Vec<u8>>) {
        self.in_responses.entry(endpoint).or_default().push_back(result);
    }

    pub fn fail_out_transfers(&mut self, error: UsbError) {
        self.out_error = Some(error);
    }

    /// Forget recorded traffic, keep scripts and pool state
    pub fn clear_log(&mut self) {
        self.setups.clear();
        self.control_out_data.clear();
        self.endpoint_tables.clear();
        self.config_requests.clear();
        self.header_reads.clear();
        self.in_reads.clear();
        self.out_writes.clear();
    }

    /// Setup requests issued, without addresses
    pub fn requests(&self) -> Vec<u8> {
        self.setups.iter().map(|(_, setup)| setup.request).collect()
    }

    /// Interface numbers SET_IDLE was sent to
    pub fn set_idle_interfaces(&self) -> Vec<u16> {
        self.setups
            .iter()
            .filter(|(_, s)| s.request_type == CLASS_INTERFACE_OUT && s.request == HID_SET_IDLE)
            .map(|(_, s)| s.index)
            .collect()
    }

    fn check(&self, stage: InitStage) -> TransferResult<()> {
        match self.failure {
            Some((failing, error)) if failing == stage => Err(error),
            _ => Ok(()),
        }
    }
}

impl UsbTransport for MockTransport {
    type Pool = StaticAddressPool<8>;

    fn address_pool(&mut self) -> &mut Self::Pool {
        &mut self.pool
    }

    fn control_in(
        &mut self,
        address: u8,
        _endpoint: u8,
        setup: &SetupPacket,
        data: &mut [u8],
    ) -> TransferResult<usize> {
        self.setups.push((address, *setup));

        let source = if setup.request == GET_DESCRIPTOR && (setup.value >> 8) as u8 == DESCRIPTOR_DEVICE {
            if address == 0 {
                let record = self.pool.device_mut(0).map(|r| (r.control, r.low_speed));
                if let Some((control, low_speed)) = record {
                    self.header_reads.push(HeaderReadRecord {
                        control,
                        low_speed,
                        length: data.len(),
                    });
                }
                self.check(InitStage::DeviceDescriptorHeader)?;
            } else {
                self.check(InitStage::DeviceDescriptor)?;
            }
            self.device_descriptor.to_vec()
        } else {
            self.control_in_data.clone()
        };

        let n = data.len().min(source.len());
        data[..n].copy_from_slice(&source[..n]);
        Ok(n)
    }

    fn control_out(
        &mut self,
        address: u8,
        _endpoint: u8,
        setup: &SetupPacket,
        data: &[u8],
    ) -> TransferResult<()> {
        self.setups.push((address, *setup));
        self.control_out_data.push(data.to_vec());

        match (setup.request_type, setup.request) {
            (STANDARD_DEVICE_OUT, SET_ADDRESS) => self.check(InitStage::SetAddress),
            (STANDARD_DEVICE_OUT, SET_CONFIGURATION) => self.check(InitStage::SetConfiguration),
            (CLASS_INTERFACE_OUT, HID_SET_IDLE) => self.check(InitStage::SetIdle),
            _ => Ok(()),
        }
    }

    fn get_config_descriptor(
        &mut self,
        _address: u8,
        _endpoint: u8,
        index: u8,
        visitor: &mut dyn DescriptorVisitor,
    ) -> TransferResult<()> {
        self.config_requests.push(index);
        self.check(InitStage::ConfigurationDescriptor)?;

        let Some(descriptors) = self.configurations.get(index as usize) else {
            return Err(UsbError::Stall);
        };
        for descriptor in descriptors {
            match descriptor {
                Descriptor::Configuration(d) => visitor.configuration(d),
                Descriptor::Interface(d) => visitor.interface(d),
                Descriptor::Hid(d) => visitor.hid(d),
                Descriptor::Endpoint(d) => visitor.endpoint(d),
            }
        }
        Ok(())
    }

    fn set_endpoint_table(
        &mut self,
        address: u8,
        endpoints: &[EndpointInfo],
    ) -> TransferResult<()> {
        self.endpoint_tables.push((address, endpoints.to_vec()));
        if endpoints.len() == 1 {
            self.check(InitStage::SetEndpointTable)
        } else {
            self.check(InitStage::CommitEndpointTable)
        }
    }

    fn in_transfer(&mut self, address: u8, endpoint: u8, data: &mut [u8]) -> TransferResult<usize> {
        self.in_reads.push((address, endpoint, data.len()));

        let next = self
            .in_responses
            .get_mut(&endpoint)
            .and_then(|queue| queue.pop_front());
        match next {
            None => Err(UsbError::Nak),
            Some(Err(error)) => Err(error),
            Some(Ok(report)) => {
                let n = data.len().min(report.len());
                data[..n].copy_from_slice(&report[..n]);
                Ok(n)
            }
        }
    }

    fn out_transfer(&mut self, address: u8, endpoint: u8, data: &[u8]) -> TransferResult<()> {
        self.out_writes.push((address, endpoint, data.to_vec()));
        match self.out_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
