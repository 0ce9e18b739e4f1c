//! Composite HID class driver
//!
//! [`HidComposite`] binds every HID interface of a device, enumerates it over
//! a [`UsbTransport`], and polls all interrupt IN endpoints, routing each
//! report to a registered [`ReportParser`].
//!
//! # Lifecycle
//!
//! 1. [`HidComposite::new`] - all tables zeroed
//! 2. [`set_report_parser`](HidComposite::set_report_parser) - bind parsers
//! 3. [`init`](HidComposite::init) - enumerate a device at address 0
//! 4. [`poll`](HidComposite::poll) - call from the main loop
//! 5. [`release`](HidComposite::release) - on disconnect
//!
//! # Example
//!
//! ```no_run
//! use usbh_hid_composite::hid::{HidComposite, ReportContext, ReportParser};
//! use usbh_hid_composite::transport::UsbTransport;
//!
//! struct Printer;
//!
//! impl ReportParser for Printer {
//!     fn parse(&self, ctx: &ReportContext, _has_report_id: bool, data: &[u8]) {
//!         log::info!("{:04x}:{:04x} {:02x?}", ctx.vendor_id, ctx.product_id, data);
//!     }
//! }
//!
//! fn run<T: UsbTransport>(usb: &mut T, millis: impl Fn() -> u32) {
//!     let printer = Printer;
//!     let mut hid: HidComposite<'_> = HidComposite::new(());
//!     hid.set_report_parser(0, &printer);
//!
//!     if hid.init(usb, 0, 1, false).is_ok() {
//!         loop {
//!             hid.poll(usb, &millis);
//!         }
//!     }
//! }
//! ```

pub mod constants;
pub mod extract;
pub mod hooks;
pub mod parser;
pub mod poll;
pub mod tables;

pub use constants::*;
pub use extract::{ConfigDescriptorParser, EndpointSink};
pub use hooks::{DeviceIdentity, HidHooks};
pub use parser::{ReportContext, ReportParser, ReportParserRegistry};
pub use poll::PollStatus;
pub use tables::{
    EndpointInfo, EndpointRole, HidClassDescriptorInfo, HidClassDescriptorTable, HidInterface,
    NakPower,
};

use heapless::Vec;

use crate::descriptor::ClassFilter;
use crate::error::{HidError, Result};
use crate::perf::PollCounters;
use crate::transfer::SetupPacket;
use crate::transport::{AddressPool, UsbTransport};

/// Default number of HID interfaces tracked
pub const MAX_HID_INTERFACES: usize = 5;
/// Default endpoint table size: control plus two per interface
pub const TOTAL_ENDPOINTS: usize = MAX_HID_INTERFACES * tables::MAX_EP_PER_INTERFACE + 1;
/// Default number of report parser bindings
pub const MAX_REPORT_PARSERS: usize = 2;
/// HID class descriptors remembered from the configuration walk
pub const MAX_HID_CLASS_DESCRIPTORS: usize = 5;
/// Scratch buffer size for one interrupt IN read
pub const POLL_BUFFER_LEN: usize = 64;

/// Driver configuration
///
/// # Example
///
/// ```
/// use usbh_hid_composite::hid::HidConfig;
///
/// // Poll every 10 ms regardless of endpoint bInterval
/// let config = HidConfig::new().poll_interval_override(10);
/// assert_eq!(config.poll_interval_override, Some(10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HidConfig {
    /// Fixed poll interval in ms, replacing the largest endpoint bInterval
    pub poll_interval_override: Option<u8>,
    /// Interfaces whose endpoints are extracted
    pub class_filter: ClassFilter,
    /// Reports carry a leading report id byte
    pub report_id_framing: bool,
}

impl HidConfig {
    /// HID class interfaces, interval from descriptors, no report ids
    pub const fn new() -> Self {
        Self {
            poll_interval_override: None,
            class_filter: ClassFilter::hid(),
            report_id_framing: false,
        }
    }

    /// Force a fixed poll interval
    pub const fn poll_interval_override(mut self, interval_ms: u8) -> Self {
        self.poll_interval_override = Some(interval_ms);
        self
    }

    /// Replace the interface filter
    pub const fn class_filter(mut self, filter: ClassFilter) -> Self {
        self.class_filter = filter;
        self
    }

    /// Enable or disable report id framing
    pub const fn report_id_framing(mut self, enabled: bool) -> Self {
        self.report_id_framing = enabled;
        self
    }
}

impl Default for HidConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Composite HID class driver
///
/// All storage is inline and sized by the const parameters:
///
/// - `IFACES` - HID interfaces tracked
/// - `EPS` - endpoint slots, including the control endpoint in slot 0
///   (1..=255)
/// - `PARSERS` - report parser bindings
///
/// Parsers are borrowed for `'p` and must outlive the driver.
pub struct HidComposite<
    'p,
    H: HidHooks = (),
    const IFACES: usize = MAX_HID_INTERFACES,
    const EPS: usize = TOTAL_ENDPOINTS,
    const PARSERS: usize = MAX_REPORT_PARSERS,
> {
    pub(crate) hooks: H,
    pub(crate) config: HidConfig,
    /// Assigned device address, 0 when unbound
    pub(crate) address: u8,
    /// Configuration value recorded by the extractor
    pub(crate) conf_num: u8,
    pub(crate) endpoints: [EndpointInfo; EPS],
    pub(crate) endpoint_count: u8,
    pub(crate) interfaces: Vec<HidInterface, IFACES>,
    pub(crate) parsers: ReportParserRegistry<'p, PARSERS>,
    pub(crate) class_descriptors: HidClassDescriptorTable<MAX_HID_CLASS_DESCRIPTORS>,
    /// Aggregate poll interval in ms
    pub(crate) poll_interval: u8,
    pub(crate) poll_enabled: bool,
    /// Next poll deadline, `None` = poll on the next call
    pub(crate) next_poll: Option<u32>,
    pub(crate) vendor_id: u16,
    pub(crate) product_id: u16,
    pub(crate) counters: PollCounters,
}

impl<'p, H: HidHooks, const IFACES: usize, const EPS: usize, const PARSERS: usize>
    HidComposite<'p, H, IFACES, EPS, PARSERS>
{
    const TABLE_SIZE_OK: () = assert!(
        EPS >= 1 && EPS <= u8::MAX as usize,
        "endpoint table needs the control slot and u8 indices"
    );

    /// Create a driver with default configuration
    pub fn new(hooks: H) -> Self {
        Self::with_config(hooks, HidConfig::new())
    }

    /// Create a driver with explicit configuration
    pub fn with_config(hooks: H, config: HidConfig) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::TABLE_SIZE_OK;

        let mut driver = Self {
            hooks,
            config,
            address: 0,
            conf_num: 0,
            endpoints: [EndpointInfo::EMPTY; EPS],
            endpoint_count: 1,
            interfaces: Vec::new(),
            parsers: ReportParserRegistry::new(),
            class_descriptors: HidClassDescriptorTable::new(),
            poll_interval: 0,
            poll_enabled: false,
            next_poll: None,
            vendor_id: 0,
            product_id: 0,
            counters: PollCounters::new(),
        };
        driver.initialize();
        driver
    }

    /// Zero every table and counter, including parser bindings
    ///
    /// Unlike [`release`](Self::release) this forgets interfaces and parsers.
    /// Must not be called while a device is bound.
    pub fn initialize(&mut self) {
        self.parsers.clear();
        self.class_descriptors.clear();
        self.interfaces.clear();
        self.endpoints = [EndpointInfo::EMPTY; EPS];
        self.endpoints[0] = EndpointInfo::CONTROL;
        self.endpoint_count = 1;
        self.conf_num = 0;
        self.poll_interval = 0;
    }

    /// Bind a report parser; `false` when every binding slot is taken
    pub fn set_report_parser(&mut self, report_id: u8, parser: &'p dyn ReportParser) -> bool {
        self.parsers.register(report_id, parser)
    }

    /// Parser that would receive a report with `report_id`
    pub fn report_parser(&self, report_id: u8) -> Option<&'p dyn ReportParser> {
        self.parsers.resolve(report_id, self.config.report_id_framing)
    }

    /// Reports carry a leading report id byte
    pub fn has_report_id(&self) -> bool {
        self.config.report_id_framing
    }

    /// Switch report id framing
    pub fn set_report_id_framing(&mut self, enabled: bool) {
        self.config.report_id_framing = enabled;
    }

    /// Length of the `num`-th HID class descriptor of `descriptor_type`
    ///
    /// Returns 0 when no such descriptor was seen.
    pub fn hid_class_descriptor_len(&self, descriptor_type: u8, num: u8) -> u16 {
        self.class_descriptors.length_of(descriptor_type, num)
    }

    /// Unbind from the device
    ///
    /// Frees the address, truncates the endpoint table to the control slot
    /// and stops polling. Interface entries and parser bindings are kept.
    pub fn release<T: UsbTransport>(&mut self, usb: &mut T) {
        usb.address_pool().free_address(self.address);

        self.endpoint_count = 1;
        self.address = 0;
        self.next_poll = None;
        self.poll_enabled = false;
    }

    /// Write a report to the first interrupt OUT endpoint
    ///
    /// This is a plain interrupt transfer, not a SET_REPORT request.
    pub fn send_report<T: UsbTransport>(&mut self, usb: &mut T, data: &[u8]) -> Result<()> {
        if self.address == 0 {
            return Err(HidError::NotInitialized);
        }

        let slot = self
            .interfaces
            .iter()
            .find_map(|iface| iface.endpoint_slot(EndpointRole::InterruptOut))
            .ok_or(HidError::NoOutputEndpoint)?;

        let endpoint = self.endpoints[slot].ep_addr;
        usb.out_transfer(self.address, endpoint, data)?;
        Ok(())
    }

    /// HID SET_IDLE; `duration` in 4 ms units, 0 = report only on change
    pub fn set_idle<T: UsbTransport>(
        &mut self,
        usb: &mut T,
        interface: u8,
        duration: u8,
        report_id: u8,
    ) -> Result<()> {
        self.class_request_out(usb, SetupPacket::set_idle(interface, duration, report_id), &[])
    }

    /// HID GET_IDLE
    pub fn get_idle<T: UsbTransport>(
        &mut self,
        usb: &mut T,
        interface: u8,
        report_id: u8,
    ) -> Result<u8> {
        let mut rate = [0u8; 1];
        self.class_request_in(usb, SetupPacket::get_idle(interface, report_id), &mut rate)?;
        Ok(rate[0])
    }

    /// HID SET_PROTOCOL
    pub fn set_protocol<T: UsbTransport>(
        &mut self,
        usb: &mut T,
        interface: u8,
        mode: HidProtocolMode,
    ) -> Result<()> {
        self.class_request_out(usb, SetupPacket::set_protocol(interface, mode as u8), &[])
    }

    /// HID GET_PROTOCOL
    pub fn get_protocol<T: UsbTransport>(
        &mut self,
        usb: &mut T,
        interface: u8,
    ) -> Result<HidProtocolMode> {
        let mut mode = [0u8; 1];
        self.class_request_in(usb, SetupPacket::get_protocol(interface), &mut mode)?;
        Ok(HidProtocolMode::from(mode[0]))
    }

    /// HID SET_REPORT over the control pipe
    pub fn set_report<T: UsbTransport>(
        &mut self,
        usb: &mut T,
        interface: u8,
        report_type: HidReportType,
        report_id: u8,
        data: &[u8],
    ) -> Result<()> {
        let setup = SetupPacket::set_report(interface, report_type, report_id, data.len() as u16);
        self.class_request_out(usb, setup, data)
    }

    /// HID GET_REPORT over the control pipe; returns bytes received
    pub fn get_report<T: UsbTransport>(
        &mut self,
        usb: &mut T,
        interface: u8,
        report_type: HidReportType,
        report_id: u8,
        data: &mut [u8],
    ) -> Result<usize> {
        let setup = SetupPacket::get_report(interface, report_type, report_id, data.len() as u16);
        self.class_request_in(usb, setup, data)
    }

    fn class_request_out<T: UsbTransport>(
        &mut self,
        usb: &mut T,
        setup: SetupPacket,
        data: &[u8],
    ) -> Result<()> {
        if self.address == 0 {
            return Err(HidError::NotInitialized);
        }
        usb.control_out(self.address, 0, &setup, data)?;
        Ok(())
    }

    fn class_request_in<T: UsbTransport>(
        &mut self,
        usb: &mut T,
        setup: SetupPacket,
        data: &mut [u8],
    ) -> Result<usize> {
        if self.address == 0 {
            return Err(HidError::NotInitialized);
        }
        Ok(usb.control_in(self.address, 0, &setup, data)?)
    }

    /// Assigned device address, 0 when unbound
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Device is enumerated and being polled
    pub fn is_ready(&self) -> bool {
        self.poll_enabled
    }

    /// Configuration value selected during enumeration
    pub fn configuration(&self) -> u8 {
        self.conf_num
    }

    /// Vendor ID of the bound device
    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    /// Product ID of the bound device
    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    /// Aggregate poll interval in ms
    pub fn poll_interval(&self) -> u8 {
        self.poll_interval
    }

    /// Live endpoint records, control endpoint first
    pub fn endpoints(&self) -> &[EndpointInfo] {
        &self.endpoints[..self.endpoint_count as usize]
    }

    /// Number of live endpoint records, including the control endpoint
    pub fn endpoint_count(&self) -> usize {
        self.endpoint_count as usize
    }

    /// HID interfaces in discovery order
    pub fn interfaces(&self) -> &[HidInterface] {
        &self.interfaces
    }

    /// Driver configuration
    pub fn config(&self) -> &HidConfig {
        &self.config
    }

    /// Injected hooks
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Injected hooks, mutably
    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    /// Diagnostic counters
    pub fn counters(&self) -> &PollCounters {
        &self.counters
    }
}
