//! HID device enumeration
//!
//! [`HidComposite::init`] takes a freshly attached device from the default
//! address to a configured, pollable state:
//!
//! 1. Read the first 8 bytes of the device descriptor at address 0
//! 2. Allocate and assign a device address
//! 3. Fetch the full device descriptor
//! 4. Walk configurations until one exposes HID interrupt endpoints; a
//!    device without any interrupt IN endpoint is rejected
//! 5. SET_CONFIGURATION, then SET_IDLE(0) on every polled interface
//!
//! Every failure after the precondition check goes through one rollback
//! path: the address is returned to the pool and the session counters are
//! reset before the originating error is returned.

use crate::descriptor::DeviceDescriptor;
use crate::error::{HidError, InitStage, Result, UsbError};
use crate::hid::extract::ConfigDescriptorParser;
use crate::hid::{DeviceIdentity, EndpointRole, HidComposite, HidHooks};
use crate::transfer::SetupPacket;
use crate::transport::{AddressPool, UsbTransport};

/// Bytes of the device descriptor read at the default address
const HEADER_LEN: usize = 8;

/// Minimum endpoint count for a usable device: control plus one interrupt endpoint
const MIN_ENDPOINTS: usize = 2;

fn stage(stage: InitStage) -> impl FnOnce(UsbError) -> HidError {
    move |error| HidError::Transport { stage, error }
}

impl<'p, H: HidHooks, const IFACES: usize, const EPS: usize, const PARSERS: usize>
    HidComposite<'p, H, IFACES, EPS, PARSERS>
{
    /// Enumerate the device currently answering at address 0
    ///
    /// `parent` and `port` locate the device for the address pool;
    /// `low_speed` is applied to the pool records used for control
    /// transfers. On success the device is configured and [`poll`](Self::poll)
    /// starts reading reports.
    ///
    /// # Errors
    ///
    /// - [`HidError::AlreadyInUse`] if this instance is already bound; nothing
    ///   is rolled back in that case
    /// - [`HidError::AddressNotFoundInPool`], [`HidError::EndpointInfoMissing`],
    ///   [`HidError::AddressSpaceExhausted`] for address pool problems
    /// - [`HidError::DeviceNotSupported`] when no configuration exposes a HID
    ///   interrupt endpoint
    /// - [`HidError::Transport`] carrying the raw transport error and the step
    ///   that failed
    pub fn init<T: UsbTransport>(
        &mut self,
        usb: &mut T,
        parent: u8,
        port: u8,
        low_speed: bool,
    ) -> Result<()> {
        debug!("HID composite init (parent {}, port {})", parent, port);

        if self.address != 0 {
            return Err(HidError::AlreadyInUse);
        }

        match self.enumerate(usb, parent, port, low_speed) {
            Ok(()) => {
                debug!("HID device configured at address {}", self.address);
                Ok(())
            }
            Err(err) => {
                error!("HID init failed: {} (code {:#x})", err, err.code());
                self.rollback(usb);
                Err(err)
            }
        }
    }

    fn rollback<T: UsbTransport>(&mut self, usb: &mut T) {
        if let Some(default_device) = usb.address_pool().device_mut(0) {
            default_device.low_speed = false;
        }
        self.release(usb);
    }

    fn enumerate<T: UsbTransport>(
        &mut self,
        usb: &mut T,
        parent: u8,
        port: u8,
        low_speed: bool,
    ) -> Result<()> {
        // Slots bound in an earlier session point into a table that no longer
        // describes this device
        for iface in self.interfaces.iter_mut() {
            iface.unbind_all();
        }

        let mut buf = [0u8; DeviceDescriptor::SIZE];

        self.read_descriptor_header(usb, low_speed, &mut buf[..HEADER_LEN])?;
        let len = (buf[0] as usize).min(DeviceDescriptor::SIZE);

        let address = usb
            .address_pool()
            .alloc_address(parent, false, port)
            .ok_or(HidError::AddressSpaceExhausted)?;
        self.address = address;

        self.endpoints[0].max_packet_size = buf[7] as u16;

        usb.set_address(0, 0, address)
            .map_err(stage(InitStage::SetAddress))?;

        debug!("Assigned address {}", address);

        if let Some(default_device) = usb.address_pool().device_mut(0) {
            default_device.low_speed = false;
        }

        usb.address_pool()
            .device_mut(address)
            .ok_or(HidError::AddressNotFoundInPool)?
            .low_speed = low_speed;

        if len > 0 {
            usb.get_device_descriptor(address, 0, &mut buf[..len])
                .map_err(stage(InitStage::DeviceDescriptor))?;
        }

        let device = DeviceDescriptor::from_bytes(&buf);
        self.vendor_id = device.id_vendor;
        self.product_id = device.id_product;

        usb.set_endpoint_table(address, &self.endpoints[..1])
            .map_err(stage(InitStage::SetEndpointTable))?;

        debug!("Device has {} configurations", device.b_num_configurations);

        self.scan_configurations(usb, device.b_num_configurations)?;

        if self.endpoint_count() < MIN_ENDPOINTS || !self.has_interrupt_in() {
            return Err(HidError::DeviceNotSupported);
        }

        usb.set_endpoint_table(address, self.endpoints())
            .map_err(stage(InitStage::CommitEndpointTable))?;

        debug!("Selecting configuration {}", self.conf_num);

        usb.set_configuration(address, 0, self.conf_num)
            .map_err(stage(InitStage::SetConfiguration))?;

        debug!("{} HID interfaces", self.interfaces.len());

        self.disable_idle_reports(usb)?;

        let identity = DeviceIdentity {
            address,
            configuration: self.conf_num,
            vendor_id: self.vendor_id,
            product_id: self.product_id,
        };
        self.hooks.on_init_successful(&identity);

        self.next_poll = None;
        self.poll_enabled = true;
        Ok(())
    }

    /// Read the first bytes of the device descriptor at address 0
    ///
    /// The default-address record is pointed at this driver's control endpoint
    /// for the duration of the transfer so toggle state of other drivers is
    /// left alone; the original record is restored afterwards.
    fn read_descriptor_header<T: UsbTransport>(
        &mut self,
        usb: &mut T,
        low_speed: bool,
        buf: &mut [u8],
    ) -> Result<()> {
        let default_device = usb
            .address_pool()
            .device_mut(0)
            .ok_or(HidError::AddressNotFoundInPool)?;
        let saved = default_device.control.ok_or(HidError::EndpointInfoMissing)?;

        default_device.control = Some(self.endpoints[0]);
        default_device.low_speed = low_speed;

        let result = usb.get_device_descriptor(0, 0, buf);

        if let Some(default_device) = usb.address_pool().device_mut(0) {
            if let Some(ours) = default_device.control.replace(saved) {
                self.endpoints[0] = ours;
            }
        }

        result.map(|_| ()).map_err(stage(InitStage::DeviceDescriptorHeader))
    }

    /// Walk configurations until one yields an interrupt endpoint
    fn scan_configurations<T: UsbTransport>(&mut self, usb: &mut T, num_configs: u8) -> Result<()> {
        let address = self.address;
        let filter = self.config.class_filter;

        for index in 0..num_configs {
            let mut parser = ConfigDescriptorParser::new(&mut *self, filter);
            usb.get_config_descriptor(address, 0, index, &mut parser)
                .map_err(stage(InitStage::ConfigurationDescriptor))?;

            if self.endpoint_count() >= MIN_ENDPOINTS {
                break;
            }
        }
        Ok(())
    }

    /// Some interface has an interrupt IN endpoint to poll
    fn has_interrupt_in(&self) -> bool {
        self.interfaces
            .iter()
            .any(|iface| iface.endpoint_slot(EndpointRole::InterruptIn).is_some())
    }

    /// SET_IDLE(0) on every interface with an interrupt IN endpoint
    fn disable_idle_reports<T: UsbTransport>(&mut self, usb: &mut T) -> Result<()> {
        for iface in self.interfaces.iter() {
            if iface.endpoint_slot(EndpointRole::InterruptIn).is_none() {
                continue;
            }

            debug!("SET_IDLE on interface {}", iface.interface);

            let setup = SetupPacket::set_idle(iface.interface, 0, 0);
            match usb.control_out(self.address, 0, &setup, &[]) {
                Ok(()) => {}
                Err(UsbError::Stall) => {
                    debug!("Interface {} does not support SET_IDLE", iface.interface);
                }
                Err(error) => {
                    return Err(HidError::Transport {
                        stage: InitStage::SetIdle,
                        error,
                    })
                }
            }
        }
        Ok(())
    }
}
