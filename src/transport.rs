//! Host stack collaborators
//!
//! The driver never touches the host controller directly. Everything it needs
//! from the host stack is expressed by the traits in this module:
//!
//! - [`UsbTransport`] - control and interrupt transfers plus the
//!   configuration-descriptor walk
//! - [`AddressPool`] - device address allocation and per-address records
//! - [`DescriptorVisitor`] - typed callbacks emitted while a configuration
//!   descriptor is walked
//! - [`Clock`] - monotonic millisecond counter
//!
//! [`StaticAddressPool`] is a ready-made bitmask pool for stacks that don't
//! bring their own.

use crate::descriptor::{
    ConfigurationDescriptor, EndpointDescriptor, HidDescriptor, InterfaceDescriptor,
};
use crate::error::UsbError;
use crate::hid::tables::EndpointInfo;
use crate::transfer::{SetupPacket, DESCRIPTOR_DEVICE};

/// Transport result type
pub type TransferResult<T> = core::result::Result<T, UsbError>;

/// Highest assignable USB device address
pub const MAX_DEVICE_ADDRESS: u8 = 127;

/// Per-address record kept by the address pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceRecord {
    /// Device address (0 = default address)
    pub address: u8,
    /// Parent hub address (0 = root port)
    pub parent: u8,
    /// Port on the parent
    pub port: u8,
    /// Device runs at low speed
    pub low_speed: bool,
    /// Control endpoint record used for transfers to this address
    pub control: Option<EndpointInfo>,
}

impl DeviceRecord {
    /// Record with a default control endpoint
    pub const fn new(address: u8, parent: u8, port: u8) -> Self {
        Self {
            address,
            parent,
            port,
            low_speed: false,
            control: Some(EndpointInfo::CONTROL),
        }
    }
}

/// Device address allocation shared by all class drivers on a host
pub trait AddressPool {
    /// Record for `address`; address 0 is the default-address placeholder
    fn device_mut(&mut self, address: u8) -> Option<&mut DeviceRecord>;

    /// Allocate a fresh address, `None` when the pool is exhausted
    fn alloc_address(&mut self, parent: u8, is_hub: bool, port: u8) -> Option<u8>;

    /// Return `address` to the pool; freeing 0 or an unknown address is a no-op
    fn free_address(&mut self, address: u8);
}

/// Typed callbacks emitted while one configuration descriptor is walked
///
/// Descriptors arrive in wire order. Every method has an empty default.
pub trait DescriptorVisitor {
    /// Configuration header
    fn configuration(&mut self, _desc: &ConfigurationDescriptor) {}
    /// Interface descriptor (including alternate settings)
    fn interface(&mut self, _desc: &InterfaceDescriptor) {}
    /// HID descriptor following a HID interface
    fn hid(&mut self, _desc: &HidDescriptor) {}
    /// Endpoint descriptor of the most recent interface
    fn endpoint(&mut self, _desc: &EndpointDescriptor) {}
}

/// Host-side USB transport
///
/// Control transfers always target endpoint 0 of `address`; the transport
/// uses the endpoint table registered through
/// [`set_endpoint_table`](Self::set_endpoint_table) (or the pool record for
/// address 0) for packet sizes, toggles and NAK budgets. Retry and backoff
/// policy belong to the implementation.
pub trait UsbTransport {
    /// Address pool type
    type Pool: AddressPool;

    /// Address pool shared with other class drivers
    fn address_pool(&mut self) -> &mut Self::Pool;

    /// Control transfer with an IN data stage; returns bytes received
    fn control_in(
        &mut self,
        address: u8,
        endpoint: u8,
        setup: &SetupPacket,
        data: &mut [u8],
    ) -> TransferResult<usize>;

    /// Control transfer with an OUT (or no) data stage
    fn control_out(
        &mut self,
        address: u8,
        endpoint: u8,
        setup: &SetupPacket,
        data: &[u8],
    ) -> TransferResult<()>;

    /// Fetch configuration descriptor `index` and walk it through `visitor`
    fn get_config_descriptor(
        &mut self,
        address: u8,
        endpoint: u8,
        index: u8,
        visitor: &mut dyn DescriptorVisitor,
    ) -> TransferResult<()>;

    /// Register the endpoint records used for transfers to `address`
    fn set_endpoint_table(&mut self, address: u8, endpoints: &[EndpointInfo])
        -> TransferResult<()>;

    /// Single non-blocking interrupt IN attempt; returns bytes received
    ///
    /// No pending data is reported as [`UsbError::Nak`].
    fn in_transfer(&mut self, address: u8, endpoint: u8, data: &mut [u8])
        -> TransferResult<usize>;

    /// Interrupt OUT write
    fn out_transfer(&mut self, address: u8, endpoint: u8, data: &[u8]) -> TransferResult<()>;

    /// GET_DESCRIPTOR(DEVICE), `data.len()` bytes
    fn get_device_descriptor(
        &mut self,
        address: u8,
        endpoint: u8,
        data: &mut [u8],
    ) -> TransferResult<usize> {
        let setup = SetupPacket::get_descriptor(DESCRIPTOR_DEVICE, 0, data.len() as u16);
        self.control_in(address, endpoint, &setup, data)
    }

    /// SET_ADDRESS, issued to `old_address`
    fn set_address(&mut self, old_address: u8, endpoint: u8, new_address: u8) -> TransferResult<()> {
        self.control_out(old_address, endpoint, &SetupPacket::set_address(new_address), &[])
    }

    /// SET_CONFIGURATION
    fn set_configuration(&mut self, address: u8, endpoint: u8, config: u8) -> TransferResult<()> {
        self.control_out(address, endpoint, &SetupPacket::set_configuration(config), &[])
    }
}

/// Monotonic millisecond clock; wraps at `u32::MAX`
pub trait Clock {
    /// Current time in milliseconds
    fn now_ms(&self) -> u32;
}

impl<F: Fn() -> u32> Clock for F {
    fn now_ms(&self) -> u32 {
        self()
    }
}

/// Bitmask address pool with `N` device slots plus the address-0 placeholder
///
/// Addresses are handed out lowest-first from 1..=N (N at most 127).
pub struct StaticAddressPool<const N: usize> {
    allocated: u128,
    default_device: DeviceRecord,
    devices: [DeviceRecord; N],
}

impl<const N: usize> StaticAddressPool<N> {
    /// Create new pool with every address free
    pub const fn new() -> Self {
        Self {
            allocated: 0,
            default_device: DeviceRecord::new(0, 0, 0),
            devices: [DeviceRecord::new(0, 0, 0); N],
        }
    }

    /// Number of addresses in use
    pub fn allocated_count(&self) -> u32 {
        self.allocated.count_ones()
    }

    fn capacity() -> usize {
        N.min(MAX_DEVICE_ADDRESS as usize)
    }

    fn is_allocated(&self, address: u8) -> bool {
        address != 0
            && (address as usize) <= Self::capacity()
            && self.allocated & (1u128 << address) != 0
    }
}

impl<const N: usize> Default for StaticAddressPool<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> AddressPool for StaticAddressPool<N> {
    fn device_mut(&mut self, address: u8) -> Option<&mut DeviceRecord> {
        if address == 0 {
            return Some(&mut self.default_device);
        }
        if !self.is_allocated(address) {
            return None;
        }
        self.devices.get_mut(address as usize - 1)
    }

    fn alloc_address(&mut self, parent: u8, _is_hub: bool, port: u8) -> Option<u8> {
        let address = (1..=Self::capacity()).find(|&a| self.allocated & (1u128 << a) == 0)? as u8;
        self.allocated |= 1u128 << address;
        self.devices[address as usize - 1] = DeviceRecord::new(address, parent, port);
        Some(address)
    }

    fn free_address(&mut self, address: u8) {
        if self.is_allocated(address) {
            self.allocated &= !(1u128 << address);
            self.devices[address as usize - 1] = DeviceRecord::new(0, 0, 0);
        }
    }
}
