//! Fixed-capacity driver tables
//!
//! Endpoint records, HID interface bindings and HID class-descriptor
//! metadata. Everything is sized at compile time and referenced by small
//! indices; slot 0 of the endpoint table is always the control endpoint, so
//! an index of 0 doubles as "unbound" in interface role arrays.

/// NAK retry budget, as a power of two
///
/// The transport retries a NAK'd transaction up to `2^power - 1` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NakPower(pub u8);

impl NakPower {
    /// Never retry, not even once
    pub const NO_NAK: Self = Self(0);
    /// Single attempt; a NAK returns immediately
    pub const NO_WAIT: Self = Self(1);
    /// Transport default
    pub const DEFAULT: Self = Self(14);
    /// Largest budget, effectively retry until answered
    pub const MAX: Self = Self(15);

    /// Number of retries this budget allows
    pub const fn retry_limit(self) -> u16 {
        if self.0 == 0 {
            0
        } else if self.0 >= 16 {
            u16::MAX
        } else {
            (1u16 << self.0) - 1
        }
    }
}

/// Per-endpoint transfer record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndpointInfo {
    /// Endpoint number (0-15, no direction bit)
    pub ep_addr: u8,
    /// Maximum packet size
    pub max_packet_size: u16,
    /// OUT data toggle
    pub snd_toggle: bool,
    /// IN data toggle
    pub rcv_toggle: bool,
    /// NAK retry budget
    pub nak_power: NakPower,
}

impl EndpointInfo {
    /// Control endpoint before the device descriptor has been read
    pub const CONTROL: Self = Self {
        ep_addr: 0,
        max_packet_size: 8,
        snd_toggle: false,
        rcv_toggle: false,
        nak_power: NakPower::MAX,
    };

    /// Cleared functional endpoint slot
    pub const EMPTY: Self = Self {
        ep_addr: 0,
        max_packet_size: 0,
        snd_toggle: false,
        rcv_toggle: false,
        nak_power: NakPower::NO_WAIT,
    };

    /// Fresh interrupt endpoint record with toggles reset
    pub const fn interrupt(number: u8, max_packet_size: u16) -> Self {
        Self {
            ep_addr: number & 0x0F,
            max_packet_size,
            snd_toggle: false,
            rcv_toggle: false,
            nak_power: NakPower::NO_WAIT,
        }
    }
}

/// Logical endpoint roles within a HID interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum EndpointRole {
    /// Interrupt IN (device to host reports)
    InterruptIn = 0,
    /// Interrupt OUT (host to device reports)
    InterruptOut = 1,
}

/// Number of endpoint roles per interface
pub const MAX_EP_PER_INTERFACE: usize = 2;

/// One HID interface discovered in the active configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidInterface {
    /// `bInterfaceNumber`
    pub interface: u8,
    /// `bAlternateSetting`
    pub alt_setting: u8,
    /// `bInterfaceProtocol`
    pub protocol: u8,
    ep_index: [u8; MAX_EP_PER_INTERFACE],
}

impl HidInterface {
    /// New interface with every role unbound
    pub const fn new(interface: u8, alt_setting: u8, protocol: u8) -> Self {
        Self {
            interface,
            alt_setting,
            protocol,
            ep_index: [0; MAX_EP_PER_INTERFACE],
        }
    }

    /// Identity check on (interface, alternate setting, protocol)
    pub fn matches(&self, interface: u8, alt_setting: u8, protocol: u8) -> bool {
        self.interface == interface && self.alt_setting == alt_setting && self.protocol == protocol
    }

    /// Endpoint table slot bound to `role`, `None` if unbound
    pub fn endpoint_slot(&self, role: EndpointRole) -> Option<usize> {
        match self.ep_index[role as usize] {
            0 => None,
            slot => Some(slot as usize),
        }
    }

    pub(crate) fn bind(&mut self, role: EndpointRole, slot: u8) {
        self.ep_index[role as usize] = slot;
    }

    /// Drop every role binding, keeping the interface identity
    pub(crate) fn unbind_all(&mut self) {
        self.ep_index = [0; MAX_EP_PER_INTERFACE];
    }
}

/// Length metadata for one HID class descriptor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidClassDescriptorInfo {
    /// Descriptor type, 0 for an unused slot
    pub descriptor_type: u8,
    /// Descriptor length in bytes
    pub length: u16,
}

/// Table of HID class descriptors seen during the configuration walk
#[derive(Debug, Clone)]
pub struct HidClassDescriptorTable<const N: usize> {
    entries: [HidClassDescriptorInfo; N],
}

impl<const N: usize> HidClassDescriptorTable<N> {
    /// Empty table
    pub const fn new() -> Self {
        Self {
            entries: [HidClassDescriptorInfo {
                descriptor_type: 0,
                length: 0,
            }; N],
        }
    }

    /// Zero every entry
    pub fn clear(&mut self) {
        self.entries = [HidClassDescriptorInfo::default(); N];
    }

    /// Record a descriptor in the first free slot; `false` when full
    pub fn insert(&mut self, descriptor_type: u8, length: u16) -> bool {
        match self.entries.iter_mut().find(|e| e.descriptor_type == 0) {
            Some(entry) => {
                *entry = HidClassDescriptorInfo {
                    descriptor_type,
                    length,
                };
                true
            }
            None => false,
        }
    }

    /// Length of the `num`-th descriptor of `descriptor_type`, 0 if absent
    pub fn length_of(&self, descriptor_type: u8, num: u8) -> u16 {
        self.entries
            .iter()
            .filter(|e| e.descriptor_type == descriptor_type)
            .nth(num as usize)
            .map_or(0, |e| e.length)
    }

    /// All slots, including free ones
    pub fn entries(&self) -> &[HidClassDescriptorInfo] {
        &self.entries
    }
}

impl<const N: usize> Default for HidClassDescriptorTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
