//! USB and HID driver error types

use core::fmt;

/// HID driver result type
pub type Result<T> = core::result::Result<T, HidError>;

/// Host controller result codes as reported by the transport
pub mod code {
    /// Transfer completed
    pub const SUCCESS: u8 = 0x00;
    /// Controller busy
    pub const BUSY: u8 = 0x01;
    /// Bad request
    pub const BAD_REQUEST: u8 = 0x02;
    /// Device NAK'd the transaction
    pub const NAK: u8 = 0x04;
    /// Endpoint stalled
    pub const STALL: u8 = 0x05;
    /// Data toggle mismatch
    pub const TOGGLE_ERROR: u8 = 0x06;
    /// Wrong PID
    pub const WRONG_PID: u8 = 0x07;
    /// Bad byte count
    pub const BAD_BYTE_COUNT: u8 = 0x08;
    /// PID check error
    pub const PID_ERROR: u8 = 0x09;
    /// Packet error
    pub const PACKET_ERROR: u8 = 0x0A;
    /// CRC error
    pub const CRC_ERROR: u8 = 0x0B;
    /// No response from device
    pub const TIMEOUT: u8 = 0x0E;
    /// Device talked past end of frame
    pub const BABBLE: u8 = 0x0F;

    /// Device is not handled by this class driver
    pub const DEVICE_NOT_SUPPORTED: u8 = 0xD1;
    /// No free address left in the pool
    pub const OUT_OF_ADDRESS_SPACE_IN_POOL: u8 = 0xD2;
    /// Address has no record in the pool
    pub const ADDRESS_NOT_FOUND_IN_POOL: u8 = 0xD4;
    /// Pool record carries no endpoint information
    pub const EPINFO_IS_NULL: u8 = 0xD5;
    /// Driver instance already bound to a device
    pub const CLASS_INSTANCE_ALREADY_IN_USE: u8 = 0xD7;
    /// Endpoint not present in the endpoint table
    pub const EP_NOT_FOUND_IN_TBL: u8 = 0xD9;
}

/// Transport-level USB errors
///
/// Each variant maps one-to-one to a host controller result code, so the raw
/// code reaches the caller unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsbError {
    /// Controller busy
    Busy,
    /// Bad request
    BadRequest,
    /// Device NAK'd transaction (no data yet)
    Nak,
    /// USB stall condition
    Stall,
    /// Data toggle mismatch
    DataToggleMismatch,
    /// Wrong PID received
    WrongPid,
    /// Bad byte count
    BadByteCount,
    /// PID check error
    PidError,
    /// Packet error
    PacketError,
    /// CRC error in data
    CrcError,
    /// Timeout waiting for response
    Timeout,
    /// Babble detected (device sent too much data)
    Babble,
    /// Any other non-zero transport code
    Other(u8),
}

impl UsbError {
    /// Decode a raw transport result code, `None` for success
    pub const fn from_code(value: u8) -> Option<Self> {
        Some(match value {
            code::SUCCESS => return None,
            code::BUSY => Self::Busy,
            code::BAD_REQUEST => Self::BadRequest,
            code::NAK => Self::Nak,
            code::STALL => Self::Stall,
            code::TOGGLE_ERROR => Self::DataToggleMismatch,
            code::WRONG_PID => Self::WrongPid,
            code::BAD_BYTE_COUNT => Self::BadByteCount,
            code::PID_ERROR => Self::PidError,
            code::PACKET_ERROR => Self::PacketError,
            code::CRC_ERROR => Self::CrcError,
            code::TIMEOUT => Self::Timeout,
            code::BABBLE => Self::Babble,
            other => Self::Other(other),
        })
    }

    /// Raw transport result code
    pub const fn code(&self) -> u8 {
        match self {
            Self::Busy => code::BUSY,
            Self::BadRequest => code::BAD_REQUEST,
            Self::Nak => code::NAK,
            Self::Stall => code::STALL,
            Self::DataToggleMismatch => code::TOGGLE_ERROR,
            Self::WrongPid => code::WRONG_PID,
            Self::BadByteCount => code::BAD_BYTE_COUNT,
            Self::PidError => code::PID_ERROR,
            Self::PacketError => code::PACKET_ERROR,
            Self::CrcError => code::CRC_ERROR,
            Self::Timeout => code::TIMEOUT,
            Self::Babble => code::BABBLE,
            Self::Other(value) => *value,
        }
    }
}

impl fmt::Display for UsbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "Controller busy"),
            Self::BadRequest => write!(f, "Bad request"),
            Self::Nak => write!(f, "Device NAK"),
            Self::Stall => write!(f, "USB stall"),
            Self::DataToggleMismatch => write!(f, "Data toggle mismatch"),
            Self::WrongPid => write!(f, "Wrong PID"),
            Self::BadByteCount => write!(f, "Bad byte count"),
            Self::PidError => write!(f, "PID error"),
            Self::PacketError => write!(f, "Packet error"),
            Self::CrcError => write!(f, "CRC error"),
            Self::Timeout => write!(f, "Timeout"),
            Self::Babble => write!(f, "Babble detected"),
            Self::Other(value) => write!(f, "Transport error {:#04x}", value),
        }
    }
}

/// Enumeration step a transport error surfaced from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitStage {
    /// First 8 bytes of the device descriptor at address 0
    DeviceDescriptorHeader,
    /// SET_ADDRESS
    SetAddress,
    /// Full device descriptor at the new address
    DeviceDescriptor,
    /// Registering the control endpoint with the transport
    SetEndpointTable,
    /// Walking a configuration descriptor
    ConfigurationDescriptor,
    /// Registering the full endpoint table with the transport
    CommitEndpointTable,
    /// SET_CONFIGURATION
    SetConfiguration,
    /// SET_IDLE on an interface
    SetIdle,
}

impl fmt::Display for InitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceDescriptorHeader => write!(f, "device descriptor header"),
            Self::SetAddress => write!(f, "set address"),
            Self::DeviceDescriptor => write!(f, "get device descriptor"),
            Self::SetEndpointTable => write!(f, "set endpoint table"),
            Self::ConfigurationDescriptor => write!(f, "get configuration descriptor"),
            Self::CommitEndpointTable => write!(f, "commit endpoint table"),
            Self::SetConfiguration => write!(f, "set configuration"),
            Self::SetIdle => write!(f, "set idle"),
        }
    }
}

/// HID class driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidError {
    /// `init` called while an address is already assigned
    AlreadyInUse,
    /// Address pool has no record for the requested address
    AddressNotFoundInPool,
    /// Address-0 record carries no control endpoint
    EndpointInfoMissing,
    /// Address pool has no free address left
    AddressSpaceExhausted,
    /// No configuration exposes a HID interrupt IN endpoint
    DeviceNotSupported,
    /// Operation requires a bound device
    NotInitialized,
    /// No interface exposes an interrupt-OUT endpoint
    NoOutputEndpoint,
    /// Transport call failed during the given step
    Transport {
        /// Step that issued the failing call
        stage: InitStage,
        /// Raw transport error
        error: UsbError,
    },
    /// Transport call failed outside enumeration
    Transfer(UsbError),
}

impl HidError {
    /// Numeric result code
    ///
    /// Transport failures report the transport's own code unchanged.
    pub const fn code(&self) -> u8 {
        match self {
            Self::AlreadyInUse => code::CLASS_INSTANCE_ALREADY_IN_USE,
            Self::AddressNotFoundInPool => code::ADDRESS_NOT_FOUND_IN_POOL,
            Self::EndpointInfoMissing => code::EPINFO_IS_NULL,
            Self::AddressSpaceExhausted => code::OUT_OF_ADDRESS_SPACE_IN_POOL,
            Self::DeviceNotSupported => code::DEVICE_NOT_SUPPORTED,
            Self::NotInitialized => code::ADDRESS_NOT_FOUND_IN_POOL,
            Self::NoOutputEndpoint => code::EP_NOT_FOUND_IN_TBL,
            Self::Transport { error, .. } | Self::Transfer(error) => error.code(),
        }
    }

    /// Underlying transport error, if any
    pub const fn transport_error(&self) -> Option<UsbError> {
        match self {
            Self::Transport { error, .. } | Self::Transfer(error) => Some(*error),
            _ => None,
        }
    }
}

impl From<UsbError> for HidError {
    fn from(error: UsbError) -> Self {
        Self::Transfer(error)
    }
}

impl fmt::Display for HidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInUse => write!(f, "Class instance already in use"),
            Self::AddressNotFoundInPool => write!(f, "Address not found in pool"),
            Self::EndpointInfoMissing => write!(f, "Endpoint info is missing"),
            Self::AddressSpaceExhausted => write!(f, "Out of address space in pool"),
            Self::DeviceNotSupported => write!(f, "Device not supported"),
            Self::NotInitialized => write!(f, "Device not initialized"),
            Self::NoOutputEndpoint => write!(f, "No interrupt OUT endpoint"),
            Self::Transport { stage, error } => write!(f, "{} failed: {}", stage, error),
            Self::Transfer(error) => write!(f, "Transfer failed: {}", error),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UsbError {}

#[cfg(feature = "std")]
impl std::error::Error for HidError {}
