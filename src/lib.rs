#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

//! Composite-device HID class driver for embedded USB hosts
//!
//! One [`HidComposite`] instance binds every HID interface of a single
//! device, so keyboard/mouse combos, media keys and vendor interfaces all
//! report through the same driver. The host controller is abstracted away
//! behind [`transport::UsbTransport`]; the driver only speaks HID.
//!
//! # Core Components
//!
//! - [`hid`] - the driver, its tables, report parser registry and hooks
//! - [`enumeration`] - the `init` state machine and rollback
//! - [`transport`] - host stack traits and a static address pool
//! - [`descriptor`] - typed USB descriptors and interface class filter
//! - [`transfer`] - setup packet builders for standard and HID requests
//! - [`error`] - driver errors and raw transport result codes
//! - [`perf`] - polling diagnostics
//!
//! # Features
//!
//! - `defmt` - derive `defmt::Format` on public types and log through `defmt`
//!   instead of the `log` facade
//! - `std` - `std::error::Error` implementations

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "defmt")]
use defmt as _;

#[macro_use]
mod fmt;

pub mod descriptor;
pub mod enumeration;
pub mod error;
pub mod hid;
pub mod perf;
pub mod transfer;
pub mod transport;

pub use error::{HidError, InitStage, Result, UsbError};
pub use hid::{
    DeviceIdentity, HidComposite, HidConfig, HidHooks, PollStatus, ReportContext, ReportParser,
};
pub use perf::{PollCounters, PollStats};
pub use transport::{AddressPool, Clock, DescriptorVisitor, StaticAddressPool, UsbTransport};
