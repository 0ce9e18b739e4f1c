//! Customization points for specialized HID drivers

/// Device identity handed to [`HidHooks::on_init_successful`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceIdentity {
    /// Assigned device address
    pub address: u8,
    /// Selected configuration value
    pub configuration: u8,
    /// Vendor ID
    pub vendor_id: u16,
    /// Product ID
    pub product_id: u16,
}

/// Hooks a concrete device driver injects into [`HidComposite`](super::HidComposite)
///
/// Every method has a default, so a plain composite driver can use `()`.
///
/// # Example
///
/// ```
/// use usbh_hid_composite::hid::{HidHooks, HidProtocol};
///
/// /// Only bind the keyboard interface of a combo receiver
/// struct KeyboardOnly;
///
/// impl HidHooks for KeyboardOnly {
///     fn select_interface(&mut self, _interface: u8, protocol: u8) -> bool {
///         protocol == HidProtocol::Keyboard as u8
///     }
/// }
/// ```
pub trait HidHooks {
    /// Called once enumeration has completed, before polling is enabled
    fn on_init_successful(&mut self, _device: &DeviceIdentity) {}

    /// Decide whether endpoints of `interface` get bound
    ///
    /// Returning `false` leaves the interface entry in place with all roles
    /// unbound.
    fn select_interface(&mut self, _interface: u8, _protocol: u8) -> bool {
        true
    }

    /// Raw report tap, invoked before parser dispatch
    fn parse_hid_data(&mut self, _endpoint: u8, _has_report_id: bool, _data: &[u8]) {}
}

impl HidHooks for () {}
