// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! wlanif - Wi-Fi station and soft access point interfaces for a scripting
//! host.
//!
//! wlanif-core - The platform agnostic core: interface objects, the scan
//! coordinator and the interface configuration accessor.
//!
//! ```text
//!       Host runtime        |  Wlan / WlanIf  --  WlanError
//! ---------------------------------------------------------
//!   ScanCoordinator    config accessor    capability ops
//! ---------------------------------------------------------
//!       RadioDriver (trait)       <--  ScanDone (completion)
//! ---------------------------------------------------------
//!   Radio firmware, e.g. wlanif-esp's EspRadio
//! ```
//!
//! * [`Wlan`] is the module level object: it hands out the two [`WlanIf`]
//!   interface objects and gets/sets the operating and PHY modes.
//! * [`WlanIf`] implements the per-interface operations, including
//!   [`WlanIf::scan()`] and [`WlanIf::config()`].
//! * [`RadioDriver`] is implemented by the radio backend.  It is the only
//!   thing the core calls into.
//!
//! This library is `no_std` compatible, and requires an `alloc`
//! implementation.

#![no_std]

pub mod config;
pub mod consts;
pub mod driver;
pub mod scan;
pub mod types;
pub mod wlan;

#[cfg(test)]
pub(crate) mod testing;

#[doc(inline)]
pub use crate::config::{ConfigField, ConfigValue, InterfaceConfig, SoftApConfig, StationConfig};
#[doc(inline)]
pub use crate::driver::{BssInfo, DriverError, IpInfo, RadioDriver, ScanStatus};
#[doc(inline)]
pub use crate::scan::{ScanCoordinator, ScanDone, ScanResult};
#[doc(inline)]
pub use crate::types::{AuthMode, Interface, MacAddress, OpMode, PhyMode, StationStatus};
#[doc(inline)]
pub use crate::wlan::{IfConfig, Wlan, WlanIf};

extern crate alloc;
use alloc::string::String;
use core::fmt;
use serde::Serialize;

/// Error type returned by all wlanif-core operations.
///
/// Errors are reported to the immediate caller and never retried
/// internally.  [`WlanError::is_os_error()`] groups the errors a host
/// runtime reports as OS level failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WlanError {
    /// The operation is not supported in the radio's current state, for
    /// example scanning while in access point only mode.
    Unsupported(String),

    /// A radio driver call failed, or an asynchronous driver operation
    /// reported failure.
    OperationFailed(String),

    /// The operation requires a different interface than the one it was
    /// invoked on.
    InterfaceRequired(Interface),

    /// An argument had an invalid value: an unknown configuration
    /// parameter, a MAC address of the wrong length, etc.
    Validation(String),

    /// Arguments were of the wrong kind or combined incorrectly.
    TypeConflict(String),
}

impl WlanError {
    /// Returns a string representation of the error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            WlanError::Unsupported(_) => "Unsupported Operation",
            WlanError::OperationFailed(_) => "Operation Failed",
            WlanError::InterfaceRequired(_) => "Interface Required",
            WlanError::Validation(_) => "Validation Error",
            WlanError::TypeConflict(_) => "Type Conflict",
        }
    }

    /// Returns true for errors a host reports as OS level failures, as
    /// opposed to errors in the caller's arguments.
    pub fn is_os_error(&self) -> bool {
        matches!(
            self,
            WlanError::Unsupported(_)
                | WlanError::OperationFailed(_)
                | WlanError::InterfaceRequired(_)
        )
    }

    pub(crate) fn failed(msg: &str) -> Self {
        WlanError::OperationFailed(String::from(msg))
    }

    pub(crate) fn validation(msg: &str) -> Self {
        WlanError::Validation(String::from(msg))
    }

    pub(crate) fn type_conflict(msg: &str) -> Self {
        WlanError::TypeConflict(String::from(msg))
    }
}

impl fmt::Display for WlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WlanError::Unsupported(msg)
            | WlanError::OperationFailed(msg)
            | WlanError::Validation(msg)
            | WlanError::TypeConflict(msg) => write!(f, "{msg}"),
            WlanError::InterfaceRequired(interface) => write!(f, "{interface} required"),
        }
    }
}

impl Serialize for WlanError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("WlanError", 2)?;

        let kind = match self {
            WlanError::Unsupported(_) => "unsupported",
            WlanError::OperationFailed(_) => "operation failed",
            WlanError::InterfaceRequired(_) => "interface required",
            WlanError::Validation(_) => "validation",
            WlanError::TypeConflict(_) => "type conflict",
        };
        state.serialize_field("kind", kind)?;
        state.serialize_field("detail", &alloc::format!("{self}"))?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_required_message() {
        let err = WlanError::InterfaceRequired(Interface::AccessPoint);
        assert_eq!(alloc::format!("{err}"), "AP required");
        assert!(err.is_os_error());
        assert!(!WlanError::validation("unknown config param").is_os_error());
    }

    #[test]
    fn error_serializes_kind_and_detail() {
        let err = WlanError::validation("invalid buffer length");
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"validation","detail":"invalid buffer length"}"#
        );
    }
}
