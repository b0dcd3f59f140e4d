// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! wlanif-core - Radio driver facade
//!
//! [`RadioDriver`] is the small function-call interface the core uses to
//! reach the radio firmware.  Every method is a synchronous request and
//! response, except [`RadioDriver::start_scan()`], which returns as soon as
//! the scan is started and later reports the outcome through the
//! [`ScanDone`] handle it was given.
//!
//! Implementations are shared between the caller and the driver's own
//! execution context, so methods take `&self` and implementations use
//! interior mutability, as the radio firmware's own API does.

use core::fmt;
use core::net::Ipv4Addr;

use crate::config::{SoftApConfig, StationConfig};
use crate::consts::{MAC_LEN, SSID_LEN};
use crate::scan::ScanDone;
use crate::types::{Interface, MacAddress, OpMode, PhyMode, StationStatus};

/// Failure reported by a radio driver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// The driver rejected the request.
    Rejected,

    /// The driver is busy with another operation, e.g. a scan.
    Busy,

    /// The driver does not support the request.
    Unsupported,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Rejected => write!(f, "rejected by driver"),
            DriverError::Busy => write!(f, "driver busy"),
            DriverError::Unsupported => write!(f, "not supported by driver"),
        }
    }
}

/// Status the driver passes to a scan completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ScanStatus {
    Ok = 0,
    Fail = 1,
    Pending = 2,
    Busy = 3,
    Cancel = 4,
}

/// Driver native record describing one discovered network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BssInfo {
    /// NUL padded SSID.  An SSID of exactly 32 bytes has no terminator.
    pub ssid: [u8; SSID_LEN],
    pub bssid: [u8; MAC_LEN],
    pub channel: u8,
    pub rssi: i8,
    pub authmode: u8,
    pub is_hidden: bool,
}

impl BssInfo {
    /// Returns the SSID bytes before the first NUL.
    pub fn ssid(&self) -> &[u8] {
        let len = self
            .ssid
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(SSID_LEN);
        &self.ssid[..len]
    }
}

/// IPv4 configuration of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpInfo {
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub gateway: Ipv4Addr,
}

impl Default for IpInfo {
    fn default() -> Self {
        Self {
            ip: Ipv4Addr::UNSPECIFIED,
            netmask: Ipv4Addr::UNSPECIFIED,
            gateway: Ipv4Addr::UNSPECIFIED,
        }
    }
}

/// Operations the core consumes from the radio firmware.
pub trait RadioDriver {
    /// Returns the current operating mode.
    fn opmode(&self) -> OpMode;

    /// Sets the operating mode, enabling/disabling interfaces.
    fn set_opmode(&self, mode: OpMode) -> Result<(), DriverError>;

    /// Returns the current PHY mode.
    fn phy_mode(&self) -> PhyMode;

    /// Sets the PHY mode.
    fn set_phy_mode(&self, mode: PhyMode) -> Result<(), DriverError>;

    /// Reads the station configuration record.
    fn station_config(&self) -> Result<StationConfig, DriverError>;

    /// Writes the station configuration record.
    fn set_station_config(&self, config: &StationConfig) -> Result<(), DriverError>;

    /// Reads the soft-AP configuration record.
    fn softap_config(&self) -> Result<SoftApConfig, DriverError>;

    /// Writes the soft-AP configuration record.
    fn set_softap_config(&self, config: &SoftApConfig) -> Result<(), DriverError>;

    /// Starts connecting the station to the configured network.
    fn station_connect(&self) -> Result<(), DriverError>;

    /// Disconnects the station.
    fn station_disconnect(&self) -> Result<(), DriverError>;

    /// Returns the station's connection status.
    fn station_status(&self) -> StationStatus;

    /// Returns the number of stations connected to the soft-AP.
    fn softap_station_count(&self) -> Result<u8, DriverError>;

    /// Starts a scan.  On `Ok(())` the driver must later call
    /// [`ScanDone::complete()`] from its own execution context.  On `Err`
    /// the handle is dropped unused.
    fn start_scan(&self, done: ScanDone) -> Result<(), DriverError>;

    /// Returns the interface's hardware address.
    fn mac_address(&self, interface: Interface) -> Result<MacAddress, DriverError>;

    /// Sets the interface's hardware address.
    fn set_mac_address(&self, interface: Interface, mac: &MacAddress) -> Result<(), DriverError>;

    /// Returns the interface's IPv4 configuration.
    fn ip_info(&self, interface: Interface) -> Result<IpInfo, DriverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bss_with_ssid(ssid: &[u8]) -> BssInfo {
        let mut buf = [0u8; SSID_LEN];
        buf[..ssid.len()].copy_from_slice(ssid);
        BssInfo {
            ssid: buf,
            bssid: [0; MAC_LEN],
            channel: 1,
            rssi: -70,
            authmode: 0,
            is_hidden: false,
        }
    }

    #[test]
    fn ssid_stops_at_nul() {
        assert_eq!(bss_with_ssid(b"home").ssid(), b"home");
        assert_eq!(bss_with_ssid(b"").ssid(), b"");
    }

    #[test]
    fn full_length_ssid_has_no_terminator() {
        let ssid = [b'a'; SSID_LEN];
        assert_eq!(bss_with_ssid(&ssid).ssid(), &ssid[..]);
    }
}
