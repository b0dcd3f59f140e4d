// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! wlanif-core - Module and interface objects
//!
//! [`Wlan`] owns the radio driver and hands out [`WlanIf`] objects, one per
//! [`Interface`].  A `WlanIf` borrows its `Wlan`, and every operation on it
//! goes straight through to the driver.  No radio state is cached here.

use alloc::string::String;
use alloc::vec::Vec;
use core::net::Ipv4Addr;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use serde::{Serialize, Serializer};

use crate::WlanError;
use crate::config::{self, ConfigField, ConfigValue, StationConfig};
use crate::driver::RadioDriver;
use crate::scan::{ScanCoordinator, ScanResult};
use crate::types::{Interface, MacAddress, OpMode, PhyMode, StationStatus};

/// Module level object.
pub struct Wlan<D: RadioDriver> {
    driver: D,
    scanner: &'static ScanCoordinator,
}

impl<D: RadioDriver> Wlan<D> {
    /// Creates the module object.
    ///
    /// Arguments:
    /// - `driver`: the radio driver.
    /// - `scanner`: the coordinator used for scans on either interface.
    pub fn new(driver: D, scanner: &'static ScanCoordinator) -> Self {
        Self { driver, scanner }
    }

    /// Returns the radio driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Returns the interface object for `index`, which defaults to the
    /// station interface.
    pub fn wlan(&self, index: Option<u8>) -> Result<WlanIf<'_, D>, WlanError> {
        let id = index.unwrap_or(Interface::Station.id());
        Interface::from_id(id)
            .map(|interface| self.interface(interface))
            .ok_or_else(|| WlanError::validation("invalid interface index"))
    }

    /// Returns the interface object for `interface`.
    pub fn interface(&self, interface: Interface) -> WlanIf<'_, D> {
        WlanIf {
            wlan: self,
            interface,
        }
    }

    pub fn sta(&self) -> WlanIf<'_, D> {
        self.interface(Interface::Station)
    }

    pub fn ap(&self) -> WlanIf<'_, D> {
        self.interface(Interface::AccessPoint)
    }

    pub fn wifi_mode(&self) -> OpMode {
        self.driver.opmode()
    }

    pub fn set_wifi_mode(&self, mode: OpMode) -> Result<(), WlanError> {
        debug!("Exec:  Set WiFi mode {mode}");
        self.driver.set_opmode(mode).map_err(|e| {
            warn!("Error: Failed to set WiFi mode {mode}: {e}");
            WlanError::failed("Cannot set WiFi mode")
        })
    }

    pub fn phy_mode(&self) -> PhyMode {
        self.driver.phy_mode()
    }

    pub fn set_phy_mode(&self, mode: PhyMode) -> Result<(), WlanError> {
        debug!("Exec:  Set PHY mode {mode:?}");
        self.driver.set_phy_mode(mode).map_err(|e| {
            warn!("Error: Failed to set PHY mode {mode:?}: {e}");
            WlanError::failed("Cannot set PHY mode")
        })
    }
}

/// Interface object, for either the station or the access point.
pub struct WlanIf<'a, D: RadioDriver> {
    wlan: &'a Wlan<D>,
    interface: Interface,
}

impl<D: RadioDriver> Clone for WlanIf<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: RadioDriver> Copy for WlanIf<'_, D> {}

impl<'a, D: RadioDriver> WlanIf<'a, D> {
    pub fn interface(&self) -> Interface {
        self.interface
    }

    fn driver(&self) -> &'a D {
        &self.wlan.driver
    }

    fn require(&self, interface: Interface) -> Result<(), WlanError> {
        if self.interface == interface {
            Ok(())
        } else {
            Err(WlanError::InterfaceRequired(interface))
        }
    }

    /// Returns whether this interface is enabled in the operating mode.
    pub fn active(&self) -> bool {
        self.driver()
            .opmode()
            .contains(self.interface.mode_mask())
    }

    /// Enables or disables this interface, leaving the other interface as
    /// it is.
    pub fn set_active(&self, active: bool) -> Result<(), WlanError> {
        let mode = self
            .driver()
            .opmode()
            .with_interface(self.interface, active);
        debug!("Exec:  {} active {active}, mode {mode}", self.interface);
        self.driver().set_opmode(mode).map_err(|e| {
            warn!("Error: Failed to set mode {mode}: {e}");
            WlanError::failed("Cannot update i/f status")
        })
    }

    /// Connects the station to a network.  `ssid` and `password` are
    /// truncated to the driver's record sizes.
    pub fn connect(&self, ssid: &[u8], password: &[u8]) -> Result<(), WlanError> {
        self.require(Interface::Station)?;

        let config = StationConfig::new(ssid, password);
        info!("Exec:  Connecting to {}", String::from_utf8_lossy(config.ssid()));
        self.driver().set_station_config(&config).map_err(|e| {
            warn!("Error: Failed to set STA config: {e}");
            WlanError::failed("Cannot set STA config")
        })?;
        self.driver().station_connect().map_err(|e| {
            warn!("Error: Failed to connect: {e}");
            WlanError::failed("Cannot connect to AP")
        })
    }

    pub fn disconnect(&self) -> Result<(), WlanError> {
        self.require(Interface::Station)?;

        info!("Exec:  Disconnecting");
        self.driver().station_disconnect().map_err(|e| {
            warn!("Error: Failed to disconnect: {e}");
            WlanError::failed("Cannot disconnect from AP")
        })
    }

    /// Returns the station's connection status, or `None` for the access
    /// point.
    pub fn status(&self) -> Option<StationStatus> {
        match self.interface {
            Interface::Station => Some(self.driver().station_status()),
            Interface::AccessPoint => None,
        }
    }

    /// Returns whether the station has an IP address, or for the access
    /// point whether any station is connected to it.
    pub fn is_connected(&self) -> Result<bool, WlanError> {
        match self.interface {
            Interface::Station => Ok(self.driver().station_status() == StationStatus::GotIp),
            Interface::AccessPoint => self
                .driver()
                .softap_station_count()
                .map(|count| count > 0)
                .map_err(|e| {
                    warn!("Error: Failed to get AP station count: {e}");
                    WlanError::failed("can't get station count")
                }),
        }
    }

    /// Scans for networks.  See [`ScanCoordinator::scan()`].
    pub async fn scan(&self) -> Result<Vec<ScanResult>, WlanError> {
        self.wlan.scanner.scan(self.driver()).await
    }

    pub fn mac(&self) -> Result<MacAddress, WlanError> {
        self.driver().mac_address(self.interface).map_err(|e| {
            warn!("Error: Failed to get {} MAC: {e}", self.interface);
            WlanError::failed("can't get MAC address")
        })
    }

    /// Sets the interface's MAC address.  `mac` must be exactly 6 bytes.
    pub fn set_mac(&self, mac: &[u8]) -> Result<(), WlanError> {
        let mac = MacAddress::try_from(mac)
            .map_err(|_| WlanError::validation("invalid buffer length"))?;

        debug!("Exec:  Set {} MAC {mac}", self.interface);
        self.driver()
            .set_mac_address(self.interface, &mac)
            .map_err(|e| {
                warn!("Error: Failed to set {} MAC {mac}: {e}", self.interface);
                WlanError::failed("can't set MAC address")
            })
    }

    /// Returns the interface's IPv4 configuration.
    pub fn ifconfig(&self) -> Result<IfConfig, WlanError> {
        let info = self.driver().ip_info(self.interface).map_err(|e| {
            warn!("Error: Failed to get {} IP info: {e}", self.interface);
            WlanError::failed("can't get IP info")
        })?;
        Ok(IfConfig {
            ip: info.ip,
            netmask: info.netmask,
            gateway: info.gateway,
            dns: None,
        })
    }

    /// Host facing configuration call.  See [`config::config()`].
    pub fn config(
        &self,
        query: &[&str],
        updates: &[(&str, ConfigValue)],
    ) -> Result<Option<ConfigValue>, WlanError> {
        config::config(self.driver(), self.interface, query, updates)
    }

    /// Applies configuration updates.  See [`config::apply()`].
    pub fn configure(&self, updates: &[(ConfigField, ConfigValue)]) -> Result<(), WlanError> {
        config::apply(self.driver(), self.interface, updates)
    }

    /// Reads one configuration field.  See [`config::query()`].
    pub fn query(&self, field: ConfigField) -> Result<ConfigValue, WlanError> {
        config::query(self.driver(), self.interface, field)
    }
}

/// IPv4 configuration of an interface.  Addresses serialize in dotted
/// decimal form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IfConfig {
    #[serde(serialize_with = "dotted")]
    pub ip: Ipv4Addr,
    #[serde(serialize_with = "dotted")]
    pub netmask: Ipv4Addr,
    #[serde(serialize_with = "dotted")]
    pub gateway: Ipv4Addr,

    /// Always `None`, as the driver does not report a DNS server.
    #[serde(serialize_with = "dotted_or_empty")]
    pub dns: Option<Ipv4Addr>,
}

impl IfConfig {
    /// Returns the four addresses as strings, with an empty string for a
    /// missing DNS server.
    pub fn to_strings(&self) -> [String; 4] {
        use alloc::string::ToString;
        [
            self.ip.to_string(),
            self.netmask.to_string(),
            self.gateway.to_string(),
            self.dns.map(|dns| dns.to_string()).unwrap_or_default(),
        ]
    }
}

fn dotted<S: Serializer>(addr: &Ipv4Addr, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(addr)
}

fn dotted_or_empty<S: Serializer>(addr: &Option<Ipv4Addr>, serializer: S) -> Result<S::Ok, S::Error> {
    match addr {
        Some(addr) => serializer.collect_str(addr),
        None => serializer.serialize_str(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::ScanStatus;
    use crate::testing::{Call, MockRadio, ScanBehaviour, bss, leak_coordinator, station_ip};
    use crate::types::AuthMode;
    use alloc::vec;
    use embassy_futures::block_on;

    fn wlan() -> Wlan<MockRadio> {
        Wlan::new(MockRadio::new(), leak_coordinator())
    }

    #[test]
    fn interface_by_index() {
        let wlan = wlan();
        assert_eq!(wlan.wlan(None).unwrap().interface(), Interface::Station);
        assert_eq!(wlan.wlan(Some(0)).unwrap().interface(), Interface::Station);
        assert_eq!(
            wlan.wlan(Some(1)).unwrap().interface(),
            Interface::AccessPoint
        );
        assert_eq!(
            wlan.wlan(Some(2)).err(),
            Some(WlanError::validation("invalid interface index"))
        );
    }

    #[test]
    fn set_active_keeps_other_interface() {
        let wlan = wlan();
        wlan.driver().opmode.set(OpMode::STATION);

        wlan.ap().set_active(true).unwrap();
        assert_eq!(wlan.wifi_mode(), OpMode::STATION_SOFTAP);
        assert!(wlan.sta().active());
        assert!(wlan.ap().active());

        wlan.sta().set_active(false).unwrap();
        assert_eq!(wlan.wifi_mode(), OpMode::SOFTAP);
        assert!(!wlan.sta().active());
    }

    #[test]
    fn set_active_failure() {
        let wlan = wlan();
        wlan.driver().fail_writes.set(true);
        assert_eq!(
            wlan.ap().set_active(true),
            Err(WlanError::failed("Cannot update i/f status"))
        );
        assert_eq!(wlan.wifi_mode(), OpMode::STATION);
    }

    #[test]
    fn connect_writes_config_then_connects() {
        let wlan = wlan();
        wlan.sta().connect(b"home", b"hunter22").unwrap();

        let sta = wlan.driver().sta.borrow().clone();
        assert_eq!(sta.ssid(), b"home");
        assert_eq!(sta.password(), b"hunter22");
        assert!(wlan.driver().called(|c| matches!(c, Call::Connect)));
        assert_eq!(wlan.sta().status(), Some(StationStatus::Connecting));
    }

    #[test]
    fn connect_requires_station() {
        let wlan = wlan();
        assert_eq!(
            wlan.ap().connect(b"home", b""),
            Err(WlanError::InterfaceRequired(Interface::Station))
        );
        assert_eq!(
            wlan.ap().disconnect(),
            Err(WlanError::InterfaceRequired(Interface::Station))
        );
        assert!(!wlan.driver().called(|c| matches!(c, Call::SetStationConfig(_))));
    }

    #[test]
    fn connect_failure_messages() {
        let wlan = wlan();
        wlan.driver().fail_writes.set(true);
        assert_eq!(
            wlan.sta().connect(b"home", b""),
            Err(WlanError::failed("Cannot set STA config"))
        );
        assert!(!wlan.driver().called(|c| matches!(c, Call::Connect)));
        assert_eq!(
            wlan.sta().disconnect(),
            Err(WlanError::failed("Cannot disconnect from AP"))
        );
    }

    #[test]
    fn status_only_for_station() {
        let wlan = wlan();
        wlan.driver().status.set(StationStatus::WrongPassword);
        assert_eq!(wlan.sta().status(), Some(StationStatus::WrongPassword));
        assert_eq!(wlan.ap().status(), None);
    }

    #[test]
    fn is_connected() {
        let wlan = wlan();
        assert!(!wlan.sta().is_connected().unwrap());
        wlan.driver().status.set(StationStatus::GotIp);
        assert!(wlan.sta().is_connected().unwrap());

        assert!(!wlan.ap().is_connected().unwrap());
        wlan.driver().ap_stations.set(Some(2));
        assert!(wlan.ap().is_connected().unwrap());

        wlan.driver().ap_stations.set(None);
        assert!(matches!(
            wlan.ap().is_connected(),
            Err(WlanError::OperationFailed(_))
        ));
    }

    #[test]
    fn set_mac_checks_length() {
        let wlan = wlan();
        assert_eq!(
            wlan.sta().set_mac(&[1, 2, 3, 4, 5]),
            Err(WlanError::validation("invalid buffer length"))
        );
        assert!(!wlan.driver().called(|c| matches!(c, Call::SetMac(..))));

        let mac = [0x02, 0x00, 0x00, 0xab, 0xcd, 0xef];
        wlan.ap().set_mac(&mac).unwrap();
        assert!(wlan.driver().called(|c| *c == Call::SetMac(Interface::AccessPoint, MacAddress(mac))));
        assert_eq!(wlan.ap().mac().unwrap().octets(), mac);
    }

    #[test]
    fn ifconfig_has_empty_dns() {
        let wlan = wlan();
        wlan.driver().ip.set(station_ip());

        let ifconfig = wlan.sta().ifconfig().unwrap();
        assert_eq!(ifconfig.ip, Ipv4Addr::new(192, 168, 1, 42));
        assert_eq!(ifconfig.dns, None);
        assert_eq!(
            ifconfig.to_strings(),
            [
                String::from("192.168.1.42"),
                String::from("255.255.255.0"),
                String::from("192.168.1.1"),
                String::new(),
            ]
        );
        assert_eq!(
            serde_json::to_string(&ifconfig).unwrap(),
            r#"{"ip":"192.168.1.42","netmask":"255.255.255.0","gateway":"192.168.1.1","dns":""}"#
        );
    }

    #[test]
    fn scan_through_interface() {
        let wlan = wlan();
        wlan.driver().set_scan(ScanBehaviour::Immediate(
            ScanStatus::Ok,
            Some(vec![bss(b"cafe", [4; 6], 1, -67, AuthMode::Open, false)]),
        ));

        let results = block_on(wlan.sta().scan()).unwrap();
        assert_eq!(results[0].ssid_str(), Some("cafe"));
    }

    #[test]
    fn config_through_interface() {
        let wlan = wlan();
        let ap = wlan.ap();
        ap.config(&[], &[("essid", "guest".into()), ("channel", 11.into())])
            .unwrap();
        assert_eq!(
            ap.config(&["channel"], &[]).unwrap(),
            Some(ConfigValue::Int(11))
        );
        assert_eq!(ap.query(ConfigField::Essid).unwrap(), ConfigValue::from("guest"));

        assert_eq!(
            wlan.sta().configure(&[(ConfigField::Essid, "x".into())]),
            Err(WlanError::InterfaceRequired(Interface::AccessPoint))
        );
    }

    #[test]
    fn modes() {
        let wlan = wlan();
        wlan.set_wifi_mode(OpMode::STATION_SOFTAP).unwrap();
        assert_eq!(wlan.wifi_mode(), OpMode::STATION_SOFTAP);

        wlan.set_phy_mode(PhyMode::Mode11g).unwrap();
        assert_eq!(wlan.phy_mode(), PhyMode::Mode11g);
        assert!(wlan.driver().called(|c| *c == Call::SetPhyMode(PhyMode::Mode11g)));
    }
}
