// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! wlanif-core - Interface, mode and status types

use core::fmt;
use serde::Serialize;

use crate::consts::*;

/// One of the radio's two logical interfaces.  The discriminant is the
/// driver's own interface identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Interface {
    /// Station (client) interface
    #[serde(rename = "sta")]
    Station = STA_IF,

    /// Soft access point interface
    #[serde(rename = "ap")]
    AccessPoint = AP_IF,
}

impl Interface {
    /// Both interfaces, indexed by their identifier.
    pub const ALL: [Interface; 2] = [Interface::Station, Interface::AccessPoint];

    /// Returns the driver's identifier for this interface.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Converts a driver interface identifier into an `Interface`.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    /// The operating mode bit which enables this interface.
    pub fn mode_mask(self) -> OpMode {
        match self {
            Interface::Station => OpMode::STATION,
            Interface::AccessPoint => OpMode::SOFTAP,
        }
    }

    /// Short name, as used in "STA required" / "AP required" errors.
    pub fn as_str(self) -> &'static str {
        match self {
            Interface::Station => "STA",
            Interface::AccessPoint => "AP",
        }
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Radio operating mode, a bitmask of the enabled interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct OpMode(u8);

impl OpMode {
    pub const NULL: OpMode = OpMode(NULL_MODE);
    pub const STATION: OpMode = OpMode(STATION_MODE);
    pub const SOFTAP: OpMode = OpMode(SOFTAP_MODE);
    pub const STATION_SOFTAP: OpMode = OpMode(STATIONAP_MODE);

    /// Creates an `OpMode` from the driver's raw value.  Bits other than
    /// the station and soft-AP bits are preserved, so the value round trips
    /// unchanged.
    pub const fn from_bits(bits: u8) -> Self {
        OpMode(bits)
    }

    /// Returns the raw driver value.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns whether every bit of `other` is set in `self`.
    pub const fn contains(self, other: OpMode) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns whether the station interface is enabled.
    pub fn is_station(self) -> bool {
        self.contains(OpMode::STATION)
    }

    /// Returns whether the soft-AP interface is enabled.
    pub fn is_softap(self) -> bool {
        self.contains(OpMode::SOFTAP)
    }

    /// Returns `self` with the interface's bit set or cleared.
    #[must_use]
    pub fn with_interface(self, interface: Interface, enabled: bool) -> Self {
        let mask = interface.mode_mask().0;
        if enabled {
            OpMode(self.0 | mask)
        } else {
            OpMode(self.0 & !mask)
        }
    }
}

impl fmt::Display for OpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            OpMode::NULL => write!(f, "Null"),
            OpMode::STATION => write!(f, "Sta"),
            OpMode::SOFTAP => write!(f, "Ap"),
            OpMode::STATION_SOFTAP => write!(f, "ApSta"),
            OpMode(other) => write!(f, "Unknown({other:#04x})"),
        }
    }
}

/// Station connection status, as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum StationStatus {
    Idle = STAT_IDLE,
    Connecting = STAT_CONNECTING,
    WrongPassword = STAT_WRONG_PASSWORD,
    NoApFound = STAT_NO_AP_FOUND,
    ConnectFail = STAT_CONNECT_FAIL,
    GotIp = STAT_GOT_IP,
}

impl StationStatus {
    /// Converts a raw driver status code.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            STAT_IDLE => Some(Self::Idle),
            STAT_CONNECTING => Some(Self::Connecting),
            STAT_WRONG_PASSWORD => Some(Self::WrongPassword),
            STAT_NO_AP_FOUND => Some(Self::NoApFound),
            STAT_CONNECT_FAIL => Some(Self::ConnectFail),
            STAT_GOT_IP => Some(Self::GotIp),
            _ => None,
        }
    }

    pub fn raw(self) -> u8 {
        self as u8
    }
}

/// 802.11 PHY mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum PhyMode {
    Mode11b = MODE_11B,
    Mode11g = MODE_11G,
    Mode11n = MODE_11N,
}

impl PhyMode {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            MODE_11B => Some(Self::Mode11b),
            MODE_11G => Some(Self::Mode11g),
            MODE_11N => Some(Self::Mode11n),
            _ => None,
        }
    }

    pub fn raw(self) -> u8 {
        self as u8
    }
}

/// Authentication/encryption scheme.
///
/// Scan results and soft-AP configuration carry the driver's raw value, as
/// the driver may report schemes outside this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum AuthMode {
    Open = AUTH_OPEN,
    Wep = AUTH_WEP,
    WpaPsk = AUTH_WPA_PSK,
    Wpa2Psk = AUTH_WPA2_PSK,
    WpaWpa2Psk = AUTH_WPA_WPA2_PSK,
}

impl AuthMode {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            AUTH_OPEN => Some(Self::Open),
            AUTH_WEP => Some(Self::Wep),
            AUTH_WPA_PSK => Some(Self::WpaPsk),
            AUTH_WPA2_PSK => Some(Self::Wpa2Psk),
            AUTH_WPA_WPA2_PSK => Some(Self::WpaWpa2Psk),
            _ => None,
        }
    }

    pub fn raw(self) -> u8 {
        self as u8
    }
}

/// Hardware (MAC) address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct MacAddress(pub [u8; MAC_LEN]);

impl MacAddress {
    pub fn octets(&self) -> [u8; MAC_LEN] {
        self.0
    }
}

impl TryFrom<&[u8]> for MacAddress {
    type Error = ();

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        <[u8; MAC_LEN]>::try_from(value)
            .map(MacAddress)
            .map_err(|_| ())
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}
