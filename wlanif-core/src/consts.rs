// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! wlanif-core - Constants shared with the radio driver and exposed to the
//! host runtime.
//!
//! These values must match the driver's own enumerations bit for bit.
//! [`CONSTANTS`] lists them by the name the host registers them under.

/// Interface identifiers
pub const STA_IF: u8 = 0;
pub const AP_IF: u8 = 1;

/// Operating mode bits
pub const NULL_MODE: u8 = 0x00;
pub const STATION_MODE: u8 = 0x01;
pub const SOFTAP_MODE: u8 = 0x02;
pub const STATIONAP_MODE: u8 = STATION_MODE | SOFTAP_MODE;

/// Station connection status codes
pub const STAT_IDLE: u8 = 0;
pub const STAT_CONNECTING: u8 = 1;
pub const STAT_WRONG_PASSWORD: u8 = 2;
pub const STAT_NO_AP_FOUND: u8 = 3;
pub const STAT_CONNECT_FAIL: u8 = 4;
pub const STAT_GOT_IP: u8 = 5;

/// PHY modes
pub const MODE_11B: u8 = 1;
pub const MODE_11G: u8 = 2;
pub const MODE_11N: u8 = 3;

/// Authentication modes
pub const AUTH_OPEN: u8 = 0;
pub const AUTH_WEP: u8 = 1;
pub const AUTH_WPA_PSK: u8 = 2;
pub const AUTH_WPA2_PSK: u8 = 3;
pub const AUTH_WPA_WPA2_PSK: u8 = 4;

/// Capacity of the SSID field of station and soft-AP configuration records
pub const SSID_LEN: usize = 32;

/// Capacity of the password field of station and soft-AP configuration
/// records, including the NUL terminator.
pub const PASSWORD_LEN: usize = 64;

/// Length of a hardware (MAC) address
pub const MAC_LEN: usize = 6;

/// Constant table registered with the host runtime, as (name, value) pairs.
pub const CONSTANTS: &[(&str, u8)] = &[
    ("STA_IF", STA_IF),
    ("AP_IF", AP_IF),
    ("STAT_IDLE", STAT_IDLE),
    ("STAT_CONNECTING", STAT_CONNECTING),
    ("STAT_WRONG_PASSWORD", STAT_WRONG_PASSWORD),
    ("STAT_NO_AP_FOUND", STAT_NO_AP_FOUND),
    ("STAT_CONNECT_FAIL", STAT_CONNECT_FAIL),
    ("STAT_GOT_IP", STAT_GOT_IP),
    ("MODE_11B", MODE_11B),
    ("MODE_11G", MODE_11G),
    ("MODE_11N", MODE_11N),
    ("AUTH_OPEN", AUTH_OPEN),
    ("AUTH_WEP", AUTH_WEP),
    ("AUTH_WPA_PSK", AUTH_WPA_PSK),
    ("AUTH_WPA2_PSK", AUTH_WPA2_PSK),
    ("AUTH_WPA_WPA2_PSK", AUTH_WPA_WPA2_PSK),
];

/// Looks up a constant by the name it is registered under.
pub fn constant(name: &str) -> Option<u8> {
    CONSTANTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, value)| *value)
}
