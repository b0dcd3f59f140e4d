// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! wlanif-core - Interface configuration records and the configuration
//! accessor.
//!
//! The driver stores each interface's configuration as a fixed size record.
//! [`InterfaceConfig`] holds whichever record belongs to the interface being
//! configured, so a field can only ever be written to the record of the
//! interface kind it belongs to.
//!
//! Named fields are dispatched through a static table mapping each
//! [`ConfigField`] to the interface it requires and its accessors.  The
//! interface requirement is checked once, after every field of a request
//! has been processed, and before anything is written back to the driver.

use alloc::string::String;
use alloc::vec::Vec;
use core::str::FromStr;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use serde::Serialize;
use static_assertions::const_assert;
use strum::{EnumIter, IntoStaticStr};

use crate::WlanError;
use crate::consts::{MAC_LEN, PASSWORD_LEN, SSID_LEN};
use crate::driver::RadioDriver;
use crate::types::Interface;

const_assert!(SSID_LEN <= u8::MAX as usize);
const_assert!(PASSWORD_LEN > 1);

/// Station configuration record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationConfig {
    /// NUL padded SSID
    pub ssid: [u8; SSID_LEN],

    /// NUL terminated password
    pub password: [u8; PASSWORD_LEN],

    /// Whether to only connect to the access point with `bssid`
    pub bssid_set: bool,

    pub bssid: [u8; MAC_LEN],
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            ssid: [0; SSID_LEN],
            password: [0; PASSWORD_LEN],
            bssid_set: false,
            bssid: [0; MAC_LEN],
        }
    }
}

impl StationConfig {
    /// Creates a record for connecting to `ssid`.  Both values are silently
    /// truncated to the record's capacity.
    pub fn new(ssid: &[u8], password: &[u8]) -> Self {
        let mut config = Self::default();
        copy_truncated(&mut config.ssid, ssid);
        copy_truncated(&mut config.password, password);
        config
    }

    /// Returns the SSID bytes before the first NUL.
    pub fn ssid(&self) -> &[u8] {
        until_nul(&self.ssid)
    }

    /// Returns the password bytes before the first NUL.
    pub fn password(&self) -> &[u8] {
        until_nul(&self.password)
    }
}

/// Soft access point configuration record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftApConfig {
    /// SSID.  Only the first `ssid_len` bytes are significant.
    pub ssid: [u8; SSID_LEN],

    /// NUL terminated password
    pub password: [u8; PASSWORD_LEN],

    pub ssid_len: u8,

    pub channel: u8,

    /// Raw driver authentication mode
    pub authmode: u8,

    pub ssid_hidden: bool,

    pub max_connection: u8,

    pub beacon_interval: u16,
}

impl Default for SoftApConfig {
    fn default() -> Self {
        Self {
            ssid: [0; SSID_LEN],
            password: [0; PASSWORD_LEN],
            ssid_len: 0,
            channel: 1,
            authmode: crate::consts::AUTH_OPEN,
            ssid_hidden: false,
            max_connection: 4,
            beacon_interval: 100,
        }
    }
}

impl SoftApConfig {
    /// Returns the significant SSID bytes.
    pub fn ssid(&self) -> &[u8] {
        &self.ssid[..(self.ssid_len as usize).min(SSID_LEN)]
    }

    /// Overwrites the SSID, truncating it to [`SSID_LEN`] bytes, and sets
    /// `ssid_len`.  Bytes of the previous SSID beyond the new length are
    /// left in place, as only `ssid_len` bytes are significant.
    pub fn set_ssid(&mut self, ssid: &[u8]) {
        let len = ssid.len().min(SSID_LEN);
        self.ssid[..len].copy_from_slice(&ssid[..len]);
        self.ssid_len = len as u8;
    }

    /// Returns the password bytes before the first NUL.
    pub fn password(&self) -> &[u8] {
        until_nul(&self.password)
    }

    /// Overwrites the password, truncating it so it and its NUL terminator
    /// fit the record.
    pub fn set_password(&mut self, password: &[u8]) {
        let len = password.len().min(PASSWORD_LEN - 1);
        self.password[..len].copy_from_slice(&password[..len]);
        self.password[len] = 0;
    }
}

/// Configuration record of one interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceConfig {
    Station(StationConfig),
    AccessPoint(SoftApConfig),
}

impl InterfaceConfig {
    /// Returns the interface this record belongs to.
    pub fn interface(&self) -> Interface {
        match self {
            InterfaceConfig::Station(_) => Interface::Station,
            InterfaceConfig::AccessPoint(_) => Interface::AccessPoint,
        }
    }

    /// Reads the record for `interface` from the driver.
    pub fn load<D: RadioDriver + ?Sized>(driver: &D, interface: Interface) -> Result<Self, WlanError> {
        match interface {
            Interface::Station => driver
                .station_config()
                .map(InterfaceConfig::Station)
                .map_err(|e| {
                    warn!("Error: Failed to get STA config: {e}");
                    WlanError::failed("can't get STA config")
                }),
            Interface::AccessPoint => driver
                .softap_config()
                .map(InterfaceConfig::AccessPoint)
                .map_err(|e| {
                    warn!("Error: Failed to get AP config: {e}");
                    WlanError::failed("can't get AP config")
                }),
        }
    }

    /// Writes the record back to the driver.
    pub fn store<D: RadioDriver + ?Sized>(&self, driver: &D) -> Result<(), WlanError> {
        match self {
            InterfaceConfig::Station(sta) => driver.set_station_config(sta).map_err(|e| {
                warn!("Error: Failed to set STA config: {e}");
                WlanError::failed("can't set STA config")
            }),
            InterfaceConfig::AccessPoint(ap) => driver.set_softap_config(ap).map_err(|e| {
                warn!("Error: Failed to set AP config: {e}");
                WlanError::failed("can't set AP config")
            }),
        }
    }

    fn as_softap_mut(&mut self) -> Option<&mut SoftApConfig> {
        match self {
            InterfaceConfig::AccessPoint(ap) => Some(ap),
            InterfaceConfig::Station(_) => None,
        }
    }

    fn as_softap(&self) -> Option<&SoftApConfig> {
        match self {
            InterfaceConfig::AccessPoint(ap) => Some(ap),
            InterfaceConfig::Station(_) => None,
        }
    }
}

/// Value of a configuration field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Str(String),
    Bytes(Vec<u8>),
    Bool(bool),
    Int(i32),
}

impl ConfigValue {
    // String-like values, as bytes
    fn as_bytes(&self) -> Result<&[u8], WlanError> {
        match self {
            ConfigValue::Str(s) => Ok(s.as_bytes()),
            ConfigValue::Bytes(b) => Ok(b),
            _ => Err(WlanError::type_conflict("expected a string")),
        }
    }

    fn as_int(&self) -> Result<i32, WlanError> {
        match self {
            ConfigValue::Int(i) => Ok(*i),
            ConfigValue::Bool(b) => Ok(*b as i32),
            _ => Err(WlanError::type_conflict("expected an integer")),
        }
    }

    fn as_u8(&self) -> Result<u8, WlanError> {
        u8::try_from(self.as_int()?).map_err(|_| WlanError::validation("value out of range"))
    }

    /// Returns the value's truthiness: false, 0 and empty strings are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            ConfigValue::Str(s) => !s.is_empty(),
            ConfigValue::Bytes(b) => !b.is_empty(),
            ConfigValue::Bool(b) => *b,
            ConfigValue::Int(i) => *i != 0,
        }
    }

    /// Returns raw bytes as a string value where they are valid UTF-8.
    fn from_bytes(bytes: &[u8]) -> Self {
        match core::str::from_utf8(bytes) {
            Ok(s) => ConfigValue::Str(String::from(s)),
            Err(_) => ConfigValue::Bytes(Vec::from(bytes)),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(String::from(value))
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

/// Named configuration fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ConfigField {
    Essid,
    Hidden,
    Authmode,
    Password,
    Channel,
}

impl ConfigField {
    /// Returns the field's name, as used by the host.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Returns the interface this field belongs to.
    pub fn required_interface(self) -> Interface {
        self.entry().required
    }

    fn entry(self) -> &'static FieldEntry {
        // FIELDS has one entry per field, in declaration order
        &FIELDS[self as usize]
    }
}

impl FromStr for ConfigField {
    type Err = WlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FIELDS
            .iter()
            .find(|entry| entry.field.name() == s)
            .map(|entry| entry.field)
            .ok_or_else(|| WlanError::validation("unknown config param"))
    }
}

type Getter = fn(&InterfaceConfig) -> Option<ConfigValue>;
type Setter = fn(&mut InterfaceConfig, &ConfigValue) -> Result<(), WlanError>;

// Dispatch table entry.  Getters/setters return None/do nothing if the
// record is of the wrong interface kind, which the caller reports via the
// interface requirement check.
struct FieldEntry {
    field: ConfigField,
    required: Interface,
    // None for write-only fields
    get: Option<Getter>,
    set: Setter,
}

static FIELDS: [FieldEntry; 5] = [
    FieldEntry {
        field: ConfigField::Essid,
        required: Interface::AccessPoint,
        get: Some(get_essid),
        set: set_essid,
    },
    FieldEntry {
        field: ConfigField::Hidden,
        required: Interface::AccessPoint,
        get: Some(get_hidden),
        set: set_hidden,
    },
    FieldEntry {
        field: ConfigField::Authmode,
        required: Interface::AccessPoint,
        get: Some(get_authmode),
        set: set_authmode,
    },
    FieldEntry {
        field: ConfigField::Password,
        required: Interface::AccessPoint,
        get: None,
        set: set_password,
    },
    FieldEntry {
        field: ConfigField::Channel,
        required: Interface::AccessPoint,
        get: Some(get_channel),
        set: set_channel,
    },
];

fn get_essid(cfg: &InterfaceConfig) -> Option<ConfigValue> {
    cfg.as_softap().map(|ap| ConfigValue::from_bytes(ap.ssid()))
}

fn set_essid(cfg: &mut InterfaceConfig, value: &ConfigValue) -> Result<(), WlanError> {
    let ssid = value.as_bytes()?;
    if let Some(ap) = cfg.as_softap_mut() {
        ap.set_ssid(ssid);
    }
    Ok(())
}

fn get_hidden(cfg: &InterfaceConfig) -> Option<ConfigValue> {
    cfg.as_softap().map(|ap| ConfigValue::Bool(ap.ssid_hidden))
}

fn set_hidden(cfg: &mut InterfaceConfig, value: &ConfigValue) -> Result<(), WlanError> {
    if let Some(ap) = cfg.as_softap_mut() {
        ap.ssid_hidden = value.is_truthy();
    }
    Ok(())
}

fn get_authmode(cfg: &InterfaceConfig) -> Option<ConfigValue> {
    cfg.as_softap().map(|ap| ConfigValue::Int(ap.authmode as i32))
}

fn set_authmode(cfg: &mut InterfaceConfig, value: &ConfigValue) -> Result<(), WlanError> {
    let authmode = value.as_u8()?;
    if let Some(ap) = cfg.as_softap_mut() {
        ap.authmode = authmode;
    }
    Ok(())
}

fn set_password(cfg: &mut InterfaceConfig, value: &ConfigValue) -> Result<(), WlanError> {
    let password = value.as_bytes()?;
    if let Some(ap) = cfg.as_softap_mut() {
        ap.set_password(password);
    }
    Ok(())
}

fn get_channel(cfg: &InterfaceConfig) -> Option<ConfigValue> {
    cfg.as_softap().map(|ap| ConfigValue::Int(ap.channel as i32))
}

fn set_channel(cfg: &mut InterfaceConfig, value: &ConfigValue) -> Result<(), WlanError> {
    let channel = value.as_u8()?;
    if let Some(ap) = cfg.as_softap_mut() {
        ap.channel = channel;
    }
    Ok(())
}

// Fails unless `interface` satisfies the requirement recorded while
// processing a request.
fn require(interface: Interface, required: Option<Interface>) -> Result<(), WlanError> {
    match required {
        Some(required) if required != interface => {
            debug!("Info:  {required} required, called on {interface}");
            Err(WlanError::InterfaceRequired(required))
        }
        _ => Ok(()),
    }
}

/// Applies `updates` to the configuration of `interface` and writes it back
/// to the driver.
///
/// The record is read from the driver, every update is applied to a working
/// copy, then the interface requirement of the fields is checked.  The
/// driver is only written if every update was valid and the requirement is
/// met.
///
/// Returns:
/// - `Err(WlanError::Validation)` for an unknown field, or an integer which
///   does not fit the field.
/// - `Err(WlanError::TypeConflict)` for a value of the wrong type.
/// - `Err(WlanError::InterfaceRequired)` if a field belongs to the other
///   interface.
/// - `Err(WlanError::OperationFailed)` if the driver read or write fails.
pub fn apply<D: RadioDriver + ?Sized>(
    driver: &D,
    interface: Interface,
    updates: &[(ConfigField, ConfigValue)],
) -> Result<(), WlanError> {
    let config = InterfaceConfig::load(driver, interface)?;
    apply_loaded(driver, interface, config, updates)
}

// Applies `updates` to `config`, already read from the driver.
fn apply_loaded<D: RadioDriver + ?Sized>(
    driver: &D,
    interface: Interface,
    mut config: InterfaceConfig,
    updates: &[(ConfigField, ConfigValue)],
) -> Result<(), WlanError> {
    let mut required = None;
    for (field, value) in updates {
        let entry = field.entry();
        required = Some(entry.required);
        (entry.set)(&mut config, value)?;
    }

    require(interface, required)?;

    debug!("Exec:  Writing {interface} config, {} fields", updates.len());
    config.store(driver)
}

/// Reads a single field of the configuration of `interface`.
///
/// Returns:
/// - `Err(WlanError::Validation)` if the field cannot be queried.
/// - `Err(WlanError::InterfaceRequired)` if the field belongs to the other
///   interface.
/// - `Err(WlanError::OperationFailed)` if the driver read fails.
pub fn query<D: RadioDriver + ?Sized>(
    driver: &D,
    interface: Interface,
    field: ConfigField,
) -> Result<ConfigValue, WlanError> {
    let config = InterfaceConfig::load(driver, interface)?;
    query_loaded(&config, interface, field)
}

fn query_loaded(
    config: &InterfaceConfig,
    interface: Interface,
    field: ConfigField,
) -> Result<ConfigValue, WlanError> {
    let entry = field.entry();
    let get = entry
        .get
        .ok_or_else(|| WlanError::validation("unknown config param"))?;

    require(interface, Some(entry.required))?;

    get(config).ok_or(WlanError::InterfaceRequired(entry.required))
}

/// Host facing configuration call, taking field names rather than
/// [`ConfigField`]s.
///
/// Exactly one of `query` and `updates` may be used:
/// - With `updates`, applies them and returns `Ok(None)`.
/// - With a single `query` name, returns `Ok(Some(value))`.
///
/// Returns `Err(WlanError::TypeConflict)` if both are given, or if `query`
/// does not contain exactly one name when `updates` is empty.
pub fn config<D: RadioDriver + ?Sized>(
    driver: &D,
    interface: Interface,
    query: &[&str],
    updates: &[(&str, ConfigValue)],
) -> Result<Option<ConfigValue>, WlanError> {
    if !query.is_empty() && !updates.is_empty() {
        return Err(WlanError::type_conflict("either pos or kw args are allowed"));
    }

    if updates.is_empty() && query.len() != 1 {
        return Err(WlanError::type_conflict("can query only one param"));
    }

    // The record is read before any name is resolved, so a failing driver
    // read is reported ahead of an unknown param.
    let config = InterfaceConfig::load(driver, interface)?;

    if !updates.is_empty() {
        let updates = updates
            .iter()
            .map(|(name, value)| -> Result<_, WlanError> {
                Ok((name.parse::<ConfigField>()?, value.clone()))
            })
            .collect::<Result<Vec<_>, WlanError>>()?;
        return apply_loaded(driver, interface, config, &updates).map(|()| None);
    }

    let field = query[0].parse::<ConfigField>()?;
    query_loaded(&config, interface, field).map(Some)
}

// Copies as much of `src` as fits into `dst`.  The rest of `dst` is left
// untouched.
fn copy_truncated(dst: &mut [u8], src: &[u8]) -> usize {
    let len = src.len().min(dst.len());
    dst[..len].copy_from_slice(&src[..len]);
    len
}

fn until_nul(buf: &[u8]) -> &[u8] {
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    &buf[..len]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MockRadio};
    use strum::IntoEnumIterator;

    #[test]
    fn field_table_matches_declaration_order() {
        for field in ConfigField::iter() {
            assert_eq!(field.entry().field, field);
            assert_eq!(field.name().parse::<ConfigField>().unwrap(), field);
        }
        assert_eq!(ConfigField::Authmode.name(), "authmode");
    }

    #[test]
    fn all_writable_fields_require_ap() {
        for field in ConfigField::iter() {
            assert_eq!(field.required_interface(), Interface::AccessPoint);
        }
    }

    #[test]
    fn apply_then_query_channel() {
        let radio = MockRadio::new();
        apply(
            &radio,
            Interface::AccessPoint,
            &[
                (ConfigField::Essid, "guest".into()),
                (ConfigField::Channel, 11.into()),
            ],
        )
        .unwrap();

        let channel = query(&radio, Interface::AccessPoint, ConfigField::Channel).unwrap();
        assert_eq!(channel, ConfigValue::Int(11));
        let essid = query(&radio, Interface::AccessPoint, ConfigField::Essid).unwrap();
        assert_eq!(essid, ConfigValue::Str("guest".into()));
        assert_eq!(radio.ap.borrow().ssid_len, 5);
    }

    #[test]
    fn ap_field_on_station_is_rejected_without_write() {
        let radio = MockRadio::new();
        let before = radio.sta.borrow().clone();

        let err = apply(&radio, Interface::Station, &[(ConfigField::Essid, "x".into())]);
        assert_eq!(err, Err(WlanError::InterfaceRequired(Interface::AccessPoint)));
        assert_eq!(alloc::format!("{}", err.unwrap_err()), "AP required");
        assert!(!radio.called(|c| matches!(c, Call::SetStationConfig(_))));
        assert!(!radio.called(|c| matches!(c, Call::SetSoftApConfig(_))));
        assert_eq!(*radio.sta.borrow(), before);
    }

    #[test]
    fn requirement_checked_after_all_fields() {
        let radio = MockRadio::new();
        // A bad value in a later field is reported before the requirement
        let err = apply(
            &radio,
            Interface::Station,
            &[
                (ConfigField::Essid, "x".into()),
                (ConfigField::Channel, ConfigValue::Str("six".into())),
            ],
        );
        assert!(matches!(err, Err(WlanError::TypeConflict(_))));
        assert!(!radio.called(|c| matches!(c, Call::SetStationConfig(_))));
    }

    #[test]
    fn query_ap_field_on_station_is_rejected() {
        let radio = MockRadio::new();
        let err = query(&radio, Interface::Station, ConfigField::Channel);
        assert_eq!(err, Err(WlanError::InterfaceRequired(Interface::AccessPoint)));
    }

    #[test]
    fn password_is_write_only() {
        let radio = MockRadio::new();
        apply(
            &radio,
            Interface::AccessPoint,
            &[(ConfigField::Password, "secret123".into())],
        )
        .unwrap();
        assert_eq!(radio.ap.borrow().password(), b"secret123");

        let err = query(&radio, Interface::AccessPoint, ConfigField::Password);
        assert_eq!(err, Err(WlanError::Validation("unknown config param".into())));
    }

    #[test]
    fn overlength_strings_are_truncated() {
        let radio = MockRadio::new();
        let long_ssid = [b's'; 40];
        let long_password = [b'p'; 80];
        apply(
            &radio,
            Interface::AccessPoint,
            &[
                (ConfigField::Essid, ConfigValue::Bytes(long_ssid.to_vec())),
                (ConfigField::Password, ConfigValue::Bytes(long_password.to_vec())),
            ],
        )
        .unwrap();

        let ap = radio.ap.borrow();
        assert_eq!(ap.ssid(), &long_ssid[..SSID_LEN]);
        assert_eq!(ap.ssid_len as usize, SSID_LEN);
        assert_eq!(ap.password(), &long_password[..PASSWORD_LEN - 1]);
    }

    #[test]
    fn shorter_ssid_uses_ssid_len() {
        let mut ap = SoftApConfig::default();
        ap.set_ssid(b"longer-name");
        ap.set_ssid(b"short");
        assert_eq!(ap.ssid(), b"short");
    }

    #[test]
    fn empty_essid_replaces_previous() {
        let radio = MockRadio::new();
        apply(&radio, Interface::AccessPoint, &[(ConfigField::Essid, "guest".into())]).unwrap();
        apply(&radio, Interface::AccessPoint, &[(ConfigField::Essid, "".into())]).unwrap();

        let essid = query(&radio, Interface::AccessPoint, ConfigField::Essid).unwrap();
        assert_eq!(essid, ConfigValue::Str("".into()));
        assert_eq!(radio.ap.borrow().ssid_len, 0);
        assert!(radio.ap.borrow().ssid().is_empty());
    }

    #[test]
    fn hidden_and_authmode() {
        let radio = MockRadio::new();
        apply(
            &radio,
            Interface::AccessPoint,
            &[
                (ConfigField::Hidden, 1.into()),
                (ConfigField::Authmode, (crate::consts::AUTH_WPA2_PSK as i32).into()),
            ],
        )
        .unwrap();
        assert_eq!(
            query(&radio, Interface::AccessPoint, ConfigField::Hidden).unwrap(),
            ConfigValue::Bool(true)
        );
        assert_eq!(
            query(&radio, Interface::AccessPoint, ConfigField::Authmode).unwrap(),
            ConfigValue::Int(3)
        );
    }

    #[test]
    fn out_of_range_channel_is_rejected() {
        let radio = MockRadio::new();
        let err = apply(&radio, Interface::AccessPoint, &[(ConfigField::Channel, 300.into())]);
        assert_eq!(err, Err(WlanError::Validation("value out of range".into())));
        assert!(!radio.called(|c| matches!(c, Call::SetSoftApConfig(_))));
    }

    #[test]
    fn query_is_idempotent() {
        let radio = MockRadio::new();
        let first = query(&radio, Interface::AccessPoint, ConfigField::Essid).unwrap();
        let second = query(&radio, Interface::AccessPoint, ConfigField::Essid).unwrap();
        assert_eq!(first, second);
        assert!(!radio.called(|c| matches!(c, Call::SetSoftApConfig(_))));
    }

    #[test]
    fn named_config_rejects_mixed_and_multiple() {
        let radio = MockRadio::new();
        let err = config(&radio, Interface::AccessPoint, &["channel"], &[("channel", 1.into())]);
        assert_eq!(
            err,
            Err(WlanError::TypeConflict("either pos or kw args are allowed".into()))
        );

        let err = config(&radio, Interface::AccessPoint, &["channel", "essid"], &[]);
        assert_eq!(
            err,
            Err(WlanError::TypeConflict("can query only one param".into()))
        );

        let err = config(&radio, Interface::AccessPoint, &[], &[]);
        assert!(matches!(err, Err(WlanError::TypeConflict(_))));
    }

    #[test]
    fn named_config_unknown_param() {
        let radio = MockRadio::new();
        let err = config(&radio, Interface::AccessPoint, &[], &[("txpower", 20.into())]);
        assert_eq!(err, Err(WlanError::Validation("unknown config param".into())));
        assert!(!radio.called(|c| matches!(c, Call::SetSoftApConfig(_))));

        let err = config(&radio, Interface::AccessPoint, &["txpower"], &[]);
        assert_eq!(err, Err(WlanError::Validation("unknown config param".into())));
    }

    #[test]
    fn named_config_round_trip() {
        let radio = MockRadio::new();
        let none = config(
            &radio,
            Interface::AccessPoint,
            &[],
            &[("essid", "guest".into()), ("channel", 11.into())],
        )
        .unwrap();
        assert_eq!(none, None);

        let channel = config(&radio, Interface::AccessPoint, &["channel"], &[]).unwrap();
        assert_eq!(channel, Some(ConfigValue::Int(11)));
    }

    #[test]
    fn driver_read_failure() {
        let radio = MockRadio::new();
        radio.fail_reads.set(true);
        let err = query(&radio, Interface::AccessPoint, ConfigField::Channel);
        assert_eq!(err, Err(WlanError::OperationFailed("can't get AP config".into())));
    }

    #[test]
    fn named_config_reads_before_resolving_names() {
        let radio = MockRadio::new();
        radio.fail_reads.set(true);
        let err = config(&radio, Interface::AccessPoint, &[], &[("txpower", 20.into())]);
        assert_eq!(err, Err(WlanError::OperationFailed("can't get AP config".into())));

        let err = config(&radio, Interface::AccessPoint, &["txpower"], &[]);
        assert_eq!(err, Err(WlanError::OperationFailed("can't get AP config".into())));
    }

    #[test]
    fn driver_write_failure() {
        let radio = MockRadio::new();
        radio.fail_writes.set(true);
        let err = apply(&radio, Interface::AccessPoint, &[(ConfigField::Channel, 3.into())]);
        assert_eq!(err, Err(WlanError::OperationFailed("can't set AP config".into())));
    }

    #[test]
    fn station_record_helpers() {
        let sta = StationConfig::new(b"home", b"hunter22");
        assert_eq!(sta.ssid(), b"home");
        assert_eq!(sta.password(), b"hunter22");
        assert!(!sta.bssid_set);
    }
}
