// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! wlanif-core - Test radio driver

extern crate std;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::net::Ipv4Addr;
use std::time::Duration;

use crate::config::{SoftApConfig, StationConfig};
use crate::consts::{MAC_LEN, SSID_LEN};
use crate::driver::{BssInfo, DriverError, IpInfo, RadioDriver, ScanStatus};
use crate::scan::{ScanCoordinator, ScanDone};
use crate::types::{AuthMode, Interface, MacAddress, OpMode, PhyMode, StationStatus};

/// Driver calls with side effects, recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    SetOpmode(OpMode),
    SetPhyMode(PhyMode),
    SetStationConfig(StationConfig),
    SetSoftApConfig(SoftApConfig),
    Connect,
    Disconnect,
    StartScan,
    SetMac(Interface, MacAddress),
}

/// How the mock completes scans.
#[derive(Debug, Clone)]
pub(crate) enum ScanBehaviour {
    /// Complete from within `start_scan()`
    Immediate(ScanStatus, Option<Vec<BssInfo>>),

    /// Hold the handle until the test completes it
    Deferred,

    /// Complete from another thread, after a short delay
    Threaded(ScanStatus, Option<Vec<BssInfo>>),

    /// Refuse to start the scan
    Refuse,
}

pub(crate) struct MockRadio {
    pub opmode: Cell<OpMode>,
    pub phy_mode: Cell<PhyMode>,
    pub sta: RefCell<StationConfig>,
    pub ap: RefCell<SoftApConfig>,
    pub status: Cell<StationStatus>,
    pub ap_stations: Cell<Option<u8>>,
    pub macs: RefCell<[MacAddress; 2]>,
    pub ip: Cell<IpInfo>,
    pub fail_reads: Cell<bool>,
    pub fail_writes: Cell<bool>,
    scan: RefCell<ScanBehaviour>,
    pending: RefCell<Option<ScanDone>>,
    calls: RefCell<Vec<Call>>,
}

impl MockRadio {
    pub fn new() -> Self {
        let mut ap = SoftApConfig::default();
        ap.set_ssid(b"wlanif-ap");
        Self {
            opmode: Cell::new(OpMode::STATION),
            phy_mode: Cell::new(PhyMode::Mode11n),
            sta: RefCell::new(StationConfig::default()),
            ap: RefCell::new(ap),
            status: Cell::new(StationStatus::Idle),
            ap_stations: Cell::new(Some(0)),
            macs: RefCell::new([
                MacAddress([0x5c, 0xcf, 0x7f, 0x00, 0x00, 0x01]),
                MacAddress([0x5e, 0xcf, 0x7f, 0x00, 0x00, 0x01]),
            ]),
            ip: Cell::new(IpInfo::default()),
            fail_reads: Cell::new(false),
            fail_writes: Cell::new(false),
            scan: RefCell::new(ScanBehaviour::Immediate(ScanStatus::Ok, Some(Vec::new()))),
            pending: RefCell::new(None),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn set_scan(&self, behaviour: ScanBehaviour) {
        *self.scan.borrow_mut() = behaviour;
    }

    pub fn has_pending_scan(&self) -> bool {
        self.pending.borrow().is_some()
    }

    pub fn take_pending(&self) -> Option<ScanDone> {
        self.pending.borrow_mut().take()
    }

    pub fn complete_pending(&self, status: ScanStatus, bss: Option<Vec<BssInfo>>) {
        let done = self.take_pending().expect("no pending scan");
        done.complete(status, bss.as_deref());
    }

    pub fn called(&self, pred: impl Fn(&Call) -> bool) -> bool {
        self.calls.borrow().iter().any(pred)
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn write(&self) -> Result<(), DriverError> {
        if self.fail_writes.get() {
            Err(DriverError::Rejected)
        } else {
            Ok(())
        }
    }

    fn read(&self) -> Result<(), DriverError> {
        if self.fail_reads.get() {
            Err(DriverError::Rejected)
        } else {
            Ok(())
        }
    }
}

impl RadioDriver for MockRadio {
    fn opmode(&self) -> OpMode {
        self.opmode.get()
    }

    fn set_opmode(&self, mode: OpMode) -> Result<(), DriverError> {
        self.record(Call::SetOpmode(mode));
        self.write()?;
        self.opmode.set(mode);
        Ok(())
    }

    fn phy_mode(&self) -> PhyMode {
        self.phy_mode.get()
    }

    fn set_phy_mode(&self, mode: PhyMode) -> Result<(), DriverError> {
        self.record(Call::SetPhyMode(mode));
        self.write()?;
        self.phy_mode.set(mode);
        Ok(())
    }

    fn station_config(&self) -> Result<StationConfig, DriverError> {
        self.read()?;
        Ok(self.sta.borrow().clone())
    }

    fn set_station_config(&self, config: &StationConfig) -> Result<(), DriverError> {
        self.record(Call::SetStationConfig(config.clone()));
        self.write()?;
        *self.sta.borrow_mut() = config.clone();
        Ok(())
    }

    fn softap_config(&self) -> Result<SoftApConfig, DriverError> {
        self.read()?;
        Ok(self.ap.borrow().clone())
    }

    fn set_softap_config(&self, config: &SoftApConfig) -> Result<(), DriverError> {
        self.record(Call::SetSoftApConfig(config.clone()));
        self.write()?;
        *self.ap.borrow_mut() = config.clone();
        Ok(())
    }

    fn station_connect(&self) -> Result<(), DriverError> {
        self.record(Call::Connect);
        self.write()?;
        self.status.set(StationStatus::Connecting);
        Ok(())
    }

    fn station_disconnect(&self) -> Result<(), DriverError> {
        self.record(Call::Disconnect);
        self.write()?;
        self.status.set(StationStatus::Idle);
        Ok(())
    }

    fn station_status(&self) -> StationStatus {
        self.status.get()
    }

    fn softap_station_count(&self) -> Result<u8, DriverError> {
        self.ap_stations.get().ok_or(DriverError::Unsupported)
    }

    fn start_scan(&self, done: ScanDone) -> Result<(), DriverError> {
        self.record(Call::StartScan);
        let behaviour = self.scan.borrow().clone();
        match behaviour {
            ScanBehaviour::Immediate(status, bss) => {
                done.complete(status, bss.as_deref());
                Ok(())
            }
            ScanBehaviour::Deferred => {
                *self.pending.borrow_mut() = Some(done);
                Ok(())
            }
            ScanBehaviour::Threaded(status, bss) => {
                std::thread::spawn(move || {
                    std::thread::sleep(Duration::from_millis(20));
                    done.complete(status, bss.as_deref());
                });
                Ok(())
            }
            ScanBehaviour::Refuse => Err(DriverError::Busy),
        }
    }

    fn mac_address(&self, interface: Interface) -> Result<MacAddress, DriverError> {
        self.read()?;
        Ok(self.macs.borrow()[interface.id() as usize])
    }

    fn set_mac_address(&self, interface: Interface, mac: &MacAddress) -> Result<(), DriverError> {
        self.record(Call::SetMac(interface, *mac));
        self.write()?;
        self.macs.borrow_mut()[interface.id() as usize] = *mac;
        Ok(())
    }

    fn ip_info(&self, _interface: Interface) -> Result<IpInfo, DriverError> {
        self.read()?;
        Ok(self.ip.get())
    }
}

/// Builds a driver scan record.
pub(crate) fn bss(
    ssid: &[u8],
    bssid: [u8; MAC_LEN],
    channel: u8,
    rssi: i8,
    authmode: AuthMode,
    is_hidden: bool,
) -> BssInfo {
    let mut buf = [0u8; SSID_LEN];
    buf[..ssid.len()].copy_from_slice(ssid);
    BssInfo {
        ssid: buf,
        bssid,
        channel,
        rssi,
        authmode: authmode.raw(),
        is_hidden,
    }
}

/// Each test gets its own coordinator, so tests can run in parallel.
pub(crate) fn leak_coordinator() -> &'static ScanCoordinator {
    Box::leak(Box::new(ScanCoordinator::new()))
}

pub(crate) fn station_ip() -> IpInfo {
    IpInfo {
        ip: Ipv4Addr::new(192, 168, 1, 42),
        netmask: Ipv4Addr::new(255, 255, 255, 0),
        gateway: Ipv4Addr::new(192, 168, 1, 1),
    }
}
