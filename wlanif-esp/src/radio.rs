// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! wlanif-esp - Radio driver
//!
//! [`EspRadio`] implements [`RadioDriver`] using `esp-wifi`.
//!
//! The `esp-wifi` controller is async and is owned by a single embassy task,
//! [`radio_task`].  `EspRadio`'s methods are synchronous, so:
//! - configuration, mode and status are cached in `EspRadio`'s shared state,
//!   and reads are served from that cache.
//! - writes update the cache, then queue a command for the radio task, which
//!   applies it to the controller.
//! - scans queue the [`ScanDone`] handle, and the radio task completes it
//!   once `esp-wifi` returns the scan results.
//!
//! # Example
//! ```rust
//! use embassy_net::StackResources;
//! use static_cell::make_static;
//! use wlanif_core::{ScanCoordinator, Wlan};
//! use wlanif_esp::EspRadio;
//!
//! static SCANNER: ScanCoordinator = ScanCoordinator::new();
//!
//! let sta_stack_resources = make_static!(StackResources::<2>::new());
//! let mut radio = EspRadio::builder::<2, 0>()
//!     .with_sta_if(embassy_net::Config::dhcpv4(Default::default()), sta_stack_resources)
//!     .build(&spawner, peripherals.TIMG0, peripherals.RNG, peripherals.WIFI)
//!     .expect("Failed to build radio");
//!
//! // Spawn the radio and networking tasks.
//! radio.must_spawn();
//!
//! let wlan = Wlan::new(radio, &SCANNER);
//! wlan.sta().set_active(true)?;
//! let networks = wlan.sta().scan().await?;
//! ```

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::future::pending;
use embassy_executor::Spawner;
use embassy_futures::select::{Either, select};
use embassy_net::{Config as NetConfig, Runner, Stack, StackResources, StaticConfigV4};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Timer;
use esp_hal::peripherals::{RNG, TIMG0, WIFI};
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use esp_wifi::wifi::{
    AccessPointConfiguration, AccessPointInfo, AuthMethod, ClientConfiguration, Configuration,
    ScanConfig, WifiController, WifiDevice, WifiEvent,
};
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use static_cell::make_static;
use wlanif_core::{
    AuthMode, BssInfo, DriverError, Interface, IpInfo, MacAddress, OpMode, PhyMode, RadioDriver,
    ScanDone, ScanStatus, SoftApConfig, StationConfig, StationStatus,
    consts::SSID_LEN,
};

use crate::Error;

// Commands queued for the radio task.  Writes are rejected with
// `DriverError::Busy` when the queue is full.
const COMMAND_QUEUE_LEN: usize = 4;

// esp-wifi scan records whose auth method has no wlanif constant use the
// ESP-IDF `wifi_auth_mode_t` numbering.
const AUTH_WPA2_ENTERPRISE: u8 = 5;
const AUTH_WPA3_PSK: u8 = 6;
const AUTH_WPA2_WPA3_PSK: u8 = 7;
const AUTH_WAPI_PSK: u8 = 8;
const AUTH_UNKNOWN: u8 = u8::MAX;

enum Command {
    // Apply the cached mode and configuration to the controller
    Reconfigure,
    Connect,
    Disconnect,
    Scan(ScanDone),
}

#[derive(Clone)]
struct RadioState {
    opmode: OpMode,
    phy_mode: PhyMode,
    sta: StationConfig,
    ap: SoftApConfig,
    status: StationStatus,
}

// State shared between `EspRadio` and the radio task.
struct Shared {
    state: Mutex<CriticalSectionRawMutex, RefCell<RadioState>>,
    commands: Channel<CriticalSectionRawMutex, Command, COMMAND_QUEUE_LEN>,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(RadioState {
                opmode: OpMode::NULL,
                phy_mode: PhyMode::Mode11n,
                sta: StationConfig::default(),
                ap: SoftApConfig::default(),
                status: StationStatus::Idle,
            })),
            commands: Channel::new(),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut RadioState) -> R) -> R {
        self.state.lock(|state| f(&mut state.borrow_mut()))
    }

    fn snapshot(&self) -> RadioState {
        self.with_state(|state| state.clone())
    }

    fn set_status(&self, status: StationStatus) {
        self.with_state(|state| state.status = status);
    }

    fn send(&self, command: Command) -> Result<(), DriverError> {
        self.commands.try_send(command).map_err(|_| {
            warn!("Error: Radio command queue full");
            DriverError::Busy
        })
    }
}

/// Builder for [`EspRadio`].  Use [`EspRadio::builder`] to create one.
#[derive(Default)]
pub struct EspRadioBuilder<const STA: usize, const AP: usize> {
    sta_net: Option<NetConfig>,
    ap_net: Option<NetConfig>,
    sta_stack_resources: Option<&'static mut StackResources<STA>>,
    ap_stack_resources: Option<&'static mut StackResources<AP>>,
}

impl<const STA: usize, const AP: usize> EspRadioBuilder<STA, AP> {
    fn new() -> Self {
        Self::default()
    }

    /// Adds a network stack for the STA (station) interface.
    ///
    /// Arguments:
    /// - `net`: Network configuration, usually DHCP.
    /// - `stack_resources`: The stack resources for the STA interface.
    pub fn with_sta_if(
        mut self,
        net: NetConfig,
        stack_resources: &'static mut StackResources<STA>,
    ) -> Self {
        self.sta_net = Some(net);
        self.sta_stack_resources = Some(stack_resources);
        self
    }

    /// Adds a network stack for the AP (access point) interface.
    ///
    /// Arguments:
    /// - `net`: Network configuration, usually a static IP.
    /// - `stack_resources`: The stack resources for the AP interface.
    pub fn with_ap_if(
        mut self,
        net: NetConfig,
        stack_resources: &'static mut StackResources<AP>,
    ) -> Self {
        self.ap_net = Some(net);
        self.ap_stack_resources = Some(stack_resources);
        self
    }

    /// Builds the radio.  Both interfaces start disabled.
    ///
    /// After this function call [`EspRadio::must_spawn`] to start the radio
    /// and networking tasks.
    ///
    /// Returns:
    /// - `Ok(EspRadio)` if the radio was built successfully.
    /// - `Err(Error)` if `esp-wifi` failed to initialize.
    pub fn build(
        self,
        spawner: &Spawner,
        timg0: TIMG0<'static>,
        rng: RNG<'static>,
        wifi: WIFI<'static>,
    ) -> Result<EspRadio, Error> {
        let timg0 = TimerGroup::new(timg0);
        let mut rng = Rng::new(rng);

        // esp_wifi expects an immutable 'static reference
        let esp_wifi_ctrl = esp_wifi::init(timg0.timer0, rng)
            .map_err(|e| Error::Wifi(format!("Failed to initialize esp-wifi: {e:?}")))?;
        let esp_wifi_ctrl = &*make_static!(esp_wifi_ctrl);
        let (mut controller, interfaces) = esp_wifi::wifi::new(esp_wifi_ctrl, wifi)
            .map_err(|e| Error::Wifi(format!("Failed to create WiFi controller: {e:?}")))?;

        controller
            .set_power_saving(esp_wifi::config::PowerSaveMode::None)
            .inspect_err(|e| {
                error!("Error: Failed to set power WiFi saving mode {e:?}");
            })
            .ok();

        let macs = [
            MacAddress(interfaces.sta.mac_address()),
            MacAddress(interfaces.ap.mac_address()),
        ];
        debug!("Info:  STA MAC {} AP MAC {}", macs[0], macs[1]);

        let mut radio = EspRadio {
            spawner: *spawner,
            shared: make_static!(Shared::new()),
            macs,
            controller: Some(controller),
            sta_stack: None,
            ap_stack: None,
            sta_runner: None,
            ap_runner: None,
        };

        if let Some(net) = self.sta_net {
            let resources = self
                .sta_stack_resources
                .ok_or_else(|| Error::Config(String::from("STA stack resources not provided")))?;
            let seed = (rng.random() as u64) << 32 | rng.random() as u64;
            let (stack, runner) = embassy_net::new(interfaces.sta, net, resources, seed);
            radio.sta_stack = Some(stack);
            radio.sta_runner = Some(runner);
        }

        if let Some(net) = self.ap_net {
            let resources = self
                .ap_stack_resources
                .ok_or_else(|| Error::Config(String::from("AP stack resources not provided")))?;
            let seed = (rng.random() as u64) << 32 | rng.random() as u64;
            let (stack, runner) = embassy_net::new(interfaces.ap, net, resources, seed);
            radio.ap_stack = Some(stack);
            radio.ap_runner = Some(runner);
        }

        Ok(radio)
    }
}

/// `esp-wifi` backed [`RadioDriver`].
///
/// See the [module documentation](self) for an example.
pub struct EspRadio {
    spawner: Spawner,
    shared: &'static Shared,
    macs: [MacAddress; 2],
    controller: Option<WifiController<'static>>,
    sta_stack: Option<Stack<'static>>,
    ap_stack: Option<Stack<'static>>,
    sta_runner: Option<Runner<'static, WifiDevice<'static>>>,
    ap_runner: Option<Runner<'static, WifiDevice<'static>>>,
}

impl EspRadio {
    /// Creates a new builder.
    ///
    /// Generics:
    /// - `STA`: The number of sockets for the STA interface
    /// - `AP`: The number of sockets for the AP interface
    pub fn builder<const STA: usize, const AP: usize>() -> EspRadioBuilder<STA, AP> {
        EspRadioBuilder::new()
    }

    /// Spawns the networking tasks, then the radio task.
    ///
    /// Uses `Spawner::must_spawn`, so panics if the tasks cannot be spawned.
    pub fn must_spawn(&mut self) {
        if let Some(runner) = self.sta_runner.take() {
            self.spawner.must_spawn(net_task(runner));
        }

        if let Some(runner) = self.ap_runner.take() {
            self.spawner.must_spawn(net_task(runner));
        }

        match self.controller.take() {
            Some(controller) => self.spawner.must_spawn(radio_task(controller, self.shared)),
            None => warn!("Warn:  Radio task already spawned"),
        }
    }

    /// Returns the networking stack for `interface`, if one was configured.
    pub fn net_stack(&self, interface: Interface) -> Option<Stack<'static>> {
        match interface {
            Interface::Station => self.sta_stack,
            Interface::AccessPoint => self.ap_stack,
        }
    }

    /// Waits for `interface` to be assigned an IP address.
    ///
    /// Returns:
    /// - `Ok(config)` once an IP address is assigned
    /// - `Err(Error::Config)` if `interface` has no network stack
    pub async fn wait_for_ipv4(&self, interface: Interface) -> Result<StaticConfigV4, Error> {
        let stack = self
            .net_stack(interface)
            .ok_or_else(|| Error::Config(format!("Network stack for {interface} not configured")))?;
        Ok(wait_for_ipv4(&stack).await)
    }

    fn has_ipv4(&self, interface: Interface) -> bool {
        self.net_stack(interface)
            .is_some_and(|stack| stack.config_v4().is_some())
    }
}

impl RadioDriver for EspRadio {
    fn opmode(&self) -> OpMode {
        self.shared.with_state(|state| state.opmode)
    }

    fn set_opmode(&self, mode: OpMode) -> Result<(), DriverError> {
        let changed = self.shared.with_state(|state| {
            let changed = state.opmode != mode;
            state.opmode = mode;
            if !mode.is_station() {
                state.status = StationStatus::Idle;
            }
            changed
        });
        if changed {
            debug!("Exec:  WiFi mode {mode}");
            self.shared.send(Command::Reconfigure)
        } else {
            trace!("Info:  WiFi mode {mode} unchanged");
            Ok(())
        }
    }

    fn phy_mode(&self) -> PhyMode {
        self.shared.with_state(|state| state.phy_mode)
    }

    fn set_phy_mode(&self, mode: PhyMode) -> Result<(), DriverError> {
        if mode == self.phy_mode() {
            Ok(())
        } else {
            warn!("Error: Changing PHY mode to {mode:?} is not supported");
            Err(DriverError::Unsupported)
        }
    }

    fn station_config(&self) -> Result<StationConfig, DriverError> {
        Ok(self.shared.with_state(|state| state.sta.clone()))
    }

    fn set_station_config(&self, config: &StationConfig) -> Result<(), DriverError> {
        let active = self.shared.with_state(|state| {
            state.sta = config.clone();
            state.opmode.is_station()
        });
        if active {
            self.shared.send(Command::Reconfigure)
        } else {
            Ok(())
        }
    }

    fn softap_config(&self) -> Result<SoftApConfig, DriverError> {
        Ok(self.shared.with_state(|state| state.ap.clone()))
    }

    fn set_softap_config(&self, config: &SoftApConfig) -> Result<(), DriverError> {
        let active = self.shared.with_state(|state| {
            state.ap = config.clone();
            state.opmode.is_softap()
        });
        if active {
            self.shared.send(Command::Reconfigure)
        } else {
            Ok(())
        }
    }

    fn station_connect(&self) -> Result<(), DriverError> {
        if !self.opmode().is_station() {
            warn!("Error: Cannot connect, STA not active");
            return Err(DriverError::Rejected);
        }
        self.shared.send(Command::Connect)?;
        self.shared.set_status(StationStatus::Connecting);
        Ok(())
    }

    fn station_disconnect(&self) -> Result<(), DriverError> {
        self.shared.send(Command::Disconnect)
    }

    fn station_status(&self) -> StationStatus {
        match self.shared.with_state(|state| state.status) {
            StationStatus::Connecting if self.has_ipv4(Interface::Station) => StationStatus::GotIp,
            status => status,
        }
    }

    fn softap_station_count(&self) -> Result<u8, DriverError> {
        Err(DriverError::Unsupported)
    }

    fn start_scan(&self, done: ScanDone) -> Result<(), DriverError> {
        self.shared.send(Command::Scan(done))
    }

    fn mac_address(&self, interface: Interface) -> Result<MacAddress, DriverError> {
        Ok(self.macs[interface.id() as usize])
    }

    fn set_mac_address(&self, interface: Interface, mac: &MacAddress) -> Result<(), DriverError> {
        warn!("Error: Setting {interface} MAC {mac} is not supported");
        Err(DriverError::Unsupported)
    }

    fn ip_info(&self, interface: Interface) -> Result<IpInfo, DriverError> {
        let config = self.net_stack(interface).and_then(|stack| stack.config_v4());
        Ok(match config {
            Some(config) => IpInfo {
                ip: config.address.address(),
                netmask: config.address.netmask(),
                gateway: config.gateway.unwrap_or(IpInfo::default().gateway),
            },
            None => IpInfo::default(),
        })
    }
}

// Owns the WiFi controller, and applies queued commands to it.  Also
// watches for the station being disconnected by the network.
#[embassy_executor::task]
async fn radio_task(mut controller: WifiController<'static>, shared: &'static Shared) -> ! {
    debug!(
        "Info:  WiFi device capabilities: {:?}",
        controller.capabilities()
    );

    let mut connected = false;

    loop {
        let command = match select(
            shared.commands.receive(),
            sta_disconnected(&mut controller, connected),
        )
        .await
        {
            Either::First(command) => command,
            Either::Second(()) => {
                warn!("Warn:  WiFi station disconnected");
                connected = false;
                shared.set_status(StationStatus::ConnectFail);
                continue;
            }
        };

        match command {
            Command::Reconfigure => {
                let state = shared.snapshot();
                // Restarting the controller drops the station's association
                let reconnect = connected && state.opmode.is_station();
                connected = false;
                match reconfigure(&mut controller, &state).await {
                    Ok(()) if reconnect => {
                        info!("Exec:  Reconnecting WiFi station");
                        shared.set_status(StationStatus::Connecting);
                        connected = connect(&mut controller, shared).await;
                    }
                    Ok(()) => (),
                    Err(e) => {
                        warn!("Error: Failed to reconfigure WiFi: {e}");
                        if reconnect {
                            shared.set_status(StationStatus::ConnectFail);
                        }
                    }
                }
            }
            Command::Connect => {
                if connected {
                    debug!("Info:  WiFi station already connected");
                } else {
                    info!("Exec:  Connecting WiFi station");
                    connected = connect(&mut controller, shared).await;
                }
            }
            Command::Disconnect => {
                info!("Exec:  Disconnecting WiFi station");
                if connected {
                    controller
                        .disconnect_async()
                        .await
                        .inspect_err(|e| warn!("Error: Failed to disconnect: {e:?}"))
                        .ok();
                }
                connected = false;
                shared.set_status(StationStatus::Idle);
            }
            Command::Scan(done) => scan(&mut controller, done).await,
        }
    }
}

// Connects the station, returning whether it succeeded.  Marks the station
// as failed if not.
async fn connect(controller: &mut WifiController<'static>, shared: &Shared) -> bool {
    match controller.connect_async().await {
        Ok(()) => {
            info!("Ok:    WiFi station connected");
            true
        }
        Err(e) => {
            warn!("Error: Failed to connect WiFi station: {e:?}");
            shared.set_status(StationStatus::ConnectFail);
            false
        }
    }
}

// Completes when a connected station is disconnected.  Never completes if
// the station isn't connected.
async fn sta_disconnected(controller: &mut WifiController<'_>, connected: bool) {
    if connected {
        controller
            .wait_for_all_events(WifiEvent::StaDisconnected.into(), false)
            .await;
    } else {
        pending().await
    }
}

// Stops the controller, then restarts it with the cached mode and
// configuration.  Leaves it stopped if both interfaces are disabled.
async fn reconfigure(
    controller: &mut WifiController<'static>,
    state: &RadioState,
) -> Result<(), Error> {
    match controller.is_started() {
        Ok(true) => {
            info!("Exec:  Stopping WiFi for reconfiguration");
            controller
                .stop_async()
                .await
                .map_err(|e| Error::Wifi(format!("Failed to stop WiFi: {e:?}")))?;
            debug!("Ok:    WiFi stopped");
        }
        Ok(false) => trace!("Info:  WiFi already stopped"),
        Err(e) => return Err(Error::Wifi(format!("Failed to check WiFi state: {e:?}"))),
    }

    let config = match (state.opmode.is_station(), state.opmode.is_softap()) {
        (true, true) => Configuration::Mixed(client_config(&state.sta), ap_config(&state.ap)),
        (true, false) => Configuration::Client(client_config(&state.sta)),
        (false, true) => Configuration::AccessPoint(ap_config(&state.ap)),
        (false, false) => {
            debug!("Info:  WiFi mode NULL, not starting controller");
            return Ok(());
        }
    };

    controller
        .set_configuration(&config)
        .map_err(|e| Error::Wifi(format!("Failed to set WiFi configuration: {e:?}")))?;

    controller
        .start_async()
        .await
        .map_err(|e| Error::Wifi(format!("Failed to start WiFi: {e:?}")))?;
    info!("Ok:    WiFi started in mode {}", state.opmode);

    Ok(())
}

async fn scan(controller: &mut WifiController<'static>, done: ScanDone) {
    debug!("Exec:  WiFi scan {}", done.generation());
    match controller
        .scan_with_config_async(ScanConfig::default())
        .await
    {
        Ok(aps) => {
            let bss: Vec<BssInfo> = aps.iter().map(bss_info).collect();
            debug!("Ok:    WiFi scan found {} networks", bss.len());
            done.complete(ScanStatus::Ok, Some(&bss));
        }
        Err(e) => {
            warn!("Error: WiFi scan failed: {e:?}");
            done.complete(ScanStatus::Fail, None);
        }
    }
}

fn client_config(sta: &StationConfig) -> ClientConfiguration {
    ClientConfiguration {
        ssid: String::from_utf8_lossy(sta.ssid()).into_owned(),
        password: String::from_utf8_lossy(sta.password()).into_owned(),
        bssid: sta.bssid_set.then_some(sta.bssid),
        ..Default::default()
    }
}

fn ap_config(ap: &SoftApConfig) -> AccessPointConfiguration {
    AccessPointConfiguration {
        ssid: String::from_utf8_lossy(ap.ssid()).into_owned(),
        ssid_hidden: ap.ssid_hidden,
        channel: ap.channel,
        auth_method: auth_method(ap.authmode),
        password: String::from_utf8_lossy(ap.password()).into_owned(),
        max_connections: ap.max_connection as u16,
        ..Default::default()
    }
}

fn auth_method(authmode: u8) -> AuthMethod {
    match AuthMode::from_raw(authmode) {
        Some(AuthMode::Open) => AuthMethod::None,
        Some(AuthMode::Wep) => AuthMethod::WEP,
        Some(AuthMode::WpaPsk) => AuthMethod::WPA,
        Some(AuthMode::Wpa2Psk) => AuthMethod::WPA2Personal,
        Some(AuthMode::WpaWpa2Psk) => AuthMethod::WPAWPA2Personal,
        None => {
            warn!("Warn:  Unknown auth mode {authmode}, using WPA2");
            AuthMethod::WPA2Personal
        }
    }
}

fn raw_authmode(method: Option<AuthMethod>) -> u8 {
    match method {
        None | Some(AuthMethod::None) => AuthMode::Open.raw(),
        Some(AuthMethod::WEP) => AuthMode::Wep.raw(),
        Some(AuthMethod::WPA) => AuthMode::WpaPsk.raw(),
        Some(AuthMethod::WPA2Personal) => AuthMode::Wpa2Psk.raw(),
        Some(AuthMethod::WPAWPA2Personal) => AuthMode::WpaWpa2Psk.raw(),
        Some(AuthMethod::WPA2Enterprise) => AUTH_WPA2_ENTERPRISE,
        Some(AuthMethod::WPA3Personal) => AUTH_WPA3_PSK,
        Some(AuthMethod::WPA2WPA3Personal) => AUTH_WPA2_WPA3_PSK,
        Some(AuthMethod::WAPIPersonal) => AUTH_WAPI_PSK,
        #[allow(unreachable_patterns)]
        Some(_) => AUTH_UNKNOWN,
    }
}

// esp-wifi reports hidden networks with an empty SSID.
fn bss_info(ap: &AccessPointInfo) -> BssInfo {
    let mut ssid = [0u8; SSID_LEN];
    let bytes = ap.ssid.as_bytes();
    let len = bytes.len().min(SSID_LEN);
    ssid[..len].copy_from_slice(&bytes[..len]);

    BssInfo {
        ssid,
        bssid: ap.bssid,
        channel: ap.channel,
        rssi: ap.signal_strength,
        authmode: raw_authmode(ap.auth_method),
        is_hidden: ap.ssid.is_empty(),
    }
}

// Pool size of 2 required, one for STA, one for AP
#[embassy_executor::task(pool_size = 2)]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

async fn wait_for_ipv4(stack: &Stack<'static>) -> StaticConfigV4 {
    loop {
        stack.wait_config_up().await;
        if let Some(config) = stack.config_v4() {
            info!("Ok:    Received IP {}", config.address);
            return config;
        }
        Timer::after_millis(100).await;
    }
}
