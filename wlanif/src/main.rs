// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! wlanif - Demo Firmware
//!
//! Brings up the station interface, connects it to the network given by the
//! `WLANIF_STA_SSID` and `WLANIF_STA_PASSWORD` environment variables (at
//! build time), then scans for networks periodically, logging the results.
//!
//! Features can be set when building:
//! - `ap`: Also brings up the soft access point, using `WLANIF_AP_SSID` and
//!   `WLANIF_AP_PASSWORD`.  The access point is open if no password is given.
//! - `wifi-log`: Enables `esp-wifi` logging.
//!
//! To change other configuration:
//! - `HEAP_SIZE`: Size of the heap used by the application.
//! - `SCAN_INTERVAL`: Time between scans.
//! - `SCAN_TIMEOUT`: Time after which an outstanding scan is abandoned.
//! - `STA_IP_TIMEOUT`: Time to wait for the station to get an IP address.

#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![feature(type_alias_impl_trait)]
#![feature(impl_trait_in_assoc_type)]

extern crate alloc;
use embassy_executor::Spawner;
#[cfg(feature = "ap")]
use embassy_net::{Ipv4Cidr, StaticConfigV4};
use embassy_net::StackResources;
use embassy_time::{Duration, Timer, with_timeout};
use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::{clock::CpuClock, timer::timg::TimerGroup};
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use static_cell::make_static;

use wlanif_core::consts::CONSTANTS;
use wlanif_core::{Interface, ScanCoordinator, Wlan, WlanError};
#[cfg(feature = "ap")]
use wlanif_core::{AuthMode, ConfigField, ConfigValue};
use wlanif_esp::EspRadio;

esp_bootloader_esp_idf::esp_app_desc!();

// Heap size for the application.
pub const HEAP_SIZE: usize = 96 * 1024;

// Sockets per interface.  The DHCP client uses one.
const NUM_SOCKETS: usize = 4;

const SCAN_INTERVAL: Duration = Duration::from_secs(30);
const SCAN_TIMEOUT: Duration = Duration::from_secs(10);
const STA_IP_TIMEOUT: Duration = Duration::from_secs(30);

const STA_SSID: Option<&str> = option_env!("WLANIF_STA_SSID");
const STA_PASSWORD: &str = match option_env!("WLANIF_STA_PASSWORD") {
    Some(password) => password,
    None => "",
};
#[cfg(feature = "ap")]
const AP_SSID: &str = match option_env!("WLANIF_AP_SSID") {
    Some(ssid) => ssid,
    None => "wlanif",
};
#[cfg(feature = "ap")]
const AP_PASSWORD: &str = match option_env!("WLANIF_AP_PASSWORD") {
    Some(password) => password,
    None => "",
};
#[cfg(feature = "ap")]
const AP_CHANNEL: i32 = 1;

// Only one scan may be outstanding, across both interfaces.
static SCANNER: ScanCoordinator = ScanCoordinator::new();

// wlanif demo firmware's main function.
//
// - Set up the HAL, heap and embassy
// - Build the radio and spawn its tasks
// - Bring up the access point (if `ap` is set), then the station
// - Scan forever
#[esp_hal_embassy::main]
async fn main(spawner: Spawner) -> ! {
    // Set up the logger
    esp_println::logger::init_logger_from_env();

    info!("*** wlanif ***");

    // Set up the HAL
    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    // Set up the heap allocator
    esp_alloc::heap_allocator!(size: HEAP_SIZE);

    // Initialize embassy
    let timg1 = TimerGroup::new(peripherals.TIMG1);
    esp_hal_embassy::init(timg1.timer0);

    for (name, value) in CONSTANTS {
        trace!("Value: {name} = {value}");
    }

    // Build the radio, with a network stack per interface
    let sta_resources = make_static!(StackResources::<NUM_SOCKETS>::new());
    let builder = EspRadio::builder::<NUM_SOCKETS, NUM_SOCKETS>()
        .with_sta_if(embassy_net::Config::dhcpv4(Default::default()), sta_resources);
    #[cfg(feature = "ap")]
    let builder = {
        let ap_resources = make_static!(StackResources::<NUM_SOCKETS>::new());
        let ap_net = embassy_net::Config::ipv4_static(StaticConfigV4 {
            address: Ipv4Cidr::new(core::net::Ipv4Addr::new(192, 168, 4, 1), 24),
            gateway: None,
            dns_servers: Default::default(),
        });
        builder.with_ap_if(ap_net, ap_resources)
    };

    let mut radio = match builder.build(
        &spawner,
        peripherals.TIMG0,
        peripherals.RNG,
        peripherals.WIFI,
    ) {
        Ok(radio) => radio,
        Err(e) => {
            error!("Error: Failed to initialize radio: {e}");
            halt().await
        }
    };
    radio.must_spawn();
    trace!("Ok:    Radio initialized");

    let wlan = Wlan::new(radio, &SCANNER);

    // The AP comes up first, as changing mode restarts the radio
    #[cfg(feature = "ap")]
    if let Err(e) = start_ap(&wlan) {
        warn!("Error: Failed to start WiFi access point: {e}");
    }

    if let Err(e) = start_sta(&wlan).await {
        warn!("Error: Failed to start WiFi station: {e}");
    }

    info!("Info:  WiFi mode {}", wlan.wifi_mode());

    loop {
        match with_timeout(SCAN_TIMEOUT, wlan.sta().scan()).await {
            Ok(Ok(networks)) => {
                info!("Ok:    Found {} networks", networks.len());
                for network in networks.iter() {
                    match serde_json::to_string(network) {
                        Ok(json) => info!("Value: {json}"),
                        Err(e) => warn!("Error: Failed to serialize scan result: {e}"),
                    }
                }
            }
            Ok(Err(e)) => warn!("Error: Scan failed: {e}"),
            Err(_) => warn!("Error: Scan timed out after {}s", SCAN_TIMEOUT.as_secs()),
        }

        let sta = wlan.sta();
        debug!(
            "Info:  STA status {:?} connected {:?}",
            sta.status(),
            sta.is_connected()
        );

        Timer::after(SCAN_INTERVAL).await;
    }
}

// Enables the station, then connects it if a network was configured.
async fn start_sta(wlan: &Wlan<EspRadio>) -> Result<(), WlanError> {
    let sta = wlan.sta();
    sta.set_active(true)?;
    info!("Ok:    STA {} active", sta.mac()?);

    let Some(ssid) = STA_SSID else {
        info!("Info:  No WLANIF_STA_SSID, not connecting");
        return Ok(());
    };
    sta.connect(ssid.as_bytes(), STA_PASSWORD.as_bytes())?;

    match with_timeout(
        STA_IP_TIMEOUT,
        wlan.driver().wait_for_ipv4(Interface::Station),
    )
    .await
    {
        Ok(Ok(_)) => {
            let ifconfig = sta.ifconfig()?;
            info!(
                "Ok:    STA connected to {ssid}, IP {} netmask {} gateway {}",
                ifconfig.ip, ifconfig.netmask, ifconfig.gateway
            );
        }
        Ok(Err(e)) => warn!("Error: {e}"),
        Err(_) => warn!("Error: STA timed out waiting for an IP address"),
    }
    Ok(())
}

// Configures and enables the access point.
#[cfg(feature = "ap")]
fn start_ap(wlan: &Wlan<EspRadio>) -> Result<(), WlanError> {
    let ap = wlan.ap();
    let authmode = if AP_PASSWORD.is_empty() {
        AuthMode::Open
    } else {
        AuthMode::Wpa2Psk
    };
    ap.configure(&[
        (ConfigField::Essid, ConfigValue::from(AP_SSID)),
        (ConfigField::Password, ConfigValue::from(AP_PASSWORD)),
        (ConfigField::Authmode, ConfigValue::Int(authmode.raw() as i32)),
        (ConfigField::Channel, ConfigValue::Int(AP_CHANNEL)),
    ])?;
    ap.set_active(true)?;
    info!("Ok:    AP {AP_SSID} active, MAC {}", ap.mac()?);
    Ok(())
}

// Parks main forever, e.g. after an unrecoverable initialization error.
async fn halt() -> ! {
    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}
