// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! wlanif-core - Scan coordination
//!
//! The radio only supports a single, callback driven scan at a time.
//! [`ScanCoordinator`] turns that into an `async` call:
//!
//! - [`ScanCoordinator::scan()`] creates a session, hands the driver a
//!   single-shot [`ScanDone`] handle and waits on a signal.
//! - The driver calls [`ScanDone::complete()`] from its own execution
//!   context (a task, an interrupt, another thread).  That resolves the
//!   session and signals the waiter.
//! - The waiter takes the results and releases the session.
//!
//! Each session carries a generation number.  A completion for a session
//! which is no longer active (the waiter was dropped, or a new scan has
//! since started) is ignored.
//!
//! The coordinator does not time out.  A driver which never completes a
//! scan leaves the caller waiting.  The future is cancellation safe, so the
//! caller may race it against a timer, e.g. with
//! `embassy_time::with_timeout()`.
//!
//! The coordinator must be `'static`, as the driver may hold the
//! completion handle in another context.  Declare it as a static:
//!
//! ```rust
//! use wlanif_core::ScanCoordinator;
//!
//! static SCANNER: ScanCoordinator = ScanCoordinator::new();
//! ```

use alloc::vec::Vec;
use core::cell::RefCell;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use serde::Serialize;

use crate::WlanError;
use crate::consts::{MAC_LEN, SSID_LEN};
use crate::driver::{BssInfo, RadioDriver, ScanStatus};
use crate::types::{AuthMode, OpMode};

/// A network discovered by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// Raw SSID bytes.  May be empty, and need not be valid UTF-8.
    pub ssid: heapless::Vec<u8, SSID_LEN>,

    /// Hardware address of the access point
    pub bssid: [u8; MAC_LEN],

    pub channel: u8,

    /// Signal strength, in the driver's units (dBm)
    pub rssi: i8,

    /// Raw driver authentication mode.  See [`ScanResult::auth_mode()`].
    pub authmode: u8,

    pub hidden: bool,
}

impl ScanResult {
    /// Returns the authentication mode, if it is one of the known modes.
    pub fn auth_mode(&self) -> Option<AuthMode> {
        AuthMode::from_raw(self.authmode)
    }

    /// Returns the SSID as a string, if it is valid UTF-8.
    pub fn ssid_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.ssid).ok()
    }
}

impl From<&BssInfo> for ScanResult {
    fn from(bss: &BssInfo) -> Self {
        let mut ssid = heapless::Vec::new();
        // Cannot fail - BssInfo::ssid() is at most SSID_LEN bytes
        let _ = ssid.extend_from_slice(bss.ssid());
        Self {
            ssid,
            bssid: bss.bssid,
            channel: bss.channel,
            rssi: bss.rssi,
            authmode: bss.authmode,
            hidden: bss.is_hidden,
        }
    }
}

type Outcome = Result<Vec<ScanResult>, ScanStatus>;

// An outstanding scan.
struct ScanSession {
    generation: u32,
    outcome: Option<Outcome>,
}

struct Inner {
    next_generation: u32,
    session: Option<ScanSession>,
}

/// Coordinates scans between a caller and the radio driver.  See the
/// [module documentation](self).
pub struct ScanCoordinator {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner>>,
    done: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for ScanCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanCoordinator {
    /// Creates a new coordinator with no outstanding scan.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                next_generation: 0,
                session: None,
            })),
            done: Signal::new(),
        }
    }

    /// Returns whether a scan is outstanding.
    pub fn is_scanning(&self) -> bool {
        self.inner.lock(|inner| inner.borrow().session.is_some())
    }

    /// Scans for networks using `driver`.
    ///
    /// Returns:
    /// - `Ok(results)` in driver delivery order.  An empty list is a
    ///   successful scan which found no networks.
    /// - `Err(WlanError::Unsupported)` if the radio is in access point only
    ///   mode.  No scan is issued.
    /// - `Err(WlanError::OperationFailed)` if another scan is outstanding,
    ///   the driver refused to start the scan, or the driver reported
    ///   failure.
    pub async fn scan<D>(&'static self, driver: &D) -> Result<Vec<ScanResult>, WlanError>
    where
        D: RadioDriver + ?Sized,
    {
        if driver.opmode() == OpMode::SOFTAP {
            return Err(WlanError::Unsupported("scan unsupported in AP mode".into()));
        }

        let done = self.begin()?;
        let generation = done.generation;

        // Releases the session if this future is dropped before the scan
        // completes, or once the outcome has been taken.
        let _guard = SessionGuard {
            coordinator: self,
            generation,
        };

        debug!("Exec:  Starting scan {generation}");
        if let Err(e) = driver.start_scan(done) {
            warn!("Error: Driver failed to start scan: {e}");
            return Err(WlanError::failed("scan failed"));
        }

        loop {
            if let Some(outcome) = self.take_outcome(generation) {
                return match outcome {
                    Ok(results) => {
                        debug!("Ok:    Scan {generation} found {} networks", results.len());
                        Ok(results)
                    }
                    Err(status) => {
                        warn!("Error: Scan {generation} failed, status {status:?}");
                        Err(WlanError::failed("scan failed"))
                    }
                };
            }
            self.done.wait().await;
        }
    }

    // Creates a new session, failing if one is already outstanding.
    fn begin(&'static self) -> Result<ScanDone, WlanError> {
        let generation = self.inner.lock(|inner| {
            let mut inner = inner.borrow_mut();
            if inner.session.is_some() {
                return Err(WlanError::failed("scan already in progress"));
            }
            let generation = inner.next_generation;
            inner.next_generation = generation.wrapping_add(1);
            inner.session = Some(ScanSession {
                generation,
                outcome: None,
            });
            Ok(generation)
        })?;
        self.done.reset();

        Ok(ScanDone {
            coordinator: self,
            generation,
            fired: false,
        })
    }

    // Records the outcome of a scan, if its session is still active and
    // unresolved.
    fn resolve(&self, generation: u32, outcome: Outcome) {
        let resolved = self.inner.lock(|inner| {
            match inner.borrow_mut().session.as_mut() {
                Some(session) if session.generation == generation && session.outcome.is_none() => {
                    session.outcome = Some(outcome);
                    true
                }
                _ => false,
            }
        });

        if resolved {
            self.done.signal(());
        } else {
            debug!("Info:  Ignoring completion for inactive scan {generation}");
        }
    }

    // Takes the outcome of the session, if it has resolved, ending the
    // session.
    fn take_outcome(&self, generation: u32) -> Option<Outcome> {
        self.inner.lock(|inner| {
            let mut inner = inner.borrow_mut();
            let ready = matches!(
                &inner.session,
                Some(s) if s.generation == generation && s.outcome.is_some()
            );
            if ready {
                inner.session.take().and_then(|s| s.outcome)
            } else {
                None
            }
        })
    }

    // Ends the session without taking its outcome.
    fn abandon(&self, generation: u32) {
        self.inner.lock(|inner| {
            let mut inner = inner.borrow_mut();
            if inner
                .session
                .as_ref()
                .is_some_and(|s| s.generation == generation)
            {
                trace!("Info:  Releasing scan {generation}");
                inner.session = None;
            }
        });
    }
}

struct SessionGuard {
    coordinator: &'static ScanCoordinator,
    generation: u32,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.coordinator.abandon(self.generation);
    }
}

/// Single-shot completion handle passed to [`RadioDriver::start_scan()`].
///
/// The driver calls [`ScanDone::complete()`] exactly once, from whatever
/// context it runs its scan in.  Completing consumes the handle.  If the
/// handle is dropped without being completed the scan is treated as
/// cancelled, and the waiting caller fails rather than waiting forever.
pub struct ScanDone {
    coordinator: &'static ScanCoordinator,
    generation: u32,
    fired: bool,
}

impl ScanDone {
    /// Reports the outcome of the scan.
    ///
    /// Arguments:
    /// - `status`: the driver's scan status.
    /// - `bss`: the discovered networks, in discovery order, or `None` if
    ///   the driver produced no result set.
    ///
    /// The scan succeeds only if `status` is [`ScanStatus::Ok`] and `bss` is
    /// `Some`.  `Some(&[])` is a successful scan that found nothing.
    pub fn complete(mut self, status: ScanStatus, bss: Option<&[BssInfo]>) {
        self.fired = true;
        let outcome = match (status, bss) {
            (ScanStatus::Ok, Some(bss)) => Ok(bss.iter().map(ScanResult::from).collect()),
            (status, _) => Err(status),
        };
        self.coordinator.resolve(self.generation, outcome);
    }

    /// Returns the generation number of the scan this handle completes.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl core::fmt::Debug for ScanDone {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScanDone")
            .field("generation", &self.generation)
            .finish()
    }
}

impl Drop for ScanDone {
    fn drop(&mut self) {
        if !self.fired {
            warn!("Warn:  Scan {} completion dropped", self.generation);
            self.coordinator
                .resolve(self.generation, Err(ScanStatus::Cancel));
        }
    }
}
