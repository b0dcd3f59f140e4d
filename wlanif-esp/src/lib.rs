// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! wlanif-esp - `esp-wifi` backed radio driver for wlanif.
//!
//! [`radio`] - provides [`EspRadio`], which implements
//! [`wlanif_core::RadioDriver`] on top of `esp-wifi` and `embassy-net`, and
//! the embassy tasks which drive the WiFi controller.

#![no_std]
#![feature(type_alias_impl_trait)]
#![feature(impl_trait_in_assoc_type)]

extern crate alloc;

pub mod radio;

#[doc(inline)]
pub use radio::{EspRadio, EspRadioBuilder};

use alloc::string::String;
use core::fmt;

/// Error type for building and running the radio
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Hit error in the esp-wifi stack
    Wifi(String),

    /// Configuration error, e.g. missing stack resources
    Config(String),
}

impl Error {
    pub fn as_str(&self) -> &'static str {
        match self {
            Error::Wifi(_) => "WiFi Error",
            Error::Config(_) => "Configuration Error",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Wifi(msg) => write!(f, "WiFi stack error: {msg}"),
            Error::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}
