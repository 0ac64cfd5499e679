//! SmartOven firmware library.
//!
//! Control core for a networked toaster-oven appliance: the device status
//! registry, temperature acquisition, relay arbitration, the cooking
//! process controller, and the remote messaging client, wired together
//! through single-slot mailboxes and a shared flag registry.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within the adapter modules.

#![deny(unused_must_use)]

pub mod bus;
pub mod config;
pub mod cook;
pub mod mailbox;
pub mod ports;
pub mod recipe;
pub mod relay;
pub mod remote;
pub mod reporters;
pub mod status;
pub mod tasks;
pub mod thermo;

pub mod error;
pub mod pins;

// Peripheral-boundary adapters; the ESP-IDF implementations inside are
// cfg-guarded, the simulation backends compile everywhere.
pub mod adapters;
