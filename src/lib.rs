//! CocktailCube firmware library.
//!
//! Exposes the control core and its adapters for integration testing and
//! the firmware binary.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod dispense;
pub mod error;
pub mod fsm;
pub mod mixing;

pub mod adapters;
pub mod drivers;
pub mod pins;
