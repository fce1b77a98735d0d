//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the control rules for the dispenser: mode machine
//! orchestration, ratio and duty-cycle plumbing, persistence requests and
//! the remote-control surface.  All interaction with hardware happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod remote;
pub mod service;
pub mod view;
