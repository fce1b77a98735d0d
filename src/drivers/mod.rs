//! Input latch, actuator drivers and hardware initialisation.

pub mod buzzer;
pub mod hw_init;
pub mod input;
pub mod led;
pub mod pump;
