#![no_std]

//! Firmware library: board configuration, HID report state and embassy tasks

pub use keyflow_core::*;

pub mod board;
pub mod hid;

#[cfg(feature = "embedded")]
pub mod hardware;

#[cfg(feature = "embedded")]
pub mod tasks;

#[cfg(all(feature = "embedded", target_arch = "riscv32"))]
pub mod time_driver;

pub use board::{BoardKeymap, BoardResolver, COMBOS, DANCES, KEYMAP, TIMEOUTS};
pub use hid::BootReport;

#[cfg(feature = "embedded")]
pub use tasks::*;
