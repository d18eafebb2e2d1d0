//! Host-side tests for the keyflow resolver
//!
//! Scenarios run against the firmware's board tables, driven by scripted
//! key edges on a virtual clock.

pub mod harness;

#[cfg(test)]
mod tap_dance_tests;
#[cfg(test)]
mod combo_tests;
#[cfg(test)]
mod layer_tests;
#[cfg(test)]
mod property_tests;
