#![cfg_attr(not(feature = "std"), no_std)]

//! # Keyflow Core
//!
//! Key event resolution for keyboard firmware without dynamic memory.
//! Turns raw press/release edges into HID reports, resolving combos,
//! tap dances, hold-tap keys and layer changes from event timing.

pub mod defaults;
pub mod keycode;
pub mod types;
pub mod hal;
pub mod report;
pub mod timing;
pub mod tap_dance;
pub mod combo;
pub mod intercept;
pub mod dispatch;
pub mod keymap;
pub mod resolver;

#[cfg(feature = "test-utils")]
pub mod test_utils;


pub use keycode::*;
pub use types::*;
pub use hal::{*, Instant, Duration};
pub use timing::{TimeoutOverride, TimingPolicy};
pub use tap_dance::{mods_dance, DanceAction, DanceActions, DanceHandler, DanceOutcome, TapDanceEngine};
pub use combo::{ComboDefinition, ComboDetector};
pub use intercept::{Consumed, Interceptor};
pub use dispatch::Dispatcher;
pub use keymap::{Keymap, KeymapLookup};
pub use report::KeyRegistry;
pub use resolver::{Resolver, ResolverTables};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timing: 250 ms tapping term, 200 ms for multi-function keys,
/// 50 ms combo window, reserved raise key on layer 2
pub fn default_config() -> ResolverConfig {
    ResolverConfig {
        tapping_term: Duration::from_millis(250),
        fast_tapping_term: Duration::from_millis(200),
        combo_term: Duration::from_millis(50),
        raise_layer: 2,
    }
}
