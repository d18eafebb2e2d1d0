//! Per-keycode hold timeout policy

use crate::hal::Duration;
use crate::keycode::Keycode;
use crate::types::ResolverConfig;

/// Explicit timeout for one keycode, overriding the class-based default
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimeoutOverride {
    pub keycode: Keycode,
    pub timeout: Duration,
}

/// Maps a keycode to how long to wait before committing to a hold.
///
/// Pure lookup over static data: first matching override wins, then every
/// multi-function key (tap dance, layer-tap, mod-tap) gets the fast term,
/// and anything else gets the default term.
#[derive(Copy, Clone, Debug)]
pub struct TimingPolicy<'a> {
    tapping_term: Duration,
    fast_tapping_term: Duration,
    overrides: &'a [TimeoutOverride],
}

impl<'a> TimingPolicy<'a> {
    pub const fn new(
        tapping_term: Duration,
        fast_tapping_term: Duration,
        overrides: &'a [TimeoutOverride],
    ) -> Self {
        Self {
            tapping_term,
            fast_tapping_term,
            overrides,
        }
    }

    /// Policy derived from resolver configuration
    pub fn from_config(config: &ResolverConfig, overrides: &'a [TimeoutOverride]) -> Self {
        Self::new(config.tapping_term, config.fast_tapping_term, overrides)
    }

    /// Hold timeout for `keycode`
    pub fn resolve_hold_timeout(&self, keycode: Keycode) -> Duration {
        if let Some(entry) = self.overrides.iter().find(|entry| entry.keycode == keycode) {
            return entry.timeout;
        }
        if keycode.is_multi_function() {
            self.fast_tapping_term
        } else {
            self.tapping_term
        }
    }
}
