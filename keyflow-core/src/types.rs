//! Core data types for the resolver

use crate::hal::{Duration, Instant};
use crate::keycode::{KeyCode, Keycode};

/// Physical matrix position
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyPos {
    pub row: u8,
    pub col: u8,
}

impl KeyPos {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

/// Debounced press/release edge from the scanner
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    pub pos: KeyPos,
    pub pressed: bool,
    pub time: Instant,
}

impl KeyEvent {
    pub const fn new(pos: KeyPos, pressed: bool, time: Instant) -> Self {
        Self { pos, pressed, time }
    }

    pub const fn press(pos: KeyPos, time: Instant) -> Self {
        Self::new(pos, true, time)
    }

    pub const fn release(pos: KeyPos, time: Instant) -> Self {
        Self::new(pos, false, time)
    }
}

/// Where a resolved event came from
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeySource {
    /// A physical key
    Matrix(KeyPos),
    /// The synthetic key of combo `n`
    Combo(u8),
}

/// Key edge after keymap lookup, as it flows through the pipeline stages
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResolvedEvent {
    pub source: KeySource,
    pub keycode: Keycode,
    pub pressed: bool,
    pub time: Instant,
}

impl ResolvedEvent {
    /// Event of a physical key
    pub const fn matrix(event: KeyEvent, keycode: Keycode) -> Self {
        Self {
            source: KeySource::Matrix(event.pos),
            keycode,
            pressed: event.pressed,
            time: event.time,
        }
    }

    /// Matrix position, if this came from a physical key
    pub const fn pos(&self) -> Option<KeyPos> {
        match self.source {
            KeySource::Matrix(pos) => Some(pos),
            KeySource::Combo(_) => None,
        }
    }
}

/// Identifies which pending decision a timeout belongs to
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerId {
    /// Hold timeout of a tap-dance key
    TapDance(u8),
    /// Hold timeout of the pending mod-tap / layer-tap key
    HoldTap,
    /// Combo window of the buffered chord
    Combo,
}

/// Single entry point of the resolver: scanner edges and timer expiries
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    /// Edge from the scanner
    Key(KeyEvent),
    /// Platform timer fired for `timer` at `at`
    Timeout { timer: TimerId, at: Instant },
}

impl From<KeyEvent> for InputEvent {
    fn from(event: KeyEvent) -> Self {
        InputEvent::Key(event)
    }
}

/// Resolved key edge for the HID report layer
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidEvent {
    Press(KeyCode),
    Release(KeyCode),
}

/// Active layers as a bitset; layer 0 is the base layer
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LayerState {
    mask: u32,
}

impl LayerState {
    /// Only the base layer active
    pub const fn new() -> Self {
        Self { mask: 0 }
    }

    /// Raw mask (bit n = layer n)
    pub const fn mask(&self) -> u32 {
        self.mask
    }

    /// Returns true if `layer` is active. The base layer is always active.
    pub const fn is_active(&self, layer: u8) -> bool {
        layer == 0 || (layer < 32 && self.mask & (1 << layer) != 0)
    }

    /// Flip membership of `layer`
    pub fn invert(&mut self, layer: u8) {
        if layer < 32 {
            self.mask ^= 1 << layer;
        }
    }

    pub fn on(&mut self, layer: u8) {
        if layer < 32 {
            self.mask |= 1 << layer;
        }
    }

    pub fn off(&mut self, layer: u8) {
        if layer < 32 {
            self.mask &= !(1 << layer);
        }
    }
}

/// Resolver configuration parameters
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResolverConfig {
    /// Hold timeout for ordinary keys
    pub tapping_term: Duration,
    /// Shortened hold timeout for multi-function keys
    pub fast_tapping_term: Duration,
    /// Window in which all members of a combo must be pressed
    pub combo_term: Duration,
    /// Layer inverted by the reserved raise key
    pub raise_layer: u8,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            tapping_term: Duration::from_millis(250),
            fast_tapping_term: Duration::from_millis(200),
            combo_term: Duration::from_millis(50),
            raise_layer: 2,
        }
    }
}

impl ResolverConfig {
    /// Create a new configuration with validation
    pub fn new(
        tapping_term_ms: u64,
        fast_tapping_term_ms: u64,
        combo_term_ms: u64,
        raise_layer: u8,
    ) -> Result<Self, &'static str> {
        if tapping_term_ms == 0 || tapping_term_ms > 1000 {
            return Err("Tapping term must be between 1 and 1000ms");
        }
        if fast_tapping_term_ms == 0 || fast_tapping_term_ms > tapping_term_ms {
            return Err("Fast tapping term must be between 1ms and the tapping term");
        }
        if combo_term_ms == 0 || combo_term_ms >= fast_tapping_term_ms {
            return Err("Combo term must be shorter than the fast tapping term");
        }
        if raise_layer == 0 || raise_layer >= 32 {
            return Err("Raise layer must be between 1 and 31");
        }

        Ok(Self {
            tapping_term: Duration::from_millis(tapping_term_ms),
            fast_tapping_term: Duration::from_millis(fast_tapping_term_ms),
            combo_term: Duration::from_millis(combo_term_ms),
            raise_layer,
        })
    }
}
