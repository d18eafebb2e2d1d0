//! Action dispatcher: plain keys, momentary layers and hold-tap keys
//!
//! Mod-tap and layer-tap keys wait for one of three things after their press:
//! their own release (tap), their hold timeout (hold), or the press of another
//! key (hold). Only one hold-tap can be undecided at a time; a second one
//! arriving counts as the other key press for the first.
//!
//! Another key's press always decides for hold, so a rolled space+letter on
//! the `LT(1, Space)` thumb types the letter from layer 1 rather than a space
//! followed by the letter.

use heapless::Vec;
use crate::defaults::MAX_HELD_KEYS;
use crate::hal::{Duration, Instant, ReportSink};
use crate::keycode::{KeyCode, Keycode, Mods};
use crate::report;
use crate::types::{KeySource, LayerState, ResolvedEvent};

/// Hold-tap key waiting for its decision
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingHoldTap {
    pub source: KeySource,
    pub keycode: Keycode,
    pub deadline: Instant,
}

/// What a decided hold keeps active until the key is released
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum HoldEffect {
    Mods(Mods),
    Layer(u8),
}

/// Turns keycodes that survived the earlier stages into HID edges and layer changes
#[derive(Debug, Default)]
pub struct Dispatcher {
    pending: Option<PendingHoldTap>,
    holds: Vec<(KeySource, HoldEffect), MAX_HELD_KEYS>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Undecided hold-tap, if any
    pub fn pending(&self) -> Option<&PendingHoldTap> {
        self.pending.as_ref()
    }

    /// Deadline of the undecided hold-tap
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|pending| pending.deadline)
    }

    /// Dispatch one event; `hold_timeout` is only used by hold-tap presses
    pub fn process(
        &mut self,
        event: &ResolvedEvent,
        hold_timeout: Duration,
        layers: &mut LayerState,
        sink: &mut dyn ReportSink,
    ) -> usize {
        if event.pressed {
            self.press(event, hold_timeout, layers, sink)
        } else {
            self.release(event, layers, sink)
        }
    }

    /// Another key went down: decide the pending hold-tap as a hold
    pub fn interrupt(&mut self, layers: &mut LayerState, sink: &mut dyn ReportSink) -> usize {
        match self.pending.take() {
            Some(pending) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("✋ Hold-tap {:?} held by interruption", pending.keycode);
                self.hold(pending, layers, sink)
            }
            None => 0,
        }
    }

    /// Hold timer fired at `at`; stale timers are ignored
    pub fn timeout(&mut self, at: Instant, layers: &mut LayerState, sink: &mut dyn ReportSink) -> usize {
        match self.pending {
            Some(pending) if at >= pending.deadline => {
                self.pending = None;
                #[cfg(feature = "defmt")]
                defmt::debug!("⏱️ Hold-tap {:?} held by timeout", pending.keycode);
                self.hold(pending, layers, sink)
            }
            _ => 0,
        }
    }

    fn press(
        &mut self,
        event: &ResolvedEvent,
        hold_timeout: Duration,
        layers: &mut LayerState,
        sink: &mut dyn ReportSink,
    ) -> usize {
        match event.keycode {
            Keycode::Key(_) | Keycode::ModKey(..) => report::press_keycode(sink, event.keycode),
            Keycode::Momentary(layer) => {
                layers.on(layer);
                #[cfg(feature = "defmt")]
                defmt::debug!("🔀 Layer {} on", layer);
                0
            }
            Keycode::ModTap(..) | Keycode::LayerTap(..) => {
                let sent = self.interrupt(layers, sink);
                self.pending = Some(PendingHoldTap {
                    source: event.source,
                    keycode: event.keycode,
                    deadline: event.time + hold_timeout,
                });
                #[cfg(feature = "defmt")]
                defmt::trace!("⏳ Hold-tap {:?} pending", event.keycode);
                sent
            }
            Keycode::No | Keycode::Transparent | Keycode::TapDance(_) | Keycode::Custom(_) => 0,
        }
    }

    fn release(
        &mut self,
        event: &ResolvedEvent,
        layers: &mut LayerState,
        sink: &mut dyn ReportSink,
    ) -> usize {
        match event.keycode {
            Keycode::Key(_) | Keycode::ModKey(..) => report::release_keycode(sink, event.keycode),
            Keycode::Momentary(layer) => {
                layers.off(layer);
                #[cfg(feature = "defmt")]
                defmt::debug!("🔀 Layer {} off", layer);
                0
            }
            Keycode::ModTap(_, key) | Keycode::LayerTap(_, key) => {
                if self.pending.is_some_and(|pending| pending.source == event.source) {
                    self.pending = None;
                    #[cfg(feature = "defmt")]
                    defmt::debug!("👆 Hold-tap tapped {:?}", key);
                    return report::tap_keycode(sink, Keycode::Key(key));
                }
                self.unhold(event.source, layers, sink)
            }
            Keycode::No | Keycode::Transparent | Keycode::TapDance(_) | Keycode::Custom(_) => 0,
        }
    }

    fn hold(&mut self, pending: PendingHoldTap, layers: &mut LayerState, sink: &mut dyn ReportSink) -> usize {
        let (effect, sent) = match pending.keycode {
            Keycode::ModTap(mods, _) => {
                let mut sent = 0;
                for modifier in mods.keys() {
                    sent += report::press_key(sink, modifier);
                }
                (HoldEffect::Mods(mods), sent)
            }
            Keycode::LayerTap(layer, _) => {
                layers.on(layer);
                (HoldEffect::Layer(layer), 0)
            }
            _ => return 0,
        };
        if self.holds.push((pending.source, effect)).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("⚠️ Too many holds, {:?} will not be released", effect);
        }
        sent
    }

    fn unhold(&mut self, source: KeySource, layers: &mut LayerState, sink: &mut dyn ReportSink) -> usize {
        let Some(index) = self.holds.iter().position(|(held, _)| *held == source) else {
            return 0;
        };
        let (_, effect) = self.holds.swap_remove(index);
        match effect {
            HoldEffect::Mods(mods) => mods
                .keys()
                .rev()
                .map(|modifier: KeyCode| report::release_key(sink, modifier))
                .sum(),
            HoldEffect::Layer(layer) => {
                layers.off(layer);
                0
            }
        }
    }
}
