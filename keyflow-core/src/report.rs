//! Helpers turning keycodes into HID edges on a report sink

use heapless::Vec;
use crate::defaults::MAX_REGISTERED_KEYS;
use crate::hal::{HalError, ReportSink};
use crate::keycode::{KeyCode, Keycode};
use crate::types::HidEvent;

/// Send one edge; returns 1 if it was delivered, 0 if dropped
pub fn deliver(sink: &mut dyn ReportSink, event: HidEvent) -> usize {
    match sink.send(event) {
        Ok(()) => 1,
        Err(_error) => {
            #[cfg(feature = "defmt")]
            defmt::warn!("⚠️ Dropped {:?}: {:?}", event, _error);
            0
        }
    }
}

/// Key down for a plain key
pub fn press_key(sink: &mut dyn ReportSink, key: KeyCode) -> usize {
    deliver(sink, HidEvent::Press(key))
}

/// Key up for a plain key
pub fn release_key(sink: &mut dyn ReportSink, key: KeyCode) -> usize {
    deliver(sink, HidEvent::Release(key))
}

/// Press the HID keys behind `keycode`: modifiers first, then the key.
/// Keycodes with no direct HID meaning produce nothing.
pub fn press_keycode(sink: &mut dyn ReportSink, keycode: Keycode) -> usize {
    match keycode {
        Keycode::Key(key) => press_key(sink, key),
        Keycode::ModKey(mods, key) => {
            let mut sent = 0;
            for modifier in mods.keys() {
                sent += press_key(sink, modifier);
            }
            sent + press_key(sink, key)
        }
        Keycode::No
        | Keycode::Transparent
        | Keycode::ModTap(..)
        | Keycode::LayerTap(..)
        | Keycode::Momentary(_)
        | Keycode::TapDance(_)
        | Keycode::Custom(_) => 0,
    }
}

/// Release the HID keys behind `keycode` in reverse press order
pub fn release_keycode(sink: &mut dyn ReportSink, keycode: Keycode) -> usize {
    match keycode {
        Keycode::Key(key) => release_key(sink, key),
        Keycode::ModKey(mods, key) => {
            let mut sent = release_key(sink, key);
            for modifier in mods.keys().rev() {
                sent += release_key(sink, modifier);
            }
            sent
        }
        Keycode::No
        | Keycode::Transparent
        | Keycode::ModTap(..)
        | Keycode::LayerTap(..)
        | Keycode::Momentary(_)
        | Keycode::TapDance(_)
        | Keycode::Custom(_) => 0,
    }
}

/// Press and immediately release `keycode`
pub fn tap_keycode(sink: &mut dyn ReportSink, keycode: Keycode) -> usize {
    press_keycode(sink, keycode) + release_keycode(sink, keycode)
}

/// Number of registrations per HID key.
///
/// Several sources can press the same HID key, e.g. two shifted symbols
/// both register left shift. Only the first press and the last release of
/// a key go downstream; a release of a key that is not registered is
/// dropped.
#[derive(Debug, Default)]
pub struct KeyRegistry {
    counts: Vec<(KeyCode, u8), MAX_REGISTERED_KEYS>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no key is registered
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Wrap `sink` so every edge goes through this registry
    pub fn gate<'a>(&'a mut self, sink: &'a mut dyn ReportSink) -> GatedSink<'a> {
        GatedSink {
            registry: self,
            sink,
        }
    }
}

/// Report sink that filters edges through a [`KeyRegistry`]
pub struct GatedSink<'a> {
    registry: &'a mut KeyRegistry,
    sink: &'a mut dyn ReportSink,
}

impl ReportSink for GatedSink<'_> {
    fn send(&mut self, event: HidEvent) -> Result<(), HalError> {
        let counts = &mut self.registry.counts;
        match event {
            HidEvent::Press(key) => {
                if let Some((_, count)) = counts.iter_mut().find(|(registered, _)| *registered == key) {
                    *count = count.saturating_add(1);
                    return Ok(());
                }
                if counts.is_full() {
                    return Err(HalError::CapacityExceeded);
                }
                self.sink.send(event)?;
                // Room was checked above
                let _ = counts.push((key, 1));
                Ok(())
            }
            HidEvent::Release(key) => {
                let Some(index) = counts.iter().position(|(registered, _)| *registered == key) else {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("🔇 Release of unregistered {:?} dropped", key);
                    return Ok(());
                };
                if counts[index].1 > 1 {
                    counts[index].1 -= 1;
                    return Ok(());
                }
                counts.swap_remove(index);
                self.sink.send(event)
            }
        }
    }
}
