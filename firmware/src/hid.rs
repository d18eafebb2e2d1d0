//! Boot-protocol keyboard report built from resolved key edges

use keyflow_core::{HidEvent, KeyCode};

/// Number of non-modifier keys in a boot report
pub const REPORT_KEYS: usize = 6;

/// 8-byte boot keyboard report: modifier bits, reserved byte, six usages
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootReport {
    modifiers: u8,
    keys: [u8; REPORT_KEYS],
}

impl BootReport {
    pub const fn new() -> Self {
        Self {
            modifiers: 0,
            keys: [0; REPORT_KEYS],
        }
    }

    /// Apply one edge. Returns true if the report changed.
    pub fn apply(&mut self, event: HidEvent) -> bool {
        let before = *self;
        match event {
            HidEvent::Press(key) => self.press(key),
            HidEvent::Release(key) => self.release(key),
        }
        *self != before
    }

    fn press(&mut self, key: KeyCode) {
        if let Some(bit) = modifier_bit(key) {
            self.modifiers |= bit;
            return;
        }
        let usage = key.usage();
        if self.keys.contains(&usage) {
            return;
        }
        match self.keys.iter_mut().find(|slot| **slot == 0) {
            Some(slot) => *slot = usage,
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("⚠️ Report full, {:?} dropped", key);
            }
        }
    }

    fn release(&mut self, key: KeyCode) {
        if let Some(bit) = modifier_bit(key) {
            self.modifiers &= !bit;
            return;
        }
        let usage = key.usage();
        if let Some(index) = self.keys.iter().position(|slot| *slot == usage) {
            // Keep usages packed at the front
            self.keys.copy_within(index + 1.., index);
            self.keys[REPORT_KEYS - 1] = 0;
        }
    }

    pub fn modifiers(&self) -> u8 {
        self.modifiers
    }

    pub fn keys(&self) -> &[u8; REPORT_KEYS] {
        &self.keys
    }

    /// Wire format
    pub fn to_bytes(&self) -> [u8; 8] {
        let mut bytes = [0; 8];
        bytes[0] = self.modifiers;
        bytes[2..].copy_from_slice(&self.keys);
        bytes
    }
}

fn modifier_bit(key: KeyCode) -> Option<u8> {
    key.is_modifier()
        .then(|| 1 << (key.usage() - KeyCode::LCtrl.usage()))
}
