//! Layered keymap with transparent fall-through

use crate::keycode::Keycode;
use crate::types::{KeyPos, LayerState};

/// Source of keycodes for matrix positions
pub trait KeymapLookup {
    /// Keycode of `pos` under the currently active layers
    fn lookup(&self, layers: &LayerState, pos: KeyPos) -> Keycode;
}

/// Static `LAYERS x ROWS x COLS` keycode table.
///
/// Lookup walks the active layers from the highest down to the base layer.
/// `Transparent` entries fall through to the next active layer, every other
/// entry (including `No`) stops the search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keymap<const ROWS: usize, const COLS: usize, const LAYERS: usize> {
    layers: [[[Keycode; COLS]; ROWS]; LAYERS],
}

impl<const ROWS: usize, const COLS: usize, const LAYERS: usize> Keymap<ROWS, COLS, LAYERS> {
    pub const fn new(layers: [[[Keycode; COLS]; ROWS]; LAYERS]) -> Self {
        Self { layers }
    }

    /// Raw entry of one layer, without fall-through
    pub fn get(&self, layer: u8, pos: KeyPos) -> Option<Keycode> {
        self.layers
            .get(usize::from(layer))?
            .get(usize::from(pos.row))?
            .get(usize::from(pos.col))
            .copied()
    }
}

impl<const ROWS: usize, const COLS: usize, const LAYERS: usize> KeymapLookup
    for Keymap<ROWS, COLS, LAYERS>
{
    fn lookup(&self, layers: &LayerState, pos: KeyPos) -> Keycode {
        for layer in (0..LAYERS.min(32) as u8).rev() {
            if !layers.is_active(layer) {
                continue;
            }
            match self.get(layer, pos) {
                Some(Keycode::Transparent) => continue,
                Some(keycode) => return keycode,
                None => return Keycode::No,
            }
        }
        Keycode::No
    }
}
