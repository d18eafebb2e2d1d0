//! Reserved keycodes that run a side effect instead of reaching the host

use crate::keycode::{CustomKey, Keycode};
use crate::types::{LayerState, ResolvedEvent};

/// Whether the interceptor took care of an event
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Consumed(pub bool);

impl Consumed {
    pub const fn is_consumed(&self) -> bool {
        self.0
    }
}

/// Handles custom keycodes before normal dispatch
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Interceptor {
    raise_layer: u8,
}

impl Interceptor {
    pub const fn new(raise_layer: u8) -> Self {
        Self { raise_layer }
    }

    /// Run the side effect of `event.keycode` if it is reserved
    pub fn handle(&self, event: &ResolvedEvent, layers: &mut LayerState) -> Consumed {
        match event.keycode {
            Keycode::Custom(CustomKey::LayerRaise) => {
                // Release has no effect, even without a matching press
                if event.pressed {
                    layers.invert(self.raise_layer);
                    #[cfg(feature = "defmt")]
                    defmt::debug!(
                        "🔀 Layer {} inverted, mask {:#b}",
                        self.raise_layer,
                        layers.mask()
                    );
                }
                Consumed(true)
            }
            _ => Consumed(false),
        }
    }
}
