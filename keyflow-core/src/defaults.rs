//! Fixed capacities of the resolver's static tables

/// Maximum number of combos the resolver can store
pub const MAX_COMBOS: usize = 8;

/// Maximum number of keys in one combo
pub const MAX_COMBO_KEYS: usize = 4;

/// Maximum number of member presses buffered while a chord is forming
pub const COMBO_BUFFER: usize = 8;

/// Maximum number of tap-dance keys
pub const MAX_TAP_DANCES: usize = 8;

/// Maximum number of keys held down at the same time
pub const MAX_HELD_KEYS: usize = 16;

/// Maximum number of distinct HID keys registered at once: one per held
/// key plus the eight modifiers
pub const MAX_REGISTERED_KEYS: usize = MAX_HELD_KEYS + 8;

/// Maximum number of events one stage can emit for a single input event
pub const STAGE_OUTPUT: usize = COMBO_BUFFER + 2;
