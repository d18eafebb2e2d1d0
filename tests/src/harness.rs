//! Board resolver with scripted input

use keyflow_core::test_utils::event_script::EventScript;
use keyflow_core::test_utils::output_capture::OutputRecorder;
use keyflow_core::test_utils::runner::run_script;
use keyflow_core::{default_config, HidEvent, KeyCode, KeyPos};
use keyflow_firmware::board::{self, BoardResolver};

// Base layer positions used by the scenarios
pub const Q: KeyPos = KeyPos::new(0, 0);
pub const W: KeyPos = KeyPos::new(0, 1);
pub const J: KeyPos = KeyPos::new(0, 5);
pub const L: KeyPos = KeyPos::new(0, 6);
pub const A: KeyPos = KeyPos::new(1, 0);
pub const R: KeyPos = KeyPos::new(1, 1);
pub const S: KeyPos = KeyPos::new(1, 2);
pub const Z: KeyPos = KeyPos::new(2, 0);
pub const X: KeyPos = KeyPos::new(2, 1);
pub const MO3: KeyPos = KeyPos::new(2, 4);
pub const MODS: KeyPos = KeyPos::new(2, 7);
pub const THUMB: KeyPos = KeyPos::new(3, 1);

/// Base-layer keys with no combo, dance or layer role, and their HID keys
pub const PLAIN_KEYS: [(KeyPos, KeyCode); 10] = [
    (KeyPos::new(0, 2), KeyCode::F),
    (KeyPos::new(0, 3), KeyCode::P),
    (KeyPos::new(0, 4), KeyCode::G),
    (KeyPos::new(0, 5), KeyCode::J),
    (KeyPos::new(0, 6), KeyCode::L),
    (KeyPos::new(1, 5), KeyCode::H),
    (KeyPos::new(1, 6), KeyCode::N),
    (KeyPos::new(2, 2), KeyCode::C),
    (KeyPos::new(2, 5), KeyCode::K),
    (KeyPos::new(2, 6), KeyCode::M),
];

/// Every physical key of the board
pub fn all_positions() -> Vec<KeyPos> {
    let mut positions: Vec<KeyPos> = (0..3u8)
        .flat_map(|row| (0..10u8).map(move |col| KeyPos::new(row, col)))
        .collect();
    positions.extend([KeyPos::new(3, 0), THUMB, KeyPos::new(3, 2)]);
    positions
}

/// Board resolver with default timing
pub fn board() -> BoardResolver {
    board::resolver(default_config()).expect("board tables are valid")
}

/// Run `script` on a fresh board resolver, letting every timer fire at the end
pub fn run(script: &EventScript) -> (BoardResolver, OutputRecorder) {
    let mut resolver = board();
    let mut output = OutputRecorder::new();
    run_script(&mut resolver, script, &mut output);
    (resolver, output)
}

pub fn press(key: KeyCode) -> HidEvent {
    HidEvent::Press(key)
}

pub fn release(key: KeyCode) -> HidEvent {
    HidEvent::Release(key)
}

/// Press and release of `key`
pub fn tap(key: KeyCode) -> [HidEvent; 2] {
    [press(key), release(key)]
}
