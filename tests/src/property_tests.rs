//! Property tests over random key sequences

use crate::harness::*;
use keyflow_core::test_utils::event_script::EventScript;
use keyflow_core::{HidEvent, KeyPos, LayerState};
use proptest::prelude::*;

/// Most keys a generated sequence holds at once
const MAX_DOWN: usize = 6;

/// Turn `(key index, gap)` steps into a well-formed script: a step presses
/// the key if it is up and releases it if it is down. Every key still down
/// at the end is released.
fn script_from_steps(keys: &[KeyPos], steps: &[(usize, u64)]) -> EventScript {
    let mut script = EventScript::new();
    let mut down: Vec<KeyPos> = Vec::new();

    for &(index, gap) in steps {
        script = script.wait(gap);
        let key = keys[index % keys.len()];
        if let Some(position) = down.iter().position(|held| *held == key) {
            down.remove(position);
            script = script.release(key);
        } else if down.len() >= MAX_DOWN {
            let oldest = down.remove(0);
            script = script.release(oldest);
        } else {
            down.push(key);
            script = script.press(key);
        }
    }
    for key in down {
        script = script.wait(10).release(key);
    }
    script
}

fn steps() -> impl Strategy<Value = Vec<(usize, u64)>> {
    prop::collection::vec((0usize..64, 0u64..300), 1..40)
}

proptest! {
    #[test]
    fn prop_nothing_stays_held(steps in steps()) {
        let script = script_from_steps(&all_positions(), &steps);
        let (resolver, output) = run(&script);

        prop_assert!(output.held().is_empty(), "held: {:?}", output.held());
        prop_assert_eq!(output.spurious_releases(), 0);
        prop_assert!(resolver.registry().is_empty());
        prop_assert!(resolver.next_deadline().is_none());
        prop_assert!(resolver.dispatcher().pending().is_none());
    }

    #[test]
    fn prop_plain_keys_pass_through_in_order(steps in steps()) {
        let keys: Vec<KeyPos> = PLAIN_KEYS.iter().map(|(pos, _)| *pos).collect();
        let script = script_from_steps(&keys, &steps);
        let (_, output) = run(&script);

        let expected: Vec<HidEvent> = script
            .events()
            .iter()
            .map(|event| {
                let key = PLAIN_KEYS
                    .iter()
                    .find(|(pos, _)| *pos == event.pos)
                    .map(|(_, key)| *key)
                    .expect("generated from the plain key table");
                if event.pressed { press(key) } else { release(key) }
            })
            .collect();
        prop_assert_eq!(output.events(), expected.as_slice());
    }

    #[test]
    fn prop_dance_taps_classify_by_count(
        count in 1usize..=3,
        hold in 1u64..150,
        gap in 1u64..150,
    ) {
        let script = EventScript::new().taps(MODS, count, hold, gap);
        let (_, output) = run(&script);

        let first = output.events().first().copied();
        let expected_first = match count {
            1 => press(keyflow_core::KeyCode::Comma),
            2 => press(keyflow_core::KeyCode::LGui),
            _ => press(keyflow_core::KeyCode::LCtrl),
        };
        prop_assert_eq!(first, Some(expected_first));
        prop_assert!(output.held().is_empty());
    }

    #[test]
    fn prop_member_press_settles_counting_dance_as_tap(
        member in prop::sample::select(vec![Q, W, A, R, X]),
        offset in 1u64..200,
        hold in 1u64..300,
    ) {
        let script = EventScript::new()
            .press(MODS)
            .wait(offset)
            .press(member)
            .wait(hold)
            .release(member)
            .wait(5)
            .release(MODS);
        let (_, output) = run(&script);

        let events = output.events();
        prop_assert_eq!(events.first().copied(), Some(press(keyflow_core::KeyCode::Comma)));
        prop_assert_eq!(events.get(1).copied(), Some(release(keyflow_core::KeyCode::Comma)));
        prop_assert!(output.held().is_empty());
        prop_assert_eq!(output.spurious_releases(), 0);
    }

    #[test]
    fn prop_double_invert_is_identity(mask in any::<u32>(), layer in 1u8..32) {
        let mut layers = LayerState::new();
        for bit in 0..32u8 {
            if mask & (1 << bit) != 0 {
                layers.on(bit);
            }
        }
        let before = layers;
        layers.invert(layer);
        layers.invert(layer);
        prop_assert_eq!(layers, before);
    }

    #[test]
    fn prop_combo_chord_within_window_fires_once(
        spread in 0u64..50,
        hold in 0u64..400,
    ) {
        let script = EventScript::new()
            .press(Q)
            .wait(spread)
            .press(W)
            .wait(hold)
            .release(W)
            .wait(5)
            .release(Q);
        let (_, output) = run(&script);

        prop_assert_eq!(output.presses(keyflow_core::KeyCode::Tab), 1);
        prop_assert_eq!(output.releases(keyflow_core::KeyCode::Tab), 1);
        prop_assert_eq!(output.events().len(), 2);
    }
}
