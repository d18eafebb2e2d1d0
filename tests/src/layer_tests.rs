//! Layers, the raise combo and hold-tap keys

use crate::harness::*;
use keyflow_core::test_utils::event_script::EventScript;
use keyflow_core::test_utils::output_capture::OutputRecorder;
use keyflow_core::test_utils::runner::run_script;
use keyflow_core::{KeyCode, KeyPos, LayerState};

fn raise(script: EventScript) -> EventScript {
    script
        .press(Z)
        .wait(15)
        .press(X)
        .wait(40)
        .release(Z)
        .release(X)
        .wait(100)
}

#[test]
fn test_raise_combo_toggles_number_layer() {
    let (resolver, output) = run(&raise(EventScript::new()));

    assert!(resolver.layers().is_active(2));
    assert!(output.events().is_empty());

    let (resolver, output) = run(&raise(raise(EventScript::new())));
    assert_eq!(*resolver.layers(), LayerState::new());
    assert!(output.events().is_empty());
}

#[test]
fn test_number_layer_replaces_letters() {
    let h = KeyPos::new(1, 5);
    let script = raise(EventScript::new()).tap(A, 30).tap(h, 30);
    let (_, output) = run(&script);
    assert_eq!(output.pressed_keys(), vec![KeyCode::Kb1, KeyCode::Kb6]);
}

#[test]
fn test_release_after_layer_change_uses_pressed_key() {
    let mut resolver = board();
    let mut output = OutputRecorder::new();

    // J held on the base layer while the number layer comes up
    let script = raise(EventScript::new().press(J).wait(10));
    run_script(&mut resolver, &script, &mut output);
    assert!(resolver.layers().is_active(2));

    let script = EventScript::new().at(script.now().as_millis()).release(J);
    run_script(&mut resolver, &script, &mut output);
    assert_eq!(output.events(), &tap(KeyCode::J));
    assert_eq!(output.presses(KeyCode::Kb6), 0);
}

#[test]
fn test_momentary_function_layer() {
    let script = raise(EventScript::new())
        .press(MO3)
        .wait(10)
        .tap(A, 20)
        .release(MO3)
        .wait(10)
        .tap(A, 20);
    let (resolver, output) = run(&script);

    assert_eq!(output.pressed_keys(), vec![KeyCode::F1, KeyCode::Kb1]);
    assert!(!resolver.layers().is_active(3));
}

#[test]
fn test_thumb_tap_is_space() {
    let (resolver, output) = run(&EventScript::new().tap(THUMB, 100));
    assert_eq!(output.events(), &tap(KeyCode::Space));
    assert!(!resolver.layers().is_active(1));
}

#[test]
fn test_thumb_hold_with_other_key_uses_symbol_layer() {
    let script = EventScript::new()
        .press(THUMB)
        .wait(50)
        .tap(Q, 30)
        .wait(10)
        .release(THUMB);
    let (resolver, output) = run(&script);

    // Underscore is shifted minus
    assert_eq!(
        output.events(),
        &[
            press(KeyCode::LShift),
            press(KeyCode::Minus),
            release(KeyCode::Minus),
            release(KeyCode::LShift),
        ]
    );
    assert!(!resolver.layers().is_active(1));
}

#[test]
fn test_thumb_hold_timeout_activates_layer() {
    let mut resolver = board();
    let mut output = OutputRecorder::new();

    let script = EventScript::new().press(THUMB).wait(250);
    run_script(&mut resolver, &script, &mut output);
    assert!(resolver.layers().is_active(1));
    assert!(output.events().is_empty());

    let script = EventScript::new().at(250).tap(S, 20).release(THUMB);
    run_script(&mut resolver, &script, &mut output);
    // Right paren is shifted 0
    assert_eq!(output.pressed_keys(), vec![KeyCode::LShift, KeyCode::Kb0]);
    assert!(!resolver.layers().is_active(1));
    assert!(output.held().is_empty());
}

#[test]
fn test_shift_tap_z_taps_z() {
    let (_, output) = run(&EventScript::new().tap(Z, 30));
    assert_eq!(output.events(), &tap(KeyCode::Z));
}

#[test]
fn test_shift_tap_z_held_shifts_next_key() {
    let script = EventScript::new()
        .press(Z)
        .wait(300)
        .tap(S, 20)
        .release(Z);
    let (_, output) = run(&script);

    assert_eq!(
        output.events(),
        &[
            press(KeyCode::LShift),
            press(KeyCode::S),
            release(KeyCode::S),
            release(KeyCode::LShift),
        ]
    );
}

#[test]
fn test_shift_tap_z_interrupted_after_combo_window() {
    // Past the combo window but inside the hold timeout
    let script = EventScript::new()
        .press(Z)
        .wait(100)
        .tap(S, 20)
        .release(Z);
    let (_, output) = run(&script);

    assert_eq!(output.pressed_keys(), vec![KeyCode::LShift, KeyCode::S]);
    assert!(output.held().is_empty());
}

#[test]
fn test_overlapping_shifted_symbols_keep_shift() {
    let script = EventScript::new()
        .press(THUMB)
        .wait(50)
        .press(Q)
        .wait(20)
        .press(S)
        .wait(20)
        .release(Q)
        .wait(20)
        .release(S)
        .wait(10)
        .release(THUMB);
    let (resolver, output) = run(&script);

    assert_eq!(
        output.events(),
        &[
            press(KeyCode::LShift),
            press(KeyCode::Minus),
            press(KeyCode::Kb0),
            release(KeyCode::Minus),
            release(KeyCode::Kb0),
            release(KeyCode::LShift),
        ]
    );
    assert_eq!(output.spurious_releases(), 0);
    assert!(resolver.registry().is_empty());
}
