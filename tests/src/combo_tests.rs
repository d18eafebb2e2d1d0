//! Combo behavior on the board tables

use crate::harness::*;
use keyflow_core::test_utils::event_script::EventScript;
use keyflow_core::test_utils::output_capture::OutputRecorder;
use keyflow_core::{KeyCode, KeyPos};
use rstest::rstest;

#[rstest]
#[case::same_order(Q, W, Q, W)]
#[case::reversed_press(W, Q, Q, W)]
#[case::reversed_release(Q, W, W, Q)]
fn test_tab_combo_emits_exactly_once(
    #[case] first: KeyPos,
    #[case] second: KeyPos,
    #[case] first_up: KeyPos,
    #[case] second_up: KeyPos,
) {
    let script = EventScript::new()
        .press(first)
        .wait(20)
        .press(second)
        .wait(100)
        .release(first_up)
        .wait(30)
        .release(second_up);
    let (resolver, output) = run(&script);

    assert_eq!(output.events(), &tap(KeyCode::Tab));
    assert_eq!(output.presses(KeyCode::Q), 0);
    assert_eq!(output.presses(KeyCode::W), 0);
    assert!(!resolver.combos().state(0).is_some_and(|s| s.is_active()));
}

#[test]
fn test_enter_combo_held() {
    let script = EventScript::new().press(A).wait(10).press(R).wait(300);
    let (_, output) = run(&script);
    assert_eq!(output.events(), &[press(KeyCode::Enter)]);
    assert!(output.is_held(KeyCode::Enter));
}

#[test]
fn test_member_released_in_window_replays() {
    let script = EventScript::new().tap(Q, 30);
    let (_, output) = run(&script);
    assert_eq!(output.events(), &tap(KeyCode::Q));
}

#[test]
fn test_window_timeout_replays_member() {
    let script = EventScript::new().press(Q).wait(49);
    let mut resolver = board();
    let mut output = OutputRecorder::new();
    for event in script.events() {
        resolver.process((*event).into(), &mut output);
    }

    // Still inside the window at 49 ms
    resolver.poll(script.now(), &mut output);
    assert!(output.events().is_empty());

    resolver.poll(script.wait(1).now(), &mut output);
    assert_eq!(output.events(), &[press(KeyCode::Q)]);
}

#[test]
fn test_member_pressed_after_window_is_ordinary() {
    let script = EventScript::new()
        .press(Q)
        .wait(60)
        .press(W)
        .wait(100)
        .release(Q)
        .release(W);
    let (_, output) = run(&script);

    assert_eq!(output.presses(KeyCode::Tab), 0);
    assert_eq!(output.pressed_keys(), vec![KeyCode::Q, KeyCode::W]);
    assert!(output.held().is_empty());
}

#[test]
fn test_non_member_press_breaks_chord() {
    let script = EventScript::new()
        .press(Q)
        .wait(10)
        .press(J)
        .wait(10)
        .press(W)
        .wait(100)
        .release(Q)
        .release(J)
        .release(W);
    let (_, output) = run(&script);

    assert_eq!(output.presses(KeyCode::Tab), 0);
    assert_eq!(output.pressed_keys(), vec![KeyCode::Q, KeyCode::J, KeyCode::W]);
}

#[test]
fn test_second_chord_fires_again() {
    let chord = |script: EventScript| {
        script
            .press(Q)
            .wait(10)
            .press(W)
            .wait(50)
            .release(Q)
            .release(W)
            .wait(100)
    };
    let script = chord(chord(EventScript::new()));
    let (_, output) = run(&script);
    assert_eq!(output.presses(KeyCode::Tab), 2);
    assert_eq!(output.releases(KeyCode::Tab), 2);
}
