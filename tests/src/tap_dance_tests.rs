//! Tap-dance behavior through the full resolver

use crate::harness::*;
use keyflow_core::test_utils::event_script::EventScript;
use keyflow_core::test_utils::output_capture::OutputRecorder;
use keyflow_core::test_utils::runner::run_script;
use keyflow_core::{
    mods_dance, DanceAction, DanceActions, DanceHandler, DanceOutcome, HidEvent, KeyCode,
    KeyPos, Keycode, Keymap, Mods, Resolver, ResolverConfig, ResolverTables,
};
use rstest::rstest;

const GUI_SPACE: [HidEvent; 4] = [
    HidEvent::Press(KeyCode::LGui),
    HidEvent::Press(KeyCode::Space),
    HidEvent::Release(KeyCode::Space),
    HidEvent::Release(KeyCode::LGui),
];

const CTRL_GUI_SPACE: [HidEvent; 6] = [
    HidEvent::Press(KeyCode::LCtrl),
    HidEvent::Press(KeyCode::LGui),
    HidEvent::Press(KeyCode::Space),
    HidEvent::Release(KeyCode::Space),
    HidEvent::Release(KeyCode::LGui),
    HidEvent::Release(KeyCode::LCtrl),
];

#[rstest]
#[case(1, &tap(KeyCode::Comma))]
#[case(2, &GUI_SPACE)]
#[case(3, &CTRL_GUI_SPACE)]
fn test_n_taps(#[case] count: usize, #[case] expected: &[HidEvent]) {
    let script = EventScript::new().taps(MODS, count, 30, 50);
    let (resolver, output) = run(&script);

    assert_eq!(output.events(), expected);
    assert!(output.held().is_empty());
    assert_eq!(resolver.dances().state(0).map(|s| s.tap_count()), Some(0));
}

#[rstest]
#[case(1, KeyCode::LGui)]
#[case(2, KeyCode::LAlt)]
#[case(3, KeyCode::LCtrl)]
fn test_n_holds(#[case] count: usize, #[case] modifier: KeyCode) {
    let script = EventScript::new()
        .taps(MODS, count - 1, 30, 50)
        .wait(50)
        .press(MODS)
        .wait(300);
    let (mut resolver, mut output) = run(&script);

    // Modifier stays registered while the key is down
    assert_eq!(output.events(), &[press(modifier)]);
    assert!(output.is_held(modifier));

    let release_at = script.now();
    let release_script = EventScript::new().at(release_at.as_millis()).release(MODS);
    run_script(&mut resolver, &release_script, &mut output);
    assert_eq!(output.events(), &[press(modifier), release(modifier)]);
    assert!(output.held().is_empty());
}

#[test]
fn test_hold_shorter_than_term_is_tap() {
    let script = EventScript::new().tap(MODS, 150);
    let (_, output) = run(&script);
    assert_eq!(output.events(), &tap(KeyCode::Comma));
}

#[test]
fn test_interruption_settles_before_other_key() {
    let script = EventScript::new()
        .press(MODS)
        .wait(50)
        .press(J)
        .wait(20)
        .release(J)
        .wait(10)
        .release(MODS);
    let (_, output) = run(&script);

    assert_eq!(
        output.events(),
        &[
            press(KeyCode::Comma),
            release(KeyCode::Comma),
            press(KeyCode::J),
            release(KeyCode::J),
        ]
    );
}

#[test]
fn test_combo_member_interrupts_dance_at_press_time() {
    // Q waits in the combo buffer across the dance deadline at 200 ms
    let script = EventScript::new()
        .press(MODS)
        .wait(180)
        .press(Q)
        .wait(80)
        .release(Q)
        .wait(10)
        .release(MODS);
    let (_, output) = run(&script);

    assert_eq!(
        output.events(),
        &[
            press(KeyCode::Comma),
            release(KeyCode::Comma),
            press(KeyCode::Q),
            release(KeyCode::Q),
        ]
    );
    assert_eq!(output.spurious_releases(), 0);
}

#[test]
fn test_combo_during_counting_dance() {
    // Tab chord after one tap: the dance settles before the chord resolves
    let script = EventScript::new()
        .tap(MODS, 30)
        .wait(40)
        .press(Q)
        .wait(10)
        .press(W)
        .wait(50)
        .release(Q)
        .release(W);
    let (resolver, output) = run(&script);

    let mut expected = tap(KeyCode::Comma).to_vec();
    expected.extend(tap(KeyCode::Tab));
    assert_eq!(output.events(), expected.as_slice());
    assert_eq!(resolver.dances().state(0).map(|s| s.tap_count()), Some(0));
}

#[test]
fn test_interrupted_second_tap_is_double_tap() {
    let script = EventScript::new()
        .tap(MODS, 30)
        .wait(50)
        .press(MODS)
        .wait(40)
        .tap(L, 20)
        .release(MODS);
    let (_, output) = run(&script);

    let mut expected = GUI_SPACE.to_vec();
    expected.extend(tap(KeyCode::L));
    assert_eq!(output.events(), expected.as_slice());
}

#[test]
fn test_four_taps_are_silent() {
    let script = EventScript::new().taps(MODS, 4, 30, 50);
    let (resolver, output) = run(&script);

    assert!(output.events().is_empty());
    assert_eq!(
        resolver.dances().state(0).map(|s| s.last_outcome()),
        Some(DanceOutcome::None)
    );
}

static MODS_DANCE: DanceActions = mods_dance();
static ESC_DANCE: DanceActions = DanceActions {
    single_tap: DanceAction::Tap(Keycode::Key(KeyCode::Escape)),
    single_hold: DanceAction::Hold(Keycode::Key(KeyCode::LAlt)),
    double_tap: DanceAction::Tap(Keycode::ModKey(Mods::LGUI, KeyCode::Dot)),
    double_hold: DanceAction::Nothing,
    triple_tap: DanceAction::Nothing,
    triple_hold: DanceAction::Nothing,
};
static TWO_DANCES: [&dyn DanceHandler; 2] = [&MODS_DANCE, &ESC_DANCE];
static DANCE_KEYMAP: Keymap<1, 2, 1> = Keymap::new([[[Keycode::TapDance(0), Keycode::TapDance(1)]]]);

#[test]
fn test_double_hold_teardown_with_other_dance_counting() {
    let mut resolver = Resolver::new(
        ResolverConfig::default(),
        ResolverTables {
            keymap: &DANCE_KEYMAP,
            combos: &[],
            dances: &TWO_DANCES,
            timeouts: &[],
        },
    )
    .expect("valid tables");
    let mut output = OutputRecorder::new();
    let first = KeyPos::new(0, 0);
    let second = KeyPos::new(0, 1);

    // Dance 0 settles as double hold
    let script = EventScript::new().tap(first, 30).wait(50).press(first).wait(250);
    run_script(&mut resolver, &script, &mut output);
    assert_eq!(output.events(), &[press(KeyCode::LAlt)]);

    // Dance 1 starts counting, dance 0 is released mid-sequence
    let script = EventScript::new()
        .at(script.now().as_millis())
        .press(second)
        .wait(20)
        .release(second)
        .wait(10)
        .release(first);
    let mut resolver_output = OutputRecorder::new();
    for event in script.events() {
        resolver.process((*event).into(), &mut resolver_output);
    }

    // Only LALT went up; dance 1 is still counting
    assert_eq!(resolver_output.events(), &[release(KeyCode::LAlt)]);
    assert_eq!(resolver.dances().state(1).map(|s| s.tap_count()), Some(1));
    assert!(resolver.next_deadline().is_some());
}
