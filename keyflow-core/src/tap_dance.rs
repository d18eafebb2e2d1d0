//! Tap-dance engine: classifies rapid taps and holds of one key
//!
//! Every configured dance owns one [`TapDanceState`] for the whole uptime.
//! A sequence starts on the first press, counts further presses of the same
//! key, and settles exactly once: when its hold timeout expires, or as soon
//! as another key is pressed. The settled outcome is handed to the dance's
//! [`DanceHandler`], and torn down again when the key is released.

use heapless::Vec;
use crate::defaults::MAX_TAP_DANCES;
use crate::hal::{Duration, HalError, Instant, ReportSink};
use crate::keycode::{KeyCode, Keycode, Mods};
use crate::report;

/// Classification of a finished tap sequence
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DanceOutcome {
    /// No sequence resolved yet
    #[default]
    None,
    /// More taps than the classifier knows about
    Unknown,
    SingleTap,
    SingleHold,
    DoubleTap,
    DoubleHold,
    TripleTap,
    TripleHold,
}

impl DanceOutcome {
    /// Returns true for outcomes that keep something registered until release
    pub const fn is_hold(&self) -> bool {
        matches!(
            self,
            DanceOutcome::SingleHold | DanceOutcome::DoubleHold | DanceOutcome::TripleHold
        )
    }
}

/// Map a tap count and the hold condition to an outcome
pub const fn classify(tap_count: u8, pressed_and_uninterrupted: bool) -> DanceOutcome {
    match (tap_count, pressed_and_uninterrupted) {
        (1, true) => DanceOutcome::SingleHold,
        (1, false) => DanceOutcome::SingleTap,
        (2, true) => DanceOutcome::DoubleHold,
        (2, false) => DanceOutcome::DoubleTap,
        (3, true) => DanceOutcome::TripleHold,
        (3, false) => DanceOutcome::TripleTap,
        _ => DanceOutcome::Unknown,
    }
}

/// Phase of one dance
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DancePhase {
    #[default]
    Idle,
    /// Taps are being counted, waiting for timeout or interruption
    Counting,
    /// Outcome delivered, waiting for the key to be released
    Settled,
}

/// Side effects of one tap-dance key
pub trait DanceHandler: Sync {
    /// Run the outcome's effect. Returns the number of reports delivered.
    fn on_resolved(&self, outcome: DanceOutcome, sink: &mut dyn ReportSink) -> usize;

    /// Undo exactly what `on_resolved` left registered for `outcome`
    fn on_reset(&self, outcome: DanceOutcome, sink: &mut dyn ReportSink) -> usize;
}

/// What a single outcome does
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DanceAction {
    Nothing,
    /// Press and release immediately on resolve
    Tap(Keycode),
    /// Press on resolve, release on reset
    Hold(Keycode),
}

/// Table-driven handler with one action per outcome
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct DanceActions {
    pub single_tap: DanceAction,
    pub single_hold: DanceAction,
    pub double_tap: DanceAction,
    pub double_hold: DanceAction,
    pub triple_tap: DanceAction,
    pub triple_hold: DanceAction,
}

impl DanceActions {
    /// Action bound to `outcome`; `None` and `Unknown` do nothing
    pub const fn action(&self, outcome: DanceOutcome) -> DanceAction {
        match outcome {
            DanceOutcome::SingleTap => self.single_tap,
            DanceOutcome::SingleHold => self.single_hold,
            DanceOutcome::DoubleTap => self.double_tap,
            DanceOutcome::DoubleHold => self.double_hold,
            DanceOutcome::TripleTap => self.triple_tap,
            DanceOutcome::TripleHold => self.triple_hold,
            DanceOutcome::None | DanceOutcome::Unknown => DanceAction::Nothing,
        }
    }
}

impl DanceHandler for DanceActions {
    fn on_resolved(&self, outcome: DanceOutcome, sink: &mut dyn ReportSink) -> usize {
        match self.action(outcome) {
            DanceAction::Tap(keycode) => report::tap_keycode(sink, keycode),
            DanceAction::Hold(keycode) => report::press_keycode(sink, keycode),
            DanceAction::Nothing => 0,
        }
    }

    fn on_reset(&self, outcome: DanceOutcome, sink: &mut dyn ReportSink) -> usize {
        match self.action(outcome) {
            DanceAction::Hold(keycode) => report::release_keycode(sink, keycode),
            DanceAction::Tap(_) | DanceAction::Nothing => 0,
        }
    }
}

/// Comma on tap, GUI/Alt/Ctrl on one/two/three-tap holds, and the
/// launcher shortcuts GUI+Space and Ctrl+GUI+Space on double/triple tap.
pub const fn mods_dance() -> DanceActions {
    DanceActions {
        single_tap: DanceAction::Tap(Keycode::Key(KeyCode::Comma)),
        single_hold: DanceAction::Hold(Keycode::Key(KeyCode::LGui)),
        double_tap: DanceAction::Tap(Keycode::ModKey(Mods::LGUI, KeyCode::Space)),
        double_hold: DanceAction::Hold(Keycode::Key(KeyCode::LAlt)),
        triple_tap: DanceAction::Tap(Keycode::ModKey(
            Mods::LCTRL.with(Mods::LGUI),
            KeyCode::Space,
        )),
        triple_hold: DanceAction::Hold(Keycode::Key(KeyCode::LCtrl)),
    }
}

/// Runtime state of one tap-dance key
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TapDanceState {
    tap_count: u8,
    last_outcome: DanceOutcome,
    phase: DancePhase,
    pressed: bool,
    interrupted: bool,
    deadline: Option<Instant>,
}

impl TapDanceState {
    pub fn tap_count(&self) -> u8 {
        self.tap_count
    }

    pub fn last_outcome(&self) -> DanceOutcome {
        self.last_outcome
    }

    pub fn phase(&self) -> DancePhase {
        self.phase
    }

    pub fn is_settled(&self) -> bool {
        self.phase == DancePhase::Settled
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// All configured tap-dance keys and their state
pub struct TapDanceEngine<'a> {
    handlers: &'a [&'a dyn DanceHandler],
    states: Vec<TapDanceState, MAX_TAP_DANCES>,
}

impl<'a> TapDanceEngine<'a> {
    /// Create the engine; dance `i` is `Keycode::TapDance(i)`
    pub fn new(handlers: &'a [&'a dyn DanceHandler]) -> Result<Self, HalError> {
        let mut states = Vec::new();
        for _ in handlers {
            states
                .push(TapDanceState::default())
                .map_err(|_| HalError::CapacityExceeded)?;
        }
        Ok(Self { handlers, states })
    }

    /// Number of configured dances
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// State of dance `id`
    pub fn state(&self, id: u8) -> Option<&TapDanceState> {
        self.states.get(usize::from(id))
    }

    /// Earliest pending deadline among counting dances
    pub fn next_deadline(&self) -> Option<(Instant, u8)> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, state)| state.phase == DancePhase::Counting)
            .filter_map(|(id, state)| state.deadline.map(|deadline| (deadline, id as u8)))
            .min_by_key(|(deadline, _)| *deadline)
    }

    /// Press of dance `id`; `timeout` comes from the timing policy
    pub fn press(
        &mut self,
        id: u8,
        time: Instant,
        timeout: Duration,
        sink: &mut dyn ReportSink,
    ) -> usize {
        let index = usize::from(id);
        let Some(state) = self.states.get_mut(index) else {
            #[cfg(feature = "defmt")]
            defmt::warn!("⚠️ Tap dance {} is not configured", id);
            return 0;
        };

        let mut sent = 0;
        let phase = state.phase;
        match phase {
            DancePhase::Counting => {
                state.tap_count = state.tap_count.saturating_add(1);
                state.pressed = true;
                state.deadline = Some(time + timeout);
                #[cfg(feature = "defmt")]
                defmt::trace!("💃 Dance {} tap {}", id, state.tap_count);
                return 0;
            }
            DancePhase::Settled => {
                // Release was never seen; close the old sequence first
                sent += self.reset(index, sink);
            }
            DancePhase::Idle => {}
        }

        let state = &mut self.states[index];
        state.phase = DancePhase::Counting;
        state.tap_count = 1;
        state.pressed = true;
        state.interrupted = false;
        state.deadline = Some(time + timeout);
        #[cfg(feature = "defmt")]
        defmt::trace!("💃 Dance {} started", id);
        sent
    }

    /// Release of dance `id`
    pub fn release(&mut self, id: u8, sink: &mut dyn ReportSink) -> usize {
        let index = usize::from(id);
        let Some(state) = self.states.get_mut(index) else {
            return 0;
        };
        state.pressed = false;
        match state.phase {
            DancePhase::Settled => self.reset(index, sink),
            DancePhase::Counting | DancePhase::Idle => 0,
        }
    }

    /// Timer for dance `id` fired at `at`; stale timers are ignored
    pub fn timeout(&mut self, id: u8, at: Instant, sink: &mut dyn ReportSink) -> usize {
        let index = usize::from(id);
        match self.states.get(index) {
            Some(state)
                if state.phase == DancePhase::Counting
                    && state.deadline.is_some_and(|deadline| at >= deadline) =>
            {
                self.settle(index, sink)
            }
            _ => 0,
        }
    }

    /// Settle every expired dance
    pub fn expire(&mut self, now: Instant, sink: &mut dyn ReportSink) -> usize {
        let mut sent = 0;
        for id in 0..self.states.len() {
            sent += self.timeout(id as u8, now, sink);
        }
        sent
    }

    /// Another key was pressed: every counting dance except `except`
    /// settles right now with what it has counted so far.
    pub fn interrupt(&mut self, except: Option<u8>, sink: &mut dyn ReportSink) -> usize {
        let mut sent = 0;
        for index in 0..self.states.len() {
            if except == Some(index as u8) || self.states[index].phase != DancePhase::Counting {
                continue;
            }
            self.states[index].interrupted = true;
            #[cfg(feature = "defmt")]
            defmt::debug!("✋ Dance {} interrupted", index);
            sent += self.settle(index, sink);
        }
        sent
    }

    fn settle(&mut self, index: usize, sink: &mut dyn ReportSink) -> usize {
        let state = &mut self.states[index];
        let outcome = classify(state.tap_count, state.pressed && !state.interrupted);
        state.last_outcome = outcome;
        state.phase = DancePhase::Settled;
        state.deadline = None;
        let still_pressed = state.pressed;
        #[cfg(feature = "defmt")]
        defmt::debug!("💃 Dance {} settled: {:?}", index, outcome);

        let mut sent = self.handlers[index].on_resolved(outcome, sink);
        if !still_pressed {
            sent += self.reset(index, sink);
        }
        sent
    }

    fn reset(&mut self, index: usize, sink: &mut dyn ReportSink) -> usize {
        let outcome = self.states[index].last_outcome;
        let sent = self.handlers[index].on_reset(outcome, sink);
        self.states[index] = TapDanceState::default();
        sent
    }
}
