//! Combo detector: substitutes one synthetic key for a chord of keys
//!
//! Presses of keys that take part in some combo are held back in a small
//! buffer. Each combo opens its own window at its first member press. If
//! every member goes down before that window closes, the buffered member
//! presses are swallowed and the combo's result is pressed instead. When a
//! window closes, buffered presses that no other open chord still waits for
//! are replayed from the front of the buffer, in arrival order.
//!
//! When several combos complete on the same press, the one defined first wins.

use heapless::Vec;
use crate::defaults::{COMBO_BUFFER, MAX_COMBOS, MAX_COMBO_KEYS, STAGE_OUTPUT};
use crate::hal::{Duration, HalError, Instant};
use crate::keycode::Keycode;
use crate::types::{KeyPos, KeySource, ResolvedEvent};

/// Events handed to the next stage for one input
pub type StageOutput = Vec<ResolvedEvent, STAGE_OUTPUT>;

/// Static definition of one combo
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ComboDefinition<'a> {
    /// Keys that must be down together; order does not matter
    pub members: &'a [Keycode],
    /// Keycode emitted instead of the members
    pub result: Keycode,
}

impl<'a> ComboDefinition<'a> {
    pub const fn new(members: &'a [Keycode], result: Keycode) -> Self {
        Self { members, result }
    }

    fn member_index(&self, keycode: Keycode) -> Option<usize> {
        self.members.iter().position(|member| *member == keycode)
    }

    fn full_mask(&self) -> u8 {
        ((1u16 << self.members.len()) - 1) as u8
    }
}

/// Runtime state of one combo
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComboRuntimeState {
    /// Bit `i` set when member `i` is down in the buffer
    pressed: u8,
    /// First member press of the chord being collected
    first_press: Option<Instant>,
    /// Positions owned by the fired combo until they are released
    claimed: Vec<KeyPos, MAX_COMBO_KEYS>,
    /// Synthetic release already sent
    released: bool,
}

impl ComboRuntimeState {
    /// Returns true while the fired combo still owns some of its keys
    pub fn is_active(&self) -> bool {
        !self.claimed.is_empty()
    }

    /// Number of members currently seen down
    pub fn pressed_members(&self) -> u32 {
        self.pressed.count_ones()
    }

    /// Start of this combo's window, while a chord is being collected
    pub fn first_press(&self) -> Option<Instant> {
        self.first_press
    }

    fn clear_partial(&mut self) {
        self.pressed = 0;
        self.first_press = None;
    }
}

/// Chord matcher over the live event stream
pub struct ComboDetector<'a> {
    combos: &'a [ComboDefinition<'a>],
    states: Vec<ComboRuntimeState, MAX_COMBOS>,
    buffer: Vec<ResolvedEvent, COMBO_BUFFER>,
    term: Duration,
}

impl<'a> ComboDetector<'a> {
    /// Create a detector; combo `i` reports its synthetic key as `KeySource::Combo(i)`
    pub fn new(combos: &'a [ComboDefinition<'a>], term: Duration) -> Result<Self, HalError> {
        let mut states = Vec::new();
        for combo in combos {
            if combo.members.len() < 2 || combo.members.len() > MAX_COMBO_KEYS {
                return Err(HalError::InvalidConfig);
            }
            let duplicated = combo
                .members
                .iter()
                .enumerate()
                .any(|(i, member)| combo.members[..i].contains(member));
            if duplicated {
                return Err(HalError::InvalidConfig);
            }
            states
                .push(ComboRuntimeState::default())
                .map_err(|_| HalError::CapacityExceeded)?;
        }
        Ok(Self {
            combos,
            states,
            buffer: Vec::new(),
            term,
        })
    }

    /// State of combo `id`
    pub fn state(&self, id: u8) -> Option<&ComboRuntimeState> {
        self.states.get(usize::from(id))
    }

    /// Returns true if `keycode` takes part in any combo
    pub fn is_member(&self, keycode: Keycode) -> bool {
        self.combos.iter().any(|combo| combo.member_index(keycode).is_some())
    }

    /// Number of presses currently held back
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Earliest end among the open combo windows
    pub fn next_deadline(&self) -> Option<Instant> {
        self.states
            .iter()
            .filter_map(|state| state.first_press)
            .min()
            .map(|first| first + self.term)
    }

    /// Feed one event; everything the next stage should see is appended to `out`
    pub fn process(&mut self, event: ResolvedEvent, out: &mut StageOutput) {
        let KeySource::Matrix(pos) = event.source else {
            emit(out, event);
            return;
        };

        self.expire(event.time, out);
        if event.pressed {
            if !self.is_member(event.keycode) {
                // Any other key breaks the chord
                self.abandon(out);
                emit(out, event);
                return;
            }
            if self.buffer.is_full() {
                self.abandon(out);
            }
            // Capacity was just ensured
            let _ = self.buffer.push(event);
            self.mark_pressed(event.keycode, event.time);
            if let Some(id) = self.completed() {
                self.fire(id, event.time, out);
            }
        } else if let Some(id) = self.claiming(pos) {
            self.release_claimed(id, pos, event.time, out);
        } else {
            if self.buffer.iter().any(|buffered| buffered.pos() == Some(pos)) {
                #[cfg(feature = "defmt")]
                defmt::debug!("🎹 Combo abandoned by early release");
                self.abandon(out);
            }
            emit(out, event);
        }
    }

    /// Combo window timer fired at `at`; stale timers are ignored
    pub fn timeout(&mut self, at: Instant, out: &mut StageOutput) {
        self.expire(at, out);
    }

    /// Close every window that has ended by `now` and replay what no open
    /// chord still needs
    pub fn expire(&mut self, now: Instant, out: &mut StageOutput) {
        let term = self.term;
        let mut expired = false;
        for (_id, state) in self.states.iter_mut().enumerate() {
            if state.first_press.is_some_and(|first| now >= first + term) {
                #[cfg(feature = "defmt")]
                defmt::debug!("🎹 Combo {} window expired", _id);
                state.clear_partial();
                expired = true;
            }
        }
        if expired {
            self.flush_unneeded(out);
        }
    }

    fn mark_pressed(&mut self, keycode: Keycode, time: Instant) {
        for (combo, state) in self.combos.iter().zip(self.states.iter_mut()) {
            if state.is_active() {
                continue;
            }
            if let Some(index) = combo.member_index(keycode) {
                state.first_press.get_or_insert(time);
                state.pressed |= 1 << index;
            }
        }
    }

    /// Returns true if an open chord counts `event` as one of its members
    fn is_needed(&self, event: &ResolvedEvent) -> bool {
        self.combos
            .iter()
            .zip(self.states.iter())
            .any(|(combo, state)| match (state.first_press, combo.member_index(event.keycode)) {
                (Some(first), Some(index)) => event.time >= first && state.pressed & (1 << index) != 0,
                _ => false,
            })
    }

    /// Replay buffered presses from the front until one is still needed
    fn flush_unneeded(&mut self, out: &mut StageOutput) {
        while let Some(front) = self.buffer.first().copied() {
            if self.is_needed(&front) {
                break;
            }
            self.buffer.remove(0);
            emit(out, front);
        }
    }

    fn completed(&self) -> Option<usize> {
        self.combos
            .iter()
            .zip(self.states.iter())
            .position(|(combo, state)| !state.is_active() && state.pressed == combo.full_mask())
    }

    fn claiming(&self, pos: KeyPos) -> Option<usize> {
        self.states.iter().position(|state| state.claimed.contains(&pos))
    }

    fn fire(&mut self, id: usize, time: Instant, out: &mut StageOutput) {
        let combo = self.combos[id];
        let since = self.states[id].first_press.unwrap_or(time);
        let mut claimed: Vec<KeyPos, MAX_COMBO_KEYS> = Vec::new();
        let mut claimed_codes: Vec<Keycode, MAX_COMBO_KEYS> = Vec::new();
        let mut replay: Vec<ResolvedEvent, COMBO_BUFFER> = Vec::new();

        // The first press of each member inside this combo's window is swallowed
        for buffered in self.buffer.iter() {
            let is_member =
                combo.member_index(buffered.keycode).is_some() && buffered.time >= since;
            match buffered.pos() {
                Some(pos) if is_member && !claimed_codes.contains(&buffered.keycode) => {
                    let _ = claimed.push(pos);
                    let _ = claimed_codes.push(buffered.keycode);
                }
                _ => {
                    let _ = replay.push(*buffered);
                }
            }
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("🎹 Combo {} fired: {:?}", id, combo.result);

        self.buffer.clear();
        self.reset_partials();
        let state = &mut self.states[id];
        state.claimed = claimed;
        state.released = false;

        // Presses that were not part of the chord still happened first
        for event in replay {
            emit(out, event);
        }
        emit(
            out,
            ResolvedEvent {
                source: KeySource::Combo(id as u8),
                keycode: combo.result,
                pressed: true,
                time,
            },
        );
    }

    fn release_claimed(&mut self, id: usize, pos: KeyPos, time: Instant, out: &mut StageOutput) {
        let result = self.combos[id].result;
        let state = &mut self.states[id];
        state.claimed.retain(|claimed| *claimed != pos);
        if !state.released {
            state.released = true;
            emit(
                out,
                ResolvedEvent {
                    source: KeySource::Combo(id as u8),
                    keycode: result,
                    pressed: false,
                    time,
                },
            );
        }
        if state.claimed.is_empty() {
            *state = ComboRuntimeState::default();
        }
    }

    /// Replay buffered presses as ordinary events
    fn abandon(&mut self, out: &mut StageOutput) {
        for event in self.buffer.iter() {
            emit(out, *event);
        }
        self.buffer.clear();
        self.reset_partials();
    }

    fn reset_partials(&mut self) {
        for state in self.states.iter_mut() {
            state.clear_partial();
        }
    }
}

fn emit(out: &mut StageOutput, event: ResolvedEvent) {
    if out.push(event).is_err() {
        #[cfg(feature = "defmt")]
        defmt::warn!("⚠️ Stage output full, dropped {:?}", event);
    }
}
