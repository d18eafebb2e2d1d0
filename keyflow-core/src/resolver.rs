//! Resolver: the owned pipeline from matrix edges to HID edges
//!
//! Every input goes through the same stages in a fixed order:
//! keymap lookup, combo detection, tap-dance, interceptor, dispatcher.
//! Timer expiries enter the same path as [`InputEvent::Timeout`].

use heapless::Vec;
use crate::combo::{ComboDefinition, ComboDetector, StageOutput};
use crate::defaults::MAX_HELD_KEYS;
use crate::dispatch::Dispatcher;
use crate::hal::{HalError, Instant, ReportSink};
use crate::intercept::Interceptor;
use crate::keycode::Keycode;
use crate::keymap::KeymapLookup;
use crate::report::KeyRegistry;
use crate::tap_dance::{DanceHandler, TapDanceEngine};
use crate::timing::{TimeoutOverride, TimingPolicy};
use crate::types::{InputEvent, KeyEvent, KeyPos, LayerState, ResolvedEvent, ResolverConfig, TimerId};

/// Static tables a resolver is built from
pub struct ResolverTables<'a, K> {
    pub keymap: &'a K,
    pub combos: &'a [ComboDefinition<'a>],
    pub dances: &'a [&'a dyn DanceHandler],
    pub timeouts: &'a [TimeoutOverride],
}

/// Key event resolution context
pub struct Resolver<'a, K> {
    keymap: &'a K,
    config: ResolverConfig,
    timing: TimingPolicy<'a>,
    layers: LayerState,
    combos: ComboDetector<'a>,
    dances: TapDanceEngine<'a>,
    interceptor: Interceptor,
    dispatcher: Dispatcher,
    /// Keycode each held position resolved to at press time
    held: Vec<(KeyPos, Keycode), MAX_HELD_KEYS>,
    /// HID keys pressed on behalf of one or more sources
    registry: KeyRegistry,
}

impl<'a, K> Resolver<'a, K>
where
    K: KeymapLookup,
{
    /// Create a resolver; fails if a table exceeds its capacity or is malformed
    pub fn new(config: ResolverConfig, tables: ResolverTables<'a, K>) -> Result<Self, HalError> {
        #[cfg(feature = "defmt")]
        defmt::info!(
            "🔧 Resolver: {} combos, {} dances, term {}ms",
            tables.combos.len(),
            tables.dances.len(),
            config.tapping_term.as_millis()
        );

        Ok(Self {
            keymap: tables.keymap,
            config,
            timing: TimingPolicy::from_config(&config, tables.timeouts),
            layers: LayerState::new(),
            combos: ComboDetector::new(tables.combos, config.combo_term)?,
            dances: TapDanceEngine::new(tables.dances)?,
            interceptor: Interceptor::new(config.raise_layer),
            dispatcher: Dispatcher::new(),
            held: Vec::new(),
            registry: KeyRegistry::new(),
        })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn layers(&self) -> &LayerState {
        &self.layers
    }

    pub fn combos(&self) -> &ComboDetector<'a> {
        &self.combos
    }

    pub fn dances(&self) -> &TapDanceEngine<'a> {
        &self.dances
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    /// Handle one input. Returns the number of edges the report stage took.
    pub fn process(&mut self, input: InputEvent, sink: &mut dyn ReportSink) -> usize {
        self.gated(sink, |resolver, sink| match input {
            InputEvent::Key(event) => resolver.process_key(event, sink),
            InputEvent::Timeout { timer, at } => {
                #[cfg(feature = "defmt")]
                defmt::trace!("⏰ Timeout {:?} at {}ms", timer, at.as_millis());
                let sent = resolver.fire(timer, at, sink);
                sent + resolver.fire_due(at, sink)
            }
        })
    }

    /// Earliest deadline the platform should arm a timer for
    pub fn next_deadline(&self) -> Option<(Instant, TimerId)> {
        let combo = self.combos.next_deadline().map(|at| (at, TimerId::Combo));
        let dance = self
            .dances
            .next_deadline()
            .map(|(at, id)| (at, TimerId::TapDance(id)));
        let hold = self.dispatcher.next_deadline().map(|at| (at, TimerId::HoldTap));

        [combo, dance, hold]
            .into_iter()
            .flatten()
            .min_by_key(|(at, _)| *at)
    }

    /// Fire every deadline at or before `now`, oldest first
    pub fn poll(&mut self, now: Instant, sink: &mut dyn ReportSink) -> usize {
        self.gated(sink, |resolver, sink| resolver.fire_due(now, sink))
    }

    /// Run `stages` with every HID edge going through the key registry
    fn gated(
        &mut self,
        sink: &mut dyn ReportSink,
        stages: impl FnOnce(&mut Self, &mut dyn ReportSink) -> usize,
    ) -> usize {
        let mut registry = core::mem::take(&mut self.registry);
        let sent = stages(self, &mut registry.gate(sink));
        self.registry = registry;
        sent
    }

    fn fire_due(&mut self, now: Instant, sink: &mut dyn ReportSink) -> usize {
        let mut sent = 0;
        while let Some((at, timer)) = self.next_deadline() {
            if at > now {
                break;
            }
            sent += self.fire(timer, at, sink);
        }
        sent
    }

    fn process_key(&mut self, event: KeyEvent, sink: &mut dyn ReportSink) -> usize {
        let mut sent = self.fire_due(event.time, sink);

        let keycode = if event.pressed {
            // A pending hold-tap is decided before lookup so its layer applies here
            sent += self.dispatcher.interrupt(&mut self.layers, sink);
            let keycode = self.keymap.lookup(&self.layers, event.pos);
            // Counting dances settle on the physical press, even if the
            // combo stage holds this press back
            sent += self.dances.interrupt(keycode.tap_dance_id(), sink);
            self.remember(event.pos, keycode);
            keycode
        } else {
            self.forget(event.pos)
                .unwrap_or_else(|| self.keymap.lookup(&self.layers, event.pos))
        };

        #[cfg(feature = "defmt")]
        defmt::trace!("⌨️ {:?} {} -> {:?}", event.pos, event.pressed, keycode);

        let mut staged = StageOutput::new();
        self.combos.process(ResolvedEvent::matrix(event, keycode), &mut staged);
        sent + self.forward(staged, sink)
    }

    fn fire(&mut self, timer: TimerId, at: Instant, sink: &mut dyn ReportSink) -> usize {
        match timer {
            TimerId::TapDance(id) => self.dances.timeout(id, at, sink),
            TimerId::HoldTap => self.dispatcher.timeout(at, &mut self.layers, sink),
            TimerId::Combo => {
                let mut staged = StageOutput::new();
                self.combos.timeout(at, &mut staged);
                self.forward(staged, sink)
            }
        }
    }

    /// Run events released by the combo stage through the remaining stages
    fn forward(&mut self, staged: StageOutput, sink: &mut dyn ReportSink) -> usize {
        let mut sent = 0;
        for event in staged {
            let dance = event.keycode.tap_dance_id();
            if event.pressed {
                // Undecided keys settle before the interrupting press goes further
                sent += self.dances.interrupt(dance, sink);
                sent += self.dispatcher.interrupt(&mut self.layers, sink);
            }

            sent += match dance {
                Some(id) if event.pressed => {
                    let timeout = self.timing.resolve_hold_timeout(event.keycode);
                    self.dances.press(id, event.time, timeout, sink)
                }
                Some(id) => self.dances.release(id, sink),
                None if self.interceptor.handle(&event, &mut self.layers).is_consumed() => 0,
                None => {
                    let timeout = self.timing.resolve_hold_timeout(event.keycode);
                    self.dispatcher
                        .process(&event, timeout, &mut self.layers, sink)
                }
            };
        }
        sent
    }

    fn remember(&mut self, pos: KeyPos, keycode: Keycode) {
        self.held.retain(|(held, _)| *held != pos);
        if self.held.push((pos, keycode)).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("⚠️ Too many keys held, {:?} not tracked", pos);
        }
    }

    fn forget(&mut self, pos: KeyPos) -> Option<Keycode> {
        let index = self.held.iter().position(|(held, _)| *held == pos)?;
        Some(self.held.swap_remove(index).1)
    }
}
