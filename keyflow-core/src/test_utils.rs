//! Test utilities for resolver scenarios

#[cfg(feature = "test-utils")]
pub mod event_script {
    //! Scripted key input on a virtual clock

    use crate::hal::Instant;
    use crate::types::{KeyEvent, KeyPos};

    /// Ordered list of key edges with virtual timestamps
    #[derive(Debug, Clone, Default)]
    pub struct EventScript {
        events: Vec<KeyEvent>,
        now: u64,
    }

    impl EventScript {
        pub fn new() -> Self {
            Self::default()
        }

        /// Current virtual time in milliseconds
        pub fn now(&self) -> Instant {
            Instant::from_millis(self.now)
        }

        /// Move the clock forward
        pub fn wait(mut self, ms: u64) -> Self {
            self.now += ms;
            self
        }

        /// Move the clock to an absolute time; never goes backwards
        pub fn at(mut self, ms: u64) -> Self {
            self.now = self.now.max(ms);
            self
        }

        pub fn press(mut self, pos: KeyPos) -> Self {
            self.events.push(KeyEvent::press(pos, self.now()));
            self
        }

        pub fn release(mut self, pos: KeyPos) -> Self {
            self.events.push(KeyEvent::release(pos, self.now()));
            self
        }

        /// Press, hold for `hold_ms`, release
        pub fn tap(self, pos: KeyPos, hold_ms: u64) -> Self {
            self.press(pos).wait(hold_ms).release(pos)
        }

        /// Tap `count` times with `gap_ms` between a release and the next press
        pub fn taps(mut self, pos: KeyPos, count: usize, hold_ms: u64, gap_ms: u64) -> Self {
            for tap in 0..count {
                if tap > 0 {
                    self = self.wait(gap_ms);
                }
                self = self.tap(pos, hold_ms);
            }
            self
        }

        pub fn events(&self) -> &[KeyEvent] {
            &self.events
        }
    }
}

#[cfg(feature = "test-utils")]
pub mod output_capture {
    //! Report sink recording everything the resolver sends

    use crate::hal::{HalError, ReportSink};
    use crate::keycode::KeyCode;
    use crate::types::HidEvent;

    /// Unbounded recorder with host-side held-key tracking
    #[derive(Debug, Default, Clone)]
    pub struct OutputRecorder {
        events: Vec<HidEvent>,
        held: Vec<KeyCode>,
        /// Keys that were released without being held
        spurious_releases: usize,
    }

    impl OutputRecorder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> &[HidEvent] {
            &self.events
        }

        pub fn held(&self) -> &[KeyCode] {
            &self.held
        }

        pub fn is_held(&self, key: KeyCode) -> bool {
            self.held.contains(&key)
        }

        pub fn spurious_releases(&self) -> usize {
            self.spurious_releases
        }

        /// Number of presses of `key`
        pub fn presses(&self, key: KeyCode) -> usize {
            self.events
                .iter()
                .filter(|event| **event == HidEvent::Press(key))
                .count()
        }

        /// Number of releases of `key`
        pub fn releases(&self, key: KeyCode) -> usize {
            self.events
                .iter()
                .filter(|event| **event == HidEvent::Release(key))
                .count()
        }

        /// Keys pressed, in order
        pub fn pressed_keys(&self) -> Vec<KeyCode> {
            self.events
                .iter()
                .filter_map(|event| match event {
                    HidEvent::Press(key) => Some(*key),
                    HidEvent::Release(_) => None,
                })
                .collect()
        }

        pub fn clear(&mut self) {
            self.events.clear();
        }
    }

    impl ReportSink for OutputRecorder {
        fn send(&mut self, event: HidEvent) -> Result<(), HalError> {
            match event {
                HidEvent::Press(key) => {
                    if !self.held.contains(&key) {
                        self.held.push(key);
                    }
                }
                HidEvent::Release(key) => {
                    let before = self.held.len();
                    self.held.retain(|held| *held != key);
                    if self.held.len() == before {
                        self.spurious_releases += 1;
                    }
                }
            }
            self.events.push(event);
            Ok(())
        }
    }
}

#[cfg(feature = "test-utils")]
pub mod runner {
    //! Drives a resolver like the firmware task does

    use super::event_script::EventScript;
    use crate::hal::{Instant, ReportSink};
    use crate::keymap::KeymapLookup;
    use crate::resolver::Resolver;
    use crate::types::InputEvent;

    /// Deliver every timer that would fire before `until`, as the platform would
    pub fn fire_timers<K: KeymapLookup>(
        resolver: &mut Resolver<'_, K>,
        until: Instant,
        sink: &mut dyn ReportSink,
    ) -> usize {
        let mut sent = 0;
        while let Some((at, timer)) = resolver.next_deadline() {
            if at > until {
                break;
            }
            sent += resolver.process(InputEvent::Timeout { timer, at }, sink);
        }
        sent
    }

    /// Feed the script with timers interleaved, then let every pending timer fire
    pub fn run_script<K: KeymapLookup>(
        resolver: &mut Resolver<'_, K>,
        script: &EventScript,
        sink: &mut dyn ReportSink,
    ) -> usize {
        let mut sent = 0;
        for event in script.events() {
            sent += fire_timers(resolver, event.time, sink);
            sent += resolver.process((*event).into(), sink);
        }
        while let Some((at, timer)) = resolver.next_deadline() {
            sent += resolver.process(InputEvent::Timeout { timer, at }, sink);
        }
        sent
    }
}
