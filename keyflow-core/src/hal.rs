//! Hardware Abstraction Layer: time source, report sink and switch inputs

// Re-export time types based on feature
#[cfg(feature = "embassy-time")]
pub use embassy_time::{Duration, Instant};

#[cfg(not(feature = "embassy-time"))]
pub use self::mock_time::{Duration, Instant};

#[cfg(not(feature = "embassy-time"))]
mod mock_time {
    /// Mock instant type for compilation without embassy-time
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Instant(u64);

    impl Instant {
        pub const fn from_millis(ms: u64) -> Self {
            Self(ms)
        }

        pub fn saturating_duration_since(&self, earlier: Instant) -> Duration {
            Duration::from_millis(self.0.saturating_sub(earlier.0))
        }

        pub const fn as_millis(&self) -> u64 {
            self.0
        }
    }

    impl core::ops::Add<Duration> for Instant {
        type Output = Instant;

        fn add(self, rhs: Duration) -> Instant {
            Instant(self.0.saturating_add(rhs.as_millis()))
        }
    }

    /// Mock duration type
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Duration(u64);

    impl Duration {
        pub const fn from_millis(ms: u64) -> Self {
            Self(ms)
        }

        pub const fn as_millis(&self) -> u64 {
            self.0
        }
    }

    impl core::ops::Add for Duration {
        type Output = Duration;

        fn add(self, rhs: Duration) -> Duration {
            Duration(self.0 + rhs.0)
        }
    }

}

use embedded_hal::digital::InputPin;
use heapless::spsc::Producer;
use crate::types::{HidEvent, KeyEvent, KeyPos};
use crate::keycode::KeyCode;

/// Error types for HAL operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// Report queue has no free slot
    QueueFull,
    /// A fixed-capacity table is full
    CapacityExceeded,
    /// Invalid configuration
    InvalidConfig,
    /// GPIO operation failed
    GpioError,
}

#[cfg(feature = "std")]
impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HalError::QueueFull => write!(f, "Report queue is full"),
            HalError::CapacityExceeded => write!(f, "Fixed capacity exceeded"),
            HalError::InvalidConfig => write!(f, "Invalid configuration"),
            HalError::GpioError => write!(f, "GPIO operation failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// Consumer of resolved key edges (the HID report layer)
pub trait ReportSink {
    /// Deliver one key edge
    fn send(&mut self, event: HidEvent) -> Result<(), HalError>;

    /// Key down
    fn register(&mut self, key: KeyCode) -> Result<(), HalError> {
        self.send(HidEvent::Press(key))
    }

    /// Key up
    fn unregister(&mut self, key: KeyCode) -> Result<(), HalError> {
        self.send(HidEvent::Release(key))
    }
}

impl<const N: usize> ReportSink for Producer<'_, HidEvent, N> {
    fn send(&mut self, event: HidEvent) -> Result<(), HalError> {
        self.enqueue(event).map_err(|_| HalError::QueueFull)
    }
}

impl<const N: usize> ReportSink for heapless::Vec<HidEvent, N> {
    fn send(&mut self, event: HidEvent) -> Result<(), HalError> {
        self.push(event).map_err(|_| HalError::QueueFull)
    }
}

/// Trait for a single key switch input
pub trait KeySwitch {
    /// Check if the switch is currently pressed
    fn is_pressed(&mut self) -> Result<bool, HalError>;
}

/// Switch wired directly to an embedded-hal input pin
pub struct PinSwitch<P> {
    pin: P,
}

impl<P> PinSwitch<P>
where
    P: InputPin,
{
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P> KeySwitch for PinSwitch<P>
where
    P: InputPin,
{
    fn is_pressed(&mut self) -> Result<bool, HalError> {
        // Assuming active low (pulled up, grounded when pressed)
        self.pin.is_low().map_err(|_| HalError::GpioError)
    }
}

/// Direct-pin scanner turning switch levels into press/release edges.
///
/// Inputs are expected to be debounced already.
pub struct DirectScanner<S, const N: usize> {
    switches: [S; N],
    positions: [KeyPos; N],
    pressed: [bool; N],
}

impl<S, const N: usize> DirectScanner<S, N>
where
    S: KeySwitch,
{
    /// Create a scanner; `positions[i]` is the matrix position of `switches[i]`
    pub fn new(switches: [S; N], positions: [KeyPos; N]) -> Self {
        Self {
            switches,
            positions,
            pressed: [false; N],
        }
    }

    /// Sample every switch once and append an event for each changed level.
    /// Returns the number of events appended.
    pub fn scan<const M: usize>(
        &mut self,
        now: Instant,
        events: &mut heapless::Vec<KeyEvent, M>,
    ) -> Result<usize, HalError> {
        let mut count = 0;
        for ((switch, pos), last) in self
            .switches
            .iter_mut()
            .zip(self.positions.iter())
            .zip(self.pressed.iter_mut())
        {
            let pressed = switch.is_pressed()?;
            if pressed != *last {
                events
                    .push(KeyEvent::new(*pos, pressed, now))
                    .map_err(|_| HalError::CapacityExceeded)?;
                *last = pressed;
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Mock implementations for testing

    use super::*;
    use core::cell::Cell;

    /// Switch whose level is set by the test
    #[derive(Default)]
    pub struct MockSwitch {
        pressed: Cell<bool>,
        failing: Cell<bool>,
    }

    impl MockSwitch {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_pressed(&self, pressed: bool) {
            self.pressed.set(pressed);
        }

        /// Make the next reads report a GPIO failure
        pub fn set_failing(&self, failing: bool) {
            self.failing.set(failing);
        }
    }

    impl KeySwitch for &MockSwitch {
        fn is_pressed(&mut self) -> Result<bool, HalError> {
            if self.failing.get() {
                return Err(HalError::GpioError);
            }
            Ok(self.pressed.get())
        }
    }

    /// Report sink that records every edge and tracks what is held
    #[derive(Default, Debug)]
    pub struct MockReportSink {
        events: heapless::Vec<HidEvent, 64>,
        held: heapless::Vec<KeyCode, 16>,
    }

    impl MockReportSink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every edge received so far
        pub fn events(&self) -> &[HidEvent] {
            &self.events
        }

        /// Keys currently held down on the host side
        pub fn held(&self) -> &[KeyCode] {
            &self.held
        }

        /// Returns true if `key` is currently held
        pub fn is_held(&self, key: KeyCode) -> bool {
            self.held.contains(&key)
        }

        /// Drop recorded edges, keep held state
        pub fn clear(&mut self) {
            self.events.clear();
        }
    }

    impl ReportSink for MockReportSink {
        fn send(&mut self, event: HidEvent) -> Result<(), HalError> {
            match event {
                HidEvent::Press(key) => {
                    if !self.held.contains(&key) {
                        self.held.push(key).map_err(|_| HalError::CapacityExceeded)?;
                    }
                }
                HidEvent::Release(key) => self.held.retain(|held| *held != key),
            }
            self.events.push(event).map_err(|_| HalError::QueueFull)
        }
    }
}
