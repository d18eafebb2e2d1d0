//! CH32V203 direct-pin wiring
//!
//! Every switch sits between its own GPIO and ground, with the internal
//! pull-up enabled. GPIO blocks follow the STM32F1 register layout.

use core::convert::Infallible;
use core::ptr;
use embedded_hal::digital::{ErrorType, InputPin};
use keyflow_core::{DirectScanner, KeyPos, PinSwitch};

/// Physical keys on the board: 3x10 plus 3 thumb keys
pub const KEY_COUNT: usize = 33;

/// Scanner type of this board
pub type BoardScanner = DirectScanner<PinSwitch<GpioPin>, KEY_COUNT>;

const RCC_APB2PCENR: usize = 0x4002_1018;

const CFGLR: usize = 0x00;
const CFGHR: usize = 0x04;
const INDR: usize = 0x08;
const OUTDR: usize = 0x0C;

/// Input with pull-up/pull-down (CNF = 0b10, MODE = 0b00)
const INPUT_PULL: u32 = 0b1000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
}

impl Port {
    const fn base(self) -> usize {
        match self {
            Port::A => 0x4001_0800,
            Port::B => 0x4001_0C00,
            Port::C => 0x4001_1000,
        }
    }

    /// Clock enable bit in APB2PCENR
    const fn clock_bit(self) -> u32 {
        match self {
            Port::A => 1 << 2,
            Port::B => 1 << 3,
            Port::C => 1 << 4,
        }
    }
}

/// One GPIO configured as pulled-up input
pub struct GpioPin {
    port: Port,
    pin: u8,
}

impl GpioPin {
    /// Configure `pin` of `port` as input with pull-up
    pub fn pull_up(port: Port, pin: u8) -> Self {
        let base = port.base();
        let (config, shift) = if pin < 8 {
            (base + CFGLR, u32::from(pin) * 4)
        } else {
            (base + CFGHR, u32::from(pin - 8) * 4)
        };

        // SAFETY: fixed MMIO addresses of this chip; accessed only during
        // single-threaded init before the executor starts.
        unsafe {
            let clocks = RCC_APB2PCENR as *mut u32;
            ptr::write_volatile(clocks, ptr::read_volatile(clocks) | port.clock_bit());

            let config = config as *mut u32;
            let value = ptr::read_volatile(config) & !(0xF << shift);
            ptr::write_volatile(config, value | (INPUT_PULL << shift));

            // OUTDR selects pull-up over pull-down
            let output = (base + OUTDR) as *mut u32;
            ptr::write_volatile(output, ptr::read_volatile(output) | (1 << pin));
        }

        Self { port, pin }
    }
}

impl ErrorType for GpioPin {
    type Error = Infallible;
}

impl InputPin for GpioPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        // SAFETY: read-only access to the input data register
        let level = unsafe { ptr::read_volatile((self.port.base() + INDR) as *const u32) };
        Ok(level & (1 << self.pin) != 0)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Pin and matrix position of every key, left to right, top to bottom
const WIRING: [(Port, u8, KeyPos); KEY_COUNT] = [
    (Port::A, 0, KeyPos::new(0, 0)),
    (Port::A, 1, KeyPos::new(0, 1)),
    (Port::A, 2, KeyPos::new(0, 2)),
    (Port::A, 3, KeyPos::new(0, 3)),
    (Port::A, 4, KeyPos::new(0, 4)),
    (Port::A, 5, KeyPos::new(0, 5)),
    (Port::A, 6, KeyPos::new(0, 6)),
    (Port::A, 7, KeyPos::new(0, 7)),
    (Port::A, 8, KeyPos::new(0, 8)),
    (Port::A, 9, KeyPos::new(0, 9)),
    (Port::A, 10, KeyPos::new(1, 0)),
    (Port::A, 11, KeyPos::new(1, 1)),
    (Port::A, 12, KeyPos::new(1, 2)),
    (Port::A, 15, KeyPos::new(1, 3)),
    (Port::B, 0, KeyPos::new(1, 4)),
    (Port::B, 1, KeyPos::new(1, 5)),
    (Port::B, 2, KeyPos::new(1, 6)),
    (Port::B, 3, KeyPos::new(1, 7)),
    (Port::B, 4, KeyPos::new(1, 8)),
    (Port::B, 5, KeyPos::new(1, 9)),
    (Port::B, 6, KeyPos::new(2, 0)),
    (Port::B, 7, KeyPos::new(2, 1)),
    (Port::B, 8, KeyPos::new(2, 2)),
    (Port::B, 9, KeyPos::new(2, 3)),
    (Port::B, 10, KeyPos::new(2, 4)),
    (Port::B, 11, KeyPos::new(2, 5)),
    (Port::B, 12, KeyPos::new(2, 6)),
    (Port::B, 13, KeyPos::new(2, 7)),
    (Port::B, 14, KeyPos::new(2, 8)),
    (Port::B, 15, KeyPos::new(2, 9)),
    (Port::C, 13, KeyPos::new(3, 0)),
    (Port::C, 14, KeyPos::new(3, 1)),
    (Port::C, 15, KeyPos::new(3, 2)),
];

/// Configure every key pin and build the scanner
pub fn init_scanner() -> BoardScanner {
    #[cfg(feature = "defmt")]
    defmt::info!("🔌 Configuring {} key pins", KEY_COUNT);

    let switches = WIRING.map(|(port, pin, _)| PinSwitch::new(GpioPin::pull_up(port, pin)));
    let positions = WIRING.map(|(_, _, pos)| pos);
    DirectScanner::new(switches, positions)
}
