//! Embassy time driver on the CH32V203 SysTick counter
//!
//! SysTick interrupts at the embassy tick rate and advances a 64-bit tick
//! counter. One alarm is supported, which is all the generic timer queue needs.

use core::cell::Cell;
use core::ptr;
use critical_section::Mutex;
use embassy_time_driver::{AlarmHandle, Driver, TICK_HZ};
use portable_atomic::{AtomicBool, AtomicU64, Ordering};

const STK_CTLR: usize = 0xE000_F000;
const STK_SR: usize = 0xE000_F004;
const STK_CMPLR: usize = 0xE000_F010;

/// Counter enable, interrupt enable, HCLK source, auto reload
const STK_CTLR_RUN: u32 = 0b1111;

struct Alarm {
    timestamp: Cell<u64>,
    callback: Cell<Option<(fn(*mut ()), *mut ())>>,
}

// The context pointer is only handed back to the executor that registered it
unsafe impl Send for Alarm {}

/// Tick counter with a single alarm
pub struct TickDriver {
    ticks: AtomicU64,
    allocated: AtomicBool,
    alarm: Mutex<Alarm>,
}

impl TickDriver {
    const fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            allocated: AtomicBool::new(false),
            alarm: Mutex::new(Alarm {
                timestamp: Cell::new(u64::MAX),
                callback: Cell::new(None),
            }),
        }
    }

    fn tick(&self) {
        let now = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        let due = critical_section::with(|cs| {
            let alarm = self.alarm.borrow(cs);
            if now >= alarm.timestamp.get() {
                alarm.timestamp.set(u64::MAX);
                alarm.callback.get()
            } else {
                None
            }
        });
        if let Some((callback, ctx)) = due {
            callback(ctx);
        }
    }
}

impl Driver for TickDriver {
    fn now(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    unsafe fn allocate_alarm(&self) -> Option<AlarmHandle> {
        if self.allocated.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(AlarmHandle::new(0))
        }
    }

    fn set_alarm_callback(&self, _alarm: AlarmHandle, callback: fn(*mut ()), ctx: *mut ()) {
        critical_section::with(|cs| self.alarm.borrow(cs).callback.set(Some((callback, ctx))));
    }

    fn set_alarm(&self, _alarm: AlarmHandle, timestamp: u64) -> bool {
        critical_section::with(|cs| {
            if timestamp <= self.now() {
                // Already due; the caller polls right away
                false
            } else {
                self.alarm.borrow(cs).timestamp.set(timestamp);
                true
            }
        })
    }
}

embassy_time_driver::time_driver_impl!(static DRIVER: TickDriver = TickDriver::new());

/// Start SysTick at the embassy tick rate from a core clock of `hclk_hz`
pub fn init(hclk_hz: u32) {
    let reload = hclk_hz / TICK_HZ as u32;
    // SAFETY: SysTick registers of this chip, written once before interrupts are enabled
    unsafe {
        ptr::write_volatile(STK_CMPLR as *mut u32, reload.saturating_sub(1));
        ptr::write_volatile(STK_SR as *mut u32, 0);
        ptr::write_volatile(STK_CTLR as *mut u32, STK_CTLR_RUN);
    }

    #[cfg(feature = "defmt")]
    defmt::info!("⏱️ SysTick running at {} Hz", TICK_HZ);
}

/// Body of the SysTick interrupt handler
pub fn on_tick() {
    // SAFETY: clears the compare flag, nothing else lives in this register
    unsafe { ptr::write_volatile(STK_SR as *mut u32, 0) };
    DRIVER.tick();
}
