//! Embassy tasks: scanning, resolution and report output

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::{with_deadline, Duration, Instant, Timer};
use heapless::spsc::{Consumer, Producer};
use heapless::Vec;
use keyflow_core::{HidEvent, InputEvent, KeyEvent};

use crate::board::BoardResolver;
use crate::hardware::{BoardScanner, KEY_COUNT};
use crate::hid::BootReport;

/// Depth of the scanner to resolver channel
pub const EVENT_QUEUE: usize = 16;

/// Depth of the resolver to report queue
pub const REPORT_QUEUE: usize = 64;

/// Interval between two scans; switches are debounced in hardware
pub const SCAN_INTERVAL: Duration = Duration::from_millis(1);

pub type KeyEventChannel = Channel<CriticalSectionRawMutex, KeyEvent, EVENT_QUEUE>;

/// Sample the switches and push edges to the resolver
#[embassy_executor::task]
pub async fn scan_task(
    mut scanner: BoardScanner,
    events: Sender<'static, CriticalSectionRawMutex, KeyEvent, EVENT_QUEUE>,
) {
    #[cfg(feature = "defmt")]
    defmt::info!("🔍 Scan task started");

    let mut batch: Vec<KeyEvent, KEY_COUNT> = Vec::new();
    loop {
        batch.clear();
        match scanner.scan(Instant::now(), &mut batch) {
            Ok(_) => {
                for event in batch.iter() {
                    events.send(*event).await;
                }
            }
            Err(_error) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("⚠️ Scan failed: {:?}", _error);
            }
        }
        Timer::after(SCAN_INTERVAL).await;
    }
}

/// Feed key edges and expired deadlines into the resolver
#[embassy_executor::task]
pub async fn resolver_task(
    mut resolver: BoardResolver,
    events: Receiver<'static, CriticalSectionRawMutex, KeyEvent, EVENT_QUEUE>,
    mut reports: Producer<'static, HidEvent, REPORT_QUEUE>,
) {
    #[cfg(feature = "defmt")]
    defmt::info!("🧠 Resolver task started");

    loop {
        let input = match resolver.next_deadline() {
            Some((at, timer)) => match with_deadline(at, events.receive()).await {
                Ok(event) => InputEvent::Key(event),
                Err(_) => InputEvent::Timeout { timer, at },
            },
            None => InputEvent::Key(events.receive().await),
        };
        resolver.process(input, &mut reports);
    }
}

/// Fold HID edges into the boot report and hand it to the USB stack
#[embassy_executor::task]
pub async fn report_task(mut reports: Consumer<'static, HidEvent, REPORT_QUEUE>) {
    #[cfg(feature = "defmt")]
    defmt::info!("📤 Report task started");

    let mut report = BootReport::new();
    loop {
        match reports.dequeue() {
            Some(event) => {
                if report.apply(event) {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("📡 Report {:02x}", report.to_bytes());
                }
            }
            None => Timer::after(Duration::from_millis(1)).await,
        }
    }
}
