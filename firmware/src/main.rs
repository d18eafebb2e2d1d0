#![no_std]
#![no_main]

#[cfg(feature = "defmt")]
use defmt_rtt as _;

// RISC-V runtime
use riscv_rt as _;

// Panic handler
use panic_halt as _;

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use heapless::spsc::Queue;
use static_cell::StaticCell;

use keyflow_firmware::*;

/// Core clock after reset (internal 8 MHz HSI)
const HCLK_HZ: u32 = 8_000_000;

// Static resources
static KEY_EVENTS: KeyEventChannel = KeyEventChannel::new();
static REPORTS: StaticCell<Queue<HidEvent, REPORT_QUEUE>> = StaticCell::new();

/// Main firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    #[cfg(feature = "defmt")]
    defmt::info!("🔧 Keyflow firmware v{} starting...", VERSION);

    time_driver::init(HCLK_HZ);
    let scanner = hardware::init_scanner();

    let resolver = match board::resolver(default_config()) {
        Ok(resolver) => resolver,
        Err(_error) => {
            #[cfg(feature = "defmt")]
            defmt::error!("❌ Invalid board tables: {:?}", _error);
            loop {
                Timer::after(Duration::from_secs(1)).await;
            }
        }
    };

    let queue = REPORTS.init(Queue::new());
    let (producer, consumer) = queue.split();

    #[cfg(feature = "defmt")]
    defmt::info!("🚀 Spawning tasks...");

    spawner.must_spawn(scan_task(scanner, KEY_EVENTS.sender()));
    spawner.must_spawn(resolver_task(resolver, KEY_EVENTS.receiver(), producer));
    spawner.must_spawn(report_task(consumer));

    #[cfg(feature = "defmt")]
    defmt::info!("✨ Keyboard ready!");

    // Main supervision loop
    loop {
        Timer::after(Duration::from_secs(1)).await;
        #[cfg(feature = "defmt")]
        defmt::trace!("💓 Heartbeat");
    }
}

/// SysTick interrupt, wired through the vector table by the runtime
#[no_mangle]
#[allow(non_snake_case)]
extern "C" fn SysTick() {
    time_driver::on_tick();
}
