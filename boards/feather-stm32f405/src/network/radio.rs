#![deny(unsafe_code)]
#![deny(warnings)]
//! WiFi co-processor bring-up
//!
//! An ESP32 running esp-hosted firmware sits on SPI2 and provides the
//! 802.11 interface; embassy-net runs on the STM32 side.

use defmt::info;
use embassy_embedded_hal::shared_bus::asynch::spi::SpiDevice as SpiDeviceBus;
use embassy_net_esp_hosted::{Control, NetDriver, Runner, State};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::Output;
use embassy_stm32::mode::Async;
use embassy_stm32::spi::Spi;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use static_cell::StaticCell;

type SpiBus = embassy_sync::mutex::Mutex<CriticalSectionRawMutex, Spi<'static, Async>>;

/// SPI device handed to the esp-hosted driver
pub type RadioSpi =
    SpiDeviceBus<'static, CriticalSectionRawMutex, Spi<'static, Async>, Output<'static>>;

/// Runner that must be polled for the co-processor to work
pub type RadioRunner = Runner<'static, RadioSpi, ExtiInput<'static>, Output<'static>>;

/// Co-processor wiring
pub struct RadioPeripherals {
    pub spi: Spi<'static, Async>,
    pub cs: Output<'static>,
    pub reset: Output<'static>,
    /// Co-processor ready for a transfer
    pub handshake: ExtiInput<'static>,
    /// Co-processor has data for the host
    pub ready: ExtiInput<'static>,
}

/// Reset the co-processor and start the esp-hosted driver
///
/// Returns the embassy-net device, the control handle for join/leave and the
/// runner.
pub async fn init_radio(
    periph: RadioPeripherals,
) -> (NetDriver<'static>, Control<'static>, RadioRunner) {
    let RadioPeripherals {
        spi,
        cs,
        reset,
        handshake,
        ready,
    } = periph;

    static SPI_BUS: StaticCell<SpiBus> = StaticCell::new();
    let spi_bus = SPI_BUS.init(embassy_sync::mutex::Mutex::new(spi));
    let spi_device = SpiDeviceBus::new(spi_bus, cs);

    static STATE: StaticCell<State> = StaticCell::new();
    let state = STATE.init(State::new());

    let (device, control, runner) =
        embassy_net_esp_hosted::new(state, spi_device, handshake, ready, reset).await;

    info!("esp-hosted driver started");

    (device, control, runner)
}
