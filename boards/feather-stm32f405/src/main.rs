#![deny(unsafe_code)]
#![deny(warnings)]
#![no_main]
#![no_std]
//! Battery presence sensor firmware for the Adafruit Feather STM32F405
//!
//! Every boot is one wake: sample the PIR output on PA0, report a change to
//! InfluxDB over WiFi, then go back to Standby with the next wake source.

use defmt_rtt as _; // global logger
use panic_probe as _;
use rtic::app;
use rtic_monotonics::stm32::prelude::*;

mod device_id;
mod indicator;
mod network;
mod power;
mod retained;
mod settings;
mod watchdog;

stm32_tim2_monotonic!(Mono, 1_000_000);

/// Board identifier of the sensor input, PA0 (WKUP)
const SENSOR_PIN: u8 = 0;

/// IWDG timeout per report attempt, below the ~32 s prescaler limit
const WATCHDOG_TIMEOUT_MS: u32 = 30_000;

const MACHINE_CONFIG: presence_core::MachineConfig =
    presence_core::MachineConfig::new(SENSOR_PIN).with_watchdog_timeout(WATCHDOG_TIMEOUT_MS);

// A slow attempt that is still within its network timeouts must not run into
// the watchdog.
const _: () = assert!(MACHINE_CONFIG.covers_attempt(network::config::attempt_budget_ms()));

/// Retry backoff on the TIM2 monotonic
struct MonoDelay;

impl embedded_hal_async::delay::DelayNs for MonoDelay {
    async fn delay_ns(&mut self, ns: u32) {
        Mono::delay(u64::from(ns.div_ceil(1_000)).micros()).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        Mono::delay(u64::from(ms).millis()).await;
    }
}

#[app(device = embassy_stm32, peripherals = true, dispatchers = [USART1])]
mod app {
    use super::*;
    use defmt::info;
    use embassy_futures::join::join3;
    use embassy_stm32::exti::ExtiInput;
    use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
    use embassy_stm32::peripherals;
    use embassy_stm32::rcc::{Hse, HseMode, LsConfig, LseConfig, LseMode};
    use embassy_stm32::rtc::{Rtc, RtcConfig};
    use embassy_stm32::spi::{self, Spi};
    use embassy_stm32::time::Hertz;
    use hal_abstractions::BootKind;
    use presence_core::{Config, PresenceMachine, Reporter, RetainedState};

    use network::radio::{self, RadioPeripherals};
    use network::{NetworkConfig, SinkTransportConfig, TcpTransport, WifiConfig, WifiSession};
    use indicator::StatusLed;
    use power::{Boot, StandbyPower};
    use retained::BackupRegister;
    use watchdog::IwdgWatchdog;

    type SpiPeripheral = embassy_stm32::Peri<'static, peripherals::SPI2>;
    type PinPB13 = embassy_stm32::Peri<'static, peripherals::PB13>;
    type PinPB15 = embassy_stm32::Peri<'static, peripherals::PB15>;
    type PinPB14 = embassy_stm32::Peri<'static, peripherals::PB14>;
    type PinPB9 = embassy_stm32::Peri<'static, peripherals::PB9>;
    type PinPC6 = embassy_stm32::Peri<'static, peripherals::PC6>;
    type PinPC3 = embassy_stm32::Peri<'static, peripherals::PC3>;
    type PinPC2 = embassy_stm32::Peri<'static, peripherals::PC2>;
    type HandshakeExti = embassy_stm32::Peri<'static, peripherals::EXTI2>;
    type ReadyExti = embassy_stm32::Peri<'static, peripherals::EXTI9>;
    type DmaTx = embassy_stm32::Peri<'static, peripherals::DMA1_CH4>;
    type DmaRx = embassy_stm32::Peri<'static, peripherals::DMA1_CH3>;

    /// esp-hosted co-processor wiring (SPI2 plus four GPIOs)
    struct WifiPeripherals {
        spi: SpiPeripheral,
        sck: PinPB13,
        mosi: PinPB15,
        miso: PinPB14,
        cs: PinPC6,
        reset: PinPC3,
        handshake: PinPC2,
        handshake_exti: HandshakeExti,
        ready: PinPB9,
        ready_exti: ReadyExti,
        dma_tx: DmaTx,
        dma_rx: DmaRx,
    }

    /// Everything the presence cycle owns
    struct Cycle {
        boot: BootKind,
        sensor: Input<'static>,
        watchdog: IwdgWatchdog,
        config: Config,
        power: StandbyPower,
        led: StatusLed,
    }

    #[shared]
    struct Shared {}

    #[local]
    struct Local {}

    #[init]
    fn init(cx: init::Context) -> (Shared, Local) {
        info!("Presence sensor starting...");

        // Adafruit Feather STM32F405: 12 MHz HSE, 32.768 kHz LSE (PC14/PC15)
        let mut config = embassy_stm32::Config::default();
        config.rcc.hse = Some(Hse {
            freq: Hertz(12_000_000),
            mode: HseMode::Oscillator,
        });

        // HSE (12 MHz) / 6 = 2 MHz, * 168 = 336 MHz VCO, / 4 = 84 MHz SYSCLK
        config.rcc.pll_src = embassy_stm32::rcc::PllSource::HSE;
        config.rcc.pll = Some(embassy_stm32::rcc::Pll {
            prediv: embassy_stm32::rcc::PllPreDiv::DIV6,
            mul: embassy_stm32::rcc::PllMul::MUL168,
            divp: Some(embassy_stm32::rcc::PllPDiv::DIV4),
            divq: Some(embassy_stm32::rcc::PllQDiv::DIV7),
            divr: None,
        });
        config.rcc.sys = embassy_stm32::rcc::Sysclk::PLL1_P;
        config.rcc.ahb_pre = embassy_stm32::rcc::AHBPrescaler::DIV1; // 84 MHz
        config.rcc.apb1_pre = embassy_stm32::rcc::APBPrescaler::DIV2; // 42 MHz
        config.rcc.apb2_pre = embassy_stm32::rcc::APBPrescaler::DIV1; // 84 MHz

        // LSE clocks the RTC wakeup timer in Standby
        config.rcc.ls = LsConfig {
            rtc: embassy_stm32::rcc::RtcClockSource::LSE,
            lsi: false,
            lse: Some(LseConfig {
                frequency: Hertz(32_768),
                mode: LseMode::Oscillator(embassy_stm32::rcc::LseDrive::MediumHigh),
            }),
        };

        let p = embassy_stm32::init(config);

        // Prescalers for the 1 Hz ck_spre used by the wakeup timer
        let rtc = Rtc::new(p.RTC, RtcConfig::default());

        let mut scb = cx.core.SCB;
        let boot = match power::classify_boot() {
            Boot::Park(wake) => {
                info!("Parked boot, Standby until {}", wake);
                power::enter_standby(&mut scb, wake)
            }
            Boot::Run(kind) => kind,
        };
        info!("Boot: {}", boot);

        // TIM2 on APB1: timer clock = 2*APB1 when prescaler != 1
        Mono::start(84_000_000);

        let cycle = Cycle {
            boot,
            sensor: Input::new(p.PA0, Pull::Down),
            watchdog: IwdgWatchdog::new(p.IWDG),
            config: settings::load(p.FLASH),
            power: StandbyPower::new(rtc),
            led: StatusLed::new(Output::new(p.PC1, Level::Low, Speed::Low)),
        };

        let wifi_periph = WifiPeripherals {
            spi: p.SPI2,
            sck: p.PB13,
            mosi: p.PB15,
            miso: p.PB14,
            cs: p.PC6,
            reset: p.PC3,
            handshake: p.PC2,
            handshake_exti: p.EXTI2,
            ready: p.PB9,
            ready_exti: p.EXTI9,
            dma_tx: p.DMA1_CH4,
            dma_rx: p.DMA1_CH3,
        };

        presence_task::spawn(cycle, wifi_periph).ok();

        (Shared {}, Local {})
    }

    /// One wake: sample, report if needed, sleep
    ///
    /// Stack is !Send and must remain within this task.
    #[task(priority = 1)]
    async fn presence_task(_cx: presence_task::Context, cycle: Cycle, periph: WifiPeripherals) {
        use embassy_net::StackResources;
        use static_cell::StaticCell;

        let Cycle {
            boot,
            mut sensor,
            watchdog,
            config,
            mut power,
            led,
        } = cycle;

        let mut spi_config = spi::Config::default();
        spi_config.frequency = Hertz(10_000_000);

        let spi = Spi::new(
            periph.spi,
            periph.sck,
            periph.mosi,
            periph.miso,
            periph.dma_tx,
            periph.dma_rx,
            spi_config,
        );

        let radio_periph = RadioPeripherals {
            spi,
            cs: Output::new(periph.cs, Level::High, Speed::VeryHigh),
            reset: Output::new(periph.reset, Level::Low, Speed::Low),
            handshake: ExtiInput::new(periph.handshake, periph.handshake_exti, Pull::Up),
            ready: ExtiInput::new(periph.ready, periph.ready_exti, Pull::Up),
        };
        let (device, control, wifi_runner) = radio::init_radio(radio_periph).await;

        static RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
        let (stack, mut net_runner) = embassy_net::new(
            device,
            embassy_net::Config::dhcpv4(Default::default()),
            RESOURCES.init(StackResources::new()),
            NetworkConfig::for_device(device_id::uid()).seed,
        );

        let sensor_tag = device_id::sensor_tag();
        info!("Sensor tag: {}", sensor_tag.as_str());

        let app_logic = async {
            let session = WifiSession::new(control, stack, WifiConfig::default());
            let transport = TcpTransport::new(stack, SinkTransportConfig::default());
            let reporter = Reporter::new(&config, sensor_tag.as_str(), session, transport);

            let mut machine = PresenceMachine::new(
                MACHINE_CONFIG,
                reporter,
                watchdog,
                MonoDelay,
                led,
            );
            let mut retained = RetainedState::restore(BackupRegister::last_reported(), boot);

            let summary = machine.run_cycle(&mut sensor, &mut retained).await;
            info!("Cycle done: {}", summary);
            machine.sleep(&mut power, summary.wake)
        };

        join3(wifi_runner.run(), net_runner.run(), app_logic).await;
    }

    /// RTIC idle task - WFI sleep mode when no tasks active
    #[idle]
    fn idle(_cx: idle::Context) -> ! {
        loop {
            cortex_m::asm::wfi();
        }
    }
}
