#![deny(unsafe_code)]
#![deny(warnings)]
//! Independent watchdog adapter
//!
//! The IWDG runs from the 32 kHz LSI and cannot be stopped once started;
//! `power` takes care of Standby entry with that in mind.

use defmt::info;
use embassy_stm32::peripherals::IWDG;
use embassy_stm32::wdg::IndependentWatchdog;
use embassy_stm32::Peri;
use hal_abstractions::Watchdog;

/// Longest timeout the IWDG prescaler allows (~32 s at 32 kHz)
const MAX_TIMEOUT_MS: u32 = 32_000;

enum State {
    Idle(Peri<'static, IWDG>),
    Running(IndependentWatchdog<'static, IWDG>),
    /// Only while switching between the two
    Taken,
}

pub struct IwdgWatchdog {
    state: State,
}

impl IwdgWatchdog {
    pub fn new(iwdg: Peri<'static, IWDG>) -> Self {
        Self {
            state: State::Idle(iwdg),
        }
    }
}

impl Watchdog for IwdgWatchdog {
    fn arm(&mut self, timeout_ms: u32) {
        match core::mem::replace(&mut self.state, State::Taken) {
            State::Idle(iwdg) => {
                let timeout_ms = timeout_ms.min(MAX_TIMEOUT_MS);
                let mut dog = IndependentWatchdog::new(iwdg, timeout_ms * 1_000);
                dog.unleash();
                info!("Watchdog armed: {} ms", timeout_ms);
                self.state = State::Running(dog);
            }
            State::Running(mut dog) => {
                // Timeout is fixed once running; re-arming restarts the count.
                dog.pet();
                self.state = State::Running(dog);
            }
            State::Taken => {}
        }
    }

    fn kick(&mut self) {
        if let State::Running(dog) = &mut self.state {
            dog.pet();
        }
    }
}
