#![deny(unsafe_code)]
#![deny(warnings)]
//! Red user LED (PC1) as the presence indicator
//!
//! Lit while the sampled state is occupied. GPIOs go high-impedance in
//! Standby, so the LED is dark between wakes.

use embassy_stm32::gpio::Output;
use hal_abstractions::PresenceIndicator;

pub struct StatusLed {
    led: Output<'static>,
}

impl StatusLed {
    pub fn new(led: Output<'static>) -> Self {
        Self { led }
    }
}

impl PresenceIndicator for StatusLed {
    fn show(&mut self, occupied: bool) {
        if occupied {
            self.led.set_high();
        } else {
            self.led.set_low();
        }
    }
}
