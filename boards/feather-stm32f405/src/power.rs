#![deny(unsafe_code)]
#![deny(warnings)]
//! Standby entry, wake sources and boot classification
//!
//! The STM32F405 Standby mode keeps only the backup domain (RTC and backup
//! registers) alive, so every wake is a fresh boot. The independent watchdog
//! cannot be stopped once started and keeps counting in Standby, so going to
//! sleep is a two-step affair:
//!
//! 1. `StandbyPower::deep_sleep` stores the requested wake source in a backup
//!    register and issues a software reset.
//! 2. On the next boot `classify_boot` finds the request, and `init` calls
//!    `enter_standby` before anything starts the watchdog.
//!
//! Wake sources map to the RTC wakeup timer (1 Hz `ck_spre`) and the WKUP
//! pin on PA0.

use cortex_m::peripheral::SCB;
use defmt::{info, warn, Format};
use embassy_stm32::rtc::Rtc;
use hal_abstractions::{BootKind, PowerControl, WakeLevel, WakeSource};
use stm32_metapac as pac;

/// Backup register holding a pending Standby request
const PARK_REGISTER: usize = 1;

const PARK_MAGIC: u32 = 0xA500_0000;
const PARK_MAGIC_MASK: u32 = 0xFF00_0000;
const PARK_TIMER: u32 = 1;
const PARK_PIN_HIGH: u32 = 2;
const PARK_PIN_LOW: u32 = 3;

/// Longest interval the 16-bit wakeup counter can express at 1 Hz
const MAX_TIMER_SECS: u32 = 0x1_0000;

/// What the firmware should do with this boot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum Boot {
    /// Run a presence cycle
    Run(BootKind),
    /// A Standby request is pending; enter Standby with this wake source
    Park(WakeSource),
}

/// Read and clear the reset and wake flags
///
/// Must run before the watchdog is started and before anything else touches
/// the backup registers.
pub fn classify_boot() -> Boot {
    enable_backup_access();

    let from_standby = pac::PWR.csr1().read().sbf();
    let reset_flags = pac::RCC.csr().read();
    let watchdog = reset_flags.iwdgrstf() || reset_flags.wwdgrstf();
    let software = reset_flags.sftrstf();

    pac::RCC.csr().modify(|w| w.set_rmvf(true));
    pac::PWR.cr1().modify(|w| {
        w.set_csbf(true);
        w.set_cwuf(true);
    });

    let park = take_park_request();

    if watchdog {
        return Boot::Run(BootKind::WatchdogRestart);
    }
    if software {
        if let Some(wake) = park {
            return Boot::Park(wake);
        }
    }
    if from_standby {
        Boot::Run(BootKind::SleepWake)
    } else {
        Boot::Run(BootKind::ColdBoot)
    }
}

/// Arm `wake` and enter Standby
///
/// Only called from `init` on a parked boot, with the watchdog never started.
pub fn enter_standby(scb: &mut SCB, wake: WakeSource) -> ! {
    enable_backup_access();
    disarm_wakeup_timer();
    pac::PWR.csr1().modify(|w| w.set_ewup(false));

    // WUF must be clear before arming; an already-high WKUP pin sets it
    // again and wakes the device right away.
    pac::PWR.cr1().modify(|w| w.set_cwuf(true));

    match wake {
        WakeSource::Timer { secs } => arm_wakeup_timer(secs),
        WakeSource::PinLevel { level, pin } => {
            if level == WakeLevel::Low {
                warn!("WKUP pin {} only wakes on high, arming anyway", pin);
            }
            pac::PWR.csr1().modify(|w| w.set_ewup(true));
        }
    }

    pac::PWR.cr1().modify(|w| w.set_pdds(true));
    scb.set_sleepdeep();
    cortex_m::asm::dsb();
    loop {
        cortex_m::asm::wfi();
    }
}

/// `PowerControl` for the Feather: parks the request and resets
pub struct StandbyPower {
    /// Held so the RTC stays configured for the wakeup timer
    _rtc: Rtc,
}

impl StandbyPower {
    pub fn new(rtc: Rtc) -> Self {
        Self { _rtc: rtc }
    }
}

impl PowerControl for StandbyPower {
    fn deep_sleep(&mut self, wake: WakeSource) -> ! {
        enable_backup_access();
        pac::RTC
            .bkpr(PARK_REGISTER)
            .write(|w| w.set_bkp(encode_park(wake)));
        info!("Standby parked, resetting");
        SCB::sys_reset()
    }
}

pub(crate) fn enable_backup_access() {
    pac::PWR.cr1().modify(|w| w.set_dbp(true));
}

fn take_park_request() -> Option<WakeSource> {
    let word = pac::RTC.bkpr(PARK_REGISTER).read().bkp();
    pac::RTC.bkpr(PARK_REGISTER).write(|w| w.set_bkp(0));
    decode_park(word)
}

fn encode_park(wake: WakeSource) -> u32 {
    match wake {
        WakeSource::Timer { secs } => {
            let secs = secs.clamp(1, MAX_TIMER_SECS);
            PARK_MAGIC | (PARK_TIMER << 16) | (secs - 1)
        }
        WakeSource::PinLevel { pin, level } => {
            let kind = match level {
                WakeLevel::High => PARK_PIN_HIGH,
                WakeLevel::Low => PARK_PIN_LOW,
            };
            PARK_MAGIC | (kind << 16) | u32::from(pin)
        }
    }
}

fn decode_park(word: u32) -> Option<WakeSource> {
    if word & PARK_MAGIC_MASK != PARK_MAGIC {
        return None;
    }
    let value = word & 0xFFFF;
    match (word >> 16) & 0xFF {
        PARK_TIMER => Some(WakeSource::Timer { secs: value + 1 }),
        PARK_PIN_HIGH => Some(WakeSource::PinLevel {
            pin: value as u8,
            level: WakeLevel::High,
        }),
        PARK_PIN_LOW => Some(WakeSource::PinLevel {
            pin: value as u8,
            level: WakeLevel::Low,
        }),
        _ => None,
    }
}

fn rtc_write_protect(unlocked: bool) {
    if unlocked {
        pac::RTC.wpr().write(|w| w.set_key(0xCA));
        pac::RTC.wpr().write(|w| w.set_key(0x53));
    } else {
        pac::RTC.wpr().write(|w| w.set_key(0xFF));
    }
}

fn disarm_wakeup_timer() {
    rtc_write_protect(true);
    pac::RTC.cr().modify(|w| {
        w.set_wute(false);
        w.set_wutie(false);
    });
    pac::RTC.isr().modify(|w| w.set_wutf(false));
    rtc_write_protect(false);
}

fn arm_wakeup_timer(secs: u32) {
    let reload = secs.clamp(1, MAX_TIMER_SECS) - 1;

    rtc_write_protect(true);
    pac::RTC.cr().modify(|w| w.set_wute(false));
    while !pac::RTC.isr().read().wutwf() {}
    pac::RTC.wutr().write(|w| w.set_wut(reload as u16));
    pac::RTC.cr().modify(|w| {
        w.set_wucksel(pac::rtc::vals::Wucksel::SPRE);
        w.set_wutie(true);
        w.set_wute(true);
    });
    pac::RTC.isr().modify(|w| w.set_wutf(false));
    rtc_write_protect(false);
}
