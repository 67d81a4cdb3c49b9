#![deny(unsafe_code)]
#![deny(warnings)]
//! Backup-domain word for the last reported state
//!
//! RTC backup registers keep their content in Standby and across resets as
//! long as VDD or VBAT is present. Register 0 belongs to the presence state;
//! register 1 is used by `power` for parked Standby requests.

use hal_abstractions::RetainedWord;
use stm32_metapac as pac;

use crate::power::enable_backup_access;

pub struct BackupRegister {
    index: usize,
}

impl BackupRegister {
    /// The register holding the last reported occupancy state
    pub fn last_reported() -> Self {
        Self { index: 0 }
    }
}

impl RetainedWord for BackupRegister {
    fn read(&self) -> u32 {
        pac::RTC.bkpr(self.index).read().bkp()
    }

    fn write(&mut self, value: u32) {
        enable_backup_access();
        pac::RTC.bkpr(self.index).write(|w| w.set_bkp(value));
    }
}
