#![deny(unsafe_code)]
#![deny(warnings)]
//! Settings document stored in internal flash
//!
//! The JSON settings document is written to sector 11 (the last 128 KiB of
//! the STM32F405RG) with `probe-rs download --binary-format bin
//! --base-address 0x080E0000 settings.json`. The erased tail of the sector
//! reads as 0xFF.

use defmt::{info, warn, Debug2Format};
use embassy_stm32::flash::Flash;
use embassy_stm32::peripherals::FLASH;
use embassy_stm32::Peri;
use presence_core::Config;

/// Sector 11 offset from the flash base
const SETTINGS_OFFSET: u32 = 0x000E_0000;
/// Upper bound for the document; longer content is cut and fails to parse
const SETTINGS_MAX_LEN: usize = 1280;

/// Read the settings sector and parse it into a `Config`
///
/// Never fails: a missing or unreadable document yields the empty config.
pub fn load(flash: Peri<'static, FLASH>) -> Config {
    let mut flash = Flash::new_blocking(flash);
    let mut raw = [0u8; SETTINGS_MAX_LEN];

    if let Err(e) = flash.blocking_read(SETTINGS_OFFSET, &mut raw) {
        warn!("Settings read failed: {:?}", Debug2Format(&e));
        return Config::load(None);
    }

    let document = stored_document(&raw);
    if let Some(doc) = document {
        info!("Settings document: {} bytes", doc.len());
    }
    Config::load(document)
}

/// Content up to the first erased (0xFF) or NUL byte
fn stored_document(raw: &[u8]) -> Option<&[u8]> {
    let end = raw
        .iter()
        .position(|&b| b == 0xFF || b == 0x00)
        .unwrap_or(raw.len());
    (end > 0).then(|| &raw[..end])
}
