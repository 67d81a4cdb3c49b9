#![deny(unsafe_code)]
#![deny(warnings)]
//! Device identifier for the presence point tag
//!
//! The STM32F405 carries a factory-programmed 96-bit unique ID that is stable
//! across reboots, so it stands in for the radio MAC as the `id` tag of every
//! point this sensor writes.

use heapless::String;

/// Format: "stm32f405-" (10 chars) + 24 hex chars
pub const SENSOR_TAG_MAX_LEN: usize = 34;

const SENSOR_TAG_PREFIX: &str = "stm32f405-";

/// Raw 12-byte (96-bit) unique device ID
pub fn uid() -> &'static [u8; 12] {
    embassy_stm32::uid::uid()
}

/// Tag value identifying this sensor: `stm32f405-{24_hex_chars}`
pub fn sensor_tag() -> String<SENSOR_TAG_MAX_LEN> {
    compose_tag(embassy_stm32::uid::uid_hex())
}

fn compose_tag(uid_hex: &str) -> String<SENSOR_TAG_MAX_LEN> {
    let mut tag = String::new();
    // 10 + 24 bytes fill the tag exactly; anything longer is cut
    for c in SENSOR_TAG_PREFIX.chars().chain(uid_hex.chars()) {
        if tag.push(c).is_err() {
            break;
        }
    }
    tag
}
