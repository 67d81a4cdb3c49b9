//! InfluxDB line protocol for the presence point
//!
//! One point per report: `<measurement>,id=<device-id> exist=<0|1>`. The
//! point carries no timestamp; the sink stamps it on arrival.

use core::fmt::Write;

use heapless::String;

use crate::occupancy::OccupancyState;

/// Worst case: escaped 64-byte measurement and 48-byte id plus framing
pub const LINE_MAX_LEN: usize = 256;

pub type Line = String<LINE_MAX_LEN>;

/// Tag key identifying the reporting device
const DEVICE_TAG: &str = "id";
/// Field key carrying the occupancy value
const EXIST_FIELD: &str = "exist";

/// Format the presence point for `state`
pub fn presence_line(
    measurement: &str,
    device_id: &str,
    state: OccupancyState,
) -> Result<Line, core::fmt::Error> {
    let mut line = Line::new();
    write_escaped(&mut line, measurement, &[',', ' '])?;
    write!(line, ",{}=", DEVICE_TAG)?;
    write_escaped(&mut line, device_id, &[',', '=', ' '])?;
    write!(line, " {}={}", EXIST_FIELD, state.exist_field())?;
    Ok(line)
}

fn write_escaped<W: Write>(out: &mut W, value: &str, special: &[char]) -> core::fmt::Result {
    for c in value.chars() {
        if special.contains(&c) {
            out.write_char('\\')?;
        }
        out.write_char(c)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupied_point() {
        let line = presence_line("room", "AA:BB:CC:DD:EE:FF", OccupancyState::Occupied).unwrap();
        assert_eq!(line.as_str(), "room,id=AA:BB:CC:DD:EE:FF exist=1");
    }

    #[test]
    fn test_vacant_point() {
        let line = presence_line("hallway", "stm32f405-0011", OccupancyState::Vacant).unwrap();
        assert_eq!(line.as_str(), "hallway,id=stm32f405-0011 exist=0");
    }

    #[test]
    fn test_special_characters_escaped() {
        let line = presence_line("living room,1", "a=b c", OccupancyState::Occupied).unwrap();
        assert_eq!(line.as_str(), r"living\ room\,1,id=a\=b\ c exist=1");
    }

    #[test]
    fn test_empty_measurement_still_formats() {
        let line = presence_line("", "dev", OccupancyState::Vacant).unwrap();
        assert_eq!(line.as_str(), ",id=dev exist=0");
    }
}
