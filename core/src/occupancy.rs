//! Occupancy state and the last successfully reported state

/// Presence as read from the sensor pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OccupancyState {
    Occupied,
    Vacant,
}

impl OccupancyState {
    /// High level on the sensor pin means occupied
    pub const fn from_level(high: bool) -> Self {
        if high {
            Self::Occupied
        } else {
            Self::Vacant
        }
    }

    pub const fn is_occupied(self) -> bool {
        matches!(self, Self::Occupied)
    }

    /// Value of the `exist` field in the line-protocol write
    pub const fn exist_field(self) -> u8 {
        match self {
            Self::Occupied => 1,
            Self::Vacant => 0,
        }
    }
}

impl core::fmt::Display for OccupancyState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Occupied => write!(f, "occupied"),
            Self::Vacant => write!(f, "vacant"),
        }
    }
}

/// Most recent state the sink acknowledged at the transport level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LastReported {
    /// Nothing reported since the last cold boot or watchdog restart
    #[default]
    Unknown,
    Known(OccupancyState),
}

/// Tag in the upper half of the retained word; anything else decodes as unknown
const RETAINED_MAGIC: u32 = 0x5052_0000;
const RETAINED_MAGIC_MASK: u32 = 0xFFFF_0000;
const CODE_VACANT: u32 = 0x0000;
const CODE_OCCUPIED: u32 = 0x0001;

impl LastReported {
    /// True when `current` has to be sent to the sink
    pub fn differs_from(self, current: OccupancyState) -> bool {
        self != Self::Known(current)
    }

    /// Encode for a retained word
    ///
    /// `Unknown` is stored as zero so a cleared register reads back as unknown.
    pub const fn to_word(self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::Known(OccupancyState::Vacant) => RETAINED_MAGIC | CODE_VACANT,
            Self::Known(OccupancyState::Occupied) => RETAINED_MAGIC | CODE_OCCUPIED,
        }
    }

    /// Decode a retained word, treating garbage as `Unknown`
    pub const fn from_word(word: u32) -> Self {
        if word & RETAINED_MAGIC_MASK != RETAINED_MAGIC {
            return Self::Unknown;
        }
        match word & !RETAINED_MAGIC_MASK {
            CODE_VACANT => Self::Known(OccupancyState::Vacant),
            CODE_OCCUPIED => Self::Known(OccupancyState::Occupied),
            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(OccupancyState::from_level(true), OccupancyState::Occupied);
        assert_eq!(OccupancyState::from_level(false), OccupancyState::Vacant);
        assert_eq!(OccupancyState::Occupied.exist_field(), 1);
        assert_eq!(OccupancyState::Vacant.exist_field(), 0);
    }

    #[test]
    fn test_unknown_differs_from_everything() {
        assert!(LastReported::Unknown.differs_from(OccupancyState::Occupied));
        assert!(LastReported::Unknown.differs_from(OccupancyState::Vacant));
    }

    #[test]
    fn test_known_matches_same_state_only() {
        let last = LastReported::Known(OccupancyState::Occupied);
        assert!(!last.differs_from(OccupancyState::Occupied));
        assert!(last.differs_from(OccupancyState::Vacant));
    }

    #[test]
    fn test_garbage_word_is_unknown() {
        assert_eq!(LastReported::from_word(0), LastReported::Unknown);
        assert_eq!(LastReported::from_word(0xFFFF_FFFF), LastReported::Unknown);
        assert_eq!(LastReported::from_word(0x0000_0001), LastReported::Unknown);
        assert_eq!(
            LastReported::from_word(RETAINED_MAGIC | 0x7),
            LastReported::Unknown
        );
    }

    #[test]
    fn test_known_word_survives_storage() {
        let stored = LastReported::Known(OccupancyState::Vacant).to_word();
        assert_eq!(
            LastReported::from_word(stored),
            LastReported::Known(OccupancyState::Vacant)
        );
    }
}
