//! Channel sets for buttons, LEDs and pumps.
//!
//! Every game-stage input and actuator output shares one index space 0..8.
//! A [`ButtonSet`] is the bitmask form used for the instantaneous pressed
//! snapshot, the target pattern of a step, and the per-step progress mask.

use bitflags::bitflags;
use std::fmt;

/// Number of game channels: buttons, LEDs and pumps all count 8
pub const CHANNEL_COUNT: u8 = 8;

/// Size of the separate indicator bank used during WAITING to show the live
/// player count
pub const INDICATOR_COUNT: u8 = 4;

bitflags! {
    /// A set of channel indices, one bit per channel 0..8
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ButtonSet: u8 {
        /// Channel 0
        const B0 = 1 << 0;
        /// Channel 1
        const B1 = 1 << 1;
        /// Channel 2
        const B2 = 1 << 2;
        /// Channel 3
        const B3 = 1 << 3;
        /// Channel 4
        const B4 = 1 << 4;
        /// Channel 5
        const B5 = 1 << 5;
        /// Channel 6
        const B6 = 1 << 6;
        /// Channel 7
        const B7 = 1 << 7;
    }
}

impl Default for ButtonSet {
    fn default() -> Self {
        ButtonSet::empty()
    }
}

impl ButtonSet {
    /// Set containing only `index`. Out-of-range indices yield the empty set.
    pub fn single(index: u8) -> Self {
        if index < CHANNEL_COUNT {
            ButtonSet::from_bits_truncate(1 << index)
        } else {
            ButtonSet::empty()
        }
    }

    /// Build a set from an iterator of channel indices
    pub fn from_indices<I: IntoIterator<Item = u8>>(indices: I) -> Self {
        indices
            .into_iter()
            .fold(ButtonSet::empty(), |set, i| set | ButtonSet::single(i))
    }

    /// Iterate the contained channel indices in ascending order
    pub fn indices(self) -> impl Iterator<Item = u8> {
        (0..CHANNEL_COUNT).filter(move |i| self.bits() & (1 << i) != 0)
    }

    /// Number of channels in the set
    pub fn len(self) -> usize {
        self.bits().count_ones() as usize
    }
}

impl fmt::Display for ButtonSet {
    /// Formats as 1-based channel numbers, the numbering painted on the floor
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (n, i) in self.indices().enumerate() {
            if n > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", i + 1)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_and_len() {
        let set = ButtonSet::single(0) | ButtonSet::single(7);
        assert_eq!(set.len(), 2);
        assert!(set.contains(ButtonSet::B7));
        assert!(!set.contains(ButtonSet::B3));
    }

    #[test]
    fn single_out_of_range_is_empty() {
        assert!(ButtonSet::single(8).is_empty());
    }

    #[test]
    fn indices_round_trip() {
        let set = ButtonSet::from_indices([1, 4, 6]);
        assert_eq!(set.indices().collect::<Vec<_>>(), vec![1, 4, 6]);
    }

    #[test]
    fn display_is_one_based() {
        let set = ButtonSet::from_indices([1, 4, 6]);
        assert_eq!(set.to_string(), "[2, 5, 7]");
    }
}
