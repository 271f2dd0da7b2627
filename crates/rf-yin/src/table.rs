//! Equal-tempered reference frequencies for the piano range

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_REFERENCE_A4_HZ;
use crate::error::YinError;

/// Lowest MIDI note in the table (A0)
pub const LOWEST_MIDI: u8 = 21;

/// Highest MIDI note in the table (C8)
pub const HIGHEST_MIDI: u8 = 108;

/// Number of table entries
pub const TABLE_LEN: usize = (HIGHEST_MIDI - LOWEST_MIDI) as usize + 1;

/// MIDI number of A4
const A4_MIDI: i32 = 69;

/// Immutable MIDI → frequency table for MIDI 21..=108
///
/// Frequencies strictly increase with MIDI number. Build once per session and
/// share by reference. Serialized as its reference tuning only; deserializing
/// rebuilds every entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableTuning", into = "TableTuning")]
pub struct StandardFrequencyTable {
    reference_a4_hz: f32,
    frequencies: Vec<f32>,
}

impl StandardFrequencyTable {
    /// Build the 88-entry table from an A4 reference
    pub fn build(reference_a4_hz: f32) -> Self {
        let reference = reference_a4_hz as f64;
        let frequencies = (LOWEST_MIDI..=HIGHEST_MIDI)
            .map(|midi| {
                let semitones = (midi as i32 - A4_MIDI) as f64 / 12.0;
                (reference * 2.0f64.powf(semitones)) as f32
            })
            .collect();

        Self {
            reference_a4_hz,
            frequencies,
        }
    }

    /// A4 reference the table was built from
    pub fn reference_a4_hz(&self) -> f32 {
        self.reference_a4_hz
    }

    /// Frequency of a MIDI note, `None` outside 21..=108
    pub fn frequency(&self, midi: u8) -> Option<f32> {
        if !(LOWEST_MIDI..=HIGHEST_MIDI).contains(&midi) {
            return None;
        }
        Some(self.frequencies[(midi - LOWEST_MIDI) as usize])
    }

    /// `(midi, frequency_hz)` pairs in ascending MIDI order
    pub fn iter(&self) -> impl Iterator<Item = (u8, f32)> + '_ {
        self.frequencies
            .iter()
            .enumerate()
            .map(|(i, &freq)| (LOWEST_MIDI + i as u8, freq))
    }

    /// Number of entries (always 88)
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Never empty; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

/// Serialized form of the table
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct TableTuning {
    reference_a4_hz: f32,
}

impl TryFrom<TableTuning> for StandardFrequencyTable {
    type Error = YinError;

    fn try_from(tuning: TableTuning) -> Result<Self, Self::Error> {
        let reference = tuning.reference_a4_hz;
        if !(reference.is_finite() && reference > 0.0) {
            return Err(YinError::InvalidReference(reference));
        }
        Ok(Self::build(reference))
    }
}

impl From<StandardFrequencyTable> for TableTuning {
    fn from(table: StandardFrequencyTable) -> Self {
        Self {
            reference_a4_hz: table.reference_a4_hz,
        }
    }
}

impl Default for StandardFrequencyTable {
    fn default() -> Self {
        Self::build(DEFAULT_REFERENCE_A4_HZ)
    }
}
