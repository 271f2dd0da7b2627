//! Nearest standard pitch lookup

use std::sync::Arc;

use crate::table::StandardFrequencyTable;

/// Frequency value marking "no pitch found"
pub const NO_PITCH_HZ: f32 = -1.0;

/// Resolves raw frequencies to the closest equal-tempered table entry
#[derive(Debug, Clone)]
pub struct PitchClassifier {
    table: Arc<StandardFrequencyTable>,
}

impl PitchClassifier {
    /// Create classifier over a shared table
    pub fn new(table: Arc<StandardFrequencyTable>) -> Self {
        Self { table }
    }

    /// Shared table
    pub fn table(&self) -> &StandardFrequencyTable {
        &self.table
    }

    /// Nearest `(frequency_hz, midi)` for a raw estimate
    ///
    /// Returns `(0.0, 0)` for the no-pitch sentinel (and for any other
    /// non-positive or non-finite input). Ties resolve to the lower MIDI note.
    pub fn classify(&self, frequency_hz: f32) -> (f32, u8) {
        if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
            return (0.0, 0);
        }

        let mut entries = self.table.iter();
        let Some((first_midi, first_freq)) = entries.next() else {
            return (0.0, 0);
        };

        let mut nearest = (first_freq, first_midi);
        let mut smallest_diff = (frequency_hz - first_freq).abs();

        for (midi, freq) in entries {
            let diff = (frequency_hz - freq).abs();
            if diff < smallest_diff {
                smallest_diff = diff;
                nearest = (freq, midi);
            }
        }

        nearest
    }
}
