//! Quantization grid: how many slices a measure holds and how long each lasts.

use midi_tokenizer::{Note, TimeSignature};
use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};

pub const SUPPORTED_QUANTIZATIONS: [u32; 6] = [6, 8, 12, 16, 24, 32];

pub fn validate_quantization(quantization: u32) -> Result<u32> {
    if SUPPORTED_QUANTIZATIONS.contains(&quantization) {
        Ok(quantization)
    } else {
        Err(ConvertError::UnsupportedQuantization(quantization))
    }
}

/// Eighth-note grid for 3/4 and 6/8, sixteenths otherwise.
pub fn default_quantization(time_signature: &TimeSignature) -> u32 {
    match (time_signature.numerator, time_signature.denominator) {
        (3, 4) | (6, 8) => 8,
        _ => 16,
    }
}

/// What one slice and common `@` spans mean at a given quantization.
pub fn grid_meaning(quantization: u32) -> &'static str {
    match quantization {
        6 => "6 = eighth notes, @3 = dotted quarter, @6 = dotted half",
        8 => "8 = eighth notes, @4 = half note",
        12 => "12 = triplet eighths, @3 = quarter note, @6 = half note",
        16 => "16 = sixteenth notes, @4 = quarter note, @8 = half note",
        24 => "24 = triplet sixteenths, @6 = quarter note, @12 = half note",
        32 => "32 = thirty-second notes, @8 = quarter note, @16 = half note",
        _ => "custom grid",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub quantization: u32,
    pub slices_per_measure: usize,
    pub slice_seconds: f64,
    pub bpm: f64,
}

impl Grid {
    pub fn new(quantization: u32, time_signature: &TimeSignature, bpm: f64) -> Result<Self> {
        let quantization = validate_quantization(quantization)?;
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(ConvertError::InvalidTempo(bpm));
        }

        let numerator = u32::from(time_signature.numerator);
        let denominator = u32::from(time_signature.denominator);
        let scaled = quantization * numerator;
        if denominator == 0 || scaled == 0 || scaled % denominator != 0 {
            return Err(ConvertError::UnevenGrid {
                quantization,
                numerator: time_signature.numerator,
                denominator: time_signature.denominator,
            });
        }

        Ok(Self {
            quantization,
            slices_per_measure: (scaled / denominator) as usize,
            slice_seconds: (60.0 / bpm) * (4.0 / f64::from(quantization)),
            bpm,
        })
    }

    /// Nearest slice index to an onset.
    pub fn position(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) / self.slice_seconds).round() as u64
    }

    /// Duration in whole slices, never below one.
    pub fn duration(&self, seconds: f64) -> u64 {
        ((seconds.max(0.0) / self.slice_seconds).round() as u64).max(1)
    }

    /// Measures needed to hold every onset; zero for no notes.
    pub fn measures_needed(&self, notes: &[Note]) -> usize {
        notes
            .iter()
            .map(|n| self.position(n.onset_seconds) as usize / self.slices_per_measure + 1)
            .max()
            .unwrap_or(0)
    }
}
