use serde::{Deserialize, Serialize};

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Scientific pitch notation, middle C (60) is "C4".
pub fn pitch_name(pitch: u8) -> String {
    let octave = i32::from(pitch / 12) - 1;
    format!("{}{}", NOTE_NAMES[usize::from(pitch % 12)], octave)
}

/// A paired note-on/note-off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub pitch: u8,
    pub name: String,
    pub velocity: u8,
    pub channel: u8,
    pub onset_tick: u64,
    pub duration_ticks: u64,
    pub onset_seconds: f64,
    pub duration_seconds: f64,
}

impl Note {
    pub fn end_tick(&self) -> u64 {
        self.onset_tick + self.duration_ticks
    }

    pub fn end_seconds(&self) -> f64 {
        self.onset_seconds + self.duration_seconds
    }
}
