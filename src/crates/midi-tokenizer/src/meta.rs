//! Typed records for meta events and non-note channel messages.
//!
//! Classification is stateless: each event maps to exactly one record.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TokenizeError};
use crate::event::{
    VoiceMessage, META_COPYRIGHT, META_CUE_POINT, META_END_OF_TRACK, META_INSTRUMENT_NAME,
    META_KEY_SIGNATURE, META_LYRIC, META_MARKER, META_SET_TEMPO, META_TEXT, META_TIME_SIGNATURE,
    META_TRACK_NAME,
};
use crate::tempo::micros_to_bpm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    Text,
    Copyright,
    TrackName,
    InstrumentName,
    Lyric,
    Marker,
    CuePoint,
}

impl TextKind {
    fn from_meta_type(meta_type: u8) -> Option<Self> {
        match meta_type {
            META_TEXT => Some(Self::Text),
            META_COPYRIGHT => Some(Self::Copyright),
            META_TRACK_NAME => Some(Self::TrackName),
            META_INSTRUMENT_NAME => Some(Self::InstrumentName),
            META_LYRIC => Some(Self::Lyric),
            META_MARKER => Some(Self::Marker),
            META_CUE_POINT => Some(Self::CuePoint),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Copyright => "copyright",
            Self::TrackName => "track name",
            Self::InstrumentName => "instrument name",
            Self::Lyric => "lyric",
            Self::Marker => "marker",
            Self::CuePoint => "cue point",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub tick: u64,
    pub numerator: u8,
    pub denominator: u16,
    pub clocks_per_click: u8,
    pub thirty_seconds_per_quarter: u8,
}

impl TimeSignature {
    pub fn new(tick: u64, numerator: u8, denominator: u16) -> Self {
        Self {
            tick,
            numerator,
            denominator,
            clocks_per_click: 24,
            thirty_seconds_per_quarter: 8,
        }
    }

    /// Same position and meter, ignoring the metronome bytes.
    pub fn same_meter_at(&self, other: &TimeSignature) -> bool {
        self.tick == other.tick
            && self.numerator == other.numerator
            && self.denominator == other.denominator
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::new(0, 4, 4)
    }
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySignature {
    pub tick: u64,
    /// Negative for flats, positive for sharps.
    pub sharps_flats: i8,
    pub minor: bool,
    pub name: String,
}

const MAJOR_KEYS: [&str; 15] = [
    "Cb", "Gb", "Db", "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#", "C#",
];
const MINOR_KEYS: [&str; 15] = [
    "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#", "C#", "G#", "D#", "A#",
];

/// "Eb major", "F# minor". Counts outside -7..=7 have no conventional name.
pub fn key_name(sharps_flats: i8, minor: bool) -> String {
    let (table, mode) = if minor {
        (&MINOR_KEYS, "minor")
    } else {
        (&MAJOR_KEYS, "major")
    };
    match usize::try_from(i16::from(sharps_flats) + 7)
        .ok()
        .and_then(|i| table.get(i))
    {
        Some(tonic) => format!("{} {}", tonic, mode),
        None => format!("{} accidentals {}", sharps_flats, mode),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetaRecord {
    Tempo {
        tick: u64,
        micros_per_quarter: u32,
        bpm: f64,
    },
    TimeSignature(TimeSignature),
    KeySignature(KeySignature),
    Text {
        tick: u64,
        kind: TextKind,
        text: String,
    },
    EndOfTrack {
        tick: u64,
    },
    Unknown {
        tick: u64,
        meta_type: u8,
        hex: String,
    },
}

impl MetaRecord {
    pub fn tick(&self) -> u64 {
        match self {
            MetaRecord::Tempo { tick, .. }
            | MetaRecord::Text { tick, .. }
            | MetaRecord::EndOfTrack { tick }
            | MetaRecord::Unknown { tick, .. } => *tick,
            MetaRecord::TimeSignature(ts) => ts.tick,
            MetaRecord::KeySignature(ks) => ks.tick,
        }
    }
}

fn require(kind: &'static str, tick: u64, data: &[u8], expected: usize) -> Result<()> {
    if data.len() < expected {
        return Err(TokenizeError::TruncatedMeta {
            kind,
            tick,
            expected,
            found: data.len(),
        });
    }
    Ok(())
}

/// Lossy UTF-8 with trailing NULs dropped.
fn decode_text(data: &[u8]) -> String {
    String::from_utf8_lossy(data)
        .trim_end_matches('\0')
        .to_string()
}

pub fn hex_dump(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Classify one meta event.
pub fn extract(tick: u64, meta_type: u8, data: &[u8]) -> Result<MetaRecord> {
    if let Some(kind) = TextKind::from_meta_type(meta_type) {
        return Ok(MetaRecord::Text {
            tick,
            kind,
            text: decode_text(data),
        });
    }

    match meta_type {
        META_SET_TEMPO => {
            require("tempo", tick, data, 3)?;
            let micros =
                (u32::from(data[0]) << 16) | (u32::from(data[1]) << 8) | u32::from(data[2]);
            Ok(MetaRecord::Tempo {
                tick,
                micros_per_quarter: micros,
                bpm: micros_to_bpm(micros),
            })
        }
        META_TIME_SIGNATURE => {
            require("time signature", tick, data, 2)?;
            // a power past 15 cannot be a real meter
            let denominator = 1u16.checked_shl(u32::from(data[1])).unwrap_or(0);
            Ok(MetaRecord::TimeSignature(TimeSignature {
                tick,
                numerator: data[0],
                denominator,
                clocks_per_click: data.get(2).copied().unwrap_or(24),
                thirty_seconds_per_quarter: data.get(3).copied().unwrap_or(8),
            }))
        }
        META_KEY_SIGNATURE => {
            require("key signature", tick, data, 2)?;
            let sharps_flats = data[0] as i8;
            let minor = data[1] == 1;
            Ok(MetaRecord::KeySignature(KeySignature {
                tick,
                sharps_flats,
                minor,
                name: key_name(sharps_flats, minor),
            }))
        }
        META_END_OF_TRACK => Ok(MetaRecord::EndOfTrack { tick }),
        other => Ok(MetaRecord::Unknown {
            tick,
            meta_type: other,
            hex: hex_dump(data),
        }),
    }
}

/// Non-note channel message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlRecord {
    ControlChange {
        tick: u64,
        channel: u8,
        controller: u8,
        value: u8,
    },
    ProgramChange {
        tick: u64,
        channel: u8,
        program: u8,
    },
    PitchBend {
        tick: u64,
        channel: u8,
        /// -8192..=8191, 0 is centre.
        value: i16,
    },
}

impl ControlRecord {
    pub fn classify(tick: u64, channel: u8, message: &VoiceMessage) -> Option<Self> {
        match *message {
            VoiceMessage::ControlChange { controller, value } => Some(Self::ControlChange {
                tick,
                channel,
                controller,
                value,
            }),
            VoiceMessage::ProgramChange { program } => Some(Self::ProgramChange {
                tick,
                channel,
                program,
            }),
            VoiceMessage::PitchBend { value } => Some(Self::PitchBend {
                tick,
                channel,
                value: (i32::from(value & 0x3FFF) - 8192) as i16,
            }),
            _ => None,
        }
    }

    pub fn tick(&self) -> u64 {
        match self {
            Self::ControlChange { tick, .. }
            | Self::ProgramChange { tick, .. }
            | Self::PitchBend { tick, .. } => *tick,
        }
    }
}
