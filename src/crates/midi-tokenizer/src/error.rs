use thiserror::Error;

pub type Result<T> = std::result::Result<T, TokenizeError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TokenizeError {
    #[error("Failed to decode MIDI file: {0}")]
    Decode(String),

    #[error("SMPTE timecode division is not supported, only ticks per quarter note")]
    SmpteTiming,

    #[error("Invalid division {0}: ticks per quarter note must be greater than 0")]
    InvalidDivision(u16),

    #[error("Pitch {pitch} out of range 0-127 (track {track}, tick {tick})")]
    PitchOutOfRange { track: usize, tick: u64, pitch: u8 },

    #[error("Channel {channel} out of range 0-15 (track {track}, tick {tick})")]
    ChannelOutOfRange { track: usize, tick: u64, channel: u8 },

    #[error("Truncated {kind} meta event at tick {tick}: expected {expected} bytes, found {found}")]
    TruncatedMeta {
        kind: &'static str,
        tick: u64,
        expected: usize,
        found: usize,
    },

    #[error(
        "Multiple time signatures detected ({} changes at ticks: {}). \
         Only single time signature files are supported. \
         Split your MIDI file by time signature before conversion.",
        .ticks.len(),
        join_ticks(.ticks)
    )]
    AmbiguousTimeSignature { ticks: Vec<u64> },

    #[error("Failed to read MIDI document JSON: {0}")]
    Json(String),
}

impl From<midly::Error> for TokenizeError {
    fn from(err: midly::Error) -> Self {
        TokenizeError::Decode(err.to_string())
    }
}

impl From<serde_json::Error> for TokenizeError {
    fn from(err: serde_json::Error) -> Self {
        TokenizeError::Json(err.to_string())
    }
}

fn join_ticks(ticks: &[u64]) -> String {
    ticks
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_time_signature_lists_ticks() {
        let err = TokenizeError::AmbiguousTimeSignature {
            ticks: vec![0, 1920],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 changes"));
        assert!(msg.contains("ticks: 0, 1920"));
    }
}
