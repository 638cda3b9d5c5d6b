use midi_tokenizer::TokenizeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConvertError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error("Unsupported quantization {0}. Supported values: 6, 8, 12, 16, 24, 32")]
    UnsupportedQuantization(u32),

    #[error(
        "Quantization {quantization} does not divide a {numerator}/{denominator} measure \
         into whole slices"
    )]
    UnevenGrid {
        quantization: u32,
        numerator: u8,
        denominator: u16,
    },

    #[error("Invalid tempo {0}: BPM must be a positive number")]
    InvalidTempo(f64),

    #[error("Track index {index} out of bounds. File has {count} track(s).")]
    TrackOutOfRange { index: usize, count: usize },

    #[error("Track {index} ({name}) has no note events.")]
    EmptyTrack { index: usize, name: String },

    #[error("No tracks with note events found. File has {count} track(s) but all are empty.")]
    NoNoteTracks { count: usize },
}
