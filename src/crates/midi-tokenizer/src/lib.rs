//! MIDI tokenizer library
//!
//! Turns a Standard MIDI File into a typed document: a file-global tempo map,
//! paired notes with absolute tick and second positions, and classified
//! meta/control records per track.
//!
//! ```no_run
//! use midi_tokenizer::{MidiDocument, TokenizeOptions};
//! use std::path::Path;
//!
//! let doc = MidiDocument::from_file(Path::new("song.mid"), &TokenizeOptions::default())?;
//! let meter = doc.metadata.time_signature()?;
//! println!("{} tracks in {}", doc.tracks.len(), meter);
//! # Ok::<(), midi_tokenizer::TokenizeError>(())
//! ```

pub mod document;
pub mod error;
pub mod event;
pub mod meta;
pub mod note;
pub mod pairing;
pub mod smf;
pub mod tempo;

pub use document::{
    DurationStats, FileMetadata, Metadata, MidiDocument, ProgramChange, TokenizeOptions, Track,
};
pub use error::{Result, TokenizeError};
pub use event::{EventKind, EventStream, TrackEvent, VoiceMessage};
pub use meta::{ControlRecord, KeySignature, MetaRecord, TimeSignature};
pub use note::{pitch_name, Note};
pub use pairing::{pair_notes, NotePairer};
pub use tempo::{TempoChange, TempoMap};
