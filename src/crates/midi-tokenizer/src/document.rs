//! Per-file document: everything the tokenizer extracts from one MIDI file.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, TokenizeError};
use crate::event::{EventKind, EventStream, TrackEvent};
use crate::meta::{self, ControlRecord, KeySignature, MetaRecord, TextKind, TimeSignature};
use crate::note::Note;
use crate::pairing::pair_notes;
use crate::tempo::TempoMap;

pub const SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizeOptions {
    /// Keep per-track meta records in the document.
    pub include_meta: bool,
}

impl Default for TokenizeOptions {
    fn default() -> Self {
        Self { include_meta: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub filename: String,
    pub format: u8,
    pub division: u16,
    pub duration_ticks: u64,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub tempo_map: TempoMap,
    pub time_signatures: Vec<TimeSignature>,
    pub key_signatures: Vec<KeySignature>,
}

impl Metadata {
    /// The one time signature the whole file runs in.
    ///
    /// No event means 4/4. Repeats of the same meter at the same tick (often
    /// logged on several tracks) count once; anything else is ambiguous.
    pub fn time_signature(&self) -> Result<TimeSignature> {
        let mut distinct: Vec<TimeSignature> = Vec::new();
        for ts in &self.time_signatures {
            if !distinct.iter().any(|seen| seen.same_meter_at(ts)) {
                distinct.push(*ts);
            }
        }

        match distinct.as_slice() {
            [] => Ok(TimeSignature::default()),
            [only] => Ok(*only),
            many => Err(TokenizeError::AmbiguousTimeSignature {
                ticks: many.iter().map(|ts| ts.tick).collect(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramChange {
    pub tick: u64,
    pub channel: u8,
    pub program: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationStats {
    pub count: usize,
    pub min_ticks: u64,
    pub max_ticks: u64,
    pub mean_ticks: f64,
    pub min_seconds: f64,
    pub max_seconds: f64,
    pub mean_seconds: f64,
}

impl DurationStats {
    pub fn from_notes(notes: &[Note]) -> Option<Self> {
        if notes.is_empty() {
            return None;
        }

        let count = notes.len();
        let mut stats = DurationStats {
            count,
            min_ticks: u64::MAX,
            max_ticks: 0,
            mean_ticks: 0.0,
            min_seconds: f64::INFINITY,
            max_seconds: 0.0,
            mean_seconds: 0.0,
        };

        for note in notes {
            stats.min_ticks = stats.min_ticks.min(note.duration_ticks);
            stats.max_ticks = stats.max_ticks.max(note.duration_ticks);
            stats.min_seconds = stats.min_seconds.min(note.duration_seconds);
            stats.max_seconds = stats.max_seconds.max(note.duration_seconds);
            stats.mean_ticks += note.duration_ticks as f64;
            stats.mean_seconds += note.duration_seconds;
        }
        stats.mean_ticks /= count as f64;
        stats.mean_seconds /= count as f64;

        Some(stats)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub index: usize,
    pub name: Option<String>,
    /// Pairing order, see [`crate::pairing`].
    pub notes: Vec<Note>,
    pub program_changes: Vec<ProgramChange>,
    pub controls: Vec<ControlRecord>,
    #[serde(default)]
    pub meta: Vec<MetaRecord>,
    pub duration_stats: Option<DurationStats>,
}

impl Track {
    fn build(
        index: usize,
        events: &[TrackEvent],
        tempo: &TempoMap,
        options: &TokenizeOptions,
    ) -> Result<Self> {
        let mut name = None;
        let mut program_changes = Vec::new();
        let mut controls = Vec::new();
        let mut meta = Vec::new();

        for event in events {
            match &event.kind {
                EventKind::Meta { meta_type, data } => {
                    let record = meta::extract(event.tick, *meta_type, data)?;
                    if let MetaRecord::Text {
                        kind: TextKind::TrackName,
                        text,
                        ..
                    } = &record
                    {
                        if name.is_none() && !text.trim().is_empty() {
                            name = Some(text.trim().to_string());
                        }
                    }
                    if options.include_meta {
                        meta.push(record);
                    }
                }
                EventKind::Voice { channel, message } => {
                    match ControlRecord::classify(event.tick, *channel, message) {
                        Some(ControlRecord::ProgramChange {
                            tick,
                            channel,
                            program,
                        }) => program_changes.push(ProgramChange {
                            tick,
                            channel,
                            program,
                        }),
                        Some(control) => controls.push(control),
                        None => {}
                    }
                }
            }
        }

        let notes = pair_notes(events, tempo);
        let duration_stats = DurationStats::from_notes(&notes);
        debug!(
            track = index,
            name = name.as_deref().unwrap_or(""),
            notes = notes.len(),
            controls = controls.len(),
            "tokenized track"
        );

        Ok(Track {
            index,
            name,
            notes,
            program_changes,
            controls,
            meta,
            duration_stats,
        })
    }

    pub fn has_notes(&self) -> bool {
        !self.notes.is_empty()
    }

    pub fn first_program(&self) -> Option<&ProgramChange> {
        self.program_changes.first()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MidiDocument {
    pub schema_version: String,
    pub file: FileMetadata,
    pub metadata: Metadata,
    pub tracks: Vec<Track>,
}

impl MidiDocument {
    pub fn from_file(path: &Path, options: &TokenizeOptions) -> Result<Self> {
        let stream = EventStream::from_file(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_stream(&filename, &stream, options)
    }

    pub fn from_stream(
        filename: &str,
        stream: &EventStream,
        options: &TokenizeOptions,
    ) -> Result<Self> {
        stream.validate()?;

        let tempo_map = TempoMap::build(stream)?;

        let mut time_signatures = Vec::new();
        let mut key_signatures = Vec::new();
        for (tick, meta_type, data) in stream.meta_events() {
            match meta::extract(tick, meta_type, data)? {
                MetaRecord::TimeSignature(ts) => time_signatures.push(ts),
                MetaRecord::KeySignature(ks) => key_signatures.push(ks),
                _ => {}
            }
        }
        time_signatures.sort_by_key(|ts| ts.tick);
        key_signatures.sort_by_key(|ks| ks.tick);

        let tracks = stream
            .tracks
            .iter()
            .enumerate()
            .map(|(index, events)| Track::build(index, events, &tempo_map, options))
            .collect::<Result<Vec<_>>>()?;

        let duration_ticks = stream.max_tick();
        let duration_seconds = tempo_map.ticks_to_seconds(duration_ticks);

        info!(
            file = filename,
            tracks = tracks.len(),
            notes = tracks.iter().map(|t| t.notes.len()).sum::<usize>(),
            "tokenized MIDI file"
        );

        Ok(MidiDocument {
            schema_version: SCHEMA_VERSION.to_string(),
            file: FileMetadata {
                filename: filename.to_string(),
                format: stream.format,
                division: stream.division,
                duration_ticks,
                duration_seconds,
            },
            metadata: Metadata {
                tempo_map,
                time_signatures,
                key_signatures,
            },
            tracks,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a document previously written with [`Self::to_json`].
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            TokenizeError::Json(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn tempo_map(&self) -> &TempoMap {
        &self.metadata.tempo_map
    }

    /// Human-readable summary of the whole document.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let file = &self.file;

        let _ = writeln!(out, "File: {}", file.filename);
        let _ = writeln!(
            out,
            "Format: {}, Division: {} ticks/quarter",
            file.format, file.division
        );
        let _ = writeln!(
            out,
            "Duration: {} ticks ({:.3}s)",
            file.duration_ticks, file.duration_seconds
        );

        let _ = writeln!(out, "\nTempo changes:");
        for change in self.metadata.tempo_map.changes() {
            let _ = writeln!(
                out,
                "  tick {}: {:.2} BPM ({} us/quarter)",
                change.tick, change.bpm, change.micros_per_quarter
            );
        }

        if !self.metadata.time_signatures.is_empty() {
            let _ = writeln!(out, "\nTime signatures:");
            for ts in &self.metadata.time_signatures {
                let _ = writeln!(out, "  tick {}: {}", ts.tick, ts);
            }
        }

        if !self.metadata.key_signatures.is_empty() {
            let _ = writeln!(out, "\nKey signatures:");
            for ks in &self.metadata.key_signatures {
                let _ = writeln!(out, "  tick {}: {}", ks.tick, ks.name);
            }
        }

        for track in &self.tracks {
            let _ = writeln!(
                out,
                "\nTrack {} \"{}\": {} notes, {} program changes, {} controls",
                track.index,
                track.display_name(),
                track.notes.len(),
                track.program_changes.len(),
                track.controls.len()
            );
            if let Some(stats) = &track.duration_stats {
                let _ = writeln!(
                    out,
                    "  durations: min {} / max {} / mean {:.1} ticks",
                    stats.min_ticks, stats.max_ticks, stats.mean_ticks
                );
            }
            for note in &track.notes {
                let _ = writeln!(
                    out,
                    "  tick {:>7}  {:<4} vel {:>3}  ch {:>2}  dur {} ticks ({:.3}s)",
                    note.onset_tick,
                    note.name,
                    note.velocity,
                    note.channel,
                    note.duration_ticks,
                    note.duration_seconds
                );
            }
        }

        out
    }
}
