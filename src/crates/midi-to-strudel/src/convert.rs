//! Conversion pipeline: document -> grid -> patterns -> Strudel file.

use chrono::{Local, NaiveDate};
use midi_tokenizer::{MidiDocument, Note, TokenizeOptions, Track};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::ast::Pattern;
use crate::error::{ConvertError, Result};
use crate::grid::{default_quantization, validate_quantization, Grid};
use crate::instruments::get_track_sound;
use crate::quantize::quantize;
use crate::template::{Header, OutputFormatter, RenderedTrack};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// BPM override; the file's tempo at tick 0 otherwise.
    pub tempo: Option<f64>,
    /// Track to convert; the first track with notes otherwise.
    pub track: Option<usize>,
    pub all_tracks: bool,
    /// Grid resolution (6, 8, 12, 16, 24 or 32); picked from the meter otherwise.
    pub quantization: Option<u32>,
    pub polyphonic: bool,
    pub tab_size: usize,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            tempo: None,
            track: None,
            all_tracks: false,
            quantization: None,
            polyphonic: true,
            tab_size: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Conversion {
    pub header: Header,
    pub tracks: Vec<RenderedTrack>,
    pub output: String,
}

/// Load a `.json` document written by the tokenizer, or tokenize a MIDI file.
pub fn load_document(path: &Path) -> Result<MidiDocument> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let doc = if is_json {
        MidiDocument::from_json_file(path)?
    } else {
        MidiDocument::from_file(path, &TokenizeOptions::default())?
    };
    Ok(doc)
}

pub fn convert_file(path: &Path, options: &ConversionOptions) -> Result<Conversion> {
    let doc = load_document(path)?;
    convert_document(&doc, options, Local::now().date_naive())
}

/// Notes in onset order; equal onsets keep pairing order.
fn sorted_notes(track: &Track) -> Vec<Note> {
    let mut notes = track.notes.clone();
    notes.sort_by_key(|n| n.onset_tick);
    notes
}

fn render_track(track: &Track, grid: &Grid, total_measures: Option<usize>, polyphonic: bool) -> RenderedTrack {
    let notes = sorted_notes(track);
    let pattern: Pattern = quantize(&notes, grid, total_measures, polyphonic);

    if let Err(e) = pattern.validate(grid.slices_per_measure) {
        warn!(track = track.index, "pattern validation error: {}", e);
    }
    debug!(
        track = track.index,
        notes = notes.len(),
        cycles = pattern.cycles.len(),
        "rendered track"
    );

    let sound = get_track_sound(track.first_program().map(|p| (p.program, p.channel)));
    RenderedTrack {
        index: track.index,
        name: track.name.clone(),
        sound: sound.to_string(),
        pattern,
        duration_stats: track.duration_stats.clone(),
    }
}

fn select_track<'a>(doc: &'a MidiDocument, index: Option<usize>) -> Result<&'a Track> {
    let count = doc.tracks.len();
    match index {
        Some(index) => {
            let track = doc
                .tracks
                .get(index)
                .ok_or(ConvertError::TrackOutOfRange { index, count })?;
            if !track.has_notes() {
                return Err(ConvertError::EmptyTrack {
                    index,
                    name: track.display_name().to_string(),
                });
            }
            Ok(track)
        }
        None => doc
            .tracks
            .iter()
            .find(|t| t.has_notes())
            .ok_or(ConvertError::NoNoteTracks { count }),
    }
}

pub fn convert_document(
    doc: &MidiDocument,
    options: &ConversionOptions,
    converted: NaiveDate,
) -> Result<Conversion> {
    if let Some(q) = options.quantization {
        validate_quantization(q)?;
    }

    // file-global inputs are settled before any track is touched
    let time_signature = doc.metadata.time_signature()?;
    let bpm = options
        .tempo
        .unwrap_or_else(|| doc.tempo_map().initial_bpm());
    let quantization = options
        .quantization
        .unwrap_or_else(|| default_quantization(&time_signature));
    let grid = Grid::new(quantization, &time_signature, bpm)?;

    info!(
        source = %doc.file.filename,
        bpm,
        time_signature = %time_signature,
        quantization,
        slices_per_measure = grid.slices_per_measure,
        "converting"
    );

    let header = Header {
        source: doc.file.filename.clone(),
        bpm,
        time_signature,
        quantization,
        quantization_overridden: options.quantization.is_some(),
        slices_per_measure: grid.slices_per_measure,
        polyphonic: options.polyphonic,
        converted,
    };
    let formatter = OutputFormatter::new(options.tab_size);

    if options.all_tracks {
        let with_notes: Vec<&Track> = doc.tracks.iter().filter(|t| t.has_notes()).collect();
        if with_notes.is_empty() {
            return Err(ConvertError::NoNoteTracks {
                count: doc.tracks.len(),
            });
        }

        // every track gets the same cycle count so `stack` lines them up
        let total_measures = with_notes
            .iter()
            .map(|t| grid.measures_needed(&t.notes))
            .max()
            .unwrap_or(0);
        debug!(tracks = with_notes.len(), total_measures, "shared measure count");

        let tracks: Vec<RenderedTrack> = with_notes
            .iter()
            .map(|t| render_track(t, &grid, Some(total_measures), options.polyphonic))
            .collect();
        let output = formatter.build_multi(&header, &tracks);

        Ok(Conversion {
            header,
            tracks,
            output,
        })
    } else {
        let track = select_track(doc, options.track)?;
        let rendered = render_track(track, &grid, None, options.polyphonic);
        let output = formatter.build_single(&header, &rendered);

        Ok(Conversion {
            header,
            tracks: vec![rendered],
            output,
        })
    }
}
