//! Quantization grid engine.
//!
//! Snaps a track's notes onto the grid and builds one [`Cycle`] per measure.
//! Polyphonic mode keeps every note and groups simultaneous onsets into
//! chords. Monophonic mode gives each slice to at most one note.

use std::collections::BTreeMap;

use midi_tokenizer::{pitch_name, Note};
use tracing::{debug, warn};

use crate::ast::{Cycle, NoteToken, Pattern, Slice};
use crate::grid::Grid;

/// Lowercase pitch name as Strudel writes it ("c#4").
pub fn strudel_name(pitch: u8) -> String {
    pitch_name(pitch).to_lowercase()
}

/// Quantize with the chosen mode. `total_measures` pads (or cuts) the pattern
/// to a fixed length so several tracks share one cycle count.
pub fn quantize(
    notes: &[Note],
    grid: &Grid,
    total_measures: Option<usize>,
    polyphonic: bool,
) -> Pattern {
    if polyphonic {
        quantize_polyphonic(notes, grid, total_measures)
    } else {
        quantize_monophonic(notes, grid, total_measures)
    }
}

fn warn_beyond(notes: &[Note], grid: &Grid, measures: usize) {
    let limit = (measures * grid.slices_per_measure) as u64;
    let beyond = notes
        .iter()
        .filter(|n| grid.position(n.onset_seconds) >= limit)
        .count();
    if beyond > 0 {
        warn!(beyond, measures, "skipping notes that start after the last measure");
    }
}

pub fn quantize_polyphonic(notes: &[Note], grid: &Grid, total_measures: Option<usize>) -> Pattern {
    if notes.is_empty() {
        return Pattern::default();
    }

    let spm = grid.slices_per_measure;
    let measures = total_measures.unwrap_or_else(|| grid.measures_needed(notes));
    let limit = (measures * spm) as u64;
    warn_beyond(notes, grid, measures);

    // onset position -> notes starting there, in input order
    let mut groups: BTreeMap<u64, Vec<NoteToken>> = BTreeMap::new();
    for note in notes {
        let position = grid.position(note.onset_seconds);
        if position >= limit {
            continue;
        }
        let duration = grid.duration(note.duration_seconds) as usize;
        groups
            .entry(position)
            .or_default()
            .push(NoteToken::new(strudel_name(note.pitch), duration));
    }

    let cycles: Vec<Cycle> = (0..measures)
        .map(|measure| {
            let start = (measure * spm) as u64;
            let end = start + spm as u64;
            let occupied: Vec<(u64, &Vec<NoteToken>)> =
                groups.range(start..end).map(|(p, g)| (*p, g)).collect();

            if occupied.is_empty() {
                return Cycle::rest(spm);
            }

            let mut slices = Vec::with_capacity(occupied.len() * 2 + 1);
            let mut cursor = start;
            for (i, (position, group)) in occupied.iter().enumerate() {
                if *position > cursor {
                    slices.push(Slice::Rest((position - cursor) as usize));
                }

                // a sounding group is cut at the next onset or the barline
                let next = occupied.get(i + 1).map(|(p, _)| *p).unwrap_or(end);
                let available = (next - position) as usize;
                let tokens: Vec<NoteToken> = group
                    .iter()
                    .map(|t| NoteToken::new(t.name.clone(), t.span.clamp(1, available)))
                    .collect();
                let consumed = tokens.iter().map(|t| t.span).max().unwrap_or(1);

                slices.push(Slice::group(tokens));
                cursor = position + consumed as u64;
            }
            if cursor < end {
                slices.push(Slice::Rest((end - cursor) as usize));
            }

            Cycle::new(slices)
        })
        .collect();

    debug!(
        notes = notes.len(),
        measures,
        onsets = groups.len(),
        "quantized track (polyphonic)"
    );
    Pattern::new(cycles)
}

#[derive(Debug, Clone, Copy)]
struct Claim {
    pitch: u8,
    duration_seconds: f64,
}

/// Strictly longer notes take a slice; on a tie the earlier writer keeps it.
fn contest(slot: &mut Option<Claim>, claim: Claim) -> bool {
    match slot {
        Some(held) if held.duration_seconds >= claim.duration_seconds => false,
        _ => {
            *slot = Some(claim);
            true
        }
    }
}

pub fn quantize_monophonic(notes: &[Note], grid: &Grid, total_measures: Option<usize>) -> Pattern {
    if notes.is_empty() {
        return Pattern::default();
    }

    let spm = grid.slices_per_measure;
    let measures = total_measures.unwrap_or_else(|| grid.measures_needed(notes));
    warn_beyond(notes, grid, measures);

    let slice = grid.slice_seconds;
    let mut slots: Vec<Option<Claim>> = vec![None; measures * spm];
    let mut lost = 0usize;

    for note in notes {
        let start = note.onset_seconds.max(0.0);
        let end = start + note.duration_seconds.max(0.0);
        let claim = Claim {
            pitch: note.pitch,
            duration_seconds: note.duration_seconds,
        };

        let first = (start / slice).floor() as usize;
        let last = ((end / slice).ceil() as usize).min(slots.len());
        let mut covered = false;
        for index in first..last {
            let slot_start = index as f64 * slice;
            let overlap = end.min(slot_start + slice) - start.max(slot_start);
            if overlap > slice * 0.5 {
                covered = true;
                if !contest(&mut slots[index], claim) {
                    lost += 1;
                }
            }
        }

        // too short to cover any slice: still gets the one it starts in
        if !covered {
            let index = grid.position(start) as usize;
            if let Some(slot) = slots.get_mut(index) {
                if !contest(slot, claim) {
                    lost += 1;
                }
            }
        }
    }

    let cycles: Vec<Cycle> = slots
        .chunks(spm)
        .map(|measure| {
            let mut slices = Vec::new();
            let mut i = 0;
            while i < measure.len() {
                let pitch = measure[i].map(|c| c.pitch);
                let mut run = 1;
                while i + run < measure.len() && measure[i + run].map(|c| c.pitch) == pitch {
                    run += 1;
                }
                slices.push(match pitch {
                    Some(p) => Slice::Note(NoteToken::new(strudel_name(p), run)),
                    None => Slice::Rest(run),
                });
                i += run;
            }
            Cycle::new(slices)
        })
        .collect();

    debug!(
        notes = notes.len(),
        measures,
        contested_slices_lost = lost,
        "quantized track (monophonic)"
    );
    Pattern::new(cycles)
}
