//! Note-on/note-off pairing.
//!
//! A retriggered key (second note-on before the note-off) replaces the
//! pending onset; the earlier onset never becomes a note. Note-offs without
//! an onset and onsets still open at end of track are dropped. Notes come
//! out in the order their closing event is seen, not sorted by onset.

use std::collections::HashMap;
use tracing::trace;

use crate::event::{EventKind, TrackEvent, VoiceMessage};
use crate::note::{pitch_name, Note};
use crate::tempo::TempoMap;

/// `channel << 8 | pitch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingKey(u16);

impl PendingKey {
    pub fn new(channel: u8, pitch: u8) -> Self {
        Self((u16::from(channel) << 8) | u16::from(pitch))
    }

    pub fn channel(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn pitch(self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOnset {
    pub tick: u64,
    pub velocity: u8,
}

/// Open onsets waiting for their note-off.
#[derive(Debug, Default)]
pub struct PendingTable {
    open: HashMap<PendingKey, PendingOnset>,
}

impl PendingTable {
    /// Returns the onset that was replaced, if any.
    pub fn open(&mut self, key: PendingKey, onset: PendingOnset) -> Option<PendingOnset> {
        self.open.insert(key, onset)
    }

    pub fn close(&mut self, key: PendingKey) -> Option<PendingOnset> {
        self.open.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

pub struct NotePairer<'a> {
    tempo: &'a TempoMap,
    pending: PendingTable,
    notes: Vec<Note>,
    replaced: usize,
    orphaned_offs: usize,
}

impl<'a> NotePairer<'a> {
    pub fn new(tempo: &'a TempoMap) -> Self {
        Self {
            tempo,
            pending: PendingTable::default(),
            notes: Vec::new(),
            replaced: 0,
            orphaned_offs: 0,
        }
    }

    pub fn push(&mut self, event: &TrackEvent) {
        let EventKind::Voice { channel, message } = &event.kind else {
            return;
        };

        match *message {
            VoiceMessage::NoteOn { key, velocity } if velocity > 0 => {
                let onset = PendingOnset {
                    tick: event.tick,
                    velocity,
                };
                if self.pending.open(PendingKey::new(*channel, key), onset).is_some() {
                    self.replaced += 1;
                }
            }
            VoiceMessage::NoteOn { key, .. } | VoiceMessage::NoteOff { key, .. } => {
                self.close(event.tick, PendingKey::new(*channel, key));
            }
            _ => {}
        }
    }

    fn close(&mut self, off_tick: u64, key: PendingKey) {
        let Some(onset) = self.pending.close(key) else {
            self.orphaned_offs += 1;
            return;
        };

        // ties and out-of-order input can put the off before the on
        let off_tick = off_tick.max(onset.tick);
        let onset_seconds = self.tempo.ticks_to_seconds(onset.tick);
        let end_seconds = self.tempo.ticks_to_seconds(off_tick);

        self.notes.push(Note {
            pitch: key.pitch(),
            name: pitch_name(key.pitch()),
            velocity: onset.velocity,
            channel: key.channel(),
            onset_tick: onset.tick,
            duration_ticks: off_tick - onset.tick,
            onset_seconds,
            duration_seconds: end_seconds - onset_seconds,
        });
    }

    pub fn finish(self) -> Vec<Note> {
        trace!(
            notes = self.notes.len(),
            unclosed = self.pending.len(),
            replaced = self.replaced,
            orphaned_offs = self.orphaned_offs,
            "paired track notes"
        );
        self.notes
    }
}

pub fn pair_notes(events: &[TrackEvent], tempo: &TempoMap) -> Vec<Note> {
    let mut pairer = NotePairer::new(tempo);
    for event in events {
        pairer.push(event);
    }
    pairer.finish()
}
