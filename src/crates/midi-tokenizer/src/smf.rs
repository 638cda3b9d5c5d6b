//! Standard MIDI File loading via `midly`.
//!
//! midly does the byte-level decoding; this module only turns its
//! delta-timed events into the absolute-tick [`EventStream`].

use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::path::Path;
use tracing::debug;

use crate::error::{Result, TokenizeError};
use crate::event::{EventStream, TrackEvent, VoiceMessage};

impl EventStream {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| {
            TokenizeError::Decode(format!("Failed to read MIDI file {}: {}", path.display(), e))
        })?;
        Self::parse(&data)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let smf = Smf::parse(data)?;
        Self::from_smf(&smf)
    }

    pub fn from_smf(smf: &Smf) -> Result<Self> {
        let division = match smf.header.timing {
            Timing::Metrical(tpb) => tpb.as_int(),
            Timing::Timecode(..) => return Err(TokenizeError::SmpteTiming),
        };

        let format = match smf.header.format {
            Format::SingleTrack => 0,
            Format::Parallel => 1,
            Format::Sequential => 2,
        };

        let tracks: Vec<Vec<TrackEvent>> = smf
            .tracks
            .iter()
            .map(|track| {
                let mut tick: u64 = 0;
                let mut events = Vec::with_capacity(track.len());
                for event in track {
                    tick += u64::from(event.delta.as_int());
                    if let Some(converted) = convert_event(tick, &event.kind) {
                        events.push(converted);
                    }
                }
                events
            })
            .collect();

        debug!(format, division, tracks = tracks.len(), "decoded standard MIDI file");

        let stream = EventStream {
            format,
            division,
            tracks,
        };
        stream.validate()?;
        Ok(stream)
    }
}

fn convert_event(tick: u64, kind: &TrackEventKind) -> Option<TrackEvent> {
    match kind {
        TrackEventKind::Midi { channel, message } => {
            let message = match *message {
                MidiMessage::NoteOn { key, vel } => VoiceMessage::NoteOn {
                    key: key.as_int(),
                    velocity: vel.as_int(),
                },
                MidiMessage::NoteOff { key, vel } => VoiceMessage::NoteOff {
                    key: key.as_int(),
                    velocity: vel.as_int(),
                },
                MidiMessage::Aftertouch { key, vel } => VoiceMessage::Aftertouch {
                    key: key.as_int(),
                    pressure: vel.as_int(),
                },
                MidiMessage::Controller { controller, value } => VoiceMessage::ControlChange {
                    controller: controller.as_int(),
                    value: value.as_int(),
                },
                MidiMessage::ProgramChange { program } => VoiceMessage::ProgramChange {
                    program: program.as_int(),
                },
                MidiMessage::ChannelAftertouch { vel } => VoiceMessage::ChannelAftertouch {
                    pressure: vel.as_int(),
                },
                MidiMessage::PitchBend { bend } => VoiceMessage::PitchBend {
                    value: bend.0.as_int(),
                },
            };
            Some(TrackEvent::voice(tick, channel.as_int(), message))
        }
        TrackEventKind::Meta(meta) => {
            let (meta_type, data) = lower_meta(meta);
            Some(TrackEvent::meta(tick, meta_type, data))
        }
        // SysEx and escape sequences carry nothing the tokenizer uses
        TrackEventKind::SysEx(_) | TrackEventKind::Escape(_) => None,
    }
}

/// Back to the on-disk `(type, payload)` form.
fn lower_meta(meta: &MetaMessage) -> (u8, Vec<u8>) {
    match *meta {
        MetaMessage::TrackNumber(number) => (
            0x00,
            number.map(|n| n.to_be_bytes().to_vec()).unwrap_or_default(),
        ),
        MetaMessage::Text(text) => (0x01, text.to_vec()),
        MetaMessage::Copyright(text) => (0x02, text.to_vec()),
        MetaMessage::TrackName(text) => (0x03, text.to_vec()),
        MetaMessage::InstrumentName(text) => (0x04, text.to_vec()),
        MetaMessage::Lyric(text) => (0x05, text.to_vec()),
        MetaMessage::Marker(text) => (0x06, text.to_vec()),
        MetaMessage::CuePoint(text) => (0x07, text.to_vec()),
        MetaMessage::ProgramName(text) => (0x08, text.to_vec()),
        MetaMessage::DeviceName(text) => (0x09, text.to_vec()),
        MetaMessage::MidiChannel(channel) => (0x20, vec![channel.as_int()]),
        MetaMessage::MidiPort(port) => (0x21, vec![port.as_int()]),
        MetaMessage::EndOfTrack => (0x2F, Vec::new()),
        MetaMessage::Tempo(tempo) => (0x51, tempo.as_int().to_be_bytes()[1..].to_vec()),
        MetaMessage::SmpteOffset(time) => {
            let rate: u8 = match time.fps() {
                midly::Fps::Fps24 => 0,
                midly::Fps::Fps25 => 1,
                midly::Fps::Fps29 => 2,
                midly::Fps::Fps30 => 3,
            };
            (
                0x54,
                vec![
                    (rate << 5) | time.hour(),
                    time.minute(),
                    time.second(),
                    time.frame(),
                    time.subframe(),
                ],
            )
        }
        MetaMessage::TimeSignature(num, den, clocks, notes) => (0x58, vec![num, den, clocks, notes]),
        MetaMessage::KeySignature(sharps, minor) => (0x59, vec![sharps as u8, u8::from(minor)]),
        MetaMessage::SequencerSpecific(data) => (0x7F, data.to_vec()),
        MetaMessage::Unknown(meta_type, data) => (meta_type, data.to_vec()),
    }
}
