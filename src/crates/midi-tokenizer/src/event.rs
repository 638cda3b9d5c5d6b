//! Absolute-tick event stream consumed by the tokenizer.
//!
//! Channel voice messages arrive already typed. Meta messages stay as a type
//! byte plus raw payload and are classified later by [`crate::meta`].

use serde::{Deserialize, Serialize};

use crate::error::{Result, TokenizeError};

pub const META_TEXT: u8 = 0x01;
pub const META_COPYRIGHT: u8 = 0x02;
pub const META_TRACK_NAME: u8 = 0x03;
pub const META_INSTRUMENT_NAME: u8 = 0x04;
pub const META_LYRIC: u8 = 0x05;
pub const META_MARKER: u8 = 0x06;
pub const META_CUE_POINT: u8 = 0x07;
pub const META_END_OF_TRACK: u8 = 0x2F;
pub const META_SET_TEMPO: u8 = 0x51;
pub const META_TIME_SIGNATURE: u8 = 0x58;
pub const META_KEY_SIGNATURE: u8 = 0x59;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VoiceMessage {
    NoteOn { key: u8, velocity: u8 },
    NoteOff { key: u8, velocity: u8 },
    Aftertouch { key: u8, pressure: u8 },
    ControlChange { controller: u8, value: u8 },
    ProgramChange { program: u8 },
    ChannelAftertouch { pressure: u8 },
    /// Raw 14-bit value, 0x2000 is centre.
    PitchBend { value: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    Voice { channel: u8, message: VoiceMessage },
    Meta { meta_type: u8, data: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEvent {
    pub tick: u64,
    pub kind: EventKind,
}

impl TrackEvent {
    pub fn voice(tick: u64, channel: u8, message: VoiceMessage) -> Self {
        Self {
            tick,
            kind: EventKind::Voice { channel, message },
        }
    }

    pub fn meta(tick: u64, meta_type: u8, data: impl Into<Vec<u8>>) -> Self {
        Self {
            tick,
            kind: EventKind::Meta {
                meta_type,
                data: data.into(),
            },
        }
    }

    pub fn note_on(tick: u64, channel: u8, key: u8, velocity: u8) -> Self {
        Self::voice(tick, channel, VoiceMessage::NoteOn { key, velocity })
    }

    pub fn note_off(tick: u64, channel: u8, key: u8) -> Self {
        Self::voice(tick, channel, VoiceMessage::NoteOff { key, velocity: 0 })
    }

    pub fn tempo(tick: u64, micros_per_quarter: u32) -> Self {
        let bytes = micros_per_quarter.to_be_bytes();
        Self::meta(tick, META_SET_TEMPO, bytes[1..].to_vec())
    }

    /// `denominator` is the written denominator (4 for 3/4), encoded as its log2.
    pub fn time_signature(tick: u64, numerator: u8, denominator: u8) -> Self {
        let power = denominator.max(1).trailing_zeros() as u8;
        Self::meta(tick, META_TIME_SIGNATURE, vec![numerator, power, 24, 8])
    }

    pub fn track_name(tick: u64, name: &str) -> Self {
        Self::meta(tick, META_TRACK_NAME, name.as_bytes().to_vec())
    }
}

/// Every track of one file, plus the file-wide division.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStream {
    pub format: u8,
    pub division: u16,
    pub tracks: Vec<Vec<TrackEvent>>,
}

impl EventStream {
    pub fn new(division: u16, tracks: Vec<Vec<TrackEvent>>) -> Self {
        let format = if tracks.len() == 1 { 0 } else { 1 };
        Self {
            format,
            division,
            tracks,
        }
    }

    /// Reject malformed input before any timing work starts.
    pub fn validate(&self) -> Result<()> {
        if self.division == 0 {
            return Err(TokenizeError::InvalidDivision(self.division));
        }

        for (track, events) in self.tracks.iter().enumerate() {
            for event in events {
                let EventKind::Voice { channel, message } = &event.kind else {
                    continue;
                };
                if *channel > 15 {
                    return Err(TokenizeError::ChannelOutOfRange {
                        track,
                        tick: event.tick,
                        channel: *channel,
                    });
                }
                let key = match message {
                    VoiceMessage::NoteOn { key, .. }
                    | VoiceMessage::NoteOff { key, .. }
                    | VoiceMessage::Aftertouch { key, .. } => Some(*key),
                    _ => None,
                };
                if let Some(pitch) = key.filter(|k| *k > 127) {
                    return Err(TokenizeError::PitchOutOfRange {
                        track,
                        tick: event.tick,
                        pitch,
                    });
                }
            }
        }

        Ok(())
    }

    /// Last tick seen on any track.
    pub fn max_tick(&self) -> u64 {
        self.tracks
            .iter()
            .flat_map(|t| t.iter().map(|e| e.tick))
            .max()
            .unwrap_or(0)
    }

    /// Meta events of every track, in track order then encounter order.
    pub fn meta_events(&self) -> impl Iterator<Item = (u64, u8, &[u8])> + '_ {
        self.tracks.iter().flatten().filter_map(|event| match &event.kind {
            EventKind::Meta { meta_type, data } => Some((event.tick, *meta_type, data.as_slice())),
            EventKind::Voice { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tempo_event_is_24_bit_big_endian() {
        let event = TrackEvent::tempo(0, 500_000);
        assert_eq!(
            event.kind,
            EventKind::Meta {
                meta_type: META_SET_TEMPO,
                data: vec![0x07, 0xA1, 0x20]
            }
        );
    }

    #[test]
    fn test_time_signature_encodes_denominator_power() {
        let event = TrackEvent::time_signature(0, 6, 8);
        let EventKind::Meta { data, .. } = event.kind else {
            panic!("expected meta event");
        };
        assert_eq!(data, vec![6, 3, 24, 8]);
    }

    #[test]
    fn test_validate_rejects_zero_division() {
        let stream = EventStream::new(0, vec![vec![]]);
        assert_eq!(stream.validate(), Err(TokenizeError::InvalidDivision(0)));
    }

    #[test]
    fn test_validate_rejects_out_of_range_pitch() {
        let stream = EventStream::new(480, vec![vec![TrackEvent::note_on(10, 0, 200, 100)]]);
        assert_eq!(
            stream.validate(),
            Err(TokenizeError::PitchOutOfRange {
                track: 0,
                tick: 10,
                pitch: 200
            })
        );
    }

    #[test]
    fn test_validate_rejects_out_of_range_channel() {
        let stream = EventStream::new(480, vec![vec![TrackEvent::note_on(0, 16, 60, 100)]]);
        assert!(matches!(
            stream.validate(),
            Err(TokenizeError::ChannelOutOfRange { channel: 16, .. })
        ));
    }

    #[test]
    fn test_max_tick_spans_tracks() {
        let stream = EventStream::new(
            480,
            vec![
                vec![TrackEvent::note_on(0, 0, 60, 90), TrackEvent::note_off(480, 0, 60)],
                vec![TrackEvent::note_on(960, 1, 40, 90), TrackEvent::note_off(1920, 1, 40)],
            ],
        );
        assert_eq!(stream.max_tick(), 1920);
        assert_eq!(stream.format, 1);
    }
}
