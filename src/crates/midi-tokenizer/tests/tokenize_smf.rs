use midi_tokenizer::{MetaRecord, MidiDocument, TokenizeError, TokenizeOptions};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use pretty_assertions::assert_eq;

fn meta(delta: u32, message: MetaMessage<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Meta(message),
    }
}

fn on(delta: u32, key: u8, vel: u8) -> TrackEvent<'static> {
    TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Midi {
            channel: 0.into(),
            message: MidiMessage::NoteOn {
                key: key.into(),
                vel: vel.into(),
            },
        },
    }
}

fn off(delta: u32, key: u8) -> TrackEvent<'static> {
    TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Midi {
            channel: 0.into(),
            message: MidiMessage::NoteOff {
                key: key.into(),
                vel: 0.into(),
            },
        },
    }
}

fn write(tracks: Vec<Vec<TrackEvent<'static>>>) -> Vec<u8> {
    let format = if tracks.len() == 1 {
        Format::SingleTrack
    } else {
        Format::Parallel
    };
    let smf = Smf {
        header: Header::new(format, Timing::Metrical(480.into())),
        tracks,
    };
    let mut bytes = Vec::new();
    smf.write(&mut bytes).unwrap();
    bytes
}

fn tokenize(bytes: &[u8]) -> MidiDocument {
    let stream = midi_tokenizer::EventStream::parse(bytes).unwrap();
    MidiDocument::from_stream("test.mid", &stream, &TokenizeOptions::default()).unwrap()
}

#[test]
fn test_four_quarter_notes() {
    let bytes = write(vec![vec![
        meta(0, MetaMessage::Tempo(500_000.into())),
        meta(0, MetaMessage::TimeSignature(4, 2, 24, 8)),
        meta(0, MetaMessage::TrackName(b"Melody")),
        on(0, 60, 100),
        off(480, 60),
        on(0, 62, 100),
        off(480, 62),
        on(0, 64, 100),
        off(480, 64),
        on(0, 65, 100),
        off(480, 65),
        meta(0, MetaMessage::EndOfTrack),
    ]]);

    let doc = tokenize(&bytes);
    let track = &doc.tracks[0];
    assert_eq!(track.name.as_deref(), Some("Melody"));

    let names: Vec<&str> = track.notes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["C4", "D4", "E4", "F4"]);
    let onsets: Vec<f64> = track.notes.iter().map(|n| n.onset_seconds).collect();
    assert_eq!(onsets, vec![0.0, 0.5, 1.0, 1.5]);
    assert!(track.notes.iter().all(|n| n.duration_ticks == 480));

    let ts = doc.metadata.time_signature().unwrap();
    assert_eq!((ts.numerator, ts.denominator), (4, 4));
    assert!(track
        .meta
        .iter()
        .any(|m| matches!(m, MetaRecord::EndOfTrack { tick: 1920 })));
}

#[test]
fn test_tempo_on_conductor_track_applies_to_all() {
    let bytes = write(vec![
        vec![
            meta(0, MetaMessage::Tempo(1_000_000.into())),
            meta(0, MetaMessage::EndOfTrack),
        ],
        vec![on(0, 48, 80), off(960, 48), meta(0, MetaMessage::EndOfTrack)],
    ]);

    let doc = tokenize(&bytes);
    let note = &doc.tracks[1].notes[0];
    assert!((note.duration_seconds - 2.0).abs() < 1e-9);
    assert!((doc.tempo_map().initial_bpm() - 60.0).abs() < 1e-9);
}

#[test]
fn test_velocity_zero_same_tick_gives_zero_length_note() {
    let bytes = write(vec![vec![on(0, 60, 100), on(0, 60, 0), meta(0, MetaMessage::EndOfTrack)]]);
    let doc = tokenize(&bytes);
    assert_eq!(doc.tracks[0].notes.len(), 1);
    assert_eq!(doc.tracks[0].notes[0].duration_ticks, 0);
}

#[test]
fn test_two_time_signatures_are_rejected_with_ticks() {
    let bytes = write(vec![vec![
        meta(0, MetaMessage::TimeSignature(4, 2, 24, 8)),
        on(0, 60, 100),
        off(1920, 60),
        meta(0, MetaMessage::TimeSignature(3, 2, 24, 8)),
        meta(0, MetaMessage::EndOfTrack),
    ]]);

    let doc = tokenize(&bytes);
    let err = doc.metadata.time_signature().unwrap_err();
    assert_eq!(
        err,
        TokenizeError::AmbiguousTimeSignature {
            ticks: vec![0, 1920]
        }
    );
    assert!(err.to_string().contains("ticks: 0, 1920"));
}

#[test]
fn test_smpte_division_rejected() {
    let smf = Smf {
        header: Header::new(
            Format::SingleTrack,
            Timing::Timecode(midly::Fps::Fps25, 40),
        ),
        tracks: vec![vec![meta(0, MetaMessage::EndOfTrack)]],
    };
    let mut bytes = Vec::new();
    smf.write(&mut bytes).unwrap();

    assert_eq!(
        midi_tokenizer::EventStream::parse(&bytes),
        Err(TokenizeError::SmpteTiming)
    );
}

#[test]
fn test_from_file_records_filename() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiny.mid");
    std::fs::write(&path, write(vec![vec![on(0, 72, 64), off(240, 72)]])).unwrap();

    let doc = MidiDocument::from_file(&path, &TokenizeOptions::default()).unwrap();
    assert_eq!(doc.file.filename, "tiny.mid");
    assert_eq!(doc.tracks[0].notes[0].name, "C5");
}

#[test]
fn test_missing_file_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = MidiDocument::from_file(&dir.path().join("nope.mid"), &TokenizeOptions::default())
        .unwrap_err();
    assert!(matches!(err, TokenizeError::Decode(_)));
}
