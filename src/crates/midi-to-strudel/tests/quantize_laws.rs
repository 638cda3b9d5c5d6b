use midi_to_strudel::{quantize, quantize_monophonic, quantize_polyphonic, Grid, Slice};
use midi_tokenizer::{pitch_name, Note, TimeSignature};
use proptest::prelude::*;

fn arb_note() -> impl Strategy<Value = Note> {
    (0u8..128, 0.0f64..8.0, 0.0f64..3.0).prop_map(|(pitch, onset, duration)| Note {
        pitch,
        name: pitch_name(pitch),
        velocity: 100,
        channel: 0,
        onset_tick: (onset * 960.0) as u64,
        duration_ticks: (duration * 960.0) as u64,
        onset_seconds: onset,
        duration_seconds: duration,
    })
}

fn arb_grid() -> impl Strategy<Value = Grid> {
    (
        prop::sample::select(vec![(8u32, 3u8, 4u16), (16, 4, 4), (8, 6, 8), (32, 4, 4), (12, 4, 4)]),
        40.0f64..220.0,
    )
        .prop_map(|((q, num, den), bpm)| {
            Grid::new(q, &TimeSignature::new(0, num, den), bpm).unwrap()
        })
}

fn note_count(slices: &[Slice]) -> usize {
    slices
        .iter()
        .map(|s| match s {
            Slice::Rest(_) => 0,
            Slice::Note(_) => 1,
            Slice::Chord(tokens) => tokens.len(),
        })
        .sum()
}

proptest! {
    #[test]
    fn no_span_below_one(notes in prop::collection::vec(arb_note(), 0..30), grid in arb_grid(), poly in any::<bool>()) {
        let pattern = quantize(&notes, &grid, None, poly);
        prop_assert!(pattern.note_spans().all(|span| span >= 1));
        prop_assert!(pattern.cycles.iter().flat_map(|c| &c.slices).all(|s| s.slot_count() >= 1));
    }

    #[test]
    fn cycles_always_fill_the_measure(notes in prop::collection::vec(arb_note(), 0..30), grid in arb_grid(), poly in any::<bool>()) {
        let pattern = quantize(&notes, &grid, None, poly);
        prop_assert_eq!(pattern.validate(grid.slices_per_measure), Ok(()));
    }

    #[test]
    fn polyphonic_keeps_every_note(notes in prop::collection::vec(arb_note(), 1..30), grid in arb_grid()) {
        let pattern = quantize_polyphonic(&notes, &grid, None);
        let rendered: usize = pattern.cycles.iter().map(|c| note_count(&c.slices)).sum();
        prop_assert_eq!(rendered, notes.len());
    }

    #[test]
    fn monophonic_keeps_at_least_one_of_two(a in arb_note(), b in arb_note(), grid in arb_grid()) {
        let notes = vec![a, b];
        let pattern = quantize_monophonic(&notes, &grid, None);
        prop_assert!(pattern.note_spans().count() >= 1);
    }

    #[test]
    fn empty_input_renders_nothing(grid in arb_grid(), measures in prop::option::of(0usize..4), poly in any::<bool>()) {
        prop_assert_eq!(quantize(&[], &grid, measures, poly).to_strudel(), "");
    }
}
