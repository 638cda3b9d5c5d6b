use midi_tokenizer::{pair_notes, TempoChange, TempoMap, TrackEvent};
use proptest::prelude::*;

fn tempo_map() -> impl Strategy<Value = TempoMap> {
    (
        1u16..=960,
        prop::collection::vec((0u64..100_000, 100_000u32..2_000_000), 0..8),
    )
        .prop_map(|(division, changes)| {
            TempoMap::new(
                division,
                changes
                    .into_iter()
                    .map(|(tick, micros)| TempoChange::new(tick, micros))
                    .collect(),
            )
        })
}

/// Closed, non-overlapping notes per key: (key, onset, length).
fn closed_pairs() -> impl Strategy<Value = Vec<(u8, u64, u64)>> {
    prop::collection::vec((0u8..128, 0u64..10_000, 0u64..2_000), 0..40).prop_map(|raw| {
        // one note per key keeps every pair unambiguous
        let mut seen = std::collections::HashSet::new();
        raw.into_iter().filter(|(key, _, _)| seen.insert(*key)).collect()
    })
}

fn events_for(pairs: &[(u8, u64, u64)]) -> Vec<TrackEvent> {
    let mut events = Vec::new();
    for &(key, onset, length) in pairs {
        events.push(TrackEvent::note_on(onset, 0, key, 100));
        events.push(TrackEvent::note_off(onset + length, 0, key));
    }
    events
}

proptest! {
    #[test]
    fn ticks_to_seconds_is_monotonic(map in tempo_map(), a in 0u64..200_000, b in 0u64..200_000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(map.ticks_to_seconds(lo) <= map.ticks_to_seconds(hi) + 1e-9);
    }

    #[test]
    fn single_tempo_is_linear(division in 1u16..=960, micros in 1u32..3_000_000, tick in 0u64..1_000_000) {
        let map = TempoMap::new(division, vec![TempoChange::new(0, micros)]);
        let expected = tick as f64 * f64::from(micros) / (f64::from(division) * 1_000_000.0);
        let actual = map.ticks_to_seconds(tick);
        prop_assert!((actual - expected).abs() <= 1e-9 * expected.max(1.0));
    }

    #[test]
    fn duration_is_off_minus_on(pairs in closed_pairs()) {
        let map = TempoMap::new(480, vec![]);
        let notes = pair_notes(&events_for(&pairs), &map);
        prop_assert_eq!(notes.len(), pairs.len());
        for note in &notes {
            let &(_, onset, length) = pairs.iter().find(|(k, _, _)| *k == note.pitch).unwrap();
            prop_assert_eq!(note.onset_tick, onset);
            prop_assert_eq!(note.duration_ticks, length);
        }
    }

    #[test]
    fn pairing_is_idempotent(pairs in closed_pairs()) {
        let map = TempoMap::new(480, vec![TempoChange::new(0, 600_000)]);
        let first = pair_notes(&events_for(&pairs), &map);

        let replayed: Vec<TrackEvent> = first
            .iter()
            .flat_map(|n| {
                [
                    TrackEvent::note_on(n.onset_tick, n.channel, n.pitch, n.velocity),
                    TrackEvent::note_off(n.end_tick(), n.channel, n.pitch),
                ]
            })
            .collect();
        let second = pair_notes(&replayed, &map);

        prop_assert_eq!(first, second);
    }
}
