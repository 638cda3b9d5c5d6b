//! File-global tempo map and tick/second conversion.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::event::{EventStream, META_SET_TEMPO};
use crate::meta::{self, MetaRecord};

/// 120 BPM.
pub const DEFAULT_MICROS_PER_QUARTER: u32 = 500_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoChange {
    pub tick: u64,
    pub micros_per_quarter: u32,
    pub bpm: f64,
}

impl TempoChange {
    pub fn new(tick: u64, micros_per_quarter: u32) -> Self {
        Self {
            tick,
            micros_per_quarter,
            bpm: micros_to_bpm(micros_per_quarter),
        }
    }
}

pub fn micros_to_bpm(micros_per_quarter: u32) -> f64 {
    60_000_000.0 / f64::from(micros_per_quarter.max(1))
}

/// Ordered tempo changes plus the division they are measured against.
///
/// Always holds at least one entry. Entries sharing a tick keep their
/// encounter order; the later one governs conversions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoMap {
    division: u16,
    changes: Vec<TempoChange>,
}

impl TempoMap {
    pub fn new(division: u16, mut changes: Vec<TempoChange>) -> Self {
        if changes.is_empty() {
            changes.push(TempoChange::new(0, DEFAULT_MICROS_PER_QUARTER));
        }
        // stable: same-tick entries stay in encounter order
        changes.sort_by_key(|c| c.tick);
        Self { division, changes }
    }

    /// Collect set-tempo events from every track of the stream.
    ///
    /// A set-tempo payload shorter than three bytes is a
    /// [`crate::TokenizeError::TruncatedMeta`], as everywhere else.
    pub fn build(stream: &EventStream) -> Result<Self> {
        let mut changes = Vec::new();
        for (tick, meta_type, data) in stream.meta_events() {
            if meta_type != META_SET_TEMPO {
                continue;
            }
            if let MetaRecord::Tempo {
                micros_per_quarter, ..
            } = meta::extract(tick, meta_type, data)?
            {
                changes.push(TempoChange::new(tick, micros_per_quarter));
            }
        }

        debug!(changes = changes.len(), "built tempo map");
        Ok(Self::new(stream.division, changes))
    }

    pub fn division(&self) -> u16 {
        self.division
    }

    pub fn changes(&self) -> &[TempoChange] {
        &self.changes
    }

    /// BPM in effect at tick 0, the tempo the quantization grid runs at.
    ///
    /// The last of several tick-0 entries wins, matching
    /// [`Self::ticks_to_seconds`]. A map whose first change comes later
    /// starts at the default tempo.
    pub fn initial_bpm(&self) -> f64 {
        self.changes
            .iter()
            .take_while(|c| c.tick == 0)
            .last()
            .map(|c| c.bpm)
            .unwrap_or_else(|| micros_to_bpm(DEFAULT_MICROS_PER_QUARTER))
    }

    fn segment_seconds(&self, ticks: u64, micros_per_quarter: u32) -> f64 {
        (ticks as f64 * f64::from(micros_per_quarter)) / (f64::from(self.division) * 1_000_000.0)
    }

    /// Elapsed seconds at `tick`, integrating over every tempo segment before it.
    pub fn ticks_to_seconds(&self, tick: u64) -> f64 {
        let mut seconds = 0.0;
        let mut segment_start = 0;
        let mut tempo = DEFAULT_MICROS_PER_QUARTER;

        for change in &self.changes {
            if change.tick >= tick {
                break;
            }
            seconds += self.segment_seconds(change.tick - segment_start, tempo);
            segment_start = change.tick;
            tempo = change.micros_per_quarter;
        }

        seconds + self.segment_seconds(tick - segment_start, tempo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TokenizeError;
    use crate::event::TrackEvent;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_default_tempo_when_stream_has_none() {
        let stream = EventStream::new(480, vec![vec![TrackEvent::note_on(0, 0, 60, 100)]]);
        let map = TempoMap::build(&stream).unwrap();
        assert_eq!(map.changes().len(), 1);
        assert_eq!(map.changes()[0].tick, 0);
        assert_eq!(map.changes()[0].micros_per_quarter, 500_000);
        assert!((map.initial_bpm() - 120.0).abs() < EPS);
    }

    #[test]
    fn test_single_tempo_is_linear() {
        let map = TempoMap::new(480, vec![TempoChange::new(0, 500_000)]);
        assert_eq!(map.ticks_to_seconds(0), 0.0);
        assert!((map.ticks_to_seconds(480) - 0.5).abs() < EPS);
        assert!((map.ticks_to_seconds(1920) - 2.0).abs() < EPS);
    }

    #[test]
    fn test_tempo_changes_collected_across_tracks_and_sorted() {
        let stream = EventStream::new(
            480,
            vec![
                vec![TrackEvent::tempo(960, 250_000)],
                vec![TrackEvent::tempo(0, 500_000)],
            ],
        );
        let map = TempoMap::build(&stream).unwrap();
        let ticks: Vec<u64> = map.changes().iter().map(|c| c.tick).collect();
        assert_eq!(ticks, vec![0, 960]);
    }

    #[test]
    fn test_segment_uses_tempo_active_at_its_start() {
        // 120 BPM for two beats, then 240 BPM
        let map = TempoMap::new(
            480,
            vec![TempoChange::new(0, 500_000), TempoChange::new(960, 250_000)],
        );
        assert!((map.ticks_to_seconds(960) - 1.0).abs() < EPS);
        assert!((map.ticks_to_seconds(1440) - 1.25).abs() < EPS);
        assert!((map.ticks_to_seconds(1920) - 1.5).abs() < EPS);
    }

    #[test]
    fn test_ticks_before_first_change_use_default_tempo() {
        let map = TempoMap::new(480, vec![TempoChange::new(960, 1_000_000)]);
        assert!((map.ticks_to_seconds(480) - 0.5).abs() < EPS);
        assert!((map.ticks_to_seconds(960) - 1.0).abs() < EPS);
        assert!((map.ticks_to_seconds(1440) - 2.0).abs() < EPS);
    }

    #[test]
    fn test_later_same_tick_entry_wins() {
        let map = TempoMap::new(
            480,
            vec![TempoChange::new(0, 500_000), TempoChange::new(0, 1_000_000)],
        );
        assert_eq!(map.changes().len(), 2);
        assert!((map.ticks_to_seconds(480) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_truncated_tempo_payload_is_an_error() {
        let stream = EventStream::new(
            480,
            vec![vec![TrackEvent::meta(0, META_SET_TEMPO, vec![0x07, 0xA1])]],
        );
        assert_eq!(
            TempoMap::build(&stream),
            Err(TokenizeError::TruncatedMeta {
                kind: "tempo",
                tick: 0,
                expected: 3,
                found: 2,
            })
        );
    }

    #[test]
    fn test_initial_bpm_follows_last_tick_zero_entry() {
        let map = TempoMap::new(
            480,
            vec![
                TempoChange::new(0, 500_000),
                TempoChange::new(0, 1_000_000),
                TempoChange::new(960, 250_000),
            ],
        );
        assert!((map.initial_bpm() - 60.0).abs() < EPS);
    }

    #[test]
    fn test_initial_bpm_is_default_before_a_late_first_change() {
        let map = TempoMap::new(480, vec![TempoChange::new(960, 1_000_000)]);
        assert!((map.initial_bpm() - 120.0).abs() < EPS);
    }
}
