//! Strudel file templates.

use chrono::NaiveDate;
use midi_tokenizer::{DurationStats, TimeSignature};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ast::Pattern;
use crate::grid::grid_meaning;

/// File-level facts shown in the metadata block.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub source: String,
    pub bpm: f64,
    pub time_signature: TimeSignature,
    pub quantization: u32,
    pub quantization_overridden: bool,
    pub slices_per_measure: usize,
    pub polyphonic: bool,
    pub converted: NaiveDate,
}

impl Header {
    /// Cycles are whole measures, counted in quarter-note beats.
    pub fn beats_per_cycle(&self) -> u32 {
        let ts = &self.time_signature;
        (u32::from(ts.numerator) * 4 / u32::from(ts.denominator.max(1))).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedTrack {
    pub index: usize,
    pub name: Option<String>,
    pub sound: String,
    pub pattern: Pattern,
    pub duration_stats: Option<DurationStats>,
}

impl RenderedTrack {
    pub fn variable(&self) -> String {
        format!("track_{}", self.index)
    }

    fn label(&self) -> String {
        match self.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => format!("{} ({})", self.index, name),
            None => self.index.to_string(),
        }
    }
}

/// "120" for whole tempos, "93.75" otherwise.
pub fn format_bpm(bpm: f64) -> String {
    if (bpm - bpm.round()).abs() < 1e-9 {
        format!("{}", bpm.round() as i64)
    } else {
        let fixed = format!("{:.2}", bpm);
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

pub struct OutputFormatter {
    tab_size: usize,
}

impl OutputFormatter {
    pub fn new(tab_size: usize) -> Self {
        Self { tab_size }
    }

    /// One track bound to `track_N`, with reverb applied.
    pub fn build_single(&self, header: &Header, track: &RenderedTrack) -> String {
        let name = track.variable();
        let mut output = Vec::new();

        output.push(format!("/* \"{}\" */", name));
        output.push(self.metadata_block(header, &[track]));
        output.push(String::new());
        output.push(self.setcpm(header));
        output.push(String::new());
        output.push(self.track_definition(track));
        output.push(String::new());
        output.push(format!("{}.room(0.2)", name));

        output.join("\n") + "\n"
    }

    /// Every track bound to its own variable and played together with `stack`.
    pub fn build_multi(&self, header: &Header, tracks: &[RenderedTrack]) -> String {
        let title = Path::new(&header.source)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| header.source.clone());
        let refs: Vec<&RenderedTrack> = tracks.iter().collect();

        let mut output = Vec::new();
        output.push(format!("/* \"{}\" */", title));
        output.push(self.metadata_block(header, &refs));
        output.push(String::new());
        output.push(self.setcpm(header));
        output.push(String::new());

        for track in tracks {
            output.push(format!("// Track {}", track.label()));
            output.push(self.track_definition(track));
            output.push(String::new());
        }

        let names: Vec<String> = tracks.iter().map(RenderedTrack::variable).collect();
        output.push(format!("stack({})", names.join(", ")));

        output.join("\n") + "\n"
    }

    fn metadata_block(&self, header: &Header, tracks: &[&RenderedTrack]) -> String {
        let mut lines = vec!["/**".to_string()];
        lines.push(format!("Source: {}", header.source));
        lines.push(format!("Tempo: {} BPM", format_bpm(header.bpm)));
        lines.push(format!("Time Signature: {}", header.time_signature));

        match tracks {
            [track] => {
                lines.push(format!("Track: {}", track.label()));
                if let Some(stats) = &track.duration_stats {
                    lines.push(format!("Notes: {}", describe_stats(stats)));
                }
            }
            many => {
                let labels: Vec<String> = many.iter().map(|t| t.label()).collect();
                lines.push(format!("Tracks: {}", labels.join(", ")));
            }
        }

        lines.push(format!(
            "Quantization: {} ({})",
            header.quantization,
            if header.quantization_overridden {
                "override"
            } else {
                "default"
            }
        ));
        lines.push(format!("Grid: {}", grid_meaning(header.quantization)));
        lines.push(format!("Slices per measure: {}", header.slices_per_measure));
        lines.push(format!(
            "Mode: {}",
            if header.polyphonic {
                "polyphonic"
            } else {
                "monophonic"
            }
        ));
        lines.push(format!("Converted: {}", header.converted.format("%Y-%m-%d")));
        lines.push("**/".to_string());

        lines.join("\n")
    }

    fn setcpm(&self, header: &Header) -> String {
        format!(
            "setcpm({}/{})",
            format_bpm(header.bpm),
            header.beats_per_cycle()
        )
    }

    fn track_definition(&self, track: &RenderedTrack) -> String {
        format!(
            "let {} = {}.sound(\"{}\")",
            track.variable(),
            self.format_pattern_with_indent(&track.pattern),
            track.sound
        )
    }

    /// `note(`<` … `>`)` with one cycle per indented line
    fn format_pattern_with_indent(&self, pattern: &Pattern) -> String {
        let indent = self.get_indent(1);
        let mut output = vec!["note(`<".to_string()];
        for cycle in &pattern.cycles {
            output.push(format!("{}{}", indent, cycle.to_strudel()));
        }
        output.push(">`)".to_string());
        output.join("\n")
    }

    fn get_indent(&self, tabs: usize) -> String {
        " ".repeat(self.tab_size * tabs)
    }
}

fn describe_stats(stats: &DurationStats) -> String {
    format!(
        "{} (durations {}-{} ticks, mean {:.1})",
        stats.count, stats.min_ticks, stats.max_ticks, stats.mean_ticks
    )
}
