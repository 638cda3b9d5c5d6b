//! Abstract Syntax Tree (AST) types for Strudel patterns
//!
//! A [`Pattern`] is a sequence of [`Cycle`]s (one per measure), each a
//! sequence of [`Slice`]s. Every slice spans a whole number of grid slots, so
//! a well-formed cycle always adds up to the grid's slices per measure.

use serde::{Deserialize, Serialize};

/// One pitch with its span in grid slots (e.g. "c4@4").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteToken {
    pub name: String,
    pub span: usize,
}

impl NoteToken {
    pub fn new(name: impl Into<String>, span: usize) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    pub fn to_strudel(&self) -> String {
        if self.span > 1 {
            format!("{}@{}", self.name, self.span)
        } else {
            self.name.clone()
        }
    }
}

/// A single pattern element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slice {
    /// Silence over `n` slots (~ or ~@n)
    Rest(usize),

    /// Single note (e.g. "a4@2")
    Note(NoteToken),

    /// Simultaneous notes, each with its own span (e.g. [a4@4,c5@2])
    Chord(Vec<NoteToken>),
}

impl Slice {
    /// A note for one member, a chord for several.
    pub fn group(mut tokens: Vec<NoteToken>) -> Self {
        if tokens.len() == 1 {
            Slice::Note(tokens.remove(0))
        } else {
            Slice::Chord(tokens)
        }
    }

    /// Convert to Strudel mini notation string
    pub fn to_strudel(&self) -> String {
        match self {
            Slice::Rest(1) => "~".to_string(),
            Slice::Rest(n) => format!("~@{}", n),
            Slice::Note(token) => token.to_strudel(),
            Slice::Chord(tokens) => {
                let inner: Vec<String> = tokens.iter().map(|t| t.to_strudel()).collect();
                format!("[{}]", inner.join(","))
            }
        }
    }

    /// Grid slots this element occupies; a chord lasts as long as its longest member.
    pub fn slot_count(&self) -> usize {
        match self {
            Slice::Rest(n) => *n,
            Slice::Note(token) => token.span,
            Slice::Chord(tokens) => tokens.iter().map(|t| t.span).max().unwrap_or(0),
        }
    }
}

/// One measure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub slices: Vec<Slice>,
}

impl Cycle {
    pub fn new(slices: Vec<Slice>) -> Self {
        Self { slices }
    }

    /// A measure with nothing in it, as a single rest token.
    pub fn rest(slots: usize) -> Self {
        Self {
            slices: vec![Slice::Rest(slots)],
        }
    }

    pub fn to_strudel(&self) -> String {
        let inner: Vec<String> = self.slices.iter().map(|s| s.to_strudel()).collect();
        format!("[{}]", inner.join(" "))
    }

    pub fn slot_count(&self) -> usize {
        self.slices.iter().map(Slice::slot_count).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub cycles: Vec<Cycle>,
}

impl Pattern {
    pub fn new(cycles: Vec<Cycle>) -> Self {
        Self { cycles }
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Space-joined cycles; the empty pattern renders as the empty string.
    pub fn to_strudel(&self) -> String {
        self.cycles
            .iter()
            .map(Cycle::to_strudel)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Validate pattern structure
    pub fn validate(&self, slices_per_measure: usize) -> Result<(), String> {
        for (i, cycle) in self.cycles.iter().enumerate() {
            for slice in &cycle.slices {
                match slice {
                    Slice::Chord(tokens) if tokens.is_empty() => {
                        return Err(format!("Empty chord in cycle {}", i));
                    }
                    Slice::Rest(0) => {
                        return Err(format!("Zero-length rest in cycle {}", i));
                    }
                    _ => {}
                }
                let tokens: &[NoteToken] = match slice {
                    Slice::Note(token) => std::slice::from_ref(token),
                    Slice::Chord(tokens) => tokens,
                    Slice::Rest(_) => &[],
                };
                for token in tokens {
                    if token.name.is_empty() {
                        return Err(format!("Empty note in cycle {}", i));
                    }
                    if token.span == 0 {
                        return Err(format!("Zero-length note {} in cycle {}", token.name, i));
                    }
                }
            }

            let slots = cycle.slot_count();
            if slots != slices_per_measure {
                return Err(format!(
                    "Cycle {} spans {} slots, expected {}",
                    i, slots, slices_per_measure
                ));
            }
        }
        Ok(())
    }

    /// Every note span in the pattern, for duration checks.
    pub fn note_spans(&self) -> impl Iterator<Item = usize> + '_ {
        self.cycles.iter().flat_map(|c| &c.slices).flat_map(|slice| {
            let spans: Vec<usize> = match slice {
                Slice::Rest(_) => vec![],
                Slice::Note(token) => vec![token.span],
                Slice::Chord(tokens) => tokens.iter().map(|t| t.span).collect(),
            };
            spans
        })
    }
}
