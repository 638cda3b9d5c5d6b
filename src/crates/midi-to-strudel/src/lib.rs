//! MIDI to Strudel converter library
//!
//! This library quantizes tokenized MIDI tracks onto a fixed grid and renders them
//! as Strudel pattern code.

pub mod ast;
pub mod convert;
pub mod error;
pub mod grid;
pub mod instruments;
pub mod quantize;
pub mod template;

// Re-export main types for convenience
pub use ast::{Cycle, NoteToken, Pattern, Slice};
pub use convert::{convert_document, convert_file, load_document, Conversion, ConversionOptions};
pub use error::{ConvertError, Result};
pub use grid::Grid;
pub use quantize::{quantize, quantize_monophonic, quantize_polyphonic};
pub use template::OutputFormatter;
