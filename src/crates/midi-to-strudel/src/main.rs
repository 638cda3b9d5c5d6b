use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use midi_to_strudel::{convert_file, ConversionOptions};
use midi_tokenizer::{MidiDocument, TokenizeOptions};

#[derive(Parser, Debug)]
#[command(name = "midi-to-strudel")]
#[command(about = "Convert MIDI files to Strudel code", long_about = None)]
struct Cli {
    /// Suppress informational messages (only errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenize a MIDI file into a JSON or text document
    Parse {
        /// Path to the MIDI file (default: first .mid file in current directory)
        midi: Option<PathBuf>,

        /// Document format
        #[arg(short, long, value_enum, default_value = "json")]
        format: DocumentFormat,

        /// Output file path (default: `<midi-name>.json` or `<midi-name>.txt`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print output to stdout instead of file
        #[arg(long)]
        stdout: bool,

        /// Leave per-track meta events out of the document
        #[arg(long)]
        no_meta: bool,
    },
    /// Convert a MIDI file, or a JSON document from `parse`, to a Strudel pattern
    Convert {
        /// Path to a .mid or .json file (default: first .mid file in current directory)
        input: Option<PathBuf>,

        /// Tempo in BPM (default: the file's first tempo)
        #[arg(long)]
        tempo: Option<f64>,

        /// Track index to convert (default: first track with notes)
        #[arg(long, conflicts_with = "all_tracks")]
        track: Option<usize>,

        /// Convert every track with notes and play them together
        #[arg(long)]
        all_tracks: bool,

        /// Grid resolution: 6, 8, 12, 16, 24 or 32 (default: 8 for 3/4 and 6/8, else 16)
        #[arg(long)]
        quantization: Option<u32>,

        /// One note per slice; longer notes win overlaps
        #[arg(long)]
        no_polyphony: bool,

        /// How many spaces to use for indentation in the output
        #[arg(short, long, default_value = "2")]
        tab_size: usize,

        /// Output file path (default: `<input-name>.strudel`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print output to stdout instead of file
        #[arg(long)]
        stdout: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum DocumentFormat {
    Json,
    Text,
}

impl DocumentFormat {
    fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Json => "json",
            DocumentFormat::Text => "txt",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // logs go to stderr so --stdout stays clean
    let level = if cli.quiet {
        tracing::Level::ERROR
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match cli.command {
        Commands::Parse {
            midi,
            format,
            output,
            stdout,
            no_meta,
        } => {
            let midi_path = resolve_input(midi)?;
            let options = TokenizeOptions {
                include_meta: !no_meta,
            };
            let doc = MidiDocument::from_file(&midi_path, &options)
                .with_context(|| format!("Failed to parse {}", midi_path.display()))?;

            let rendered = match format {
                DocumentFormat::Json => doc.to_json()?,
                DocumentFormat::Text => doc.to_text(),
            };
            let output_path = output.unwrap_or_else(|| default_output(&midi_path, format.extension()));
            emit(&rendered, &output_path, stdout)?;
        }
        Commands::Convert {
            input,
            tempo,
            track,
            all_tracks,
            quantization,
            no_polyphony,
            tab_size,
            output,
            stdout,
        } => {
            let input_path = resolve_input(input)?;
            let options = ConversionOptions {
                tempo,
                track,
                all_tracks,
                quantization,
                polyphonic: !no_polyphony,
                tab_size,
            };

            info!("Processing MIDI file: {}", input_path.display());
            let conversion = convert_file(&input_path, &options)
                .with_context(|| format!("Failed to convert {}", input_path.display()))?;

            let output_path = output.unwrap_or_else(|| default_output(&input_path, "strudel"));
            emit(&conversion.output, &output_path, stdout)?;
        }
    }

    Ok(())
}

fn resolve_input(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Input file not found: {}", path.display());
            }
            Ok(path)
        }
        None => find_first_midi_file(),
    }
}

/// `<stem>.<extension>` in the current directory.
fn default_output(input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    PathBuf::from(format!("{}.{}", stem, extension))
}

fn emit(content: &str, output_path: &Path, stdout: bool) -> Result<()> {
    if stdout {
        print!("{}", content);
        if !content.ends_with('\n') {
            println!();
        }
    } else {
        fs::write(output_path, content)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        info!("Output saved to {}", output_path.display());
    }
    Ok(())
}

fn find_first_midi_file() -> Result<PathBuf> {
    let entries = fs::read_dir(".").context("Failed to read current directory")?;

    let mut candidates = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_midi = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mid") || ext.eq_ignore_ascii_case("midi"));
        if is_midi {
            candidates.push(path);
        }
    }

    // read_dir order is platform dependent
    candidates.sort();
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("No MIDI files found in current directory"))
}
