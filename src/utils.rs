use clap::ValueEnum;
use encoding_rs::Encoding;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration required to run one extraction.
/// This decouples the logic from how the arguments were parsed (CLI/Config file).
#[derive(Clone, Debug)]
pub struct ExportConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    /// Tried before the built-in encoding chain.
    pub encoding: Option<&'static Encoding>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Txt,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Txt => "txt",
            OutputFormat::Csv => "csv",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OutputFormat::Json => "JSON",
            OutputFormat::Txt => "Text",
            OutputFormat::Csv => "CSV",
        }
    }
}

/// The input path with its extension swapped for the format's, placed in
/// `output_dir` when one is given.
pub fn default_output_path(
    input: &Path,
    format: OutputFormat,
    output_dir: Option<&Path>,
) -> PathBuf {
    let renamed = input.with_extension(format.extension());
    match (output_dir, renamed.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => renamed,
    }
}
