use crate::exporter;
use crate::extractor::{self, Conversation};
use crate::loader;
use crate::utils::{ExportConfig, OutputFormat};
use encoding_rs::Encoding;
use eyre::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

pub enum RunOutcome {
    /// The conversation was written to the configured output.
    Written(Conversation),
    /// Nothing matched; no output file was created.
    NoMessages,
}

/// Read, decode and parse an export file into its conversation.
pub fn extract_conversation(
    input: &Path,
    encoding: Option<&'static Encoding>,
) -> Result<Conversation> {
    info!("Reading HTML file: {}", input.display());
    let decoded = loader::read_html(input, encoding)?;
    if decoded.lossy {
        warn!(
            "{} is not valid UTF-8; dropped the invalid bytes",
            input.display()
        );
    } else {
        info!("Successfully read file with {} encoding", decoded.encoding);
    }

    info!("Parsing HTML...");
    Ok(extractor::parse_conversation(&decoded.text))
}

/// The main entry point for the business logic.
pub fn execute(config: &ExportConfig) -> Result<RunOutcome> {
    let conversation = extract_conversation(&config.input, config.encoding)?;
    if conversation.is_empty() {
        return Ok(RunOutcome::NoMessages);
    }

    save_conversation(&conversation, &config.output, config.format)?;
    info!(
        "Saved conversation to {} ({} format)",
        config.output.display(),
        config.format.label()
    );
    Ok(RunOutcome::Written(conversation))
}

pub fn save_conversation(
    conversation: &Conversation,
    output: &Path,
    format: OutputFormat,
) -> Result<()> {
    let file = File::create(output)
        .wrap_err_with(|| format!("Failed to create: {}", output.display()))?;
    let mut writer = BufWriter::new(file);

    let messages = conversation.messages.as_slice();
    match format {
        OutputFormat::Json => exporter::write_json(&mut writer, messages),
        OutputFormat::Txt => exporter::write_txt(&mut writer, messages),
        OutputFormat::Csv => exporter::write_csv(&mut writer, messages),
    }
    .wrap_err_with(|| format!("Failed to write {} output", format.label()))?;

    writer
        .flush()
        .wrap_err_with(|| format!("Failed to flush: {}", output.display()))
}
