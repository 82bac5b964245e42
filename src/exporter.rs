use crate::extractor::Message;
use serde::Serialize;
use std::io::{self, Write};

const RULE_WIDTH: usize = 80;

pub fn write_json<W: Write>(writer: &mut W, messages: &[Message]) -> io::Result<()> {
    // serde_json's pretty printer indents with two spaces and leaves
    // non-ASCII text unescaped.
    serde_json::to_writer_pretty(&mut *writer, messages).map_err(io::Error::other)?;
    writeln!(writer)
}

/// One block per message, each opened by a rule, a header line and another rule.
pub fn write_txt<W: Write>(writer: &mut W, messages: &[Message]) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);
    for (i, msg) in messages.iter().enumerate() {
        writeln!(writer)?;
        writeln!(writer, "{}", rule)?;
        write!(writer, "Message {}: {}", i + 1, msg.role.as_str().to_uppercase())?;
        if let Some(ts) = msg.timestamp.as_deref().filter(|s| !s.is_empty()) {
            write!(writer, " [{}]", ts)?;
        }
        if let Some(model) = msg.model.as_deref().filter(|s| !s.is_empty()) {
            write!(writer, " ({})", model)?;
        }
        writeln!(writer)?;
        writeln!(writer, "{}", rule)?;
        writeln!(writer, "{}", msg.content)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct CsvRow<'a> {
    message_number: usize,
    role: &'a str,
    timestamp: &'a str,
    model: &'a str,
    content: &'a str,
}

pub fn write_csv<W: Write>(writer: &mut W, messages: &[Message]) -> io::Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);
    for (i, msg) in messages.iter().enumerate() {
        csv_writer
            .serialize(CsvRow {
                message_number: i + 1,
                role: msg.role.as_str(),
                timestamp: msg.timestamp.as_deref().unwrap_or_default(),
                model: msg.model.as_deref().unwrap_or_default(),
                content: &msg.content,
            })
            .map_err(io::Error::other)?;
    }
    if messages.is_empty() {
        csv_writer
            .write_record(["message_number", "role", "timestamp", "model", "content"])
            .map_err(io::Error::other)?;
    }
    csv_writer.flush()
}
