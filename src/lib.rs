//! # extract-chat
//!
//! A CLI tool that pulls a labeled conversation out of a saved
//! [Qwen Chat](https://chat.qwen.ai) HTML page and writes it as JSON, plain
//! text, or CSV.
//!
//! ## What it does
//!
//! A saved chat page is one large HTML document. Every turn sits in a
//! container whose class list holds `qwen-chat-message-user` or
//! `qwen-chat-message-assistant`. This tool reads the page (trying a few
//! encodings before settling for a lossy decode), finds those containers in
//! document order, and flattens each turn's rendered Markdown back into
//! Markdown-ish text. Assistant turns also keep the reply time and the model
//! name shown in their header.
//!
//! The input file is only read. Nothing is fetched over the network.
//!
//! ## Usage
//!
//! ```sh
//! # chat.html -> chat.json
//! extract_chat chat.html
//!
//! # Plain text transcript at a chosen path
//! extract_chat chat.html -f txt -o transcript.txt
//!
//! # A page saved by a browser that did not record its charset
//! extract_chat old-chat.html --encoding shift_jis -f csv
//! ```
//!
//! Defaults can be persisted in `~/.config/extract-chat/config.toml`.
//!
//! ## Compatibility
//!
//! Tracks the class names used by the Qwen Chat web client. If the client
//! renames them, extraction finds no messages and the tool exits with status 1.

pub mod exporter;
pub mod extractor;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod utils;

pub use extractor::{Conversation, Message, Role};
pub use pipeline::{RunOutcome, execute, extract_conversation};
pub use utils::{ExportConfig, OutputFormat};
