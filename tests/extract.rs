use extract_chat::{ExportConfig, Message, OutputFormat, Role, RunOutcome, execute};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const EXPORT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Qwen Chat</title></head>
<body>
  <div class="chat-container">
    <div id="msg-1" class="qwen-chat-message qwen-chat-message-user">
      <div class="chat-user-message">
        <div class="user-message-content">Hello</div>
      </div>
    </div>
    <div id="msg-2" class="qwen-chat-message qwen-chat-message-assistant">
      <div class="response-message-head">
        <span class="response-message-head-model">X</span>
        <span class="response-message-head-time">10:00</span>
      </div>
      <div class="response-message-content"><p>Hi there</p></div>
    </div>
    <div id="msg-3" class="qwen-chat-message qwen-chat-message-user">
      <div class="user-message-footer">edited</div>
    </div>
  </div>
</body>
</html>
"#;

fn write_input(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn config(input: &Path, format: OutputFormat) -> ExportConfig {
    ExportConfig {
        input: input.to_path_buf(),
        output: input.with_extension(format.extension()),
        format,
        encoding: None,
    }
}

#[test]
fn json_output_matches_the_extracted_messages() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "chat.html", EXPORT.as_bytes());
    let cfg = config(&input, OutputFormat::Json);

    let RunOutcome::Written(conversation) = execute(&cfg).unwrap() else {
        panic!("expected messages to be written");
    };
    assert_eq!(conversation.len(), 2);

    let json = fs::read_to_string(dir.path().join("chat.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        value,
        serde_json::json!([
            {"role": "user", "content": "Hello", "message_id": "msg-1", "timestamp": null},
            {"role": "assistant", "content": "Hi there", "message_id": "msg-2", "timestamp": "10:00", "model": "X"}
        ])
    );

    let parsed: Vec<Message> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, conversation.messages);
    assert_eq!(parsed[0].role, Role::User);
}

#[test]
fn txt_output_has_one_block_per_message() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "chat.html", EXPORT.as_bytes());
    execute(&config(&input, OutputFormat::Txt)).unwrap();

    let text = fs::read_to_string(dir.path().join("chat.txt")).unwrap();
    assert!(text.contains("Message 1: USER\n"));
    assert!(text.contains("Message 2: ASSISTANT [10:00] (X)\n"));
    assert_eq!(text.matches(&"=".repeat(80)).count(), 4);
}

#[test]
fn csv_output_has_header_and_rows() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "chat.html", EXPORT.as_bytes());
    execute(&config(&input, OutputFormat::Csv)).unwrap();

    let csv = fs::read_to_string(dir.path().join("chat.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        [
            "message_number,role,timestamp,model,content",
            "1,user,,,Hello",
            "2,assistant,10:00,X,Hi there",
        ]
    );
}

#[test]
fn explicit_output_path_is_used() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "chat.html", EXPORT.as_bytes());
    let output = dir.path().join("nested-name.out");
    let cfg = ExportConfig {
        output: output.clone(),
        ..config(&input, OutputFormat::Json)
    };

    execute(&cfg).unwrap();
    assert!(output.exists());
    assert!(!dir.path().join("chat.json").exists());
}

#[test]
fn no_containers_means_no_output_file() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "empty.html", b"<html><body><p>nothing</p></body></html>");
    let cfg = config(&input, OutputFormat::Json);

    assert!(matches!(execute(&cfg).unwrap(), RunOutcome::NoMessages));
    assert!(!cfg.output.exists());
}

#[test]
fn stray_byte_in_utf8_export_keeps_the_text() {
    let dir = TempDir::new().unwrap();
    let mut bytes = EXPORT.replace("Hello", "你好 _世界").into_bytes();
    // Swap the placeholder for a byte that is never valid UTF-8.
    let pos = bytes.iter().position(|&b| b == b'_').unwrap();
    bytes[pos] = 0xFF;
    let input = write_input(&dir, "garbled.html", &bytes);

    let RunOutcome::Written(conversation) = execute(&config(&input, OutputFormat::Json)).unwrap()
    else {
        panic!("expected messages to be written");
    };
    assert_eq!(conversation.len(), 2);
    assert_eq!(conversation.messages[0].content, "你好 世界");

    let json = fs::read_to_string(dir.path().join("garbled.json")).unwrap();
    assert!(json.contains("你好 世界"));
}

#[test]
fn legacy_single_byte_export_still_produces_output() {
    let dir = TempDir::new().unwrap();
    let source = EXPORT.replace("Hello", "“Café” – naïve");
    let (encoded, _, _) = encoding_rs::WINDOWS_1252.encode(&source);
    let input = write_input(&dir, "legacy.html", &encoded);

    let RunOutcome::Written(conversation) = execute(&config(&input, OutputFormat::Json)).unwrap()
    else {
        panic!("expected messages to be written");
    };
    assert_eq!(conversation.messages[0].content, "“Café” – naïve");
}

#[test]
fn preferred_encoding_is_honoured() {
    let dir = TempDir::new().unwrap();
    let source = EXPORT.replace("Hello", "こんにちは");
    let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode(&source);
    let input = write_input(&dir, "sjis.html", &encoded);
    let cfg = ExportConfig {
        encoding: Some(encoding_rs::SHIFT_JIS),
        ..config(&input, OutputFormat::Json)
    };

    let RunOutcome::Written(conversation) = execute(&cfg).unwrap() else {
        panic!("expected messages to be written");
    };
    assert_eq!(conversation.messages[0].content, "こんにちは");
}

#[test]
fn missing_input_is_an_error() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir.path().join("absent.html"), OutputFormat::Json);
    assert!(execute(&cfg).is_err());
}
