use clap::Parser;
use extract_chat::loader::encoding_for_label;
use extract_chat::utils::{self, ExportConfig, OutputFormat};
use extract_chat::{RunOutcome, pipeline};
use eyre::{Context, Result, eyre};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Extract and label the conversation in a saved Qwen Chat HTML page.
#[derive(Parser)]
#[command(name = "extract_chat", author, version, about, long_about = None)]
struct Cli {
    /// Path to the HTML file containing the chat session.
    #[arg(value_name = "INPUT_FILE")]
    input_file: PathBuf,

    /// Output file path.
    /// Defaults to INPUT_FILE with the format's extension.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Output format. Defaults to json if not set in config.
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Encoding label (e.g. "shift_jis") to try before the built-in chain.
    #[arg(long, value_name = "LABEL")]
    encoding: Option<String>,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/extract-chat/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log each step, including skipped containers.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors and skip the summary.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    format: Option<OutputFormat>,
    output_dir: Option<PathBuf>,
    encoding: Option<String>,
}

fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        dirs::config_dir()
            .map(|d| d.join("extract-chat/config.toml"))
            .filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    // 1. Load config file (CLI path > default path)
    let file_cfg = load_file_config(cli.config.as_deref())?;

    if !cli.input_file.exists() {
        return Err(eyre!(
            "Input file not found: {}",
            cli.input_file.display()
        ));
    }

    // 2. Resolve format (CLI > Config > json)
    let format = cli.format.or(file_cfg.format).unwrap_or_default();

    // 3. Resolve output (CLI > Config output_dir > next to input)
    let output = cli.output.unwrap_or_else(|| {
        utils::default_output_path(&cli.input_file, format, file_cfg.output_dir.as_deref())
    });

    // 4. Resolve encoding (CLI > Config)
    let encoding = cli
        .encoding
        .or(file_cfg.encoding)
        .map(|label| encoding_for_label(&label))
        .transpose()?;

    let config = ExportConfig {
        input: cli.input_file,
        output,
        format,
        encoding,
    };

    match pipeline::execute(&config)? {
        RunOutcome::NoMessages => {
            warn!("No conversation messages found in the HTML file");
            Ok(ExitCode::FAILURE)
        }
        RunOutcome::Written(conversation) => {
            if !cli.quiet {
                println!();
                println!("Summary:");
                println!("  Output: {} ({})", config.output.display(), format.label());
                println!("  Total messages: {}", conversation.len());
                println!("  User messages: {}", conversation.user_count());
                println!("  Assistant messages: {}", conversation.assistant_count());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
