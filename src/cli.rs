use crate::config::{CliOverrides, Config};
use crate::error::Result;
use clap::{Parser, Subcommand, ValueEnum};
use simplelog::LevelFilter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sof-extractor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract port-call events from Statement of Facts documents")]
#[command(
    long_about = "sof-extractor uploads a PDF or DOCX Statement of Facts to the SoF extraction \
                  service and shows the detected events, or downloads them as events.csv."
)]
#[command(after_help = "EXAMPLES:\n  \
    sof-extractor extract voyage-12.pdf\n  \
    sof-extractor csv voyage-12.docx --output-dir ~/Downloads\n  \
    sof-extractor --output-format json extract voyage-12.pdf\n  \
    sof-extractor session\n  \
    sof-extractor --config team.toml status")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file path
    #[arg(short, long, global = true, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Request timeout in seconds
    #[arg(long, global = true, help = "Timeout for requests to the extraction service (seconds)")]
    pub timeout: Option<u64>,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Logging level written to stderr
    #[arg(long, global = true, default_value = "Warn")]
    pub log_level: LevelFilter,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Upload a document and list the detected events
    Extract {
        /// PDF or DOCX document to upload
        file: Option<PathBuf>,
    },

    /// Upload a document and save the events as a CSV file
    Csv {
        /// PDF or DOCX document to upload
        file: Option<PathBuf>,

        /// Directory the CSV file is saved into
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Interactive session keeping results between operations
    Session {
        /// Document to preselect
        file: Option<PathBuf>,

        /// Directory CSV downloads are saved into
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Check that the extraction service is reachable
    Status,

    /// Write a sample configuration file
    InitConfig {
        /// Where to write it (defaults to sof-extractor.toml)
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        let output_dir = match &self.command {
            Command::Csv { output_dir, .. } | Command::Session { output_dir, .. } => {
                output_dir.clone()
            }
            _ => None,
        };

        CliOverrides::new()
            .with_output_dir(output_dir)
            .with_timeout(self.timeout)
    }
}
