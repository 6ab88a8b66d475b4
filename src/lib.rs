pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod download;
pub mod error;
pub mod guard;
pub mod model;
pub mod presenter;
pub mod service;
pub mod state;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, Command, OutputFormat};
pub use config::{CliOverrides, Config};
pub use error::{ExtractorError, Result, UserFriendlyError};

// Core functionality re-exports
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use download::{DownloadDirectory, FileSaver, CSV_FILE_NAME};
pub use guard::{FileSelection, GuardOutcome, InputGuard};
pub use model::{ExtractionEvent, ExtractionResponse, OperationKind, SelectedFile};
pub use presenter::View;
pub use service::{ExtractionService, HttpExtractionClient, ServiceResponse};
pub use state::ResultState;
pub use ui::{OutputFormatter, OutputMode, ProgressManager};

use model::ServiceHealth;
use std::path::{Path, PathBuf};

/// Dispatcher wired to the real service and the download directory.
pub type HttpDispatcher = Dispatcher<HttpExtractionClient, DownloadDirectory>;

/// Main library interface: one session against the extraction service.
pub struct SofExtractor {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    dispatcher: HttpDispatcher,
}

impl SofExtractor {
    /// Create a new instance with the provided configuration
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        let client = HttpExtractionClient::from_config(&config)?;
        let saver = DownloadDirectory::new(config.output.download_directory.clone());
        let guard = InputGuard::new(&config.input.accepted_extensions);
        let dispatcher = Dispatcher::new(client, saver, guard);

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            dispatcher,
        })
    }

    /// Create an instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbose, cli_args.quiet)
    }

    /// One-shot operation: select `file` (or nothing) and dispatch `kind`.
    pub async fn run_operation(&self, kind: OperationKind, file: Option<PathBuf>) -> DispatchOutcome {
        match file {
            Some(path) => self.dispatcher.select_file(path),
            None => self.dispatcher.clear_selection(),
        }
        self.run_selected(kind).await
    }

    /// Dispatches `kind` on the current selection and reports the result.
    pub async fn run_selected(&self, kind: OperationKind) -> DispatchOutcome {
        if let Some(file) = self.dispatcher.selection().file() {
            self.output_formatter.start_operation(&format!(
                "{}: uploading {} to {}",
                kind,
                file.file_name(),
                self.config.base_url()
            ));
        }

        let busy_message = match kind {
            OperationKind::ExtractEvents => "Extracting...",
            OperationKind::ExtractCsv => "Preparing CSV...",
        };
        let outcome = self
            .progress_manager
            .track_busy(
                self.dispatcher.subscribe(),
                busy_message,
                self.dispatcher.dispatch(kind),
            )
            .await;

        self.report(&outcome);
        outcome
    }

    /// Saves get a one-line confirmation; everything else re-renders the
    /// shared result display.
    fn report(&self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Ignored => {
                self.output_formatter
                    .warning("Another operation is still running; request ignored");
            }
            DispatchOutcome::Saved { path } => self.output_formatter.print_saved(path),
            DispatchOutcome::Loaded { .. } => self.render_current(),
            DispatchOutcome::Rejected => {
                self.render_current();
                self.suggest(&ExtractorError::NoFileSelected);
            }
            DispatchOutcome::Failed(error) => {
                self.render_current();
                self.suggest(error);
            }
        }
    }

    fn suggest(&self, error: &ExtractorError) {
        if let Some(suggestion) = error.suggestion() {
            self.output_formatter.info(&format!("Suggestion: {}", suggestion));
        }
    }

    /// Renders the current result state.
    pub fn render_current(&self) {
        let view = View::project(&self.dispatcher.snapshot());
        self.output_formatter.print_view(&view);
    }

    /// Check that the extraction service answers on `GET /`.
    pub async fn check_service(&self) -> Result<ServiceHealth> {
        let health = self.dispatcher.service().health().await?;
        self.output_formatter
            .print_health(self.config.base_url(), &health);
        Ok(health)
    }

    /// Run an interactive session reading commands from stdin.
    pub async fn run_session(&self, file: Option<PathBuf>) -> Result<()> {
        if let Some(path) = file {
            self.dispatcher.select_file(path);
        }
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        ui::session::run(self, stdin).await
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn progress_manager(&self) -> &ProgressManager {
        &self.progress_manager
    }

    pub fn dispatcher(&self) -> &HttpDispatcher {
        &self.dispatcher
    }
}
