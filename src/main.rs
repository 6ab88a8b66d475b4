use anyhow::Context;
use clap::Parser;
use sof_extractor::{
    Cli, Command, DispatchOutcome, ExtractorError, OperationKind, OutputFormatter, OutputMode,
    SofExtractor, UserFriendlyError,
};
use std::path::{Path, PathBuf};
use std::process;

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(cli.log_level) {
        eprintln!("Warning: {:#}", e);
    }

    if let Command::InitConfig { path } = &cli.command {
        return handle_init_config(path.as_deref());
    }

    let extractor = match SofExtractor::from_cli(&cli) {
        Ok(extractor) => extractor,
        Err(e) => {
            print_startup_error(&e);
            return error_exit_code(&e);
        }
    };

    match cli.command {
        Command::Extract { file } => {
            let outcome = extractor
                .run_operation(OperationKind::ExtractEvents, file)
                .await;
            outcome_exit_code(&outcome)
        }
        Command::Csv { file, .. } => {
            let outcome = extractor.run_operation(OperationKind::ExtractCsv, file).await;
            outcome_exit_code(&outcome)
        }
        Command::Session { file, .. } => match extractor.run_session(file).await {
            Ok(()) => 0,
            Err(e) => {
                extractor.output_formatter().print_user_friendly_error(&e);
                error_exit_code(&e)
            }
        },
        Command::Status => match extractor.check_service().await {
            Ok(health) if health.ok => 0,
            Ok(_) => 3,
            Err(e) => {
                extractor.output_formatter().print_user_friendly_error(&e);
                error_exit_code(&e)
            }
        },
        Command::InitConfig { .. } => 0,
    }
}

fn setup_logging(level: simplelog::LevelFilter) -> anyhow::Result<()> {
    simplelog::WriteLogger::init(level, simplelog::Config::default(), std::io::stderr())
        .with_context(|| "configuring logging")
}

fn handle_init_config(path: Option<&Path>) -> i32 {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("sof-extractor.toml"));

    if config_path.exists() {
        eprintln!(
            "Refusing to overwrite existing configuration file: {}",
            config_path.display()
        );
        return 1;
    }

    match SofExtractor::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path.display());
            println!("\nTo use this configuration:");
            println!("  sof-extractor --config {} extract <file>", config_path.display());
            println!("\nEdit [service] base_url to point at your extraction service.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn outcome_exit_code(outcome: &DispatchOutcome) -> i32 {
    match outcome {
        DispatchOutcome::Loaded { .. } | DispatchOutcome::Saved { .. } => 0,
        DispatchOutcome::Rejected => error_exit_code(&ExtractorError::NoFileSelected),
        DispatchOutcome::Failed(e) => error_exit_code(e),
        DispatchOutcome::Ignored => 1,
    }
}

fn error_exit_code(error: &ExtractorError) -> i32 {
    match error {
        ExtractorError::NoFileSelected => 2,
        ExtractorError::Server { .. } => 3,
        ExtractorError::Transport { .. } => 4,
        ExtractorError::Config { .. } => 5,
        _ => 1,
    }
}

fn print_startup_error(error: &ExtractorError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}
