use crate::error::Result;
use crate::model::OperationKind;
use crate::SofExtractor;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const HELP: &str = "\
Commands:
  open <path>   choose the PDF or DOCX document to upload
  clear         forget the chosen document
  extract       upload and list the detected events
  csv           upload and save the events as a CSV file
  show          show the current results again
  help          show this help
  quit          leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Open(PathBuf),
    Clear,
    Run(OperationKind),
    Show,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_command(line: &str) -> SessionCommand {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map(|(w, r)| (w, r.trim()))
        .unwrap_or((line, ""));

    match word.to_lowercase().as_str() {
        "" => SessionCommand::Empty,
        "open" | "file" if !rest.is_empty() => SessionCommand::Open(PathBuf::from(rest)),
        "clear" => SessionCommand::Clear,
        "extract" => SessionCommand::Run(OperationKind::ExtractEvents),
        "csv" | "download" => SessionCommand::Run(OperationKind::ExtractCsv),
        "show" => SessionCommand::Show,
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" => SessionCommand::Quit,
        _ => SessionCommand::Unknown(line.to_string()),
    }
}

/// Reads commands from `input` until `quit` or end of input.
pub async fn run<R>(extractor: &SofExtractor, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let formatter = extractor.output_formatter();
    let interactive = extractor.progress_manager().is_enabled();

    if interactive {
        println!("SoF Event Extractor session. Type `help` for commands.");
    }

    let mut lines = input.lines();
    loop {
        if interactive {
            print!("sof> ");
            std::io::stdout().flush()?;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_command(&line) {
            SessionCommand::Open(path) => {
                if !path.is_file() {
                    formatter.warning(&format!("{} does not exist yet", path.display()));
                }
                formatter.info(&format!("Selected {}", path.display()));
                extractor.dispatcher().select_file(path);
            }
            SessionCommand::Clear => {
                extractor.dispatcher().clear_selection();
                formatter.info("Selection cleared");
            }
            SessionCommand::Run(kind) => {
                extractor.run_selected(kind).await;
            }
            SessionCommand::Show => extractor.render_current(),
            SessionCommand::Help => println!("{}", HELP),
            SessionCommand::Quit => break,
            SessionCommand::Empty => {}
            SessionCommand::Unknown(command) => {
                formatter.warning(&format!("Unknown command '{}'. Type `help`.", command));
            }
        }
    }

    log::debug!("session ended");
    Ok(())
}
