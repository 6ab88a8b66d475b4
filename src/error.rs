use thiserror::Error;

/// Message shown when an operation is triggered without a chosen document.
pub const NO_FILE_SELECTED: &str = "Choose a PDF or DOCX first.";

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("Choose a PDF or DOCX first.")]
    NoFileSelected,

    #[error("Server {status}")]
    Server { status: u16 },

    #[error("{message}")]
    Transport { message: String },

    #[error("Failed to save {path}: {source}")]
    Save {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ExtractorError {
    pub fn transport<S: Into<String>>(message: S) -> Self {
        ExtractorError::Transport {
            message: message.into(),
        }
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for ExtractorError {
    fn user_message(&self) -> String {
        match self {
            ExtractorError::NoFileSelected => NO_FILE_SELECTED.to_string(),
            ExtractorError::Server { status } => {
                format!("Extraction service answered with Server {}", status)
            }
            ExtractorError::Transport { message } => {
                format!("Could not complete the request: {}", message)
            }
            ExtractorError::Save { path, source } => {
                format!("Could not save {}: {}", path, source)
            }
            ExtractorError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            ExtractorError::NoFileSelected => Some(
                "Pass the path of a .pdf or .docx document, or use `open <path>` in a session.".to_string()
            ),
            ExtractorError::Server { status } if *status == 400 => Some(
                "The service only accepts .pdf and .docx uploads.".to_string()
            ),
            ExtractorError::Server { .. } => Some(
                "The extraction service rejected the document. Check the service logs for details.".to_string()
            ),
            ExtractorError::Transport { .. } => Some(
                "Make sure the extraction service is running and reachable at the configured base_url (try `sof-extractor status`).".to_string()
            ),
            ExtractorError::Save { .. } => Some(
                "Ensure the download directory exists and is writable, or choose another one with --output-dir.".to_string()
            ),
            ExtractorError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ExtractorError {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            format!("request timed out: {}", error)
        } else if error.is_connect() {
            format!("connection failed: {}", error)
        } else if error.is_decode() {
            format!("unreadable response: {}", error)
        } else {
            error.to_string()
        };
        ExtractorError::Transport { message }
    }
}

impl From<serde_json::Error> for ExtractorError {
    fn from(error: serde_json::Error) -> Self {
        ExtractorError::Transport {
            message: format!("malformed response: {}", error),
        }
    }
}

impl From<toml::de::Error> for ExtractorError {
    fn from(error: toml::de::Error) -> Self {
        ExtractorError::Config {
            message: error.to_string(),
        }
    }
}

impl From<url::ParseError> for ExtractorError {
    fn from(error: url::ParseError) -> Self {
        ExtractorError::Config {
            message: format!("invalid service URL: {}", error),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractorError>;
