use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The two operations the extraction service offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// `POST /extract`, answered with a JSON event list.
    ExtractEvents,
    /// `POST /extract/csv`, answered with an opaque CSV file.
    ExtractCsv,
}

impl OperationKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            OperationKind::ExtractEvents => "/extract",
            OperationKind::ExtractCsv => "/extract/csv",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::ExtractEvents => "Extract Events",
            OperationKind::ExtractCsv => "Download CSV",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A document the user picked for upload.
///
/// Only the path is kept; the bytes are read when the request is built so a
/// file that disappears in between surfaces as a transport failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    path: PathBuf,
}

impl SelectedFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name sent in the multipart `filename` attribute.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }
}

/// One user action: which operation to run on which document.
#[derive(Debug, Clone)]
pub struct OperationRequest {
    pub kind: OperationKind,
    pub file: SelectedFile,
}

/// One event detected by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionEvent {
    pub event: String,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    pub source: String,
}

/// Body of a successful `/extract` response. Both fields may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExtractionResponse {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub events: Option<Vec<ExtractionEvent>>,
}

impl ExtractionResponse {
    /// Reported count, else the number of events, else zero.
    pub fn resolved_count(&self) -> u64 {
        self.count
            .or_else(|| self.events.as_ref().map(|e| e.len() as u64))
            .unwrap_or(0)
    }

    pub fn into_parts(self) -> (Vec<ExtractionEvent>, u64) {
        let count = self.resolved_count();
        (self.events.unwrap_or_default(), count)
    }
}

/// Body of `GET /` on the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceHealth {
    pub ok: bool,
    #[serde(default)]
    pub message: String,
}
