use crate::error::NO_FILE_SELECTED;
use crate::model::SelectedFile;
use std::path::PathBuf;

/// Current contents of the file input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    file: Option<SelectedFile>,
}

impl FileSelection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn select<P: Into<PathBuf>>(&mut self, path: P) {
        self.file = Some(SelectedFile::new(path));
    }

    pub fn clear(&mut self) {
        self.file = None;
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Ready(SelectedFile),
    Rejected(&'static str),
}

/// Checks that a document is selected before anything touches the network.
#[derive(Debug, Clone)]
pub struct InputGuard {
    accepted_extensions: Vec<String>,
}

impl InputGuard {
    pub fn new(accepted_extensions: &[String]) -> Self {
        Self {
            accepted_extensions: accepted_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn check(&self, selection: &FileSelection) -> GuardOutcome {
        match selection.file() {
            Some(file) => GuardOutcome::Ready(file.clone()),
            None => GuardOutcome::Rejected(NO_FILE_SELECTED),
        }
    }

    /// Advisory type filter. The service validates the real content, so a
    /// mismatch is only worth a warning.
    pub fn is_advisory_match(&self, file: &SelectedFile) -> bool {
        file.extension()
            .is_some_and(|ext| self.accepted_extensions.contains(&ext))
    }
}

impl Default for InputGuard {
    fn default() -> Self {
        Self::new(&["pdf".to_string(), "docx".to_string()])
    }
}
