use crate::error::{ExtractorError, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Name every CSV download is saved under.
pub const CSV_FILE_NAME: &str = "events.csv";

/// Client-side "save as" for binary responses.
pub trait FileSaver: Send + Sync {
    /// Stores `contents` under `file_name` and returns where it landed.
    fn save(&self, file_name: &str, contents: &[u8]) -> Result<PathBuf>;
}

/// Saves into a fixed directory, replacing any previous file of the same name.
///
/// Contents are staged in a temporary file next to the target and renamed
/// into place, so a failed write never leaves a truncated CSV behind.
#[derive(Debug, Clone)]
pub struct DownloadDirectory {
    directory: PathBuf,
}

impl DownloadDirectory {
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl FileSaver for DownloadDirectory {
    fn save(&self, file_name: &str, contents: &[u8]) -> Result<PathBuf> {
        let target = self.directory.join(file_name);
        let save_error = |source: std::io::Error| ExtractorError::Save {
            path: target.display().to_string(),
            source,
        };

        fs::create_dir_all(&self.directory).map_err(save_error)?;

        let mut staged = NamedTempFile::new_in(&self.directory).map_err(save_error)?;
        staged.write_all(contents).map_err(save_error)?;
        staged.flush().map_err(save_error)?;
        staged
            .persist(&target)
            .map_err(|e| save_error(e.error))?;

        log::info!("saved {} bytes to {}", contents.len(), target.display());
        Ok(target)
    }
}
