use crate::error::{ExtractorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub output: OutputConfig,
    pub input: InputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub download_directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    pub accepted_extensions: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout: 120, // PDF parsing on the service side can be slow
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            download_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            accepted_extensions: vec!["pdf".to_string(), "docx".to_string()],
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ExtractorError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ExtractorError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ExtractorError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["sof-extractor.toml", ".sof-extractor.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref output_dir) = cli_args.output_dir {
            self.output.download_directory = output_dir.clone();
        }

        if let Some(timeout) = cli_args.timeout {
            self.service.timeout = timeout;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.service.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ExtractorError::Config {
                message: format!(
                    "Service URL must use http or https, got '{}'",
                    url.scheme()
                ),
            });
        }

        if self.service.timeout == 0 {
            return Err(ExtractorError::Config {
                message: "Service timeout must be greater than 0".to_string(),
            });
        }

        if self.input.accepted_extensions.is_empty() {
            return Err(ExtractorError::Config {
                message: "At least one accepted file extension must be specified".to_string(),
            });
        }

        Ok(())
    }

    /// Base URL without a trailing slash, ready for endpoint paths.
    pub fn base_url(&self) -> &str {
        self.service.base_url.trim_end_matches('/')
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.service.timeout)
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub output_dir: Option<PathBuf>,
    pub timeout: Option<u64>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<u64>) -> Self {
        self.timeout = timeout;
        self
    }
}
