use super::{ExtractionService, ServiceResponse};
use crate::config::Config;
use crate::error::{ExtractorError, Result};
use crate::model::{OperationRequest, SelectedFile, ServiceHealth};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

/// Multipart field the service reads the document from.
const FILE_FIELD: &str = "file";

/// `reqwest`-backed client for the extraction service.
pub struct HttpExtractionClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpExtractionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sof-extractor/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.base_url(), config.timeout_duration())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /` on the service.
    pub async fn health(&self) -> Result<ServiceHealth> {
        let response = self.client.get(self.url("/")).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractorError::Server {
                status: status.as_u16(),
            });
        }
        Ok(response.json::<ServiceHealth>().await?)
    }

    async fn file_part(file: &SelectedFile) -> Result<Part> {
        let bytes = tokio::fs::read(file.path()).await.map_err(|e| {
            ExtractorError::transport(format!("could not read {}: {}", file.path().display(), e))
        })?;

        let part = Part::bytes(bytes)
            .file_name(file.file_name())
            .mime_str(content_type(file))?;
        Ok(part)
    }
}

#[async_trait]
impl ExtractionService for HttpExtractionClient {
    async fn submit(&self, request: &OperationRequest) -> Result<ServiceResponse> {
        let url = self.url(request.kind.endpoint());
        let form = Form::new().part(FILE_FIELD, Self::file_part(&request.file).await?);

        log::info!("POST {} ({})", url, request.file.file_name());
        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();
        log::debug!("{} answered {}", url, status);

        if !status.is_success() {
            return Ok(ServiceResponse::new(status.as_u16(), Vec::new()));
        }

        let body = response.bytes().await?;
        Ok(ServiceResponse::new(status.as_u16(), body.to_vec()))
    }
}

fn content_type(file: &SelectedFile) -> &'static str {
    match file.extension().as_deref() {
        Some("pdf") => "application/pdf",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => "application/octet-stream",
    }
}
