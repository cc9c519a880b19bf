//! Client side of the external backend: website generation and the document
//! store used by the RAG chat front-end.
//!
//! Nothing in the workspace talks HTTP directly. Handlers go through the
//! [`Backend`] trait so the generation step stays a pure external dependency.

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;

use crate::config::Config;
use crate::errors::{ConsoleError, ConsoleErrorType, Result};
use crate::fsystem::FlatFile;

pub(crate) const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub(crate) const SUPPORTED_EXTENSIONS: [&str; 4] = ["pdf", "txt", "docx", "md"];

static DOCUMENT_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("document id pattern is valid")
});

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

/// Wire format of `POST /api/generate-website`.
#[derive(Debug, Deserialize)]
pub(crate) struct GenerationResponse {
    success: bool,
    #[serde(default)]
    files_written: Vec<String>,
    #[serde(default)]
    total_files: usize,
    #[serde(default)]
    errors: Option<Vec<String>>,
    // Only sent by backends that return the generated contents inline
    #[serde(default)]
    files: Option<Vec<FlatFile>>,
}

/// A successful generation, ready to be imported into a tree.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GeneratedSite {
    pub(crate) files: Vec<FlatFile>,
    pub(crate) files_written: Vec<String>,
    pub(crate) total_files: usize,
}

impl GenerationResponse {
    pub(crate) fn into_site(self) -> Result<GeneratedSite> {
        let errors = self.errors.unwrap_or_default();
        let empty = self.files_written.is_empty() && self.files.as_ref().map_or(true, Vec::is_empty);
        if !self.success || empty {
            let message = if errors.is_empty() {
                "Failed to generate website".to_string()
            } else {
                errors.join(", ")
            };
            return Err(ConsoleError::upstream(message));
        }
        if !errors.is_empty() {
            tracing::warn!("Generation succeeded with errors: {}", errors.join(", "));
        }
        // Every written path is imported. Inline contents fill in what they
        // cover and files missing from `files_written` are kept after them.
        let inline = self.files.unwrap_or_default();
        let mut files: Vec<FlatFile> = self
            .files_written
            .iter()
            .map(|path| FlatFile {
                path: path.clone(),
                content: inline
                    .iter()
                    .rev()
                    .find(|file| &file.path == path)
                    .map(|file| file.content.clone())
                    .unwrap_or_default(),
            })
            .collect();
        for file in inline {
            if !self.files_written.contains(&file.path) {
                files.push(file);
            }
        }
        Ok(GeneratedSite {
            files,
            files_written: self.files_written,
            total_files: self.total_files,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DocumentInfo {
    pub(crate) document_id: String,
    pub(crate) filename: String,
    pub(crate) upload_date: String,
    pub(crate) file_size: u64,
    pub(crate) file_type: String,
    pub(crate) chunks_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct UploadResponse {
    pub(crate) document_id: String,
    pub(crate) filename: String,
    pub(crate) chunks_processed: u64,
    pub(crate) message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct QueryRequest {
    pub(crate) query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) max_results: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) document_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ContextChunk {
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) metadata: HashMap<String, serde_json::Value>,
    pub(crate) score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct QueryResponse {
    pub(crate) query: String,
    pub(crate) answer: String,
    #[serde(default)]
    pub(crate) sources: Vec<String>,
    #[serde(default)]
    pub(crate) context_chunks: Vec<ContextChunk>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    detail: serde_json::Value,
}

#[async_trait]
pub(crate) trait Backend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedSite>;
    async fn list_documents(&self) -> Result<Vec<DocumentInfo>>;
    async fn upload_document(&self, filename: &str, data: Bytes) -> Result<UploadResponse>;
    async fn delete_document(&self, document_id: &str) -> Result<()>;
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse>;
    async fn health(&self) -> Result<serde_json::Value>;
}

/// Reject uploads the backend cannot index before they cross the wire.
pub(crate) fn validate_upload(filename: &str, size: usize) -> Result<()> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ConsoleError::new(
            ConsoleErrorType::InvalidRequest,
            format!(
                "Unsupported file type for {}. Supported formats: PDF, DOCX, TXT, MD",
                filename
            ),
        ));
    }
    if size == 0 {
        return Err(ConsoleError::new(
            ConsoleErrorType::InvalidRequest,
            format!("{} is empty", filename),
        ));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(ConsoleError::new(
            ConsoleErrorType::InvalidRequest,
            format!("{} is larger than the 10MB limit", filename),
        ));
    }
    Ok(())
}

pub(crate) fn validate_document_id(document_id: &str) -> Result<()> {
    if DOCUMENT_ID.is_match(document_id) {
        Ok(())
    } else {
        Err(ConsoleError::new(
            ConsoleErrorType::InvalidRequest,
            format!("Invalid document id {}", document_id),
        ))
    }
}

pub(crate) struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub(crate) fn new(config: &Config) -> ApiClient {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(
                    "Could not build HTTP client with a {:?} timeout, using defaults: {}",
                    config.request_timeout,
                    e
                );
                reqwest::Client::new()
            });
        ApiClient {
            base_url: config.api_base_url.clone(),
            client,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorDetail>(&body)
                .map(|e| match e.detail {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).trim().to_string());
            let msg = if detail.is_empty() {
                format!("Backend returned {}", status)
            } else {
                format!("Backend returned {}: {}", status, detail)
            };
            tracing::warn!("{}", msg);
            return Err(ConsoleError::upstream(msg));
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl Backend for ApiClient {
    #[instrument(name = "backend.generate", skip(self))]
    async fn generate(&self, prompt: &str) -> Result<GeneratedSite> {
        let response = self
            .client
            .post(self.url("/api/generate-website"))
            .json(&GenerateRequest { prompt })
            .send()
            .await?;
        let result: GenerationResponse = ApiClient::read_json(response).await?;
        let site = result.into_site()?;
        tracing::info!("Backend generated {} files", site.total_files);
        Ok(site)
    }

    #[instrument(name = "backend.list_documents", skip(self))]
    async fn list_documents(&self) -> Result<Vec<DocumentInfo>> {
        let response = self.client.get(self.url("/api/documents")).send().await?;
        ApiClient::read_json(response).await
    }

    #[instrument(name = "backend.upload_document", skip(self, data), fields(size = data.len()))]
    async fn upload_document(&self, filename: &str, data: Bytes) -> Result<UploadResponse> {
        validate_upload(filename, data.len())?;
        let part = reqwest::multipart::Part::bytes(data.to_vec()).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(self.url("/api/documents/upload"))
            .multipart(form)
            .send()
            .await?;
        ApiClient::read_json(response).await
    }

    #[instrument(name = "backend.delete_document", skip(self))]
    async fn delete_document(&self, document_id: &str) -> Result<()> {
        validate_document_id(document_id)?;
        let response = self
            .client
            .delete(self.url(&format!("/api/documents/{}", document_id)))
            .send()
            .await?;
        let _: serde_json::Value = ApiClient::read_json(response).await?;
        Ok(())
    }

    #[instrument(name = "backend.query", skip(self, request))]
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let response = self
            .client
            .post(self.url("/api/query"))
            .json(request)
            .send()
            .await?;
        ApiClient::read_json(response).await
    }

    #[instrument(name = "backend.health", skip(self))]
    async fn health(&self) -> Result<serde_json::Value> {
        let response = self.client.get(self.url("/health")).send().await?;
        ApiClient::read_json(response).await
    }
}
