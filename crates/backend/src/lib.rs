//! REST client for the layout server.
//!
//! The server stores the original PDF bytes and the saved field layout as
//! separate resources linked by the document id. All calls are blocking;
//! the editor issues them off its interaction path. A failed call leaves
//! local state untouched so the caller can simply retry.

use form_editor_core::DocumentLayout;
use reqwest::blocking::{multipart, Client};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("form-editor/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to decode server response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One stored document, as listed by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct PdfSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

/// Metadata plus the saved layout for one document.
#[derive(Debug, Clone, Deserialize)]
pub struct PdfInfo {
    pub name: String,
    #[serde(flatten)]
    pub layout: DocumentLayout,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadedPdf {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    pdf: UploadedPdf,
}

pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    /// `base_url` is the server root, e.g. `http://localhost:5000`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        let base_url = base_url.into();
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn list(&self) -> Result<Vec<PdfSummary>, ApiError> {
        let response = check(self.http.get(self.url("/api/pdfs")).send()?)?;
        Ok(response.json()?)
    }

    pub fn info(&self, id: &str) -> Result<PdfInfo, ApiError> {
        let response = check(self.http.get(self.url(&format!("/api/pdfs/{id}/info"))).send()?)?;
        Ok(response.json()?)
    }

    /// Original PDF bytes as uploaded.
    pub fn download(&self, id: &str) -> Result<Vec<u8>, ApiError> {
        let response = check(self.http.get(self.url(&format!("/api/pdfs/{id}"))).send()?)?;
        Ok(response.bytes()?.to_vec())
    }

    pub fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<UploadedPdf, ApiError> {
        let part = multipart::Part::bytes(bytes)
            .file_name(name.to_owned())
            .mime_str("application/pdf")?;
        let form = multipart::Form::new().part("pdf", part);

        let response =
            check(self.http.post(self.url("/api/pdfs/upload")).multipart(form).send()?)?;
        let body: UploadResponse = response.json()?;
        log::info!("uploaded {} as {}", body.pdf.name, body.pdf.id);
        Ok(body.pdf)
    }

    /// Replace the saved layout for a document.
    pub fn save_fields(&self, id: &str, layout: &DocumentLayout) -> Result<(), ApiError> {
        check(
            self.http
                .post(self.url(&format!("/api/pdfs/{id}/fields")))
                .json(layout)
                .send()?,
        )?;
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<(), ApiError> {
        check(self.http.delete(self.url(&format!("/api/pdfs/{id}"))).send()?)?;
        Ok(())
    }
}

/// Turn non-2xx responses into `ApiError::Status` with the body attached,
/// since the server reports failures as JSON messages.
fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(ApiError::Status { status, body })
}
