//! The extraction service contract and its HTTP implementation.
//!
//! [`ExtractionService`] is the seam between the orchestrator and the
//! network: the orchestrator only ever talks to `&dyn ExtractionService`, so
//! tests substitute an in-memory service and hosts can add caching or auth
//! without touching the state machine.
//!
//! ## Endpoints
//!
//! Paths are resolved against [`ClientConfig::base_url`]:
//!
//! | Call | Request | Response |
//! |------|---------|----------|
//! | [`list_models`](ExtractionService::list_models) | `GET models` | `[ModelInfo]` |
//! | [`extract_single`](ExtractionService::extract_single) | `POST extract` multipart `file`, `model` | `ExtractionResult` |
//! | [`extract_compare`](ExtractionService::extract_compare) | `POST extract/compare` multipart `file`, `models` | `ComparisonResponse` |
//!
//! Non-2xx answers become [`PlaygroundError::ServiceError`] carrying the
//! body's `detail` string when there is one.

use crate::config::ClientConfig;
use crate::error::PlaygroundError;
use crate::output::{ComparisonResponse, ExtractionResult, ModelInfo};
use crate::session::upload::UploadCandidate;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const MODELS_PATH: &str = "models";
const EXTRACT_PATH: &str = "extract";
const COMPARE_PATH: &str = "extract/compare";

/// Remote extraction operations consumed by the orchestrator.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Models the service can run.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, PlaygroundError>;

    /// Run one model over `file`.
    async fn extract_single(
        &self,
        file: &UploadCandidate,
        model: &str,
    ) -> Result<ExtractionResult, PlaygroundError>;

    /// Run every model in `models` over `file`.
    async fn extract_compare(
        &self,
        file: &UploadCandidate,
        models: &[String],
    ) -> Result<ComparisonResponse, PlaygroundError>;
}

/// [`ExtractionService`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpExtractionService {
    client: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
    generate_annotations: bool,
}

impl HttpExtractionService {
    pub fn new(config: &ClientConfig) -> Result<Self, PlaygroundError> {
        // A base without a trailing slash would lose its last segment on join.
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| PlaygroundError::InvalidConfig(format!("base URL '{}': {e}", config.base_url)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| PlaygroundError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            timeout_secs: config.request_timeout_secs,
            generate_annotations: config.generate_annotations,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, PlaygroundError> {
        self.base_url
            .join(path)
            .map_err(|e| PlaygroundError::Internal(format!("endpoint '{path}': {e}")))
    }

    fn file_part(file: &UploadCandidate) -> Result<Part, PlaygroundError> {
        Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.media_type())
            .map_err(|e| PlaygroundError::Internal(format!("multipart: {e}")))
    }

    fn upload_form(&self, file: &UploadCandidate) -> Result<Form, PlaygroundError> {
        Ok(Form::new()
            .part("file", Self::file_part(file)?)
            .text("generate_annotations", self.generate_annotations.to_string()))
    }

    /// Send `request` and decode a JSON body, mapping every failure mode.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<T, PlaygroundError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                PlaygroundError::Timeout {
                    url: url.to_string(),
                    secs: self.timeout_secs,
                }
            } else {
                PlaygroundError::Network {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| PlaygroundError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            let detail = parse_detail(&body);
            warn!("{} answered HTTP {} ({:?})", url, status.as_u16(), detail);
            return Err(PlaygroundError::ServiceError {
                status: status.as_u16(),
                detail,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            PlaygroundError::InvalidResponse(format!("{url}: {e}; body starts with {:?}", snippet(&body)))
        })
    }
}

#[async_trait]
impl ExtractionService for HttpExtractionService {
    async fn list_models(&self) -> Result<Vec<ModelInfo>, PlaygroundError> {
        let url = self.endpoint(MODELS_PATH)?;
        debug!("GET {}", url);
        self.send_json(self.client.get(url.clone()), &url).await
    }

    async fn extract_single(
        &self,
        file: &UploadCandidate,
        model: &str,
    ) -> Result<ExtractionResult, PlaygroundError> {
        let url = self.endpoint(EXTRACT_PATH)?;
        let form = self.upload_form(file)?.text("model", model.to_string());

        let start = Instant::now();
        info!("Extracting '{}' with {}", file.name(), model);
        let result: ExtractionResult = self
            .send_json(self.client.post(url.clone()).multipart(form), &url)
            .await?;
        debug!("{} finished in {}ms", model, start.elapsed().as_millis());
        Ok(result)
    }

    async fn extract_compare(
        &self,
        file: &UploadCandidate,
        models: &[String],
    ) -> Result<ComparisonResponse, PlaygroundError> {
        let url = self.endpoint(COMPARE_PATH)?;
        let form = self.upload_form(file)?.text("models", models.join(","));

        let start = Instant::now();
        info!("Comparing '{}' across {}", file.name(), models.join(", "));
        let response: ComparisonResponse = self
            .send_json(self.client.post(url.clone()).multipart(form), &url)
            .await?;
        debug!(
            "Comparison of {} models finished in {}ms",
            models.len(),
            start.elapsed().as_millis()
        );
        Ok(response)
    }
}

/// Extract a non-empty string `detail` from an error body.
fn parse_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let detail = value.get("detail")?.as_str()?.trim();
    if detail.is_empty() {
        None
    } else {
        Some(detail.to_string())
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(120).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_parsed_from_fastapi_body() {
        assert_eq!(
            parse_detail(r#"{"detail": "File too large. Maximum size is 50.0MB"}"#).as_deref(),
            Some("File too large. Maximum size is 50.0MB")
        );
    }

    #[test]
    fn non_string_or_missing_detail_ignored() {
        assert_eq!(parse_detail(r#"{"detail": [{"loc": ["body", "file"]}]}"#), None);
        assert_eq!(parse_detail(r#"{"detail": "  "}"#), None);
        assert_eq!(parse_detail("<html>502 Bad Gateway</html>"), None);
    }

    #[test]
    fn endpoints_keep_base_path() {
        let cfg = ClientConfig::builder()
            .base_url("http://localhost:8000/api/v1")
            .build()
            .unwrap();
        let svc = HttpExtractionService::new(&cfg).unwrap();
        assert_eq!(
            svc.endpoint(COMPARE_PATH).unwrap().as_str(),
            "http://localhost:8000/api/v1/extract/compare"
        );
        assert_eq!(
            svc.endpoint(MODELS_PATH).unwrap().as_str(),
            "http://localhost:8000/api/v1/models"
        );
    }
}
