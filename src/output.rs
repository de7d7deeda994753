//! Result types exchanged with the extraction service.
//!
//! [`ExtractionResult`] and [`ModelInfo`] mirror the service's JSON exactly.
//! [`ComparisonResult`] is different: it is only ever built from a result
//! set through [`ComparisonResult::new`], which runs
//! [`crate::metrics::derive_comparison_metrics`]. Its metrics therefore always
//! describe the results they sit next to. The raw wire shape, whose
//! `comparison_metrics` may be absent, is [`ComparisonResponse`].

use crate::metrics::derive_comparison_metrics;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// An extraction model offered by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Identifier sent back in extraction requests, e.g. `"docling"`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strengths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub limitations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommended_for: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_speed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_required: Option<bool>,
}

impl ModelInfo {
    /// Human-facing name: `display_name` when set, else `name`.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Terminal status of one model's extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    Completed,
    /// Any status other than `completed` is treated as a failure.
    #[serde(other)]
    Failed,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStatus::Completed => "completed",
            ExtractionStatus::Failed => "failed",
        }
    }
}

/// Per-model measurements reported by the service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractionMetrics {
    #[serde(default)]
    pub num_pages: u32,
    #[serde(default)]
    pub num_elements: u64,
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub character_count: u64,
    /// Wall-clock extraction time on the server, seconds.
    #[serde(default, rename = "extraction_time")]
    pub extraction_time_secs: f64,
    /// Element-type label (e.g. `"table"`, `"section_header"`) → count.
    #[serde(default)]
    pub element_counts: IndexMap<String, u64>,
}

/// The result of running one model over the uploaded PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Model identifier. Filled from the result key when the service omits it
    /// inside a comparison batch.
    #[serde(default)]
    pub model: String,
    pub status: ExtractionStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub markdown_content: String,
    #[serde(default)]
    pub metrics: Option<ExtractionMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn is_completed(&self) -> bool {
        self.status == ExtractionStatus::Completed
    }

    /// Length of the extracted markdown in characters (not bytes).
    pub fn content_chars(&self) -> u64 {
        self.markdown_content.chars().count() as u64
    }

    /// Metrics usable for ranking: present only for completed results.
    pub fn ranked_metrics(&self) -> Option<&ExtractionMetrics> {
        if self.is_completed() {
            self.metrics.as_ref()
        } else {
            None
        }
    }
}

/// Aggregate metrics across the models of one comparison.
///
/// The three `*_model` fields are `None` only when no entry completed with
/// metrics. The three mappings always list every model, in input order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComparisonMetrics {
    pub fastest_model: Option<String>,
    #[serde(rename = "most_elements")]
    pub most_elements_model: Option<String>,
    #[serde(rename = "longest_content")]
    pub longest_content_model: Option<String>,
    #[serde(default)]
    pub speed_comparison: IndexMap<String, f64>,
    #[serde(default)]
    pub element_comparison: IndexMap<String, u64>,
    #[serde(default)]
    pub content_length_comparison: IndexMap<String, u64>,
}

/// A multi-model extraction with metrics derived from its own results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    task_id: String,
    results: IndexMap<String, ExtractionResult>,
    comparison_metrics: ComparisonMetrics,
}

impl ComparisonResult {
    /// Build a comparison, deriving its metrics from `results`.
    pub fn new(task_id: impl Into<String>, results: IndexMap<String, ExtractionResult>) -> Self {
        let comparison_metrics = derive_comparison_metrics(&results);
        Self {
            task_id: task_id.into(),
            results,
            comparison_metrics,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn results(&self) -> &IndexMap<String, ExtractionResult> {
        &self.results
    }

    pub fn metrics(&self) -> &ComparisonMetrics {
        &self.comparison_metrics
    }

    /// Number of entries whose status is `failed`.
    pub fn failed_count(&self) -> usize {
        self.results.values().filter(|r| !r.is_completed()).count()
    }
}

/// Wire shape of `POST /extract/compare`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComparisonResponse {
    #[serde(default)]
    pub task_id: String,
    pub results: IndexMap<String, ExtractionResult>,
    #[serde(default)]
    pub comparison_metrics: Option<ComparisonMetrics>,
}

impl ComparisonResponse {
    /// Convert into a [`ComparisonResult`], recomputing metrics locally.
    ///
    /// Metrics supplied by the service are discarded after a consistency
    /// check; a mismatch is logged at debug level.
    pub fn into_result(self) -> ComparisonResult {
        let mut results = self.results;
        for (key, result) in results.iter_mut() {
            if result.model.is_empty() {
                result.model = key.to_string();
            }
        }
        let comparison = ComparisonResult::new(self.task_id, results);
        if let Some(server) = self.comparison_metrics {
            let local = comparison.metrics();
            if server.fastest_model != local.fastest_model
                || server.most_elements_model != local.most_elements_model
                || server.longest_content_model != local.longest_content_model
            {
                debug!(
                    "Service comparison metrics differ from derived ones (server fastest={:?}, derived fastest={:?})",
                    server.fastest_model, local.fastest_model
                );
            }
        }
        comparison
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
