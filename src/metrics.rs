//! Comparison metrics: pure reductions over a set of per-model results.
//!
//! ## Ranking rules
//!
//! - `fastest_model`: lowest extraction time.
//! - `most_elements_model`: highest element count.
//! - `longest_content_model`: most characters of markdown.
//!
//! Ties go to the model listed first in the input. Only completed results
//! that carry metrics take part in the ranking; when none do, the winner is
//! `None`. The speed table and the relative speeds of the overview rows use
//! the same eligibility, so row 1 of [`speed_ranking`] is always
//! `fastest_model`.
//!
//! The per-model projections (`speed_comparison` etc.) list *every* model.
//! A failed entry, or one without metrics, contributes `0` so it can still be
//! shown and labelled as failed.

use crate::output::{ComparisonMetrics, ExtractionResult, ExtractionStatus};
use indexmap::IndexMap;
use serde::Serialize;
use std::cmp::Ordering;

/// Numeric view of one result as it enters the ranking.
struct Sample<'a> {
    model: &'a str,
    secs: f64,
    elements: u64,
    chars: u64,
    eligible: bool,
}

fn sample<'a>(model: &'a str, result: &ExtractionResult) -> Sample<'a> {
    match result.ranked_metrics() {
        Some(m) => Sample {
            model,
            secs: m.extraction_time_secs,
            elements: m.num_elements,
            chars: result.content_chars(),
            eligible: true,
        },
        None => Sample {
            model,
            secs: 0.0,
            elements: 0,
            chars: 0,
            eligible: false,
        },
    }
}

fn samples(results: &IndexMap<String, ExtractionResult>) -> Vec<Sample<'_>> {
    results.iter().map(|(k, r)| sample(k, r)).collect()
}

/// Winner among eligible samples. `wins` must be strict so ties stay with
/// the earlier sample.
fn select<'a, T, F>(samples: &[Sample<'a>], key: F, wins: fn(&T, &T) -> bool) -> Option<String>
where
    F: Fn(&Sample<'a>) -> T,
{
    let mut best: Option<(&Sample<'a>, T)> = None;
    for s in samples.iter().filter(|s| s.eligible) {
        let value = key(s);
        let replace = match &best {
            Some((_, current)) => wins(&value, current),
            None => true,
        };
        if replace {
            best = Some((s, value));
        }
    }
    best.map(|(s, _)| s.model.to_string())
}

/// Reduce a comparison batch to its [`ComparisonMetrics`].
///
/// # Example
/// ```rust
/// use extraction_playground::{derive_comparison_metrics, ExtractionResult, IndexMap};
///
/// let results: IndexMap<String, ExtractionResult> = serde_json::from_str(r#"{
///   "A": {"status": "completed", "markdown_content": "aaaa",
///         "metrics": {"num_elements": 10, "extraction_time": 2.0}},
///   "B": {"status": "completed", "markdown_content": "bb",
///         "metrics": {"num_elements": 20, "extraction_time": 1.0}}
/// }"#).unwrap();
///
/// let m = derive_comparison_metrics(&results);
/// assert_eq!(m.fastest_model.as_deref(), Some("B"));
/// assert_eq!(m.longest_content_model.as_deref(), Some("A"));
/// ```
pub fn derive_comparison_metrics(results: &IndexMap<String, ExtractionResult>) -> ComparisonMetrics {
    let samples = samples(results);

    ComparisonMetrics {
        fastest_model: select(&samples, |s| s.secs, PartialOrd::lt),
        most_elements_model: select(&samples, |s| s.elements, PartialOrd::gt),
        longest_content_model: select(&samples, |s| s.chars, PartialOrd::gt),
        speed_comparison: samples.iter().map(|s| (s.model.to_string(), s.secs)).collect(),
        element_comparison: samples.iter().map(|s| (s.model.to_string(), s.elements)).collect(),
        content_length_comparison: samples.iter().map(|s| (s.model.to_string(), s.chars)).collect(),
    }
}

/// One row of the ranked speed table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedRank {
    /// 1-based position; 1 is the fastest. `None` for models that failed or
    /// reported no metrics.
    pub rank: Option<usize>,
    pub model: String,
    pub seconds: f64,
}

/// Models ordered by extraction time, fastest first, followed by the
/// unranked models in input order.
///
/// The sort is stable, so equal times keep their input order.
pub fn speed_ranking(results: &IndexMap<String, ExtractionResult>) -> Vec<SpeedRank> {
    let (mut ranked, unranked): (Vec<Sample<'_>>, Vec<Sample<'_>>) =
        samples(results).into_iter().partition(|s| s.eligible);
    ranked.sort_by(|a, b| a.secs.partial_cmp(&b.secs).unwrap_or(Ordering::Equal));

    let ranked = ranked.into_iter().enumerate().map(|(i, s)| SpeedRank {
        rank: Some(i + 1),
        model: s.model.to_string(),
        seconds: s.secs,
    });
    let unranked = unranked.into_iter().map(|s| SpeedRank {
        rank: None,
        model: s.model.to_string(),
        seconds: s.secs,
    });
    ranked.chain(unranked).collect()
}

/// Overview row for one model of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub model: String,
    pub status: ExtractionStatus,
    pub pages: u32,
    pub elements: u64,
    pub words: u64,
    pub characters: u64,
    pub seconds: f64,
    /// `round(words / elements)`, 0 when either is 0.
    pub avg_words_per_element: u64,
    /// Extraction time as a percentage of the slowest ranked model's time.
    /// 0 for unranked models.
    pub relative_speed_pct: f64,
    pub element_counts: IndexMap<String, u64>,
}

/// Per-model overview rows, in input order.
pub fn summarize(results: &IndexMap<String, ExtractionResult>) -> Vec<ModelSummary> {
    let max_secs = results
        .values()
        .filter_map(ExtractionResult::ranked_metrics)
        .map(|m| m.extraction_time_secs)
        .fold(0.0_f64, f64::max);

    results
        .iter()
        .map(|(model, r)| {
            let m = r.metrics.clone().unwrap_or_default();
            let avg_words_per_element = if m.num_elements > 0 && m.word_count > 0 {
                (m.word_count as f64 / m.num_elements as f64).round() as u64
            } else {
                0
            };
            let relative_speed_pct = match r.ranked_metrics() {
                Some(ranked) if max_secs > 0.0 => ranked.extraction_time_secs / max_secs * 100.0,
                _ => 0.0,
            };
            ModelSummary {
                model: model.to_string(),
                status: r.status,
                pages: m.num_pages,
                elements: m.num_elements,
                words: m.word_count,
                characters: m.character_count,
                seconds: m.extraction_time_secs,
                avg_words_per_element,
                relative_speed_pct,
                element_counts: m.element_counts,
            }
        })
        .collect()
}
