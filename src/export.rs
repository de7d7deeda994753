//! Markdown export: file names, combined copies, and atomic writes.
//!
//! Mirrors the "Download" and "Copy All" actions of the result views:
//! a single result becomes `{model}-extraction.md`, each model of a
//! comparison becomes `{model}-comparison-extraction.md`, and entries with
//! no extracted content are skipped.

use crate::error::PlaygroundError;
use crate::output::{ComparisonResult, ExtractionResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Download file name for a model's markdown.
pub fn export_file_name(model: &str, comparison: bool) -> String {
    if comparison {
        format!("{model}-comparison-extraction.md")
    } else {
        format!("{model}-extraction.md")
    }
}

/// Every model's markdown in one document, each under a `# MODEL Extraction`
/// heading and followed by a horizontal rule.
pub fn combined_markdown(comparison: &ComparisonResult) -> String {
    comparison
        .results()
        .iter()
        .map(|(model, r)| {
            format!(
                "# {} Extraction\n\n{}\n\n---\n\n",
                model.to_uppercase(),
                r.markdown_content
            )
        })
        .collect()
}

/// Write `content` to `path` via a temp file and rename.
pub async fn write_markdown(path: impl AsRef<Path>, content: &str) -> Result<(), PlaygroundError> {
    let path = path.as_ref();
    let write_err = |source| PlaygroundError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, content).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    debug!("Wrote {} ({} bytes)", path.display(), content.len());
    Ok(())
}

/// Save a single result into `dir`. Returns `None` when it has no content.
pub async fn export_single(
    dir: impl AsRef<Path>,
    result: &ExtractionResult,
) -> Result<Option<PathBuf>, PlaygroundError> {
    if result.markdown_content.is_empty() {
        return Ok(None);
    }
    let path = dir.as_ref().join(export_file_name(&result.model, false));
    write_markdown(&path, &result.markdown_content).await?;
    Ok(Some(path))
}

/// Save every model of a comparison that produced content into `dir`.
pub async fn export_comparison(
    dir: impl AsRef<Path>,
    comparison: &ComparisonResult,
) -> Result<Vec<PathBuf>, PlaygroundError> {
    let dir = dir.as_ref();
    let mut written = Vec::new();
    for (model, r) in comparison.results().iter() {
        if r.markdown_content.is_empty() {
            continue;
        }
        let path = dir.join(export_file_name(model, true));
        write_markdown(&path, &r.markdown_content).await?;
        written.push(path);
    }
    Ok(written)
}
