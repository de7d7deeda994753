//! The set of models chosen for the next dispatch.

use serde::Serialize;

/// Outcome of an in-place toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// The selection was full and the model was not added.
    AtCeiling,
}

/// Ordered, duplicate-free list of at most [`ModelSelection::MAX`] model ids.
///
/// Order is the order in which models were added; the comparison request
/// and the result views follow it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ModelSelection {
    models: Vec<String>,
}

impl ModelSelection {
    /// Largest number of models compared at once.
    pub const MAX: usize = 3;

    pub fn new() -> Self {
        Self::default()
    }

    /// Return the selection with `model` toggled.
    ///
    /// Present models are removed; absent ones are appended if there is
    /// room. At the ceiling the selection comes back unchanged.
    pub fn toggle(&self, model: &str) -> ModelSelection {
        let mut next = self.clone();
        next.toggle_in_place(model);
        next
    }

    /// Toggle `model` in place and report what happened.
    pub fn toggle_in_place(&mut self, model: &str) -> ToggleOutcome {
        if let Some(pos) = self.models.iter().position(|m| m == model) {
            self.models.remove(pos);
            ToggleOutcome::Removed
        } else if self.models.len() < Self::MAX {
            self.models.push(model.to_string());
            ToggleOutcome::Added
        } else {
            ToggleOutcome::AtCeiling
        }
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.models.len() >= Self::MAX
    }

    /// More than one model selected: the next dispatch is a comparison.
    pub fn is_comparison(&self) -> bool {
        self.models.len() > 1
    }

    pub fn as_slice(&self) -> &[String] {
        &self.models
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }

    /// Advisory shown next to a full selection.
    pub fn advisory(&self) -> Option<&'static str> {
        if self.is_full() {
            Some("Maximum 3 models for comparison")
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.models.clear();
    }
}
