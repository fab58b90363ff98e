//! Splits a batch into per-category ("apart") writes and one combined write.

use crate::domain::{LogBatch, LogConfig};

/// Stringified entries of one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMessages {
    pub category: String,
    pub messages: Vec<String>,
}

/// Result of classification. A category lands in exactly one of the groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    /// Categories written to their own file, one write each
    pub apart: Vec<CategoryMessages>,
    /// Categories sharing the master file
    pub combined: Vec<CategoryMessages>,
}

impl Classified {
    pub fn is_empty(&self) -> bool {
        self.apart.is_empty() && self.combined.is_empty()
    }
}

/// Route each category of `batch`.
///
/// Structured mode disables apart routing: every category goes to the
/// combined destination regardless of `apart_level`.
pub fn classify(batch: &LogBatch, config: &LogConfig) -> Classified {
    let mut classified = Classified::default();

    for (category, entries) in batch.iter() {
        if entries.is_empty() {
            continue;
        }

        let group = CategoryMessages {
            category: category.to_string(),
            messages: entries.iter().map(|entry| entry.export()).collect(),
        };

        if !config.json && config.apart_level.is_apart(category) {
            classified.apart.push(group);
        } else {
            classified.combined.push(group);
        }
    }

    classified
}
