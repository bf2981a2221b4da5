use crate::error::RecordError;
use crate::schema::SourceKind;
use log::warn;
use serde::Serialize;
use std::collections::BTreeMap;

fn class_key(source: SourceKind, class: &str) -> String {
    format!("{source}.{class}")
}

/// An input row left out of the reconciliation, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedRecord {
    pub source: SourceKind,
    /// 1-based data row within the concatenated source.
    pub row: usize,
    pub error: RecordError,
    /// The row's non-blank cells as `header=value` pairs.
    pub raw: String,
}

/// Non-fatal problems found while normalizing the inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub spend_rows_read: usize,
    pub revenue_rows_read: usize,
    pub excluded_count: usize,
    /// Exclusions keyed by `"<source>.<error class>"`, e.g. `"spend.malformed_date"`.
    pub excluded_by_class: BTreeMap<String, usize>,
    pub samples: Vec<ExcludedRecord>,
}

impl Diagnostics {
    /// Counts every exclusion and keeps up to `sample_limit` samples, chosen
    /// by (source, error class, raw row) so the selection does not depend on
    /// input order.
    pub fn collect(
        spend_rows_read: usize,
        revenue_rows_read: usize,
        mut excluded: Vec<ExcludedRecord>,
        sample_limit: usize,
    ) -> Self {
        let mut excluded_by_class = BTreeMap::new();
        for record in &excluded {
            *excluded_by_class
                .entry(class_key(record.source, record.error.class()))
                .or_insert(0) += 1;
        }

        excluded.sort_by(|a, b| {
            a.source
                .cmp(&b.source)
                .then_with(|| a.error.class().cmp(b.error.class()))
                .then_with(|| a.raw.cmp(&b.raw))
                .then(a.row.cmp(&b.row))
        });

        let excluded_count = excluded.len();
        let samples = excluded.into_iter().take(sample_limit).collect();

        Self {
            spend_rows_read,
            revenue_rows_read,
            excluded_count,
            excluded_by_class,
            samples,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.excluded_count == 0
    }

    pub fn excluded_from(&self, source: SourceKind) -> usize {
        let prefix = format!("{source}.");
        self.excluded_by_class
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, count)| count)
            .sum()
    }

    pub fn count(&self, source: SourceKind, class: &str) -> usize {
        self.excluded_by_class
            .get(&class_key(source, class))
            .copied()
            .unwrap_or(0)
    }

    pub fn log_summary(&self) {
        for (key, count) in &self.excluded_by_class {
            warn!("Excluded {} row(s): {}", count, key);
        }
    }
}
