//! # Campaign Reconciler
//!
//! A library for reconciling advertising spend exports against monetization
//! logs into a per-campaign, per-day profit/loss report.
//!
//! ## Core Concepts
//!
//! - **Spend rows**: one ad set per day, with the campaign id embedded in the
//!   ad set name, e.g. `"Summer Promo (12345)"`
//! - **Revenue events**: raw clicks and earnings, aggregated per (campaign, day)
//! - **Left join**: every valid spend row appears exactly once in the report;
//!   days without revenue carry zero revenue and zero clicks
//! - **Metrics**: revenue per click (0 when there are no clicks) and
//!   profit/loss (revenue minus spend)
//! - **Diagnostics**: malformed rows are excluded one by one and reported,
//!   they never abort the run
//!
//! ## Example
//!
//! ```rust,ignore
//! use campaign_reconciler::*;
//!
//! let spend = RawTable::from_csv_str(
//!     "Ad set name,Day,Amount spent (USD)\nPromo (42),2024-01-05,100\n",
//! )?;
//! let revenue = RawTable::from_csv_str(
//!     "campid,date,clicks,estimated_earnings\n42,2024-01-05,10,150\n42,2024-01-05,5,50\n",
//! )?;
//!
//! let report = reconcile(&spend, &revenue, &ReconcileOptions::default())?;
//! assert_eq!(report.rows[0].profit_loss, 100.0);
//! ```

pub mod aggregator;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod ingestion;
pub mod merge;
pub mod metrics;
pub mod normalizer;
pub mod report;
pub mod rollup;
pub mod schema;
pub mod utils;

pub use aggregator::aggregate_revenue;
pub use diagnostics::{Diagnostics, ExcludedRecord};
pub use error::{RecordError, ReconcileError, Result};
pub use filter::apply_filter;
pub use ingestion::{FieldAliases, RawRow, RawTable};
pub use merge::{left_join, JoinedRecord};
pub use metrics::{derive_all, derive_metrics, revenue_per_click};
pub use normalizer::{extract_campaign_id, normalize_revenue, normalize_spend, NormalizedBatch};
pub use report::{
    EmptyReason, ReconciliationReport, ReportRow, ReportTable, ReportTotals, RollupRow,
    RollupTable, REPORT_COLUMNS, ROLLUP_COLUMNS,
};
pub use rollup::{bottom_n, distinct_campaign_ids, rollup_by_campaign, top_n, CampaignRanking};
pub use schema::*;

use log::{debug, info, warn};

pub struct Reconciler {
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new(options: ReconcileOptions) -> Self {
        Self { options }
    }

    /// Runs the full pipeline over one spend table and one revenue table.
    pub fn reconcile(&self, spend: &RawTable, revenue: &RawTable) -> Result<ReconciliationReport> {
        self.options.filter.validate()?;

        info!(
            "Reconciling {} spend rows against {} revenue rows",
            spend.len(),
            revenue.len()
        );

        let spend_batch = normalize_spend(spend)?;
        let revenue_batch = normalize_revenue(revenue)?;

        let merged = merge_records(&spend_batch.records, &revenue_batch.records);
        debug!("Reconciled {} daily records before filtering", merged.len());

        let rows = apply_filter(&merged, &self.options.filter)?;
        let ranking = CampaignRanking::from_records(&rows, self.options.top_n, self.options.bottom_n);
        let totals = ReportTotals::from_records(&rows);

        let empty_reason = if spend_batch.rows_read == 0 {
            Some(EmptyReason::NoSpendRecords)
        } else if spend_batch.records.is_empty() {
            Some(EmptyReason::AllSpendRecordsExcluded)
        } else if rows.is_empty() {
            Some(EmptyReason::AllRecordsFiltered)
        } else {
            None
        };

        let mut excluded = spend_batch.excluded;
        excluded.extend(revenue_batch.excluded);
        let diagnostics = Diagnostics::collect(
            spend_batch.rows_read,
            revenue_batch.rows_read,
            excluded,
            self.options.diagnostic_sample_limit,
        );
        diagnostics.log_summary();

        if let Some(reason) = empty_reason {
            warn!("Reconciliation produced an empty report: {:?}", reason);
        }

        info!(
            "Report has {} rows across {} campaigns; {} input rows excluded",
            rows.len(),
            distinct_campaign_ids(&rows).len(),
            diagnostics.excluded_count
        );

        Ok(ReconciliationReport {
            rows,
            ranking,
            totals,
            diagnostics,
            empty_reason,
        })
    }

    /// Concatenates several exports of each kind, then reconciles them.
    pub fn reconcile_sources<S, R>(&self, spend: S, revenue: R) -> Result<ReconciliationReport>
    where
        S: IntoIterator<Item = RawTable>,
        R: IntoIterator<Item = RawTable>,
    {
        self.reconcile(&RawTable::concat(spend), &RawTable::concat(revenue))
    }
}

/// Aggregates revenue, joins it to spend and derives metrics. Output is in
/// spend order; no filtering or sorting is applied.
pub fn merge_records(spend: &[SpendRecord], events: &[RevenueEvent]) -> Vec<MergedRecord> {
    let aggregated = aggregate_revenue(events);
    derive_all(left_join(spend, &aggregated))
}

pub fn reconcile(
    spend: &RawTable,
    revenue: &RawTable,
    options: &ReconcileOptions,
) -> Result<ReconciliationReport> {
    Reconciler::new(options.clone()).reconcile(spend, revenue)
}

/// Convenience entry point for in-memory CSV documents.
pub fn reconcile_csv(
    spend_csvs: &[&str],
    revenue_csvs: &[&str],
    options: &ReconcileOptions,
) -> Result<ReconciliationReport> {
    let spend = spend_csvs
        .iter()
        .map(|text| RawTable::from_csv_str(text))
        .collect::<Result<Vec<_>>>()?;
    let revenue = revenue_csvs
        .iter()
        .map(|text| RawTable::from_csv_str(text))
        .collect::<Result<Vec<_>>>()?;

    Reconciler::new(options.clone()).reconcile_sources(spend, revenue)
}
