//! Output tables handed to the presentation layer.
//!
//! Column names and order are part of the contract with the report consumer.
//! Dates stay calendar dates (ISO `YYYY-MM-DD` when serialized); display
//! formatting belongs to the consumer.

use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::rollup::{distinct_campaign_ids, CampaignRanking};
use crate::schema::{CampaignRollup, MergedRecord};
use crate::utils::{canonical_sum, ratio_or_zero};
use chrono::NaiveDate;
use csv::WriterBuilder;
use serde::Serialize;
use std::io::Write;

pub const REPORT_COLUMNS: [&str; 8] = [
    "Campaign ID",
    "Campaign Name",
    "Date",
    "Spend",
    "Revenue",
    "CPR",
    "RPC",
    "Profit/Loss",
];

pub const ROLLUP_COLUMNS: [&str; 4] = ["Campaign ID", "Spend", "Revenue", "Profit/Loss"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Campaign ID")]
    pub campaign_id: i64,
    #[serde(rename = "Campaign Name")]
    pub campaign_name: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Spend")]
    pub spend: f64,
    #[serde(rename = "Revenue")]
    pub revenue: f64,
    #[serde(rename = "CPR")]
    pub cpr: f64,
    #[serde(rename = "RPC")]
    pub rpc: f64,
    #[serde(rename = "Profit/Loss")]
    pub profit_loss: f64,
}

impl From<&MergedRecord> for ReportRow {
    fn from(record: &MergedRecord) -> Self {
        Self {
            campaign_id: record.campaign_id,
            campaign_name: record.campaign_name.clone(),
            date: record.date,
            spend: record.spend,
            revenue: record.revenue,
            cpr: record.cpr,
            rpc: record.rpc,
            profit_loss: record.profit_loss,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollupRow {
    #[serde(rename = "Campaign ID")]
    pub campaign_id: i64,
    #[serde(rename = "Spend")]
    pub spend: f64,
    #[serde(rename = "Revenue")]
    pub revenue: f64,
    #[serde(rename = "Profit/Loss")]
    pub profit_loss: f64,
}

impl From<&CampaignRollup> for RollupRow {
    fn from(rollup: &CampaignRollup) -> Self {
        Self {
            campaign_id: rollup.campaign_id,
            spend: rollup.spend,
            revenue: rollup.revenue,
            profit_loss: rollup.profit_loss,
        }
    }
}

fn write_table<W, T>(writer: W, columns: &[&str], rows: &[T]) -> Result<()>
where
    W: Write,
    T: Serialize,
{
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(columns)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// The daily profit/loss table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportTable {
    pub rows: Vec<ReportRow>,
}

impl ReportTable {
    pub fn from_records(records: &[MergedRecord]) -> Self {
        Self {
            rows: records.iter().map(ReportRow::from).collect(),
        }
    }

    /// Writes the table as CSV, header first. An empty table still gets a header.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        write_table(writer, &REPORT_COLUMNS, &self.rows)
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// A top-N or bottom-N campaign table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RollupTable {
    pub rows: Vec<RollupRow>,
}

impl RollupTable {
    pub fn from_rollups(rollups: &[CampaignRollup]) -> Self {
        Self {
            rows: rollups.iter().map(RollupRow::from).collect(),
        }
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        write_table(writer, &ROLLUP_COLUMNS, &self.rows)
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Totals over the rows that made it into the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportTotals {
    pub record_count: usize,
    pub spend: f64,
    pub revenue: f64,
    pub profit_loss: f64,
    pub total_clicks: u64,
    /// Overall revenue per click; 0.0 when there were no clicks.
    pub rpc: f64,
}

impl ReportTotals {
    pub fn from_records(records: &[MergedRecord]) -> Self {
        let mut spend: Vec<f64> = records.iter().map(|r| r.spend).collect();
        let mut revenue: Vec<f64> = records.iter().map(|r| r.revenue).collect();
        let mut profit_loss: Vec<f64> = records.iter().map(|r| r.profit_loss).collect();
        let total_clicks = records
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.total_clicks));

        let revenue = canonical_sum(&mut revenue);
        Self {
            record_count: records.len(),
            spend: canonical_sum(&mut spend),
            revenue,
            profit_loss: canonical_sum(&mut profit_loss),
            total_clicks,
            rpc: ratio_or_zero(revenue, total_clicks),
        }
    }
}

/// Why a report has no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// The spend input had no data rows.
    NoSpendRecords,
    /// Every spend row was excluded during normalization.
    AllSpendRecordsExcluded,
    /// Rows were reconciled but the filter removed all of them.
    AllRecordsFiltered,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    /// Filtered daily rows in report order.
    pub rows: Vec<MergedRecord>,
    pub ranking: CampaignRanking,
    pub totals: ReportTotals,
    pub diagnostics: Diagnostics,
    pub empty_reason: Option<EmptyReason>,
}

impl ReconciliationReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn campaign_ids(&self) -> Vec<i64> {
        distinct_campaign_ids(&self.rows)
    }

    pub fn table(&self) -> ReportTable {
        ReportTable::from_records(&self.rows)
    }

    pub fn top_table(&self) -> RollupTable {
        RollupTable::from_rollups(&self.ranking.top)
    }

    pub fn bottom_table(&self) -> RollupTable {
        RollupTable::from_rollups(&self.ranking.bottom)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
