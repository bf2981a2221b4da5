use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Spend,
    Revenue,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Spend => write!(f, "spend"),
            SourceKind::Revenue => write!(f, "revenue"),
        }
    }
}

/// One ad set on one day, after the campaign id and date have been extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendRecord {
    pub campaign_id: i64,
    /// The ad set name exactly as exported, e.g. "Summer Promo (12345)".
    pub ad_set_name: String,
    pub date: NaiveDate,
    pub amount_spent: f64,
    /// Resolved cost-per-result; 0.0 when the export carried none.
    pub cost_per_result: f64,
}

/// One raw monetization event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueEvent {
    pub campaign_id: i64,
    pub date: NaiveDate,
    pub clicks: u64,
    pub earnings: f64,
}

/// Revenue events collapsed to one row per (campaign, day).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRevenue {
    pub campaign_id: i64,
    pub date: NaiveDate,
    pub total_clicks: u64,
    pub revenue: f64,
}

/// One spend row joined to its revenue, with derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub campaign_id: i64,
    pub campaign_name: String,
    pub date: NaiveDate,
    pub spend: f64,
    /// 0.0 when no revenue matched the (campaign, day) key.
    pub revenue: f64,
    pub total_clicks: u64,
    pub cpr: f64,
    pub rpc: f64,
    pub profit_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignRollup {
    pub campaign_id: i64,
    pub spend: f64,
    pub revenue: f64,
    pub profit_loss: f64,
    /// Number of daily records folded into this rollup.
    pub record_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FilterSpec {
    #[serde(default)]
    #[schemars(description = "Inclusive lower bound on the record date (YYYY-MM-DD). Omit for no lower bound.")]
    pub date_from: Option<NaiveDate>,

    #[serde(default)]
    #[schemars(description = "Inclusive upper bound on the record date (YYYY-MM-DD). Omit for no upper bound.")]
    pub date_to: Option<NaiveDate>,

    #[serde(default)]
    #[schemars(
        description = "Campaign ids to keep. An empty list means every campaign is kept."
    )]
    pub campaign_ids: Vec<i64>,

    #[serde(default)]
    #[schemars(description = "Inclusive lower bound on daily profit/loss.")]
    pub profit_min: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Inclusive upper bound on daily profit/loss.")]
    pub profit_max: Option<f64>,
}

pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_BOTTOM_N: usize = 5;
pub const DEFAULT_DIAGNOSTIC_SAMPLE_LIMIT: usize = 10;

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_bottom_n() -> usize {
    DEFAULT_BOTTOM_N
}

fn default_sample_limit() -> usize {
    DEFAULT_DIAGNOSTIC_SAMPLE_LIMIT
}

/// Per-run parameters supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReconcileOptions {
    #[serde(default)]
    #[schemars(description = "Predicates applied to the reconciled daily rows. All set predicates must hold.")]
    pub filter: FilterSpec,

    #[serde(default = "default_top_n")]
    #[schemars(description = "How many campaigns to list in the most-profitable table. Defaults to 5.")]
    pub top_n: usize,

    #[serde(default = "default_bottom_n")]
    #[schemars(description = "How many campaigns to list in the least-profitable table. Defaults to 5.")]
    pub bottom_n: usize,

    #[serde(default = "default_sample_limit")]
    #[schemars(description = "Maximum number of excluded rows echoed back in diagnostics. Defaults to 10.")]
    pub diagnostic_sample_limit: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            filter: FilterSpec::default(),
            top_n: DEFAULT_TOP_N,
            bottom_n: DEFAULT_BOTTOM_N,
            diagnostic_sample_limit: DEFAULT_DIAGNOSTIC_SAMPLE_LIMIT,
        }
    }
}

impl ReconcileOptions {
    pub fn with_filter(filter: FilterSpec) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ReconcileOptions)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = ReconcileOptions::schema_as_json().unwrap();
        assert!(schema_json.contains("date_from"));
        assert!(schema_json.contains("campaign_ids"));
        assert!(schema_json.contains("top_n"));
    }

    #[test]
    fn test_options_defaults_from_empty_json() {
        let options: ReconcileOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ReconcileOptions::default());
        assert_eq!(options.top_n, 5);
        assert_eq!(options.bottom_n, 5);
        assert!(options.filter.campaign_ids.is_empty());
    }

    #[test]
    fn test_filter_deserialization() {
        let json = r#"{
            "filter": {
                "date_from": "2024-01-01",
                "campaign_ids": [42, 7],
                "profit_min": 0.0
            },
            "top_n": 3
        }"#;

        let options: ReconcileOptions = serde_json::from_str(json).unwrap();
        assert_eq!(
            options.filter.date_from,
            Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
        assert_eq!(options.filter.date_to, None);
        assert_eq!(options.filter.campaign_ids, vec![42, 7]);
        assert_eq!(options.filter.profit_min, Some(0.0));
        assert_eq!(options.top_n, 3);
        assert_eq!(options.bottom_n, 5);
    }
}
