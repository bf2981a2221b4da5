use crate::schema::{AggregatedRevenue, SpendRecord};
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::HashMap;

/// A spend row paired with its (campaign, day) revenue, before metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    pub campaign_id: i64,
    pub campaign_name: String,
    pub date: NaiveDate,
    pub spend: f64,
    pub revenue: f64,
    pub total_clicks: u64,
    pub cpr: f64,
    pub matched: bool,
}

/// Left-joins spend rows to aggregated revenue on (campaign id, date).
///
/// Every spend row yields exactly one joined row, in input order. Spend rows
/// with no revenue on their key carry zero revenue and zero clicks.
pub fn left_join(spend: &[SpendRecord], revenue: &[AggregatedRevenue]) -> Vec<JoinedRecord> {
    let mut index: HashMap<(i64, NaiveDate), &AggregatedRevenue> =
        HashMap::with_capacity(revenue.len());
    for row in revenue {
        if index.insert((row.campaign_id, row.date), row).is_some() {
            warn!(
                "Duplicate revenue key for campaign {} on {}; keeping the later row",
                row.campaign_id, row.date
            );
        }
    }

    let joined: Vec<JoinedRecord> = spend
        .iter()
        .map(|record| {
            let matched = index.get(&(record.campaign_id, record.date));
            JoinedRecord {
                campaign_id: record.campaign_id,
                campaign_name: record.ad_set_name.clone(),
                date: record.date,
                spend: record.amount_spent,
                revenue: matched.map_or(0.0, |r| r.revenue),
                total_clicks: matched.map_or(0, |r| r.total_clicks),
                cpr: record.cost_per_result,
                matched: matched.is_some(),
            }
        })
        .collect();

    debug!(
        "Joined {} spend rows; {} matched revenue",
        joined.len(),
        joined.iter().filter(|j| j.matched).count()
    );

    joined
}
