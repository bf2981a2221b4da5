use crate::schema::{CampaignRollup, MergedRecord};
use crate::utils::canonical_sum;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Default)]
struct Accumulator {
    spend: Vec<f64>,
    revenue: Vec<f64>,
    profit_loss: Vec<f64>,
}

/// Sums spend, revenue and profit/loss per campaign, ordered by campaign id.
pub fn rollup_by_campaign(records: &[MergedRecord]) -> Vec<CampaignRollup> {
    let mut campaigns: BTreeMap<i64, Accumulator> = BTreeMap::new();

    for record in records {
        let acc = campaigns.entry(record.campaign_id).or_default();
        acc.spend.push(record.spend);
        acc.revenue.push(record.revenue);
        acc.profit_loss.push(record.profit_loss);
    }

    campaigns
        .into_iter()
        .map(|(campaign_id, mut acc)| CampaignRollup {
            campaign_id,
            record_count: acc.spend.len(),
            spend: canonical_sum(&mut acc.spend),
            revenue: canonical_sum(&mut acc.revenue),
            profit_loss: canonical_sum(&mut acc.profit_loss),
        })
        .collect()
}

fn by_profit_desc(a: &CampaignRollup, b: &CampaignRollup) -> Ordering {
    b.profit_loss
        .partial_cmp(&a.profit_loss)
        .unwrap_or(Ordering::Equal)
        .then(a.campaign_id.cmp(&b.campaign_id))
}

fn by_profit_asc(a: &CampaignRollup, b: &CampaignRollup) -> Ordering {
    a.profit_loss
        .partial_cmp(&b.profit_loss)
        .unwrap_or(Ordering::Equal)
        .then(a.campaign_id.cmp(&b.campaign_id))
}

/// The `n` most profitable campaigns. Ties go to the lower campaign id.
pub fn top_n(rollups: &[CampaignRollup], n: usize) -> Vec<CampaignRollup> {
    let mut ranked = rollups.to_vec();
    ranked.sort_by(by_profit_desc);
    ranked.truncate(n);
    ranked
}

/// The `n` least profitable campaigns. Ties go to the lower campaign id.
pub fn bottom_n(rollups: &[CampaignRollup], n: usize) -> Vec<CampaignRollup> {
    let mut ranked = rollups.to_vec();
    ranked.sort_by(by_profit_asc);
    ranked.truncate(n);
    ranked
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CampaignRanking {
    pub top: Vec<CampaignRollup>,
    pub bottom: Vec<CampaignRollup>,
}

impl CampaignRanking {
    pub fn from_records(records: &[MergedRecord], top: usize, bottom: usize) -> Self {
        let rollups = rollup_by_campaign(records);
        Self {
            top: top_n(&rollups, top),
            bottom: bottom_n(&rollups, bottom),
        }
    }
}

/// Distinct campaign ids present in `records`, ascending.
pub fn distinct_campaign_ids(records: &[MergedRecord]) -> Vec<i64> {
    records
        .iter()
        .map(|r| r.campaign_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
