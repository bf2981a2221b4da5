use crate::error::{ReconcileError, Result};
use crate::schema::{FilterSpec, MergedRecord};
use log::debug;
use std::cmp::Ordering;

impl FilterSpec {
    pub fn is_unrestricted(&self) -> bool {
        self.date_from.is_none()
            && self.date_to.is_none()
            && self.campaign_ids.is_empty()
            && self.profit_min.is_none()
            && self.profit_max.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(ReconcileError::InvalidFilter(format!(
                    "date_from {from} is after date_to {to}"
                )));
            }
        }

        for (name, bound) in [("profit_min", self.profit_min), ("profit_max", self.profit_max)] {
            if let Some(value) = bound {
                if !value.is_finite() {
                    return Err(ReconcileError::InvalidFilter(format!(
                        "{name} must be finite, got {value}"
                    )));
                }
            }
        }

        if let (Some(min), Some(max)) = (self.profit_min, self.profit_max) {
            if min > max {
                return Err(ReconcileError::InvalidFilter(format!(
                    "profit_min {min} is greater than profit_max {max}"
                )));
            }
        }

        Ok(())
    }

    /// True when `record` satisfies every predicate that is set.
    pub fn matches(&self, record: &MergedRecord) -> bool {
        self.date_from.map_or(true, |from| record.date >= from)
            && self.date_to.map_or(true, |to| record.date <= to)
            && (self.campaign_ids.is_empty() || self.campaign_ids.contains(&record.campaign_id))
            && self.profit_min.map_or(true, |min| record.profit_loss >= min)
            && self.profit_max.map_or(true, |max| record.profit_loss <= max)
    }
}

/// Report ordering: date, then campaign id, then the remaining fields so that
/// rows sharing a (date, campaign) key still land in a fixed order.
pub fn report_order(a: &MergedRecord, b: &MergedRecord) -> Ordering {
    a.date
        .cmp(&b.date)
        .then(a.campaign_id.cmp(&b.campaign_id))
        .then_with(|| a.campaign_name.cmp(&b.campaign_name))
        .then_with(|| a.spend.total_cmp(&b.spend))
        .then_with(|| a.revenue.total_cmp(&b.revenue))
        .then_with(|| a.cpr.total_cmp(&b.cpr))
        .then_with(|| a.total_clicks.cmp(&b.total_clicks))
}

pub fn sort_for_report(records: &mut [MergedRecord]) {
    records.sort_by(report_order);
}

/// Keeps the records matching `spec`, sorted for the report.
pub fn apply_filter(records: &[MergedRecord], spec: &FilterSpec) -> Result<Vec<MergedRecord>> {
    spec.validate()?;

    let mut kept: Vec<MergedRecord> = if spec.is_unrestricted() {
        records.to_vec()
    } else {
        records.iter().filter(|r| spec.matches(r)).cloned().collect()
    };

    sort_for_report(&mut kept);

    debug!("Filter kept {} of {} records", kept.len(), records.len());

    Ok(kept)
}
