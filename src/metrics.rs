use crate::merge::JoinedRecord;
use crate::schema::MergedRecord;
use crate::utils::ratio_or_zero;

/// Revenue per click. Zero clicks, or any non-finite quotient, yields exactly 0.0.
pub fn revenue_per_click(revenue: f64, total_clicks: u64) -> f64 {
    if total_clicks == 0 {
        return 0.0;
    }
    ratio_or_zero(revenue, total_clicks)
}

pub fn profit_loss(revenue: f64, spend: f64) -> f64 {
    revenue - spend
}

pub fn derive_metrics(joined: JoinedRecord) -> MergedRecord {
    let rpc = revenue_per_click(joined.revenue, joined.total_clicks);
    let profit_loss = profit_loss(joined.revenue, joined.spend);

    MergedRecord {
        campaign_id: joined.campaign_id,
        campaign_name: joined.campaign_name,
        date: joined.date,
        spend: joined.spend,
        revenue: joined.revenue,
        total_clicks: joined.total_clicks,
        cpr: joined.cpr,
        rpc,
        profit_loss,
    }
}

pub fn derive_all(joined: Vec<JoinedRecord>) -> Vec<MergedRecord> {
    joined.into_iter().map(derive_metrics).collect()
}
