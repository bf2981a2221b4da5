use crate::schema::{AggregatedRevenue, RevenueEvent};
use crate::utils::canonical_sum;
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeMap;

#[derive(Default)]
struct Group {
    clicks: u64,
    earnings: Vec<f64>,
}

/// Collapses revenue events into one row per (campaign, day), ordered by
/// campaign id then date. The result is identical for any permutation of
/// `events`.
pub fn aggregate_revenue(events: &[RevenueEvent]) -> Vec<AggregatedRevenue> {
    let mut groups: BTreeMap<(i64, NaiveDate), Group> = BTreeMap::new();

    for event in events {
        let group = groups.entry((event.campaign_id, event.date)).or_default();
        group.clicks = group.clicks.saturating_add(event.clicks);
        group.earnings.push(event.earnings);
    }

    debug!(
        "Aggregated {} revenue events into {} (campaign, day) groups",
        events.len(),
        groups.len()
    );

    groups
        .into_iter()
        .map(|((campaign_id, date), mut group)| AggregatedRevenue {
            campaign_id,
            date,
            total_clicks: group.clicks,
            revenue: canonical_sum(&mut group.earnings),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(campaign_id: i64, day: u32, clicks: u64, earnings: f64) -> RevenueEvent {
        RevenueEvent {
            campaign_id,
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            clicks,
            earnings,
        }
    }

    #[test]
    fn test_scenario_two_events_same_key() {
        let aggregated = aggregate_revenue(&[event(42, 5, 10, 150.0), event(42, 5, 5, 50.0)]);

        assert_eq!(aggregated.len(), 1);
        assert_eq!(aggregated[0].campaign_id, 42);
        assert_eq!(
            aggregated[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert_eq!(aggregated[0].total_clicks, 15);
        assert_eq!(aggregated[0].revenue, 200.0);
    }

    #[test]
    fn test_groups_are_keyed_by_campaign_and_day() {
        let aggregated = aggregate_revenue(&[
            event(2, 1, 1, 1.0),
            event(1, 2, 1, 1.0),
            event(1, 1, 1, 1.0),
            event(1, 1, 2, 2.0),
        ]);

        let keys: Vec<(i64, u32)> = aggregated
            .iter()
            .map(|a| (a.campaign_id, chrono::Datelike::day(&a.date)))
            .collect();
        assert_eq!(keys, vec![(1, 1), (1, 2), (2, 1)]);
        assert_eq!(aggregated[0].total_clicks, 3);
        assert_eq!(aggregated[0].revenue, 3.0);
    }

    #[test]
    fn test_zero_groups_are_kept() {
        let aggregated = aggregate_revenue(&[event(9, 3, 0, 0.0)]);
        assert_eq!(aggregated.len(), 1);
        assert_eq!(aggregated[0].total_clicks, 0);
        assert_eq!(aggregated[0].revenue, 0.0);
    }

    #[test]
    fn test_order_independent() {
        let events = vec![
            event(7, 1, 3, 0.1),
            event(7, 1, 4, 0.2),
            event(7, 1, 5, 0.3),
            event(8, 1, 1, 1e-9),
        ];
        let mut reversed = events.clone();
        reversed.reverse();

        assert_eq!(aggregate_revenue(&events), aggregate_revenue(&reversed));
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_revenue(&[]).is_empty());
    }
}
