//! Turns raw spend and revenue tables into typed records.
//!
//! Rows that cannot be normalized are excluded individually and returned as
//! [`ExcludedRecord`]s. Only a structurally incompatible table (a required
//! column absent, or blank in every row) fails the whole batch.

use crate::diagnostics::ExcludedRecord;
use crate::error::{RecordError, ReconcileError, Result};
use crate::ingestion::{
    FieldAliases, RawRow, RawTable, REVENUE_CAMPAIGN_ID, REVENUE_CLICKS, REVENUE_DATE,
    REVENUE_EARNINGS, SPEND_AD_SET_NAME, SPEND_AMOUNT, SPEND_COST_PER_RESULT, SPEND_DAY,
};
use crate::schema::{RevenueEvent, SourceKind, SpendRecord};
use crate::utils::{parse_calendar_date, parse_count, parse_decimal};
use chrono::NaiveDate;
use log::debug;
use regex::Regex;
use std::sync::OnceLock;

static CAMPAIGN_ID_PATTERN: OnceLock<Regex> = OnceLock::new();

fn campaign_id_pattern() -> &'static Regex {
    CAMPAIGN_ID_PATTERN.get_or_init(|| Regex::new(r"\(([0-9]+)\)").expect("valid regex"))
}

/// Records that survived normalization plus the rows that did not.
#[derive(Debug, Clone)]
pub struct NormalizedBatch<T> {
    pub records: Vec<T>,
    pub excluded: Vec<ExcludedRecord>,
    pub rows_read: usize,
}

impl<T> NormalizedBatch<T> {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            excluded: Vec::new(),
            rows_read: 0,
        }
    }
}

/// Extracts the campaign id from the first parenthesized run of ASCII digits
/// in an ad set name, e.g. `"Summer Promo (12345)"` -> `12345`. A group that
/// overflows `i64` is skipped in favor of the next one.
pub fn extract_campaign_id(ad_set_name: &str) -> std::result::Result<i64, RecordError> {
    campaign_id_pattern()
        .captures_iter(ad_set_name)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| m.as_str().parse::<i64>().ok())
        .ok_or_else(|| RecordError::MalformedCampaignIdentifier(ad_set_name.to_string()))
}

/// Resolves cost-per-result from the columns in priority order. The first
/// non-blank, numeric cell wins; a row with none resolves to 0.0.
pub fn resolve_cost_per_result(row: &RawRow<'_>, columns: &[usize]) -> f64 {
    columns
        .iter()
        .filter_map(|&idx| row.cell(idx))
        .find_map(parse_decimal)
        .unwrap_or(0.0)
}

fn required_columns(table: &RawTable, field: &FieldAliases, input: SourceKind) -> Result<Vec<usize>> {
    let columns = table.resolve(field);
    let populated = !columns.is_empty()
        && (table.is_empty() || table.rows().any(|row| row.first_present(&columns).is_some()));

    if populated {
        Ok(columns)
    } else {
        Err(ReconcileError::MissingRequiredField {
            input,
            field: field.canonical.to_string(),
        })
    }
}

fn required_cell<'a>(
    row: &RawRow<'a>,
    columns: &[usize],
    field: &FieldAliases,
) -> std::result::Result<&'a str, RecordError> {
    row.first_present(columns)
        .ok_or_else(|| RecordError::MissingValue {
            field: field.canonical.to_string(),
        })
}

fn parse_date_cell(raw: &str) -> std::result::Result<NaiveDate, RecordError> {
    parse_calendar_date(raw).ok_or_else(|| RecordError::MalformedDate(raw.to_string()))
}

fn parse_amount_cell(raw: &str, field: &FieldAliases) -> std::result::Result<f64, RecordError> {
    parse_decimal(raw)
        .filter(|v| *v >= 0.0)
        .ok_or_else(|| RecordError::MalformedNumber {
            field: field.canonical.to_string(),
            value: raw.to_string(),
        })
}

struct SpendColumns {
    name: Vec<usize>,
    day: Vec<usize>,
    amount: Vec<usize>,
    cost_per_result: Vec<usize>,
}

impl SpendColumns {
    fn normalize(&self, row: &RawRow<'_>) -> std::result::Result<SpendRecord, RecordError> {
        let ad_set_name = required_cell(row, &self.name, &SPEND_AD_SET_NAME)?;
        let campaign_id = extract_campaign_id(ad_set_name)?;
        let date = parse_date_cell(required_cell(row, &self.day, &SPEND_DAY)?)?;
        let amount_spent =
            parse_amount_cell(required_cell(row, &self.amount, &SPEND_AMOUNT)?, &SPEND_AMOUNT)?;

        Ok(SpendRecord {
            campaign_id,
            ad_set_name: ad_set_name.to_string(),
            date,
            amount_spent,
            cost_per_result: resolve_cost_per_result(row, &self.cost_per_result),
        })
    }
}

pub fn normalize_spend(table: &RawTable) -> Result<NormalizedBatch<SpendRecord>> {
    if table.is_vacant() {
        return Ok(NormalizedBatch::empty());
    }

    let columns = SpendColumns {
        name: required_columns(table, &SPEND_AD_SET_NAME, SourceKind::Spend)?,
        day: required_columns(table, &SPEND_DAY, SourceKind::Spend)?,
        amount: required_columns(table, &SPEND_AMOUNT, SourceKind::Spend)?,
        cost_per_result: table.resolve(&SPEND_COST_PER_RESULT),
    };

    let mut batch = NormalizedBatch::empty();
    for (idx, row) in table.rows().enumerate() {
        batch.rows_read += 1;
        match columns.normalize(&row) {
            Ok(record) => batch.records.push(record),
            Err(error) => batch.excluded.push(ExcludedRecord {
                source: SourceKind::Spend,
                row: idx + 1,
                error,
                raw: row.render(),
            }),
        }
    }

    debug!(
        "Normalized {} of {} spend rows",
        batch.records.len(),
        batch.rows_read
    );

    Ok(batch)
}

fn parse_campaign_id_cell(raw: &str) -> std::result::Result<i64, RecordError> {
    raw.parse::<i64>()
        .ok()
        .or_else(|| parse_count(raw).and_then(|v| i64::try_from(v).ok()))
        .ok_or_else(|| RecordError::MalformedCampaignIdentifier(raw.to_string()))
}

struct RevenueColumns {
    campaign_id: Vec<usize>,
    date: Vec<usize>,
    clicks: Vec<usize>,
    earnings: Vec<usize>,
}

impl RevenueColumns {
    fn normalize(&self, row: &RawRow<'_>) -> std::result::Result<RevenueEvent, RecordError> {
        let campaign_id =
            parse_campaign_id_cell(required_cell(row, &self.campaign_id, &REVENUE_CAMPAIGN_ID)?)?;
        let date = parse_date_cell(required_cell(row, &self.date, &REVENUE_DATE)?)?;

        let raw_clicks = required_cell(row, &self.clicks, &REVENUE_CLICKS)?;
        let clicks = parse_count(raw_clicks).ok_or_else(|| RecordError::MalformedNumber {
            field: REVENUE_CLICKS.canonical.to_string(),
            value: raw_clicks.to_string(),
        })?;

        let earnings = parse_amount_cell(
            required_cell(row, &self.earnings, &REVENUE_EARNINGS)?,
            &REVENUE_EARNINGS,
        )?;

        Ok(RevenueEvent {
            campaign_id,
            date,
            clicks,
            earnings,
        })
    }
}

pub fn normalize_revenue(table: &RawTable) -> Result<NormalizedBatch<RevenueEvent>> {
    if table.is_vacant() {
        return Ok(NormalizedBatch::empty());
    }

    let columns = RevenueColumns {
        campaign_id: required_columns(table, &REVENUE_CAMPAIGN_ID, SourceKind::Revenue)?,
        date: required_columns(table, &REVENUE_DATE, SourceKind::Revenue)?,
        clicks: required_columns(table, &REVENUE_CLICKS, SourceKind::Revenue)?,
        earnings: required_columns(table, &REVENUE_EARNINGS, SourceKind::Revenue)?,
    };

    let mut batch = NormalizedBatch::empty();
    for (idx, row) in table.rows().enumerate() {
        batch.rows_read += 1;
        match columns.normalize(&row) {
            Ok(event) => batch.records.push(event),
            Err(error) => batch.excluded.push(ExcludedRecord {
                source: SourceKind::Revenue,
                row: idx + 1,
                error,
                raw: row.render(),
            }),
        }
    }

    debug!(
        "Normalized {} of {} revenue rows",
        batch.records.len(),
        batch.rows_read
    );

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spend_table(csv: &str) -> RawTable {
        RawTable::from_csv_str(csv).unwrap()
    }

    #[test]
    fn test_extract_campaign_id() {
        assert_eq!(extract_campaign_id("Summer Promo (12345)"), Ok(12345));
        assert_eq!(extract_campaign_id("(7) Leading"), Ok(7));
        assert_eq!(extract_campaign_id("Promo (abc) (42) (43)"), Ok(42));
        assert_eq!(
            extract_campaign_id("No Parens Here"),
            Err(RecordError::MalformedCampaignIdentifier(
                "No Parens Here".to_string()
            ))
        );
        assert!(extract_campaign_id("Empty ()").is_err());
        assert!(extract_campaign_id("Overflow (99999999999999999999999)").is_err());
    }

    #[test]
    fn test_extract_campaign_id_ascii_digits_only() {
        assert_eq!(extract_campaign_id("Promo (\u{664}\u{662}) (42)"), Ok(42));
        assert!(extract_campaign_id("Promo (\u{664}\u{662})").is_err());
        assert_eq!(extract_campaign_id("Caf\u{fffd} (7)"), Ok(7));
    }

    #[test]
    fn test_badly_encoded_row_does_not_block_others() {
        let mut bytes = b"Ad set name,Day,Amount spent (USD)\n\
                          Promo (42),2024-01-05,100\n"
            .to_vec();
        bytes.extend_from_slice(b"Caf\xe9 (7),2024-01-05,10\n");
        bytes.extend_from_slice(b"\xff\xfe,2024-01-05,10\n");

        let table = RawTable::from_csv_reader(bytes.as_slice()).unwrap();
        let batch = normalize_spend(&table).unwrap();

        let ids: Vec<i64> = batch.records.iter().map(|r| r.campaign_id).collect();
        assert_eq!(ids, vec![42, 7]);
        assert_eq!(batch.excluded.len(), 1);
        assert_eq!(batch.excluded[0].row, 3);
        assert_eq!(batch.excluded[0].error.class(), "malformed_campaign_identifier");
    }

    #[test]
    fn test_normalize_spend_scenario() {
        let table = spend_table("Ad set name,Day,Amount spent (USD)\nPromo (42),2024-01-05,100\n");
        let batch = normalize_spend(&table).unwrap();

        assert_eq!(batch.rows_read, 1);
        assert!(batch.excluded.is_empty());
        let record = &batch.records[0];
        assert_eq!(record.campaign_id, 42);
        assert_eq!(record.ad_set_name, "Promo (42)");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(record.amount_spent, 100.0);
        assert_eq!(record.cost_per_result, 0.0);
    }

    #[test]
    fn test_malformed_rows_are_excluded_not_fatal() {
        let table = spend_table(
            "Ad set name,Day,Amount spent (USD)\n\
             No Parens Here,2024-01-05,10\n\
             Good (1),not-a-date,10\n\
             Good (2),2024-01-05,abc\n\
             Good (3),2024-01-05,\n\
             Good (4),2024-01-05 13:45:00,25\n",
        );
        let batch = normalize_spend(&table).unwrap();

        assert_eq!(batch.rows_read, 5);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].campaign_id, 4);

        let classes: Vec<&str> = batch.excluded.iter().map(|e| e.error.class()).collect();
        assert_eq!(
            classes,
            vec![
                "malformed_campaign_identifier",
                "malformed_date",
                "malformed_number",
                "missing_value"
            ]
        );
        assert_eq!(batch.excluded[0].row, 1);
        assert_eq!(batch.excluded[0].source, SourceKind::Spend);
    }

    #[test]
    fn test_negative_spend_is_rejected() {
        let table = spend_table("Ad set name,Day,Amount spent (USD)\nA (1),2024-01-05,-5\n");
        let batch = normalize_spend(&table).unwrap();
        assert!(batch.records.is_empty());
        assert_eq!(batch.excluded[0].error.class(), "malformed_number");
    }

    #[test]
    fn test_cost_per_result_priority() {
        let table = spend_table(
            "Ad set name,Day,Amount spent (USD),Cost per purchase,Cost per result\n\
             A (1),2024-01-05,10,9.5,1.25\n\
             B (2),2024-01-05,10,9.5,\n\
             C (3),2024-01-05,10,,\n\
             D (4),2024-01-05,10,2.0,--\n",
        );
        let batch = normalize_spend(&table).unwrap();
        let cprs: Vec<f64> = batch.records.iter().map(|r| r.cost_per_result).collect();
        assert_eq!(cprs, vec![1.25, 9.5, 0.0, 2.0]);
    }

    #[test]
    fn test_missing_spend_column_is_fatal() {
        let table = spend_table("Ad set name,Day\nA (1),2024-01-05\n");
        let err = normalize_spend(&table).unwrap_err();
        match err {
            ReconcileError::MissingRequiredField { input, field } => {
                assert_eq!(input, SourceKind::Spend);
                assert_eq!(field, "amount_spent");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_in_every_row_is_fatal() {
        let table = spend_table("Ad set name,Day,Amount spent (USD)\nA (1),2024-01-05,\nB (2),2024-01-06,\n");
        assert!(matches!(
            normalize_spend(&table),
            Err(ReconcileError::MissingRequiredField { .. })
        ));
    }

    #[test]
    fn test_vacant_tables_normalize_to_nothing() {
        let spend = normalize_spend(&RawTable::default()).unwrap();
        assert!(spend.records.is_empty());
        let revenue = normalize_revenue(&RawTable::default()).unwrap();
        assert!(revenue.records.is_empty());
    }

    #[test]
    fn test_normalize_revenue() {
        let table = RawTable::from_csv_str(
            "campid,date,clicks,estimated_earnings\n\
             42,2024-01-05,10,150\n\
             42,2024-01-05,5.0,50\n\
             x42,2024-01-05,5,50\n\
             43,2024-01-05,2.5,50\n",
        )
        .unwrap();
        let batch = normalize_revenue(&table).unwrap();

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[1].clicks, 5);
        assert_eq!(batch.excluded.len(), 2);
        assert_eq!(batch.excluded[0].error.class(), "malformed_campaign_identifier");
        assert_eq!(batch.excluded[1].error.class(), "malformed_number");
        assert_eq!(batch.excluded[1].row, 4);
    }

    #[test]
    fn test_missing_revenue_column_is_fatal() {
        let table = RawTable::from_csv_str("campid,date,estimated_earnings\n42,2024-01-05,1\n").unwrap();
        let err = normalize_revenue(&table).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Required field 'clicks' is missing from every revenue row"
        );
    }
}
