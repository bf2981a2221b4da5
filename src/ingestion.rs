//! Tabular input handling.
//!
//! Spend exports and revenue logs arrive as header-keyed tables. A [`RawTable`]
//! keeps every cell as text so that parsing failures can be reported per row
//! instead of failing the whole file. Columns are located through
//! [`FieldAliases`], an ordered list of accepted header names.

use crate::error::Result;
use csv::{ByteRecord, ReaderBuilder};
use log::debug;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Accepted header names for one logical field, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAliases {
    pub canonical: &'static str,
    pub accepted: &'static [&'static str],
}

pub const SPEND_AD_SET_NAME: FieldAliases = FieldAliases {
    canonical: "ad_set_name",
    accepted: &["Ad set name", "ad_set_name"],
};

pub const SPEND_DAY: FieldAliases = FieldAliases {
    canonical: "day",
    accepted: &["Day", "date"],
};

pub const SPEND_AMOUNT: FieldAliases = FieldAliases {
    canonical: "amount_spent",
    accepted: &["Amount spent (USD)", "amount_spent", "Spend"],
};

/// Cost-per-result: the current export name wins over the legacy one.
pub const SPEND_COST_PER_RESULT: FieldAliases = FieldAliases {
    canonical: "cost_per_result",
    accepted: &["Cost per result", "Cost per purchase"],
};

pub const REVENUE_CAMPAIGN_ID: FieldAliases = FieldAliases {
    canonical: "campaign_id",
    accepted: &["campid", "campaign_id"],
};

pub const REVENUE_DATE: FieldAliases = FieldAliases {
    canonical: "date",
    accepted: &["date"],
};

pub const REVENUE_CLICKS: FieldAliases = FieldAliases {
    canonical: "clicks",
    accepted: &["clicks"],
};

pub const REVENUE_EARNINGS: FieldAliases = FieldAliases {
    canonical: "earnings",
    accepted: &["estimated_earnings", "earnings"],
};

fn decode_cells(record: &ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|cell| String::from_utf8_lossy(cell).into_owned())
        .collect()
}

fn header_key(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// A header-keyed table of text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Builds a table from already-materialized cells. Short rows are padded
    /// with blanks; cells beyond the header width are dropped.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Self { headers, rows }
    }

    /// Reads a CSV export. Cells are decoded leniently: bytes that are not
    /// valid UTF-8 (e.g. a Windows-1252 export) become U+FFFD, so one badly
    /// encoded cell is judged by the normalizer row by row instead of failing
    /// the whole file. Only I/O failures are fatal here.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers = decode_cells(rdr.byte_headers()?);
        let mut rows = Vec::new();
        let mut record = ByteRecord::new();
        while rdr.read_byte_record(&mut record)? {
            rows.push(decode_cells(&record));
        }

        debug!(
            "Read CSV table with {} columns and {} rows",
            headers.len(),
            rows.len()
        );

        Ok(Self::new(headers, rows))
    }

    pub fn from_csv_str(text: &str) -> Result<Self> {
        Self::from_csv_reader(text.as_bytes())
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Concatenates tables of the same kind. The result carries the union of
    /// all headers (matched case-insensitively); cells a table lacks are blank.
    pub fn concat<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = RawTable>,
    {
        let mut headers: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut rows: Vec<Vec<String>> = Vec::new();

        for table in tables {
            let mapping: Vec<usize> = table
                .headers
                .iter()
                .map(|header| {
                    *positions.entry(header_key(header)).or_insert_with(|| {
                        headers.push(header.clone());
                        headers.len() - 1
                    })
                })
                .collect();

            for row in table.rows {
                let mut merged = vec![String::new(); headers.len()];
                for (cell, &target) in row.into_iter().zip(&mapping) {
                    merged[target] = cell;
                }
                rows.push(merged);
            }
        }

        Self::new(headers, rows)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True for a table with neither headers nor rows, i.e. no source supplied.
    pub fn is_vacant(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    /// Column positions carrying `field`, in alias priority order.
    pub fn resolve(&self, field: &FieldAliases) -> Vec<usize> {
        field
            .accepted
            .iter()
            .filter_map(|name| {
                let wanted = header_key(name);
                self.headers.iter().position(|h| header_key(h) == wanted)
            })
            .collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = RawRow<'_>> {
        self.rows.iter().map(move |cells| RawRow {
            headers: &self.headers,
            cells,
        })
    }
}

/// A borrowed view of one row of a [`RawTable`].
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    headers: &'a [String],
    cells: &'a [String],
}

impl<'a> RawRow<'a> {
    /// The trimmed cell at `idx`, or `None` when it is blank or out of range.
    pub fn cell(&self, idx: usize) -> Option<&'a str> {
        let cells: &'a [String] = self.cells;
        cells
            .get(idx)
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
    }

    /// First non-blank cell among `columns`, trimmed.
    pub fn first_present(&self, columns: &[usize]) -> Option<&'a str> {
        columns.iter().find_map(|&idx| self.cell(idx))
    }

    /// Compact `header=value` rendering of the non-blank cells, for diagnostics.
    pub fn render(&self) -> String {
        self.headers
            .iter()
            .zip(self.cells)
            .filter(|(_, cell)| !cell.trim().is_empty())
            .map(|(header, cell)| format!("{}={}", header.trim(), cell.trim()))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_csv_str() {
        let table = RawTable::from_csv_str(
            "Ad set name,Day,Amount spent (USD)\n\"Promo, Spring (42)\",2024-01-05,100\n",
        )
        .unwrap();

        assert_eq!(table.headers().len(), 3);
        assert_eq!(table.len(), 1);

        let name_cols = table.resolve(&SPEND_AD_SET_NAME);
        let row = table.rows().next().unwrap();
        assert_eq!(row.first_present(&name_cols), Some("Promo, Spring (42)"));
    }

    #[test]
    fn test_resolve_is_case_insensitive_and_ordered() {
        let table = RawTable::new(
            vec![
                "cost per purchase".to_string(),
                " COST PER RESULT ".to_string(),
            ],
            vec![],
        );

        assert_eq!(table.resolve(&SPEND_COST_PER_RESULT), vec![1, 0]);
        assert!(table.resolve(&SPEND_AMOUNT).is_empty());
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = RawTable::from_csv_str("campid,date,clicks,estimated_earnings\n42,2024-01-05\n")
            .unwrap();

        let clicks = table.resolve(&REVENUE_CLICKS);
        let row = table.rows().next().unwrap();
        assert_eq!(row.first_present(&clicks), None);
    }

    #[test]
    fn test_concat_unions_headers() {
        let first = RawTable::from_csv_str("Ad set name,Day,Cost per purchase\nA (1),2024-01-01,2\n")
            .unwrap();
        let second =
            RawTable::from_csv_str("ad set name,Day,Cost per result\nB (2),2024-01-02,3\n").unwrap();

        let combined = RawTable::concat(vec![first, second]);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined.headers().len(), 4);

        let cpr = combined.resolve(&SPEND_COST_PER_RESULT);
        let values: Vec<Option<&str>> = combined
            .rows()
            .map(|row| row.first_present(&cpr))
            .collect();
        assert_eq!(values, vec![Some("2"), Some("3")]);
    }

    #[test]
    fn test_render_skips_blank_cells() {
        let table = RawTable::new(
            vec!["Ad set name".to_string(), "Day".to_string()],
            vec![vec!["No Parens Here".to_string(), " ".to_string()]],
        );
        let row = table.rows().next().unwrap();
        assert_eq!(row.render(), "Ad set name=No Parens Here");
    }

    #[test]
    fn test_invalid_utf8_row_is_decoded_lossily() {
        let mut bytes = b"Ad set name,Day,Amount spent (USD)\nPromo (42),2024-01-05,100\n".to_vec();
        bytes.extend_from_slice(b"Caf\xe9 (7),2024-01-05,10\n");

        let table = RawTable::from_csv_reader(bytes.as_slice()).unwrap();
        assert_eq!(table.len(), 2);

        let names = table.resolve(&SPEND_AD_SET_NAME);
        let values: Vec<Option<&str>> = table.rows().map(|row| row.first_present(&names)).collect();
        assert_eq!(values, vec![Some("Promo (42)"), Some("Caf\u{fffd} (7)")]);
    }

    #[test]
    fn test_ragged_rows_are_kept() {
        let table = RawTable::from_csv_str(
            "campid,date,clicks,estimated_earnings\n\
             42,2024-01-05,10,150,extra,cells\n\
             43\n\
             44,2024-01-05,1,2\n",
        )
        .unwrap();

        assert_eq!(table.len(), 3);
        let earnings = table.resolve(&REVENUE_EARNINGS);
        let values: Vec<Option<&str>> = table.rows().map(|row| row.first_present(&earnings)).collect();
        assert_eq!(values, vec![Some("150"), None, Some("2")]);
    }

    #[test]
    fn test_vacant_table() {
        assert!(RawTable::default().is_vacant());
        assert!(RawTable::concat(Vec::new()).is_vacant());
        let headers_only = RawTable::from_csv_str("campid,date,clicks,estimated_earnings\n").unwrap();
        assert!(!headers_only.is_vacant());
        assert!(headers_only.is_empty());
    }
}
