use crate::schema::SourceKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Required field '{field}' is missing from every {input} row")]
    MissingRequiredField { input: SourceKind, field: String },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Problems confined to a single input row. These exclude the row and are
/// reported through [`crate::Diagnostics`], never returned as `Err`.
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RecordError {
    #[error("No parenthesized campaign id in '{0}'")]
    MalformedCampaignIdentifier(String),

    #[error("Unparseable date '{0}'")]
    MalformedDate(String),

    #[error("Field '{field}' has unparseable value '{value}'")]
    MalformedNumber { field: String, value: String },

    #[error("Field '{field}' is blank")]
    MissingValue { field: String },
}

impl RecordError {
    /// Short stable label used to bucket exclusion counts.
    pub fn class(&self) -> &'static str {
        match self {
            RecordError::MalformedCampaignIdentifier(_) => "malformed_campaign_identifier",
            RecordError::MalformedDate(_) => "malformed_date",
            RecordError::MalformedNumber { .. } => "malformed_number",
            RecordError::MissingValue { .. } => "missing_value",
        }
    }
}
