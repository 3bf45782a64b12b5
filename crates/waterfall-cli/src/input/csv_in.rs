use serde::Deserialize;

use waterfall_core::waterfall::{RawField, RawTransaction};

use super::file::resolve_path;

/// One row of the transactions upload. Every column is kept as text; the
/// engine's normalizer does the validation.
#[derive(Debug, Deserialize)]
struct CsvRow {
    transaction_date: String,
    transaction_amount: String,
    contribution_or_distribution: String,
    commitment_id: String,
}

impl From<CsvRow> for RawTransaction {
    fn from(row: CsvRow) -> Self {
        RawTransaction {
            transaction_date: row.transaction_date,
            transaction_amount: RawField::Text(row.transaction_amount),
            contribution_or_distribution: row.contribution_or_distribution,
            commitment_id: RawField::Text(row.commitment_id),
        }
    }
}

/// Read a transactions CSV with a header row. Extra columns are ignored.
pub fn read_transactions(path: &str) -> Result<Vec<RawTransaction>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    parse_rows(reader).map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e).into())
}

fn parse_rows<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<RawTransaction>, csv::Error> {
    reader
        .deserialize::<CsvRow>()
        .map(|row| row.map(RawTransaction::from))
        .collect()
}
