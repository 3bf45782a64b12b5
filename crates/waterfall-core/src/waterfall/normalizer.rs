//! Validation and canonicalisation of raw transaction records.
//!
//! A batch is either accepted whole or rejected with every offending field
//! listed; rows are never dropped silently.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{RecordIssue, WaterfallError};
use crate::types::*;
use crate::EngineResult;

/// Date layouts accepted for transaction and analysis dates, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

// ---------------------------------------------------------------------------
// Raw input types
// ---------------------------------------------------------------------------

/// A loosely typed scalar: uploads carry amounts and ids either as JSON
/// strings or as JSON numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Text(String),
    Number(serde_json::Number),
}

impl RawField {
    /// Text used to compare identifiers. Numbers are written without
    /// trailing fractional zeros, so `4.0` and `4` both read as `"4"`.
    pub fn as_text(&self) -> String {
        match self {
            RawField::Text(s) => s.trim().to_string(),
            RawField::Number(n) => {
                let raw = n.to_string();
                Decimal::from_str(&raw)
                    .or_else(|_| Decimal::from_scientific(&raw))
                    .map(|d| d.normalize().to_string())
                    .unwrap_or(raw)
            }
        }
    }
}

impl fmt::Display for RawField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawField::Text(s) => f.write_str(s),
            RawField::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for RawField {
    fn from(s: &str) -> Self {
        RawField::Text(s.to_string())
    }
}

impl From<String> for RawField {
    fn from(s: String) -> Self {
        RawField::Text(s)
    }
}

/// An un-validated transaction row as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub transaction_date: String,
    pub transaction_amount: RawField,
    pub contribution_or_distribution: String,
    pub commitment_id: RawField,
}

// ---------------------------------------------------------------------------
// Field parsers
// ---------------------------------------------------------------------------

/// Parse a free-form date. Accepts ISO, US `MM/DD/YYYY`, `YYYY/MM/DD` and
/// date-times (only the date part is kept).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or(trimmed);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Parse a numeric-looking amount such as `$1,250,000.00` or `(500)`.
/// Parentheses denote a negative number. Returns the signed value.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();

    let (negative, body) = match cleaned
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };
    if body.is_empty() {
        return None;
    }

    let value = Decimal::from_str(body)
        .or_else(|_| Decimal::from_scientific(body))
        .ok()?;
    Some(if negative { -value } else { value })
}

/// Parse a direction tag (`contribution` / `distribution`, any case).
pub fn parse_kind(raw: &str) -> Option<CashFlowKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "contribution" => Some(CashFlowKind::Contribution),
        "distribution" => Some(CashFlowKind::Distribution),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Normalisation
// ---------------------------------------------------------------------------

/// Validate `records` against `commitment_id` and return the events sorted
/// by date. Records sharing a date keep their input order.
pub fn normalize_transactions(
    records: &[RawTransaction],
    commitment_id: &str,
    convention: AmountConvention,
) -> EngineResult<Vec<CashFlowEvent>> {
    let expected_id = commitment_id.trim();
    let mut issues: Vec<RecordIssue> = Vec::new();
    let mut events: Vec<CashFlowEvent> = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let mut issue = |field: &str, value: String, reason: &str| {
            issues.push(RecordIssue {
                index,
                field: field.to_string(),
                value,
                reason: reason.to_string(),
            });
        };

        let date = parse_date(&record.transaction_date);
        if date.is_none() {
            issue(
                "transaction_date",
                record.transaction_date.clone(),
                "unparseable date",
            );
        }

        let amount_text = record.transaction_amount.to_string();
        let amount = match parse_amount(&amount_text) {
            None => {
                issue("transaction_amount", amount_text, "non-numeric amount");
                None
            }
            Some(v) => match convention {
                AmountConvention::Strict if v <= Decimal::ZERO => {
                    issue("transaction_amount", amount_text, "amount must be positive");
                    None
                }
                AmountConvention::Magnitude if v.is_zero() => {
                    issue("transaction_amount", amount_text, "amount must be non-zero");
                    None
                }
                _ => Some(v.abs()),
            },
        };

        let kind = parse_kind(&record.contribution_or_distribution);
        if kind.is_none() {
            issue(
                "contribution_or_distribution",
                record.contribution_or_distribution.clone(),
                "expected 'contribution' or 'distribution'",
            );
        }

        let record_id = record.commitment_id.as_text();
        if record_id != expected_id {
            issue(
                "commitment_id",
                record_id,
                "does not match the requested commitment",
            );
        }

        if let (Some(date), Some(amount), Some(kind)) = (date, amount, kind) {
            events.push(CashFlowEvent { date, amount, kind });
        }
    }

    if !issues.is_empty() {
        warn!(
            commitment_id = expected_id,
            records = records.len(),
            issues = issues.len(),
            "rejecting transaction batch"
        );
        return Err(WaterfallError::Validation { issues });
    }

    // Vec::sort_by_key is stable
    events.sort_by_key(|e| e.date);
    debug!(
        commitment_id = expected_id,
        events = events.len(),
        "normalised transactions"
    );
    Ok(events)
}
