//! Wire request/response for the `/api/calculate` contract.
//!
//! [`handle_calculate_json`] is the whole surface a serving layer needs: it
//! takes the request body and always returns a response body, with failures
//! encoded as `status: "error"` rather than a partial payload.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{RecordIssue, WaterfallError};
use crate::types::*;
use crate::waterfall::normalizer::{parse_date, RawField, RawTransaction};
use crate::waterfall::{calculate_waterfall, WaterfallResult};
use crate::EngineResult;

/// Calculation request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub input_commitment_id: RawField,
    /// Analysis date, any format the normalizer accepts
    pub input_date: String,
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
    /// Annual preferred return rate
    pub pref_irr: Rate,
    pub carried_interest_percentage: Rate,
    pub catch_up_rate: Rate,
    #[serde(flatten)]
    pub settings: EngineSettings,
}

impl CalculateRequest {
    /// Commitment terms carried by this request.
    pub fn commitment_config(&self) -> EngineResult<CommitmentConfig> {
        let analysis_date = parse_date(&self.input_date).ok_or_else(|| {
            WaterfallError::configuration(
                "input_date",
                format!("unparseable date '{}'", self.input_date),
            )
        })?;
        Ok(CommitmentConfig {
            commitment_id: self.input_commitment_id.as_text(),
            analysis_date,
            preferred_rate: self.pref_irr,
            carried_interest_fraction: self.carried_interest_percentage,
            catchup_fraction: self.catch_up_rate,
        })
    }
}

/// Machine-readable failure description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// `validation_error`, `configuration_error`, `computation_error` or `request_error`
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<RecordIssue>,
}

impl From<&WaterfallError> for ErrorBody {
    fn from(e: &WaterfallError) -> Self {
        let issues = match e {
            WaterfallError::Validation { issues } => issues.clone(),
            _ => Vec::new(),
        };
        ErrorBody {
            kind: e.kind().to_string(),
            message: e.to_string(),
            issues,
        }
    }
}

/// Calculation response body, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CalculateResponse {
    Ok { data: WaterfallResult },
    Error { error: ErrorBody },
}

impl CalculateResponse {
    pub fn is_ok(&self) -> bool {
        matches!(self, CalculateResponse::Ok { .. })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({
                "status": "error",
                "error": { "kind": "computation_error", "message": e.to_string() },
            })
            .to_string()
        })
    }
}

impl From<WaterfallError> for CalculateResponse {
    fn from(e: WaterfallError) -> Self {
        CalculateResponse::Error {
            error: ErrorBody::from(&e),
        }
    }
}

/// Run one calculation request.
pub fn handle_calculate(request: &CalculateRequest) -> CalculateResponse {
    let outcome = request.commitment_config().and_then(|config| {
        calculate_waterfall(&config, &request.transactions, &request.settings)
    });

    match outcome {
        Ok(output) => {
            for warning in &output.warnings {
                debug!(%warning, "calculation warning");
            }
            CalculateResponse::Ok {
                data: output.result,
            }
        }
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "calculation failed");
            e.into()
        }
    }
}

/// Parse a JSON request body, run it, and serialise the response.
pub fn handle_calculate_json(body: &str) -> String {
    let response = match serde_json::from_str::<CalculateRequest>(body) {
        Ok(request) => handle_calculate(&request),
        Err(e) => WaterfallError::from(e).into(),
    };
    response.to_json()
}
