use napi::Result as NapiResult;
use napi_derive::napi;

use waterfall_core::api::{self, CalculateRequest};
use waterfall_core::waterfall;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_request(request_json: &str) -> NapiResult<CalculateRequest> {
    serde_json::from_str(request_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Waterfall
// ---------------------------------------------------------------------------

/// Same contract as `POST /api/calculate`: always resolves to a
/// `{"status": ...}` envelope, domain failures included.
#[napi]
pub fn calculate_waterfall(request_json: String) -> NapiResult<String> {
    Ok(api::handle_calculate_json(&request_json))
}

#[napi]
pub fn normalize_transactions(request_json: String) -> NapiResult<String> {
    let request = parse_request(&request_json)?;
    let events = waterfall::normalize_transactions(
        &request.transactions,
        &request.input_commitment_id.as_text(),
        request.settings.amount_convention,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&events).map_err(to_napi_error)
}

#[napi]
pub fn preferred_accrual(request_json: String) -> NapiResult<String> {
    let request = parse_request(&request_json)?;
    let config = request.commitment_config().map_err(to_napi_error)?;
    let output =
        waterfall::calculate_preferred_accrual(&config, &request.transactions, &request.settings)
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
