use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, debug_span};

use super::aggregate::summarize_profit;
use super::normalizer::{normalize_transactions, RawTransaction};
use super::preferred::{accrue_preferred, PreferredAccrual};
use super::tiers::{allocate_tiers, check_fraction, TierAllocations, TierInputs};
use crate::error::WaterfallError;
use crate::time_value::add_money;
use crate::types::*;
use crate::EngineResult;

/// Largest scale a 96-bit decimal mantissa can carry
const MAX_MONEY_SCALE: u32 = 28;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Full waterfall result for one commitment as of the analysis date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterfallResult {
    pub commitment_id: String,
    pub analysis_date: NaiveDate,
    /// Contributions on or before the analysis date
    pub total_commitment: Money,
    /// Distributions on or before the analysis date
    pub total_distributions: Money,
    /// Per-tier LP/GP allocations
    #[serde(flatten)]
    pub tiers: TierAllocations,
    /// LP share of tiers 2-4
    pub total_lp_profit: Money,
    /// GP share of tiers 2-4
    pub total_gp_profit: Money,
    /// GP share of total profit (decimal)
    pub profit_split_percentage: Rate,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Reject out-of-range commitment terms before any work is done.
pub fn validate_config(config: &CommitmentConfig, settings: &EngineSettings) -> EngineResult<()> {
    if config.preferred_rate < Decimal::ZERO {
        return Err(WaterfallError::configuration(
            "pref_irr",
            "Preferred return rate cannot be negative",
        ));
    }
    check_fraction("carried_interest_percentage", config.carried_interest_fraction)?;
    check_fraction("catch_up_rate", config.catchup_fraction)?;
    if settings.money_scale > MAX_MONEY_SCALE {
        return Err(WaterfallError::configuration(
            "money_scale",
            format!("must be at most {MAX_MONEY_SCALE}"),
        ));
    }
    Ok(())
}

/// Calculate the distribution waterfall from raw transaction records.
///
/// Validates the commitment terms, normalises the records (rejecting the
/// whole batch on any bad row), then runs [`run_waterfall`].
pub fn calculate_waterfall(
    config: &CommitmentConfig,
    transactions: &[RawTransaction],
    settings: &EngineSettings,
) -> EngineResult<ComputationOutput<WaterfallResult>> {
    validate_config(config, settings)?;
    let events = normalize_transactions(
        transactions,
        &config.commitment_id,
        settings.amount_convention,
    )?;
    run_waterfall(config, &events, settings)
}

/// Calculate the distribution waterfall from date-ordered events.
///
/// Events dated after the analysis date are excluded (and reported as a
/// warning). The preferred-return cap comes from [`accrue_preferred`]; the
/// pool of total distributions then runs through the four tiers.
pub fn run_waterfall(
    config: &CommitmentConfig,
    events: &[CashFlowEvent],
    settings: &EngineSettings,
) -> EngineResult<ComputationOutput<WaterfallResult>> {
    let start = Instant::now();
    let _span = debug_span!("waterfall", commitment_id = %config.commitment_id).entered();
    let mut warnings: Vec<String> = Vec::new();

    validate_config(config, settings)?;

    let mut total_commitment = Decimal::ZERO;
    let mut total_distributions = Decimal::ZERO;
    let mut excluded = 0usize;
    for event in events {
        if event.date > config.analysis_date {
            excluded += 1;
            continue;
        }
        match event.kind {
            CashFlowKind::Contribution => {
                total_commitment = add_money(total_commitment, event.amount, "total commitment")?
            }
            CashFlowKind::Distribution => {
                total_distributions =
                    add_money(total_distributions, event.amount, "total distributions")?
            }
        }
    }

    if excluded > 0 {
        warnings.push(format!(
            "{excluded} transaction(s) dated after the analysis date {} were excluded",
            config.analysis_date
        ));
    }
    if total_commitment.is_zero() && !total_distributions.is_zero() {
        warnings.push(
            "No contributions on or before the analysis date; all distributions are profit"
                .into(),
        );
    }

    let accrual = accrue_preferred(
        events,
        config.analysis_date,
        config.preferred_rate,
        settings,
    )?;

    let tiers = allocate_tiers(&TierInputs {
        total_commitment,
        total_distributions,
        preferred_hurdle: accrual.accrued_preferred,
        carried_interest_fraction: config.carried_interest_fraction,
        catchup_fraction: config.catchup_fraction,
    })?;
    let profit = summarize_profit(&tiers)?;

    if tiers.preferred_return.lp < accrual.accrued_preferred {
        warnings.push(format!(
            "Preferred return not fully paid: {} accrued, {} distributed in tier 2",
            accrual.accrued_preferred, tiers.preferred_return.lp
        ));
    }

    debug!(
        %total_commitment,
        %total_distributions,
        hurdle = %accrual.accrued_preferred,
        gp_profit = %profit.total_gp_profit,
        "waterfall allocated"
    );

    let output = WaterfallResult {
        commitment_id: config.commitment_id.clone(),
        analysis_date: config.analysis_date,
        total_commitment,
        total_distributions,
        tiers,
        total_lp_profit: profit.total_lp_profit,
        total_gp_profit: profit.total_gp_profit,
        profit_split_percentage: profit.profit_split_percentage,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "PE Distribution Waterfall (European, compounding preferred return)",
        &serde_json::json!({
            "preferred_rate": config.preferred_rate.to_string(),
            "carried_interest_fraction": config.carried_interest_fraction.to_string(),
            "catchup_fraction": config.catchup_fraction.to_string(),
            "preferred_hurdle": accrual.accrued_preferred.to_string(),
            "distribution_order": settings.distribution_order,
            "money_scale": settings.money_scale,
            "events_used": events.len() - excluded,
            "events_excluded": excluded,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Preferred-return accrual schedule for raw transaction records.
pub fn calculate_preferred_accrual(
    config: &CommitmentConfig,
    transactions: &[RawTransaction],
    settings: &EngineSettings,
) -> EngineResult<ComputationOutput<PreferredAccrual>> {
    let start = Instant::now();
    validate_config(config, settings)?;
    let events = normalize_transactions(
        transactions,
        &config.commitment_id,
        settings.amount_convention,
    )?;
    let accrual = accrue_preferred(
        &events,
        config.analysis_date,
        config.preferred_rate,
        settings,
    )?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Preferred return accrual (ACT/365F, compounding on outstanding capital)",
        &serde_json::json!({
            "preferred_rate": config.preferred_rate.to_string(),
            "distribution_order": settings.distribution_order,
            "money_scale": settings.money_scale,
        }),
        Vec::new(),
        elapsed,
        accrual,
    ))
}
