use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::tiers::{Tier, TierAllocations};
use crate::error::WaterfallError;
use crate::time_value::add_money;
use crate::types::*;
use crate::EngineResult;

/// Profit totals derived from the tier allocations. Return of capital is
/// not profit and is excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitSummary {
    pub total_lp_profit: Money,
    pub total_gp_profit: Money,
    /// GP share of total profit; 0 when there is no profit
    pub profit_split_percentage: Rate,
}

pub fn summarize_profit(allocations: &TierAllocations) -> EngineResult<ProfitSummary> {
    let (total_lp_profit, total_gp_profit) = allocations
        .iter()
        .filter(|(tier, _)| *tier != Tier::ReturnOfCapital)
        .try_fold((Decimal::ZERO, Decimal::ZERO), |(lp, gp), (_, a)| {
            Ok::<_, WaterfallError>((
                add_money(lp, a.lp, "LP profit")?,
                add_money(gp, a.gp, "GP profit")?,
            ))
        })?;

    let total_profit = add_money(total_lp_profit, total_gp_profit, "total profit")?;
    let profit_split_percentage = if total_profit.is_zero() {
        Decimal::ZERO
    } else {
        total_gp_profit / total_profit
    };

    Ok(ProfitSummary {
        total_lp_profit,
        total_gp_profit,
        profit_split_percentage,
    })
}
