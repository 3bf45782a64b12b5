use chrono::NaiveDate;
use rust_decimal::prelude::RoundingStrategy;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::WaterfallError;
use crate::types::{Money, Rate, Years};
use crate::EngineResult;

/// Actual/365 Fixed day-count denominator
const DAYS_PER_YEAR: Decimal = dec!(365);

/// Year fraction between two dates, actual days over a 365-day year.
/// Negative when `end` precedes `start`.
pub fn year_fraction(start: NaiveDate, end: NaiveDate) -> Years {
    Decimal::from((end - start).num_days()) / DAYS_PER_YEAR
}

/// Compound growth factor `(1 + rate)^years`.
pub fn growth_factor(rate: Rate, years: Years) -> EngineResult<Decimal> {
    if rate <= dec!(-1) {
        return Err(WaterfallError::configuration(
            "rate",
            "Compounding rate must be greater than -100%",
        ));
    }
    if years.is_zero() || rate.is_zero() {
        return Ok(Decimal::ONE);
    }

    (Decimal::ONE + rate)
        .checked_powd(years)
        .ok_or_else(|| {
            WaterfallError::Computation(format!(
                "growth factor overflow for rate {rate} over {years} years"
            ))
        })
}

/// Growth earned by `principal` compounding at `rate` from `start` to `end`.
pub fn compound_growth(
    principal: Money,
    rate: Rate,
    start: NaiveDate,
    end: NaiveDate,
) -> EngineResult<Money> {
    if end < start {
        return Err(WaterfallError::Computation(format!(
            "accrual period runs backwards ({start} -> {end})"
        )));
    }
    if principal.is_zero() || end == start {
        return Ok(Decimal::ZERO);
    }
    let factor = growth_factor(rate, year_fraction(start, end))?;
    principal
        .checked_mul(factor - Decimal::ONE)
        .ok_or_else(|| WaterfallError::Computation("accrued growth overflow".into()))
}

/// `total + amount`, failing instead of overflowing the decimal range.
pub fn add_money(total: Money, amount: Money, what: &str) -> EngineResult<Money> {
    total.checked_add(amount).ok_or_else(|| {
        WaterfallError::Computation(format!("{what} overflowed adding {amount} to {total}"))
    })
}

/// Round a derived money amount to `scale` decimal places, half away from zero.
pub fn round_money(amount: Money, scale: u32) -> Money {
    amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}
