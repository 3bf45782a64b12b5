//! Preferred return (hurdle) accrual.
//!
//! Outstanding capital earns the preferred rate between events on an
//! ACT/365F basis. Distributions pay down unpaid preferred and outstanding
//! capital (order set by [`DistributionOrder`]), which only changes what
//! accrues afterwards: the tier engine allocates cumulative distributions,
//! so its preferred-return cap is the total preferred accrued to date.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::WaterfallError;
use crate::time_value::{add_money, compound_growth, round_money};
use crate::types::*;
use crate::EngineResult;

/// One line of the accrual ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualStep {
    pub date: NaiveDate,
    /// `None` for the final roll-forward to the analysis date
    pub kind: Option<CashFlowKind>,
    pub amount: Money,
    /// Days elapsed since the previous step
    pub days: i64,
    /// Preferred return accrued over those days
    pub growth: Money,
    pub outstanding_capital: Money,
    pub unpaid_preferred: Money,
    pub accrued_preferred: Money,
}

/// Accrual state as of the analysis date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferredAccrual {
    pub as_of: NaiveDate,
    pub preferred_rate: Rate,
    /// Total preferred return accrued over the life of the commitment
    pub accrued_preferred: Money,
    /// Accrued preferred not yet covered by distributions
    pub unpaid_preferred: Money,
    /// Contributed capital not yet covered by distributions
    pub outstanding_capital: Money,
    pub steps: Vec<AccrualStep>,
}

struct Accumulator {
    rate: Rate,
    scale: u32,
    order: DistributionOrder,
    last_date: Option<NaiveDate>,
    outstanding_capital: Money,
    unpaid_preferred: Money,
    accrued_preferred: Money,
    steps: Vec<AccrualStep>,
}

impl Accumulator {
    fn new(rate: Rate, settings: &EngineSettings) -> Self {
        Self {
            rate,
            scale: settings.money_scale,
            order: settings.distribution_order,
            last_date: None,
            outstanding_capital: Decimal::ZERO,
            unpaid_preferred: Decimal::ZERO,
            accrued_preferred: Decimal::ZERO,
            steps: Vec::new(),
        }
    }

    /// Accrue preferred on outstanding capital up to `date`.
    fn roll_forward(&mut self, date: NaiveDate) -> EngineResult<(i64, Money)> {
        let Some(from) = self.last_date else {
            self.last_date = Some(date);
            return Ok((0, Decimal::ZERO));
        };
        if date < from {
            return Err(WaterfallError::Computation(format!(
                "cash-flow events out of date order ({from} then {date})"
            )));
        }

        let growth = round_money(
            compound_growth(self.outstanding_capital, self.rate, from, date)?,
            self.scale,
        );
        self.unpaid_preferred = add_money(self.unpaid_preferred, growth, "unpaid preferred")?;
        self.accrued_preferred = add_money(self.accrued_preferred, growth, "accrued preferred")?;
        self.last_date = Some(date);
        Ok(((date - from).num_days(), growth))
    }

    fn apply(&mut self, event: &CashFlowEvent) -> EngineResult<()> {
        let (days, growth) = self.roll_forward(event.date)?;

        match event.kind {
            CashFlowKind::Contribution => {
                self.outstanding_capital =
                    add_money(self.outstanding_capital, event.amount, "outstanding capital")?
            }
            CashFlowKind::Distribution => match self.order {
                DistributionOrder::PreferredFirst => {
                    let rest = pay_down(&mut self.unpaid_preferred, event.amount);
                    pay_down(&mut self.outstanding_capital, rest);
                }
                DistributionOrder::CapitalFirst => {
                    let rest = pay_down(&mut self.outstanding_capital, event.amount);
                    pay_down(&mut self.unpaid_preferred, rest);
                }
            },
        }

        self.record(event.date, Some(event.kind), event.amount, days, growth);
        Ok(())
    }

    fn record(
        &mut self,
        date: NaiveDate,
        kind: Option<CashFlowKind>,
        amount: Money,
        days: i64,
        growth: Money,
    ) {
        trace!(
            %date,
            ?kind,
            %amount,
            %growth,
            outstanding = %self.outstanding_capital,
            accrued = %self.accrued_preferred,
            "accrual step"
        );
        self.steps.push(AccrualStep {
            date,
            kind,
            amount,
            days,
            growth,
            outstanding_capital: self.outstanding_capital,
            unpaid_preferred: self.unpaid_preferred,
            accrued_preferred: self.accrued_preferred,
        });
    }
}

/// Reduce `balance` by up to `amount`; returns the part of `amount` left over.
fn pay_down(balance: &mut Money, amount: Money) -> Money {
    let applied = amount.min(*balance);
    *balance -= applied;
    amount - applied
}

/// Accrue the LP preferred return over `events` up to `analysis_date`.
///
/// `events` must be in date order (as produced by the normalizer); events
/// dated after `analysis_date` are ignored.
pub fn accrue_preferred(
    events: &[CashFlowEvent],
    analysis_date: NaiveDate,
    preferred_rate: Rate,
    settings: &EngineSettings,
) -> EngineResult<PreferredAccrual> {
    if preferred_rate < Decimal::ZERO {
        return Err(WaterfallError::configuration(
            "pref_irr",
            "Preferred return rate cannot be negative",
        ));
    }

    let mut acc = Accumulator::new(preferred_rate, settings);
    for event in events.iter().take_while(|e| e.date <= analysis_date) {
        acc.apply(event)?;
    }

    if acc.last_date.is_some_and(|d| d < analysis_date) {
        let (days, growth) = acc.roll_forward(analysis_date)?;
        acc.record(analysis_date, None, Decimal::ZERO, days, growth);
    }

    Ok(PreferredAccrual {
        as_of: analysis_date,
        preferred_rate,
        accrued_preferred: acc.accrued_preferred,
        unpaid_preferred: acc.unpaid_preferred,
        outstanding_capital: acc.outstanding_capital,
        steps: acc.steps,
    })
}
