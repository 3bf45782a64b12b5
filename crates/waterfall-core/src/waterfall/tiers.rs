use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::WaterfallError;
use crate::time_value::round_money;
use crate::types::*;
use crate::EngineResult;

/// Decimal places kept for catch-up and carry amounts that do not terminate
/// (a carry of 0.3 makes the catch-up `3/7` of the preferred return).
/// Terminating amounts are never cut, and pool arithmetic stays exact for
/// amounts up to 10^16.
const ALLOCATION_SCALE: u32 = 12;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The four distribution tiers, in allocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    ReturnOfCapital,
    PreferredReturn,
    CatchUp,
    FinalSplit,
}

impl Tier {
    pub const ALL: [Tier; 4] = [
        Tier::ReturnOfCapital,
        Tier::PreferredReturn,
        Tier::CatchUp,
        Tier::FinalSplit,
    ];

    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::ReturnOfCapital => Some(Tier::PreferredReturn),
            Tier::PreferredReturn => Some(Tier::CatchUp),
            Tier::CatchUp => Some(Tier::FinalSplit),
            Tier::FinalSplit => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::ReturnOfCapital => "Return of Capital",
            Tier::PreferredReturn => "Preferred Return",
            Tier::CatchUp => "GP Catch-Up",
            Tier::FinalSplit => "Final Split",
        }
    }
}

/// LP/GP amounts allocated by one tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierAllocation {
    #[serde(rename = "lp_allocation")]
    pub lp: Money,
    #[serde(rename = "gp_allocation")]
    pub gp: Money,
}

impl TierAllocation {
    pub const ZERO: TierAllocation = TierAllocation {
        lp: Decimal::ZERO,
        gp: Decimal::ZERO,
    };

    fn lp_only(amount: Money) -> Self {
        Self {
            lp: amount,
            gp: Decimal::ZERO,
        }
    }

    fn gp_only(amount: Money) -> Self {
        Self {
            lp: Decimal::ZERO,
            gp: amount,
        }
    }

    /// Both shares come out of one pool, so the sum is bounded by it.
    pub fn total(&self) -> Money {
        self.lp.saturating_add(self.gp)
    }

    pub fn is_zero(&self) -> bool {
        self.lp.is_zero() && self.gp.is_zero()
    }
}

/// Allocations for all four tiers, named as on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierAllocations {
    pub return_of_capital: TierAllocation,
    pub preferred_return: TierAllocation,
    pub catch_up: TierAllocation,
    pub final_split: TierAllocation,
}

impl TierAllocations {
    pub fn get(&self, tier: Tier) -> TierAllocation {
        match tier {
            Tier::ReturnOfCapital => self.return_of_capital,
            Tier::PreferredReturn => self.preferred_return,
            Tier::CatchUp => self.catch_up,
            Tier::FinalSplit => self.final_split,
        }
    }

    fn slot(&mut self, tier: Tier) -> &mut TierAllocation {
        match tier {
            Tier::ReturnOfCapital => &mut self.return_of_capital,
            Tier::PreferredReturn => &mut self.preferred_return,
            Tier::CatchUp => &mut self.catch_up,
            Tier::FinalSplit => &mut self.final_split,
        }
    }

    /// Tiers in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (Tier, TierAllocation)> + '_ {
        Tier::ALL.into_iter().map(move |t| (t, self.get(t)))
    }

    pub fn total(&self) -> Money {
        self.iter()
            .fold(Decimal::ZERO, |sum, (_, a)| sum.saturating_add(a.total()))
    }
}

/// Inputs to the tier engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierInputs {
    /// Tier 1 cap
    pub total_commitment: Money,
    /// Initial pool
    pub total_distributions: Money,
    /// Tier 2 cap
    pub preferred_hurdle: Money,
    pub carried_interest_fraction: Rate,
    pub catchup_fraction: Rate,
}

/// Engine position. `PoolExhausted` is absorbing and leads straight to
/// `Done`; there are no backward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Allocating(Tier),
    PoolExhausted,
    Done,
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

pub(crate) fn check_fraction(field: &str, value: Rate) -> EngineResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(WaterfallError::configuration(
            field,
            format!("must be between 0 and 1, got {value}"),
        ));
    }
    Ok(())
}

/// Allocate `total_distributions` through the four tiers.
///
/// Each tier takes `min(cap, pool)`. Once the pool is empty every later
/// tier stays at zero.
pub fn allocate_tiers(inputs: &TierInputs) -> EngineResult<TierAllocations> {
    check_fraction("carried_interest_percentage", inputs.carried_interest_fraction)?;
    check_fraction("catch_up_rate", inputs.catchup_fraction)?;
    for (name, value) in [
        ("total_commitment", inputs.total_commitment),
        ("total_distributions", inputs.total_distributions),
        ("preferred_hurdle", inputs.preferred_hurdle),
    ] {
        if value < Decimal::ZERO {
            return Err(WaterfallError::Computation(format!(
                "{name} is negative ({value})"
            )));
        }
    }

    let carry = inputs.carried_interest_fraction;
    let mut pool = inputs.total_distributions;
    let mut out = TierAllocations::default();

    let mut stage = if pool.is_zero() {
        Stage::PoolExhausted
    } else {
        Stage::Allocating(Tier::ReturnOfCapital)
    };

    loop {
        let next = match stage {
            Stage::Allocating(tier) => {
                let allocation = match tier {
                    Tier::ReturnOfCapital => {
                        TierAllocation::lp_only(pool.min(inputs.total_commitment))
                    }
                    Tier::PreferredReturn => {
                        TierAllocation::lp_only(pool.min(inputs.preferred_hurdle))
                    }
                    Tier::CatchUp => {
                        let cap = catch_up_cap(
                            out.preferred_return.lp,
                            carry,
                            inputs.catchup_fraction,
                            pool,
                        );
                        TierAllocation::gp_only(pool.min(cap))
                    }
                    Tier::FinalSplit => {
                        let gp = pool
                            .checked_mul(carry)
                            .map(|share| round_money(share, ALLOCATION_SCALE))
                            .ok_or_else(|| {
                                WaterfallError::Computation(format!(
                                    "carry share of {pool} overflowed"
                                ))
                            })?;
                        TierAllocation { lp: pool - gp, gp }
                    }
                };

                pool -= allocation.total();
                if pool < Decimal::ZERO {
                    return Err(WaterfallError::Computation(format!(
                        "pool went negative ({pool}) in {}",
                        tier.label()
                    )));
                }
                *out.slot(tier) = allocation;

                match tier.next() {
                    _ if pool.is_zero() => Stage::PoolExhausted,
                    Some(following) => Stage::Allocating(following),
                    None => Stage::Done,
                }
            }
            Stage::PoolExhausted => Stage::Done,
            Stage::Done => break,
        };
        trace!(from = ?stage, to = ?next, %pool, "tier transition");
        stage = next;
    }

    check_invariants(inputs, &out)?;
    Ok(out)
}

/// GP catch-up cap: the GP amount that brings its share of tier 2 + tier 3
/// profit to `carry`, scaled by `catchup`.
fn catch_up_cap(preferred_lp: Money, carry: Rate, catchup: Rate, pool: Money) -> Money {
    if catchup.is_zero() || carry.is_zero() {
        return Decimal::ZERO;
    }
    if carry == Decimal::ONE {
        // No finite target: GP is owed all profit
        return pool;
    }
    preferred_lp
        .checked_mul(carry)
        .and_then(|v| v.checked_mul(catchup))
        .and_then(|v| v.checked_div(Decimal::ONE - carry))
        .map(|cap| round_money(cap, ALLOCATION_SCALE))
        // A cap too large to represent exceeds any pool
        .unwrap_or(pool)
}

/// Re-check the allocation invariants. A failure here is a defect.
fn check_invariants(inputs: &TierInputs, out: &TierAllocations) -> EngineResult<()> {
    let fail = |msg: String| -> EngineResult<()> {
        debug_assert!(false, "waterfall invariant violated: {msg}");
        Err(WaterfallError::Computation(msg))
    };

    if out.total() > inputs.total_distributions {
        return fail(format!(
            "allocated {} exceeds distributions {}",
            out.total(),
            inputs.total_distributions
        ));
    }
    let roc = out.return_of_capital;
    if !roc.gp.is_zero() || roc.lp > inputs.total_commitment {
        return fail(format!("return of capital out of bounds: {roc:?}"));
    }
    for (tier, allocation) in out.iter() {
        if allocation.lp < Decimal::ZERO || allocation.gp < Decimal::ZERO {
            return fail(format!("{} has a negative share", tier.label()));
        }
    }

    // A later tier may only be funded once every earlier cap is met
    let caps_met = [
        roc.lp == inputs.total_commitment,
        out.preferred_return.lp == inputs.preferred_hurdle,
        out.catch_up.gp
            == catch_up_cap(
                out.preferred_return.lp,
                inputs.carried_interest_fraction,
                inputs.catchup_fraction,
                out.catch_up.gp,
            ),
    ];
    for (i, (tier, allocation)) in out.iter().enumerate().skip(1) {
        if !allocation.is_zero() && !caps_met[..i].iter().all(|met| *met) {
            return fail(format!("{} funded before earlier caps were met", tier.label()));
        }
    }
    Ok(())
}
