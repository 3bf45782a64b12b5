//! Distribution waterfall: transaction normalisation, preferred return
//! accrual, four-tier allocation and profit aggregation.

pub mod aggregate;
pub mod engine;
pub mod normalizer;
pub mod preferred;
pub mod tiers;

pub use aggregate::{summarize_profit, ProfitSummary};
pub use engine::{
    calculate_preferred_accrual, calculate_waterfall, run_waterfall, validate_config,
    WaterfallResult,
};
pub use normalizer::{normalize_transactions, RawField, RawTransaction};
pub use preferred::{accrue_preferred, AccrualStep, PreferredAccrual};
pub use tiers::{allocate_tiers, Tier, TierAllocation, TierAllocations, TierInputs};
