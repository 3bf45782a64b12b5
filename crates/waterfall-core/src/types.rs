use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.08 = 8%). Never as percentages.
pub type Rate = Decimal;

/// Year fractions
pub type Years = Decimal;

/// Direction of a capital movement between the LP and the fund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashFlowKind {
    /// Capital called from the LP
    Contribution,
    /// Cash returned to the partners
    Distribution,
}

/// A validated, dated capital movement. The amount is always non-negative;
/// direction is carried by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowEvent {
    pub date: NaiveDate,
    pub amount: Money,
    pub kind: CashFlowKind,
}

/// Commitment terms for one calculation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitmentConfig {
    pub commitment_id: String,
    /// Events dated after this are ignored
    pub analysis_date: NaiveDate,
    /// Annualised preferred return (hurdle) rate
    pub preferred_rate: Rate,
    /// GP carry share of profit; the LP residual share is `1 - carry`
    pub carried_interest_fraction: Rate,
    /// 1 = full catch-up, 0 = no catch-up
    pub catchup_fraction: Rate,
}

impl CommitmentConfig {
    pub fn lp_residual_fraction(&self) -> Rate {
        Decimal::ONE - self.carried_interest_fraction
    }
}

/// How an interim distribution is applied against the accrual balances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionOrder {
    /// Pay down unpaid preferred return, then outstanding capital
    #[default]
    PreferredFirst,
    /// Pay down outstanding capital, then unpaid preferred return
    CapitalFirst,
}

/// Sign convention accepted for raw transaction amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountConvention {
    /// Every amount must be strictly positive
    #[default]
    Strict,
    /// Accounting-signed amounts such as `(1,000)` are taken by magnitude
    Magnitude,
}

/// Request-level engine knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Decimal places the accrued preferred return is rounded to at each step
    #[serde(default = "default_money_scale")]
    pub money_scale: u32,
    #[serde(default)]
    pub distribution_order: DistributionOrder,
    #[serde(default)]
    pub amount_convention: AmountConvention,
}

fn default_money_scale() -> u32 {
    2
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            money_scale: default_money_scale(),
            distribution_order: DistributionOrder::default(),
            amount_convention: AmountConvention::default(),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
    pub day_count: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
            day_count: "ACT/365F".to_string(),
        },
    }
}
