use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use waterfall_core::api::{self, CalculateRequest};
use waterfall_core::waterfall::{self, RawField};
use waterfall_core::{AmountConvention, DistributionOrder};

use crate::input;

/// Request source and commitment terms shared by every waterfall command
#[derive(Args, Debug)]
#[command(allow_hyphen_values = true)]
pub struct RequestArgs {
    /// Path to a JSON or YAML request file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Transactions CSV (transaction_date, transaction_amount,
    /// contribution_or_distribution, commitment_id)
    #[arg(long)]
    pub transactions: Option<String>,

    /// Commitment to analyse
    #[arg(long)]
    pub commitment_id: Option<String>,

    /// Analysis date (e.g. 2022-01-03 or 01/03/2022)
    #[arg(long)]
    pub date: Option<String>,

    /// Annual preferred return rate (e.g. 0.08 for 8%)
    #[arg(long, env = "WATERFALL_PREF_IRR")]
    pub pref_irr: Option<Decimal>,

    /// GP carried interest share of profit (0-1)
    #[arg(long, alias = "carry", env = "WATERFALL_CARRY")]
    pub carried_interest: Option<Decimal>,

    /// GP catch-up fraction (1 = full catch-up)
    #[arg(long, env = "WATERFALL_CATCH_UP")]
    pub catch_up_rate: Option<Decimal>,

    /// Decimal places for the accrued preferred return
    #[arg(long)]
    pub money_scale: Option<u32>,

    /// How interim distributions pay down the hurdle balances
    #[arg(long, value_enum)]
    pub distribution_order: Option<OrderArg>,

    /// Sign convention for transaction amounts
    #[arg(long, value_enum)]
    pub amount_convention: Option<ConventionArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OrderArg {
    PreferredFirst,
    CapitalFirst,
}

impl From<OrderArg> for DistributionOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::PreferredFirst => DistributionOrder::PreferredFirst,
            OrderArg::CapitalFirst => DistributionOrder::CapitalFirst,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConventionArg {
    Strict,
    Magnitude,
}

impl From<ConventionArg> for AmountConvention {
    fn from(arg: ConventionArg) -> Self {
        match arg {
            ConventionArg::Strict => AmountConvention::Strict,
            ConventionArg::Magnitude => AmountConvention::Magnitude,
        }
    }
}

/// Build the request from a file, piped stdin, or flags plus a CSV.
/// Explicit flags override values read from a file or stdin.
fn load_request(args: &RequestArgs) -> Result<CalculateRequest, Box<dyn std::error::Error>> {
    let mut request: CalculateRequest = if let Some(ref path) = args.input {
        input::file::read_request(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return request_from_flags(args);
    };

    if let Some(ref path) = args.transactions {
        request.transactions = input::csv_in::read_transactions(path)?;
    }
    apply_overrides(&mut request, args);
    Ok(request)
}

/// Terms not given as flags default to 8% preferred, 20% carry, full catch-up.
fn request_from_flags(args: &RequestArgs) -> Result<CalculateRequest, Box<dyn std::error::Error>> {
    let path = args
        .transactions
        .as_deref()
        .ok_or("--transactions <file.csv> is required (or provide --input)")?;
    let commitment_id = args
        .commitment_id
        .clone()
        .ok_or("--commitment-id is required (or provide --input)")?;
    let date = args
        .date
        .clone()
        .ok_or("--date is required (or provide --input)")?;

    let mut request = CalculateRequest {
        input_commitment_id: RawField::Text(commitment_id),
        input_date: date,
        transactions: input::csv_in::read_transactions(path)?,
        pref_irr: dec!(0.08),
        carried_interest_percentage: dec!(0.20),
        catch_up_rate: Decimal::ONE,
        settings: Default::default(),
    };
    apply_overrides(&mut request, args);
    Ok(request)
}

fn apply_overrides(request: &mut CalculateRequest, args: &RequestArgs) {
    if let Some(ref id) = args.commitment_id {
        request.input_commitment_id = RawField::Text(id.clone());
    }
    if let Some(ref date) = args.date {
        request.input_date = date.clone();
    }
    if let Some(rate) = args.pref_irr {
        request.pref_irr = rate;
    }
    if let Some(carry) = args.carried_interest {
        request.carried_interest_percentage = carry;
    }
    if let Some(catch_up) = args.catch_up_rate {
        request.catch_up_rate = catch_up;
    }
    if let Some(scale) = args.money_scale {
        request.settings.money_scale = scale;
    }
    if let Some(order) = args.distribution_order {
        request.settings.distribution_order = order.into();
    }
    if let Some(convention) = args.amount_convention {
        request.settings.amount_convention = convention.into();
    }
}

/// Arguments for the waterfall calculation
#[derive(Args)]
pub struct CalculateArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Print the `/api/calculate` response envelope instead of the
    /// annotated computation output
    #[arg(long)]
    pub api: bool,
}

pub fn run_calculate(args: CalculateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = load_request(&args.request)?;

    if args.api {
        let response = api::handle_calculate(&request);
        return Ok(serde_json::to_value(response)?);
    }

    let config = request.commitment_config()?;
    let result = waterfall::calculate_waterfall(&config, &request.transactions, &request.settings)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for transaction normalisation
#[derive(Args)]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub request: RequestArgs,
}

pub fn run_normalize(args: NormalizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = load_request(&args.request)?;
    let events = waterfall::normalize_transactions(
        &request.transactions,
        &request.input_commitment_id.as_text(),
        request.settings.amount_convention,
    )?;
    Ok(serde_json::to_value(events)?)
}

/// Arguments for the preferred return accrual schedule
#[derive(Args)]
pub struct AccrualArgs {
    #[command(flatten)]
    pub request: RequestArgs,
}

pub fn run_accrual(args: AccrualArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = load_request(&args.request)?;
    let config = request.commitment_config()?;
    let result =
        waterfall::calculate_preferred_accrual(&config, &request.transactions, &request.settings)?;
    Ok(serde_json::to_value(result)?)
}
