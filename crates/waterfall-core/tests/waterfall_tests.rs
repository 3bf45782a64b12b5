use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use waterfall_core::api::{handle_calculate, CalculateRequest, CalculateResponse};
use waterfall_core::waterfall::{
    calculate_waterfall, run_waterfall, RawTransaction, Tier, TierAllocation, TierAllocations,
    WaterfallResult,
};
use waterfall_core::{
    CashFlowEvent, CashFlowKind, CommitmentConfig, DistributionOrder, EngineSettings, Money,
    WaterfallError,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn config(carry: Decimal, catchup: Decimal) -> CommitmentConfig {
    CommitmentConfig {
        commitment_id: "fund-a/lp-1".into(),
        analysis_date: date(2022, 1, 1),
        preferred_rate: dec!(0.08),
        carried_interest_fraction: carry,
        catchup_fraction: catchup,
    }
}

fn flow(d: NaiveDate, amount: Money, kind: CashFlowKind) -> CashFlowEvent {
    CashFlowEvent { date: d, amount, kind }
}

/// 1,000,000 called at 2021-01-01, `distributed` returned at 2022-01-01
fn one_year_events(distributed: Money) -> Vec<CashFlowEvent> {
    called_then_distributed(dec!(1000000), date(2022, 1, 1), distributed)
}

/// `called` at 2021-01-01, `distributed` returned at `on`
fn called_then_distributed(called: Money, on: NaiveDate, distributed: Money) -> Vec<CashFlowEvent> {
    let mut events = vec![flow(date(2021, 1, 1), called, CashFlowKind::Contribution)];
    if !distributed.is_zero() {
        events.push(flow(on, distributed, CashFlowKind::Distribution));
    }
    events
}

fn run(cfg: &CommitmentConfig, events: &[CashFlowEvent]) -> WaterfallResult {
    run_waterfall(cfg, events, &EngineSettings::default())
        .unwrap()
        .result
}

/// Caps the engine works against, for the sequencing check
fn caps(r: &WaterfallResult, hurdle: Money, cfg: &CommitmentConfig) -> [Money; 3] {
    let c = cfg.carried_interest_fraction;
    let catch_up = if c == Decimal::ONE {
        r.tiers.catch_up.gp
    } else {
        r.tiers.preferred_return.lp * c * cfg.catchup_fraction / (Decimal::ONE - c)
    };
    [r.total_commitment, hurdle, catch_up]
}

// ===========================================================================
// Reference scenarios
// ===========================================================================

#[test]
fn test_distribution_returns_only_capital() {
    let cfg = config(dec!(0.20), dec!(1.0));
    let r = run(&cfg, &one_year_events(dec!(1000000)));

    assert_eq!(r.tiers.return_of_capital, TierAllocation { lp: dec!(1000000), gp: Decimal::ZERO });
    assert_eq!(r.tiers.preferred_return, TierAllocation::ZERO);
    assert_eq!(r.tiers.catch_up, TierAllocation::ZERO);
    assert_eq!(r.tiers.final_split, TierAllocation::ZERO);
    assert_eq!(r.total_lp_profit, Decimal::ZERO);
    assert_eq!(r.total_gp_profit, Decimal::ZERO);
    assert_eq!(r.profit_split_percentage, Decimal::ZERO);
}

#[test]
fn test_full_european_waterfall() {
    let cfg = config(dec!(0.20), dec!(1.0));
    let r = run(&cfg, &one_year_events(dec!(1200000)));

    let expected = TierAllocations {
        return_of_capital: TierAllocation { lp: dec!(1000000), gp: Decimal::ZERO },
        preferred_return: TierAllocation { lp: dec!(80000), gp: Decimal::ZERO },
        catch_up: TierAllocation { lp: Decimal::ZERO, gp: dec!(20000) },
        final_split: TierAllocation { lp: dec!(80000), gp: dec!(20000) },
    };
    assert_eq!(r.tiers, expected);
    assert_eq!(r.total_commitment, dec!(1000000));
    assert_eq!(r.total_distributions, dec!(1200000));
    assert_eq!(r.total_lp_profit, dec!(160000));
    assert_eq!(r.total_gp_profit, dec!(40000));
    assert_eq!(r.profit_split_percentage, dec!(0.20));
}

// ===========================================================================
// Properties
// ===========================================================================

#[test]
fn test_conservation_and_capital_cap() {
    let cfg = config(dec!(0.20), dec!(1.0));
    for distributed in [
        dec!(1),
        dec!(999999.99),
        dec!(1000000),
        dec!(1040000),
        dec!(1085000),
        dec!(1100000),
        dec!(1234567.89),
        dec!(5000000),
    ] {
        let r = run(&cfg, &one_year_events(distributed));
        assert_eq!(r.tiers.total(), r.total_distributions, "distributed {distributed}");
        assert!(r.tiers.return_of_capital.lp <= r.total_commitment);
        assert_eq!(r.tiers.return_of_capital.gp, Decimal::ZERO);
        assert_eq!(r.tiers.preferred_return.gp, Decimal::ZERO);
        assert_eq!(r.tiers.catch_up.lp, Decimal::ZERO);
    }
}

#[test]
fn test_sequencing() {
    let cfg = config(dec!(0.25), dec!(0.6));
    for distributed in [dec!(500000), dec!(1050000), dec!(1090000), dec!(1300000)] {
        let r = run(&cfg, &one_year_events(distributed));
        let caps = caps(&r, dec!(80000), &cfg);
        let funded: Vec<(Tier, TierAllocation)> = r.tiers.iter().collect();
        for (i, (tier, allocation)) in funded.iter().enumerate().skip(1) {
            if allocation.total() > Decimal::ZERO {
                let earlier = [
                    r.tiers.return_of_capital.lp,
                    r.tiers.preferred_return.lp,
                    r.tiers.catch_up.gp,
                ];
                for j in 0..i {
                    assert_eq!(earlier[j], caps[j], "{tier:?} funded before tier {j} cap met");
                }
            }
        }
    }
}

#[test]
fn test_split_matches_carry_when_caps_satisfied() {
    for carry in [dec!(0.20), dec!(0.25), dec!(0.50), dec!(0.60), dec!(0.80)] {
        let cfg = config(carry, Decimal::ONE);
        let r = run(&cfg, &one_year_events(dec!(2000000)));
        assert_eq!(r.profit_split_percentage, carry, "carry {carry}");
    }
}

#[test]
fn test_split_exact_with_fractional_cent_hurdle() {
    // 1,000,000.13 * 8% = 80,000.0104, accrued as 80,000.01
    let cfg = config(dec!(0.20), Decimal::ONE);
    let r = run(
        &cfg,
        &called_then_distributed(dec!(1000000.13), date(2022, 1, 1), dec!(3000000)),
    );
    assert_eq!(r.tiers.preferred_return.lp, dec!(80000.01));
    assert_eq!(r.tiers.catch_up.gp, dec!(20000.0025));
    assert_eq!(r.profit_split_percentage, dec!(0.20));

    // 123,456.79 * 8% = 9,876.5432, accrued as 9,876.54
    let cfg = config(dec!(0.25), Decimal::ONE);
    let r = run(
        &cfg,
        &called_then_distributed(dec!(123456.79), date(2022, 1, 1), dec!(3000000)),
    );
    assert_eq!(r.tiers.preferred_return.lp, dec!(9876.54));
    assert_eq!(r.tiers.catch_up.gp, dec!(3292.18));
    assert_eq!(r.profit_split_percentage, dec!(0.25));
}

#[test]
fn test_split_exact_after_part_year_accrual() {
    // 181 days: non-integer compounding exponent
    let mut cfg = config(dec!(0.20), Decimal::ONE);
    cfg.analysis_date = date(2021, 7, 1);
    let r = run(
        &cfg,
        &called_then_distributed(dec!(1000000), date(2021, 7, 1), dec!(2000000)),
    );
    let hurdle = r.tiers.preferred_return.lp;
    assert!(hurdle > dec!(38800) && hurdle < dec!(39000), "hurdle {hurdle}");
    assert_eq!(hurdle, hurdle.round_dp(2));
    assert_eq!(r.tiers.catch_up.gp, hurdle / dec!(4));
    assert_eq!(r.profit_split_percentage, dec!(0.20));
    assert_eq!(r.tiers.total(), dec!(2000000));
}

#[test]
fn test_split_with_non_terminating_catch_up_ratio() {
    // 0.3 / 0.7 does not terminate in decimal
    let cfg = config(dec!(0.3), Decimal::ONE);
    let r = run(&cfg, &one_year_events(dec!(2000000)));
    assert_eq!(r.tiers.catch_up.gp, dec!(34285.714285714286));
    assert_eq!(r.tiers.total(), dec!(2000000));
    assert_eq!(r.total_gp_profit, dec!(300000));
    assert_eq!(r.profit_split_percentage, dec!(0.3));

    let r = run(&cfg, &one_year_events(dec!(1234567.89)));
    assert_eq!(r.tiers.total(), dec!(1234567.89));
    let drift = (r.profit_split_percentage - dec!(0.3)).abs();
    assert!(drift < dec!(0.000000000001), "split {}", r.profit_split_percentage);
}

#[test]
fn test_partial_catch_up_split_below_carry() {
    let cfg = config(dec!(0.20), dec!(0.5));
    let r = run(&cfg, &one_year_events(dec!(1200000)));
    assert_eq!(r.tiers.catch_up.gp, dec!(10000));
    assert!(r.profit_split_percentage < dec!(0.20));
    assert_eq!(r.tiers.total(), dec!(1200000));
}

#[test]
fn test_idempotent() {
    let cfg = config(dec!(0.20), dec!(1.0));
    let events = one_year_events(dec!(1333333.33));
    let a = serde_json::to_string(&run(&cfg, &events)).unwrap();
    let b = serde_json::to_string(&run(&cfg, &events)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_zero_distributions() {
    let cfg = config(dec!(0.20), dec!(1.0));
    let r = run(&cfg, &one_year_events(Decimal::ZERO));
    assert_eq!(r.tiers, TierAllocations::default());
    assert_eq!(r.total_distributions, Decimal::ZERO);
    assert_eq!(r.profit_split_percentage, Decimal::ZERO);
}

// ===========================================================================
// Multi-event histories
// ===========================================================================

#[test]
fn test_interim_distribution_order_changes_hurdle() {
    let mut cfg = config(dec!(0.20), dec!(1.0));
    cfg.analysis_date = date(2023, 1, 1);
    let events = vec![
        flow(date(2021, 1, 1), dec!(1000000), CashFlowKind::Contribution),
        flow(date(2022, 1, 1), dec!(500000), CashFlowKind::Distribution),
        flow(date(2023, 1, 1), dec!(900000), CashFlowKind::Distribution),
    ];

    // Preferred first: 80,000 + 580,000 * 8% = 126,400
    let pref_first = run_waterfall(&cfg, &events, &EngineSettings::default())
        .unwrap()
        .result;
    assert_eq!(pref_first.tiers.preferred_return.lp, dec!(126400));

    // Capital first: 80,000 + 500,000 * 8% = 120,000
    let settings = EngineSettings {
        distribution_order: DistributionOrder::CapitalFirst,
        ..EngineSettings::default()
    };
    let capital_first = run_waterfall(&cfg, &events, &settings).unwrap().result;
    assert_eq!(capital_first.tiers.preferred_return.lp, dec!(120000));

    // A smaller hurdle shrinks the catch-up; with full catch-up the overall
    // GP take is still 20% of the 400,000 profit either way
    assert_eq!(pref_first.tiers.catch_up.gp, dec!(31600));
    assert_eq!(capital_first.tiers.catch_up.gp, dec!(30000));
    assert_eq!(pref_first.total_gp_profit, dec!(80000));
    assert_eq!(capital_first.total_gp_profit, dec!(80000));
    assert_eq!(capital_first.total_distributions, dec!(1400000));
}

#[test]
fn test_raw_batch_from_upload_format() {
    let cfg = config(dec!(0.20), dec!(1.0));
    let rows = vec![
        RawTransaction {
            transaction_date: "01/01/2022".into(),
            transaction_amount: "$700,000.00".into(),
            contribution_or_distribution: "Distribution".into(),
            commitment_id: "fund-a/lp-1".into(),
        },
        RawTransaction {
            transaction_date: "01/01/2021".into(),
            transaction_amount: "$1,000,000.00".into(),
            contribution_or_distribution: "Contribution".into(),
            commitment_id: "fund-a/lp-1".into(),
        },
        RawTransaction {
            transaction_date: "01/01/2022".into(),
            transaction_amount: "500,000".into(),
            contribution_or_distribution: "Distribution".into(),
            commitment_id: "fund-a/lp-1".into(),
        },
    ];
    let r = calculate_waterfall(&cfg, &rows, &EngineSettings::default())
        .unwrap()
        .result;
    assert_eq!(r.total_distributions, dec!(1200000));
    assert_eq!(r.profit_split_percentage, dec!(0.20));
}

#[test]
fn test_bad_rows_reject_whole_batch() {
    let cfg = config(dec!(0.20), dec!(1.0));
    let rows = vec![
        RawTransaction {
            transaction_date: "2021-01-01".into(),
            transaction_amount: "1000000".into(),
            contribution_or_distribution: "contribution".into(),
            commitment_id: "fund-a/lp-1".into(),
        },
        RawTransaction {
            transaction_date: "2022-01-01".into(),
            transaction_amount: "N/A".into(),
            contribution_or_distribution: "distribution".into(),
            commitment_id: "fund-a/lp-1".into(),
        },
    ];
    match calculate_waterfall(&cfg, &rows, &EngineSettings::default()) {
        Err(WaterfallError::Validation { issues }) => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].index, 1);
            assert_eq!(issues[0].value, "N/A");
        }
        other => panic!("Expected Validation, got: {other:?}"),
    }
}

#[test]
fn test_request_round_trip_through_handler() {
    let request: CalculateRequest = serde_json::from_value(serde_json::json!({
        "input_commitment_id": 9,
        "input_date": "2022-01-01",
        "transactions": [
            {"transaction_date": "2021-01-01", "transaction_amount": 1000000,
             "contribution_or_distribution": "contribution", "commitment_id": 9},
            {"transaction_date": "2022-01-01", "transaction_amount": 1200000,
             "contribution_or_distribution": "distribution", "commitment_id": 9}
        ],
        "pref_irr": "0.08",
        "carried_interest_percentage": "0.2",
        "catch_up_rate": "1"
    }))
    .unwrap();

    match handle_calculate(&request) {
        CalculateResponse::Ok { data } => {
            assert_eq!(data.commitment_id, "9");
            assert_eq!(data.total_gp_profit, dec!(40000));
        }
        CalculateResponse::Error { error } => panic!("unexpected error: {error:?}"),
    }
}
