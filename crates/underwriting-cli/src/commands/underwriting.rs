use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use underwriting_core::underwriting::amortization::{annual_schedule, monthly_payment};
use underwriting_core::underwriting::model::{run_model, underwrite_deal};
use underwriting_core::underwriting::report::annual_table;

use crate::input::{self, DealArgs};

/// Arguments for a full underwriting run
#[derive(Args)]
pub struct UnderwriteArgs {
    #[command(flatten)]
    pub deal: DealArgs,

    /// Override the purchase price
    #[arg(long)]
    pub purchase_price: Option<Decimal>,

    /// Override the exit cap rate (decimal, e.g. 0.065)
    #[arg(long)]
    pub exit_cap_rate: Option<Decimal>,

    /// Override loan-to-value (decimal, 0 = all cash)
    #[arg(long)]
    pub ltv: Option<Decimal>,

    /// Override the hold period in years
    #[arg(long)]
    pub hold_period_years: Option<u32>,
}

/// Arguments for the annual cash-flow export
#[derive(Args)]
pub struct CashFlowArgs {
    #[command(flatten)]
    pub deal: DealArgs,
}

/// Arguments for the loan schedule
#[derive(Args)]
pub struct AmortizationArgs {
    /// Loan amount. When omitted the loan is sized from the deal (price x LTV).
    #[arg(long)]
    pub loan: Option<Decimal>,

    /// Annual interest rate (decimal)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Amortization term in years
    #[arg(long)]
    pub amortization_years: Option<u32>,

    /// Number of years to show (defaults to the hold period, or the full term)
    #[arg(long)]
    pub years: Option<u32>,

    #[command(flatten)]
    pub deal: DealArgs,
}

pub fn run_underwrite(args: UnderwriteArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loaded = input::load_deal(&args.deal)?;
    let mut inputs = loaded.inputs;

    if let Some(price) = args.purchase_price {
        inputs.purchase_price = price;
    }
    if let Some(cap) = args.exit_cap_rate {
        inputs.exit_cap_rate = cap;
    }
    if let Some(ltv) = args.ltv {
        inputs.ltv = ltv;
    }
    if let Some(hold) = args.hold_period_years {
        inputs.hold_period_years = hold;
    }

    let mut output = underwrite_deal(&inputs)?;
    let mut warnings = loaded.warnings;
    warnings.append(&mut output.warnings);
    output.warnings = warnings;

    Ok(serde_json::to_value(output)?)
}

pub fn run_cash_flows(args: CashFlowArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loaded = input::load_deal(&args.deal)?;
    let result = run_model(&loaded.inputs);
    let report = annual_table(&result);

    Ok(json!({
        "results": report.rows,
        "trailer": report.trailer,
        "warnings": loaded.warnings,
    }))
}

pub fn run_amortization(args: AmortizationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (loan, rate, term, default_years) = match (args.loan, args.rate) {
        (Some(loan), Some(rate)) => {
            let term = args.amortization_years.unwrap_or(30);
            (loan, rate, term, term)
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err("--loan and --rate must be given together".into());
        }
        (None, None) => {
            let deal = input::load_deal(&args.deal)?.inputs;
            let loan = deal.purchase_price.saturating_mul(deal.ltv).max(Decimal::ZERO);
            let term = args.amortization_years.unwrap_or(deal.amortization_years);
            (loan, deal.interest_rate, term, deal.hold_period_years)
        }
    };

    let years = args.years.unwrap_or(default_years);
    let schedule = annual_schedule(loan, rate, term, years);

    Ok(json!({
        "loan": loan,
        "annual_rate": rate,
        "amortization_years": term,
        "monthly_payment": monthly_payment(loan, rate, term),
        "results": schedule,
    }))
}
