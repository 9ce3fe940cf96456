use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// One year of a level-payment loan schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationYear {
    pub year: u32,
    pub beginning_balance: Money,
    pub payments: Money,
    pub interest: Money,
    pub principal: Money,
    pub ending_balance: Money,
}

/// Level monthly payment: L * r / (1 - (1+r)^-n), with r = annual_rate / 12 and n = years * 12.
///
/// Returns zero for a non-positive loan or a zero-length term, and `L / n` when the rate is
/// zero. Negative rates are treated as zero. Saturates at `Decimal::MAX`; see
/// [`checked_monthly_payment`].
pub fn monthly_payment(loan_amount: Money, annual_rate: Rate, amortization_years: u32) -> Money {
    checked_monthly_payment(loan_amount, annual_rate, amortization_years).unwrap_or(Decimal::MAX)
}

/// As [`monthly_payment`], or `None` when the payment exceeds the decimal range.
pub fn checked_monthly_payment(
    loan_amount: Money,
    annual_rate: Rate,
    amortization_years: u32,
) -> Option<Money> {
    let n = amortization_years.saturating_mul(12);
    if loan_amount <= Decimal::ZERO || n == 0 {
        return Some(Decimal::ZERO);
    }

    let monthly_rate = monthly_rate(annual_rate);
    if monthly_rate.is_zero() {
        return Some(loan_amount / Decimal::from(n));
    }

    let v_n = discount_factor(monthly_rate, n);
    let denominator = Decimal::ONE - v_n;
    if denominator.is_zero() {
        return Some(loan_amount / Decimal::from(n));
    }

    loan_amount.checked_mul(monthly_rate / denominator)
}

/// Outstanding balance after `payments_made` monthly payments.
///
/// Uses the annuity-balance identity B_k = L * (1 - v^(n-k)) / (1 - v^n) with v = 1/(1+r),
/// which equals L(1+r)^k - P((1+r)^k - 1)/r without forming large powers. Zero rate amortizes
/// linearly. Payments beyond the term leave a zero balance.
pub fn remaining_balance(
    loan_amount: Money,
    annual_rate: Rate,
    amortization_years: u32,
    payments_made: u32,
) -> Money {
    let n = amortization_years.saturating_mul(12);
    if loan_amount <= Decimal::ZERO || n == 0 {
        return Decimal::ZERO;
    }
    let k = payments_made.min(n);

    let monthly_rate = monthly_rate(annual_rate);
    if monthly_rate.is_zero() {
        let remaining = Decimal::from(n - k);
        let balance = match loan_amount.checked_mul(remaining) {
            Some(scaled) => scaled / Decimal::from(n),
            None => loan_amount / Decimal::from(n) * remaining,
        };
        return balance.max(Decimal::ZERO);
    }

    let denominator = Decimal::ONE - discount_factor(monthly_rate, n);
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    let numerator = Decimal::ONE - discount_factor(monthly_rate, n - k);

    let balance = match loan_amount.checked_mul(numerator) {
        Some(scaled) => scaled / denominator,
        None => loan_amount * (numerator / denominator),
    };
    balance.max(Decimal::ZERO)
}

/// Year-by-year schedule for the first `years` years, built on the same monthly model as
/// [`monthly_payment`] and [`remaining_balance`].
pub fn annual_schedule(
    loan_amount: Money,
    annual_rate: Rate,
    amortization_years: u32,
    years: u32,
) -> Vec<AmortizationYear> {
    let payment = monthly_payment(loan_amount, annual_rate, amortization_years);
    let term_months = amortization_years.saturating_mul(12);
    let mut rows = Vec::with_capacity(years as usize);

    let mut beginning_balance = loan_amount.max(Decimal::ZERO);
    for year in 1..=years {
        let months_before = (year - 1).saturating_mul(12);
        let months_paid = term_months.saturating_sub(months_before).min(12);
        let ending_balance = remaining_balance(
            loan_amount,
            annual_rate,
            amortization_years,
            year.saturating_mul(12),
        );

        let payments = payment.saturating_mul(Decimal::from(months_paid));
        let principal = beginning_balance - ending_balance;
        let interest = payments.saturating_sub(principal);

        rows.push(AmortizationYear {
            year,
            beginning_balance,
            payments,
            interest,
            principal,
            ending_balance,
        });
        beginning_balance = ending_balance;
    }

    rows
}

fn monthly_rate(annual_rate: Rate) -> Rate {
    annual_rate.max(Decimal::ZERO) / dec!(12)
}

/// (1 + r)^-periods; underflows quietly to zero for long, high-rate terms.
fn discount_factor(monthly_rate: Rate, periods: u32) -> Decimal {
    let Some(base) = Decimal::ONE.checked_add(monthly_rate) else {
        return Decimal::ZERO;
    };
    (Decimal::ONE / base)
        .checked_powu(u64::from(periods))
        .unwrap_or(Decimal::ZERO)
}
