use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{Money, Rate};

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 140;
const IRR_LOWER_BOUND: Rate = dec!(-0.9999);
const IRR_INITIAL_UPPER_BOUND: Rate = dec!(5);
const MAX_BRACKET_EXPANSIONS: u32 = 20;

/// Net Present Value of a series of cash flows, index 0 undiscounted.
///
/// Returns `None` when the discount rate is at or below -100% or the discounted sum
/// cannot be represented.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> Option<Money> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut result = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r)?;
        }
        result = result.checked_add(cf.checked_div(discount)?)?;
    }

    Some(result)
}

/// Internal Rate of Return by bisection.
///
/// Requires at least one strictly negative and one strictly positive flow. The root is
/// bracketed in [-0.9999, 5]; when both ends share a sign the upper bound is doubled up to
/// 20 times. Bisection then runs for at most 140 iterations, stopping early once
/// |NPV(mid)| < 1e-7. Returns `None` when no sign change can be found.
pub fn irr(cash_flows: &[Money]) -> Option<Rate> {
    let has_outflow = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    let has_inflow = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    if !has_outflow || !has_inflow {
        return None;
    }

    let mut low = IRR_LOWER_BOUND;
    let mut high = IRR_INITIAL_UPPER_BOUND;
    let mut f_low = scaled_npv(low, cash_flows);
    let mut f_high = scaled_npv(high, cash_flows);

    let mut expansions = 0;
    while same_sign(f_low, f_high) {
        if expansions == MAX_BRACKET_EXPANSIONS {
            tracing::debug!(
                upper_bound = %high,
                periods = cash_flows.len(),
                "IRR root could not be bracketed"
            );
            return None;
        }
        high *= dec!(2);
        f_high = scaled_npv(high, cash_flows);
        expansions += 1;
    }

    if f_low.is_zero() {
        return Some(low);
    }
    if f_high.is_zero() {
        return Some(high);
    }

    for _ in 0..MAX_IRR_ITERATIONS {
        let mid = (low + high) / dec!(2);

        if let Some(value) = npv(mid, cash_flows) {
            if value.abs() < CONVERGENCE_THRESHOLD {
                return Some(mid);
            }
        }

        let f_mid = scaled_npv(mid, cash_flows);
        if f_mid.is_zero() {
            return Some(mid);
        }
        if same_sign(f_low, f_mid) {
            low = mid;
            f_low = f_mid;
        } else {
            high = mid;
        }
    }

    Some((low + high) / dec!(2))
}

/// NPV scaled by a strictly positive factor so that no term exceeds its cash flow in
/// magnitude. Shares the sign of the true NPV at every rate above -100%.
///
/// For r >= 0 this is the plain NPV computed with v = 1/(1+r). For -1 < r < 0 it is
/// NPV * (1+r)^T, i.e. the future value at the final period.
fn scaled_npv(rate: Rate, cash_flows: &[Money]) -> Decimal {
    let one_plus_r = Decimal::ONE + rate;
    let mut total = Decimal::ZERO;
    let mut factor = Decimal::ONE;

    if one_plus_r >= Decimal::ONE {
        let v = Decimal::ONE / one_plus_r;
        for cf in cash_flows {
            total = total.saturating_add(*cf * factor);
            factor *= v;
        }
    } else {
        for cf in cash_flows.iter().rev() {
            total = total.saturating_add(*cf * factor);
            factor *= one_plus_r;
        }
    }

    total
}

fn same_sign(a: Decimal, b: Decimal) -> bool {
    (a > Decimal::ZERO && b > Decimal::ZERO) || (a < Decimal::ZERO && b < Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        assert_eq!(npv(dec!(0.0), &cfs).unwrap(), dec!(50));
    }

    #[test]
    fn test_npv_rate_at_minus_one_undefined() {
        let cfs = vec![dec!(-100), dec!(110)];
        assert!(npv(dec!(-1), &cfs).is_none());
        assert!(npv(dec!(-1.5), &cfs).is_none());
    }

    #[test]
    fn test_irr_simple_case() {
        // Invest 100, receive 110 in 1 year => IRR = 10%
        let rate = irr(&[dec!(-100), dec!(110)]).unwrap();
        assert!((rate - dec!(0.10)).abs() < dec!(0.00000001), "got {rate}");
    }

    #[test]
    fn test_irr_multi_period() {
        // Invest 1000, receive 300/year for 5 years => IRR ~15.24%
        let cfs = vec![
            dec!(-1000),
            dec!(300),
            dec!(300),
            dec!(300),
            dec!(300),
            dec!(300),
        ];
        let rate = irr(&cfs).unwrap();
        assert!(rate > dec!(0.152) && rate < dec!(0.153), "got {rate}");
    }

    #[test]
    fn test_irr_zeroes_npv() {
        let shapes: Vec<Vec<Decimal>> = vec![
            vec![dec!(-1000), dec!(400), dec!(400), dec!(400)],
            vec![dec!(-250000), dec!(12000), dec!(14000), dec!(15500), dec!(330000)],
            vec![dec!(-100), dec!(20), dec!(20)],
            vec![dec!(500), dec!(-600)],
            {
                let mut deferred = vec![Decimal::ZERO; 12];
                deferred[0] = dec!(-1);
                deferred[11] = dec!(0.5);
                deferred
            },
        ];
        for cfs in shapes {
            let rate = irr(&cfs).unwrap();
            let residual = npv(rate, &cfs).unwrap();
            assert!(
                residual.abs() < dec!(0.000001),
                "NPV at IRR {rate} is {residual} for {cfs:?}"
            );
        }
    }

    #[test]
    fn test_irr_negative_root() {
        // Lose half the money in one year
        let rate = irr(&[dec!(-100), dec!(50)]).unwrap();
        assert!((rate - dec!(-0.5)).abs() < dec!(0.0000001), "got {rate}");
    }

    #[test]
    fn test_irr_expands_bracket_for_large_returns() {
        // 100x in one year => IRR = 9900%
        let rate = irr(&[dec!(-1), dec!(100)]).unwrap();
        assert!((rate - dec!(99)).abs() < dec!(0.0001), "got {rate}");
    }

    #[test]
    fn test_irr_same_sign_is_undefined() {
        assert!(irr(&[dec!(100), dec!(50), dec!(25)]).is_none());
        assert!(irr(&[dec!(-100), dec!(-50)]).is_none());
        assert!(irr(&[dec!(-100), Decimal::ZERO]).is_none());
        assert!(irr(&[]).is_none());
    }
}
