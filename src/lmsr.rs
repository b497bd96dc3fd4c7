//! LMSR (Logarithmic Market Scoring Rule) pricing math.
//!
//! Pure module: every function takes inventory and the liquidity parameter
//! explicitly and touches no shared state. Quantities cross the boundary as
//! `Decimal` and are quantized to 8 decimal places; the transcendental math
//! runs in `f64` with the log-sum-exp rewrite so large inventories never
//! overflow the exponentials.

use crate::types::{Dollars, Shares, Side};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Hard cap on root-finding iterations before giving up.
pub const MAX_ITERATIONS: u32 = 100;

/// Convergence tolerance for the cost inversion, relative to the budget.
pub const RELATIVE_TOLERANCE: f64 = 1e-7;

// quantization of values leaving the f64 math, matching stored precision
const PRECISION_DP: u32 = 8;

#[derive(Debug, Clone, thiserror::Error)]
pub enum LmsrError {
    #[error("cost inversion did not converge after {iterations} iterations (budget {budget})")]
    NonConvergence { iterations: u32, budget: Decimal },
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value)
        .unwrap_or(Decimal::ZERO)
        .round_dp(PRECISION_DP)
}

// C(q) = b * ln(exp(q_yes/b) + exp(q_no/b)), computed as
// b * (m + ln(exp(q_yes/b - m) + exp(q_no/b - m))) with m = max(q)/b.
fn cost_raw(q_yes: f64, q_no: f64, b: f64) -> f64 {
    let m = q_yes.max(q_no) / b;
    b * (m + ((q_yes / b - m).exp() + (q_no / b - m).exp()).ln())
}

// logistic form of the softmax price: 1 / (1 + exp((q_no - q_yes)/b)).
// the branch keeps the exponent non-positive so it can never overflow.
fn price_yes_raw(q_yes: f64, q_no: f64, b: f64) -> f64 {
    let diff = (q_no - q_yes) / b;
    if diff > 0.0 {
        let e = (-diff).exp();
        e / (1.0 + e)
    } else {
        1.0 / (1.0 + diff.exp())
    }
}

fn price_of_side_raw(q_yes: f64, q_no: f64, b: f64, side: Side) -> f64 {
    match side {
        Side::Yes => price_yes_raw(q_yes, q_no, b),
        Side::No => 1.0 - price_yes_raw(q_yes, q_no, b),
    }
}

fn shifted(q_yes: f64, q_no: f64, side: Side, delta: f64) -> (f64, f64) {
    match side {
        Side::Yes => (q_yes + delta, q_no),
        Side::No => (q_yes, q_no + delta),
    }
}

/// Total cost the market maker has collected at inventory `(q_yes, q_no)`.
pub fn cost(q_yes: Decimal, q_no: Decimal, b: Decimal) -> Dollars {
    Dollars::new(to_decimal(cost_raw(to_f64(q_yes), to_f64(q_no), to_f64(b))))
}

/// Instantaneous YES price. Always in the open unit interval.
pub fn price_yes(q_yes: Decimal, q_no: Decimal, b: Decimal) -> Decimal {
    to_decimal(price_yes_raw(to_f64(q_yes), to_f64(q_no), to_f64(b)))
}

/// Instantaneous NO price, the exact complement so the pair sums to one.
pub fn price_no(q_yes: Decimal, q_no: Decimal, b: Decimal) -> Decimal {
    Decimal::ONE - price_yes(q_yes, q_no, b)
}

pub fn price_of_side(q_yes: Decimal, q_no: Decimal, b: Decimal, side: Side) -> Decimal {
    match side {
        Side::Yes => price_yes(q_yes, q_no, b),
        Side::No => price_no(q_yes, q_no, b),
    }
}

/// Dollar cost of moving the traded side's inventory by `delta` shares:
/// `cost(after) - cost(before)`. Negative `delta` yields a negative cost,
/// i.e. proceeds returned to the seller.
pub fn cost_of_shares(
    q_yes: Decimal,
    q_no: Decimal,
    b: Decimal,
    side: Side,
    delta: Decimal,
) -> Dollars {
    let (qy, qn, bb) = (to_f64(q_yes), to_f64(q_no), to_f64(b));
    let (ay, an) = shifted(qy, qn, side, to_f64(delta));
    Dollars::new(to_decimal(cost_raw(ay, an, bb) - cost_raw(qy, qn, bb)))
}

/// Invert the cost function: the share quantity on `side` whose cost equals
/// `budget`. Newton's method with a bisection fallback over the bracket
/// `[budget, budget / price_before]`: the marginal price along a buy path
/// rises from `price_before` toward 1, so the true root lies inside.
/// Fails rather than returning an imprecise result.
pub fn shares_for_budget(
    q_yes: Decimal,
    q_no: Decimal,
    b: Decimal,
    side: Side,
    budget: Dollars,
) -> Result<Shares, LmsrError> {
    debug_assert!(budget.is_positive(), "budget must be positive");

    let (qy, qn, bb) = (to_f64(q_yes), to_f64(q_no), to_f64(b));
    let target = to_f64(budget.value());
    let tolerance = RELATIVE_TOLERANCE * target;

    let base_cost = cost_raw(qy, qn, bb);
    let price_before = price_of_side_raw(qy, qn, bb, side);

    let mut lo = target;
    let mut hi = target / price_before;
    if !hi.is_finite() {
        // inventory so lopsided the side's price underflowed to zero
        return Err(LmsrError::NonConvergence {
            iterations: 0,
            budget: budget.value(),
        });
    }

    let spend = |s: f64| -> f64 {
        let (ay, an) = shifted(qy, qn, side, s);
        cost_raw(ay, an, bb) - base_cost
    };

    let mut x = (lo + hi) / 2.0;
    for _ in 0..MAX_ITERATIONS {
        let overshoot = spend(x) - target;
        if overshoot.abs() <= tolerance {
            return Ok(Shares::new(to_decimal(x)));
        }
        if overshoot > 0.0 {
            hi = x;
        } else {
            lo = x;
        }

        // Newton step; bisect whenever it escapes the bracket
        let (ay, an) = shifted(qy, qn, side, x);
        let slope = price_of_side_raw(ay, an, bb, side);
        let newton = x - overshoot / slope;
        x = if slope > 0.0 && newton > lo && newton < hi {
            newton
        } else {
            (lo + hi) / 2.0
        };
    }

    Err(LmsrError::NonConvergence {
        iterations: MAX_ITERATIONS,
        budget: budget.value(),
    })
}
