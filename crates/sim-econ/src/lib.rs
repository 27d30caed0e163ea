#![deny(warnings)]

//! Market physics and scoring for the startup simulator.
//!
//! Everything here is deterministic given its inputs and the draws it
//! takes from the episode RNG. Degenerate arithmetic (division by a
//! vanishing price, churn, or MRR) is guarded by flooring denominators,
//! never by returning errors: a startup with absurd numbers is a bad
//! startup, not a broken simulation.

use rand::Rng;
use sim_core::{Channel, MarketingAction, PricingAction, ProductAction, StartupState};
use tracing::trace;

/// Hill curve shape ranges per channel: (alpha, beta, gamma).
///
/// PPC saturates fast (low half-saturation spend) against a lower
/// ceiling; brand builds slowly toward a higher one.
const PPC_ALPHA: (f64, f64) = (0.7, 0.9);
const PPC_BETA: (f64, f64) = (20_000.0, 40_000.0);
const PPC_GAMMA: (f64, f64) = (15_000.0, 30_000.0);
const BRAND_ALPHA: (f64, f64) = (0.5, 0.7);
const BRAND_BETA: (f64, f64) = (40_000.0, 80_000.0);
const BRAND_GAMMA: (f64, f64) = (40_000.0, 80_000.0);

/// Monthly expansion revenue as a fraction of MRR at full upsell.
const EXPANSION_RATE: f64 = 0.02;
/// Ceiling on the R&D-driven upsell factor.
const UPSELL_CAP: f64 = 1.5;
/// Effective R&D dollars that saturate the upsell factor at 1.0.
const UPSELL_SCALE: f64 = 10_000.0;

/// Saturating Hill response: `beta * s^alpha / (gamma^alpha + s^alpha)`.
///
/// Zero for non-positive spend. With `alpha < 1` the per-dollar return
/// strictly decreases in spend, which is the diminishing-returns
/// property the acquisition model relies on.
pub fn hill_response(spend: f64, alpha: f64, beta: f64, gamma: f64) -> f64 {
    if spend <= 0.0 {
        return 0.0;
    }
    let s = spend.powf(alpha);
    beta * s / (gamma.powf(alpha) + s)
}

/// New MRR won from this step's marketing spend.
///
/// Draws fresh Hill shape parameters (alpha, beta, gamma, in that order)
/// for the chosen channel every step, spend or no spend, so the random
/// stream layout never depends on the action. The raw response is then
/// damped or boosted by consumer confidence and by competitive pressure.
pub fn compute_new_mrr<R: Rng>(
    state: &StartupState,
    marketing: &MarketingAction,
    rng: &mut R,
) -> f64 {
    let (a, b, g) = match marketing.channel {
        Channel::Ppc => (PPC_ALPHA, PPC_BETA, PPC_GAMMA),
        Channel::Brand => (BRAND_ALPHA, BRAND_BETA, BRAND_GAMMA),
    };
    let alpha = rng.gen_range(a.0..=a.1);
    let beta = rng.gen_range(b.0..=b.1);
    let gamma = rng.gen_range(g.0..=g.1);

    let mut response = hill_response(marketing.spend, alpha, beta, gamma);

    if state.consumer_confidence < 80.0 {
        response *= 0.85;
    } else if state.consumer_confidence > 120.0 {
        response *= 1.08;
    }
    if state.competitors >= 10 {
        response *= 0.6;
    } else if state.competitors >= 4 {
        response *= 0.8;
    }
    trace!(spend = marketing.spend, response, "acquisition response");
    response
}

/// Blended monthly churn rate.
///
/// Four multiplicative factors compose in fixed order: the segment
/// average, a product-quality discount, a low-confidence surcharge, and
/// a tenure decay (long-lived cohorts churn less, floored so churn never
/// decays below 30% of its undecayed value). The result is capped at
/// `max_churn` so `1 - churn` stays a usable retention factor.
pub fn compute_churn_rate(state: &StartupState, max_churn: f64) -> f64 {
    let segment_avg = (state.churn_enterprise + state.churn_smb + state.churn_b2c) / 3.0;
    let quality_factor = 1.0 - 0.5 * state.product_quality;
    let confidence_factor = if state.consumer_confidence < 80.0 {
        1.3
    } else {
        1.0
    };
    let tenure_proxy = (state.months_elapsed as f64 * 0.4).max(1.0);
    let tenure_decay = (-0.15 * tenure_proxy).exp().max(0.3);

    (segment_avg * quality_factor * confidence_factor * tenure_decay).clamp(0.0, max_churn)
}

/// Expansion (upsell) revenue from existing customers.
///
/// R&D spend is scaled by the innovation factor, so hysteresis scarring
/// directly suppresses upsell efficacy. The resulting upsell factor
/// saturates at 1.5x; zero R&D means zero expansion.
pub fn compute_expansion_mrr(state: &StartupState, product: &ProductAction) -> f64 {
    let effective_rd = product.r_and_d_spend * state.innovation_factor;
    let upsell_factor = (effective_rd / UPSELL_SCALE).min(UPSELL_CAP);
    state.mrr * EXPANSION_RATE * upsell_factor
}

/// R&D also compounds into product quality, asymptotically toward 1.0.
///
/// Gains shrink as quality approaches perfect; spends above $20k get a
/// 1.2x breakthrough bonus. Consumes no random draws.
pub fn improve_quality(state: &mut StartupState, r_and_d_spend: f64) {
    if r_and_d_spend <= 0.0 {
        return;
    }
    let potential = 1.0 - state.product_quality;
    let mut delta = r_and_d_spend * 1e-6 * potential;
    if r_and_d_spend > 20_000.0 {
        delta *= 1.2;
    }
    state.product_quality = (state.product_quality + delta).min(1.0);
}

/// Apply a price change and its elastic demand response to MRR.
///
/// Draws one fresh elasticity in [-0.9, -0.2] per step (even for a zero
/// change, to keep the draw layout fixed). The price change compounds a
/// direct revenue effect and the elastic demand effect on this step's
/// already churn/acquisition-adjusted MRR.
pub fn apply_pricing_effect<R: Rng>(
    state: &mut StartupState,
    pricing: &PricingAction,
    rng: &mut R,
) {
    let elasticity: f64 = rng.gen_range(-0.9..=-0.2);
    let pct = pricing.price_change_pct;
    let demand_change = elasticity * pct;
    state.price *= 1.0 + pct;
    state.mrr *= (1.0 + pct) * (1.0 + demand_change);
    trace!(pct, elasticity, mrr = state.mrr, "pricing effect");
}

/// The CFO's 18-month-runway ceiling on hiring.
///
/// Hires beyond `(cash / runway_months) / cost_per_employee` are silently
/// rejected. A zero hiring cost imposes no ceiling, and negative cash
/// allows no hires at all.
pub fn max_affordable_hires(cash: f64, runway_months: f64, cost_per_employee: f64) -> u32 {
    if cost_per_employee <= 0.0 {
        return u32::MAX;
    }
    let budget = cash / runway_months;
    if budget <= 0.0 {
        return 0;
    }
    let ceiling = (budget / cost_per_employee).floor();
    if ceiling >= u32::MAX as f64 {
        u32::MAX
    } else {
        ceiling as u32
    }
}

/// Raw customer acquisition cost: spend over users won. Zero when the
/// spend bought nobody.
pub fn compute_cac(marketing_spend: f64, new_users: f64) -> f64 {
    if new_users <= 0.0 {
        return 0.0;
    }
    marketing_spend / new_users
}

/// Macro adjustments on raw CAC: tight money, weak sentiment, and a
/// crowded field all make customers more expensive to win. The two
/// competitor surcharges stack when both thresholds are met.
pub fn scale_cac_by_macro(raw_cac: f64, state: &StartupState) -> f64 {
    let mut cac = raw_cac;
    if state.interest_rate > 5.0 {
        cac *= 1.2;
    }
    if state.consumer_confidence < 80.0 {
        cac *= 1.3;
    } else if state.consumer_confidence > 120.0 {
        cac *= 0.8;
    }
    if state.competitors > 5 {
        cac *= 1.15;
    }
    if state.competitors >= 8 {
        cac *= 1.3;
    }
    cac
}

/// Lifetime value as a perpetuity: price over churn, with churn floored
/// at 0.1% so LTV stays bounded.
pub fn compute_ltv(price: f64, churn_rate: f64) -> f64 {
    price / churn_rate.max(0.001)
}

/// Rule of 40: revenue growth percentage plus profit margin percentage.
///
/// Both MRR readings are floored at 1.0 before dividing; burn enters as
/// a negative margin (a startup rarely has a positive one).
pub fn compute_rule_of_40(prev_mrr: f64, new_mrr: f64, total_burn: f64) -> f64 {
    let prev = prev_mrr.max(1.0);
    let new = new_mrr.max(1.0);
    let growth_pct = 100.0 * (new - prev) / prev;
    let margin_pct = 100.0 * (-total_burn / new);
    growth_pct + margin_pct
}

/// Scalar step reward: a small MRR-proportional base, minus additive,
/// independent penalties for unhealthy efficiency, unit economics,
/// bankruptcy, scarred innovation, and a compressed valuation.
pub fn compute_reward(state: &StartupState, rule_of_40: f64) -> f64 {
    let mut reward = state.mrr / 1_000_000.0;

    if rule_of_40 < 15.0 {
        reward -= 2.0;
    }
    if rule_of_40 < 0.0 {
        reward -= 5.0;
    }
    if state.cac > 0.0 && state.ltv > 0.0 {
        let ratio = state.ltv / state.cac;
        if ratio < 3.0 {
            reward -= 5.0;
        }
        if ratio < 1.0 {
            reward -= 10.0;
        }
    }
    if state.cash <= 0.0 {
        reward -= 20.0;
    }
    if state.innovation_factor < 0.8 {
        reward -= 5.0;
    }
    if state.valuation_multiple < 5.0 {
        reward -= 2.0;
    }
    reward
}
