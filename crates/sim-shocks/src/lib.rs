#![deny(warnings)]

//! Macro shocks and endogenous feedback for the startup simulator.
//!
//! Exogenous shocks are independent Bernoulli trials applied before the
//! deterministic market physics; feedback modules then react to the
//! accumulated macro conditions (recession cascade, hysteresis scarring,
//! mean-reversion recovery).
//!
//! Every stochastic function takes the episode RNG by `&mut` and consumes
//! a fixed number of draws, so a seeded episode replays bit-identically
//! as long as callers keep the documented call order:
//! interest rate -> consumer confidence -> competitive entry -> cascade.

use rand::Rng;
use sim_core::StartupState;
use tracing::debug;

/// Unemployment feeding the cascade above this rate.
const CASCADE_UNEMPLOYMENT: f64 = 8.0;
/// Interest rate feeding the cascade above this rate.
const CASCADE_INTEREST: f64 = 7.0;
/// Probability of the cascade firing once its gate is met.
const CASCADE_PROB: f64 = 0.2;
/// Consumer confidence below this counts as a depression month.
const DEPRESSION_CONFIDENCE: f64 = 50.0;
/// Depression months at which innovation starts scarring.
const SCARRING_THRESHOLD: u32 = 6;

/// Central-bank rate hike. On trigger the cost of capital rises,
/// valuations compress, and rate-sensitive SMB customers churn harder.
///
/// Consumes exactly one uniform draw whether or not it fires.
pub fn interest_rate_shock<R: Rng>(state: &mut StartupState, prob: f64, rng: &mut R) {
    let roll: f64 = rng.gen();
    if roll >= prob {
        return;
    }
    state.interest_rate += 1.5;
    state.valuation_multiple *= 0.85;
    // Keep the amplified rate a representable probability.
    state.churn_smb = (state.churn_smb * 1.2).clamp(0.0, 1.0);
    debug!(
        interest_rate = state.interest_rate,
        valuation_multiple = state.valuation_multiple,
        "interest rate shock fired"
    );
}

/// Consumer sentiment slump: confidence drops and unemployment ticks up.
///
/// Consumes exactly one uniform draw whether or not it fires.
pub fn consumer_confidence_shock<R: Rng>(state: &mut StartupState, prob: f64, rng: &mut R) {
    let roll: f64 = rng.gen();
    if roll >= prob {
        return;
    }
    state.consumer_confidence -= 20.0;
    state.unemployment = (state.unemployment + 1.0).min(100.0);
    debug!(
        consumer_confidence = state.consumer_confidence,
        unemployment = state.unemployment,
        "consumer confidence shock fired"
    );
}

/// New competitor entering the market, triggering a price war.
///
/// Unlike the fixed-probability shocks, the trigger probability scales
/// with how attractive the market looks: richer MRR pools draw entrants
/// more often, asymptotically up to twice the base probability.
///
/// Consumes exactly one uniform draw whether or not it fires.
pub fn competitive_entry_shock<R: Rng>(state: &mut StartupState, prob: f64, rng: &mut R) {
    let attractiveness = (state.mrr - 50_000.0) / 50_000.0;
    let dynamic_prob = logistic(attractiveness);
    let effective = prob * 2.0 * dynamic_prob;
    let roll: f64 = rng.gen();
    if roll >= effective {
        return;
    }
    state.competitors += 1;
    state.price *= 0.9;
    debug!(
        competitors = state.competitors,
        price = state.price,
        "competitive entry shock fired"
    );
}

/// Recession cascade: once unemployment and interest rates are both
/// elevated, the economy has a 20% chance per month of spiralling
/// further, which in turn keeps the gate open longer.
///
/// Draws one uniform value only when the gate condition is met.
pub fn apply_recession_cascade<R: Rng>(state: &mut StartupState, rng: &mut R) {
    if state.unemployment <= CASCADE_UNEMPLOYMENT || state.interest_rate <= CASCADE_INTEREST {
        return;
    }
    let roll: f64 = rng.gen();
    if roll >= CASCADE_PROB {
        return;
    }
    state.consumer_confidence -= 10.0;
    state.valuation_multiple *= 0.8;
    state.unemployment = (state.unemployment + 0.5).min(100.0);
    debug!(
        consumer_confidence = state.consumer_confidence,
        unemployment = state.unemployment,
        "recession cascade deepened"
    );
}

/// Hysteresis: sustained low confidence scars innovation capacity.
///
/// The depression counter moves every step (up while confidence < 50,
/// down toward zero otherwise). At or beyond six depression months the
/// scar re-applies every step the threshold holds; the lost innovation
/// never comes back through this rule.
pub fn apply_hysteresis(state: &mut StartupState) {
    if state.consumer_confidence < DEPRESSION_CONFIDENCE {
        state.months_in_depression += 1;
    } else {
        state.months_in_depression = state.months_in_depression.saturating_sub(1);
    }
    if state.months_in_depression >= SCARRING_THRESHOLD {
        state.innovation_factor *= 0.95;
        debug!(
            months_in_depression = state.months_in_depression,
            innovation_factor = state.innovation_factor,
            "hysteresis scarred innovation"
        );
    }
}

/// Mean reversion. Runs every step, after shocks and hysteresis:
/// - innovation creeps back toward 1.0 (slowly; scars dominate),
/// - the valuation multiple reverts toward 10.0 by 0.05 per step,
/// - confidence recovers by 2.0 while below 100, unless unemployment
///   is 8% or worse.
pub fn apply_recovery(state: &mut StartupState) {
    if state.innovation_factor < 1.0 {
        state.innovation_factor = (state.innovation_factor + 0.001).min(1.0);
    }
    if state.valuation_multiple < 10.0 {
        state.valuation_multiple = (state.valuation_multiple + 0.05).min(10.0);
    } else if state.valuation_multiple > 10.0 {
        state.valuation_multiple = (state.valuation_multiple - 0.05).max(10.0);
    }
    if state.consumer_confidence < 100.0 && state.unemployment < CASCADE_UNEMPLOYMENT {
        state.consumer_confidence += 2.0;
    }
}

/// Standard logistic function, maps all of R into (0, 1).
fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use sim_core::{Params, StartupState};

    fn base_state() -> StartupState {
        let mut s = StartupState::initial(&Params::default());
        s.interest_rate = 5.0;
        s.product_quality = 0.8;
        s
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn interest_shock_applies_all_three_effects() {
        let mut s = base_state();
        interest_rate_shock(&mut s, 1.0, &mut rng());
        assert_eq!(s.interest_rate, 6.5);
        assert_eq!(s.valuation_multiple, 8.5);
        assert!((s.churn_smb - 0.03 * 1.2).abs() < 1e-12);
    }

    #[test]
    fn interest_shock_never_fires_at_zero_prob() {
        let mut s = base_state();
        let before = s.clone();
        interest_rate_shock(&mut s, 0.0, &mut rng());
        assert_eq!(s, before);
    }

    #[test]
    fn amplified_smb_churn_stays_a_probability() {
        let mut s = base_state();
        s.churn_smb = 0.99;
        for _ in 0..10 {
            interest_rate_shock(&mut s, 1.0, &mut rng());
        }
        assert_eq!(s.churn_smb, 1.0);
    }

    #[test]
    fn confidence_shock_hits_sentiment_and_jobs() {
        let mut s = base_state();
        consumer_confidence_shock(&mut s, 1.0, &mut rng());
        assert_eq!(s.consumer_confidence, 80.0);
        assert_eq!(s.unemployment, 5.0);
    }

    #[test]
    fn competitive_entry_starts_price_war() {
        let mut s = base_state();
        s.mrr = 100_000.0;
        competitive_entry_shock(&mut s, 1.0, &mut rng());
        assert_eq!(s.competitors, 6);
        assert!((s.price - 45.0).abs() < 1e-12);
    }

    #[test]
    fn entry_probability_scales_with_mrr() {
        // Over many seeds, a rich market must attract entrants more
        // often than a poor one under the same base probability.
        let mut rich_entries = 0u32;
        let mut poor_entries = 0u32;
        for seed in 0..2_000u64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut rich = base_state();
            rich.mrr = 500_000.0;
            competitive_entry_shock(&mut rich, 0.1, &mut rng);
            rich_entries += (rich.competitors > 5) as u32;

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut poor = base_state();
            poor.mrr = 5_000.0;
            competitive_entry_shock(&mut poor, 0.1, &mut rng);
            poor_entries += (poor.competitors > 5) as u32;
        }
        assert!(rich_entries > poor_entries);
    }

    #[test]
    fn cascade_requires_both_gates() {
        let mut s = base_state();
        s.unemployment = 9.0;
        s.interest_rate = 6.0; // gate half-open
        let before = s.clone();
        apply_recession_cascade(&mut s, &mut rng());
        assert_eq!(s, before);
    }

    #[test]
    fn cascade_deepens_when_it_fires() {
        let mut s = base_state();
        s.unemployment = 9.0;
        s.interest_rate = 8.0;
        // Find a seed whose first draw lands under the 0.2 cascade
        // probability, then check all three effects.
        for seed in 0..64u64 {
            let mut trial = s.clone();
            apply_recession_cascade(&mut trial, &mut ChaCha8Rng::seed_from_u64(seed));
            if trial.unemployment > 9.0 {
                assert_eq!(trial.consumer_confidence, 90.0);
                assert_eq!(trial.valuation_multiple, 8.0);
                assert_eq!(trial.unemployment, 9.5);
                return;
            }
        }
        panic!("no seed in 0..64 fired a p=0.2 cascade");
    }

    #[test]
    fn hysteresis_counts_and_scars() {
        let mut s = base_state();
        s.consumer_confidence = 40.0;
        s.months_in_depression = 5;

        apply_hysteresis(&mut s);
        assert_eq!(s.months_in_depression, 6);
        assert!((s.innovation_factor - 0.95).abs() < 1e-12);

        apply_hysteresis(&mut s);
        assert_eq!(s.months_in_depression, 7);
        assert!((s.innovation_factor - 0.9025).abs() < 1e-12);
    }

    #[test]
    fn depression_counter_decays_but_not_below_zero() {
        let mut s = base_state();
        s.consumer_confidence = 90.0;
        s.months_in_depression = 1;
        apply_hysteresis(&mut s);
        assert_eq!(s.months_in_depression, 0);
        apply_hysteresis(&mut s);
        assert_eq!(s.months_in_depression, 0);
        assert_eq!(s.innovation_factor, 1.0);
    }

    #[test]
    fn recovery_moves_everything_toward_baseline() {
        let mut s = base_state();
        s.innovation_factor = 0.9;
        s.valuation_multiple = 8.0;
        s.consumer_confidence = 90.0;
        s.unemployment = 5.0;
        apply_recovery(&mut s);
        assert!((s.innovation_factor - 0.901).abs() < 1e-12);
        assert!((s.valuation_multiple - 8.05).abs() < 1e-12);
        assert_eq!(s.consumer_confidence, 92.0);
    }

    #[test]
    fn recovery_does_not_overshoot() {
        let mut s = base_state();
        s.innovation_factor = 0.9999;
        s.valuation_multiple = 9.99;
        apply_recovery(&mut s);
        assert_eq!(s.innovation_factor, 1.0);
        assert_eq!(s.valuation_multiple, 10.0);

        s.valuation_multiple = 10.01;
        apply_recovery(&mut s);
        assert_eq!(s.valuation_multiple, 10.0);
    }

    #[test]
    fn high_unemployment_blocks_confidence_recovery() {
        let mut s = base_state();
        s.consumer_confidence = 90.0;
        s.unemployment = 9.0;
        apply_recovery(&mut s);
        assert_eq!(s.consumer_confidence, 90.0);
    }

    #[test]
    fn scarring_and_recovery_can_both_apply_in_one_step() {
        let mut s = base_state();
        s.consumer_confidence = 40.0;
        s.months_in_depression = 6;
        apply_hysteresis(&mut s);
        let scarred = s.innovation_factor;
        apply_recovery(&mut s);
        assert!((s.innovation_factor - (scarred + 0.001)).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn shock_round_preserves_macro_invariants(
            prob in 0.0f64..=1.0,
            mrr in 0.0f64..1e7,
            smb in 0.0f64..=1.0,
            unemployment in 0.0f64..=100.0,
            seed in 0u64..256,
        ) {
            let mut s = base_state();
            s.mrr = mrr;
            s.churn_smb = smb;
            s.unemployment = unemployment;
            let competitors_before = s.competitors;

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            interest_rate_shock(&mut s, prob, &mut rng);
            consumer_confidence_shock(&mut s, prob, &mut rng);
            competitive_entry_shock(&mut s, prob, &mut rng);
            apply_recession_cascade(&mut s, &mut rng);
            apply_hysteresis(&mut s);
            apply_recovery(&mut s);

            prop_assert!((0.0..=1.0).contains(&s.churn_smb));
            prop_assert!((0.0..=100.0).contains(&s.unemployment));
            prop_assert!((0.0..=1.0).contains(&s.innovation_factor));
            prop_assert!(s.valuation_multiple > 0.0);
            prop_assert!(s.competitors <= competitors_before + 1);
            prop_assert!(s.price > 0.0);
        }
    }
}
