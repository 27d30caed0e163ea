#![deny(warnings)]

//! Transition engine for the startup simulator.
//!
//! An [`Episode`] owns one [`StartupState`] and one seeded random stream,
//! and advances them a month at a time through a fixed pipeline:
//! exogenous shocks, endogenous feedback, market physics, pricing, hiring,
//! burn, unit economics, and scoring. A step is atomic and fully ordered;
//! reordering any draw-consuming sub-operation changes trajectories even
//! under the same seed.
//!
//! The engine holds no process-wide state: concurrent episodes each own
//! their record and stream.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sim_core::{ActionBundle, Params, StartupState};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors the engine can return to a caller.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// The episode already terminated or truncated; reset before stepping.
    #[error("episode is over; reset before stepping")]
    EpisodeOver,
}

/// What one step hands back to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Snapshot of the state after the step.
    pub state: StartupState,
    /// Scalar step reward.
    pub reward: f64,
    /// Cash ran out; absorbing.
    pub terminated: bool,
    /// Horizon reached with cash to spare; absorbing.
    pub truncated: bool,
    /// Rule-of-40 efficiency score for this step.
    pub rule_of_40: f64,
}

impl StepOutcome {
    /// Auxiliary info map: the Rule-of-40 value plus a flat snapshot of
    /// the new state, for collaborators that persist or query episodes
    /// without linking against the simulator types.
    pub fn info(&self) -> serde_json::Value {
        serde_json::json!({
            "rule_of_40": self.rule_of_40,
            "state": self.state.snapshot(),
        })
    }
}

/// One simulated company run: parameter table, state record, and the
/// per-episode random stream. Single writer by construction.
pub struct Episode {
    params: Params,
    state: StartupState,
    rng: ChaCha8Rng,
    finished: bool,
}

impl Episode {
    /// Start a fresh episode. `seed` fixes the whole trajectory given the
    /// same actions; `None` seeds from entropy.
    pub fn new(params: Params, seed: Option<u64>) -> Self {
        let state = StartupState::initial(&params);
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            params,
            state,
            rng,
            finished: false,
        }
    }

    /// Discard the current record and stream and start over.
    pub fn reset(&mut self, seed: Option<u64>) -> &StartupState {
        self.state = StartupState::initial(&self.params);
        self.rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        self.finished = false;
        &self.state
    }

    /// Current state record, read-only.
    pub fn state(&self) -> &StartupState {
        &self.state
    }

    /// Parameter table this episode runs under.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Whether the episode has terminated or truncated.
    pub fn is_over(&self) -> bool {
        self.finished
    }

    /// Advance the simulation by one month.
    ///
    /// Sub-operations run in a fixed order; the draw-consuming ones
    /// (three shocks, conditional cascade, Hill shape parameters,
    /// price elasticity) always consume the same number of draws for a
    /// given state, so seeded trajectories replay exactly.
    ///
    /// Cash is allowed to go negative inside the step; termination is
    /// observed at the end-of-step check. A malformed bundle (negative
    /// or non-finite fields) is replaced by the no-op bundle rather
    /// than rejected, to keep the episode runnable.
    pub fn step(&mut self, action: &ActionBundle) -> Result<StepOutcome, EngineError> {
        if self.finished {
            return Err(EngineError::EpisodeOver);
        }

        let fallback;
        let action = if action.is_well_formed() {
            action
        } else {
            warn!("malformed action bundle, substituting no-op");
            fallback = ActionBundle::default();
            &fallback
        };

        let state = &mut self.state;
        let prev_mrr = state.mrr;

        // 1-2. Exogenous shocks, then endogenous feedback.
        sim_shocks::interest_rate_shock(state, self.params.shock_prob, &mut self.rng);
        sim_shocks::consumer_confidence_shock(state, self.params.shock_prob, &mut self.rng);
        sim_shocks::competitive_entry_shock(state, self.params.shock_prob, &mut self.rng);
        sim_shocks::apply_recession_cascade(state, &mut self.rng);
        sim_shocks::apply_hysteresis(state);
        sim_shocks::apply_recovery(state);

        // 3-5. Market physics inputs for this month.
        let acquired_mrr = sim_econ::compute_new_mrr(state, &action.marketing, &mut self.rng);
        let expansion_mrr = sim_econ::compute_expansion_mrr(state, &action.product);
        let churn_rate = sim_econ::compute_churn_rate(state, self.params.max_churn);

        // R&D compounds into quality; churn above already saw the
        // pre-investment quality.
        sim_econ::improve_quality(state, action.product.r_and_d_spend);

        // 6. Single MRR assignment: retention, acquisition, expansion.
        state.mrr = state.mrr * (1.0 - churn_rate) + acquired_mrr + expansion_mrr;

        // 7. Pricing effect mutates MRR before collection, so a price
        // change hits this month's billing run, not a future one.
        sim_econ::apply_pricing_effect(state, &action.pricing, &mut self.rng);

        // 8. Collect revenue at the final, post-pricing MRR.
        state.cash += state.mrr;

        // 9. Hiring under the CFO's runway ceiling; one-time cost.
        let requested = action.hiring.hires;
        let hires = if requested > 0 {
            let ceiling = sim_econ::max_affordable_hires(
                state.cash,
                self.params.runway_months,
                action.hiring.cost_per_employee,
            );
            requested.min(ceiling)
        } else {
            0
        };
        let hiring_cost = hires as f64 * action.hiring.cost_per_employee;
        state.cash -= hiring_cost;
        state.headcount += hires;

        // 10. Recurring burn: salaries at the new headcount plus this
        // month's spend. Hiring cost was deducted above, once.
        let salary_burn = state.headcount as f64 * self.params.salary_per_head;
        let spend = action.marketing.spend + action.product.r_and_d_spend;
        state.cash -= salary_burn + spend;

        // 11. Unit economics refresh from this month's acquisition.
        let new_users = if state.price > 0.0 {
            acquired_mrr / state.price
        } else {
            0.0
        };
        let raw_cac = sim_econ::compute_cac(action.marketing.spend, new_users);
        state.cac = sim_econ::scale_cac_by_macro(raw_cac, state);
        state.ltv = sim_econ::compute_ltv(state.price, churn_rate);

        // 12. Scoring over the pre/post MRR and everything burned.
        let total_burn = hiring_cost + salary_burn + spend;
        let rule_of_40 = sim_econ::compute_rule_of_40(prev_mrr, state.mrr, total_burn);
        let reward = sim_econ::compute_reward(state, rule_of_40);

        // 13-14. Advance time, then observe the absorbing conditions.
        state.months_elapsed += 1;
        let terminated = state.cash <= 0.0;
        let truncated = !terminated && state.months_elapsed >= self.params.horizon_months;
        if terminated || truncated {
            self.finished = true;
            debug!(
                months = state.months_elapsed,
                cash = state.cash,
                terminated,
                truncated,
                "episode over"
            );
        }

        Ok(StepOutcome {
            state: self.state.clone(),
            reward,
            terminated,
            truncated,
            rule_of_40,
        })
    }
}
