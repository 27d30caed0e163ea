#![deny(warnings)]

//! Core domain models and invariants for the startup simulator.
//!
//! This crate defines the parameter table, the company/macro state record,
//! and the per-step action bundle, together with validation helpers that
//! express the invariants every step must preserve.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Static tunable constants for one simulation configuration.
///
/// Pure data: nothing in here has behavior. Defaults reproduce the
/// reference tuning (a $1M seed-stage SaaS company on a 10-year horizon).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Params {
    /// Episode length in months; reaching it truncates the episode.
    pub horizon_months: u32,
    /// Starting cash balance in USD.
    pub starting_cash: f64,
    /// Starting monthly recurring revenue in USD.
    pub starting_mrr: f64,
    /// Starting ARPU / price in USD.
    pub starting_price: f64,
    /// Seed customer acquisition cost in USD.
    pub starting_cac: f64,
    /// Seed lifetime value in USD.
    pub starting_ltv: f64,
    /// Starting monthly churn for the enterprise segment.
    pub churn_enterprise: f64,
    /// Starting monthly churn for the SMB segment.
    pub churn_smb: f64,
    /// Starting monthly churn for the B2C segment.
    pub churn_b2c: f64,
    /// Starting central-bank interest rate in percent.
    pub interest_rate: f64,
    /// Starting consumer confidence index (nominal range 0-200).
    pub consumer_confidence: f64,
    /// Starting number of direct competitors.
    pub competitors: u32,
    /// Starting product quality in [0, 1].
    pub product_quality: f64,
    /// Starting revenue valuation multiple.
    pub valuation_multiple: f64,
    /// Starting national unemployment rate in percent.
    pub unemployment: f64,
    /// Starting headcount (founders count too, so >= 1).
    pub headcount: u32,
    /// Base probability for each exogenous macro shock per step.
    pub shock_prob: f64,
    /// Monthly fully-loaded salary per employee in USD.
    pub salary_per_head: f64,
    /// Runway the CFO insists on when approving hires, in months.
    pub runway_months: f64,
    /// Hard ceiling on the composed churn rate.
    pub max_churn: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            horizon_months: 120,
            starting_cash: 1_000_000.0,
            starting_mrr: 50_000.0,
            starting_price: 50.0,
            starting_cac: 50.0,
            starting_ltv: 7_000.0,
            churn_enterprise: 0.01,
            churn_smb: 0.03,
            churn_b2c: 0.05,
            interest_rate: 3.0,
            consumer_confidence: 100.0,
            competitors: 5,
            product_quality: 0.1,
            valuation_multiple: 10.0,
            unemployment: 4.0,
            headcount: 1,
            shock_prob: 0.1,
            salary_per_head: 8_000.0,
            runway_months: 18.0,
            max_churn: 1.0,
        }
    }
}

/// Full snapshot of the simulated company and macro conditions at time t.
///
/// Owned exclusively by the transition engine; only engine operations
/// mutate it, one step at a time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StartupState {
    /// Liquid cash balance in USD. Non-positive cash ends the episode.
    pub cash: f64,
    /// Monthly recurring revenue in USD.
    pub mrr: f64,
    /// ARPU / price in USD.
    pub price: f64,
    /// Customer acquisition cost, recomputed every step.
    pub cac: f64,
    /// Lifetime value, recomputed every step.
    pub ltv: f64,
    /// Monthly churn rate for the enterprise segment, in [0, 1].
    pub churn_enterprise: f64,
    /// Monthly churn rate for the SMB segment, in [0, 1].
    pub churn_smb: f64,
    /// Monthly churn rate for the B2C segment, in [0, 1].
    pub churn_b2c: f64,
    /// Central-bank interest rate in percent.
    pub interest_rate: f64,
    /// Consumer confidence index (nominal range 0-200).
    pub consumer_confidence: f64,
    /// Number of direct competitors.
    pub competitors: u32,
    /// National unemployment rate in percent, clamped to [0, 100].
    pub unemployment: f64,
    /// Revenue valuation multiple; mean-reverts toward 10.0.
    pub valuation_multiple: f64,
    /// R&D efficiency multiplier in [0, 1]; scarred by long depressions.
    pub innovation_factor: f64,
    /// Consecutive months with consumer confidence below 50.
    pub months_in_depression: u32,
    /// Product quality score in [0, 1].
    pub product_quality: f64,
    /// Full-time employees, always >= 1.
    pub headcount: u32,
    /// Simulation month counter, starts at 0.
    pub months_elapsed: u32,
}

impl StartupState {
    /// Fresh episode state seeded from the parameter table.
    pub fn initial(params: &Params) -> Self {
        Self {
            cash: params.starting_cash,
            mrr: params.starting_mrr,
            price: params.starting_price,
            cac: params.starting_cac,
            ltv: params.starting_ltv,
            churn_enterprise: params.churn_enterprise,
            churn_smb: params.churn_smb,
            churn_b2c: params.churn_b2c,
            interest_rate: params.interest_rate,
            consumer_confidence: params.consumer_confidence,
            competitors: params.competitors,
            unemployment: params.unemployment,
            valuation_multiple: params.valuation_multiple,
            innovation_factor: 1.0,
            months_in_depression: 0,
            product_quality: params.product_quality,
            headcount: params.headcount,
            months_elapsed: 0,
        }
    }

    /// Flat field-name-to-value map of the state, for downstream
    /// collaborators (memory stores, report writers) that persist
    /// snapshots without depending on this crate's types.
    pub fn snapshot(&self) -> serde_json::Value {
        // Struct serializes to a flat JSON object; no nesting by design.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Marketing channel strategies with distinct response curves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Pay-per-click: saturates fast, lower ceiling.
    Ppc,
    /// Brand marketing: saturates slowly, higher ceiling.
    Brand,
}

/// Marketing decision for one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketingAction {
    /// Spend in USD, >= 0.
    pub spend: f64,
    /// Channel the spend goes to.
    pub channel: Channel,
}

/// Hiring decision for one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HiringAction {
    /// Requested new employees; the engine may clamp this down.
    pub hires: u32,
    /// One-time cost per hire (recruiting + setup) in USD, >= 0.
    pub cost_per_employee: f64,
}

/// Product decision for one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductAction {
    /// R&D investment in USD, >= 0.
    pub r_and_d_spend: f64,
}

/// Pricing decision for one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingAction {
    /// Fractional price change, e.g. 0.1 = +10%. Sanitized upstream
    /// to roughly [-0.5, 1.0]; the engine does not re-clamp.
    pub price_change_pct: f64,
}

/// One validated decision per category, executed together in one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionBundle {
    pub marketing: MarketingAction,
    pub hiring: HiringAction,
    pub product: ProductAction,
    pub pricing: PricingAction,
}

impl Default for ActionBundle {
    /// The no-op bundle: zero spend everywhere, zero hires, PPC channel,
    /// no price change. Also the fallback when a malformed bundle
    /// somehow reaches the engine.
    fn default() -> Self {
        Self {
            marketing: MarketingAction {
                spend: 0.0,
                channel: Channel::Ppc,
            },
            hiring: HiringAction {
                hires: 0,
                cost_per_employee: 10_000.0,
            },
            product: ProductAction { r_and_d_spend: 0.0 },
            pricing: PricingAction {
                price_change_pct: 0.0,
            },
        }
    }
}

impl ActionBundle {
    /// Whether every numeric field is finite and every spend non-negative.
    ///
    /// Upstream sanitation should make this always true; the engine
    /// still checks and substitutes the no-op bundle rather than run
    /// physics on garbage.
    pub fn is_well_formed(&self) -> bool {
        let m = &self.marketing;
        let h = &self.hiring;
        let p = &self.product;
        let pr = &self.pricing;
        m.spend.is_finite()
            && m.spend >= 0.0
            && h.cost_per_employee.is_finite()
            && h.cost_per_employee >= 0.0
            && p.r_and_d_spend.is_finite()
            && p.r_and_d_spend >= 0.0
            && pr.price_change_pct.is_finite()
    }
}

/// Violations of the invariants every post-step state must satisfy.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Headcount must stay >= 1 (founders never leave).
    #[error("headcount must be >= 1, got {0}")]
    HeadcountBelowOne(u32),
    /// A churn rate left the [0, 1] probability range.
    #[error("churn rate {name} = {value} is not a probability")]
    ChurnOutOfRange {
        /// Which segment or composite rate.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Product quality must stay within [0, 1].
    #[error("product quality {0} is out of [0, 1]")]
    QualityOutOfRange(f64),
    /// Innovation factor must stay within [0, 1].
    #[error("innovation factor {0} is out of [0, 1]")]
    InnovationOutOfRange(f64),
    /// Unemployment is a percentage in [0, 100].
    #[error("unemployment {0} is out of [0, 100]")]
    UnemploymentOutOfRange(f64),
    /// Valuation multiple must stay strictly positive.
    #[error("valuation multiple {0} must be > 0")]
    NonPositiveValuation(f64),
    /// Price must stay strictly positive.
    #[error("price {0} must be > 0")]
    NonPositivePrice(f64),
    /// Numeric field must be finite.
    #[error("non-finite value in field {0}")]
    NonFinite(&'static str),
}

fn check_prob(name: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite(name));
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::ChurnOutOfRange { name, value });
    }
    Ok(())
}

/// Validate the invariants a state must satisfy after every step.
///
/// A failure here is a defect in a transition operation, not a runtime
/// condition to recover from; the engine's tests call this as a
/// post-condition, the engine itself does not.
pub fn validate_state(s: &StartupState) -> Result<(), ValidationError> {
    for (name, v) in [
        ("cash", s.cash),
        ("mrr", s.mrr),
        ("price", s.price),
        ("cac", s.cac),
        ("ltv", s.ltv),
        ("interest_rate", s.interest_rate),
        ("consumer_confidence", s.consumer_confidence),
        ("valuation_multiple", s.valuation_multiple),
    ] {
        if !v.is_finite() {
            return Err(ValidationError::NonFinite(name));
        }
    }
    if s.headcount < 1 {
        return Err(ValidationError::HeadcountBelowOne(s.headcount));
    }
    check_prob("churn_enterprise", s.churn_enterprise)?;
    check_prob("churn_smb", s.churn_smb)?;
    check_prob("churn_b2c", s.churn_b2c)?;
    if !(0.0..=1.0).contains(&s.product_quality) {
        return Err(ValidationError::QualityOutOfRange(s.product_quality));
    }
    if !(0.0..=1.0).contains(&s.innovation_factor) {
        return Err(ValidationError::InnovationOutOfRange(s.innovation_factor));
    }
    if !(0.0..=100.0).contains(&s.unemployment) {
        return Err(ValidationError::UnemploymentOutOfRange(s.unemployment));
    }
    if s.valuation_multiple <= 0.0 {
        return Err(ValidationError::NonPositiveValuation(s.valuation_multiple));
    }
    if s.price <= 0.0 {
        return Err(ValidationError::NonPositivePrice(s.price));
    }
    Ok(())
}
