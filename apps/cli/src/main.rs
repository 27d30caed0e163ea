#![deny(warnings)]

//! Headless CLI: runs one seeded episode under a scripted policy and
//! prints the KPI summary.

use anyhow::{bail, Result};
use sim_core::{ActionBundle, Channel, Params, StartupState};
use sim_runtime::Episode;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

struct Args {
    seed: Option<u64>,
    months: Option<u32>,
    policy: String,
}

fn parse_args() -> Args {
    let mut args = Args {
        seed: None,
        months: None,
        policy: "balanced".to_string(),
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--months" => args.months = it.next().and_then(|s| s.parse().ok()),
            "--policy" => {
                if let Some(p) = it.next() {
                    args.policy = p;
                }
            }
            _ => {}
        }
    }
    args
}

/// Zero spend everywhere: exposes the pure macro drift.
fn noop_policy(_state: &StartupState) -> ActionBundle {
    ActionBundle::default()
}

/// Modest fixed spends, a hire every half year while cash is healthy,
/// and a small price bump once a year.
fn balanced_policy(state: &StartupState) -> ActionBundle {
    let mut a = ActionBundle::default();
    a.marketing.spend = 25_000.0;
    a.marketing.channel = if state.months_elapsed % 2 == 0 {
        Channel::Ppc
    } else {
        Channel::Brand
    };
    a.product.r_and_d_spend = 10_000.0;
    if state.months_elapsed % 6 == 5 && state.cash > 500_000.0 {
        a.hiring.hires = 1;
        a.hiring.cost_per_employee = 10_000.0;
    }
    if state.months_elapsed % 12 == 11 {
        a.pricing.price_change_pct = 0.05;
    }
    a
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::DEBUG)
        .init();

    let args = parse_args();
    let policy: fn(&StartupState) -> ActionBundle = match args.policy.as_str() {
        "noop" => noop_policy,
        "balanced" => balanced_policy,
        other => bail!("unknown policy: {other} (expected noop|balanced)"),
    };

    let params = Params::default();
    let horizon = args.months.unwrap_or(params.horizon_months);
    info!(seed = ?args.seed, policy = %args.policy, horizon, "starting episode");

    let mut episode = Episode::new(params, args.seed);
    let mut cumulative_reward = 0.0;
    let mut last_rule_of_40 = 0.0;

    for _ in 0..horizon {
        let action = policy(episode.state());
        let outcome = episode.step(&action)?;
        cumulative_reward += outcome.reward;
        last_rule_of_40 = outcome.rule_of_40;
        info!(
            month = outcome.state.months_elapsed,
            mrr = format!("{:.0}", outcome.state.mrr),
            cash = format!("{:.0}", outcome.state.cash),
            reward = format!("{:.2}", outcome.reward),
            rule_of_40 = format!("{:.1}", outcome.rule_of_40),
            "step"
        );
        if outcome.terminated {
            info!("bankrupt");
            break;
        }
        if outcome.truncated {
            info!("horizon reached");
            break;
        }
    }

    let s = episode.state();
    println!(
        "Episode over | months: {} | MRR: ${:.0} | cash: ${:.0} | headcount: {} | competitors: {}",
        s.months_elapsed, s.mrr, s.cash, s.headcount, s.competitors
    );
    println!(
        "Score | cumulative reward: {:.2} | last Rule of 40: {:.1} | innovation: {:.3} | valuation multiple: {:.2}",
        cumulative_reward, last_rule_of_40, s.innovation_factor, s.valuation_multiple
    );
    println!("{}", serde_json::to_string_pretty(&s.snapshot())?);

    Ok(())
}
