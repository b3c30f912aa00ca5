//! `thompson simulate`: Monte Carlo run against known true parameters.

use clap::Args;
use serde::Serialize;
use tracing::{info, trace};

use crate::app::AppContext;
use crate::bandit::models::{Bernoulli, Exponential, Poisson};
use crate::bandit::ppd::round_to;
use crate::bandit::{
    Experiment, FromMoments, Outcome, POSTERIOR_DECIMALS, Posterior, PpdSummary, RewardModel,
};
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::config::ModelKind;
use crate::error::{Result, TsError};

use super::experiment_from_config;

#[derive(Args, Debug, Default)]
pub struct SimulateArgs {
    /// Number of select-then-observe rounds (overrides [simulation].rounds)
    #[arg(long)]
    pub rounds: Option<usize>,

    /// True per-arm parameters, comma separated, in arm order
    #[arg(long, value_delimiter = ',')]
    pub truth: Vec<f64>,

    /// RNG seed (overrides [experiment].seed)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Predictive draws per arm (overrides [ppd].size)
    #[arg(long)]
    pub ppd_size: Option<usize>,
}

#[derive(Serialize)]
struct ArmReport<P> {
    label: String,
    truth: f64,
    pulls: usize,
    total_reward: f64,
    posterior: P,
    posterior_mean: f64,
}

#[derive(Serialize)]
struct SimulationReport<P> {
    model: &'static str,
    rounds: usize,
    seed: Option<u64>,
    best_arm: String,
    best_arm_share: f64,
    cumulative_reward: f64,
    arms: Vec<ArmReport<P>>,
    ppd: Vec<PpdSummary>,
}

/// Running totals for one arm.
struct Tally {
    label: String,
    truth: f64,
    pulls: usize,
    total_reward: f64,
}

pub fn run(ctx: &AppContext, args: &SimulateArgs) -> Result<()> {
    match ctx.config.experiment.model {
        ModelKind::Bernoulli => simulate::<Bernoulli>(ctx, args),
        ModelKind::Poisson => simulate::<Poisson>(ctx, args),
        ModelKind::Exponential => simulate::<Exponential>(ctx, args),
    }
}

fn simulate<M>(ctx: &AppContext, args: &SimulateArgs) -> Result<()>
where
    M: RewardModel,
    M::Params: FromMoments,
{
    let mut experiment = experiment_from_config::<M>(&ctx.config)?;
    let truth = if args.truth.is_empty() {
        ctx.config.simulation.truth.clone()
    } else {
        args.truth.clone()
    };
    let rounds = args.rounds.unwrap_or(ctx.config.simulation.rounds);
    let seed = args.seed.or(ctx.config.experiment.seed);
    let mut rng = ctx.rng(args.seed);

    let tallies = run_rounds(&mut experiment, &truth, rounds, &mut rng)?;
    let size = args.ppd_size.unwrap_or(ctx.config.ppd.size);
    let ppd = experiment.get_ppd_with_rng(size, &mut rng)?;

    let best = best_arm::<M>(&tallies)
        .ok_or_else(|| TsError::MissingConfiguration("experiment has no arms".to_string()))?;
    let best_arm = tallies[best].label.clone();
    let best_arm_share = if rounds == 0 {
        0.0
    } else {
        round_to(
            tallies[best].pulls as f64 / rounds as f64,
            POSTERIOR_DECIMALS,
        )
    };
    let cumulative_reward = round_to(
        tallies.iter().map(|tally| tally.total_reward).sum(),
        POSTERIOR_DECIMALS,
    );
    info!(
        model = M::NAME,
        rounds,
        best_arm = %best_arm,
        best_arm_share,
        "simulation finished"
    );

    let arms = tallies
        .into_iter()
        .map(|tally| {
            let posterior = experiment
                .posterior(&tally.label)
                .ok_or_else(|| TsError::UnknownArm(tally.label.clone()))?;
            Ok(ArmReport {
                truth: tally.truth,
                pulls: tally.pulls,
                total_reward: round_to(tally.total_reward, POSTERIOR_DECIMALS),
                posterior: posterior.rounded(POSTERIOR_DECIMALS),
                posterior_mean: round_to(posterior.mean(), POSTERIOR_DECIMALS),
                label: tally.label,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let report = SimulationReport {
        model: M::NAME,
        rounds,
        seed,
        best_arm,
        best_arm_share,
        cumulative_reward,
        arms,
        ppd,
    };

    if ctx.robot_mode {
        return emit_json(&robot_ok(report));
    }

    let mut layout = HumanLayout::new();
    layout
        .title("Simulation")
        .kv("Model", report.model)
        .kv("Rounds", &report.rounds.to_string())
        .kv(
            "Best arm",
            &format!(
                "{} ({:.1}% of pulls)",
                report.best_arm,
                report.best_arm_share * 100.0
            ),
        )
        .kv("Total reward", &report.cumulative_reward.to_string())
        .blank()
        .section("Arms");
    for arm in &report.arms {
        layout.kv(
            &arm.label,
            &format!(
                "truth {}  pulls {}  reward {}  {}",
                arm.truth, arm.pulls, arm.total_reward, arm.posterior
            ),
        );
    }
    layout.blank().section("Posterior predictive");
    layout.ppd(&report.ppd);
    emit_human(layout);
    Ok(())
}

/// Select, observe one reward from the true process, update; `rounds` times.
fn run_rounds<M, R>(
    experiment: &mut Experiment<M>,
    truth: &[f64],
    rounds: usize,
    rng: &mut R,
) -> Result<Vec<Tally>>
where
    M: RewardModel,
    R: rand::Rng + ?Sized,
{
    if truth.len() != experiment.len() {
        return Err(TsError::LabelMismatch {
            expected: experiment.len(),
            actual: truth.len(),
        });
    }
    let mut tallies: Vec<Tally> = experiment
        .labels()
        .zip(truth)
        .map(|(label, &truth)| Tally {
            label: label.to_string(),
            truth,
            pulls: 0,
            total_reward: 0.0,
        })
        .collect();

    for round in 0..rounds {
        let chosen = experiment.choose_arm_with_rng(rng)?;
        let slot = tallies
            .iter()
            .position(|tally| tally.label == chosen)
            .ok_or_else(|| TsError::UnknownArm(chosen.clone()))?;
        let reward = M::simulate_reward(tallies[slot].truth, rng)?;
        trace!(round, arm = %chosen, reward, "simulated reward");
        experiment.add_rewards(&[Outcome::new(chosen, reward)])?;
        tallies[slot].pulls += 1;
        tallies[slot].total_reward += reward;
    }
    Ok(tallies)
}

/// Index of the arm whose true parameter wins in the model's direction.
fn best_arm<M: RewardModel>(tallies: &[Tally]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (slot, tally) in tallies.iter().enumerate() {
        let replace = match best {
            None => true,
            Some(incumbent) => M::SELECTION.prefers(tally.truth, tallies[incumbent].truth),
        };
        if replace {
            best = Some(slot);
        }
    }
    best
}
