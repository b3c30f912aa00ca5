//! `thompson replay`: fold a reward log into the configured experiment.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::app::AppContext;
use crate::bandit::models::{Bernoulli, Exponential, Poisson};
use crate::bandit::{
    FromMoments, Outcome, POSTERIOR_DECIMALS, Posterior, PosteriorStore, PpdSummary, RewardModel,
};
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::config::ModelKind;
use crate::error::Result;

use super::experiment_from_config;

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON file holding `[{"label": ..., "reward": ...}, ...]`
    pub rewards: PathBuf,

    /// Predictive draws per arm (overrides [ppd].size)
    #[arg(long)]
    pub ppd_size: Option<usize>,
}

#[derive(Serialize)]
struct ReplayReport<P> {
    model: &'static str,
    rewards_applied: usize,
    posteriors: PosteriorStore<P>,
    next_arm: String,
    ppd: Vec<PpdSummary>,
}

pub fn run(ctx: &AppContext, args: &ReplayArgs) -> Result<()> {
    let outcomes = load_outcomes(&args.rewards)?;
    match ctx.config.experiment.model {
        ModelKind::Bernoulli => replay::<Bernoulli>(ctx, args, &outcomes),
        ModelKind::Poisson => replay::<Poisson>(ctx, args, &outcomes),
        ModelKind::Exponential => replay::<Exponential>(ctx, args, &outcomes),
    }
}

fn load_outcomes(path: &Path) -> Result<Vec<Outcome>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn replay<M>(ctx: &AppContext, args: &ReplayArgs, outcomes: &[Outcome]) -> Result<()>
where
    M: RewardModel,
    M::Params: FromMoments,
{
    let mut experiment = experiment_from_config::<M>(&ctx.config)?;
    experiment.add_rewards(outcomes)?;

    let mut rng = ctx.rng(None);
    let next_arm = experiment.choose_arm_with_rng(&mut rng)?;
    let size = args.ppd_size.unwrap_or(ctx.config.ppd.size);
    let ppd = experiment.get_ppd_with_rng(size, &mut rng)?;
    info!(
        model = M::NAME,
        rewards = outcomes.len(),
        next_arm = %next_arm,
        "replay finished"
    );

    let report = ReplayReport {
        model: M::NAME,
        rewards_applied: outcomes.len(),
        posteriors: experiment.posteriors().rounded(POSTERIOR_DECIMALS),
        next_arm,
        ppd,
    };

    if ctx.robot_mode {
        return emit_json(&robot_ok(report));
    }

    let mut layout = HumanLayout::new();
    layout
        .title("Replay")
        .kv("Model", report.model)
        .kv("Rewards", &report.rewards_applied.to_string())
        .kv("Next arm", &report.next_arm)
        .blank()
        .section("Posteriors");
    for (label, params) in report.posteriors.iter() {
        layout.kv(label, &format!("{params}  mean {:.4}", params.mean()));
    }
    layout.blank().section("Posterior predictive");
    layout.ppd(&report.ppd);
    emit_human(layout);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_log_parses_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rewards.json");
        std::fs::write(
            &path,
            r#"[{"label": "option1", "reward": 1}, {"label": "option2", "reward": 0.0}]"#,
        )
        .unwrap();
        let outcomes = load_outcomes(&path).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0], Outcome::new("option1", 1.0));
    }

    #[test]
    fn malformed_log_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rewards.json");
        std::fs::write(&path, "not json").unwrap();
        let err = load_outcomes(&path).unwrap_err();
        assert_eq!(err.code(), "serialization_error");
    }
}
