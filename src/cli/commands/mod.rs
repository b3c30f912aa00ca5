//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command
//!
//! Commands that drive an experiment dispatch once on the configured
//! [`ModelKind`] and then run fully generic over the reward model.

use clap::Subcommand;

pub mod prior;
pub mod replay;
pub mod simulate;

use crate::app::AppContext;
use crate::bandit::{Experiment, FromMoments, PriorBuilder, RewardModel};
use crate::config::{Config, PriorSpec};
use crate::error::Result;

pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Prior(args) => prior::run(ctx, args),
        Commands::Replay(args) => replay::run(ctx, args),
        Commands::Simulate(args) => simulate::run(ctx, args),
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute conjugate prior parameters from a mean and a variance or effective size
    Prior(prior::PriorArgs),

    /// Fold recorded rewards into the configured experiment and pick the next arm
    Replay(replay::ReplayArgs),

    /// Run the configured experiment against known true parameters
    Simulate(simulate::SimulateArgs),
}

/// Prior builder filled from `[[priors]]` rows in one batch.
pub(crate) fn priors_from_specs<P: FromMoments>(rows: &[PriorSpec]) -> Result<PriorBuilder<P>> {
    let (means, variances, sizes, labels) = PriorSpec::columns(rows);
    let mut builder = PriorBuilder::new();
    builder.add_multiple(&means, &variances, &sizes, &labels)?;
    Ok(builder)
}

/// Experiment described by the `[experiment]` and `[[priors]]` sections.
pub(crate) fn experiment_from_config<M>(config: &Config) -> Result<Experiment<M>>
where
    M: RewardModel,
    M::Params: FromMoments,
{
    let priors = if config.priors.is_empty() {
        None
    } else {
        Some(priors_from_specs::<M::Params>(&config.priors)?)
    };
    Experiment::new(
        config.experiment.arms,
        priors.as_ref(),
        config.experiment.label_list(),
    )
}
