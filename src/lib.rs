//! thompson - Thompson Sampling bandits over conjugate posteriors
//!
//! Build Beta or Gamma priors from a mean and a variance or effective sample
//! size, run Bernoulli, Poisson or Exponential experiments, pick arms by
//! Thompson draws and summarise posterior-predictive outcomes.

pub mod app;
pub mod bandit;
pub mod cli;
pub mod config;
pub mod error;

pub use bandit::{
    BernoulliExperiment, BetaPrior, Experiment, ExponentialExperiment, GammaPrior, Outcome,
    PoissonExperiment, PriorBuilder,
};
pub use error::{Result, TsError};
