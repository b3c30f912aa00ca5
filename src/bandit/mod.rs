//! Thompson Sampling bandits over conjugate posteriors.
//!
//! This module provides:
//! - `PriorBuilder`: turns (mean, variance / effective size) into Beta or Gamma priors
//! - `PosteriorStore`: ordered per-arm posterior records
//! - `Experiment`: arm selection, reward ingestion and posterior-predictive reports,
//!   specialised by a `RewardModel` (Bernoulli, Poisson, Exponential)

pub mod experiment;
pub mod models;
pub mod params;
pub mod ppd;
pub mod priors;
pub mod store;

pub use experiment::{Experiment, Outcome, RewardModel, Selection};
pub use models::{
    Bernoulli, BernoulliExperiment, Exponential, ExponentialExperiment, Poisson,
    PoissonExperiment,
};
pub use params::{BetaParams, Family, GammaParams, MIN_PARAM, Posterior};
pub use ppd::{PpdStats, PpdSummary};
pub use priors::{BetaPrior, FromMoments, GammaPrior, PriorBuilder};
pub use store::PosteriorStore;

/// Decimal places used when posteriors are shown to people.
pub const POSTERIOR_DECIMALS: u32 = 4;
