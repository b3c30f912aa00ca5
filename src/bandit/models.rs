//! Reward models: Bernoulli successes, Poisson counts, Exponential waits.

use rand::Rng;
use rand_distr::{Distribution, Exp, Poisson as PoissonDist};
use tracing::warn;

use crate::error::{Result, TsError};

use super::experiment::{Experiment, RewardModel, Selection};
use super::params::{BetaParams, GammaParams, Posterior};
use super::ppd::PpdStats;

/// Largest rate handed to the Poisson sampler.
const MAX_POISSON_RATE: f64 = 1e15;

/// Smallest rate handed to the Exponential sampler.
const MIN_EXP_RATE: f64 = 1e-100;

pub type BernoulliExperiment = Experiment<Bernoulli>;
pub type PoissonExperiment = Experiment<Poisson>;
pub type ExponentialExperiment = Experiment<Exponential>;

fn check_reward(ok: bool, reward: f64, domain: &str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(TsError::InvalidParameter(format!(
            "reward {reward} must be {domain}"
        )))
    }
}

fn poisson_draw<R: Rng + ?Sized>(rate: f64, rng: &mut R) -> Result<f64> {
    if rate.is_nan() || rate <= 0.0 {
        return Ok(0.0);
    }
    if rate > MAX_POISSON_RATE {
        warn!(rate, cap = MAX_POISSON_RATE, "poisson rate clamped");
    }
    let dist = PoissonDist::new(rate.min(MAX_POISSON_RATE))
        .map_err(|err| TsError::Sampling(format!("poisson({rate}): {err}")))?;
    Ok(dist.sample(rng))
}

fn exponential_draw<R: Rng + ?Sized>(rate: f64, rng: &mut R) -> Result<f64> {
    let rate = if rate.is_nan() { MIN_EXP_RATE } else { rate.max(MIN_EXP_RATE) };
    let dist = Exp::new(rate).map_err(|err| TsError::Sampling(format!("exp({rate}): {err}")))?;
    Ok(dist.sample(rng))
}

/// Success/failure rewards with a Beta posterior over the success probability.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bernoulli;

impl RewardModel for Bernoulli {
    type Params = BetaParams;

    const NAME: &'static str = "bernoulli";

    const SELECTION: Selection = Selection::Maximum;

    fn default_params() -> BetaParams {
        BetaParams::UNIFORM
    }

    fn validate_reward(reward: f64) -> Result<()> {
        check_reward(reward == 0.0 || reward == 1.0, reward, "0 or 1")
    }

    fn update(params: &mut BetaParams, reward: f64) {
        params.a += reward;
        params.b += 1.0 - reward;
    }

    fn predictive_draw<R: Rng + ?Sized>(params: &BetaParams, rng: &mut R) -> Result<f64> {
        let p = params.sample(rng)?;
        Ok(if rng.random_bool(p.clamp(0.0, 1.0)) { 1.0 } else { 0.0 })
    }

    fn summarize(outcomes: &[f64]) -> PpdStats {
        PpdStats::binary(outcomes)
    }

    fn simulate_reward<R: Rng + ?Sized>(truth: f64, rng: &mut R) -> Result<f64> {
        if !(0.0..=1.0).contains(&truth) {
            return Err(TsError::InvalidParameter(format!(
                "success probability {truth} must be in [0,1]"
            )));
        }
        Ok(if rng.random_bool(truth) { 1.0 } else { 0.0 })
    }
}

/// Count rewards with a Gamma posterior over the Poisson rate.
///
/// Each observation counts as one unit of exposure.
#[derive(Debug, Clone, Copy, Default)]
pub struct Poisson;

impl RewardModel for Poisson {
    type Params = GammaParams;

    const NAME: &'static str = "poisson";

    const SELECTION: Selection = Selection::Maximum;

    fn default_params() -> GammaParams {
        GammaParams::VAGUE
    }

    fn validate_reward(reward: f64) -> Result<()> {
        check_reward(
            reward.is_finite() && reward >= 0.0 && reward.fract() == 0.0,
            reward,
            "a non-negative integer count",
        )
    }

    fn update(params: &mut GammaParams, reward: f64) {
        params.shape += reward;
        params.scale = 1.0 / (1.0 / params.scale + 1.0);
    }

    fn predictive_draw<R: Rng + ?Sized>(params: &GammaParams, rng: &mut R) -> Result<f64> {
        let rate = params.sample(rng)?;
        poisson_draw(rate, rng)
    }

    fn summarize(outcomes: &[f64]) -> PpdStats {
        PpdStats::interval(outcomes)
    }

    fn simulate_reward<R: Rng + ?Sized>(truth: f64, rng: &mut R) -> Result<f64> {
        if !(truth.is_finite() && truth >= 0.0) {
            return Err(TsError::InvalidParameter(format!(
                "poisson rate {truth} must be non-negative"
            )));
        }
        poisson_draw(truth, rng)
    }
}

/// Waiting-time rewards with a Gamma posterior over the Exponential rate.
///
/// Selection picks the *smallest* sampled rate, i.e. the arm with the longest
/// expected wait. Invert the reward when shorter waits are better.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exponential;

impl RewardModel for Exponential {
    type Params = GammaParams;

    const NAME: &'static str = "exponential";

    const SELECTION: Selection = Selection::Minimum;

    fn default_params() -> GammaParams {
        GammaParams::VAGUE
    }

    fn validate_reward(reward: f64) -> Result<()> {
        check_reward(
            reward.is_finite() && reward >= 0.0,
            reward,
            "a non-negative waiting time",
        )
    }

    fn update(params: &mut GammaParams, reward: f64) {
        params.shape += 1.0;
        params.scale = 1.0 / (1.0 / params.scale + reward);
    }

    /// Sampled rate → scale `1 / rate` → one Exponential waiting time.
    fn predictive_draw<R: Rng + ?Sized>(params: &GammaParams, rng: &mut R) -> Result<f64> {
        let rate = params.sample(rng)?;
        exponential_draw(rate, rng)
    }

    fn summarize(outcomes: &[f64]) -> PpdStats {
        PpdStats::interval(outcomes)
    }

    fn simulate_reward<R: Rng + ?Sized>(truth: f64, rng: &mut R) -> Result<f64> {
        if !(truth.is_finite() && truth > 0.0) {
            return Err(TsError::InvalidParameter(format!(
                "exponential rate {truth} must be positive"
            )));
        }
        exponential_draw(truth, rng)
    }
}
