//! Generic Thompson Sampling experiment.
//!
//! The selection loop, reward ingestion, and predictive simulation are written
//! once here. Everything that differs between reward models (default prior,
//! conjugate family, update rule, selection direction, outcome distribution)
//! lives behind [`RewardModel`].

use std::fmt;
use std::marker::PhantomData;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Result, TsError};

use super::params::{Family, Posterior};
use super::ppd::{PpdStats, PpdSummary};
use super::priors::PriorBuilder;
use super::store::PosteriorStore;

/// Which extreme of the Thompson draws wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    Maximum,
    Minimum,
}

impl Selection {
    /// True when `candidate` strictly beats `incumbent`; ties keep the incumbent.
    #[must_use]
    pub fn prefers(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::Maximum => candidate > incumbent,
            Self::Minimum => candidate < incumbent,
        }
    }
}

/// Descriptor for one reward model.
pub trait RewardModel {
    type Params: Posterior;

    /// Short model name used in logs and reports.
    const NAME: &'static str;

    const SELECTION: Selection;

    /// Posterior every arm starts from when no prior is supplied.
    fn default_params() -> Self::Params;

    /// Reject rewards outside the model's domain.
    fn validate_reward(reward: f64) -> Result<()>;

    /// Fold one observed reward into the arm's posterior.
    fn update(params: &mut Self::Params, reward: f64);

    /// Draw one outcome from the posterior predictive: a parameter from
    /// `params`, then an outcome conditioned on it.
    fn predictive_draw<R: Rng + ?Sized>(params: &Self::Params, rng: &mut R) -> Result<f64>;

    /// Reduce simulated outcomes to the reported statistics.
    fn summarize(outcomes: &[f64]) -> PpdStats;

    /// Draw one reward from the true process with parameter `truth`, used by
    /// simulations.
    fn simulate_reward<R: Rng + ?Sized>(truth: f64, rng: &mut R) -> Result<f64>;
}

/// One observed reward for an arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub label: String,
    pub reward: f64,
}

impl Outcome {
    pub fn new(label: impl Into<String>, reward: f64) -> Self {
        Self {
            label: label.into(),
            reward,
        }
    }
}

/// A bandit experiment over one reward model.
///
/// Reads (`choose_arm`, `get_ppd`, `sample_posterior`) take `&self` and only
/// consume randomness. `add_rewards` is the single mutation and needs
/// `&mut self`; callers sharing one experiment across threads wrap it in a
/// lock so that batches never interleave.
pub struct Experiment<M: RewardModel> {
    posteriors: PosteriorStore<M::Params>,
    model: PhantomData<M>,
}

impl<M: RewardModel> Clone for Experiment<M> {
    fn clone(&self) -> Self {
        Self {
            posteriors: self.posteriors.clone(),
            model: PhantomData,
        }
    }
}

impl<M: RewardModel> fmt::Debug for Experiment<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Experiment")
            .field("model", &M::NAME)
            .field("posteriors", &self.posteriors)
            .finish()
    }
}

impl<M: RewardModel> Experiment<M> {
    /// Build from an arm count or a prior snapshot.
    ///
    /// With `priors`, one arm is created per prior entry and the records are
    /// copied. Otherwise `arms` arms start from the model default, named
    /// `option1..optionN` unless `labels` is given. `labels` must match the
    /// arm count in both cases; with priors it renames the entries in order.
    pub fn new(
        arms: Option<usize>,
        priors: Option<&PriorBuilder<M::Params>>,
        labels: Option<Vec<String>>,
    ) -> Result<Self> {
        let posteriors: PosteriorStore<M::Params> = match (priors, arms) {
            (Some(priors), arms) => {
                if priors.is_empty() {
                    return Err(TsError::MissingConfiguration(
                        "prior specification has no arms".to_string(),
                    ));
                }
                if let Some(arms) = arms.filter(|&arms| arms != priors.len()) {
                    return Err(TsError::LabelMismatch {
                        expected: priors.len(),
                        actual: arms,
                    });
                }
                match labels {
                    Some(labels) => {
                        check_labels(priors.len(), &labels)?;
                        labels
                            .into_iter()
                            .zip(priors.priors().iter().map(|(_, params)| params.clone()))
                            .collect()
                    }
                    None => priors
                        .priors()
                        .iter()
                        .map(|(label, params)| (label, params.clone()))
                        .collect(),
                }
            }
            (None, Some(0)) => {
                return Err(TsError::InvalidParameter(
                    "arm count must be positive".to_string(),
                ));
            }
            (None, Some(arms)) => {
                let labels = match labels {
                    Some(labels) => {
                        check_labels(arms, &labels)?;
                        labels
                    }
                    None => (1..=arms).map(|i| format!("option{i}")).collect(),
                };
                labels
                    .into_iter()
                    .map(|label| (label, M::default_params()))
                    .collect()
            }
            (None, None) => {
                return Err(TsError::MissingConfiguration(
                    "must have either arms or priors specified".to_string(),
                ));
            }
        };

        debug!(model = M::NAME, arms = posteriors.len(), "experiment created");
        Ok(Self {
            posteriors,
            model: PhantomData,
        })
    }

    /// `arms` arms named `option1..optionN` at the default prior.
    pub fn with_arms(arms: usize) -> Result<Self> {
        Self::new(Some(arms), None, None)
    }

    /// One arm per label at the default prior.
    pub fn with_labels<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        Self::new(Some(labels.len()), None, Some(labels))
    }

    /// One arm per prior entry; the builder is copied, never aliased.
    pub fn from_priors(priors: &PriorBuilder<M::Params>) -> Result<Self> {
        Self::new(None, Some(priors), None)
    }

    #[must_use]
    pub const fn family() -> Family {
        <M::Params as Posterior>::FAMILY
    }

    #[must_use]
    pub const fn selection() -> Selection {
        M::SELECTION
    }

    #[must_use]
    pub const fn posteriors(&self) -> &PosteriorStore<M::Params> {
        &self.posteriors
    }

    #[must_use]
    pub fn posterior(&self, label: &str) -> Option<&M::Params> {
        self.posteriors.get(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.posteriors.labels()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.posteriors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posteriors.is_empty()
    }

    /// Thompson draw with the thread-local RNG.
    pub fn choose_arm(&self) -> Result<String> {
        self.choose_arm_with_rng(&mut rand::rng())
    }

    /// Sample once from every posterior and return the label whose draw is
    /// extremal in the model's [`Selection`] direction. Ties go to the arm
    /// that comes first in store order.
    pub fn choose_arm_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String> {
        let mut best: Option<(&str, f64)> = None;
        for (label, params) in self.posteriors.iter() {
            let theta = params.sample(rng)?;
            trace!(model = M::NAME, arm = label, theta, "thompson draw");
            let replace = match best {
                None => true,
                Some((_, incumbent)) => M::SELECTION.prefers(theta, incumbent),
            };
            if replace {
                best = Some((label, theta));
            }
        }
        best.map(|(label, _)| label.to_string())
            .ok_or_else(|| TsError::MissingConfiguration("experiment has no arms".to_string()))
    }

    /// Fold a batch of rewards into the posteriors, in order.
    ///
    /// Every label and reward is checked before anything is applied, so a bad
    /// entry leaves all posteriors untouched.
    pub fn add_rewards(&mut self, outcomes: &[Outcome]) -> Result<&mut Self> {
        for outcome in outcomes {
            if !self.posteriors.contains(&outcome.label) {
                return Err(TsError::UnknownArm(outcome.label.clone()));
            }
            M::validate_reward(outcome.reward).map_err(|err| match err {
                TsError::InvalidParameter(message) => {
                    TsError::InvalidParameter(format!("arm {}: {message}", outcome.label))
                }
                other => other,
            })?;
        }

        for outcome in outcomes {
            if let Some(params) = self.posteriors.get_mut(&outcome.label) {
                M::update(params, outcome.reward);
                params.enforce_floor();
            }
        }
        debug!(model = M::NAME, rewards = outcomes.len(), "rewards applied");
        Ok(self)
    }

    /// Posterior-predictive summary for every arm, thread-local RNG.
    pub fn get_ppd(&self, size: usize) -> Result<Vec<PpdSummary>> {
        self.get_ppd_with_rng(size, &mut rand::rng())
    }

    /// Simulate `size` predictive outcomes per arm and summarise them, in
    /// store order. Never touches the posteriors.
    pub fn get_ppd_with_rng<R: Rng + ?Sized>(
        &self,
        size: usize,
        rng: &mut R,
    ) -> Result<Vec<PpdSummary>> {
        check_size(size)?;
        self.posteriors
            .iter()
            .map(|(label, params)| summarize_arm::<M, R>(label, params, size, rng))
            .collect()
    }

    /// Posterior-predictive summary for a single arm.
    pub fn get_ppd_for(&self, label: &str, size: usize) -> Result<PpdSummary> {
        self.get_ppd_for_with_rng(label, size, &mut rand::rng())
    }

    pub fn get_ppd_for_with_rng<R: Rng + ?Sized>(
        &self,
        label: &str,
        size: usize,
        rng: &mut R,
    ) -> Result<PpdSummary> {
        check_size(size)?;
        let params = self
            .posteriors
            .get(label)
            .ok_or_else(|| TsError::UnknownArm(label.to_string()))?;
        summarize_arm::<M, R>(label, params, size, rng)
    }

    /// Raw parameter draws from one arm's posterior, e.g. for density plots.
    pub fn sample_posterior(&self, label: &str, size: usize) -> Result<Vec<f64>> {
        self.sample_posterior_with_rng(label, size, &mut rand::rng())
    }

    pub fn sample_posterior_with_rng<R: Rng + ?Sized>(
        &self,
        label: &str,
        size: usize,
        rng: &mut R,
    ) -> Result<Vec<f64>> {
        let params = self
            .posteriors
            .get(label)
            .ok_or_else(|| TsError::UnknownArm(label.to_string()))?;
        (0..size).map(|_| params.sample(rng)).collect()
    }
}

fn check_labels(expected: usize, labels: &[String]) -> Result<()> {
    if labels.len() != expected {
        return Err(TsError::LabelMismatch {
            expected,
            actual: labels.len(),
        });
    }
    let mut seen = std::collections::HashSet::with_capacity(labels.len());
    if let Some(duplicate) = labels.iter().find(|label| !seen.insert(label.as_str())) {
        return Err(TsError::InvalidParameter(format!(
            "duplicate arm label: {duplicate}"
        )));
    }
    Ok(())
}

fn check_size(size: usize) -> Result<()> {
    if size == 0 {
        return Err(TsError::InvalidParameter(
            "ppd size must be a positive number of draws".to_string(),
        ));
    }
    Ok(())
}

fn summarize_arm<M: RewardModel, R: Rng + ?Sized>(
    label: &str,
    params: &M::Params,
    size: usize,
    rng: &mut R,
) -> Result<PpdSummary> {
    let outcomes = (0..size)
        .map(|_| M::predictive_draw(params, rng))
        .collect::<Result<Vec<_>>>()?;
    Ok(PpdSummary {
        label: label.to_string(),
        draws: size,
        stats: M::summarize(&outcomes),
    })
}
