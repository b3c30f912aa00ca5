//! Prior construction from interpretable moments.
//!
//! Callers describe their belief about an arm with a mean plus either a
//! variance or an effective sample size ("worth N observations"). The builder
//! turns that into native Beta or Gamma parameters and accumulates one record
//! per label, ready to seed an experiment.

use tracing::debug;

use crate::error::{Result, TsError};

use super::params::{BetaParams, GammaParams, Posterior};
use super::store::PosteriorStore;

/// Conversion from (mean, variance, effective size) to a conjugate record.
pub trait FromMoments: Posterior {
    fn from_moments(mean: f64, variance: Option<f64>, effective_size: Option<f64>)
    -> Result<Self>;
}

fn invalid(message: String) -> TsError {
    TsError::InvalidParameter(message)
}

impl FromMoments for BetaParams {
    /// Moment-matched Beta rescaled so that `a + b == effective_size`.
    fn from_moments(
        mean: f64,
        variance: Option<f64>,
        effective_size: Option<f64>,
    ) -> Result<Self> {
        if !(mean > 0.0 && mean < 1.0) {
            return Err(invalid(format!("mean: {mean} must be in (0,1)")));
        }
        let variance =
            variance.ok_or_else(|| invalid("variance is required for beta priors".to_string()))?;
        let bound = 0.25_f64.min(mean * (1.0 - mean));
        if !(variance > 0.0 && variance < bound) {
            return Err(invalid(format!(
                "variance: {variance} must be in (0,{bound:.3})"
            )));
        }
        let effective_size = effective_size
            .ok_or_else(|| invalid("effective_size is required for beta priors".to_string()))?;
        if !(effective_size > 0.0 && effective_size.is_finite()) {
            return Err(invalid(format!(
                "effective_size: {effective_size} must be greater than 0"
            )));
        }

        let alpha = ((1.0 - mean) / variance - 1.0 / mean) * mean * mean;
        let beta = alpha * (1.0 / mean - 1.0);
        let ratio = effective_size / (alpha + beta);
        let mut params = Self {
            a: alpha * ratio,
            b: beta * ratio,
        };
        params.enforce_floor();
        Ok(params)
    }
}

impl FromMoments for GammaParams {
    /// Exactly one of `variance` or `effective_size` selects the branch:
    /// variance gives `rate = mean / variance`, effective size gives
    /// `rate = effective_size`. Supplying both is ambiguous and rejected.
    fn from_moments(
        mean: f64,
        variance: Option<f64>,
        effective_size: Option<f64>,
    ) -> Result<Self> {
        if !(mean > 0.0 && mean.is_finite()) {
            return Err(invalid(format!("mean: {mean} must be greater than 0")));
        }
        let (shape, rate) = match (variance, effective_size) {
            (Some(_), Some(_)) => {
                return Err(invalid(
                    "supply either variance or effective_size for gamma priors, not both"
                        .to_string(),
                ));
            }
            (None, None) => {
                return Err(invalid(
                    "gamma priors need a variance or an effective_size".to_string(),
                ));
            }
            (Some(variance), None) => {
                if !(variance > 0.0 && variance.is_finite()) {
                    return Err(invalid(format!(
                        "variance: {variance} must be greater than 0"
                    )));
                }
                (mean * mean / variance, mean / variance)
            }
            (None, Some(effective_size)) => {
                if !(effective_size > 0.0 && effective_size.is_finite()) {
                    return Err(invalid(format!(
                        "effective_size: {effective_size} must be greater than 0"
                    )));
                }
                (mean * effective_size, effective_size)
            }
        };
        let mut params = Self {
            shape,
            scale: 1.0 / rate,
        };
        params.enforce_floor();
        Ok(params)
    }
}

/// Accumulates per-arm priors of one conjugate family.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorBuilder<P> {
    priors: PosteriorStore<P>,
}

pub type BetaPrior = PriorBuilder<BetaParams>;
pub type GammaPrior = PriorBuilder<GammaParams>;

impl<P: FromMoments> Default for PriorBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: FromMoments> PriorBuilder<P> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            priors: PosteriorStore::new(),
        }
    }

    /// Compute one record and store it under `label`, replacing any previous
    /// record for that label.
    pub fn add_one(
        &mut self,
        mean: f64,
        variance: Option<f64>,
        effective_size: Option<f64>,
        label: impl Into<String>,
    ) -> Result<&mut Self> {
        let label = label.into();
        let params = P::from_moments(mean, variance, effective_size)?;
        debug!(label = %label, family = %P::FAMILY, ?params, "prior added");
        self.priors.insert(label, params);
        Ok(self)
    }

    /// Batch form of [`Self::add_one`] over four parallel sequences.
    ///
    /// Lengths are checked before any row is processed, and every row is
    /// validated before any is stored, so a failing batch leaves the builder
    /// untouched.
    pub fn add_multiple<S: AsRef<str>>(
        &mut self,
        means: &[f64],
        variances: &[Option<f64>],
        effective_sizes: &[Option<f64>],
        labels: &[S],
    ) -> Result<&mut Self> {
        let rows = means.len();
        if variances.len() != rows || effective_sizes.len() != rows || labels.len() != rows {
            return Err(invalid(format!(
                "batch lengths differ: means={}, variances={}, effective_sizes={}, labels={}",
                rows,
                variances.len(),
                effective_sizes.len(),
                labels.len()
            )));
        }

        let computed = means
            .iter()
            .zip(variances)
            .zip(effective_sizes)
            .zip(labels)
            .enumerate()
            .map(|(row, (((&mean, &variance), &effective_size), label))| {
                P::from_moments(mean, variance, effective_size)
                    .map(|params| (label.as_ref().to_string(), params))
                    .map_err(|err| match err {
                        TsError::InvalidParameter(message) => {
                            invalid(format!("row {row} ({}): {message}", label.as_ref()))
                        }
                        other => other,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(rows, family = %P::FAMILY, "prior batch added");
        for (label, params) in computed {
            self.priors.insert(label, params);
        }
        Ok(self)
    }
}

impl<P: Posterior> PriorBuilder<P> {
    #[must_use]
    pub const fn priors(&self) -> &PosteriorStore<P> {
        &self.priors
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<&P> {
        self.priors.get(label)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.priors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.priors.is_empty()
    }
}
