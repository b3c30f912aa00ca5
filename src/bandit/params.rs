//! Conjugate posterior parameter records.
//!
//! Every arm carries one of these records. Beta models a success probability,
//! Gamma (shape/scale) models a positive rate. All fields stay strictly
//! positive and finite: update rules are additive, and
//! [`Posterior::enforce_floor`] only repairs values that are NaN, infinite or
//! not positive. Legitimately tiny values are left alone.

use std::fmt;

use rand::Rng;
use rand_distr::{Beta, Distribution, Gamma};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TsError};

use super::ppd::round_to;

/// Value a degenerate (zero, negative or NaN) posterior field is repaired to.
pub const MIN_PARAM: f64 = f64::MIN_POSITIVE;

/// Conjugate family tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Beta,
    Gamma,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Beta => f.write_str("beta"),
            Self::Gamma => f.write_str("gamma"),
        }
    }
}

impl std::str::FromStr for Family {
    type Err = TsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "beta" => Ok(Self::Beta),
            "gamma" => Ok(Self::Gamma),
            other => Err(TsError::InvalidParameter(format!(
                "{other} not recognized, specify either 'beta' or 'gamma'"
            ))),
        }
    }
}

/// A posterior record that can be sampled for Thompson draws.
pub trait Posterior: Clone + fmt::Debug + fmt::Display + PartialEq + Serialize {
    const FAMILY: Family;

    /// Draw one parameter value from the distribution.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64>;

    fn mean(&self) -> f64;

    fn variance(&self) -> f64;

    /// Repair NaN or non-positive fields to [`MIN_PARAM`] and infinite ones to
    /// `f64::MAX`. Finite positive values are kept exactly.
    fn enforce_floor(&mut self);

    /// Copy with every field rounded to `places` decimals (never below the floor).
    #[must_use]
    fn rounded(&self, places: u32) -> Self;
}

fn floored(value: f64) -> f64 {
    if value.is_nan() || value <= 0.0 {
        MIN_PARAM
    } else if value.is_infinite() {
        f64::MAX
    } else {
        value
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TsError::InvalidParameter(format!(
            "{name}: {value} must be a positive finite number"
        )))
    }
}

/// Beta(a, b): `a` pseudo-successes, `b` pseudo-failures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaParams {
    pub a: f64,
    pub b: f64,
}

impl BetaParams {
    /// Uniform belief over (0, 1).
    pub const UNIFORM: Self = Self { a: 1.0, b: 1.0 };

    pub fn new(a: f64, b: f64) -> Result<Self> {
        check_positive("a", a)?;
        check_positive("b", b)?;
        Ok(Self { a, b })
    }
}

impl Posterior for BetaParams {
    const FAMILY: Family = Family::Beta;

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        let dist = Beta::new(self.a, self.b)
            .map_err(|err| TsError::Sampling(format!("beta({}, {}): {err}", self.a, self.b)))?;
        Ok(dist.sample(rng))
    }

    fn mean(&self) -> f64 {
        self.a / (self.a + self.b)
    }

    fn variance(&self) -> f64 {
        let total = self.a + self.b;
        self.a * self.b / (total * total * (total + 1.0))
    }

    fn enforce_floor(&mut self) {
        self.a = floored(self.a);
        self.b = floored(self.b);
    }

    fn rounded(&self, places: u32) -> Self {
        Self {
            a: floored(round_to(self.a, places)),
            b: floored(round_to(self.b, places)),
        }
    }
}

impl fmt::Display for BetaParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Beta(a={}, b={})", self.a, self.b)
    }
}

/// Gamma in shape/scale form; the rate is `1 / scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GammaParams {
    pub shape: f64,
    pub scale: f64,
}

impl GammaParams {
    /// Weakly informative, high-variance prior used by the count and
    /// waiting-time models.
    pub const VAGUE: Self = Self {
        shape: 0.001,
        scale: 1000.0,
    };

    pub fn new(shape: f64, scale: f64) -> Result<Self> {
        check_positive("shape", shape)?;
        check_positive("scale", scale)?;
        Ok(Self { shape, scale })
    }

    #[must_use]
    pub fn rate(&self) -> f64 {
        1.0 / self.scale
    }
}

impl Posterior for GammaParams {
    const FAMILY: Family = Family::Gamma;

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        let dist = Gamma::new(self.shape, self.scale).map_err(|err| {
            TsError::Sampling(format!("gamma({}, {}): {err}", self.shape, self.scale))
        })?;
        Ok(dist.sample(rng))
    }

    fn mean(&self) -> f64 {
        self.shape * self.scale
    }

    fn variance(&self) -> f64 {
        self.shape * self.scale * self.scale
    }

    fn enforce_floor(&mut self) {
        self.shape = floored(self.shape);
        self.scale = floored(self.scale);
    }

    fn rounded(&self, places: u32) -> Self {
        Self {
            shape: floored(round_to(self.shape, places)),
            scale: floored(round_to(self.scale, places)),
        }
    }
}

impl fmt::Display for GammaParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gamma(shape={}, scale={})", self.shape, self.scale)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn beta_moments() {
        let params = BetaParams::new(2.0, 6.0).unwrap();
        assert!((params.mean() - 0.25).abs() < 1e-12);
        assert!((params.variance() - 12.0 / (64.0 * 9.0)).abs() < 1e-12);
    }

    #[test]
    fn gamma_moments_and_rate() {
        let params = GammaParams::new(4.0, 0.5).unwrap();
        assert!((params.mean() - 2.0).abs() < 1e-12);
        assert!((params.variance() - 1.0).abs() < 1e-12);
        assert!((params.rate() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn constructors_reject_non_positive() {
        assert!(matches!(
            BetaParams::new(0.0, 1.0),
            Err(TsError::InvalidParameter(_))
        ));
        assert!(matches!(
            GammaParams::new(1.0, f64::NAN),
            Err(TsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn floor_repairs_degenerate_fields() {
        let mut params = GammaParams {
            shape: f64::NAN,
            scale: -3.0,
        };
        params.enforce_floor();
        assert_eq!(params.shape, MIN_PARAM);
        assert_eq!(params.scale, MIN_PARAM);
    }

    #[test]
    fn floor_keeps_tiny_positive_values() {
        let mut params = GammaParams {
            shape: 1e-11,
            scale: 5e-11,
        };
        params.enforce_floor();
        assert_eq!(params.shape, 1e-11);
        assert_eq!(params.scale, 5e-11);

        let mut params = BetaParams {
            a: f64::INFINITY,
            b: 0.0,
        };
        params.enforce_floor();
        assert_eq!(params.a, f64::MAX);
        assert_eq!(params.b, MIN_PARAM);
    }

    #[test]
    fn rounding_never_reaches_zero() {
        let params = GammaParams {
            shape: 3.0,
            scale: 0.000_01,
        };
        let view = params.rounded(4);
        assert!(view.scale > 0.0);
        assert_eq!(view.shape, 3.0);
    }

    #[test]
    fn samples_stay_in_support() {
        let mut rng = StdRng::seed_from_u64(7);
        let beta = BetaParams::new(3.0, 5.0).unwrap();
        let gamma = GammaParams::VAGUE;
        for _ in 0..500 {
            let p = beta.sample(&mut rng).unwrap();
            assert!((0.0..=1.0).contains(&p));
            let rate = gamma.sample(&mut rng).unwrap();
            assert!(rate >= 0.0);
        }
    }

    #[test]
    fn family_parses_case_insensitively() {
        assert_eq!("Beta".parse::<Family>().unwrap(), Family::Beta);
        assert_eq!(" gamma ".parse::<Family>().unwrap(), Family::Gamma);
        assert!("normal".parse::<Family>().is_err());
    }
}
