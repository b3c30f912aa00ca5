use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bandit::Family;
use crate::error::{Result, TsError};

/// File name looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "thompson.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub experiment: ExperimentConfig,
    #[serde(default)]
    pub priors: Vec<PriorSpec>,
    #[serde(default)]
    pub ppd: PpdConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Config {
    /// Defaults, then either the explicit file (argument or `THOMPSON_CONFIG`)
    /// or the global and project files, then `THOMPSON_*` environment
    /// overrides.
    pub fn load(explicit_path: Option<&Path>, project_dir: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("THOMPSON_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            let patch = Self::load_patch(&path)?.ok_or_else(|| {
                TsError::Config(format!("config file {} not found", path.display()))
            })?;
            config.merge_patch(patch);
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_patch(&project_dir.join(PROJECT_CONFIG_FILE))? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("thompson/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| TsError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| TsError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.experiment {
            self.experiment.merge(patch);
        }
        if let Some(priors) = patch.priors {
            self.priors = priors;
        }
        if let Some(patch) = patch.ppd {
            self.ppd.merge(patch);
        }
        if let Some(patch) = patch.simulation {
            self.simulation.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `THOMPSON_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("THOMPSON_MODEL") {
            self.experiment.model = value.parse()?;
        }
        if let Some(value) = parse_var::<usize, _>(&lookup, "THOMPSON_ARMS")? {
            self.experiment.arms = Some(value);
        }
        if let Some(values) = list_var(&lookup, "THOMPSON_LABELS") {
            self.experiment.labels = values;
        }
        if let Some(value) = parse_var::<u64, _>(&lookup, "THOMPSON_SEED")? {
            self.experiment.seed = Some(value);
        }
        if let Some(value) = parse_var::<usize, _>(&lookup, "THOMPSON_PPD_SIZE")? {
            self.ppd.size = value;
        }
        if let Some(value) = parse_var::<usize, _>(&lookup, "THOMPSON_SIM_ROUNDS")? {
            self.simulation.rounds = value;
        }
        if let Some(values) = list_var(&lookup, "THOMPSON_SIM_TRUTH") {
            self.simulation.truth = values
                .iter()
                .map(|value| {
                    value.parse::<f64>().map_err(|err| {
                        TsError::Config(format!("invalid THOMPSON_SIM_TRUTH value {value}: {err}"))
                    })
                })
                .collect::<Result<_>>()?;
        }
        Ok(())
    }
}

/// Reward model selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[default]
    Bernoulli,
    Poisson,
    Exponential,
}

impl ModelKind {
    #[must_use]
    pub const fn family(self) -> Family {
        match self {
            Self::Bernoulli => Family::Beta,
            Self::Poisson | Self::Exponential => Family::Gamma,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bernoulli => "bernoulli",
            Self::Poisson => "poisson",
            Self::Exponential => "exponential",
        }
    }
}

impl std::str::FromStr for ModelKind {
    type Err = TsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bernoulli" => Ok(Self::Bernoulli),
            "poisson" => Ok(Self::Poisson),
            "exponential" => Ok(Self::Exponential),
            other => Err(TsError::Config(format!(
                "unknown model {other}, expected bernoulli, poisson or exponential"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub model: ModelKind,
    #[serde(default)]
    pub arms: Option<usize>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ExperimentConfig {
    fn merge(&mut self, patch: ExperimentPatch) {
        if let Some(value) = patch.model {
            self.model = value;
        }
        if let Some(value) = patch.arms {
            self.arms = Some(value);
        }
        if let Some(values) = patch.labels {
            self.labels = values;
        }
        if let Some(value) = patch.seed {
            self.seed = Some(value);
        }
    }

    /// Labels as the optional list the experiment constructor expects.
    #[must_use]
    pub fn label_list(&self) -> Option<Vec<String>> {
        if self.labels.is_empty() {
            None
        } else {
            Some(self.labels.clone())
        }
    }
}

/// One `[[priors]]` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorSpec {
    pub label: String,
    pub mean: f64,
    #[serde(default)]
    pub variance: Option<f64>,
    #[serde(default)]
    pub effective_size: Option<f64>,
}

/// Column view of prior rows: means, variances, effective sizes, labels.
pub type PriorColumns = (Vec<f64>, Vec<Option<f64>>, Vec<Option<f64>>, Vec<String>);

impl PriorSpec {
    #[must_use]
    pub fn columns(rows: &[Self]) -> PriorColumns {
        let mut columns: PriorColumns = (
            Vec::with_capacity(rows.len()),
            Vec::with_capacity(rows.len()),
            Vec::with_capacity(rows.len()),
            Vec::with_capacity(rows.len()),
        );
        for row in rows {
            columns.0.push(row.mean);
            columns.1.push(row.variance);
            columns.2.push(row.effective_size);
            columns.3.push(row.label.clone());
        }
        columns
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PpdConfig {
    #[serde(default = "default_ppd_size")]
    pub size: usize,
}

const fn default_ppd_size() -> usize {
    10_000
}

impl Default for PpdConfig {
    fn default() -> Self {
        Self {
            size: default_ppd_size(),
        }
    }
}

impl PpdConfig {
    fn merge(&mut self, patch: PpdPatch) {
        if let Some(value) = patch.size {
            self.size = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_rounds")]
    pub rounds: usize,
    /// True per-arm parameter: success probability, Poisson rate, or
    /// Exponential rate, in arm order.
    #[serde(default)]
    pub truth: Vec<f64>,
}

const fn default_rounds() -> usize {
    1_000
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            truth: Vec::new(),
        }
    }
}

impl SimulationConfig {
    fn merge(&mut self, patch: SimulationPatch) {
        if let Some(value) = patch.rounds {
            self.rounds = value;
        }
        if let Some(values) = patch.truth {
            self.truth = values;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    experiment: Option<ExperimentPatch>,
    priors: Option<Vec<PriorSpec>>,
    ppd: Option<PpdPatch>,
    simulation: Option<SimulationPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ExperimentPatch {
    model: Option<ModelKind>,
    arms: Option<usize>,
    labels: Option<Vec<String>>,
    seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PpdPatch {
    size: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SimulationPatch {
    rounds: Option<usize>,
    truth: Option<Vec<f64>>,
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| TsError::Config(format!("invalid {key} value {value}: {err}"))),
        None => Ok(None),
    }
}

fn list_var<F>(lookup: &F, key: &str) -> Option<Vec<String>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.experiment.model, ModelKind::Bernoulli);
        assert_eq!(config.experiment.arms, None);
        assert_eq!(config.ppd.size, 10_000);
        assert_eq!(config.simulation.rounds, 1_000);
        assert!(config.priors.is_empty());
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut config = Config::default();
        let patch: ConfigPatch = toml::from_str(
            r#"
            [experiment]
            model = "poisson"
            arms = 4

            [ppd]
            size = 500
            "#,
        )
        .unwrap();
        config.merge_patch(patch);
        assert_eq!(config.experiment.model, ModelKind::Poisson);
        assert_eq!(config.experiment.arms, Some(4));
        assert_eq!(config.ppd.size, 500);
        assert_eq!(config.simulation.rounds, 1_000);
    }

    #[test]
    fn prior_rows_parse_with_missing_columns() {
        let config: Config = toml::from_str(
            r#"
            [experiment]
            model = "exponential"

            [[priors]]
            label = "fast"
            mean = 0.1
            variance = 0.1

            [[priors]]
            label = "slow"
            mean = 0.2
            effective_size = 20
            "#,
        )
        .unwrap();
        let (means, variances, sizes, labels) = PriorSpec::columns(&config.priors);
        assert_eq!(means, vec![0.1, 0.2]);
        assert_eq!(variances, vec![Some(0.1), None]);
        assert_eq!(sizes, vec![None, Some(20.0)]);
        assert_eq!(labels, vec!["fast", "slow"]);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                ("THOMPSON_MODEL", "Exponential"),
                ("THOMPSON_ARMS", "3"),
                ("THOMPSON_LABELS", "a, b ,c"),
                ("THOMPSON_SEED", "42"),
                ("THOMPSON_PPD_SIZE", "250"),
                ("THOMPSON_SIM_TRUTH", "0.1,0.2,0.3"),
            ]))
            .unwrap();
        assert_eq!(config.experiment.model, ModelKind::Exponential);
        assert_eq!(config.experiment.arms, Some(3));
        assert_eq!(config.experiment.labels, vec!["a", "b", "c"]);
        assert_eq!(config.experiment.seed, Some(42));
        assert_eq!(config.ppd.size, 250);
        assert_eq!(config.simulation.truth, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn bad_env_values_are_config_errors() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(lookup_from(&[("THOMPSON_ARMS", "many")]))
            .unwrap_err();
        assert!(matches!(err, TsError::Config(_)));

        let err = config
            .apply_overrides(lookup_from(&[("THOMPSON_MODEL", "gaussian")]))
            .unwrap_err();
        assert!(matches!(err, TsError::Config(_)));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = Config::load(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, TsError::Config(_)));
    }

    #[test]
    fn explicit_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exp.toml");
        std::fs::write(
            &path,
            "[experiment]\nmodel = \"poisson\"\nlabels = [\"x\", \"y\"]\n",
        )
        .unwrap();
        let config = Config::load(Some(&path), dir.path()).unwrap();
        assert_eq!(config.experiment.model, ModelKind::Poisson);
        assert_eq!(config.experiment.label_list(), Some(vec!["x".into(), "y".into()]));
    }

    #[test]
    fn model_family() {
        assert_eq!(ModelKind::Bernoulli.family(), Family::Beta);
        assert_eq!(ModelKind::Poisson.family(), Family::Gamma);
        assert_eq!(ModelKind::Exponential.as_str(), "exponential");
    }
}
