use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;

pub struct AppContext {
    pub config: Config,
    pub robot_mode: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let project_dir = std::env::current_dir()?;
        let config = Config::load(cli.config.as_deref(), &project_dir)?;
        debug!(
            model = config.experiment.model.as_str(),
            priors = config.priors.len(),
            "config loaded"
        );

        Ok(Self {
            config,
            robot_mode: cli.robot,
        })
    }

    /// RNG for one command: `seed_override`, else `[experiment].seed`, else
    /// fresh entropy.
    #[must_use]
    pub fn rng(&self, seed_override: Option<u64>) -> StdRng {
        match seed_override.or(self.config.experiment.seed) {
            Some(seed) => {
                debug!(seed, "using seeded rng");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    fn context(seed: Option<u64>) -> AppContext {
        let mut config = Config::default();
        config.experiment.seed = seed;
        AppContext {
            config,
            robot_mode: false,
        }
    }

    #[test]
    fn configured_seed_is_reproducible() {
        let ctx = context(Some(42));
        let first: u64 = ctx.rng(None).random();
        let second: u64 = ctx.rng(None).random();
        assert_eq!(first, second);
    }

    #[test]
    fn override_beats_configured_seed() {
        let ctx = context(Some(42));
        let configured: u64 = ctx.rng(None).random();
        let overridden: u64 = ctx.rng(Some(7)).random();
        assert_ne!(configured, overridden);
        assert_eq!(overridden, StdRng::seed_from_u64(7).random::<u64>());
    }
}
