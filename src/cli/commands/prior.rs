//! `thompson prior`: conjugate parameters from interpretable moments.

use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::app::AppContext;
use crate::bandit::ppd::round_to;
use crate::bandit::{BetaParams, Family, FromMoments, GammaParams, POSTERIOR_DECIMALS, PriorBuilder};
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::config::PriorSpec;
use crate::error::{Result, TsError};

use super::priors_from_specs;

#[derive(Args, Debug, Default)]
pub struct PriorArgs {
    /// Distribution family (defaults to the configured model's family)
    #[arg(long)]
    pub family: Option<Family>,

    /// Prior mean; without it every [[priors]] row of the config is computed
    #[arg(long, allow_negative_numbers = true)]
    pub mean: Option<f64>,

    /// Prior variance
    #[arg(long, allow_negative_numbers = true)]
    pub variance: Option<f64>,

    /// Effective sample size (pseudo-observations)
    #[arg(long, allow_negative_numbers = true)]
    pub effective_size: Option<f64>,

    /// Label for the single prior given on the command line
    #[arg(long, default_value = "option1")]
    pub label: String,
}

#[derive(Serialize)]
struct PriorRow<P> {
    label: String,
    params: P,
    mean: f64,
    variance: f64,
}

#[derive(Serialize)]
struct PriorReport<P> {
    family: Family,
    priors: Vec<PriorRow<P>>,
}

pub fn run(ctx: &AppContext, args: &PriorArgs) -> Result<()> {
    let family = args
        .family
        .unwrap_or_else(|| ctx.config.experiment.model.family());
    let rows = match args.mean {
        Some(mean) => vec![PriorSpec {
            label: args.label.clone(),
            mean,
            variance: args.variance,
            effective_size: args.effective_size,
        }],
        None if ctx.config.priors.is_empty() => {
            return Err(TsError::MissingConfiguration(
                "pass --mean or add [[priors]] rows to the config".to_string(),
            ));
        }
        None => ctx.config.priors.clone(),
    };

    match family {
        Family::Beta => report::<BetaParams>(ctx, &rows),
        Family::Gamma => report::<GammaParams>(ctx, &rows),
    }
}

fn report<P: FromMoments>(ctx: &AppContext, rows: &[PriorSpec]) -> Result<()> {
    let builder: PriorBuilder<P> = priors_from_specs(rows)?;
    info!(family = %P::FAMILY, priors = builder.len(), "priors computed");

    let report = PriorReport {
        family: P::FAMILY,
        priors: builder
            .priors()
            .iter()
            .map(|(label, params)| PriorRow {
                label: label.to_string(),
                params: params.rounded(POSTERIOR_DECIMALS),
                mean: round_to(params.mean(), POSTERIOR_DECIMALS),
                variance: round_to(params.variance(), POSTERIOR_DECIMALS),
            })
            .collect(),
    };

    if ctx.robot_mode {
        return emit_json(&robot_ok(report));
    }

    let mut layout = HumanLayout::new();
    layout.title(&format!("{} priors", report.family));
    for row in &report.priors {
        layout.kv(&row.label, &row.params.to_string());
        layout.kv(
            "",
            &format!("mean {}  variance {}", row.mean, row.variance),
        );
    }
    emit_human(layout);
    Ok(())
}
