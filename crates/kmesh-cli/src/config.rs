mod defaults;
mod models;

pub use models::SolveConfig;

use crate::cli::{Parity, SolveArgs, StrategyArg};
use crate::error::{CliError, Result};
use clap::ValueEnum;
use defaults::DefaultsConfig;
use kmesh::engine::config::SolverConfigBuilder;
use kmesh::engine::tolerance::Tolerance;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialToleranceConfig {
    relative: Option<f64>,
    absolute: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSolverConfig {
    #[serde(rename = "k-point-density")]
    k_point_density: Option<f64>,
    #[serde(rename = "only-even")]
    only_even: Option<bool>,
    strategy: Option<StrategyArg>,
    tolerance: Option<PartialToleranceConfig>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialSolveConfig {
    solver: Option<PartialSolverConfig>,
}

impl PartialSolveConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn merge_with_cli(mut self, args: &SolveArgs) -> Result<SolveConfig> {
        self.apply_set_values(&args.set_values)?;

        let defaults = DefaultsConfig::default();
        let solver = self.solver.take().unwrap_or_default();
        let tolerance = solver.tolerance.unwrap_or_default();

        let target_density = args.kpd.or(solver.k_point_density).ok_or_else(|| {
            CliError::Config(
                "A target k-point density is required: pass --kpd or set `solver.k-point-density`."
                    .to_string(),
            )
        })?;

        let only_even = Self::merge_parity(args.parity, solver.only_even, defaults.only_even);
        let strategy = args
            .strategy
            .or(solver.strategy)
            .unwrap_or(defaults.strategy);
        let tolerance = Tolerance::new(
            tolerance.relative.unwrap_or(defaults.tolerance_relative),
            tolerance.absolute.unwrap_or(defaults.tolerance_absolute),
        );

        let solver = SolverConfigBuilder::new()
            .only_even(only_even)
            .strategy(strategy.into())
            .tolerance(tolerance)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok(SolveConfig {
            target_density,
            solver,
        })
    }

    fn merge_parity(cli_flags: Parity, file_val: Option<bool>, default: bool) -> bool {
        if cli_flags.even {
            true
        } else if cli_flags.any_parity {
            false
        } else {
            file_val.unwrap_or(default)
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;

            let solver = self.solver.get_or_insert_with(Default::default);
            match key {
                "solver.k-point-density" => {
                    solver.k_point_density = Some(parse_value(key, value_str, "float")?);
                }
                "solver.only-even" => {
                    solver.only_even = Some(parse_value(key, value_str, "boolean")?);
                }
                "solver.strategy" => {
                    let strategy =
                        <StrategyArg as ValueEnum>::from_str(value_str, false).map_err(|_| {
                            CliError::Config(format!(
                                "Invalid strategy for {}: '{}'. Expected 'balanced' or 'floor-ceil'.",
                                key, value_str
                            ))
                        })?;
                    solver.strategy = Some(strategy);
                }
                "solver.tolerance.relative" => {
                    solver
                        .tolerance
                        .get_or_insert_with(Default::default)
                        .relative = Some(parse_value(key, value_str, "float")?);
                }
                "solver.tolerance.absolute" => {
                    solver
                        .tolerance
                        .get_or_insert_with(Default::default)
                        .absolute = Some(parse_value(key, value_str, "float")?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value_str: &str, kind: &str) -> Result<T> {
    value_str.trim().parse().map_err(|_| {
        CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value_str))
    })
}
