use crate::cli::{OutputFormat, SolveArgs};
use crate::config::{PartialSolveConfig, SolveConfig};
use crate::error::{CliError, Result};
use kmesh::core::cell::{Cell, CellParameters};
use kmesh::core::io::poscar::PoscarFile;
use kmesh::core::io::traits::CellFile;
use kmesh::engine::config::Strategy;
use kmesh::engine::report::GridReport;
use kmesh::workflows;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

/// Where a cell comes from; also provides the label printed next to its grid.
#[derive(Debug, Clone)]
enum CellSource {
    Poscar(PathBuf),
    Lattice([[f64; 3]; 3]),
    Parameters(CellParameters),
}

impl CellSource {
    fn label(&self) -> String {
        match self {
            CellSource::Poscar(path) => path.display().to_string(),
            CellSource::Lattice(_) => "lattice".to_string(),
            CellSource::Parameters(_) => "cell-params".to_string(),
        }
    }

    fn load(&self) -> Result<Cell> {
        match self {
            CellSource::Poscar(path) => {
                let (cell, metadata) =
                    PoscarFile::read_from_path(path).map_err(|e| CliError::FileParsing {
                        path: path.clone(),
                        source: e.into(),
                    })?;
                debug!(
                    title = %metadata.title,
                    species = ?metadata.species,
                    atoms = metadata.atom_count(),
                    "Read POSCAR {:?}.",
                    path
                );
                Ok(cell)
            }
            CellSource::Lattice(vectors) => Ok(Cell::from_vectors(*vectors)?),
            CellSource::Parameters(params) => Ok(Cell::from_parameters(*params)?),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct GridEntry<'a> {
    source: &'a str,
    kgrid: [u32; 3],
    strategy: Strategy,
    step: u32,
    target_density: f64,
    actual_density: f64,
    axis_densities: [f64; 3],
}

#[derive(Serialize)]
struct GridDocument<'a> {
    grid: Vec<GridEntry<'a>>,
}

pub fn run(args: SolveArgs) -> Result<()> {
    let partial = match &args.config {
        Some(path) => PartialSolveConfig::from_file(path)?,
        None => PartialSolveConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let config = partial.merge_with_cli(&args)?;
    debug!(?config, "Resolved solve configuration.");

    let sources = collect_sources(&args)?;
    let results = solve_sources(&sources, &config)?;

    println!("{}", render(&results, args.format)?);
    Ok(())
}

fn collect_sources(args: &SolveArgs) -> Result<Vec<CellSource>> {
    if let Some(values) = &args.lattice {
        let vectors = lattice_from_values(values)?;
        return Ok(vec![CellSource::Lattice(vectors)]);
    }
    if let Some(values) = &args.cell_params {
        let params = parameters_from_values(values)?;
        return Ok(vec![CellSource::Parameters(params)]);
    }
    if args.inputs.is_empty() {
        return Err(CliError::Argument(
            "No cell given: pass POSCAR files, --lattice, or --cell-params.".to_string(),
        ));
    }
    Ok(args.inputs.iter().cloned().map(CellSource::Poscar).collect())
}

fn lattice_from_values(values: &[f64]) -> Result<[[f64; 3]; 3]> {
    match values {
        [a1x, a1y, a1z, a2x, a2y, a2z, a3x, a3y, a3z] => Ok([
            [*a1x, *a1y, *a1z],
            [*a2x, *a2y, *a2z],
            [*a3x, *a3y, *a3z],
        ]),
        _ => Err(CliError::Argument(format!(
            "--lattice expects exactly 9 values, got {}",
            values.len()
        ))),
    }
}

fn parameters_from_values(values: &[f64]) -> Result<CellParameters> {
    match values {
        [a, b, c, alpha, beta, gamma] => Ok(CellParameters {
            a: *a,
            b: *b,
            c: *c,
            alpha: *alpha,
            beta: *beta,
            gamma: *gamma,
        }),
        _ => Err(CliError::Argument(format!(
            "--cell-params expects exactly 6 values, got {}",
            values.len()
        ))),
    }
}

#[instrument(skip_all, fields(count = sources.len()))]
fn solve_sources(
    sources: &[CellSource],
    config: &SolveConfig,
) -> Result<Vec<(String, GridReport)>> {
    sources
        .iter()
        .map(|source| -> Result<(String, GridReport)> {
            let label = source.label();
            info!("Solving grid for {}.", label);
            let cell = source.load()?;
            let report = workflows::grid::run(&cell, &config.solver, config.target_density)?;
            Ok((label, report))
        })
        .collect()
}

fn render(results: &[(String, GridReport)], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => {
            if let [(_, report)] = results {
                return Ok(report.to_string());
            }
            let blocks: Vec<String> = results
                .iter()
                .map(|(label, report)| format!("{}:\n{}", label, report))
                .collect();
            Ok(blocks.join("\n\n"))
        }
        OutputFormat::Toml => {
            let document = GridDocument {
                grid: results
                    .iter()
                    .map(|(label, report)| GridEntry {
                        source: label,
                        kgrid: report.grid.as_array(),
                        strategy: report.strategy,
                        step: report.step,
                        target_density: report.target_density,
                        actual_density: report.actual_density,
                        axis_densities: report.axis_densities,
                    })
                    .collect(),
            };
            toml::to_string_pretty(&document).map_err(|e| CliError::Output(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use kmesh::engine::solver::KGrid;
    use std::fs;
    use tempfile::tempdir;

    const ORTHORHOMBIC_POSCAR: &str = "\
Orthorhombic test cell
1.0
  6.0 0.0 0.0
  0.0 4.0 0.0
  0.0 0.0 4.0
Si
2
Direct
0.0 0.0 0.0
0.5 0.5 0.5
";

    const ELONGATED_POSCAR: &str = "\
Elongated test cell
2.0
  1.0 0.0 0.0
  0.0 1.0 0.0
  0.0 0.0 10.0
1
Direct
0.0 0.0 0.0
";

    fn solve_args(args: &[&str]) -> SolveArgs {
        let argv = std::iter::once("kmesh")
            .chain(std::iter::once("solve"))
            .chain(args.iter().copied());
        match Cli::parse_from(argv).command {
            Commands::Solve(args) => args,
        }
    }

    fn solve(args: &SolveArgs) -> Result<Vec<(String, GridReport)>> {
        let config = PartialSolveConfig::default().merge_with_cli(args)?;
        solve_sources(&collect_sources(args)?, &config)
    }

    #[test]
    fn lattice_values_are_read_row_by_row() {
        let vectors = lattice_from_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]).unwrap();
        assert_eq!(vectors, [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        assert!(matches!(
            lattice_from_values(&[1.0; 18]),
            Err(CliError::Argument(_))
        ));
    }

    #[test]
    fn lattice_source_is_solved() {
        let args = solve_args(&[
            "--lattice", "6", "0", "0", "0", "4", "0", "0", "0", "4", "--kpd", "5000",
        ]);
        let results = solve(&args).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "lattice");
        assert_eq!(results[0].1.grid, KGrid::new(3, 5, 5));
    }

    #[test]
    fn cell_parameter_source_is_solved() {
        let args = solve_args(&[
            "--cell-params",
            "5",
            "5",
            "5",
            "90",
            "90",
            "90",
            "--kpd",
            "700",
        ]);
        let results = solve(&args).unwrap();

        assert_eq!(results[0].0, "cell-params");
        assert_eq!(results[0].1.grid, KGrid::new(2, 2, 2));
    }

    #[test]
    fn multiple_poscar_files_are_solved_in_order() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("POSCAR_ortho");
        let second = dir.path().join("POSCAR_long");
        fs::write(&first, ORTHORHOMBIC_POSCAR).unwrap();
        fs::write(&second, ELONGATED_POSCAR).unwrap();

        let args = solve_args(&[
            first.to_str().unwrap(),
            second.to_str().unwrap(),
            "--kpd",
            "5000",
            "--even",
        ]);
        let results = solve(&args).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, first.display().to_string());
        assert_eq!(results[1].1.grid, KGrid::new(8, 8, 2));
        for (_, report) in &results {
            assert!(report.meets_target());
            assert!(report.grid.as_array().iter().all(|n| n % 2 == 0));
        }
    }

    #[test]
    fn unreadable_poscar_is_reported_with_its_path() {
        let dir = tempdir().unwrap();
        let broken = dir.path().join("POSCAR");
        fs::write(&broken, "title\nnot-a-number\n").unwrap();

        let args = solve_args(&[broken.to_str().unwrap(), "--kpd", "100"]);
        match solve(&args) {
            Err(CliError::FileParsing { path, .. }) => assert_eq!(path, broken),
            other => panic!("expected file parsing error, got {:?}", other),
        }
    }

    #[test]
    fn degenerate_lattice_is_rejected() {
        let args = solve_args(&[
            "--lattice", "1", "0", "0", "2", "0", "0", "0", "0", "1", "--kpd", "100",
        ]);
        assert!(matches!(solve(&args), Err(CliError::Cell(_))));
    }

    #[test]
    fn text_output_labels_multiple_sources() {
        let args = solve_args(&[
            "--lattice", "6", "0", "0", "0", "4", "0", "0", "0", "4", "--kpd", "5000",
        ]);
        let (_, report) = solve(&args).unwrap().remove(0);

        let single = render(&[("a".to_string(), report.clone())], OutputFormat::Text).unwrap();
        assert!(single.starts_with("kgrid: 3 x 5 x 5"));

        let many = render(
            &[("a".to_string(), report.clone()), ("b".to_string(), report)],
            OutputFormat::Text,
        )
        .unwrap();
        assert!(many.starts_with("a:\nkgrid: 3 x 5 x 5"));
        assert!(many.contains("\n\nb:\nkgrid: 3 x 5 x 5"));
    }

    #[test]
    fn toml_output_is_an_array_of_grid_tables() {
        let args = solve_args(&[
            "--lattice", "2", "0", "0", "0", "2", "0", "0", "0", "20", "--kpd", "5000",
        ]);
        let results = solve(&args).unwrap();
        let rendered = render(&results, OutputFormat::Toml).unwrap();

        let document: toml::Table = toml::from_str(&rendered).unwrap();
        let grids = document["grid"].as_array().unwrap();
        assert_eq!(grids.len(), 1);

        let entry = grids[0].as_table().unwrap();
        assert_eq!(entry["source"].as_str(), Some("lattice"));
        assert_eq!(entry["strategy"].as_str(), Some("balanced"));
        assert_eq!(entry["step"].as_integer(), Some(1));
        let kgrid: Vec<i64> = entry["kgrid"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_integer().unwrap())
            .collect();
        assert_eq!(kgrid, vec![8, 8, 1]);
        assert_eq!(entry["target-density"].as_float(), Some(5000.0));
    }
}
