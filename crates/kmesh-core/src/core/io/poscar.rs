use crate::core::cell::{Cell, CellError};
use crate::core::io::traits::CellFile;
use nalgebra::{Matrix3, Vector3};
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoscarMetadata {
    pub title: String,
    pub species: Vec<String>,
    pub counts: Vec<usize>,
}

impl PoscarMetadata {
    pub fn atom_count(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Error)]
pub enum PoscarError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PoscarParseErrorKind,
    },
    #[error("Missing required record: {0}")]
    MissingRecord(&'static str),
    #[error("Invalid lattice: {0}")]
    Geometry(#[from] CellError),
}

#[derive(Debug, Error, PartialEq)]
pub enum PoscarParseErrorKind {
    #[error("Invalid float value '{value}'")]
    InvalidFloat { value: String },
    #[error("Expected {expected} numeric field(s), found {found}")]
    FieldCount { expected: &'static str, found: usize },
    #[error("Scale factor must not be zero")]
    ZeroScale,
    #[error("Per-axis scale factors must all be positive")]
    NonPositiveAxisScale,
    #[error("Invalid atom count '{value}'")]
    InvalidCount { value: String },
}

struct LineReader<R> {
    lines: io::Lines<R>,
    line_num: usize,
}

impl<R: BufRead> LineReader<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>, PoscarError> {
        match self.lines.next() {
            Some(line) => {
                self.line_num += 1;
                Ok(Some(line?))
            }
            None => Ok(None),
        }
    }

    fn require(&mut self, record: &'static str) -> Result<String, PoscarError> {
        self.next_line()?.ok_or(PoscarError::MissingRecord(record))
    }

    fn parse_error(&self, kind: PoscarParseErrorKind) -> PoscarError {
        PoscarError::Parse {
            line: self.line_num,
            kind,
        }
    }
}

fn is_comment(token: &str) -> bool {
    token.starts_with('!') || token.starts_with('#')
}

fn leading_floats(line: &str, max: usize) -> Result<Vec<f64>, PoscarParseErrorKind> {
    line.split_whitespace()
        .take_while(|t| !is_comment(t))
        .take(max)
        .map(|t| {
            t.parse::<f64>()
                .map_err(|_| PoscarParseErrorKind::InvalidFloat {
                    value: t.to_string(),
                })
        })
        .collect()
}

fn parse_counts(line: &str) -> Result<Vec<usize>, PoscarParseErrorKind> {
    line.split_whitespace()
        .take_while(|t| !is_comment(t))
        .map(|t| {
            t.parse::<usize>()
                .map_err(|_| PoscarParseErrorKind::InvalidCount {
                    value: t.to_string(),
                })
        })
        .collect()
}

fn starts_with_integer(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .is_some_and(|t| t.parse::<usize>().is_ok())
}

enum Scale {
    Uniform(f64),
    Volume(f64),
    PerAxis(Vector3<f64>),
}

/// Reader for the lattice header of VASP POSCAR/CONTCAR files.
///
/// Only the title, scale, lattice vectors and the optional species/count lines are consumed;
/// coordinates that follow are ignored.
pub struct PoscarFile;

impl CellFile for PoscarFile {
    type Metadata = PoscarMetadata;
    type Error = PoscarError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Cell, Self::Metadata), Self::Error> {
        let mut lines = LineReader::new(reader);
        let mut metadata = PoscarMetadata {
            title: lines.require("title")?.trim().to_string(),
            ..Default::default()
        };

        let scale_line = lines.require("scale factor")?;
        let scale_values = leading_floats(&scale_line, 3).map_err(|k| lines.parse_error(k))?;
        let scale = match scale_values.as_slice() {
            [s] if *s == 0.0 => return Err(lines.parse_error(PoscarParseErrorKind::ZeroScale)),
            [s] if *s > 0.0 => Scale::Uniform(*s),
            [s] => Scale::Volume(-s),
            [x, y, z] => {
                if *x <= 0.0 || *y <= 0.0 || *z <= 0.0 {
                    return Err(lines.parse_error(PoscarParseErrorKind::NonPositiveAxisScale));
                }
                Scale::PerAxis(Vector3::new(*x, *y, *z))
            }
            other => {
                return Err(lines.parse_error(PoscarParseErrorKind::FieldCount {
                    expected: "1 or 3",
                    found: other.len(),
                }));
            }
        };

        let mut rows = [[0.0; 3]; 3];
        for row in rows.iter_mut() {
            let line = lines.require("lattice vector")?;
            let values = leading_floats(&line, 3).map_err(|k| lines.parse_error(k))?;
            if values.len() != 3 {
                return Err(lines.parse_error(PoscarParseErrorKind::FieldCount {
                    expected: "3",
                    found: values.len(),
                }));
            }
            row.copy_from_slice(&values);
        }
        let lattice = Matrix3::from_fn(|i, j| rows[i][j]);

        let cell = match scale {
            Scale::Uniform(s) => Cell::from_lattice(lattice * s)?,
            Scale::Volume(v) => Cell::from_lattice(lattice)?.rescaled_to_volume(v)?,
            Scale::PerAxis(s) => Cell::from_lattice(lattice * Matrix3::from_diagonal(&s))?,
        };

        if let Some(line) = lines.next_line()? {
            if starts_with_integer(&line) {
                metadata.counts = parse_counts(&line).map_err(|k| lines.parse_error(k))?;
            } else if !line.trim().is_empty() {
                metadata.species = line
                    .split_whitespace()
                    .take_while(|t| !is_comment(t))
                    .map(str::to_string)
                    .collect();
                let counts_line = lines.require("atom counts")?;
                metadata.counts = parse_counts(&counts_line).map_err(|k| lines.parse_error(k))?;
            }
        }

        Ok((cell, metadata))
    }
}
