//! Static resource dataset and its normalization into grid cells.
//!
//! The dataset is a JSON object mapping a resource name to
//! `{"x_coordinate": .., "y_coordinate": ..}`, where each coordinate may be a
//! number or a decimal string. Document order is preserved because the pickup
//! scan walks resources in that order.

use crate::config::SimConfigError;
use crate::grid::Cell;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::{error::Error, fmt, fs, io};

const X_FIELD: &str = "x_coordinate";
const Y_FIELD: &str = "y_coordinate";

#[derive(Clone, Debug, PartialEq)]
pub struct RawResource {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug)]
pub enum DataError {
    Io { path: PathBuf, source: io::Error },
    Json(serde_json::Error),
    NotAnObject,
    MissingField { name: String, field: &'static str },
    InvalidCoordinate {
        name: String,
        field: &'static str,
        value: String,
    },
    Empty,
    ResourceOutOfBounds { cell: Cell, width: usize, height: usize },
    GridTooLarge { width: usize, height: usize },
    Config(SimConfigError),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            DataError::Json(e) => write!(f, "malformed resource dataset: {e}"),
            DataError::NotAnObject => {
                write!(f, "resource dataset must be a JSON object keyed by name")
            }
            DataError::MissingField { name, field } => {
                write!(f, "resource {name:?} is missing {field}")
            }
            DataError::InvalidCoordinate { name, field, value } => {
                write!(f, "resource {name:?} has non-numeric {field}: {value}")
            }
            DataError::Empty => write!(
                f,
                "resource dataset is empty and no explicit grid size was configured"
            ),
            DataError::ResourceOutOfBounds {
                cell,
                width,
                height,
            } => write!(
                f,
                "resource cell [{}, {}] lies outside the {width}x{height} grid",
                cell.col, cell.row
            ),
            DataError::GridTooLarge { width, height } => write!(
                f,
                "grid {width}x{height} exceeds the supported maximum of {} cells",
                crate::grid::Grid::MAX_CELLS
            ),
            DataError::Config(e) => write!(f, "{e}"),
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DataError::Io { source, .. } => Some(source),
            DataError::Json(e) => Some(e),
            DataError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Json(err)
    }
}

impl From<SimConfigError> for DataError {
    fn from(err: SimConfigError) -> Self {
        DataError::Config(err)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceDataset {
    resources: Vec<RawResource>,
}

impl ResourceDataset {
    pub fn new(resources: Vec<RawResource>) -> Self {
        Self { resources }
    }

    pub fn load(path: &Path) -> Result<Self, DataError> {
        let text = fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, DataError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, DataError> {
        let entries = value.as_object().ok_or(DataError::NotAnObject)?;
        let resources = entries
            .iter()
            .map(|(name, entry)| {
                Ok(RawResource {
                    name: name.clone(),
                    x: coordinate(name, entry, X_FIELD)?,
                    y: coordinate(name, entry, Y_FIELD)?,
                })
            })
            .collect::<Result<Vec<_>, DataError>>()?;
        Ok(Self { resources })
    }

    pub fn resources(&self) -> &[RawResource] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Scale, truncate toward zero, then shift so the minimum lands on (0, 0).
    ///
    /// Output is index-aligned with [`Self::resources`].
    pub fn normalize(&self, scale: f64) -> Result<Vec<Cell>, DataError> {
        if self.resources.is_empty() {
            return Err(DataError::Empty);
        }
        let raw: Vec<(i64, i64)> = self
            .resources
            .iter()
            .map(|r| ((r.x * scale).trunc() as i64, (r.y * scale).trunc() as i64))
            .collect();
        let min_x = raw.iter().map(|&(x, _)| x).min().unwrap_or(0);
        let min_y = raw.iter().map(|&(_, y)| y).min().unwrap_or(0);

        Ok(raw
            .into_iter()
            .map(|(x, y)| Cell::new(offset(x, min_x), offset(y, min_y)))
            .collect())
    }
}

// Saturates; oversized grids are rejected when the grid is built.
fn offset(value: i64, min: i64) -> usize {
    usize::try_from(i128::from(value) - i128::from(min)).unwrap_or(usize::MAX)
}

fn coordinate(name: &str, entry: &Value, field: &'static str) -> Result<f64, DataError> {
    let raw = entry.get(field).ok_or_else(|| DataError::MissingField {
        name: name.to_string(),
        field,
    })?;
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| DataError::InvalidCoordinate {
            name: name.to_string(),
            field,
            value: raw.to_string(),
        })
}
