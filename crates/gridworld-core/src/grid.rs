use crate::config::SimConfig;
use crate::resource::{DataError, ResourceDataset};
use serde::{Deserialize, Serialize};

/// Integer `(col, row)` in normalized grid space. Serializes as `[col, row]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct Cell {
    pub col: usize,
    pub row: usize,
}

impl Cell {
    pub const ORIGIN: Cell = Cell { col: 0, row: 0 };

    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

impl From<[usize; 2]> for Cell {
    fn from([col, row]: [usize; 2]) -> Self {
        Self { col, row }
    }
}

impl From<Cell> for [usize; 2] {
    fn from(cell: Cell) -> Self {
        [cell.col, cell.row]
    }
}

/// Bounding box of the normalized resource set plus the cells themselves.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    resources: Vec<Cell>,
}

impl Grid {
    /// Upper bound on `width * height`; the oracle input is one-hot over every cell.
    pub const MAX_CELLS: usize = 1 << 18;

    /// Derive the grid from a dataset, honoring an explicit size in `config`.
    pub fn from_dataset(dataset: &ResourceDataset, config: &SimConfig) -> Result<Self, DataError> {
        config.validate()?;
        let resources = if dataset.is_empty() && config.grid_override().is_some() {
            Vec::new()
        } else {
            dataset.normalize(config.scale)?
        };
        match config.grid_override() {
            Some((width, height)) => Self::with_size(width, height, resources),
            None => Self::from_cells(resources),
        }
    }

    /// `width = 1 + max col`, `height = 1 + max row`.
    pub fn from_cells(resources: Vec<Cell>) -> Result<Self, DataError> {
        if resources.is_empty() {
            return Err(DataError::Empty);
        }
        let width = resources
            .iter()
            .map(|c| c.col)
            .max()
            .unwrap_or(0)
            .saturating_add(1);
        let height = resources
            .iter()
            .map(|c| c.row)
            .max()
            .unwrap_or(0)
            .saturating_add(1);
        Self::with_size(width, height, resources)
    }

    pub fn with_size(width: usize, height: usize, resources: Vec<Cell>) -> Result<Self, DataError> {
        let too_large = width
            .checked_mul(height)
            .map_or(true, |cells| cells > Self::MAX_CELLS);
        if width == 0 || height == 0 || too_large {
            return Err(DataError::GridTooLarge { width, height });
        }
        if let Some(&cell) = resources
            .iter()
            .find(|c| c.col >= width || c.row >= height)
        {
            return Err(DataError::ResourceOutOfBounds {
                cell,
                width,
                height,
            });
        }
        Ok(Self {
            width,
            height,
            resources,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    pub fn resources(&self) -> &[Cell] {
        &self.resources
    }

    /// Far corner, where every session's goal sits.
    pub fn goal(&self) -> Cell {
        Cell::new(self.width - 1, self.height - 1)
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.col < self.width && cell.row < self.height
    }

    pub fn is_resource(&self, cell: Cell) -> bool {
        self.resources.contains(&cell)
    }

    /// Row-major flattened index used as the oracle's state index.
    pub fn state_index(&self, cell: Cell) -> usize {
        cell.row * self.width + cell.col
    }
}
