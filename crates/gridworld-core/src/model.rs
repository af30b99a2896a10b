//! Decision oracle: the capability interface over trained artifacts, the
//! one-hot state adapter, and on-disk model discovery.

use crate::grid::{Cell, Grid};
use crate::nn::{Parameter, QNetwork};
use candle_core::DType;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::{error::Error, fmt, fs, io};

/// A move the agent may attempt during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Index 0: row + 1.
    AdvanceRow,
    /// Index 1: col + 1.
    AdvanceCol,
    /// Any other index; the agent stays put.
    Idle,
}

impl Action {
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Action::AdvanceRow,
            1 => Action::AdvanceCol,
            _ => Action::Idle,
        }
    }
}

/// Maps an encoded state to per-action scores.
pub trait DecisionModel: Send + Sync {
    fn scores(&self, state: &[f32]) -> Vec<f32>;

    /// Index of the best score; ties go to the lowest index.
    fn predict(&self, state: &[f32]) -> usize {
        argmax(&self.scores(state))
    }

    fn name(&self) -> &str;
}

/// First index holding the strictly greatest value. NaN never wins; empty input yields 0.
pub fn argmax(scores: &[f32]) -> usize {
    let mut best: Option<(usize, f32)> = None;
    for (i, &s) in scores.iter().enumerate() {
        if s.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best.map_or(0, |(i, _)| i)
}

/// One-hot encode `position` over the grid and ask `model` for an action.
pub fn decide(model: &dyn DecisionModel, grid: &Grid, position: Cell) -> Action {
    let mut state = vec![0.0f32; grid.cell_count()];
    if let Some(slot) = state.get_mut(grid.state_index(position)) {
        *slot = 1.0;
    }
    Action::from_index(model.predict(&state))
}

/// Dimensions every network for a given grid must have.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkShape {
    pub input: usize,
    pub hidden: usize,
    pub actions: usize,
}

pub struct TrainedModel {
    net: QNetwork,
}

impl TrainedModel {
    /// Load a state dict. `*.json` files hold nested arrays; anything else is
    /// read as a `torch.save` zip archive.
    pub fn load(path: &Path, shape: NetworkShape) -> Result<Self, ModelLoadError> {
        let net = if path.extension().is_some_and(|ext| ext == "json") {
            let doc: serde_json::Value = serde_json::from_slice(&fs::read(path)?)?;
            QNetwork::from_state_dict(&doc, shape.input, shape.hidden, shape.actions)?
        } else {
            let mut tensors = read_torch_state_dict(path)?;
            QNetwork::from_parameters(
                |key| tensors.remove(key).ok_or(ModelLoadError::MissingTensor(key)),
                shape.input,
                shape.hidden,
                shape.actions,
            )?
        };
        Ok(Self { net })
    }
}

fn read_torch_state_dict(path: &Path) -> Result<HashMap<String, Parameter>, ModelLoadError> {
    candle_core::pickle::read_all(path)?
        .into_iter()
        .map(|(name, tensor)| -> Result<_, ModelLoadError> {
            let shape = tensor.dims().to_vec();
            let values = tensor.to_dtype(DType::F32)?.flatten_all()?.to_vec1::<f32>()?;
            Ok((name, Parameter { shape, values }))
        })
        .collect()
}

impl DecisionModel for TrainedModel {
    fn scores(&self, state: &[f32]) -> Vec<f32> {
        self.net.forward(state)
    }

    fn name(&self) -> &str {
        "trained"
    }
}

/// Randomly initialized network standing in for an artifact that failed to load.
/// Weights depend only on the model id and seed, so predictions are repeatable.
pub struct UntrainedModel {
    net: QNetwork,
}

impl UntrainedModel {
    pub fn for_id(id: &str, shape: NetworkShape, seed: u64) -> Self {
        let mut rng = ChaCha12Rng::seed_from_u64(seed ^ fnv1a(id.as_bytes()));
        Self {
            net: QNetwork::untrained(shape.input, shape.hidden, shape.actions, &mut rng),
        }
    }
}

impl DecisionModel for UntrainedModel {
    fn scores(&self, state: &[f32]) -> Vec<f32> {
        self.net.forward(state)
    }

    fn name(&self) -> &str {
        "untrained"
    }
}

// Stable across builds, unlike `DefaultHasher`.
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[derive(Debug)]
pub enum ModelLoadError {
    Io(io::Error),
    Json(serde_json::Error),
    Torch(candle_core::Error),
    MissingTensor(&'static str),
    ShapeMismatch {
        tensor: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

impl fmt::Display for ModelLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelLoadError::Io(e) => write!(f, "failed to read model artifact: {e}"),
            ModelLoadError::Json(e) => write!(f, "model artifact is not a state dict: {e}"),
            ModelLoadError::Torch(e) => {
                write!(f, "model artifact is not a readable PyTorch state dict: {e}")
            }
            ModelLoadError::MissingTensor(name) => {
                write!(f, "state dict has no {name} tensor")
            }
            ModelLoadError::ShapeMismatch {
                tensor,
                expected,
                actual,
            } => write!(
                f,
                "{tensor} has shape {actual:?}, expected {expected:?}"
            ),
        }
    }
}

impl Error for ModelLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ModelLoadError::Io(e) => Some(e),
            ModelLoadError::Json(e) => Some(e),
            ModelLoadError::Torch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ModelLoadError {
    fn from(err: io::Error) -> Self {
        ModelLoadError::Io(err)
    }
}

impl From<serde_json::Error> for ModelLoadError {
    fn from(err: serde_json::Error) -> Self {
        ModelLoadError::Json(err)
    }
}

impl From<candle_core::Error> for ModelLoadError {
    fn from(err: candle_core::Error) -> Self {
        ModelLoadError::Torch(err)
    }
}

/// Where model artifacts come from.
pub trait ModelSource: Send + Sync {
    /// Identifiers a client may choose from, sorted.
    fn list(&self) -> Vec<String>;

    /// Whether an artifact backs `id`. Unresolvable ids are dropped on activation.
    fn resolve(&self, id: &str) -> bool;

    fn load(&self, id: &str, shape: NetworkShape) -> Result<Box<dyn DecisionModel>, ModelLoadError>;
}

/// Artifacts stored as `<root>/<id>`; discovery lists files ending in `extension`.
#[derive(Clone, Debug)]
pub struct ModelDirectory {
    root: PathBuf,
    extension: String,
}

impl ModelDirectory {
    pub const DEFAULT_EXTENSION: &'static str = ".pth";

    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    fn artifact_path(&self, id: &str) -> Option<PathBuf> {
        let plain = !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(['/', '\\'])
            && !id.contains('\0');
        plain.then(|| self.root.join(id))
    }
}

impl ModelSource for ModelDirectory {
    fn list(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(dir = %self.root.display(), error = %err, "cannot scan model directory");
                return Vec::new();
            }
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| name.ends_with(&self.extension))
            .collect();
        names.sort();
        names
    }

    fn resolve(&self, id: &str) -> bool {
        self.artifact_path(id).is_some_and(|p| p.is_file())
    }

    fn load(&self, id: &str, shape: NetworkShape) -> Result<Box<dyn DecisionModel>, ModelLoadError> {
        let path = self.artifact_path(id).ok_or_else(|| {
            ModelLoadError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid model id {id:?}"),
            ))
        })?;
        Ok(Box::new(TrainedModel::load(&path, shape)?))
    }
}
