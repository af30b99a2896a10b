//! Two-layer Q-network: `input → hidden (ReLU) → actions` (linear).
//! Layer names and weight layout (`[out][in]`) match the trained artifacts:
//! `fc1.weight`, `fc1.bias`, `fc2.weight`, `fc2.bias`.

use crate::model::ModelLoadError;
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct QNetwork {
    input_size: usize,
    hidden_size: usize,
    // row-major [hidden][input]
    w1: Vec<f32>,
    b1: Vec<f32>,
    // row-major [output][hidden]
    w2: Vec<f32>,
    b2: Vec<f32>,
}

impl QNetwork {
    /// Freshly initialized network, each layer uniform in `±1/sqrt(fan_in)`.
    pub fn untrained<R: Rng + ?Sized>(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        rng: &mut R,
    ) -> Self {
        let mut layer = |fan_in: usize, fan_out: usize| {
            let bound = 1.0 / (fan_in.max(1) as f32).sqrt();
            let weights: Vec<f32> = (0..fan_in * fan_out)
                .map(|_| rng.random_range(-bound..bound))
                .collect();
            let bias: Vec<f32> = (0..fan_out)
                .map(|_| rng.random_range(-bound..bound))
                .collect();
            (weights, bias)
        };
        let (w1, b1) = layer(input_size, hidden_size);
        let (w2, b2) = layer(hidden_size, output_size);
        Self {
            input_size,
            hidden_size,
            w1,
            b1,
            w2,
            b2,
        }
    }

    /// Build from named parameters, checking each against the expected shape.
    pub fn from_parameters<F>(
        mut lookup: F,
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
    ) -> Result<Self, ModelLoadError>
    where
        F: FnMut(&'static str) -> Result<Parameter, ModelLoadError>,
    {
        let w1 = checked(lookup("fc1.weight")?, "fc1.weight", &[hidden_size, input_size])?;
        let b1 = checked(lookup("fc1.bias")?, "fc1.bias", &[hidden_size])?;
        let w2 = checked(lookup("fc2.weight")?, "fc2.weight", &[output_size, hidden_size])?;
        let b2 = checked(lookup("fc2.bias")?, "fc2.bias", &[output_size])?;
        Ok(Self {
            input_size,
            hidden_size,
            w1,
            b1,
            w2,
            b2,
        })
    }

    /// Parse a JSON state-dict document (nested arrays keyed by layer name).
    pub fn from_state_dict(
        doc: &Value,
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
    ) -> Result<Self, ModelLoadError> {
        Self::from_parameters(
            |key| json_parameter(doc, key),
            input_size,
            hidden_size,
            output_size,
        )
    }

    /// Forward pass. Missing inputs read as zero; extra inputs are ignored.
    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut hidden = self.b1.clone();
        for (j, h) in hidden.iter_mut().enumerate() {
            let row = &self.w1[j * self.input_size..(j + 1) * self.input_size];
            *h += row
                .iter()
                .zip(input)
                .filter(|&(_, &x)| x != 0.0)
                .map(|(w, x)| w * x)
                .sum::<f32>();
            *h = h.max(0.0);
        }

        let mut output = self.b2.clone();
        for (k, o) in output.iter_mut().enumerate() {
            let row = &self.w2[k * self.hidden_size..(k + 1) * self.hidden_size];
            *o += row.iter().zip(&hidden).map(|(w, h)| w * h).sum::<f32>();
        }
        output
    }
}

/// One named tensor from an artifact, flattened row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub shape: Vec<usize>,
    pub values: Vec<f32>,
}

fn checked(
    param: Parameter,
    key: &'static str,
    expected: &[usize],
) -> Result<Vec<f32>, ModelLoadError> {
    let count: usize = expected.iter().product();
    if param.shape != expected || param.values.len() != count {
        return Err(ModelLoadError::ShapeMismatch {
            tensor: key,
            expected: expected.to_vec(),
            actual: param.shape,
        });
    }
    Ok(param.values)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonTensor {
    Vector(Vec<f32>),
    Matrix(Vec<Vec<f32>>),
}

fn json_parameter(doc: &Value, key: &'static str) -> Result<Parameter, ModelLoadError> {
    let raw = doc.get(key).ok_or(ModelLoadError::MissingTensor(key))?;
    match JsonTensor::deserialize(raw)? {
        JsonTensor::Vector(values) => Ok(Parameter {
            shape: vec![values.len()],
            values,
        }),
        JsonTensor::Matrix(rows) => {
            let cols = rows.first().map_or(0, Vec::len);
            // ragged rows
            if let Some(bad) = rows.iter().find(|r| r.len() != cols) {
                return Err(ModelLoadError::ShapeMismatch {
                    tensor: key,
                    expected: vec![rows.len(), cols],
                    actual: vec![rows.len(), bad.len()],
                });
            }
            Ok(Parameter {
                shape: vec![rows.len(), cols],
                values: rows.into_iter().flatten().collect(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;
    use serde_json::json;

    #[test]
    fn forward_applies_relu_then_linear() {
        // hidden = relu([x0 - x1, x1 - x0]); out = [h0 + 0.5, 2*h1]
        let doc = json!({
            "fc1.weight": [[1.0, -1.0], [-1.0, 1.0]],
            "fc1.bias": [0.0, 0.0],
            "fc2.weight": [[1.0, 0.0], [0.0, 2.0]],
            "fc2.bias": [0.5, 0.0],
        });
        let net = QNetwork::from_state_dict(&doc, 2, 2, 2).unwrap();
        assert_eq!(net.forward(&[1.0, 0.0]), vec![1.5, 0.0]);
        assert_eq!(net.forward(&[0.0, 1.0]), vec![0.5, 2.0]);
    }

    #[test]
    fn state_dict_missing_tensor() {
        let doc = json!({"fc1.weight": [[1.0]], "fc1.bias": [0.0]});
        let err = QNetwork::from_state_dict(&doc, 1, 1, 2).unwrap_err();
        assert!(matches!(err, ModelLoadError::MissingTensor("fc2.weight")));
    }

    #[test]
    fn state_dict_shape_mismatch() {
        let doc = json!({
            "fc1.weight": [[1.0, 2.0, 3.0]],
            "fc1.bias": [0.0],
            "fc2.weight": [[1.0], [1.0]],
            "fc2.bias": [0.0, 0.0],
        });
        let err = QNetwork::from_state_dict(&doc, 2, 1, 2).unwrap_err();
        match err {
            ModelLoadError::ShapeMismatch {
                tensor,
                expected,
                actual,
            } => {
                assert_eq!(tensor, "fc1.weight");
                assert_eq!(expected, vec![1, 2]);
                assert_eq!(actual, vec![1, 3]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ragged_matrix_is_rejected() {
        let doc = json!({
            "fc1.weight": [[1.0], [1.0, 2.0]],
            "fc1.bias": [0.0, 0.0],
            "fc2.weight": [[1.0, 1.0]],
            "fc2.bias": [0.0],
        });
        assert!(matches!(
            QNetwork::from_state_dict(&doc, 2, 2, 1),
            Err(ModelLoadError::ShapeMismatch {
                tensor: "fc1.weight",
                ..
            })
        ));
    }

    #[test]
    fn parameter_rank_is_checked() {
        let net = QNetwork::from_parameters(
            |key| {
                let (shape, values) = match key {
                    "fc1.weight" => (vec![1, 2], vec![1.0, 1.0]),
                    "fc1.bias" | "fc2.weight" => (vec![1], vec![1.0]),
                    _ => (vec![1], vec![0.0]),
                };
                Ok(Parameter { shape, values })
            },
            2,
            1,
            1,
        );
        // fc2.weight must be [1, 1], not [1]
        assert!(matches!(
            net,
            Err(ModelLoadError::ShapeMismatch {
                tensor: "fc2.weight",
                ..
            })
        ));
    }

    #[test]
    fn untrained_is_deterministic_and_bounded() {
        let a = QNetwork::untrained(9, 4, 2, &mut ChaCha12Rng::seed_from_u64(7));
        let b = QNetwork::untrained(9, 4, 2, &mut ChaCha12Rng::seed_from_u64(7));
        assert_eq!(a.w1, b.w1);
        assert_eq!(a.b2, b.b2);
        let bound = 1.0 / 3.0;
        assert!(a.w1.iter().chain(&a.b1).all(|w| w.abs() <= bound));
        assert_eq!(a.forward(&[0.0; 9]).len(), 2);
    }
}
