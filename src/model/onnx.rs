//! ONNX Runtime scorer over the full canonical feature layout: the 13 numeric
//! columns as f32 and the 2 categorical columns as strings.
//!
//! Graph inputs are matched by name at load time. A graph may take one `[N, 1]`
//! input per column (named after the column), a float `[N, 13]` numeric block
//! plus a string `[N, 2]` categorical block, or a mix of both. Every column must
//! be fed exactly once.
//! Output: the model's float score tensor (`[N]` or `[N, 1]`), one score per row.

use super::Scorer;
use crate::error::ScoringError;
use crate::features::{feature_columns, FeatureVector, CATEGORICAL_FEATURES, NUMERIC_FEATURES};
use ndarray::{Array2, CowArray, IxDyn};
use ort::tensor::{OrtOwnedTensor, TensorElementDataType};
use ort::{Environment, GraphOptimizationLevel, Session, SessionBuilder, Value};
use std::path::Path;
use std::sync::Mutex;

/// Graph metadata key holding the trained decision offset.
const OFFSET_KEY: &str = "offset";

/// What one graph input is fed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputSlot {
    /// A single canonical column (index into [`feature_columns`]) as `[N, 1]`.
    Column(usize),
    /// All numeric columns as f32 `[N, 13]`.
    NumericBlock,
    /// All categorical columns as strings `[N, 2]`.
    CategoricalBlock,
}

enum InputTensor<'a> {
    Float(CowArray<'a, f32, IxDyn>),
    Text(CowArray<'a, String, IxDyn>),
}

pub struct OnnxScorer {
    session: Mutex<Session>,
    slots: Vec<InputSlot>,
    score_output: usize,
    offset: Option<f64>,
    name: String,
}

impl OnnxScorer {
    /// Load a model file. Callers check for the file's existence first; a
    /// missing model means "unavailable", not a startup failure.
    pub fn load(path: &Path, intra_threads: i16) -> Result<Self, ScoringError> {
        let backend = |e: ort::OrtError| ScoringError::Backend(e.to_string());

        let environment = Environment::builder()
            .with_name("ledger-anomaly")
            .build()
            .map_err(backend)?
            .into_arc();

        let session = SessionBuilder::new(&environment)
            .map_err(backend)?
            .with_optimization_level(GraphOptimizationLevel::Level1)
            .map_err(backend)?
            .with_intra_threads(intra_threads)
            .map_err(backend)?
            .with_model_from_file(path)
            .map_err(backend)?;

        let inputs: Vec<(String, bool)> = session
            .inputs
            .iter()
            .map(|i| (i.name.clone(), matches!(i.input_type, TensorElementDataType::String)))
            .collect();
        let slots = plan_inputs(&inputs)?;

        // Isolation Forest exports emit `label` (int64) and `scores` (float).
        let score_output = session
            .outputs
            .iter()
            .position(|o| o.name.contains("score"))
            .unwrap_or_else(|| session.outputs.len().saturating_sub(1));

        let offset = session
            .metadata()
            .and_then(|m| m.custom(OFFSET_KEY))
            .map_err(backend)?
            .as_deref()
            .and_then(parse_offset);

        tracing::info!(
            path = %path.display(),
            inputs = ?inputs.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(),
            score_output = %session.outputs.get(score_output).map(|o| o.name.as_str()).unwrap_or("?"),
            offset = ?offset,
            "ONNX model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            slots,
            score_output,
            offset,
            name: path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("onnx")
                .to_string(),
        })
    }

    /// Use `offset` when the graph itself carries none.
    pub fn with_fallback_offset(mut self, offset: Option<f64>) -> Self {
        self.offset = self.offset.or(offset);
        self
    }
}

fn parse_offset(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Map graph inputs `(name, is_string)` onto the canonical columns.
fn plan_inputs(inputs: &[(String, bool)]) -> Result<Vec<InputSlot>, ScoringError> {
    let columns = feature_columns();
    let mut fed = vec![0usize; columns.len()];
    let mut slots = Vec::with_capacity(inputs.len());

    for (name, is_string) in inputs {
        let slot = match columns.iter().position(|c| c == name) {
            Some(index) => {
                let categorical = index >= NUMERIC_FEATURES.len();
                if categorical != *is_string {
                    return Err(ScoringError::InputLayout(format!(
                        "input '{name}' has the wrong element type"
                    )));
                }
                fed[index] += 1;
                InputSlot::Column(index)
            }
            None if *is_string => {
                fed[NUMERIC_FEATURES.len()..].iter_mut().for_each(|n| *n += 1);
                InputSlot::CategoricalBlock
            }
            None => {
                fed[..NUMERIC_FEATURES.len()].iter_mut().for_each(|n| *n += 1);
                InputSlot::NumericBlock
            }
        };
        slots.push(slot);
    }

    let unfed: Vec<&str> = columns
        .iter()
        .zip(&fed)
        .filter(|(_, n)| **n != 1)
        .map(|(c, _)| *c)
        .collect();
    if !unfed.is_empty() {
        return Err(ScoringError::InputLayout(format!(
            "columns not fed exactly once: {}",
            unfed.join(", ")
        )));
    }
    Ok(slots)
}

fn float_tensor<'a>(rows: usize, width: usize, values: Vec<f32>) -> Result<InputTensor<'a>, ScoringError> {
    Array2::from_shape_vec((rows, width), values)
        .map(|a| InputTensor::Float(CowArray::from(a.into_dyn())))
        .map_err(|e| ScoringError::Backend(e.to_string()))
}

fn text_tensor<'a>(rows: usize, width: usize, values: Vec<String>) -> Result<InputTensor<'a>, ScoringError> {
    Array2::from_shape_vec((rows, width), values)
        .map(|a| InputTensor::Text(CowArray::from(a.into_dyn())))
        .map_err(|e| ScoringError::Backend(e.to_string()))
}

/// One tensor per slot, in graph input order.
fn build_inputs<'a>(slots: &[InputSlot], features: &[FeatureVector]) -> Result<Vec<InputTensor<'a>>, ScoringError> {
    let n = features.len();
    let numeric_width = NUMERIC_FEATURES.len();
    slots
        .iter()
        .map(|slot| match *slot {
            InputSlot::Column(i) if i < numeric_width => {
                float_tensor(n, 1, features.iter().map(|fv| fv.numeric()[i] as f32).collect())
            }
            InputSlot::Column(i) => text_tensor(
                n,
                1,
                features
                    .iter()
                    .map(|fv| fv.categorical()[i - numeric_width].to_string())
                    .collect(),
            ),
            InputSlot::NumericBlock => float_tensor(
                n,
                numeric_width,
                features
                    .iter()
                    .flat_map(|fv| fv.numeric())
                    .map(|v| v as f32)
                    .collect(),
            ),
            InputSlot::CategoricalBlock => text_tensor(
                n,
                CATEGORICAL_FEATURES.len(),
                features
                    .iter()
                    .flat_map(|fv| fv.categorical().map(str::to_string))
                    .collect(),
            ),
        })
        .collect()
}

impl Scorer for OnnxScorer {
    fn score(&self, features: &[FeatureVector]) -> Result<Vec<f64>, ScoringError> {
        if features.is_empty() {
            return Ok(Vec::new());
        }
        let backend = |e: ort::OrtError| ScoringError::Backend(e.to_string());

        let tensors = build_inputs(&self.slots, features)?;
        let session = self
            .session
            .lock()
            .map_err(|_| ScoringError::Backend("session lock poisoned".to_string()))?;
        let inputs = tensors
            .iter()
            .map(|t| match t {
                InputTensor::Float(a) => Value::from_array(session.allocator(), a),
                InputTensor::Text(a) => Value::from_array(session.allocator(), a),
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend)?;
        let outputs = session.run(inputs).map_err(backend)?;

        let output = outputs.get(self.score_output).ok_or_else(|| {
            ScoringError::Backend(format!("model has no output #{}", self.score_output))
        })?;
        let tensor: OrtOwnedTensor<f32, _> = output.try_extract().map_err(backend)?;
        let scores: Vec<f64> = tensor.view().iter().map(|&s| f64::from(s)).collect();

        if scores.len() != features.len() {
            return Err(ScoringError::ShapeMismatch {
                expected: features.len(),
                got: scores.len(),
            });
        }
        Ok(scores)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn offset(&self) -> Option<f64> {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::build_features;
    use crate::ingest::RawTransaction;
    use ndarray::Ix2;

    fn features() -> Vec<FeatureVector> {
        let rows = vec![
            RawTransaction::new("2024-01-01", 10.0, "A", "X"),
            RawTransaction::new("2024-01-02", 20.0, "B", "X"),
        ];
        build_features(&rows, chrono::Utc::now())
    }

    fn per_column_inputs() -> Vec<(String, bool)> {
        feature_columns()
            .iter()
            .enumerate()
            .map(|(i, c)| (c.to_string(), i >= NUMERIC_FEATURES.len()))
            .collect()
    }

    fn float(t: &InputTensor) -> ndarray::Array2<f32> {
        match t {
            InputTensor::Float(a) => a.view().into_dimensionality::<Ix2>().unwrap().to_owned(),
            InputTensor::Text(_) => panic!("expected a float tensor"),
        }
    }

    fn text(t: &InputTensor) -> ndarray::Array2<String> {
        match t {
            InputTensor::Text(a) => a.view().into_dimensionality::<Ix2>().unwrap().to_owned(),
            InputTensor::Float(_) => panic!("expected a string tensor"),
        }
    }

    #[test]
    fn per_column_graph_feeds_all_fifteen_columns() {
        let slots = plan_inputs(&per_column_inputs()).unwrap();
        assert_eq!(slots.len(), 15);
        let tensors = build_inputs(&slots, &features()).unwrap();

        let amount = float(&tensors[0]);
        assert_eq!(amount.shape(), &[2, 1]);
        assert_eq!((amount[[0, 0]], amount[[1, 0]]), (10.0, 20.0));
        // dept_txn_freq
        assert_eq!(float(&tensors[7])[[1, 0]], 2.0);
        let vendor = text(&tensors[13]);
        assert_eq!((vendor[[0, 0]].as_str(), vendor[[1, 0]].as_str()), ("A", "B"));
        assert_eq!(text(&tensors[14])[[0, 0]], "X");
    }

    #[test]
    fn block_graph_feeds_numeric_then_categorical() {
        let inputs = vec![("numeric".to_string(), false), ("categorical".to_string(), true)];
        let slots = plan_inputs(&inputs).unwrap();
        assert_eq!(slots, vec![InputSlot::NumericBlock, InputSlot::CategoricalBlock]);

        let tensors = build_inputs(&slots, &features()).unwrap();
        let numeric = float(&tensors[0]);
        assert_eq!(numeric.shape(), &[2, 13]);
        assert_eq!(numeric[[1, 0]], 20.0);
        let categorical = text(&tensors[1]);
        assert_eq!(categorical.shape(), &[2, 2]);
        assert_eq!(categorical[[1, 0]], "B");
        assert_eq!(categorical[[1, 1]], "X");
    }

    #[test]
    fn input_order_follows_the_graph() {
        let mut inputs = per_column_inputs();
        inputs.reverse();
        let slots = plan_inputs(&inputs).unwrap();
        assert_eq!(slots[0], InputSlot::Column(14));
        let tensors = build_inputs(&slots, &features()).unwrap();
        assert_eq!(text(&tensors[0])[[0, 0]], "X");
        assert_eq!(float(&tensors[14])[[1, 0]], 20.0);
    }

    #[test]
    fn rejects_graphs_that_skip_or_repeat_columns() {
        // numeric block alone leaves vendor/department unfed
        let err = plan_inputs(&[("input".to_string(), false)]).unwrap_err();
        assert!(err.to_string().contains("vendor, department"));

        let mut inputs = per_column_inputs();
        inputs.push(("numeric".to_string(), false));
        assert!(plan_inputs(&inputs).is_err());

        let mut inputs = per_column_inputs();
        inputs[13].1 = false;
        assert!(matches!(plan_inputs(&inputs), Err(ScoringError::InputLayout(_))));
    }

    #[test]
    fn offset_text() {
        assert_eq!(parse_offset(" -0.5 "), Some(-0.5));
        assert_eq!(parse_offset("nan"), None);
        assert_eq!(parse_offset("n/a"), None);
    }
}
