//! Batched policy inference: observations in, one action per agent out.

use tracing::{debug, info, warn};
use warren_core::{ActionId, InferenceError, LoadError};

use crate::backend::{AutoBackend, InferenceBackend, InferenceSession, LoadOptions, ModelMetadata};
use crate::source::{ObservationSource, PolicySource};
use crate::tensor::{static_len, Shape, Tensor, Value};

/// Lifecycle of a [`PolicyRunner`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunnerState {
    /// No model.
    Unloaded,
    /// A load is in progress.
    Loading,
    /// A model is ready to run.
    Loaded,
}

/// Counters since the current model was loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunnerMetrics {
    /// Forward passes run.
    pub batches: u64,
    /// Batches whose declared input shape disagreed with the data and
    /// were run as `[batch, features]` instead.
    pub shape_fallbacks: u64,
}

/// Owns at most one loaded model and turns observation batches into
/// actions.
pub struct PolicyRunner {
    backend: Box<dyn InferenceBackend>,
    session: Option<Box<dyn InferenceSession>>,
    state: RunnerState,
    action_count: Option<usize>,
    metrics: RunnerMetrics,
}

impl PolicyRunner {
    /// A runner loading through `backend`.
    pub fn new(backend: Box<dyn InferenceBackend>) -> Self {
        Self {
            backend,
            session: None,
            state: RunnerState::Unloaded,
            action_count: None,
            metrics: RunnerMetrics::default(),
        }
    }

    /// A runner over every backend compiled into this build.
    pub fn with_default_backends() -> Self {
        Self::new(Box::new(AutoBackend::new()))
    }

    /// Load a model, replacing any current one.
    ///
    /// On failure the runner is left unloaded.
    pub fn load(&mut self, source: PolicySource, options: &LoadOptions) -> Result<(), LoadError> {
        self.clear();
        self.state = RunnerState::Loading;
        let described = source.describe();
        debug!(source = %described, backend = self.backend.name(), "loading policy");

        let loaded = source
            .resolve()
            .and_then(|bytes| self.backend.load(&bytes, options));
        match loaded {
            Ok(session) => {
                let meta = session.metadata();
                info!(
                    source = %described,
                    input = ?meta.input_name,
                    output = ?meta.output_name,
                    dims = ?meta.input_dims.as_slice(),
                    "policy loaded"
                );
                self.action_count = meta.action_count;
                self.session = Some(session);
                self.state = RunnerState::Loaded;
                Ok(())
            }
            Err(e) => {
                info!(source = %described, error = %e, "policy load failed");
                self.state = RunnerState::Unloaded;
                Err(e)
            }
        }
    }

    /// Drop the model and everything cached about it.
    pub fn clear(&mut self) {
        if self.session.take().is_some() {
            info!("policy cleared");
        }
        self.state = RunnerState::Unloaded;
        self.action_count = None;
        self.metrics = RunnerMetrics::default();
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Whether [`act_batch`](Self::act_batch) can run.
    pub fn is_ready(&self) -> bool {
        self.state == RunnerState::Loaded
            && self
                .session
                .as_ref()
                .is_some_and(|s| s.metadata().input_name.is_some())
    }

    /// Facts about the loaded model.
    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.session.as_ref().map(|s| s.metadata())
    }

    /// Actions per agent, once known.
    pub fn action_count(&self) -> Option<usize> {
        self.action_count
    }

    /// Counters since the last load.
    pub fn metrics(&self) -> RunnerMetrics {
        self.metrics
    }

    /// One action per observation, chosen by row-wise arg-max over the
    /// model's scores.
    pub fn act_batch(&mut self, observations: &[Vec<f32>]) -> Result<Vec<ActionId>, InferenceError> {
        let batch = observations.len();
        if batch == 0 {
            return Ok(Vec::new());
        }
        if !self.is_ready() {
            return Err(InferenceError::NotReady);
        }
        let features = observations[0].len();
        if features == 0 {
            return Ok(vec![ActionId(0); batch]);
        }
        if let Some((index, o)) = observations
            .iter()
            .enumerate()
            .find(|(_, o)| o.len() != features)
        {
            return Err(InferenceError::RaggedBatch {
                expected: features,
                index,
                found: o.len(),
            });
        }

        let session = self.session.as_mut().ok_or(InferenceError::NotReady)?;
        let (shape, fell_back) = resolve_input_shape(&session.metadata().input_dims, batch, features);
        if fell_back {
            self.metrics.shape_fallbacks += 1;
            warn!(
                declared = ?session.metadata().input_dims.as_slice(),
                batch,
                features,
                "declared input shape does not fit batch, using [batch, features]"
            );
        }

        let data: Vec<f32> = observations.concat();
        let outputs = session.run(Tensor::f32(&shape, data))?;
        self.metrics.batches += 1;

        let tensor = match outputs.into_iter().next() {
            None => return Err(InferenceError::NoOutput),
            Some(Value::Tensor(t)) => t,
            Some(other) => {
                return Err(InferenceError::NotATensor {
                    found: other.to_string(),
                })
            }
        };
        let scores = tensor.data.to_f32().ok_or_else(|| InferenceError::NotATensor {
            found: tensor.data.type_name().to_string(),
        })?;

        let actions = if tensor.shape.len() >= 2 {
            tensor.shape.last().map_or(0, |&d| d.max(0) as usize)
        } else {
            scores.len() / batch
        };
        if actions == 0 || scores.len() < batch * actions {
            return Err(InferenceError::ShapeMismatch {
                batch,
                elements: scores.len(),
            });
        }
        self.action_count = Some(actions);

        Ok(scores
            .chunks_exact(actions)
            .take(batch)
            .map(|row| ActionId(argmax(row) as u32))
            .collect())
    }

    /// Like [`act_batch`](Self::act_batch), converting each payload to
    /// `f32` features first.
    pub fn act_payloads(
        &mut self,
        payloads: Vec<ObservationSource>,
    ) -> Result<Vec<ActionId>, InferenceError> {
        let observations = payloads
            .into_iter()
            .map(ObservationSource::into_features)
            .collect::<Result<Vec<_>, _>>()?;
        self.act_batch(&observations)
    }
}

impl Default for PolicyRunner {
    fn default() -> Self {
        Self::with_default_backends()
    }
}

/// The input shape for a batch, and whether it had to fall back to
/// `[batch, features]`.
pub fn resolve_input_shape(declared: &[i64], batch: usize, features: usize) -> (Shape, bool) {
    let plain = Shape::from_slice(&[batch as i64, features as i64]);
    if declared.is_empty() {
        return (plain, false);
    }
    let mut shape = Shape::from_slice(declared);
    if shape[0] <= 0 {
        shape[0] = batch as i64;
    }
    match static_len(&shape) {
        Some(n) if n == batch * features => (shape, false),
        _ => (plain, true),
    }
}

/// Index of the largest score; ties go to the lowest index and `NaN`
/// never wins.
pub fn argmax(row: &[f32]) -> usize {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in row.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.is_none_or(|(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map_or(0, |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::TensorData;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Returns a fixed output and counts calls.
    struct Fixed {
        dims: Vec<i64>,
        output: Vec<Value>,
        calls: Arc<AtomicUsize>,
    }

    struct FixedSession {
        meta: ModelMetadata,
        output: Vec<Value>,
        calls: Arc<AtomicUsize>,
    }

    impl InferenceBackend for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn recognises(&self, _: &[u8]) -> bool {
            true
        }
        fn load(&self, _: &[u8], _: &LoadOptions) -> Result<Box<dyn InferenceSession>, LoadError> {
            Ok(Box::new(FixedSession {
                meta: ModelMetadata {
                    input_name: Some("input".into()),
                    output_name: Some("output".into()),
                    input_dims: Shape::from_slice(&self.dims),
                    action_count: None,
                },
                output: self.output.clone(),
                calls: self.calls.clone(),
            }))
        }
    }

    impl InferenceSession for FixedSession {
        fn metadata(&self) -> &ModelMetadata {
            &self.meta
        }
        fn run(&mut self, _: Tensor) -> Result<Vec<Value>, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.output.clone())
        }
    }

    fn loaded(dims: &[i64], output: Vec<Value>) -> (PolicyRunner, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut runner = PolicyRunner::new(Box::new(Fixed {
            dims: dims.to_vec(),
            output,
            calls: calls.clone(),
        }));
        runner
            .load(PolicySource::Bytes(vec![0]), &LoadOptions::default())
            .unwrap();
        (runner, calls)
    }

    fn scores(shape: &[i64], v: Vec<f32>) -> Vec<Value> {
        vec![Value::Tensor(Tensor::f32(shape, v))]
    }

    #[test]
    fn argmax_ties_and_nan() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0]), 1);
        assert_eq!(argmax(&[f32::NAN, 0.5, 0.1]), 1);
        assert_eq!(argmax(&[f32::NAN, f32::NAN]), 0);
        assert_eq!(argmax(&[-2.0, -1.0]), 1);
    }

    #[test]
    fn resolve_substitutes_dynamic_batch() {
        assert_eq!(
            resolve_input_shape(&[-1, 5], 3, 5),
            (Shape::from_slice(&[3, 5]), false)
        );
        assert_eq!(
            resolve_input_shape(&[], 2, 4),
            (Shape::from_slice(&[2, 4]), false)
        );
    }

    #[test]
    fn resolve_falls_back_on_mismatch() {
        assert_eq!(
            resolve_input_shape(&[1, 5], 3, 5),
            (Shape::from_slice(&[3, 5]), true)
        );
        assert_eq!(
            resolve_input_shape(&[-1, -1], 3, 5),
            (Shape::from_slice(&[3, 5]), true)
        );
    }

    #[test]
    fn empty_batch_skips_backend() {
        let (mut runner, calls) = loaded(&[-1, 2], scores(&[1, 2], vec![0.0, 1.0]));
        assert_eq!(runner.act_batch(&[]), Ok(vec![]));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn zero_features_yield_action_zero() {
        let (mut runner, calls) = loaded(&[-1, 2], scores(&[1, 2], vec![0.0, 1.0]));
        assert_eq!(
            runner.act_batch(&[vec![], vec![]]),
            Ok(vec![ActionId(0), ActionId(0)])
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn ragged_batch_rejected() {
        let (mut runner, _) = loaded(&[-1, 2], scores(&[2, 2], vec![0.0; 4]));
        assert_eq!(
            runner.act_batch(&[vec![0.0, 1.0], vec![0.0]]),
            Err(InferenceError::RaggedBatch {
                expected: 2,
                index: 1,
                found: 1
            })
        );
    }

    #[test]
    fn rows_argmaxed() {
        let (mut runner, calls) = loaded(
            &[-1, 2],
            scores(&[2, 3], vec![0.1, 0.9, 0.0, 2.0, 2.0, 1.0]),
        );
        let out = runner.act_batch(&[vec![0.0; 2], vec![1.0; 2]]).unwrap();
        assert_eq!(out, vec![ActionId(1), ActionId(0)]);
        assert_eq!(runner.action_count(), Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(runner.metrics().batches, 1);
    }

    #[test]
    fn flat_output_split_by_batch() {
        let (mut runner, _) = loaded(&[-1, 1], scores(&[4], vec![0.0, 1.0, 5.0, 4.0]));
        let out = runner.act_batch(&[vec![0.0], vec![0.0]]).unwrap();
        assert_eq!(out, vec![ActionId(1), ActionId(0)]);
    }

    #[test]
    fn integer_scores_coerced() {
        let out = vec![Value::Tensor(Tensor {
            shape: Shape::from_slice(&[1, 3]),
            data: TensorData::I64(vec![1, 7, 3]),
        })];
        let (mut runner, _) = loaded(&[-1, 1], out);
        assert_eq!(runner.act_batch(&[vec![0.0]]), Ok(vec![ActionId(1)]));
    }

    #[test]
    fn output_errors() {
        let (mut runner, _) = loaded(&[-1, 1], vec![]);
        assert_eq!(runner.act_batch(&[vec![0.0]]), Err(InferenceError::NoOutput));

        let (mut runner, _) = loaded(&[-1, 1], vec![Value::Opaque("sequence".into())]);
        assert!(matches!(
            runner.act_batch(&[vec![0.0]]),
            Err(InferenceError::NotATensor { .. })
        ));

        let strings = vec![Value::Tensor(Tensor {
            shape: Shape::from_slice(&[1, 1]),
            data: TensorData::Str(vec!["up".into()]),
        })];
        let (mut runner, _) = loaded(&[-1, 1], strings);
        assert!(matches!(
            runner.act_batch(&[vec![0.0]]),
            Err(InferenceError::NotATensor { .. })
        ));

        let (mut runner, _) = loaded(&[-1, 1], scores(&[1], vec![1.0]));
        assert_eq!(
            runner.act_batch(&[vec![0.0], vec![0.0]]),
            Err(InferenceError::ShapeMismatch {
                batch: 2,
                elements: 1
            })
        );
    }

    #[test]
    fn fixed_batch_model_counts_fallbacks() {
        let (mut runner, _) = loaded(&[1, 2], scores(&[3, 2], vec![0.0, 1.0, 1.0, 0.0, 0.0, 1.0]));
        let out = runner.act_batch(&[vec![0.0; 2], vec![0.0; 2], vec![0.0; 2]]).unwrap();
        assert_eq!(out, vec![ActionId(1), ActionId(0), ActionId(1)]);
        assert_eq!(runner.metrics().shape_fallbacks, 1);
    }

    #[test]
    fn clear_resets_everything() {
        let (mut runner, _) = loaded(&[-1, 2], scores(&[1, 2], vec![0.0, 1.0]));
        assert!(runner.is_ready());
        runner.act_batch(&[vec![0.0; 2]]).unwrap();
        runner.clear();
        assert_eq!(runner.state(), RunnerState::Unloaded);
        assert!(!runner.is_ready());
        assert_eq!(runner.metrics(), RunnerMetrics::default());
        assert_eq!(runner.act_batch(&[vec![0.0]]), Err(InferenceError::NotReady));
    }

    #[test]
    fn failed_load_leaves_runner_unloaded() {
        let mut runner = PolicyRunner::with_default_backends();
        let err = runner
            .load(PolicySource::Bytes(b"junk".to_vec()), &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::Unsupported { .. }));
        assert_eq!(runner.state(), RunnerState::Unloaded);
    }
}
