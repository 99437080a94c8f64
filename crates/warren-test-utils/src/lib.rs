//! Test utilities and mock types for Warren development.
//!
//! Provides a scriptable [`MockBackend`] for exercising the policy
//! runner and scheduler without a real model, plus level and network
//! fixtures in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use warren_core::{InferenceError, LoadError};
use warren_policy::{
    InferenceBackend, InferenceSession, LoadOptions, ModelMetadata, Shape, Tensor, Value,
};

/// Computes a session's outputs from its input.
pub type Responder = Arc<dyn Fn(&Tensor) -> Result<Vec<Value>, InferenceError> + Send + Sync>;

/// A backend whose sessions answer through a closure.
///
/// Every session loaded from the same `MockBackend` shares its call
/// counter, so a test can keep a [`calls`](MockBackend::calls) handle
/// after moving the backend into a runner.
pub struct MockBackend {
    metadata: ModelMetadata,
    responder: Responder,
    load_error: Option<LoadError>,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new(metadata: ModelMetadata, responder: Responder) -> Self {
        Self {
            metadata,
            responder,
            load_error: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Scores `action` highest for every row of the batch.
    pub fn constant_action(action: usize, action_count: usize) -> Self {
        let responder: Responder = Arc::new(move |input: &Tensor| {
            let rows = input.shape.first().copied().unwrap_or(1).max(1) as usize;
            let mut scores = vec![0.0; rows * action_count];
            for row in scores.chunks_exact_mut(action_count) {
                row[action] = 1.0;
            }
            Ok(vec![Value::Tensor(Tensor::f32(
                &[rows as i64, action_count as i64],
                scores,
            ))])
        });
        Self::new(default_metadata(), responder)
    }

    /// Every forward pass fails with a backend error.
    pub fn failing(reason: &str) -> Self {
        let reason = reason.to_string();
        Self::new(
            default_metadata(),
            Arc::new(move |_: &Tensor| {
                Err(InferenceError::Backend {
                    reason: reason.clone(),
                })
            }),
        )
    }

    /// Every load fails with `err`.
    pub fn rejecting(err: LoadError) -> Self {
        let mut mock = Self::constant_action(0, 1);
        mock.load_error = Some(err);
        mock
    }

    /// Override the declared input dimensions.
    pub fn with_input_dims(mut self, dims: &[i64]) -> Self {
        self.metadata.input_dims = Shape::from_slice(dims);
        self
    }

    /// Drop the declared input name so the runner never becomes ready.
    pub fn without_input_name(mut self) -> Self {
        self.metadata.input_name = None;
        self
    }

    /// Shared forward-pass counter.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

fn default_metadata() -> ModelMetadata {
    ModelMetadata {
        input_name: Some("input".into()),
        output_name: Some("output".into()),
        input_dims: Shape::new(),
        action_count: None,
    }
}

impl InferenceBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn recognises(&self, _bytes: &[u8]) -> bool {
        true
    }

    fn load(
        &self,
        _bytes: &[u8],
        _options: &LoadOptions,
    ) -> Result<Box<dyn InferenceSession>, LoadError> {
        if let Some(err) = &self.load_error {
            return Err(err.clone());
        }
        Ok(Box::new(MockSession {
            metadata: self.metadata.clone(),
            responder: Arc::clone(&self.responder),
            calls: Arc::clone(&self.calls),
        }))
    }
}

/// Session produced by [`MockBackend`].
pub struct MockSession {
    metadata: ModelMetadata,
    responder: Responder,
    calls: Arc<AtomicUsize>,
}

impl InferenceSession for MockSession {
    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn run(&mut self, input: Tensor) -> Result<Vec<Value>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.responder)(&input)
    }
}
