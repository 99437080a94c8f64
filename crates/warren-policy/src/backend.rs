//! The inference backend seam.
//!
//! A [`InferenceBackend`] parses model bytes into an
//! [`InferenceSession`]; the session runs forward passes. The
//! [`PolicyRunner`](crate::PolicyRunner) only ever talks to these two
//! traits.

use warren_core::{InferenceError, LoadError};

use crate::dense::DenseBackend;
use crate::tensor::{Shape, Tensor, Value};

/// Options applied when loading a model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Execution providers in preference order. Empty means the
    /// backend's default (`cpu`).
    pub execution_providers: Vec<String>,
}

impl LoadOptions {
    /// Options requesting the given providers.
    pub fn with_providers<I, S>(providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            execution_providers: providers.into_iter().map(Into::into).collect(),
        }
    }
}

/// Model facts captured once at load time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelMetadata {
    /// Name of the first input, if the model declares one.
    pub input_name: Option<String>,
    /// Name of the first output, if the model declares one.
    pub output_name: Option<String>,
    /// Declared input dimensions; `-1`/`0` are dynamic.
    pub input_dims: Shape,
    /// Actions per agent, once known.
    pub action_count: Option<usize>,
}

impl ModelMetadata {
    /// Whether the leading (batch) dimension is dynamic.
    pub fn dynamic_batch(&self) -> bool {
        self.input_dims.first().is_some_and(|&d| d <= 0)
    }
}

/// Parses model bytes into sessions.
pub trait InferenceBackend: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Whether `provider` can be honoured.
    fn supports_provider(&self, provider: &str) -> bool {
        provider.eq_ignore_ascii_case("cpu")
    }

    /// Whether `bytes` look like this backend's format.
    fn recognises(&self, bytes: &[u8]) -> bool;

    /// Build a session from model bytes.
    fn load(
        &self,
        bytes: &[u8],
        options: &LoadOptions,
    ) -> Result<Box<dyn InferenceSession>, LoadError>;
}

/// A loaded model.
pub trait InferenceSession: Send {
    /// Facts captured at load time.
    fn metadata(&self) -> &ModelMetadata;

    /// One forward pass over a batch.
    fn run(&mut self, input: Tensor) -> Result<Vec<Value>, InferenceError>;
}

/// Reject the first requested provider `backend` cannot honour.
pub fn check_providers(
    backend: &dyn InferenceBackend,
    options: &LoadOptions,
) -> Result<(), LoadError> {
    match options
        .execution_providers
        .iter()
        .find(|p| !backend.supports_provider(p))
    {
        Some(p) => Err(LoadError::UnsupportedProvider {
            provider: p.clone(),
        }),
        None => Ok(()),
    }
}

/// Tries each registered backend in order, picking the first that
/// recognises the bytes.
pub struct AutoBackend {
    backends: Vec<Box<dyn InferenceBackend>>,
}

impl AutoBackend {
    /// Every backend compiled into this build.
    pub fn new() -> Self {
        #[allow(unused_mut)]
        let mut backends: Vec<Box<dyn InferenceBackend>> = vec![Box::new(DenseBackend)];
        #[cfg(feature = "onnx")]
        backends.push(Box::new(crate::onnx::OnnxBackend));
        Self { backends }
    }

    /// A custom backend list.
    pub fn with_backends(backends: Vec<Box<dyn InferenceBackend>>) -> Self {
        Self { backends }
    }
}

impl Default for AutoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBackend for AutoBackend {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn supports_provider(&self, provider: &str) -> bool {
        self.backends.iter().any(|b| b.supports_provider(provider))
    }

    fn recognises(&self, bytes: &[u8]) -> bool {
        self.backends.iter().any(|b| b.recognises(bytes))
    }

    fn load(
        &self,
        bytes: &[u8],
        options: &LoadOptions,
    ) -> Result<Box<dyn InferenceSession>, LoadError> {
        let backend = self
            .backends
            .iter()
            .find(|b| b.recognises(bytes))
            .ok_or_else(|| LoadError::Unsupported {
                reason: format!(
                    "no backend among [{}] recognises this model",
                    self.backends
                        .iter()
                        .map(|b| b.name())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })?;
        backend.load(bytes, options)
    }
}
