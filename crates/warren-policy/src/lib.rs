//! Batched policy inference for the Warren simulation engine.
//!
//! A [`PolicyRunner`] owns at most one loaded model. Models are parsed
//! by an [`InferenceBackend`]: the built-in [`DenseBackend`] reads the
//! compact `WDN1` dense-network format, and with the `onnx` feature an
//! `OnnxBackend` runs exported ONNX graphs through `tract`.
//!
//! ```
//! use warren_policy::{DenseLayer, DenseNetwork, LoadOptions, PolicyRunner, PolicySource};
//! use warren_policy::dense::Activation;
//!
//! // Score action 1 by the first feature, action 0 by the second.
//! let net = DenseNetwork::new(vec![DenseLayer {
//!     inputs: 2,
//!     outputs: 2,
//!     activation: Activation::Linear,
//!     weights: vec![0.0, 1.0, 1.0, 0.0],
//!     biases: vec![0.0, 0.0],
//! }]);
//!
//! let mut runner = PolicyRunner::with_default_backends();
//! runner.load(PolicySource::Bytes(net.encode()), &LoadOptions::default()).unwrap();
//! let actions = runner.act_batch(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
//! assert_eq!(actions.iter().map(|a| a.0).collect::<Vec<_>>(), vec![1, 0]);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod dense;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod runner;
pub mod source;
pub mod tensor;

pub use backend::{AutoBackend, InferenceBackend, InferenceSession, LoadOptions, ModelMetadata};
pub use dense::{DenseBackend, DenseLayer, DenseNetwork};
#[cfg(feature = "onnx")]
pub use onnx::OnnxBackend;
pub use runner::{PolicyRunner, RunnerMetrics, RunnerState};
pub use source::{ObservationSource, PolicySource};
pub use tensor::{Shape, Tensor, TensorData, Value};
