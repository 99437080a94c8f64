//! Built-in dense-network policy format (`WDN1`).
//!
//! All integers and floats are little-endian. Layout:
//!
//! ```text
//! magic       4 bytes  "WDN1"
//! version     u32      FORMAT_VERSION
//! input name  u32 length + UTF-8
//! output name u32 length + UTF-8
//! layers      u32 count, then per layer:
//!   inputs      u32
//!   outputs     u32
//!   activation  u8   (0 linear, 1 relu, 2 tanh)
//!   weights     f32 × outputs × inputs, row-major by output
//!   biases      f32 × outputs
//! ```

use warren_core::{InferenceError, LoadError};

use crate::backend::{check_providers, InferenceBackend, InferenceSession, LoadOptions, ModelMetadata};
use crate::tensor::{Shape, Tensor, TensorData, Value};

/// File magic.
pub const MAGIC: &[u8; 4] = b"WDN1";
/// Current format version.
pub const FORMAT_VERSION: u32 = 1;

// ── Network ────────────────────────────────────────────────────────

/// Element-wise layer activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    /// Identity.
    Linear,
    /// `max(0, x)`.
    Relu,
    /// Hyperbolic tangent.
    Tanh,
}

impl Activation {
    fn tag(self) -> u8 {
        match self {
            Self::Linear => 0,
            Self::Relu => 1,
            Self::Tanh => 2,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Linear),
            1 => Some(Self::Relu),
            2 => Some(Self::Tanh),
            _ => None,
        }
    }

    fn apply(self, x: f32) -> f32 {
        match self {
            Self::Linear => x,
            Self::Relu => x.max(0.0),
            Self::Tanh => x.tanh(),
        }
    }
}

/// One fully connected layer.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseLayer {
    /// Input width.
    pub inputs: usize,
    /// Output width.
    pub outputs: usize,
    /// Activation applied after the affine map.
    pub activation: Activation,
    /// `outputs × inputs` weights, row-major by output.
    pub weights: Vec<f32>,
    /// One bias per output.
    pub biases: Vec<f32>,
}

/// A feed-forward network of [`DenseLayer`]s.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseNetwork {
    /// Input tensor name.
    pub input_name: String,
    /// Output tensor name.
    pub output_name: String,
    /// Layers, input first.
    pub layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    /// A network with the conventional `input`/`output` tensor names.
    pub fn new(layers: Vec<DenseLayer>) -> Self {
        Self {
            input_name: "input".into(),
            output_name: "output".into(),
            layers,
        }
    }

    /// Input feature width.
    pub fn input_len(&self) -> usize {
        self.layers.first().map_or(0, |l| l.inputs)
    }

    /// Output (action) width.
    pub fn output_len(&self) -> usize {
        self.layers.last().map_or(0, |l| l.outputs)
    }

    fn validate(&self) -> Result<(), LoadError> {
        let malformed = |reason: String| Err(LoadError::Malformed { reason });
        if self.layers.is_empty() {
            return malformed("network has no layers".into());
        }
        for (i, l) in self.layers.iter().enumerate() {
            if l.inputs == 0 || l.outputs == 0 {
                return malformed(format!("layer {i} has a zero dimension"));
            }
            if l.weights.len() != l.inputs * l.outputs || l.biases.len() != l.outputs {
                return malformed(format!("layer {i} parameter count mismatch"));
            }
        }
        for (i, pair) in self.layers.windows(2).enumerate() {
            if pair[0].outputs != pair[1].inputs {
                return malformed(format!(
                    "layer {i} outputs {} but layer {} expects {}",
                    pair[0].outputs,
                    i + 1,
                    pair[1].inputs
                ));
            }
        }
        Ok(())
    }

    /// Run `rows` rows of `input_len()` features through the network.
    pub fn forward(&self, input: &[f32], rows: usize) -> Vec<f32> {
        let mut current = input.to_vec();
        for layer in &self.layers {
            let mut next = Vec::with_capacity(rows * layer.outputs);
            for row in current.chunks_exact(layer.inputs).take(rows) {
                for o in 0..layer.outputs {
                    let w = &layer.weights[o * layer.inputs..(o + 1) * layer.inputs];
                    let z: f32 = w.iter().zip(row).map(|(a, b)| a * b).sum::<f32>() + layer.biases[o];
                    next.push(layer.activation.apply(z));
                }
            }
            current = next;
        }
        current
    }

    /// Serialise to `WDN1` bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(MAGIC);
        write_u32_le(&mut buf, FORMAT_VERSION);
        write_str(&mut buf, &self.input_name);
        write_str(&mut buf, &self.output_name);
        write_u32_le(&mut buf, self.layers.len() as u32);
        for l in &self.layers {
            write_u32_le(&mut buf, l.inputs as u32);
            write_u32_le(&mut buf, l.outputs as u32);
            buf.push(l.activation.tag());
            for &w in l.weights.iter().chain(&l.biases) {
                buf.extend_from_slice(&w.to_le_bytes());
            }
        }
        buf
    }

    /// Parse `WDN1` bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, LoadError> {
        let mut r = Reader { buf: bytes, pos: 0 };
        if r.take(4)? != MAGIC {
            return Err(LoadError::Malformed {
                reason: "bad magic".into(),
            });
        }
        let version = r.u32()?;
        if version != FORMAT_VERSION {
            return Err(LoadError::Malformed {
                reason: format!("unsupported version {version}"),
            });
        }
        let input_name = r.string()?;
        let output_name = r.string()?;
        let count = r.u32()? as usize;
        let mut layers = Vec::new();
        for _ in 0..count {
            let inputs = r.u32()? as usize;
            let outputs = r.u32()? as usize;
            let tag = r.u8()?;
            let activation = Activation::from_tag(tag).ok_or_else(|| LoadError::Malformed {
                reason: format!("unknown activation tag {tag}"),
            })?;
            let weights = r.f32s(inputs.saturating_mul(outputs))?;
            let biases = r.f32s(outputs)?;
            layers.push(DenseLayer {
                inputs,
                outputs,
                activation,
                weights,
                biases,
            });
        }
        if r.pos != bytes.len() {
            return Err(LoadError::Malformed {
                reason: format!("{} trailing bytes", bytes.len() - r.pos),
            });
        }
        let net = Self {
            input_name,
            output_name,
            layers,
        };
        net.validate()?;
        Ok(net)
    }
}

// ── Codec helpers ──────────────────────────────────────────────────

fn write_u32_le(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_str(buf: &mut Vec<u8>, s: &str) {
    write_u32_le(buf, s.len() as u32);
    buf.extend_from_slice(s.as_bytes());
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], LoadError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&e| e <= self.buf.len())
            .ok_or_else(|| LoadError::Malformed {
                reason: format!("truncated at byte {}", self.pos),
            })?;
        let s = &self.buf[self.pos..end];
        self.pos = end;
        Ok(s)
    }

    fn u8(&mut self) -> Result<u8, LoadError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, LoadError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn string(&mut self) -> Result<String, LoadError> {
        let len = self.u32()? as usize;
        let b = self.take(len)?;
        String::from_utf8(b.to_vec()).map_err(|_| LoadError::Malformed {
            reason: "tensor name is not UTF-8".into(),
        })
    }

    fn f32s(&mut self, n: usize) -> Result<Vec<f32>, LoadError> {
        let b = self.take(n.saturating_mul(4))?;
        Ok(b.chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }
}

// ── Backend ────────────────────────────────────────────────────────

/// Loads `WDN1` models. Always available; CPU only.
#[derive(Clone, Copy, Debug, Default)]
pub struct DenseBackend;

impl InferenceBackend for DenseBackend {
    fn name(&self) -> &'static str {
        "dense"
    }

    fn recognises(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(MAGIC)
    }

    fn load(
        &self,
        bytes: &[u8],
        options: &LoadOptions,
    ) -> Result<Box<dyn InferenceSession>, LoadError> {
        check_providers(self, options)?;
        let network = DenseNetwork::decode(bytes)?;
        let metadata = ModelMetadata {
            input_name: Some(network.input_name.clone()),
            output_name: Some(network.output_name.clone()),
            input_dims: Shape::from_slice(&[-1, network.input_len() as i64]),
            action_count: Some(network.output_len()),
        };
        Ok(Box::new(DenseSession { network, metadata }))
    }
}

/// A loaded dense network.
pub struct DenseSession {
    network: DenseNetwork,
    metadata: ModelMetadata,
}

impl InferenceSession for DenseSession {
    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn run(&mut self, input: Tensor) -> Result<Vec<Value>, InferenceError> {
        let TensorData::F32(data) = input.data else {
            return Err(InferenceError::Backend {
                reason: format!("expected f32 input, got {}", input.data.type_name()),
            });
        };
        let width = self.network.input_len();
        if input.shape.last() != Some(&(width as i64)) {
            return Err(InferenceError::Backend {
                reason: format!(
                    "input shape {:?} does not end in the network width {width}",
                    input.shape.as_slice()
                ),
            });
        }
        if data.len() % width != 0 {
            return Err(InferenceError::Backend {
                reason: format!("{} values are not rows of {width}", data.len()),
            });
        }
        let rows = data.len() / width;
        let out = self.network.forward(&data, rows);
        let shape = [rows as i64, self.network.output_len() as i64];
        Ok(vec![Value::Tensor(Tensor::f32(&shape, out))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_policy() -> DenseNetwork {
        // 2 features -> 2 scores, scores equal the features
        DenseNetwork::new(vec![DenseLayer {
            inputs: 2,
            outputs: 2,
            activation: Activation::Linear,
            weights: vec![1.0, 0.0, 0.0, 1.0],
            biases: vec![0.0, 0.0],
        }])
    }

    #[test]
    fn encoded_network_loads() {
        let net = identity_policy();
        assert_eq!(DenseNetwork::decode(&net.encode()), Ok(net));
    }

    #[test]
    fn bad_magic_rejected() {
        let mut bytes = identity_policy().encode();
        bytes[0] = b'X';
        assert!(matches!(
            DenseNetwork::decode(&bytes),
            Err(LoadError::Malformed { .. })
        ));
    }

    #[test]
    fn truncated_rejected() {
        let bytes = identity_policy().encode();
        assert!(DenseNetwork::decode(&bytes[..bytes.len() - 3]).is_err());
    }

    #[test]
    fn mismatched_layers_rejected() {
        let mut net = identity_policy();
        net.layers.push(DenseLayer {
            inputs: 3,
            outputs: 1,
            activation: Activation::Relu,
            weights: vec![0.0; 3],
            biases: vec![0.0],
        });
        assert!(DenseNetwork::decode(&net.encode()).is_err());
    }

    #[test]
    fn forward_applies_activation() {
        let net = DenseNetwork::new(vec![DenseLayer {
            inputs: 1,
            outputs: 2,
            activation: Activation::Relu,
            weights: vec![1.0, -1.0],
            biases: vec![0.0, 0.0],
        }]);
        assert_eq!(net.forward(&[2.0, -3.0], 2), vec![2.0, 0.0, 0.0, 3.0]);
    }

    #[test]
    fn session_reports_metadata_and_shapes() {
        let mut session = DenseBackend
            .load(&identity_policy().encode(), &LoadOptions::default())
            .ok()
            .unwrap();
        let meta = session.metadata().clone();
        assert_eq!(meta.input_name.as_deref(), Some("input"));
        assert!(meta.dynamic_batch());
        assert_eq!(meta.action_count, Some(2));
        let out = session
            .run(Tensor::f32(&[3, 2], vec![1.0, 0.0, 0.0, 1.0, 5.0, 4.0]))
            .unwrap();
        match &out[0] {
            Value::Tensor(t) => assert_eq!(t.shape.as_slice(), &[3, 2]),
            other => panic!("unexpected output {other}"),
        }
    }

    #[test]
    fn rows_wider_than_the_network_are_rejected() {
        let mut session = DenseBackend
            .load(&identity_policy().encode(), &LoadOptions::default())
            .ok()
            .unwrap();
        let err = session
            .run(Tensor::f32(&[1, 4], vec![1.0, 0.0, 0.0, 1.0]))
            .unwrap_err();
        assert!(matches!(err, InferenceError::Backend { .. }));
    }
}
