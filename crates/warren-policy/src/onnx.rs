//! ONNX models through `tract`.
//!
//! The declared model is kept in inference form; a concrete plan is
//! optimised the first time each input shape is seen and cached after
//! that.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::Cursor;

use tract_onnx::prelude::*;
use warren_core::{InferenceError, LoadError};

use crate::backend::{check_providers, InferenceBackend, InferenceSession, LoadOptions, ModelMetadata};
use crate::tensor::{Shape, Tensor, TensorData, Value};

/// Protobuf tag of `ModelProto.ir_version`, the first field every
/// exporter writes.
const IR_VERSION_TAG: u8 = 0x08;

type Plan = TypedRunnableModel<TypedModel>;

/// Loads ONNX protobuf models. CPU only.
#[derive(Clone, Copy, Debug, Default)]
pub struct OnnxBackend;

impl InferenceBackend for OnnxBackend {
    fn name(&self) -> &'static str {
        "onnx"
    }

    fn recognises(&self, bytes: &[u8]) -> bool {
        bytes.first() == Some(&IR_VERSION_TAG)
    }

    fn load(
        &self,
        bytes: &[u8],
        options: &LoadOptions,
    ) -> Result<Box<dyn InferenceSession>, LoadError> {
        check_providers(self, options)?;
        let malformed = |e: TractError| LoadError::Malformed {
            reason: e.to_string(),
        };
        let model = tract_onnx::onnx()
            .model_for_read(&mut Cursor::new(bytes))
            .map_err(malformed)?;

        let input_name = model
            .input_outlets()
            .map_err(malformed)?
            .first()
            .map(|o| model.node(o.node).name.clone());
        let output_name = model
            .output_outlets()
            .map_err(malformed)?
            .first()
            .map(|o| model.node(o.node).name.clone());
        let input_dims: Shape = match model.input_fact(0) {
            Ok(fact) => fact
                .shape
                .dims()
                .map(|d| d.concretize().and_then(|t| t.to_i64().ok()).unwrap_or(-1))
                .collect(),
            Err(_) => Shape::new(),
        };

        Ok(Box::new(OnnxSession {
            model,
            plans: HashMap::new(),
            metadata: ModelMetadata {
                input_name,
                output_name,
                input_dims,
                action_count: None,
            },
        }))
    }
}

/// A loaded ONNX model.
pub struct OnnxSession {
    model: InferenceModel,
    plans: HashMap<Vec<usize>, Plan>,
    metadata: ModelMetadata,
}

impl OnnxSession {
    fn plan(&mut self, shape: &[usize]) -> TractResult<&Plan> {
        match self.plans.entry(shape.to_vec()) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let plan = self
                    .model
                    .clone()
                    .with_input_fact(0, f32::fact(shape.to_vec()).into())?
                    .into_optimized()?
                    .into_runnable()?;
                Ok(e.insert(plan))
            }
        }
    }
}

impl InferenceSession for OnnxSession {
    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn run(&mut self, input: Tensor) -> Result<Vec<Value>, InferenceError> {
        let backend = |e: TractError| InferenceError::Backend {
            reason: e.to_string(),
        };
        let TensorData::F32(data) = input.data else {
            return Err(InferenceError::Backend {
                reason: format!("expected f32 input, got {}", input.data.type_name()),
            });
        };
        let shape: Vec<usize> = input.shape.iter().map(|&d| d.max(0) as usize).collect();
        let tensor = tract_onnx::prelude::Tensor::from_shape(&shape, &data).map_err(backend)?;
        let outputs = self
            .plan(&shape)
            .and_then(|plan| plan.run(tvec!(tensor.into())))
            .map_err(backend)?;
        outputs.iter().map(convert).collect()
    }
}

fn convert(value: &TValue) -> Result<Value, InferenceError> {
    let shape: Shape = value.shape().iter().map(|&d| d as i64).collect();
    let data = match value.datum_type() {
        DatumType::F32 => TensorData::F32(slice(value)?),
        DatumType::F64 => TensorData::F64(slice(value)?),
        DatumType::I8 => TensorData::I8(slice(value)?),
        DatumType::I16 => TensorData::I16(slice(value)?),
        DatumType::I32 => TensorData::I32(slice(value)?),
        DatumType::I64 => TensorData::I64(slice(value)?),
        DatumType::U8 => TensorData::U8(slice(value)?),
        DatumType::U16 => TensorData::U16(slice(value)?),
        DatumType::U32 => TensorData::U32(slice(value)?),
        DatumType::Bool => TensorData::Bool(slice(value)?),
        other => return Ok(Value::Opaque(format!("{other:?} tensor"))),
    };
    Ok(Value::Tensor(Tensor { shape, data }))
}

fn slice<T: Datum + Copy>(value: &TValue) -> Result<Vec<T>, InferenceError> {
    value
        .as_slice::<T>()
        .map(<[T]>::to_vec)
        .map_err(|e| InferenceError::Backend {
            reason: e.to_string(),
        })
}
