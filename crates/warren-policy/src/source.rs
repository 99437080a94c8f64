//! Where policies and observation payloads come from.

use std::fs;
use std::path::Path;

use warren_core::{LoadError, UnsupportedFormatError};

// ── PolicySource ───────────────────────────────────────────────────

/// A policy blob, either in memory or named by a locator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolicySource {
    /// Raw model bytes.
    Bytes(Vec<u8>),
    /// A filesystem path or `file://` URL.
    Locator(String),
}

impl PolicySource {
    /// Resolve to bytes.
    ///
    /// Remote schemes are refused with [`LoadError::Unreachable`]; the
    /// engine never performs network I/O.
    pub fn resolve(self) -> Result<Vec<u8>, LoadError> {
        match self {
            Self::Bytes(b) => Ok(b),
            Self::Locator(locator) => {
                let path = match locator.split_once("://") {
                    None => locator.as_str(),
                    Some(("file", rest)) => rest,
                    Some(_) => return Err(LoadError::Unreachable { locator }),
                };
                read_file(Path::new(path)).map_err(|reason| LoadError::Unreadable {
                    locator: locator.clone(),
                    reason,
                })
            }
        }
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Bytes(b) => format!("{} bytes", b.len()),
            Self::Locator(l) => l.clone(),
        }
    }
}

impl From<Vec<u8>> for PolicySource {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<&str> for PolicySource {
    fn from(s: &str) -> Self {
        Self::Locator(s.to_string())
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, String> {
    fs::read(path).map_err(|e| e.to_string())
}

// ── ObservationSource ──────────────────────────────────────────────

/// The payload shapes an observation may arrive in.
#[derive(Clone, Debug, PartialEq)]
pub enum ObservationSource {
    /// Already `f32`.
    F32(Vec<f32>),
    /// `f64`, narrowed.
    F64(Vec<f64>),
    /// Packed little-endian `f32` values.
    LeBytes(Vec<u8>),
}

impl ObservationSource {
    /// Convert to an `f32` feature vector.
    ///
    /// Fails for byte buffers whose length is not a multiple of four
    /// and for non-finite values.
    pub fn into_features(self) -> Result<Vec<f32>, UnsupportedFormatError> {
        let values = match self {
            Self::F32(v) => v,
            Self::F64(v) => v.into_iter().map(|x| x as f32).collect(),
            Self::LeBytes(b) => {
                if b.len() % 4 != 0 {
                    return Err(UnsupportedFormatError::new(format!(
                        "{} bytes is not a whole number of f32 values",
                        b.len()
                    )));
                }
                b.chunks_exact(4)
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect()
            }
        };
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(UnsupportedFormatError::new(format!(
                "non-finite value at index {i}"
            )));
        }
        Ok(values)
    }
}

impl From<Vec<f32>> for ObservationSource {
    fn from(v: Vec<f32>) -> Self {
        Self::F32(v)
    }
}

impl From<Vec<f64>> for ObservationSource {
    fn from(v: Vec<f64>) -> Self {
        Self::F64(v)
    }
}
