// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON model manifest parsing.
//!
//! The manifest describes a model's tensor table and operator list, with
//! tensors referenced by name. It carries no weights: every operator in
//! the registered set is weight-free.
//!
//! # Format
//! ```json
//! {
//!   "name": "lstm_gate_int16",
//!   "tensors": [
//!     { "name": "x", "dtype": "int16", "shape": [1, 32],
//!       "quantization": { "scale": 0.000244140625, "zero_point": 0 } },
//!     { "name": "h", "dtype": "int16", "shape": [1, 32],
//!       "quantization": { "scale": 0.000030517578125 } }
//!   ],
//!   "operators": [
//!     { "name": "gate", "op": "TANH", "inputs": ["x"], "output": "h" }
//!   ],
//!   "inputs": ["x"],
//!   "outputs": ["h"]
//! }
//! ```

use crate::ModelError;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tensor_core::{DType, QuantParams};

/// Top-level model manifest.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelManifest {
    /// Human-readable model name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub tensors: Vec<ManifestTensor>,
    pub operators: Vec<ManifestOperator>,
    /// Names of the tensors the caller fills.
    pub inputs: Vec<String>,
    /// Names of the tensors the caller reads back.
    pub outputs: Vec<String>,
}

/// A single tensor entry in the manifest.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ManifestTensor {
    pub name: String,
    /// Element type string (e.g., `"int8"`, `"f32"`).
    pub dtype: String,
    pub shape: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantization: Option<QuantParams>,
}

/// A single operator entry in the manifest.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ManifestOperator {
    pub name: String,
    /// Operator type string (e.g., `"TANH"`, `"softmax"`).
    pub op: String,
    pub inputs: Vec<String>,
    pub output: String,
    /// Softmax temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f32>,
}

impl ModelManifest {
    /// Loads a manifest from a JSON file path.
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let manifest: Self = serde_json::from_str(json)?;
        Ok(manifest)
    }

    /// Parses a manifest from raw bytes (e.g. a memory map or `include_bytes!`).
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let manifest: Self = serde_json::from_slice(bytes)?;
        Ok(manifest)
    }

    /// Validates that the manifest is internally consistent.
    ///
    /// Checks:
    /// - At least one tensor and one operator are defined.
    /// - Tensor and operator names are unique.
    /// - All dtype and operator type strings are recognised.
    /// - Every tensor reference resolves to a declared tensor.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.tensors.is_empty() || self.operators.is_empty() {
            return Err(ModelError::InvalidGraph(
                "manifest needs at least one tensor and one operator".into(),
            ));
        }

        let mut tensor_names = HashSet::new();
        for tensor in &self.tensors {
            if !tensor_names.insert(tensor.name.as_str()) {
                return Err(ModelError::InvalidTensor {
                    tensor: tensor.name.clone(),
                    detail: "duplicate tensor name".into(),
                });
            }
            parse_dtype(&tensor.dtype).ok_or_else(|| ModelError::InvalidTensor {
                tensor: tensor.name.clone(),
                detail: format!("unsupported dtype '{}'", tensor.dtype),
            })?;
        }

        let resolve = |name: &str, referenced_by: &str| {
            if tensor_names.contains(name) {
                Ok(())
            } else {
                Err(ModelError::UnknownTensor {
                    referenced_by: referenced_by.to_string(),
                    tensor: name.to_string(),
                })
            }
        };

        let mut op_names = HashSet::new();
        for op in &self.operators {
            if !op_names.insert(op.name.as_str()) {
                return Err(ModelError::InvalidOperator {
                    op: op.name.clone(),
                    detail: "duplicate operator name".into(),
                });
            }
            if crate::OpKind::from_str_loose(&op.op).is_none() {
                return Err(ModelError::UnknownOperator {
                    name: op.name.clone(),
                    op: op.op.clone(),
                });
            }
            for input in &op.inputs {
                resolve(input, &op.name)?;
            }
            resolve(&op.output, &op.name)?;
        }

        for name in &self.inputs {
            resolve(name, "graph inputs")?;
        }
        for name in &self.outputs {
            resolve(name, "graph outputs")?;
        }

        Ok(())
    }

    /// Maps tensor names to their index in the tensor table.
    pub(crate) fn tensor_index(&self) -> HashMap<&str, usize> {
        self.tensors
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.as_str(), i))
            .collect()
    }
}

/// Parses a dtype string into a [`DType`].
pub(crate) fn parse_dtype(s: &str) -> Option<DType> {
    match s.to_lowercase().as_str() {
        "f32" | "float32" => Some(DType::F32),
        "i8" | "int8" => Some(DType::I8),
        "u8" | "uint8" => Some(DType::U8),
        "i16" | "int16" => Some(DType::I16),
        "i32" | "int32" => Some(DType::I32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manifest_json() -> &'static str {
        r#"{
            "name": "kws_head",
            "description": "reshape then softmax",
            "tensors": [
                { "name": "logits", "dtype": "int8", "shape": [1, 1, 12],
                  "quantization": { "scale": 0.1, "zero_point": -3 } },
                { "name": "flat", "dtype": "int8", "shape": [1, 12],
                  "quantization": { "scale": 0.1, "zero_point": -3 } },
                { "name": "probs", "dtype": "int8", "shape": [1, 12],
                  "quantization": { "scale": 0.00390625, "zero_point": -128 } }
            ],
            "operators": [
                { "name": "flatten", "op": "RESHAPE", "inputs": ["logits"], "output": "flat" },
                { "name": "probs", "op": "SOFTMAX", "inputs": ["flat"], "output": "probs", "beta": 1.0 }
            ],
            "inputs": ["logits"],
            "outputs": ["probs"]
        }"#
    }

    #[test]
    fn test_parse_manifest() {
        let m = ModelManifest::from_json(sample_manifest_json()).unwrap();
        assert_eq!(m.name, "kws_head");
        assert_eq!(m.tensors.len(), 3);
        assert_eq!(m.operators.len(), 2);
        assert_eq!(m.operators[1].beta, Some(1.0));
        assert_eq!(m.tensors[0].quantization.unwrap().zero_point, -3);
    }

    #[test]
    fn test_validate_ok() {
        let m = ModelManifest::from_json(sample_manifest_json()).unwrap();
        m.validate().unwrap();
    }

    #[test]
    fn test_from_slice() {
        let m = ModelManifest::from_slice(sample_manifest_json().as_bytes()).unwrap();
        assert_eq!(m.outputs, vec!["probs".to_string()]);
    }

    #[test]
    fn test_validate_no_operators() {
        let mut m = ModelManifest::from_json(sample_manifest_json()).unwrap();
        m.operators.clear();
        assert!(matches!(m.validate(), Err(ModelError::InvalidGraph(_))));
    }

    #[test]
    fn test_validate_bad_op_type() {
        let mut m = ModelManifest::from_json(sample_manifest_json()).unwrap();
        m.operators[0].op = "bogus".into();
        assert!(matches!(
            m.validate(),
            Err(ModelError::UnknownOperator { .. })
        ));
    }

    #[test]
    fn test_validate_bad_dtype() {
        let mut m = ModelManifest::from_json(sample_manifest_json()).unwrap();
        m.tensors[0].dtype = "f16".into();
        assert!(matches!(m.validate(), Err(ModelError::InvalidTensor { .. })));
    }

    #[test]
    fn test_validate_duplicate_tensor_names() {
        let mut m = ModelManifest::from_json(sample_manifest_json()).unwrap();
        m.tensors[1].name = "logits".into();
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_validate_unknown_reference() {
        let mut m = ModelManifest::from_json(sample_manifest_json()).unwrap();
        m.operators[1].inputs = vec!["missing".into()];
        let err = m.validate().unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_parse_dtype() {
        assert_eq!(parse_dtype("f32"), Some(DType::F32));
        assert_eq!(parse_dtype("INT16"), Some(DType::I16));
        assert_eq!(parse_dtype("uint8"), Some(DType::U8));
        assert_eq!(parse_dtype("int32"), Some(DType::I32));
        assert_eq!(parse_dtype("garbage"), None);
    }

    #[test]
    fn test_serde_roundtrip() {
        let m = ModelManifest::from_json(sample_manifest_json()).unwrap();
        let json = serde_json::to_string_pretty(&m).unwrap();
        let back = ModelManifest::from_json(&json).unwrap();
        assert_eq!(back.name, m.name);
        assert_eq!(back.operators.len(), m.operators.len());
    }
}
