// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model loading from a JSON manifest.
//!
//! The loader resolves tensor names to indices, converts dtype and operator
//! strings into their typed forms, and hands back a validated
//! [`ModelGraph`]. Files are memory-mapped so a manifest is never copied
//! before parsing.

use crate::graph::Validated;
use crate::manifest::parse_dtype;
use crate::{ModelError, ModelGraph, ModelManifest, OpKind, OpOptions, OperatorDescriptor, TensorDef};
use std::path::Path;
use tensor_core::Shape;

/// Loads a model into a validated [`ModelGraph`].
///
/// # Example
/// ```no_run
/// use model_ir::ModelLoader;
/// use std::path::Path;
///
/// let graph = ModelLoader::load(Path::new("./models/kws_head.json")).unwrap();
/// println!("Loaded {} operators", graph.num_operators());
/// ```
pub struct ModelLoader;

impl ModelLoader {
    /// Loads and validates a model from a manifest file.
    pub fn load(path: &Path) -> Result<ModelGraph<Validated>, ModelError> {
        let file = std::fs::File::open(path)?;
        // Safety: the map is read-only and dropped before returning; a
        // concurrent truncation of the file is the caller's problem.
        let mmap = unsafe { memmap2::Mmap::map(&file) }?;
        tracing::debug!("mapped manifest '{}' ({} bytes)", path.display(), mmap.len());
        Self::from_slice(&mmap)
    }

    /// Loads and validates a model from manifest bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<ModelGraph<Validated>, ModelError> {
        let manifest = ModelManifest::from_slice(bytes)?;
        Self::from_manifest(&manifest)
    }

    /// Loads and validates a model from a manifest JSON string.
    pub fn from_json(json: &str) -> Result<ModelGraph<Validated>, ModelError> {
        let manifest = ModelManifest::from_json(json)?;
        Self::from_manifest(&manifest)
    }

    /// Builds the graph from an already-parsed manifest.
    ///
    /// Steps:
    /// 1. Validate the manifest.
    /// 2. Convert tensors and operators, resolving names to indices.
    /// 3. Construct and validate the [`ModelGraph`].
    pub fn from_manifest(manifest: &ModelManifest) -> Result<ModelGraph<Validated>, ModelError> {
        manifest.validate()?;
        let index = manifest.tensor_index();
        let lookup = |name: &str, referenced_by: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| ModelError::UnknownTensor {
                    referenced_by: referenced_by.to_string(),
                    tensor: name.to_string(),
                })
        };

        let tensors = manifest
            .tensors
            .iter()
            .map(|t| -> Result<TensorDef, ModelError> {
                let dtype = parse_dtype(&t.dtype).ok_or_else(|| ModelError::InvalidTensor {
                    tensor: t.name.clone(),
                    detail: format!("unsupported dtype '{}'", t.dtype),
                })?;
                Ok(TensorDef {
                    name: t.name.clone(),
                    dtype,
                    shape: Shape::new(t.shape.clone()),
                    quantization: t.quantization,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        let operators = manifest
            .operators
            .iter()
            .map(|op| -> Result<OperatorDescriptor, ModelError> {
                let kind =
                    OpKind::from_str_loose(&op.op).ok_or_else(|| ModelError::UnknownOperator {
                        name: op.name.clone(),
                        op: op.op.clone(),
                    })?;
                let inputs = op
                    .inputs
                    .iter()
                    .map(|name| lookup(name, &op.name))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut options = OpOptions::default();
                if let Some(beta) = op.beta {
                    if kind != OpKind::Softmax {
                        tracing::warn!("operator '{}' ({kind}) ignores beta", op.name);
                    }
                    options.beta = beta;
                }
                Ok(OperatorDescriptor {
                    name: op.name.clone(),
                    kind,
                    inputs,
                    output: lookup(&op.output, &op.name)?,
                    options,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        let inputs = manifest
            .inputs
            .iter()
            .map(|name| lookup(name, "graph inputs"))
            .collect::<Result<Vec<_>, _>>()?;
        let outputs = manifest
            .outputs
            .iter()
            .map(|name| lookup(name, "graph outputs"))
            .collect::<Result<Vec<_>, _>>()?;

        ModelGraph::new(manifest.name.clone(), tensors, operators, inputs, outputs).validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_core::DType;

    const GATE: &str = r#"{
        "name": "gate",
        "tensors": [
            { "name": "x", "dtype": "int16", "shape": [1, 8],
              "quantization": { "scale": 0.000244140625 } },
            { "name": "h", "dtype": "int16", "shape": [1, 8],
              "quantization": { "scale": 0.000030517578125 } },
            { "name": "y", "dtype": "int16", "shape": [1, 8],
              "quantization": { "scale": 0.000030517578125 } }
        ],
        "operators": [
            { "name": "cell", "op": "TANH", "inputs": ["x"], "output": "h" },
            { "name": "gate", "op": "LOGISTIC", "inputs": ["h"], "output": "y" }
        ],
        "inputs": ["x"],
        "outputs": ["y"]
    }"#;

    #[test]
    fn test_from_json() {
        let g = ModelLoader::from_json(GATE).unwrap();
        assert_eq!(g.name, "gate");
        assert_eq!(g.num_operators(), 2);
        assert_eq!(g.inputs, vec![0]);
        assert_eq!(g.outputs, vec![2]);
        let op = g.operator(1).unwrap();
        assert_eq!(op.kind, OpKind::Logistic);
        assert_eq!(op.inputs, vec![1]);
        assert_eq!(g.tensor(0).unwrap().dtype, DType::I16);
        assert_eq!(g.tensor(0).unwrap().quantization.unwrap().zero_point, 0);
    }

    #[test]
    fn test_from_slice_matches_from_json() {
        let a = ModelLoader::from_json(GATE).unwrap();
        let b = ModelLoader::from_slice(GATE.as_bytes()).unwrap();
        assert_eq!(a.operators, b.operators);
        assert_eq!(a.tensors, b.tensors);
    }

    #[test]
    fn test_beta_carried_to_softmax() {
        let json = r#"{
            "name": "sm",
            "tensors": [
                { "name": "a", "dtype": "f32", "shape": [2, 4] },
                { "name": "b", "dtype": "f32", "shape": [2, 4] }
            ],
            "operators": [
                { "name": "s", "op": "softmax", "inputs": ["a"], "output": "b", "beta": 0.5 }
            ],
            "inputs": ["a"],
            "outputs": ["b"]
        }"#;
        let g = ModelLoader::from_json(json).unwrap();
        assert_eq!(g.operator(0).unwrap().options.beta, 0.5);
    }

    #[test]
    fn test_out_of_order_rejected() {
        let json = GATE.replace(r#""inputs": ["x"], "output": "h""#, r#""inputs": ["y"], "output": "h""#);
        assert!(ModelLoader::from_json(&json).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("model-ir-loader-{}.json", std::process::id()));
        std::fs::write(&path, GATE).unwrap();
        let g = ModelLoader::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(g.num_tensors(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ModelLoader::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ModelError::ManifestReadError(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = ModelLoader::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ModelError::ManifestParseError(_)));
    }
}
