// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Models compiled into the binary, and registry construction per model.

use model_ir::{graph::Validated, ModelGraph, ModelLoader, ModelManifest, OpKind};
use runtime::{OpRegistry, RegistryError};
use std::path::Path;

/// A manifest embedded at build time.
pub struct BuiltinModel {
    pub name: &'static str,
    pub manifest: &'static [u8],
}

pub const BUILTIN_MODELS: &[BuiltinModel] = &[
    BuiltinModel {
        name: "lstm_gate_int16",
        manifest: include_bytes!("../../../models/lstm_gate_int16.json"),
    },
    BuiltinModel {
        name: "kws_head",
        manifest: include_bytes!("../../../models/kws_head.json"),
    },
    BuiltinModel {
        name: "tanh_uint8",
        manifest: include_bytes!("../../../models/tanh_uint8.json"),
    },
    BuiltinModel {
        name: "activations_f32",
        manifest: include_bytes!("../../../models/activations_f32.json"),
    },
];

pub fn find_builtin(name: &str) -> Option<&'static BuiltinModel> {
    BUILTIN_MODELS.iter().find(|m| m.name == name)
}

/// Loads a built-in model by name, or else a manifest from disk.
pub fn resolve(model: &str) -> anyhow::Result<ModelGraph<Validated>> {
    if let Some(builtin) = find_builtin(model) {
        tracing::debug!("using built-in model '{}'", builtin.name);
        return Ok(ModelLoader::from_slice(builtin.manifest)?);
    }
    ModelLoader::load(Path::new(model)).map_err(|e| {
        anyhow::anyhow!("'{model}' is neither a built-in model nor a loadable manifest: {e}")
    })
}

/// Description line of a built-in manifest, empty if it has none.
pub fn describe(builtin: &BuiltinModel) -> anyhow::Result<String> {
    Ok(ModelManifest::from_slice(builtin.manifest)?.description)
}

/// Registers a kernel for every distinct operator kind the graph uses.
///
/// Kinds without a built-in kernel are skipped so that setup can name the
/// offending operator.
pub fn registry_for(
    graph: &ModelGraph<Validated>,
    capacity: usize,
) -> Result<OpRegistry, RegistryError> {
    let mut registry = OpRegistry::new(capacity);
    for op in graph.iter_operators() {
        if registry.contains(op.kind) {
            continue;
        }
        match op.kind {
            OpKind::Tanh => registry.add_tanh()?,
            OpKind::Logistic => registry.add_logistic()?,
            OpKind::Softmax => registry.add_softmax()?,
            OpKind::Reshape => registry.add_reshape()?,
            other => tracing::warn!("no built-in kernel for {other} ('{}')", op.name),
        }
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_loads() {
        for model in BUILTIN_MODELS {
            let graph = resolve(model.name).unwrap();
            assert_eq!(graph.name, model.name);
            assert!(!describe(model).unwrap().is_empty());
        }
    }

    #[test]
    fn test_registry_for_lstm() {
        let graph = resolve("lstm_gate_int16").unwrap();
        let registry = registry_for(&graph, 4).unwrap();
        assert_eq!(registry.len(), 3);
        assert!(!registry.contains(OpKind::Softmax));
        assert!(registry_for(&graph, 2).is_err());
    }

    #[test]
    fn test_unknown_model() {
        assert!(resolve("no_such_model").is_err());
    }
}
