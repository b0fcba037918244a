// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the registry and the runner.

use model_ir::OpKind;

/// Errors raised while filling an [`crate::OpRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Every slot is taken.
    #[error("op registry is full ({capacity} slots)")]
    Full { capacity: usize },

    /// A kernel for this operator kind is already registered.
    #[error("a kernel for {kind} is already registered")]
    Duplicate { kind: OpKind },
}

/// Errors that can occur while binding or running a model.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The model uses an operator the registry has no kernel for.
    #[error("operator {op_index} ('{name}') has unregistered kind {kind}")]
    UnsupportedOperator {
        op_index: usize,
        name: String,
        kind: OpKind,
    },

    /// The dry-run sizing pass found the arena too small.
    #[error("arena too small: model needs {required_bytes} bytes, {available_bytes} available")]
    ArenaTooSmall {
        required_bytes: usize,
        available_bytes: usize,
    },

    /// A kernel rejected its tensors or quantization during setup.
    #[error("setup failed for operator {op_index} ({kind}): {source}")]
    KernelSetup {
        op_index: usize,
        kind: OpKind,
        #[source]
        source: tensor_core::TensorError,
    },

    /// A kernel failed while computing; the iteration was aborted.
    #[error("operator {op_index} ({kind}) failed: {source}")]
    Kernel {
        op_index: usize,
        kind: OpKind,
        #[source]
        source: tensor_core::TensorError,
    },

    /// A graph input or output index is out of range.
    #[error("model has no {role} #{index}")]
    NoSuchTensor { role: &'static str, index: usize },

    /// A tensor view over arena bytes could not be formed.
    #[error("tensor error: {0}")]
    TensorError(#[from] tensor_core::TensorError),

    /// Arena reservation or access failed.
    #[error("memory error: {0}")]
    MemoryError(#[from] memory_manager::MemoryError),

    /// The arena planner returned an error.
    #[error("planner error: {0}")]
    PlannerError(#[from] arena_planner::PlannerError),

    /// Model loading failed.
    #[error("model error: {0}")]
    ModelError(#[from] model_ir::ModelError),

    /// Kernel registration failed.
    #[error("registry error: {0}")]
    RegistryError(#[from] RegistryError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
