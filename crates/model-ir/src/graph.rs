// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model graph: a fixed, linearly ordered list of operators over a tensor
//! table.
//!
//! # Type-State Pattern
//!
//! The graph transitions through states enforced at compile time:
//!
//! ```text
//! ModelGraph<Loaded>    : tensors and operators parsed, not yet checked.
//!       │  .validate()
//!       ▼
//! ModelGraph<Validated> : indices, order and shapes verified, ready to bind.
//! ```
//!
//! The arena planner and the runner only accept `ModelGraph<Validated>`, so
//! they never see an operator that reads a tensor nobody has written yet.

use crate::{ModelError, OperatorDescriptor, TensorDef};
use std::fmt;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: graph has been loaded but not validated.
#[derive(Debug, Clone)]
pub struct Loaded;

/// Marker: graph has been validated and can be bound to a runner.
#[derive(Debug, Clone)]
pub struct Validated;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Loaded {}
    impl Sealed for super::Validated {}
}

/// Sealed trait for graph states.
pub trait GraphState: sealed::Sealed + fmt::Debug + Clone {}
impl GraphState for Loaded {}
impl GraphState for Validated {}

// ── Lifetimes ──────────────────────────────────────────────────────

/// The span of operator steps (inclusive) during which a tensor's bytes
/// must stay intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorLifetime {
    pub first_use: usize,
    pub last_use: usize,
}

impl TensorLifetime {
    /// True if both tensors are live at some common step.
    pub fn overlaps(&self, other: &TensorLifetime) -> bool {
        self.first_use <= other.last_use && other.first_use <= self.last_use
    }
}

// ── ModelGraph ─────────────────────────────────────────────────────

/// A model as a tensor table plus operators in execution order.
#[derive(Debug, Clone)]
pub struct ModelGraph<S: GraphState = Loaded> {
    /// Human-readable model name (e.g., `"lstm_gate_int16"`).
    pub name: String,
    pub tensors: Vec<TensorDef>,
    /// Operators in the order they execute.
    pub operators: Vec<OperatorDescriptor>,
    /// Tensor indices filled by the caller before each iteration.
    pub inputs: Vec<usize>,
    /// Tensor indices read back after each iteration.
    pub outputs: Vec<usize>,
    _state: std::marker::PhantomData<S>,
}

// ── Loaded state ───────────────────────────────────────────────────

impl ModelGraph<Loaded> {
    /// Creates a new graph in the `Loaded` state.
    pub fn new(
        name: String,
        tensors: Vec<TensorDef>,
        operators: Vec<OperatorDescriptor>,
        inputs: Vec<usize>,
        outputs: Vec<usize>,
    ) -> Self {
        Self {
            name,
            tensors,
            operators,
            inputs,
            outputs,
            _state: std::marker::PhantomData,
        }
    }

    /// Validates the graph and transitions to the `Validated` state.
    ///
    /// # Checks
    /// - At least one operator, one graph input and one graph output.
    /// - Every tensor index is in range and no tensor has a zero dimension.
    /// - Quantization scales are positive and zero points fit the dtype.
    /// - Operators are topologically ordered: each input is either a graph
    ///   input or the output of an earlier operator.
    /// - Each tensor is written by at most one operator, and never a graph
    ///   input.
    /// - Every graph output is produced by some operator (or is an input).
    pub fn validate(self) -> Result<ModelGraph<Validated>, ModelError> {
        if self.operators.is_empty() {
            return Err(ModelError::InvalidGraph(
                "model graph contains no operators".into(),
            ));
        }
        if self.inputs.is_empty() || self.outputs.is_empty() {
            return Err(ModelError::InvalidGraph(
                "model graph needs at least one input and one output".into(),
            ));
        }

        for tensor in &self.tensors {
            if tensor.shape.has_zero_dim() {
                return Err(ModelError::InvalidTensor {
                    tensor: tensor.name.clone(),
                    detail: format!("shape {} has a zero dimension", tensor.shape),
                });
            }
            if let Some(q) = tensor.quantization {
                q.check("model", tensor.dtype)
                    .map_err(|e| ModelError::InvalidTensor {
                        tensor: tensor.name.clone(),
                        detail: e.to_string(),
                    })?;
            }
            if tensor.dtype.is_quantized() && tensor.quantization.is_none() {
                tracing::warn!(
                    "tensor '{}' is {} but carries no quantization parameters",
                    tensor.name,
                    tensor.dtype,
                );
            }
        }

        let n = self.tensors.len();
        let check_index = |idx: usize, referenced_by: &str| {
            if idx >= n {
                Err(ModelError::UnknownTensor {
                    referenced_by: referenced_by.to_string(),
                    tensor: format!("#{idx}"),
                })
            } else {
                Ok(())
            }
        };

        // available[t]: tensor t holds valid data at the current step.
        let mut available = vec![false; n];
        for &idx in &self.inputs {
            check_index(idx, "graph inputs")?;
            if available[idx] {
                return Err(ModelError::InvalidGraph(format!(
                    "tensor '{}' listed twice as a graph input",
                    self.tensors[idx].name
                )));
            }
            available[idx] = true;
        }
        for &idx in &self.outputs {
            check_index(idx, "graph outputs")?;
        }

        for op in &self.operators {
            if op.inputs.is_empty() {
                return Err(ModelError::InvalidOperator {
                    op: op.name.clone(),
                    detail: "operator has no inputs".into(),
                });
            }
            for &idx in &op.inputs {
                check_index(idx, &op.name)?;
                if !available[idx] {
                    return Err(ModelError::InvalidOperator {
                        op: op.name.clone(),
                        detail: format!(
                            "reads tensor '{}' before it is produced",
                            self.tensors[idx].name
                        ),
                    });
                }
            }
            check_index(op.output, &op.name)?;
            if available[op.output] {
                return Err(ModelError::InvalidOperator {
                    op: op.name.clone(),
                    detail: format!(
                        "output tensor '{}' is already written elsewhere",
                        self.tensors[op.output].name
                    ),
                });
            }
            available[op.output] = true;
        }

        for &idx in &self.outputs {
            if !available[idx] {
                return Err(ModelError::InvalidGraph(format!(
                    "graph output '{}' is never produced",
                    self.tensors[idx].name
                )));
            }
        }

        let graph = ModelGraph {
            name: self.name,
            tensors: self.tensors,
            operators: self.operators,
            inputs: self.inputs,
            outputs: self.outputs,
            _state: std::marker::PhantomData,
        };

        for (idx, lifetime) in graph.tensor_lifetimes().iter().enumerate() {
            if lifetime.is_none() {
                tracing::warn!("tensor '{}' is never used", graph.tensors[idx].name);
            }
        }

        Ok(graph)
    }
}

// ── Validated state ────────────────────────────────────────────────

impl ModelGraph<Validated> {
    pub fn num_operators(&self) -> usize {
        self.operators.len()
    }

    pub fn num_tensors(&self) -> usize {
        self.tensors.len()
    }

    /// Returns an iterator over the operators in execution order.
    pub fn iter_operators(&self) -> impl Iterator<Item = &OperatorDescriptor> {
        self.operators.iter()
    }

    pub fn operator(&self, index: usize) -> Option<&OperatorDescriptor> {
        self.operators.get(index)
    }

    pub fn tensor(&self, index: usize) -> Option<&TensorDef> {
        self.tensors.get(index)
    }

    /// Sum of every tensor's byte size, as if nothing shared memory.
    pub fn total_tensor_bytes(&self) -> usize {
        self.tensors.iter().map(TensorDef::size_bytes).sum()
    }

    /// Per-tensor live span over operator steps.
    ///
    /// Graph inputs are live from step 0 and graph outputs until the last
    /// step, since the caller writes and reads them outside the iteration.
    /// Tensors nobody touches get `None`.
    pub fn tensor_lifetimes(&self) -> Vec<Option<TensorLifetime>> {
        let last_step = self.operators.len().saturating_sub(1);
        let mut lifetimes: Vec<Option<TensorLifetime>> = vec![None; self.tensors.len()];

        let mut touch = |idx: usize, step: usize| {
            let entry = lifetimes[idx].get_or_insert(TensorLifetime {
                first_use: step,
                last_use: step,
            });
            entry.first_use = entry.first_use.min(step);
            entry.last_use = entry.last_use.max(step);
        };

        for &idx in &self.inputs {
            touch(idx, 0);
        }
        for (step, op) in self.operators.iter().enumerate() {
            for &idx in &op.inputs {
                touch(idx, step);
            }
            touch(op.output, step);
        }
        for &idx in &self.outputs {
            touch(idx, last_step);
        }
        lifetimes
    }

    /// Returns a summary string describing the model.
    pub fn summary(&self) -> String {
        format!(
            "Model '{}': {} operators, {} tensors ({} inputs, {} outputs), {:.1} KB of tensors",
            self.name,
            self.num_operators(),
            self.num_tensors(),
            self.inputs.len(),
            self.outputs.len(),
            self.total_tensor_bytes() as f64 / 1024.0,
        )
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: GraphState> fmt::Display for ModelGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ModelGraph '{}' ({} operators):",
            self.name,
            self.operators.len()
        )?;
        for op in &self.operators {
            writeln!(f, "  {}", op.summary())?;
        }
        Ok(())
    }
}
