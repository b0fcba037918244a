// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Linear planning.
//!
//! The simplest planner: every tensor gets its own slot, laid out one
//! after another in tensor-index order. Nothing is shared, so the plan is
//! trivially correct and the arena needs the sum of all tensor sizes.
//!
//! # When to use
//! - Debugging: every tensor keeps its value after the iteration.
//! - Baseline for measuring how much [`crate::GreedyPlanner`] saves.

use crate::plan::PlanBuilder;
use crate::planner::{live_tensors, MemoryPlanner};
use crate::{ArenaPlan, PlannerError};
use memory_manager::{arena::align_up, ARENA_ALIGN};
use model_ir::{graph::Validated, ModelGraph};

/// One slot per tensor, no sharing.
#[derive(Debug, Clone, Default)]
pub struct LinearPlanner;

impl LinearPlanner {
    pub fn new() -> Self {
        Self
    }
}

impl MemoryPlanner for LinearPlanner {
    fn name(&self) -> &str {
        "linear"
    }

    fn plan(&self, graph: &ModelGraph<Validated>) -> Result<ArenaPlan, PlannerError> {
        if graph.num_operators() == 0 {
            return Err(PlannerError::EmptyGraph);
        }

        let mut builder = PlanBuilder::new(self.name());
        let mut offset = 0;
        for (idx, size, lifetime) in live_tensors(graph) {
            builder.place(idx, offset, size, lifetime);
            offset += align_up(size, ARENA_ALIGN);
        }

        let plan = builder.build();
        plan.validate()?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_ir::{OpKind, OperatorDescriptor, TensorDef};
    use tensor_core::{DType, Shape};

    /// A chain of `n` tanh ops over f32 vectors of `len` elements.
    fn chain(n: usize, len: usize) -> ModelGraph<Validated> {
        let tensors = (0..=n)
            .map(|i| TensorDef::new(format!("t{i}"), DType::F32, Shape::vector(len)))
            .collect();
        let ops = (0..n)
            .map(|i| OperatorDescriptor::new(format!("op{i}"), OpKind::Tanh, vec![i], i + 1))
            .collect();
        ModelGraph::new("chain".into(), tensors, ops, vec![0], vec![n])
            .validate()
            .unwrap()
    }

    #[test]
    fn test_linear_places_every_tensor() {
        let plan = LinearPlanner::new().plan(&chain(3, 10)).unwrap();
        assert_eq!(plan.num_allocations(), 4);
        // 40 bytes padded to 48 per tensor.
        assert_eq!(plan.total_bytes, 4 * 48);
        let offsets: Vec<_> = plan.allocations.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 48, 96, 144]);
    }

    #[test]
    fn test_linear_matches_unshared() {
        let plan = LinearPlanner::new().plan(&chain(5, 16)).unwrap();
        assert_eq!(plan.total_bytes, plan.unshared_bytes());
        plan.validate().unwrap();
    }

    #[test]
    fn test_linear_name() {
        assert_eq!(LinearPlanner::new().name(), "linear");
    }
}
