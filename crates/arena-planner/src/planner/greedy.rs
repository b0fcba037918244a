// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Greedy, lifetime-aware planning.
//!
//! Tensors are placed largest first. Each one goes at the lowest offset
//! that does not collide with an already placed tensor whose lifetime
//! overlaps its own. Tensors that are never live at the same step are
//! free to share bytes, so a chain of N operators needs roughly two
//! tensors' worth of arena instead of N + 1.
//!
//! # Memory Model
//!
//! ```text
//! step:      0        1        2
//! t0  [====]
//! t1  [=============]
//! t2           [=============]
//! t3                    [====]
//!
//! t0 and t2 never overlap → same offset; t1 and t3 likewise.
//! ```

use crate::plan::PlanBuilder;
use crate::planner::{live_tensors, MemoryPlanner};
use crate::{ArenaPlan, PlannerError};
use memory_manager::{arena::align_up, ARENA_ALIGN};
use model_ir::{graph::Validated, ModelGraph, TensorLifetime};

/// Largest-first, first-fit placement with lifetime sharing.
#[derive(Debug, Clone, Default)]
pub struct GreedyPlanner;

impl GreedyPlanner {
    pub fn new() -> Self {
        Self
    }
}

impl MemoryPlanner for GreedyPlanner {
    fn name(&self) -> &str {
        "greedy"
    }

    fn plan(&self, graph: &ModelGraph<Validated>) -> Result<ArenaPlan, PlannerError> {
        if graph.num_operators() == 0 {
            return Err(PlannerError::EmptyGraph);
        }

        let mut tensors = live_tensors(graph);
        // Largest first; ties by index keep the plan deterministic.
        tensors.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut builder = PlanBuilder::new(self.name());
        let mut placed: Vec<(usize, usize, TensorLifetime)> = Vec::with_capacity(tensors.len());

        for (idx, size, lifetime) in tensors {
            let offset = first_fit(&placed, align_up(size, ARENA_ALIGN), &lifetime);
            tracing::trace!("greedy: tensor {idx} ({size} bytes) at offset {offset}");
            builder.place(idx, offset, size, lifetime);
            placed.push((offset, align_up(size, ARENA_ALIGN), lifetime));
        }

        let plan = builder.build();
        plan.validate()?;
        Ok(plan)
    }
}

/// Lowest aligned offset where `size` bytes fit between the placed blocks
/// that are live together with `lifetime`.
fn first_fit(placed: &[(usize, usize, TensorLifetime)], size: usize, lifetime: &TensorLifetime) -> usize {
    let mut conflicts: Vec<(usize, usize)> = placed
        .iter()
        .filter(|(_, _, other)| other.overlaps(lifetime))
        .map(|&(offset, len, _)| (offset, offset + len))
        .collect();
    conflicts.sort_unstable();

    let mut candidate = 0;
    for (start, end) in conflicts {
        if candidate + size <= start {
            break;
        }
        candidate = candidate.max(end);
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinearPlanner;
    use model_ir::{OpKind, OperatorDescriptor, TensorDef};
    use proptest::prelude::*;
    use tensor_core::{DType, Shape};

    fn chain(lens: &[usize]) -> ModelGraph<Validated> {
        let tensors = lens
            .iter()
            .enumerate()
            .map(|(i, &len)| TensorDef::new(format!("t{i}"), DType::I8, Shape::vector(len)))
            .collect();
        let n = lens.len() - 1;
        let ops = (0..n)
            .map(|i| OperatorDescriptor::new(format!("op{i}"), OpKind::Reshape, vec![i], i + 1))
            .collect();
        ModelGraph::new("chain".into(), tensors, ops, vec![0], vec![n])
            .validate()
            .unwrap()
    }

    #[test]
    fn test_greedy_reuses_dead_tensors() {
        // Four 64-byte tensors, three ops: only two are live at once.
        let graph = chain(&[64, 64, 64, 64]);
        let plan = GreedyPlanner::new().plan(&graph).unwrap();
        assert_eq!(plan.total_bytes, 128);
        let linear = LinearPlanner::new().plan(&graph).unwrap();
        assert_eq!(linear.total_bytes, 256);
    }

    #[test]
    fn test_greedy_largest_first() {
        let graph = chain(&[16, 256, 16]);
        let plan = GreedyPlanner::new().plan(&graph).unwrap();
        assert_eq!(plan.allocation(1).unwrap().offset, 0);
        assert_eq!(plan.total_bytes, 256 + 16);
    }

    #[test]
    fn test_greedy_fills_gap() {
        let placed = vec![
            (0, 32, TensorLifetime { first_use: 0, last_use: 2 }),
            (64, 32, TensorLifetime { first_use: 0, last_use: 2 }),
        ];
        let lt = TensorLifetime { first_use: 1, last_use: 1 };
        assert_eq!(first_fit(&placed, 32, &lt), 32);
        assert_eq!(first_fit(&placed, 48, &lt), 96);
        let disjoint = TensorLifetime { first_use: 3, last_use: 3 };
        assert_eq!(first_fit(&placed, 48, &disjoint), 0);
    }

    #[test]
    fn test_greedy_name() {
        assert_eq!(GreedyPlanner::new().name(), "greedy");
    }

    proptest! {
        #[test]
        fn greedy_plans_never_overlap(lens in proptest::collection::vec(1usize..300, 2..12)) {
            let graph = chain(&lens);
            let plan = GreedyPlanner::new().plan(&graph).unwrap();
            prop_assert!(plan.validate().is_ok());
            let linear = LinearPlanner::new().plan(&graph).unwrap();
            prop_assert!(plan.total_bytes <= linear.total_bytes);
        }
    }
}
