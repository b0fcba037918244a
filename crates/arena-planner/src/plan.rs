// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Arena plan: the output of a memory planner.
//!
//! A plan assigns every used tensor a byte offset inside the tensor region
//! of the arena. Tensors whose lifetimes never overlap may share bytes.
//! The plan is the contract between the planner and the runner: the
//! runner reserves `total_bytes` of tensor region and slices each tensor
//! out of it at its planned offset.

use crate::PlannerError;
use memory_manager::{ArenaRegion, ARENA_ALIGN};
use model_ir::TensorLifetime;

/// Where one tensor lives in the tensor region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TensorAllocation {
    /// Index into the graph's tensor table.
    pub tensor_index: usize,
    /// Offset from the start of the tensor region, a multiple of
    /// [`ARENA_ALIGN`].
    pub offset: usize,
    /// Unpadded tensor size.
    pub size_bytes: usize,
    pub first_use: usize,
    pub last_use: usize,
}

impl TensorAllocation {
    pub fn end(&self) -> usize {
        self.offset + self.size_bytes
    }

    pub fn lifetime(&self) -> TensorLifetime {
        TensorLifetime {
            first_use: self.first_use,
            last_use: self.last_use,
        }
    }

    /// The allocation as a region relative to the tensor region start.
    pub fn region(&self) -> ArenaRegion {
        ArenaRegion::new(self.offset, self.size_bytes)
    }

    /// True if both tensors are live together and share at least one byte.
    pub fn conflicts_with(&self, other: &TensorAllocation) -> bool {
        self.lifetime().overlaps(&other.lifetime()) && self.region().overlaps(&other.region())
    }
}

/// The complete tensor layout produced by a [`crate::MemoryPlanner`].
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ArenaPlan {
    /// Planner name that produced this plan.
    pub planner_name: String,
    /// One entry per used tensor, in tensor-index order.
    pub allocations: Vec<TensorAllocation>,
    /// Size of the tensor region the plan needs, padded to [`ARENA_ALIGN`].
    pub total_bytes: usize,
}

impl ArenaPlan {
    pub fn num_allocations(&self) -> usize {
        self.allocations.len()
    }

    /// The allocation of a tensor, if the plan placed it.
    pub fn allocation(&self, tensor_index: usize) -> Option<&TensorAllocation> {
        self.allocations
            .iter()
            .find(|a| a.tensor_index == tensor_index)
    }

    /// Sum of tensor sizes, as if nothing were shared.
    pub fn unshared_bytes(&self) -> usize {
        self.allocations.iter().map(|a| a.size_bytes).sum()
    }

    /// Validates the plan.
    ///
    /// Checks:
    /// - Every offset is a multiple of [`ARENA_ALIGN`].
    /// - Every allocation fits in `total_bytes`.
    /// - No two allocations that are live at the same step share bytes.
    /// - No tensor is placed twice.
    pub fn validate(&self) -> Result<(), PlannerError> {
        let fail = |detail: String| PlannerError::PlanFailed {
            planner: self.planner_name.clone(),
            detail,
        };

        if self.total_bytes % ARENA_ALIGN != 0 {
            return Err(fail(format!(
                "total {} is not a multiple of {ARENA_ALIGN}",
                self.total_bytes
            )));
        }

        for (i, a) in self.allocations.iter().enumerate() {
            if a.offset % ARENA_ALIGN != 0 {
                return Err(fail(format!(
                    "tensor {} at offset {} is misaligned",
                    a.tensor_index, a.offset
                )));
            }
            if a.end() > self.total_bytes {
                return Err(fail(format!(
                    "tensor {} ends at {} past total {}",
                    a.tensor_index,
                    a.end(),
                    self.total_bytes
                )));
            }
            for b in &self.allocations[i + 1..] {
                if a.tensor_index == b.tensor_index {
                    return Err(fail(format!("tensor {} placed twice", a.tensor_index)));
                }
                if a.conflicts_with(b) {
                    return Err(PlannerError::Overlap {
                        planner: self.planner_name.clone(),
                        first: a.tensor_index,
                        second: b.tensor_index,
                    });
                }
            }
        }

        Ok(())
    }

    /// Returns a human-readable summary of the plan.
    pub fn summary(&self) -> String {
        let unshared = self.unshared_bytes();
        let saved = if unshared > 0 {
            100.0 * (1.0 - self.total_bytes as f64 / unshared as f64)
        } else {
            0.0
        };
        format!(
            "Plan '{}': {} tensors in {} bytes ({} bytes unshared, {:.0}% saved)",
            self.planner_name,
            self.num_allocations(),
            self.total_bytes,
            unshared,
            saved.max(0.0),
        )
    }
}

/// Builder helper for constructing an `ArenaPlan` incrementally.
///
/// Used internally by planner implementations.
pub(crate) struct PlanBuilder {
    planner_name: String,
    allocations: Vec<TensorAllocation>,
    total_bytes: usize,
}

impl PlanBuilder {
    pub fn new(planner_name: &str) -> Self {
        Self {
            planner_name: planner_name.to_string(),
            allocations: Vec::new(),
            total_bytes: 0,
        }
    }

    /// Places a tensor at `offset`, growing the total as needed.
    pub fn place(
        &mut self,
        tensor_index: usize,
        offset: usize,
        size_bytes: usize,
        lifetime: TensorLifetime,
    ) {
        let end = memory_manager::arena::align_up(offset + size_bytes, ARENA_ALIGN);
        self.total_bytes = self.total_bytes.max(end);
        self.allocations.push(TensorAllocation {
            tensor_index,
            offset,
            size_bytes,
            first_use: lifetime.first_use,
            last_use: lifetime.last_use,
        });
    }

    /// Consumes the builder and returns the finished plan.
    pub fn build(mut self) -> ArenaPlan {
        self.allocations.sort_by_key(|a| a.tensor_index);
        ArenaPlan {
            planner_name: self.planner_name,
            allocations: self.allocations,
            total_bytes: self.total_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lt(first_use: usize, last_use: usize) -> TensorLifetime {
        TensorLifetime { first_use, last_use }
    }

    fn sample_plan() -> ArenaPlan {
        let mut b = PlanBuilder::new("test");
        b.place(0, 0, 40, lt(0, 0));
        b.place(1, 48, 40, lt(0, 1));
        b.place(2, 0, 40, lt(1, 1));
        b.build()
    }

    #[test]
    fn test_validate_ok() {
        let plan = sample_plan();
        plan.validate().unwrap();
        assert_eq!(plan.total_bytes, 96);
        assert_eq!(plan.num_allocations(), 3);
        assert_eq!(plan.unshared_bytes(), 120);
    }

    #[test]
    fn test_allocation_lookup() {
        let plan = sample_plan();
        assert_eq!(plan.allocation(1).unwrap().offset, 48);
        assert!(plan.allocation(7).is_none());
    }

    #[test]
    fn test_validate_overlap() {
        let mut b = PlanBuilder::new("bad");
        b.place(0, 0, 40, lt(0, 1));
        b.place(1, 32, 40, lt(1, 2));
        let err = b.build().validate().unwrap_err();
        assert!(matches!(err, PlannerError::Overlap { first: 0, second: 1, .. }));
    }

    #[test]
    fn test_validate_misaligned() {
        let plan = ArenaPlan {
            planner_name: "odd".into(),
            allocations: vec![TensorAllocation {
                tensor_index: 0,
                offset: 4,
                size_bytes: 8,
                first_use: 0,
                last_use: 0,
            }],
            total_bytes: 16,
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_validate_past_total() {
        let plan = ArenaPlan {
            planner_name: "short".into(),
            allocations: vec![TensorAllocation {
                tensor_index: 0,
                offset: 0,
                size_bytes: 64,
                first_use: 0,
                last_use: 0,
            }],
            total_bytes: 32,
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_summary() {
        let s = sample_plan().summary();
        assert!(s.contains("test"));
        assert!(s.contains("3 tensors"));
        assert!(s.contains("96 bytes"));
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&sample_plan()).unwrap();
        assert!(json.contains("\"planner_name\":\"test\""));
    }
}
