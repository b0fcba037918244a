// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`MemoryPlanner`] trait and planner implementations.

pub mod greedy;
pub mod linear;

use crate::{ArenaPlan, PlannerError};
use model_ir::{graph::Validated, ModelGraph, TensorLifetime};

/// Trait for arena memory planners.
///
/// Each planner takes a validated model graph and assigns every used
/// tensor an offset in the tensor region. Planners are purely algorithmic
/// (no allocation of arena bytes, no I/O), so the runner can call them as
/// a dry run before touching the arena.
pub trait MemoryPlanner {
    /// Human-readable name of this planner.
    fn name(&self) -> &str;

    /// Produces a tensor layout for the given model.
    fn plan(&self, graph: &ModelGraph<Validated>) -> Result<ArenaPlan, PlannerError>;
}

/// Tensors that need arena space, with their size and live span.
pub(crate) fn live_tensors(graph: &ModelGraph<Validated>) -> Vec<(usize, usize, TensorLifetime)> {
    graph
        .tensor_lifetimes()
        .into_iter()
        .enumerate()
        .filter_map(|(idx, lifetime)| {
            let lifetime = lifetime?;
            Some((idx, graph.tensors[idx].size_bytes(), lifetime))
        })
        .collect()
}
