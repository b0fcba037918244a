// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the arena planner.

/// Errors that can occur during arena planning.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// The model graph has no operators.
    #[error("cannot plan an empty model graph")]
    EmptyGraph,

    /// Two tensors that are live at the same step share bytes.
    #[error("plan '{planner}' overlaps tensors {first} and {second}")]
    Overlap {
        planner: String,
        first: usize,
        second: usize,
    },

    /// The planner produced an inconsistent plan.
    #[error("planner '{planner}' failed: {detail}")]
    PlanFailed { planner: String, detail: String },

    /// An unrecognised planner name.
    #[error("unknown planner '{0}' (expected 'linear' or 'greedy')")]
    UnknownPlanner(String),
}
