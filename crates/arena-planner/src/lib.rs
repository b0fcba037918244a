// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # arena-planner
//!
//! Assigns every activation tensor of a validated `ModelGraph` an offset
//! in the arena's tensor region, before any arena byte is reserved.
//!
//! # Planners
//!
//! | Planner | Sharing | Tensor region |
//! |---|---|---|
//! | [`LinearPlanner`] | none | sum of all tensors |
//! | [`GreedyPlanner`] | tensors with disjoint lifetimes | close to the peak live set |
//!
//! # Trait-Based Extensibility
//!
//! All planners implement [`MemoryPlanner`], so new ones can be added
//! without modifying the runtime:
//!
//! ```ignore
//! struct MyPlanner;
//! impl MemoryPlanner for MyPlanner {
//!     fn name(&self) -> &str { "mine" }
//!     fn plan(&self, graph: &ModelGraph<Validated>) -> Result<ArenaPlan, PlannerError> { /* ... */ }
//! }
//! ```
//!
//! # Example
//! ```no_run
//! use arena_planner::{GreedyPlanner, MemoryPlanner};
//! use model_ir::ModelLoader;
//! use std::path::Path;
//!
//! let graph = ModelLoader::load(Path::new("./models/kws_head.json")).unwrap();
//! let plan = GreedyPlanner::new().plan(&graph).unwrap();
//! println!("{}", plan.summary());
//! ```

mod error;
pub(crate) mod plan;
pub mod planner;

pub use error::PlannerError;
pub use plan::{ArenaPlan, TensorAllocation};
pub use planner::greedy::GreedyPlanner;
pub use planner::linear::LinearPlanner;
pub use planner::MemoryPlanner;

/// Planner selection, as named in configuration files and on the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannerKind {
    Linear,
    #[default]
    Greedy,
}

impl PlannerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PlannerKind::Linear => "linear",
            PlannerKind::Greedy => "greedy",
        }
    }

    /// Builds the selected planner.
    pub fn build(self) -> Box<dyn MemoryPlanner> {
        match self {
            PlannerKind::Linear => Box::new(LinearPlanner::new()),
            PlannerKind::Greedy => Box::new(GreedyPlanner::new()),
        }
    }
}

impl std::str::FromStr for PlannerKind {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(PlannerKind::Linear),
            "greedy" => Ok(PlannerKind::Greedy),
            _ => Err(PlannerError::UnknownPlanner(s.to_string())),
        }
    }
}

impl std::fmt::Display for PlannerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planner_kind_parse() {
        assert_eq!("GREEDY".parse::<PlannerKind>().unwrap(), PlannerKind::Greedy);
        assert_eq!("linear".parse::<PlannerKind>().unwrap(), PlannerKind::Linear);
        assert!("random".parse::<PlannerKind>().is_err());
    }

    #[test]
    fn test_planner_kind_build() {
        assert_eq!(PlannerKind::Linear.build().name(), "linear");
        assert_eq!(PlannerKind::default().build().name(), "greedy");
    }
}
