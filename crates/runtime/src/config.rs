// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmark configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! model = "lstm_gate_int16"
//! arena_size = "21K"
//! planner = "greedy"
//! iterations = 10
//! registry_capacity = 4
//! ticks_per_second = 1000000
//! log_per_op = true
//! ```
//!
//! Every key is optional; missing keys take the [`Default`] values.

use crate::RuntimeError;
use arena_planner::PlannerKind;
use memory_manager::MemoryBudget;
use std::path::Path;

/// Settings for one benchmark session.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Built-in model name, or a path to a JSON manifest.
    pub model: String,
    /// Arena size (human-readable, e.g., `"21K"`).
    pub arena_size: String,
    /// Tensor placement strategy.
    pub planner: PlannerKind,
    /// Iterations for the long benchmark run.
    pub iterations: u32,
    /// Kernel slots in the operator registry.
    pub registry_capacity: usize,
    /// Tick rate of the profiler clock.
    pub ticks_per_second: u64,
    /// Whether to print every per-op event after the run.
    pub log_per_op: bool,
}

impl BenchmarkConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, RuntimeError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| RuntimeError::ConfigError(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, RuntimeError> {
        toml::to_string_pretty(self)
            .map_err(|e| RuntimeError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Parses the arena size string into a [`MemoryBudget`].
    pub fn parse_arena_size(&self) -> Result<MemoryBudget, RuntimeError> {
        MemoryBudget::parse(&self.arena_size)
            .map_err(|e| RuntimeError::ConfigError(format!("invalid arena size: {e}")))
    }

    /// Checks values that TOML types alone cannot rule out.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        self.parse_arena_size()?;
        if self.ticks_per_second == 0 {
            return Err(RuntimeError::ConfigError(
                "ticks_per_second must be positive".into(),
            ));
        }
        if self.registry_capacity == 0 {
            return Err(RuntimeError::ConfigError(
                "registry_capacity must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            model: "lstm_gate_int16".to_string(),
            arena_size: "21K".to_string(),
            planner: PlannerKind::Greedy,
            iterations: 10,
            registry_capacity: 4,
            ticks_per_second: crate::profiler::DEFAULT_TICKS_PER_SECOND,
            log_per_op: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = BenchmarkConfig::default();
        assert_eq!(c.arena_size, "21K");
        assert_eq!(c.planner, PlannerKind::Greedy);
        assert_eq!(c.parse_arena_size().unwrap().as_bytes(), 21 * 1024);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
model = "models/custom.json"
arena_size = "64K"
planner = "linear"
iterations = 250
log_per_op = false
"#;
        let c = BenchmarkConfig::from_toml(toml).unwrap();
        assert_eq!(c.model, "models/custom.json");
        assert_eq!(c.parse_arena_size().unwrap().as_bytes(), 64 * 1024);
        assert_eq!(c.planner, PlannerKind::Linear);
        assert_eq!(c.iterations, 250);
        assert!(!c.log_per_op);
        // Unset keys keep their defaults.
        assert_eq!(c.registry_capacity, 4);
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = BenchmarkConfig {
            planner: PlannerKind::Linear,
            ..Default::default()
        };
        let back = BenchmarkConfig::from_toml(&c.to_toml().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(BenchmarkConfig::from_toml("arena_size = \"lots\"").is_err());
        assert!(BenchmarkConfig::from_toml("planner = \"random\"").is_err());
        assert!(BenchmarkConfig::from_toml("ticks_per_second = 0").is_err());
        assert!(BenchmarkConfig::from_toml("registry_capacity = 0").is_err());
    }

    #[test]
    fn test_from_missing_file() {
        let err = BenchmarkConfig::from_file(Path::new("/nonexistent/bench.toml")).unwrap_err();
        assert!(matches!(err, RuntimeError::ConfigError(_)));
    }
}
