// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `micro-rt inspect` command: display model structure and arena needs.
//!
//! Prints the tensor table, the operator list, and the layout each planner
//! produces, then tries a real setup in the configured arena size.

use arena_planner::PlannerKind;
use memory_manager::ArenaBuffer;
use runtime::{BenchmarkConfig, Runner, RuntimeError};

pub fn execute(config: &BenchmarkConfig) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║             micro-rt · Model Inspector              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let graph = crate::models::resolve(&config.model)?;
    println!("  {}", graph.summary());
    println!();

    // ── Tensors ────────────────────────────────────────────────
    let lifetimes = graph.tensor_lifetimes();
    println!(
        "  {:<4} {:<20} {:<6} {:<14} {:>8} {:>10}  {}",
        "Idx", "Name", "DType", "Shape", "Bytes", "Live", "Quantization",
    );
    println!("  {}", "-".repeat(86));
    for (idx, tensor) in graph.tensors.iter().enumerate() {
        let live = match lifetimes[idx] {
            Some(l) => format!("{}..={}", l.first_use, l.last_use),
            None => "unused".into(),
        };
        let quant = match tensor.quantization {
            Some(q) => format!("scale {:e}, zp {}", q.scale, q.zero_point),
            None => "-".into(),
        };
        println!(
            "  {:<4} {:<20} {:<6} {:<14} {:>8} {:>10}  {}",
            idx,
            truncate(&tensor.name, 20),
            tensor.dtype.as_str(),
            tensor.shape.to_string(),
            tensor.size_bytes(),
            live,
            quant,
        );
    }
    println!();

    // ── Operators ──────────────────────────────────────────────
    for (idx, op) in graph.iter_operators().enumerate() {
        println!("  #{idx:<3} {}", op.summary());
    }
    println!();

    // ── Plans ──────────────────────────────────────────────────
    for kind in [PlannerKind::Linear, PlannerKind::Greedy] {
        let plan = kind.build().plan(&graph)?;
        println!("  {}", plan.summary());
    }
    println!();

    // ── Setup in the configured arena ──────────────────────────
    let budget = config.parse_arena_size()?;
    let registry = crate::models::registry_for(&graph, config.registry_capacity)?;
    let mut storage = ArenaBuffer::with_budget(budget);
    match Runner::new(graph, registry, storage.arena())
        .with_planner_kind(config.planner)
        .setup()
    {
        Ok(runner) => println!("  Fits in {budget}: {}", runner.setup_report()),
        Err(RuntimeError::ArenaTooSmall {
            required_bytes,
            available_bytes,
        }) => println!(
            "  Does not fit in {budget}: needs {required_bytes} B, {available_bytes} B available"
        ),
        Err(e) => return Err(e.into()),
    }
    println!();
    Ok(())
}

/// Truncates a string to `max_len` with ellipsis if needed.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 20), "short");
        assert_eq!(truncate("a_really_long_tensor_name", 10), "a_reall...");
    }

    #[test]
    fn test_inspect_tiny_arena_is_not_an_error() {
        let config = BenchmarkConfig {
            model: "lstm_gate_int16".into(),
            arena_size: "256".into(),
            ..Default::default()
        };
        execute(&config).unwrap();
    }
}
