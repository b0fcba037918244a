// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Example: Compare arena planners on a chain of int8 activations.
//!
//! The linear planner gives every tensor its own bytes; the greedy planner
//! reuses bytes of tensors that are no longer live. This example binds
//! the same model with both and shrinks the arena until setup refuses.
//!
//! ```bash
//! cargo run -p runtime --example planner_comparison
//! ```

use arena_planner::PlannerKind;
use memory_manager::{ArenaBuffer, MemoryBudget};
use model_ir::{graph::Validated, ModelGraph, OpKind, OperatorDescriptor, TensorDef};
use runtime::{run_iterations, OpRegistry, Profiler, Runner};
use tensor_core::{DType, QuantParams, Shape};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("warn").init();

    let graph = build_graph(12, 256);
    println!("Model: {}\n", graph.summary());

    let budgets = [
        MemoryBudget::from_kb(2),
        MemoryBudget::from_kb(4),
        MemoryBudget::from_kb(8),
    ];

    println!(
        "{:<10} {:>8} {:>12} {:>12} {:>12}",
        "Planner", "Arena", "Tensors B", "Persist. B", "Used B",
    );
    println!("{}", "-".repeat(58));

    for kind in [PlannerKind::Linear, PlannerKind::Greedy] {
        for budget in budgets {
            let mut storage = ArenaBuffer::with_budget(budget);
            let result = Runner::new(graph.clone(), registry()?, storage.arena())
                .with_planner_kind(kind)
                .setup();
            match result {
                Ok(runner) => {
                    let r = runner.setup_report();
                    println!(
                        "{:<10} {:>8} {:>12} {:>12} {:>12}",
                        kind.as_str(),
                        budget.to_string(),
                        r.tensor_bytes,
                        r.persistent_bytes,
                        r.arena_used_bytes,
                    );
                }
                Err(e) => println!("{:<10} {:>8}   FAIL: {e}", kind.as_str(), budget.to_string()),
            }
        }
    }

    println!("\n--- 100 iterations with the greedy planner in 8 KB ---\n");
    let mut storage = ArenaBuffer::with_budget(MemoryBudget::from_kb(8));
    let mut runner = Runner::new(graph, registry()?, storage.arena()).setup()?;
    let mut profiler = Profiler::new();
    let report = run_iterations(&mut runner, &mut profiler, 100, "ChainRunNIterations(100)")?;
    println!("{report}");
    print!("{}", profiler.report_csv());

    Ok(())
}

fn registry() -> Result<OpRegistry, runtime::RegistryError> {
    let mut r = OpRegistry::new(2);
    r.add_tanh()?;
    r.add_logistic()?;
    Ok(r)
}

/// Alternating tanh / logistic ops over `width` int8 elements.
fn build_graph(depth: usize, width: usize) -> ModelGraph<Validated> {
    let tanh_out = QuantParams::new(1.0 / 128.0, 0);
    let logistic_out = QuantParams::new(1.0 / 256.0, -128);

    let mut tensors = vec![TensorDef::new("x", DType::I8, Shape::matrix(1, width))
        .with_quant(QuantParams::new(1.0 / 16.0, 0))];
    let mut operators = Vec::new();
    for i in 0..depth {
        let (kind, quant) = if i % 2 == 0 {
            (OpKind::Tanh, tanh_out)
        } else {
            (OpKind::Logistic, logistic_out)
        };
        tensors.push(
            TensorDef::new(format!("a{i}"), DType::I8, Shape::matrix(1, width)).with_quant(quant),
        );
        operators.push(OperatorDescriptor::new(format!("act{i}"), kind, vec![i], i + 1));
    }

    ModelGraph::new("int8_chain".into(), tensors, operators, vec![0], vec![depth])
        .validate()
        .unwrap()
}
