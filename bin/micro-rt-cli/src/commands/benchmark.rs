// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `micro-rt benchmark` command: time runner setup and repeated iterations.
//!
//! Follows the usual micro benchmark shape: one profiled initialization
//! event, a single-iteration run, an N-iteration run, then the per-op
//! events of the last iteration.

use memory_manager::ArenaBuffer;
use runtime::{run_iterations, BenchmarkConfig, MonotonicClock, Profiler, Runner};

pub fn execute(config: &BenchmarkConfig, csv: bool) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            micro-rt · Benchmark Runner              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let budget = config.parse_arena_size()?;
    println!("  Model:   {}", config.model);
    println!("  Arena:   {budget}");
    println!("  Planner: {}", config.planner);
    println!();

    let mut profiler = Profiler::with_clock(MonotonicClock::with_rate(config.ticks_per_second));
    let mut storage = ArenaBuffer::with_budget(budget);

    // ── Initialization ─────────────────────────────────────────
    let init = profiler.begin_event("InitializeRunner");
    let graph = crate::models::resolve(&config.model)?;
    let registry = crate::models::registry_for(&graph, config.registry_capacity)?;
    let name = graph.name.clone();
    let mut runner = Runner::new(graph, registry, storage.arena())
        .with_planner_kind(config.planner)
        .setup()?;
    profiler.end_event(init);
    print!("{}", indent(&profiler.report()));
    println!();

    // ── Runs ───────────────────────────────────────────────────
    let tag = to_camel(&name);
    let once = run_iterations(&mut runner, &mut profiler, 1, &format!("{tag}RunNIterations(1)"))?;
    println!("  {once}");

    let many = run_iterations(
        &mut runner,
        &mut profiler,
        config.iterations,
        &format!("{tag}RunNIterations({})", config.iterations),
    )?;
    println!("  {many}");
    println!("  average: {} ticks per iteration", many.average_ticks());
    println!();

    if config.log_per_op {
        profiler.log();
        print!("{}", indent(&profiler.report()));
        println!();
    }
    if csv {
        print!("{}", profiler.report_csv());
        println!();
    }

    println!("  {}", runner.setup_report());
    println!("  {}", runner.arena_stats().summary());
    println!();
    Ok(())
}

fn indent(text: &str) -> String {
    text.lines().map(|l| format!("  {l}\n")).collect()
}

/// `lstm_gate_int16` → `LstmGateInt16`.
fn to_camel(name: &str) -> String {
    name.split(|c: char| c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_camel() {
        assert_eq!(to_camel("lstm_gate_int16"), "LstmGateInt16");
        assert_eq!(to_camel("kws-head"), "KwsHead");
        assert_eq!(to_camel("__x"), "X");
    }

    #[test]
    fn test_benchmark_builtin() {
        let config = BenchmarkConfig {
            model: "kws_head".into(),
            iterations: 3,
            ..Default::default()
        };
        execute(&config, true).unwrap();
    }
}
