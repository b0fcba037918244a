// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `micro-rt run` command: one iteration on seeded inputs.

use memory_manager::ArenaBuffer;
use runtime::{BenchmarkConfig, MonotonicClock, Profiler, Runner};
use tensor_core::{DType, TensorView};

/// Real-valued output elements; quantized tensors are dequantized.
fn real_values(view: &TensorView<'_>) -> anyhow::Result<Vec<f32>> {
    let q = view.quant();
    let deq = |v: i32| q.map(|q| q.dequantize(v)).unwrap_or(v as f32);
    Ok(match view.dtype() {
        DType::F32 => view.as_f32()?.to_vec(),
        DType::I16 => view.as_i16()?.iter().map(|&v| deq(v as i32)).collect(),
        DType::I8 => view.as_i8()?.iter().map(|&v| deq(v as i32)).collect(),
        DType::U8 => view.as_u8()?.iter().map(|&v| deq(v as i32)).collect(),
        DType::I32 => bytemuck::try_cast_slice::<u8, i32>(view.as_bytes())
            .map_err(|e| anyhow::anyhow!("int32 output is not viewable: {e:?}"))?
            .iter()
            .map(|&v| deq(v))
            .collect(),
    })
}

pub fn execute(config: &BenchmarkConfig, seed: u64, json: bool) -> anyhow::Result<()> {
    let graph = crate::models::resolve(&config.model)?;
    let registry = crate::models::registry_for(&graph, config.registry_capacity)?;
    let mut storage = ArenaBuffer::with_budget(config.parse_arena_size()?);
    let mut runner = Runner::new(graph, registry, storage.arena())
        .with_planner_kind(config.planner)
        .setup()?;

    let mut profiler = Profiler::with_clock(MonotonicClock::with_rate(config.ticks_per_second));
    runner.set_random_input(seed)?;
    runner.run_single_iteration(&mut profiler)?;

    let mut outputs = Vec::new();
    for (i, &tensor) in runner.graph().outputs.iter().enumerate() {
        let view = runner.output(i)?;
        outputs.push((runner.graph().tensors[tensor].name.clone(), real_values(&view)?));
    }

    if json {
        let map: serde_json::Map<String, serde_json::Value> = outputs
            .into_iter()
            .map(|(name, values)| (name, serde_json::json!(values)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    println!("  {} (seed {seed})", runner.graph().summary());
    for (name, values) in &outputs {
        let shown: Vec<String> = values.iter().take(8).map(|v| format!("{v:.4}")).collect();
        let more = if values.len() > 8 { ", ..." } else { "" };
        println!("   {name}: [{}{more}]", shown.join(", "));
    }
    println!();
    print!("{}", profiler.report());
    Ok(())
}
