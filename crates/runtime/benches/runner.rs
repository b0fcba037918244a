// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for runner setup and whole-graph iterations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use memory_manager::ArenaBuffer;
use model_ir::ModelLoader;
use runtime::{OpRegistry, Profiler, Runner};

const MODELS: [(&str, &str); 3] = [
    ("lstm_gate_int16", include_str!("../../../models/lstm_gate_int16.json")),
    ("kws_head", include_str!("../../../models/kws_head.json")),
    ("activations_f32", include_str!("../../../models/activations_f32.json")),
];

fn bench_setup(c: &mut Criterion) {
    let mut group = c.benchmark_group("setup");
    for (name, json) in MODELS {
        let graph = ModelLoader::from_json(json).unwrap();
        let mut storage = ArenaBuffer::new(21 * 1024);
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| {
                let runner = Runner::new(graph.clone(), OpRegistry::with_builtins(), storage.arena())
                    .setup()
                    .unwrap();
                black_box(runner.setup_report());
            })
        });
    }
    group.finish();
}

fn bench_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("iteration");
    for (name, json) in MODELS {
        let graph = ModelLoader::from_json(json).unwrap();
        let mut storage = ArenaBuffer::new(21 * 1024);
        let mut runner = Runner::new(graph, OpRegistry::with_builtins(), storage.arena())
            .setup()
            .unwrap();
        runner.set_random_input(0).unwrap();
        let mut profiler = Profiler::new();
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| {
                profiler.clear_events();
                runner.run_single_iteration(&mut profiler).unwrap();
                black_box(profiler.total_ticks());
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_setup, bench_iteration);
criterion_main!(benches);
