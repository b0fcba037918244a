// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for the activation and softmax kernels.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tensor_core::{
    activation, prepare_int16, softmax, ActivationKind, ActivationParams, DType, QuantParams,
    QuantizedActivation, Shape, Tensor,
};

const LEN: usize = 1024;

fn bench_activation(c: &mut Criterion) {
    let shape = Shape::vector(LEN);
    let mut group = c.benchmark_group("tanh");

    let values: Vec<f32> = (0..LEN).map(|i| (i as f32 / LEN as f32) * 16.0 - 8.0).collect();
    let input = Tensor::from_f32(shape.clone(), &values).unwrap();
    let mut output = Tensor::zeros(shape.clone(), DType::F32);
    group.bench_function("f32", |b| {
        b.iter(|| {
            activation(
                ActivationKind::Tanh,
                &ActivationParams::Float32,
                &input.view(),
                &mut output.view_mut(),
            )
            .unwrap();
            black_box(output.as_bytes());
        })
    });

    let q16 = QuantParams::symmetric(1.0 / 4096.0);
    let shift = prepare_int16("tanh", Some(q16), Some(QuantParams::symmetric(1.0 / 32768.0))).unwrap();
    let values: Vec<i16> = (0..LEN).map(|i| (i as i32 * 64 - 32768) as i16).collect();
    let input = Tensor::from_i16(shape.clone(), &values).unwrap();
    let mut output = Tensor::zeros(shape.clone(), DType::I16);
    group.bench_function("i16", |b| {
        b.iter(|| {
            activation(
                ActivationKind::Tanh,
                &ActivationParams::Int16 {
                    input_left_shift: shift,
                },
                &input.view(),
                &mut output.view_mut(),
            )
            .unwrap();
            black_box(output.as_bytes());
        })
    });

    let qa = QuantizedActivation::prepare("tanh", Some(QuantParams::new(1.0 / 16.0, 0))).unwrap();
    let table = qa.build_table(ActivationKind::Tanh, DType::I8).unwrap();
    let values: Vec<i8> = (0..LEN).map(|i| i as u8 as i8).collect();
    let input = Tensor::from_i8(shape.clone(), &values).unwrap();
    let mut output = Tensor::zeros(shape, DType::I8);
    group.bench_function("i8_lookup", |b| {
        b.iter(|| {
            activation(
                ActivationKind::Tanh,
                &ActivationParams::Int8 { table: &table },
                &input.view(),
                &mut output.view_mut(),
            )
            .unwrap();
            black_box(output.as_bytes());
        })
    });
    group.bench_function("i8_table_build", |b| {
        b.iter(|| black_box(qa.build_table(ActivationKind::Tanh, DType::I8).unwrap()))
    });
    group.finish();
}

fn bench_softmax(c: &mut Criterion) {
    let shape = Shape::matrix(16, 64);
    let values: Vec<i8> = (0..shape.num_elements()).map(|i| (i % 251) as u8 as i8).collect();
    let input = Tensor::from_i8(shape.clone(), &values)
        .unwrap()
        .with_quant(QuantParams::new(0.05, 0));
    let mut output = Tensor::zeros(shape, DType::I8);
    let mut scratch = vec![0.0f32; 64];
    c.bench_function("softmax/i8_16x64", |b| {
        b.iter(|| {
            softmax(1.0, &input.view(), &mut output.view_mut(), &mut scratch).unwrap();
            black_box(output.as_bytes());
        })
    });
}

criterion_group!(benches, bench_activation, bench_softmax);
criterion_main!(benches);
