// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Element types, tensor views and the quantized kernels the runtime
//! dispatches to.
//!
//! This crate provides:
//! - [`TensorView`] / [`TensorViewMut`]: borrowed tensors over arena bytes.
//! - [`Shape`], [`DType`] and per-tensor [`QuantParams`].
//! - [`fixed_point`]: saturating 32-bit fixed-point arithmetic with `exp`,
//!   `tanh` and `logistic`.
//! - Kernels: tanh, logistic, softmax, reshape.
//!
//! # Design Goals
//! - No heap allocation in kernels (they write into caller-provided views).
//! - Validation happens before the first output byte is written.
//! - Clean error types via `thiserror`.

mod dtype;
mod error;
pub mod fixed_point;
mod ops;
pub mod quant;
mod shape;
mod tensor;

pub use dtype::DType;
pub use error::TensorError;
pub use ops::{
    activation, logistic, prepare_int16, reshape, softmax, softmax_output_quant,
    softmax_scratch_bytes, tanh, ActivationKind, ActivationParams, QuantizedActivation,
    INPUT_INTEGER_BITS_16BIT, INPUT_INTEGER_BITS_8BIT, OUTPUT_FRACTIONAL_BITS_16BIT,
};
pub use quant::QuantParams;
pub use shape::Shape;
pub use tensor::{Tensor, TensorView, TensorViewMut};
