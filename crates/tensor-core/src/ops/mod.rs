// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Kernels for the fixed operator set.
//!
//! Each kernel reads a borrowed input view and writes a borrowed output
//! view that the caller carved out of the arena. Nothing here allocates;
//! kernels that need temporary space take it as a `scratch` slice.

mod activation_op;
mod reshape_op;
mod softmax_op;

pub use activation_op::{
    activation, logistic, prepare_int16, tanh, ActivationKind, ActivationParams,
    QuantizedActivation, INPUT_INTEGER_BITS_16BIT, INPUT_INTEGER_BITS_8BIT,
    OUTPUT_FRACTIONAL_BITS_16BIT,
};
pub use reshape_op::reshape;
pub use softmax_op::{softmax, softmax_output_quant, softmax_scratch_bytes};
