// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor operations.

use crate::{DType, Shape};

/// Errors that can occur while preparing or running a kernel.
///
/// Every kernel reports these before writing to its output, so a failed
/// call leaves the output buffer untouched.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// The provided buffer size does not match the expected size for the given shape and dtype.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Two tensors have incompatible shapes for the requested operation.
    #[error("incompatible shapes for {op}: {lhs} vs {rhs}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    /// Input and output element types differ.
    #[error("dtype mismatch for {op}: input {input}, output {output}")]
    DTypeMismatch {
        op: &'static str,
        input: DType,
        output: DType,
    },

    /// The requested data type is not supported for this operation.
    #[error("unsupported dtype {dtype} for operation {op}")]
    UnsupportedDType { op: &'static str, dtype: DType },

    /// The precomputed parameters were derived for a different element type.
    #[error("parameters for {op} were not prepared for dtype {dtype}")]
    ParamsMismatch { op: &'static str, dtype: DType },

    /// A quantized tensor carries no quantization parameters.
    #[error("{op}: quantized tensor has no quantization parameters")]
    MissingQuantization { op: &'static str },

    /// Quantization parameters are outside what the kernel implements.
    #[error("{op}: invalid quantization: {detail}")]
    InvalidQuantization { op: &'static str, detail: String },

    /// Reshape between tensors with different element counts.
    #[error("element count mismatch: {expected} vs {actual}")]
    ElementCountMismatch { expected: usize, actual: usize },

    /// The byte buffer could not be viewed as the requested element type.
    #[error("buffer of {len} bytes cannot be viewed as {dtype}")]
    Misaligned { dtype: DType, len: usize },
}
