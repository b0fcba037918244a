// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Softmax over the last dimension.

use crate::{DType, QuantParams, Shape, TensorError, TensorView, TensorViewMut};

/// Output quantization of the 8-bit softmax: `[0, 1)` in steps of 1/256.
pub fn softmax_output_quant(dtype: DType) -> Option<QuantParams> {
    match dtype {
        DType::I8 => Some(QuantParams::new(1.0 / 256.0, -128)),
        DType::U8 => Some(QuantParams::new(1.0 / 256.0, 0)),
        _ => None,
    }
}

/// Scratch bytes the quantized path needs: one f32 row.
pub fn softmax_scratch_bytes(dtype: DType, shape: &Shape) -> usize {
    match dtype {
        DType::I8 | DType::U8 => shape.last_dim() * DType::F32.size_bytes(),
        _ => 0,
    }
}

/// Numerically stable softmax of `row` in place, scaled by `beta`.
fn softmax_row(row: &mut [f32], beta: f32) {
    let max_val = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for v in row.iter_mut() {
        let e = ((*v - max_val) * beta).exp();
        *v = e;
        sum += e;
    }
    if sum > 0.0 {
        let inv_sum = 1.0 / sum;
        for v in row.iter_mut() {
            *v *= inv_sum;
        }
    }
}

/// Computes `softmax(beta * x)` along the last dimension.
///
/// float32 tensors are processed in place in the output buffer. 8-bit
/// tensors are dequantized row by row into `scratch` (at least
/// [`softmax_scratch_bytes`] worth of f32s) and requantized with the output
/// tensor's parameters, defaulting to [`softmax_output_quant`].
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] / [`TensorError::DTypeMismatch`]
/// if input and output disagree, [`TensorError::UnsupportedDType`] for
/// int16/int32, and [`TensorError::BufferSizeMismatch`] if `scratch` is too
/// small.
pub fn softmax(
    beta: f32,
    input: &TensorView<'_>,
    output: &mut TensorViewMut<'_>,
    scratch: &mut [f32],
) -> Result<(), TensorError> {
    if input.shape() != output.shape() {
        return Err(TensorError::ShapeMismatch {
            op: "softmax",
            lhs: input.shape().clone(),
            rhs: output.shape().clone(),
        });
    }
    if input.dtype() != output.dtype() {
        return Err(TensorError::DTypeMismatch {
            op: "softmax",
            input: input.dtype(),
            output: output.dtype(),
        });
    }

    let last_dim = input.shape().last_dim();
    if last_dim == 0 {
        return Ok(());
    }

    match input.dtype() {
        DType::F32 => {
            let src = input.as_f32()?;
            let dst = output.as_f32_mut()?;
            dst.copy_from_slice(src);
            for row in dst.chunks_exact_mut(last_dim) {
                softmax_row(row, beta);
            }
            Ok(())
        }
        DType::I8 | DType::U8 => {
            let dtype = input.dtype();
            if scratch.len() < last_dim {
                return Err(TensorError::BufferSizeMismatch {
                    expected: last_dim * DType::F32.size_bytes(),
                    actual: scratch.len() * DType::F32.size_bytes(),
                });
            }
            let in_q = input
                .quant()
                .ok_or(TensorError::MissingQuantization { op: "softmax" })?;
            let out_q = match output.quant().or_else(|| softmax_output_quant(dtype)) {
                Some(q) => q,
                None => return Err(TensorError::MissingQuantization { op: "softmax" }),
            };
            let row_buf = &mut scratch[..last_dim];
            let src = input.as_bytes();
            let dst = output.as_bytes_mut();
            let (lo, hi) = if dtype == DType::I8 {
                (i8::MIN as i32, i8::MAX as i32)
            } else {
                (u8::MIN as i32, u8::MAX as i32)
            };
            let decode = |b: u8| -> i32 {
                if dtype == DType::I8 {
                    b as i8 as i32
                } else {
                    b as i32
                }
            };

            for (src_row, dst_row) in src.chunks_exact(last_dim).zip(dst.chunks_exact_mut(last_dim)) {
                for (r, &b) in row_buf.iter_mut().zip(src_row) {
                    *r = in_q.dequantize(decode(b));
                }
                softmax_row(row_buf, beta);
                for (d, &p) in dst_row.iter_mut().zip(row_buf.iter()) {
                    *d = out_q.quantize(p, lo, hi) as u8;
                }
            }
            Ok(())
        }
        other => Err(TensorError::UnsupportedDType {
            op: "softmax",
            dtype: other,
        }),
    }
}
