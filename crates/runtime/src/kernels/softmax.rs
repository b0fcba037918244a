// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Softmax kernel over the last dimension.

use super::{check_same_layout, read_block, write_block, KernelIo, OpKernel};
use bytemuck::{Pod, Zeroable};
use model_ir::{OpKind, OperatorDescriptor, TensorDef};
use tensor_core::{softmax, softmax_output_quant, softmax_scratch_bytes, DType, QuantParams, TensorError};

#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct SoftmaxData {
    beta: f32,
    output_scale: f32,
    output_zero_point: i32,
    /// 1 when the output parameters above apply.
    quantized: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SoftmaxKernel;

impl SoftmaxKernel {
    pub fn new() -> Self {
        Self
    }
}

impl OpKernel for SoftmaxKernel {
    fn kind(&self) -> OpKind {
        OpKind::Softmax
    }

    fn persistent_bytes(&self, _input: &TensorDef, _output: &TensorDef) -> usize {
        std::mem::size_of::<SoftmaxData>()
    }

    fn check_shapes(&self, input: &TensorDef, output: &TensorDef) -> Result<usize, TensorError> {
        check_same_layout("softmax", input, output)?;
        Ok(softmax_scratch_bytes(input.dtype, &input.shape))
    }

    fn setup(
        &self,
        op: &OperatorDescriptor,
        input: &TensorDef,
        output: &TensorDef,
        persistent: &mut [u8],
    ) -> Result<(), TensorError> {
        let mut data = SoftmaxData::zeroed();
        data.beta = op.options.beta;

        match input.dtype {
            DType::F32 => {}
            DType::I8 | DType::U8 => {
                let in_q = input
                    .quantization
                    .ok_or(TensorError::MissingQuantization { op: "softmax" })?;
                in_q.check("softmax", input.dtype)?;
                let canonical = softmax_output_quant(input.dtype);
                let out_q = match output.quantization.or(canonical) {
                    Some(q) => q,
                    None => return Err(TensorError::MissingQuantization { op: "softmax" }),
                };
                out_q.check("softmax", output.dtype)?;
                if Some(out_q) != canonical {
                    tracing::warn!(
                        "softmax '{}' output quantization {:?} differs from {:?}",
                        op.name,
                        out_q,
                        canonical,
                    );
                }
                data.output_scale = out_q.scale;
                data.output_zero_point = out_q.zero_point;
                data.quantized = 1;
            }
            other => {
                tracing::warn!(
                    "operator '{}' has no softmax kernel for {other}; every call will fail",
                    op.name,
                );
            }
        }
        write_block(persistent, &data)
    }

    fn compute(&self, _op: &OperatorDescriptor, io: KernelIo<'_>) -> Result<(), TensorError> {
        let data: &SoftmaxData = read_block(io.persistent)?;
        let mut output = if data.quantized == 1 {
            io.output
                .with_quant(Some(QuantParams::new(data.output_scale, data.output_zero_point)))
        } else {
            io.output
        };
        softmax(data.beta, &io.input, &mut output, scratch_as_f32(io.scratch)?)
    }
}

/// Views the scratch bytes as floats. Only the 8-bit paths request
/// scratch; an empty region may carry a dangling, unaligned pointer.
fn scratch_as_f32(scratch: &mut [u8]) -> Result<&mut [f32], TensorError> {
    if scratch.is_empty() {
        return Ok(&mut []);
    }
    let len = scratch.len();
    bytemuck::try_cast_slice_mut(scratch).map_err(|_| TensorError::Misaligned {
        dtype: DType::F32,
        len,
    })
}
