// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`OpKernel`] trait and the built-in kernels.
//!
//! A kernel has two phases. At setup it validates its tensors, reports how
//! much scratch it needs per call, and writes its precomputed constants
//! into a persistent arena block. At compute it reads those constants back
//! and transforms input bytes into output bytes, without allocating.

pub mod activation;
pub mod reshape;
pub mod softmax;

use model_ir::{OpKind, OperatorDescriptor, TensorDef};
use tensor_core::{DType, TensorError, TensorView, TensorViewMut};

pub use activation::ActivationKernel;
pub use reshape::ReshapeKernel;
pub use softmax::SoftmaxKernel;

/// Buffers lent to one kernel call, all carved from the arena.
pub struct KernelIo<'a> {
    pub input: TensorView<'a>,
    pub output: TensorViewMut<'a>,
    /// The block this op's `setup` filled.
    pub persistent: &'a [u8],
    /// Exactly as many bytes as `check_shapes` asked for.
    pub scratch: &'a mut [u8],
}

/// An operator implementation the registry can hand to the runner.
pub trait OpKernel {
    /// The operator kind this kernel implements.
    fn kind(&self) -> OpKind;

    /// Size of the persistent block `setup` writes; `0` for none.
    fn persistent_bytes(&self, input: &TensorDef, output: &TensorDef) -> usize;

    /// Checks that the tensors fit together and returns the scratch bytes
    /// one call needs.
    fn check_shapes(&self, input: &TensorDef, output: &TensorDef) -> Result<usize, TensorError>;

    /// Derives per-op constants into `persistent`, which is
    /// `persistent_bytes` long. Runs once per binding.
    fn setup(
        &self,
        op: &OperatorDescriptor,
        input: &TensorDef,
        output: &TensorDef,
        persistent: &mut [u8],
    ) -> Result<(), TensorError>;

    /// Runs the operator. The output is left untouched on error.
    fn compute(&self, op: &OperatorDescriptor, io: KernelIo<'_>) -> Result<(), TensorError>;
}

/// Shape and dtype must match exactly, as for every element-wise kernel.
pub(crate) fn check_same_layout(
    op: &'static str,
    input: &TensorDef,
    output: &TensorDef,
) -> Result<(), TensorError> {
    if input.shape != output.shape {
        return Err(TensorError::ShapeMismatch {
            op,
            lhs: input.shape.clone(),
            rhs: output.shape.clone(),
        });
    }
    if input.dtype != output.dtype {
        return Err(TensorError::DTypeMismatch {
            op,
            input: input.dtype,
            output: output.dtype,
        });
    }
    Ok(())
}

/// Reads a `T` back out of the front of a persistent block.
pub(crate) fn read_block<T: bytemuck::Pod>(persistent: &[u8]) -> Result<&T, TensorError> {
    let size = std::mem::size_of::<T>();
    let bytes = persistent
        .get(..size)
        .ok_or(TensorError::BufferSizeMismatch {
            expected: size,
            actual: persistent.len(),
        })?;
    bytemuck::try_from_bytes(bytes).map_err(|_| TensorError::BufferSizeMismatch {
        expected: size,
        actual: persistent.len(),
    })
}

/// Writes `value` into the front of a persistent block.
pub(crate) fn write_block<T: bytemuck::Pod>(persistent: &mut [u8], value: &T) -> Result<(), TensorError> {
    let src = bytemuck::bytes_of(value);
    let actual = persistent.len();
    let dst = persistent
        .get_mut(..src.len())
        .ok_or(TensorError::BufferSizeMismatch {
            expected: src.len(),
            actual,
        })?;
    dst.copy_from_slice(src);
    Ok(())
}

/// Stable numeric tag for a dtype inside a persistent block.
pub(crate) fn dtype_code(dtype: DType) -> u32 {
    match dtype {
        DType::F32 => 1,
        DType::I8 => 2,
        DType::U8 => 3,
        DType::I16 => 4,
        DType::I32 => 5,
    }
}

pub(crate) fn dtype_from_code(code: u32) -> Option<DType> {
    match code {
        1 => Some(DType::F32),
        2 => Some(DType::I8),
        3 => Some(DType::U8),
        4 => Some(DType::I16),
        5 => Some(DType::I32),
        _ => None,
    }
}
