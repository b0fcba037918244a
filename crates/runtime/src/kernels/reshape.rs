// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reshape kernel. No persistent data, no scratch.

use super::{KernelIo, OpKernel};
use model_ir::{OpKind, OperatorDescriptor, TensorDef};
use tensor_core::{reshape, TensorError};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReshapeKernel;

impl ReshapeKernel {
    pub fn new() -> Self {
        Self
    }
}

impl OpKernel for ReshapeKernel {
    fn kind(&self) -> OpKind {
        OpKind::Reshape
    }

    fn persistent_bytes(&self, _input: &TensorDef, _output: &TensorDef) -> usize {
        0
    }

    fn check_shapes(&self, input: &TensorDef, output: &TensorDef) -> Result<usize, TensorError> {
        if input.dtype != output.dtype {
            return Err(TensorError::DTypeMismatch {
                op: "reshape",
                input: input.dtype,
                output: output.dtype,
            });
        }
        if input.shape.num_elements() != output.shape.num_elements() {
            return Err(TensorError::ElementCountMismatch {
                expected: input.shape.num_elements(),
                actual: output.shape.num_elements(),
            });
        }
        if input.quantization != output.quantization {
            tracing::warn!(
                "reshape from '{}' to '{}' changes quantization; bytes are copied unchanged",
                input.name,
                output.name,
            );
        }
        Ok(0)
    }

    fn setup(
        &self,
        _op: &OperatorDescriptor,
        _input: &TensorDef,
        _output: &TensorDef,
        _persistent: &mut [u8],
    ) -> Result<(), TensorError> {
        Ok(())
    }

    fn compute(&self, _op: &OperatorDescriptor, io: KernelIo<'_>) -> Result<(), TensorError> {
        let mut output = io.output;
        reshape(&io.input, &mut output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_core::{DType, Shape};

    #[test]
    fn test_check_shapes() {
        let k = ReshapeKernel::new();
        let a = TensorDef::new("a", DType::I8, Shape::new(vec![1, 1, 12]));
        let b = TensorDef::new("b", DType::I8, Shape::matrix(1, 12));
        let c = TensorDef::new("c", DType::I8, Shape::matrix(1, 10));
        let d = TensorDef::new("d", DType::U8, Shape::matrix(1, 12));
        assert_eq!(k.check_shapes(&a, &b).unwrap(), 0);
        assert!(matches!(k.check_shapes(&a, &c), Err(TensorError::ElementCountMismatch { .. })));
        assert!(matches!(k.check_shapes(&a, &d), Err(TensorError::DTypeMismatch { .. })));
        assert_eq!(k.persistent_bytes(&a, &b), 0);
    }
}
