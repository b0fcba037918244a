// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reshape: same bytes, different shape.

use crate::{TensorError, TensorView, TensorViewMut};

/// Copies `input` into `output`, which may have any shape with the same
/// element count and dtype.
pub fn reshape(input: &TensorView<'_>, output: &mut TensorViewMut<'_>) -> Result<(), TensorError> {
    if input.dtype() != output.dtype() {
        return Err(TensorError::DTypeMismatch {
            op: "reshape",
            input: input.dtype(),
            output: output.dtype(),
        });
    }
    if input.num_elements() != output.num_elements() {
        return Err(TensorError::ElementCountMismatch {
            expected: input.num_elements(),
            actual: output.num_elements(),
        });
    }
    output.as_bytes_mut().copy_from_slice(input.as_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DType, Shape, Tensor};

    #[test]
    fn test_reshape_copies_bytes() {
        let input = Tensor::from_i8(Shape::new(vec![1, 2, 3]), &[1, 2, 3, 4, 5, 6]).unwrap();
        let mut output = Tensor::zeros(Shape::matrix(1, 6), DType::I8);
        reshape(&input.view(), &mut output.view_mut()).unwrap();
        assert_eq!(output.view().as_i8().unwrap(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_reshape_count_mismatch() {
        let input = Tensor::zeros(Shape::vector(6), DType::I8);
        let mut output = Tensor::zeros(Shape::vector(5), DType::I8);
        assert!(matches!(
            reshape(&input.view(), &mut output.view_mut()),
            Err(TensorError::ElementCountMismatch {
                expected: 6,
                actual: 5
            })
        ));
    }
}
