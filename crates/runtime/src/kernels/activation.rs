// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tanh and logistic kernels.
//!
//! Both share one implementation; only the fixed-point function and the
//! canonical 8-bit output domain differ. Setup derives the per-dtype
//! parameters once and stores them in the op's persistent block:
//!
//! | dtype | persistent data |
//! |---|---|
//! | f32 | nothing |
//! | i16 | `input_left_shift` (0 or 1) |
//! | u8 / i8 | 256-entry lookup table |

use super::{
    check_same_layout, dtype_code, dtype_from_code, read_block, write_block, KernelIo, OpKernel,
};
use bytemuck::{Pod, Zeroable};
use model_ir::{OpKind, OperatorDescriptor, TensorDef};
use tensor_core::{
    activation, prepare_int16, ActivationKind, ActivationParams, DType, QuantizedActivation,
    TensorError,
};

#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct ActivationData {
    /// dtype the block was prepared for.
    dtype: u32,
    input_left_shift: i32,
    table: [u8; 256],
}

/// Element-wise saturating non-linearity.
#[derive(Debug, Clone, Copy)]
pub struct ActivationKernel {
    kind: ActivationKind,
}

impl ActivationKernel {
    pub fn tanh() -> Self {
        Self {
            kind: ActivationKind::Tanh,
        }
    }

    pub fn logistic() -> Self {
        Self {
            kind: ActivationKind::Logistic,
        }
    }

    pub fn activation(&self) -> ActivationKind {
        self.kind
    }
}

impl OpKernel for ActivationKernel {
    fn kind(&self) -> OpKind {
        match self.kind {
            ActivationKind::Tanh => OpKind::Tanh,
            ActivationKind::Logistic => OpKind::Logistic,
        }
    }

    fn persistent_bytes(&self, _input: &TensorDef, _output: &TensorDef) -> usize {
        std::mem::size_of::<ActivationData>()
    }

    fn check_shapes(&self, input: &TensorDef, output: &TensorDef) -> Result<usize, TensorError> {
        check_same_layout(self.kind.name(), input, output)?;
        Ok(0)
    }

    fn setup(
        &self,
        op: &OperatorDescriptor,
        input: &TensorDef,
        output: &TensorDef,
        persistent: &mut [u8],
    ) -> Result<(), TensorError> {
        let name = self.kind.name();
        let mut data = ActivationData::zeroed();
        data.dtype = dtype_code(input.dtype);

        match input.dtype {
            DType::F32 => {}
            DType::I16 => {
                data.input_left_shift =
                    prepare_int16(name, input.quantization, output.quantization)?;
            }
            DType::U8 | DType::I8 => {
                let q = QuantizedActivation::prepare(name, input.quantization)?;
                data.input_left_shift = q.input_left_shift;
                data.table = q.build_table(self.kind, input.dtype)?;
                let canonical = self.kind.canonical_output(input.dtype);
                if output.quantization.is_some() && output.quantization != canonical {
                    tracing::warn!(
                        "operator '{}' output quantization {:?} differs from the fixed {} domain {:?}",
                        op.name,
                        output.quantization,
                        name,
                        canonical,
                    );
                }
            }
            other => {
                tracing::warn!(
                    "operator '{}' has no {name} kernel for {other}; every call will fail",
                    op.name,
                );
            }
        }

        tracing::debug!(
            "{} '{}' prepared for {} (input_left_shift {})",
            name,
            op.name,
            input.dtype,
            data.input_left_shift,
        );
        write_block(persistent, &data)
    }

    fn compute(&self, _op: &OperatorDescriptor, io: KernelIo<'_>) -> Result<(), TensorError> {
        let data: &ActivationData = read_block(io.persistent)?;
        let params = match dtype_from_code(data.dtype) {
            Some(DType::I16) => ActivationParams::Int16 {
                input_left_shift: data.input_left_shift,
            },
            Some(DType::U8) => ActivationParams::Uint8 { table: &data.table },
            Some(DType::I8) => ActivationParams::Int8 { table: &data.table },
            // Unsupported dtypes are rejected by `activation` before the
            // params are looked at.
            _ => ActivationParams::Float32,
        };
        let mut output = io.output;
        activation(self.kind, &params, &io.input, &mut output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_manager::ArenaBuffer;
    use tensor_core::{QuantParams, Shape, Tensor};

    const BLOCK: usize = std::mem::size_of::<ActivationData>();

    fn op(kind: OpKind) -> OperatorDescriptor {
        OperatorDescriptor::new("act", kind, vec![0], 1)
    }

    fn def(dtype: DType, quant: Option<QuantParams>) -> TensorDef {
        TensorDef {
            name: "t".into(),
            dtype,
            shape: Shape::matrix(1, 4),
            quantization: quant,
        }
    }

    /// Runs setup then compute over owned tensors.
    fn run(
        kernel: &ActivationKernel,
        input: &Tensor,
        output: &mut Tensor,
        in_def: &TensorDef,
        out_def: &TensorDef,
    ) -> Result<(), TensorError> {
        let op = op(kernel.kind());
        let mut storage = ArenaBuffer::new(kernel.persistent_bytes(in_def, out_def));
        let block = storage.as_mut_slice();
        kernel.setup(&op, in_def, out_def, block)?;
        let io = KernelIo {
            input: input.view(),
            output: output.view_mut(),
            persistent: block,
            scratch: &mut [],
        };
        kernel.compute(&op, io)
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ActivationKernel::tanh().kind(), OpKind::Tanh);
        assert_eq!(ActivationKernel::logistic().kind(), OpKind::Logistic);
        assert_eq!(
            ActivationKernel::tanh().persistent_bytes(&def(DType::F32, None), &def(DType::F32, None)),
            BLOCK
        );
    }

    #[test]
    fn test_float_tanh() {
        let k = ActivationKernel::tanh();
        let input = Tensor::from_f32(Shape::matrix(1, 4), &[-2.0, 0.0, 0.5, 20.0]).unwrap();
        let mut output = Tensor::zeros(Shape::matrix(1, 4), DType::F32);
        let d = def(DType::F32, None);
        run(&k, &input, &mut output, &d, &d).unwrap();
        let out = output.view().as_f32().unwrap().to_vec();
        for (o, x) in out.iter().zip([-2.0f32, 0.0, 0.5, 20.0]) {
            assert!((o - x.tanh()).abs() < 1e-5);
        }
    }

    #[test]
    fn test_int8_logistic_table() {
        let k = ActivationKernel::logistic();
        let in_q = QuantParams::new(0.1, 0);
        let out_q = QuantParams::new(1.0 / 256.0, -128);
        let input = Tensor::from_i8(Shape::matrix(1, 4), &[-128, 0, 20, 127])
            .unwrap()
            .with_quant(in_q);
        let mut output = Tensor::zeros(Shape::matrix(1, 4), DType::I8).with_quant(out_q);
        run(&k, &input, &mut output, &def(DType::I8, Some(in_q)), &def(DType::I8, Some(out_q)))
            .unwrap();
        let out = output.view().as_i8().unwrap().to_vec();
        // logistic(0) = 0.5 -> 0 with zero point -128
        assert_eq!(out[1], 0);
        assert!(out[0] < out[1] && out[1] < out[2] && out[2] <= out[3]);
        // logistic(2.0) = 0.8808 -> 0.8808 * 256 - 128 = 97.5
        assert!((out[2] as i32 - 97).abs() <= 1);
    }

    #[test]
    fn test_int16_tanh() {
        let k = ActivationKernel::tanh();
        let in_q = QuantParams::symmetric(1.0 / 4096.0);
        let out_q = QuantParams::symmetric(1.0 / 32768.0);
        let input = Tensor::from_i16(Shape::matrix(1, 4), &[-4096, 0, 2048, 4096])
            .unwrap()
            .with_quant(in_q);
        let mut output = Tensor::zeros(Shape::matrix(1, 4), DType::I16).with_quant(out_q);
        run(&k, &input, &mut output, &def(DType::I16, Some(in_q)), &def(DType::I16, Some(out_q)))
            .unwrap();
        let out = output.view().as_i16().unwrap().to_vec();
        for (o, x) in out.iter().zip([-1.0f64, 0.0, 0.5, 1.0]) {
            let real = *o as f64 / 32768.0;
            assert!((real - x.tanh()).abs() < 2e-3, "tanh({x}) gave {real}");
        }
    }

    #[test]
    fn test_int16_bad_output_scale_fails_setup() {
        let k = ActivationKernel::tanh();
        let in_q = QuantParams::symmetric(1.0 / 4096.0);
        let out_q = QuantParams::symmetric(1.0 / 256.0);
        let mut storage = ArenaBuffer::new(BLOCK);
        let err = k
            .setup(
                &op(OpKind::Tanh),
                &def(DType::I16, Some(in_q)),
                &def(DType::I16, Some(out_q)),
                storage.as_mut_slice(),
            )
            .unwrap_err();
        assert!(matches!(err, TensorError::InvalidQuantization { .. }));
    }

    #[test]
    fn test_int8_missing_quant_fails_setup() {
        let k = ActivationKernel::tanh();
        let mut storage = ArenaBuffer::new(BLOCK);
        let d = def(DType::I8, None);
        assert!(matches!(
            k.setup(&op(OpKind::Tanh), &d, &d, storage.as_mut_slice()),
            Err(TensorError::MissingQuantization { .. })
        ));
    }

    #[test]
    fn test_out_of_range_quantization_fails_setup() {
        let k = ActivationKernel::tanh();
        let mut storage = ArenaBuffer::new(BLOCK);
        let huge_zp = def(DType::U8, Some(QuantParams::new(0.1, i32::MIN + 5)));
        assert!(matches!(
            k.setup(&op(OpKind::Tanh), &huge_zp, &huge_zp, storage.as_mut_slice()),
            Err(TensorError::InvalidQuantization { .. })
        ));
        let tiny_scale = def(DType::U8, Some(QuantParams::new(1e-20, 128)));
        assert!(matches!(
            k.setup(&op(OpKind::Tanh), &tiny_scale, &tiny_scale, storage.as_mut_slice()),
            Err(TensorError::InvalidQuantization { .. })
        ));
    }

    #[test]
    fn test_int32_fails_per_call_and_leaves_output() {
        let k = ActivationKernel::tanh();
        let d = def(DType::I32, None);
        let input = Tensor::from_bytes(Shape::matrix(1, 4), DType::I32, &[1u8; 16]).unwrap();
        let mut output = Tensor::from_bytes(Shape::matrix(1, 4), DType::I32, &[0xAB; 16]).unwrap();
        let err = run(&k, &input, &mut output, &d, &d).unwrap_err();
        assert!(matches!(err, TensorError::UnsupportedDType { dtype: DType::I32, .. }));
        assert!(output.as_bytes().iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_check_shapes_mismatch() {
        let k = ActivationKernel::logistic();
        let a = def(DType::F32, None);
        let mut b = def(DType::F32, None);
        b.shape = Shape::matrix(2, 2);
        assert!(matches!(k.check_shapes(&a, &b), Err(TensorError::ShapeMismatch { .. })));
        let c = def(DType::I8, Some(QuantParams::new(0.1, 0)));
        assert!(matches!(k.check_shapes(&a, &c), Err(TensorError::DTypeMismatch { .. })));
        assert_eq!(k.check_shapes(&a, &a).unwrap(), 0);
    }

    #[test]
    fn test_compute_with_short_block_fails() {
        let k = ActivationKernel::tanh();
        let input = Tensor::zeros(Shape::matrix(1, 4), DType::F32);
        let mut output = Tensor::zeros(Shape::matrix(1, 4), DType::F32);
        let io = KernelIo {
            input: input.view(),
            output: output.view_mut(),
            persistent: &[0u8; 4],
            scratch: &mut [],
        };
        assert!(matches!(
            k.compute(&op(OpKind::Tanh), io),
            Err(TensorError::BufferSizeMismatch { .. })
        ));
    }
}
