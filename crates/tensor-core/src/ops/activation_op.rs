// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tanh and logistic over float32, int16, uint8 and int8 tensors.
//!
//! The quantized variants never touch floating point at compute time:
//! - **int16** inputs are Q3.12 (optionally Q4.11 doubled with saturation),
//!   widened to 32-bit, evaluated in fixed point and narrowed to Q0.15.
//! - **uint8 / int8** inputs are centered by their zero point, rescaled to
//!   Q4.27 and evaluated in fixed point. Since there are only 256 possible
//!   inputs, [`QuantizedActivation::build_table`] evaluates every one of them
//!   once and compute becomes a table lookup.

use crate::fixed_point::{self, multiply_by_quantized_multiplier, rounding_divide_by_pot};
use crate::quant::{calculate_input_radius, checked_log2, frexp};
use crate::{DType, QuantParams, TensorError, TensorView, TensorViewMut};

/// Integer bits of the rescaled 8-bit input (Q4.27).
pub const INPUT_INTEGER_BITS_8BIT: i32 = 4;

/// Integer bits of the int16 input (Q3.12).
pub const INPUT_INTEGER_BITS_16BIT: i32 = 3;

/// Fractional bits of the int16 output (Q0.15).
pub const OUTPUT_FRACTIONAL_BITS_16BIT: i32 = 15;

/// Which saturating non-linearity to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivationKind {
    Tanh,
    Logistic,
}

impl ActivationKind {
    pub fn name(self) -> &'static str {
        match self {
            ActivationKind::Tanh => "tanh",
            ActivationKind::Logistic => "logistic",
        }
    }

    #[inline]
    fn eval_f32(self, x: f32) -> f32 {
        match self {
            ActivationKind::Tanh => x.tanh(),
            ActivationKind::Logistic => 1.0 / (1.0 + (-x).exp()),
        }
    }

    #[inline]
    fn eval_fixed(self, raw: i32, integer_bits: i32) -> i32 {
        match self {
            ActivationKind::Tanh => fixed_point::tanh(raw, integer_bits),
            ActivationKind::Logistic => fixed_point::logistic(raw, integer_bits),
        }
    }

    /// The fixed output quantization of the 8-bit variants.
    ///
    /// Tanh maps onto `[-1, 1]` with scale 1/128; logistic onto `[0, 1]` with
    /// scale 1/256.
    pub fn canonical_output(self, dtype: DType) -> Option<QuantParams> {
        match (self, dtype) {
            (ActivationKind::Tanh, DType::U8) => Some(QuantParams::new(1.0 / 128.0, 128)),
            (ActivationKind::Tanh, DType::I8) => Some(QuantParams::new(1.0 / 128.0, 0)),
            (ActivationKind::Logistic, DType::U8) => Some(QuantParams::new(1.0 / 256.0, 0)),
            (ActivationKind::Logistic, DType::I8) => Some(QuantParams::new(1.0 / 256.0, -128)),
            (_, DType::I16) => Some(QuantParams::symmetric(
                1.0 / (1 << OUTPUT_FRACTIONAL_BITS_16BIT) as f32,
            )),
            _ => None,
        }
    }
}

/// Per-op constants for the asymmetric 8-bit paths, derived once from the
/// input scale and zero point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizedActivation {
    pub input_zero_point: i32,
    /// Centered inputs at or beyond `±input_range_radius` saturate.
    pub input_range_radius: i32,
    pub input_multiplier: i32,
    pub input_left_shift: i32,
}

impl QuantizedActivation {
    /// Derives the Q4.27 rescale for an 8-bit input.
    pub fn prepare(op: &'static str, input: Option<QuantParams>) -> Result<Self, TensorError> {
        let input = input.ok_or(TensorError::MissingQuantization { op })?;
        if !(input.scale > 0.0 && input.scale.is_finite()) {
            return Err(TensorError::InvalidQuantization {
                op,
                detail: format!("input scale must be positive, got {}", input.scale),
            });
        }
        let real_multiplier =
            input.scale as f64 * (1i64 << (31 - INPUT_INTEGER_BITS_8BIT)) as f64;
        let (q, mut input_left_shift) = frexp(real_multiplier);
        let mut input_multiplier = (q * (1i64 << 31) as f64).round() as i64;
        if input_multiplier == 1i64 << 31 {
            input_multiplier /= 2;
            input_left_shift += 1;
        }
        if !(-31..=31).contains(&input_left_shift) {
            return Err(TensorError::InvalidQuantization {
                op,
                detail: format!(
                    "input scale {} needs a shift of {input_left_shift}, outside [-31, 31]",
                    input.scale
                ),
            });
        }
        Ok(Self {
            input_zero_point: input.zero_point,
            input_range_radius: calculate_input_radius(INPUT_INTEGER_BITS_8BIT, input_left_shift),
            input_multiplier: input_multiplier as i32,
            input_left_shift,
        })
    }

    /// Q0.31 result for a centered input strictly inside the radius.
    #[inline]
    fn eval_centered(&self, kind: ActivationKind, centered: i32) -> i32 {
        let rescaled =
            multiply_by_quantized_multiplier(centered, self.input_multiplier, self.input_left_shift);
        kind.eval_fixed(rescaled, INPUT_INTEGER_BITS_8BIT)
    }

    /// Evaluates one uint8 input.
    pub fn eval_u8(&self, kind: ActivationKind, x: u8) -> u8 {
        let centered = x as i32 - self.input_zero_point;
        if centered <= -self.input_range_radius {
            return 0;
        }
        if centered >= self.input_range_radius {
            return u8::MAX;
        }
        let q0 = self.eval_centered(kind, centered);
        let out = match kind {
            // Q0.31 -> scale 1/128, zero point 128
            ActivationKind::Tanh => rounding_divide_by_pot(q0, 24) + 128,
            // Q0.31 -> scale 1/256, zero point 0
            ActivationKind::Logistic => rounding_divide_by_pot(q0, 23),
        };
        out.clamp(0, u8::MAX as i32) as u8
    }

    /// Evaluates one int8 input.
    pub fn eval_i8(&self, kind: ActivationKind, x: i8) -> i8 {
        let centered = x as i32 - self.input_zero_point;
        if centered <= -self.input_range_radius {
            return i8::MIN;
        }
        if centered >= self.input_range_radius {
            return i8::MAX;
        }
        let q0 = self.eval_centered(kind, centered);
        let out = match kind {
            ActivationKind::Tanh => rounding_divide_by_pot(q0, 24),
            ActivationKind::Logistic => rounding_divide_by_pot(q0, 23) - 128,
        };
        out.clamp(i8::MIN as i32, i8::MAX as i32) as i8
    }

    /// Evaluates every possible 8-bit input, indexed by the raw input byte.
    pub fn build_table(&self, kind: ActivationKind, dtype: DType) -> Result<[u8; 256], TensorError> {
        if let Some((lo, hi)) = dtype.quantized_range() {
            if !(lo..=hi).contains(&self.input_zero_point) {
                return Err(TensorError::InvalidQuantization {
                    op: kind.name(),
                    detail: format!(
                        "zero point {} is outside the {dtype} range [{lo}, {hi}]",
                        self.input_zero_point
                    ),
                });
            }
        }
        let mut table = [0u8; 256];
        match dtype {
            DType::U8 => {
                for (byte, slot) in table.iter_mut().enumerate() {
                    *slot = self.eval_u8(kind, byte as u8);
                }
            }
            DType::I8 => {
                for (byte, slot) in table.iter_mut().enumerate() {
                    *slot = self.eval_i8(kind, byte as u8 as i8) as u8;
                }
            }
            other => {
                return Err(TensorError::UnsupportedDType {
                    op: kind.name(),
                    dtype: other,
                })
            }
        }
        Ok(table)
    }
}

/// Validates int16 quantization and returns the input left shift (0 or 1).
///
/// Both tensors must be symmetric, the input scale a power of two giving
/// Q3.12 or Q4.11, and the output scale exactly 2^-15.
pub fn prepare_int16(
    op: &'static str,
    input: Option<QuantParams>,
    output: Option<QuantParams>,
) -> Result<i32, TensorError> {
    let input = input.ok_or(TensorError::MissingQuantization { op })?;
    let output = output.ok_or(TensorError::MissingQuantization { op })?;
    let invalid = |detail: String| TensorError::InvalidQuantization { op, detail };

    if input.zero_point != 0 || output.zero_point != 0 {
        return Err(invalid(format!(
            "int16 requires zero points of 0, got input {} / output {}",
            input.zero_point, output.zero_point
        )));
    }
    let input_log2 = checked_log2(input.scale)
        .ok_or_else(|| invalid(format!("input scale {} is not a power of two", input.scale)))?;
    let input_left_shift = (15 - INPUT_INTEGER_BITS_16BIT) + input_log2;
    if !(0..=1).contains(&input_left_shift) {
        return Err(invalid(format!(
            "input scale 2^{input_log2} gives left shift {input_left_shift}, expected 0 or 1"
        )));
    }
    if checked_log2(output.scale) != Some(-OUTPUT_FRACTIONAL_BITS_16BIT) {
        return Err(invalid(format!(
            "output scale must be 2^-{OUTPUT_FRACTIONAL_BITS_16BIT}, got {}",
            output.scale
        )));
    }
    Ok(input_left_shift)
}

/// Per-dtype parameters the compute step dispatches on.
#[derive(Debug, Clone, Copy)]
pub enum ActivationParams<'a> {
    Float32,
    Int16 { input_left_shift: i32 },
    Uint8 { table: &'a [u8; 256] },
    Int8 { table: &'a [u8; 256] },
}

impl ActivationParams<'_> {
    fn dtype(&self) -> DType {
        match self {
            ActivationParams::Float32 => DType::F32,
            ActivationParams::Int16 { .. } => DType::I16,
            ActivationParams::Uint8 { .. } => DType::U8,
            ActivationParams::Int8 { .. } => DType::I8,
        }
    }
}

/// Applies `kind` element-wise from `input` into `output`.
///
/// All validation happens before the first write.
///
/// # Errors
/// - [`TensorError::ShapeMismatch`] / [`TensorError::DTypeMismatch`] if the
///   tensors disagree.
/// - [`TensorError::UnsupportedDType`] for element types without a kernel.
/// - [`TensorError::ParamsMismatch`] if `params` were prepared for another type.
pub fn activation(
    kind: ActivationKind,
    params: &ActivationParams<'_>,
    input: &TensorView<'_>,
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    let op = kind.name();
    if input.shape() != output.shape() {
        return Err(TensorError::ShapeMismatch {
            op,
            lhs: input.shape().clone(),
            rhs: output.shape().clone(),
        });
    }
    if input.dtype() != output.dtype() {
        return Err(TensorError::DTypeMismatch {
            op,
            input: input.dtype(),
            output: output.dtype(),
        });
    }
    if !matches!(input.dtype(), DType::F32 | DType::I16 | DType::U8 | DType::I8) {
        return Err(TensorError::UnsupportedDType {
            op,
            dtype: input.dtype(),
        });
    }
    if params.dtype() != input.dtype() {
        return Err(TensorError::ParamsMismatch {
            op,
            dtype: input.dtype(),
        });
    }

    match *params {
        ActivationParams::Float32 => {
            let src = input.as_f32()?;
            let dst = output.as_f32_mut()?;
            for (d, &x) in dst.iter_mut().zip(src) {
                *d = kind.eval_f32(x);
            }
        }
        ActivationParams::Int16 { input_left_shift } => {
            let src = input.as_i16()?;
            let dst = output.as_i16_mut()?;
            for (d, &x) in dst.iter_mut().zip(src) {
                let x = if input_left_shift == 1 {
                    x.saturating_mul(2)
                } else {
                    x
                };
                // Q3.12 -> Q3.28
                let q0 = kind.eval_fixed((x as i32) << 16, INPUT_INTEGER_BITS_16BIT);
                *d = rounding_divide_by_pot(q0, 16).clamp(i16::MIN as i32, i16::MAX as i32) as i16;
            }
        }
        ActivationParams::Uint8 { table } | ActivationParams::Int8 { table } => {
            let src = input.as_bytes();
            let dst = output.as_bytes_mut();
            for (d, &x) in dst.iter_mut().zip(src) {
                *d = table[x as usize];
            }
        }
    }
    Ok(())
}

/// Hyperbolic tangent; see [`activation`].
pub fn tanh(
    params: &ActivationParams<'_>,
    input: &TensorView<'_>,
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    activation(ActivationKind::Tanh, params, input, output)
}

/// Logistic sigmoid; see [`activation`].
pub fn logistic(
    params: &ActivationParams<'_>,
    input: &TensorView<'_>,
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    activation(ActivationKind::Logistic, params, input, output)
}
