// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-tensor quantization parameters and the setup-time helpers that turn
//! a real-valued scale into an integer multiplier and shift.

use crate::{DType, TensorError};
use serde::{Deserialize, Serialize};

/// Affine quantization: `real = scale * (q - zero_point)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantParams {
    pub scale: f32,
    #[serde(default)]
    pub zero_point: i32,
}

impl QuantParams {
    pub fn new(scale: f32, zero_point: i32) -> Self {
        Self { scale, zero_point }
    }

    /// Symmetric parameters (`zero_point == 0`).
    pub fn symmetric(scale: f32) -> Self {
        Self {
            scale,
            zero_point: 0,
        }
    }

    /// Maps a quantized value back to the real line.
    #[inline]
    pub fn dequantize(&self, q: i32) -> f32 {
        self.scale * (i64::from(q) - i64::from(self.zero_point)) as f32
    }

    /// Checks that the scale is a positive finite number and that the
    /// zero point is representable in `dtype`.
    pub fn check(&self, op: &'static str, dtype: DType) -> Result<(), TensorError> {
        if !(self.scale > 0.0 && self.scale.is_finite()) {
            return Err(TensorError::InvalidQuantization {
                op,
                detail: format!("scale must be positive and finite, got {}", self.scale),
            });
        }
        if let Some((lo, hi)) = dtype.quantized_range() {
            if !(lo..=hi).contains(&self.zero_point) {
                return Err(TensorError::InvalidQuantization {
                    op,
                    detail: format!(
                        "zero point {} is outside the {dtype} range [{lo}, {hi}]",
                        self.zero_point
                    ),
                });
            }
        }
        Ok(())
    }

    /// Maps a real value to the nearest quantized step, clamped to `[min, max]`.
    #[inline]
    pub fn quantize(&self, real: f32, min: i32, max: i32) -> i32 {
        let q = (real / self.scale).round() as i32 + self.zero_point;
        q.clamp(min, max)
    }
}

/// Splits `x` into a mantissa in `[0.5, 1)` and a power-of-two exponent,
/// so that `x == m * 2^e`. Zero and non-finite inputs return `(x, 0)`.
pub fn frexp(x: f64) -> (f64, i32) {
    if x == 0.0 || !x.is_finite() {
        return (x, 0);
    }
    let bits = x.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    if biased == 0 {
        // Subnormal: normalise first.
        let (m, e) = frexp(x * 2f64.powi(54));
        return (m, e - 54);
    }
    let mantissa = f64::from_bits((bits & !(0x7ff_u64 << 52)) | (1022_u64 << 52));
    (mantissa, biased - 1022)
}

/// Encodes a positive real multiplier as a Q0.31 fixed-point value and a
/// shift, such that `real ≈ multiplier * 2^(shift - 31)`.
pub fn quantize_multiplier(real: f64) -> (i32, i32) {
    if real <= 0.0 {
        return (0, 0);
    }
    let (q, mut shift) = frexp(real);
    let mut q_fixed = (q * (1i64 << 31) as f64).round() as i64;
    if q_fixed == 1i64 << 31 {
        q_fixed /= 2;
        shift += 1;
    }
    if shift < -31 {
        return (0, 0);
    }
    (q_fixed as i32, shift)
}

/// Returns `Some(log2(x))` if `x` is within 1e-3 (in log space) of an exact
/// power of two.
pub fn checked_log2(x: f32) -> Option<i32> {
    if x <= 0.0 || !x.is_finite() {
        return None;
    }
    let log2 = x.log2();
    let rounded = log2.round();
    if (log2 - rounded).abs() < 1e-3 {
        Some(rounded as i32)
    } else {
        None
    }
}

/// Largest centered input magnitude that still maps below saturation once
/// rescaled into a fixed-point value with `input_integer_bits` integer bits.
pub fn calculate_input_radius(input_integer_bits: i32, input_left_shift: i32) -> i32 {
    const TOTAL_SIGNED_BITS: i32 = 31;
    let max_input_rescaled = ((1i64 << input_integer_bits) - 1) as f64
        * 2f64.powi(TOTAL_SIGNED_BITS - input_integer_bits)
        / 2f64.powi(input_left_shift);
    max_input_rescaled.floor().min(i32::MAX as f64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_zero_point_range() {
        assert!(QuantParams::new(0.1, 255).check("tanh", DType::U8).is_ok());
        assert!(QuantParams::new(0.1, -128).check("tanh", DType::I8).is_ok());
        for (zp, dtype) in [(256, DType::U8), (-1, DType::U8), (128, DType::I8), (i32::MIN + 5, DType::I8)] {
            assert!(matches!(
                QuantParams::new(0.1, zp).check("tanh", dtype),
                Err(TensorError::InvalidQuantization { .. })
            ));
        }
        assert!(QuantParams::new(0.0, 0).check("tanh", DType::I8).is_err());
        assert!(QuantParams::new(f32::NAN, 0).check("tanh", DType::I8).is_err());
    }

    #[test]
    fn test_dequantize_extreme_zero_point() {
        let q = QuantParams::new(1.0, i32::MIN + 5);
        let real = q.dequantize(0);
        assert!(real.is_finite() && real > 2.0e9);
    }

    #[test]
    fn test_frexp() {
        assert_eq!(frexp(1.0), (0.5, 1));
        assert_eq!(frexp(0.75), (0.75, 0));
        assert_eq!(frexp(-8.0), (-0.5, 4));
        assert_eq!(frexp(0.0), (0.0, 0));
        let (m, e) = frexp(f64::MIN_POSITIVE / 4.0);
        assert_eq!(m, 0.5);
        assert_eq!(e, -1023);
    }

    #[test]
    fn test_quantize_multiplier() {
        let (m, s) = quantize_multiplier(0.5);
        assert_eq!(m, 1 << 30);
        assert_eq!(s, 0);

        // 1/16 scaled into Q4.27.
        let (m, s) = quantize_multiplier((1.0 / 16.0) * (1u64 << 27) as f64);
        assert_eq!(m, 1 << 30);
        assert_eq!(s, 24);
    }

    #[test]
    fn test_quantize_multiplier_rounds_up_to_next_power() {
        // Mantissa that rounds to 2^31 is renormalised.
        let (m, s) = quantize_multiplier(1.0 - 1e-12);
        assert_eq!(m, 1 << 30);
        assert_eq!(s, 1);
    }

    #[test]
    fn test_checked_log2() {
        assert_eq!(checked_log2(1.0 / 4096.0), Some(-12));
        assert_eq!(checked_log2(1.0 / 2048.0), Some(-11));
        assert_eq!(checked_log2(0.003), None);
        assert_eq!(checked_log2(0.0), None);
    }

    #[test]
    fn test_input_radius() {
        // 15 * 2^27 / 2^24
        assert_eq!(calculate_input_radius(4, 24), 120);
        assert_eq!(calculate_input_radius(4, 0), 15 << 27);
    }

    #[test]
    fn test_quant_roundtrip() {
        let q = QuantParams::new(0.5, 10);
        assert_eq!(q.quantize(2.0, -128, 127), 14);
        assert_eq!(q.dequantize(14), 2.0);
        assert_eq!(q.quantize(1000.0, -128, 127), 127);
    }
}
