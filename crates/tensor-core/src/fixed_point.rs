// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! 32-bit fixed-point arithmetic for the quantized activation kernels.
//!
//! Values are raw `i32`s interpreted with a compile-time-free number of
//! integer bits: a value with `k` integer bits represents `raw / 2^(31 - k)`.
//! `Q0.31` (zero integer bits) spans `[-1, 1)`; its `ONE` saturates to
//! `i32::MAX`.
//!
//! The transcendental functions evaluate `exp` on `[-1/4, 0)` with a Taylor
//! expansion around `-1/8`, extend it to all negative inputs with a barrel
//! shifter of precomputed `exp(-2^k)` factors, and divide with three
//! Newton–Raphson iterations.

/// `1.0` in Q0.31 (saturated).
pub const Q31_ONE: i32 = i32::MAX;

/// `0.5` in Q0.31.
pub const Q31_HALF: i32 = 1 << 30;

/// `round(a * b / 2^31)` with the single overflow case saturated.
#[inline]
pub fn saturating_rounding_doubling_high_mul(a: i32, b: i32) -> i32 {
    if a == b && a == i32::MIN {
        return i32::MAX;
    }
    let ab = a as i64 * b as i64;
    let nudge: i64 = if ab >= 0 { 1 << 30 } else { 1 - (1 << 30) };
    ((ab + nudge) / (1i64 << 31)) as i32
}

/// Arithmetic right shift rounding half away from zero.
#[inline]
pub fn rounding_divide_by_pot(x: i32, exponent: i32) -> i32 {
    debug_assert!((0..=31).contains(&exponent));
    let mask = ((1i64 << exponent) - 1) as i32;
    let remainder = x & mask;
    let threshold = (mask >> 1) + i32::from(x < 0);
    (x >> exponent) + i32::from(remainder > threshold)
}

/// Multiplies by `2^exponent`, saturating on overflow for positive
/// exponents and rounding for negative ones.
#[inline]
pub fn saturating_rounding_multiply_by_pot(x: i32, exponent: i32) -> i32 {
    if exponent == 0 {
        x
    } else if exponent < 0 {
        rounding_divide_by_pot(x, -exponent)
    } else {
        let threshold = (1i64 << (31 - exponent)) - 1;
        let wide = x as i64;
        if wide > threshold {
            i32::MAX
        } else if wide < -threshold {
            i32::MIN
        } else {
            x << exponent
        }
    }
}

/// `(a + b) / 2`, rounded half away from zero, without intermediate overflow.
#[inline]
pub fn rounding_half_sum(a: i32, b: i32) -> i32 {
    let sum = a as i64 + b as i64;
    let sign = if sum >= 0 { 1 } else { -1 };
    ((sum + sign) / 2) as i32
}

/// `x * multiplier * 2^(shift - 31)`, the requantization primitive.
#[inline]
pub fn multiply_by_quantized_multiplier(x: i32, multiplier: i32, shift: i32) -> i32 {
    let left_shift = shift.max(0);
    let right_shift = (-shift).max(0);
    let shifted = saturating_rounding_multiply_by_pot(x, left_shift);
    rounding_divide_by_pot(
        saturating_rounding_doubling_high_mul(shifted, multiplier),
        right_shift,
    )
}

#[inline]
fn mul(a: i32, b: i32) -> i32 {
    saturating_rounding_doubling_high_mul(a, b)
}

/// `exp(a)` for Q0.31 `a` in `[-1/4, 0)`, result in Q0.31.
pub fn exp_on_interval_between_negative_one_quarter_and_0_excl(a: i32) -> i32 {
    const EXP_MINUS_ONE_EIGHTH: i32 = 1_895_147_668;
    const ONE_THIRD: i32 = 715_827_883;

    let x = a.wrapping_add(1 << 28);
    let x2 = mul(x, x);
    let x3 = mul(x2, x);
    let x4 = mul(x2, x2);
    let x4_over_4 = saturating_rounding_multiply_by_pot(x4, -2);
    let poly = saturating_rounding_multiply_by_pot(
        mul(x4_over_4.wrapping_add(x3), ONE_THIRD).wrapping_add(x2),
        -1,
    );
    EXP_MINUS_ONE_EIGHTH.wrapping_add(mul(EXP_MINUS_ONE_EIGHTH, x.wrapping_add(poly)))
}

/// `exp(a)` for non-positive `a` with `integer_bits` integer bits; result in Q0.31.
pub fn exp_on_negative_values(a: i32, integer_bits: i32) -> i32 {
    // (exponent k, exp(-2^k) in Q0.31)
    const BARREL: [(i32, i32); 7] = [
        (-2, 1_672_461_947),
        (-1, 1_302_514_674),
        (0, 790_015_084),
        (1, 290_630_308),
        (2, 39_332_535),
        (3, 720_401),
        (4, 242),
    ];

    let fractional_bits = 31 - integer_bits;
    let one_quarter = 1i32 << (fractional_bits - 2);
    let mask = one_quarter - 1;
    let a_mod_quarter_minus_one_quarter = (a & mask) - one_quarter;
    let mut result = exp_on_interval_between_negative_one_quarter_and_0_excl(
        saturating_rounding_multiply_by_pot(a_mod_quarter_minus_one_quarter, integer_bits),
    );
    let remainder = a_mod_quarter_minus_one_quarter.wrapping_sub(a);

    for (exponent, multiplier) in BARREL {
        if integer_bits > exponent {
            let bit = fractional_bits + exponent;
            if remainder & (1i32 << bit) != 0 {
                result = mul(result, multiplier);
            }
        }
    }

    if integer_bits > 5 {
        // Anything below -32 underflows to zero.
        let clamp = -(1i32 << (36 - integer_bits));
        if a < clamp {
            result = 0;
        }
    }
    if a == 0 {
        Q31_ONE
    } else {
        result
    }
}

/// Newton–Raphson iteration for `2 / (1 + a)` in Q2.29, `a` in Q0.31 `[0, 1]`.
fn newton_reciprocal_half_denominator(half_denominator: i32) -> i32 {
    const FORTY_EIGHT_OVER_SEVENTEEN: i32 = 1_515_870_810;
    const NEG_THIRTY_TWO_OVER_SEVENTEEN: i32 = -1_010_580_540;
    const Q2_ONE: i32 = 1 << 29;

    let mut x = FORTY_EIGHT_OVER_SEVENTEEN
        .wrapping_add(mul(half_denominator, NEG_THIRTY_TWO_OVER_SEVENTEEN));
    for _ in 0..3 {
        let half_denominator_times_x = mul(half_denominator, x);
        let one_minus = Q2_ONE.wrapping_sub(half_denominator_times_x);
        x = x.wrapping_add(saturating_rounding_multiply_by_pot(mul(x, one_minus), 2));
    }
    x
}

/// `(1 - a) / (1 + a)` for Q0.31 `a` in `[0, 1]`.
pub fn one_minus_x_over_one_plus_x_for_x_in_0_1(a: i32) -> i32 {
    let half_denominator = rounding_half_sum(a, Q31_ONE);
    let x = newton_reciprocal_half_denominator(half_denominator);
    saturating_rounding_multiply_by_pot(x.wrapping_sub(1 << 29), 2)
}

/// `1 / (1 + a)` for Q0.31 `a` in `[0, 1]`.
pub fn one_over_one_plus_x_for_x_in_0_1(a: i32) -> i32 {
    let half_denominator = rounding_half_sum(a, Q31_ONE);
    let x = newton_reciprocal_half_denominator(half_denominator);
    saturating_rounding_multiply_by_pot(x, 1)
}

/// `tanh(a)` for `a` with `integer_bits` integer bits; result in Q0.31.
pub fn tanh(a: i32, integer_bits: i32) -> i32 {
    if a == 0 {
        return 0;
    }
    let negative_abs = if a < 0 { a } else { a.wrapping_neg() };
    // exp(2 * n): same raw value read with one more integer bit.
    let t = one_minus_x_over_one_plus_x_for_x_in_0_1(exp_on_negative_values(
        negative_abs,
        integer_bits + 1,
    ));
    if a < 0 {
        t.wrapping_neg()
    } else {
        t
    }
}

/// `1 / (1 + exp(-a))` for `a` with `integer_bits` integer bits; result in Q0.31.
pub fn logistic(a: i32, integer_bits: i32) -> i32 {
    if a == 0 {
        return Q31_HALF;
    }
    let abs = if a > 0 { a } else { a.wrapping_neg() };
    let positive =
        one_over_one_plus_x_for_x_in_0_1(exp_on_negative_values(abs.wrapping_neg(), integer_bits));
    if a > 0 {
        positive
    } else {
        Q31_ONE.wrapping_sub(positive)
    }
}
