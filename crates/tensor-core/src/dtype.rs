// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Supported tensor element data types.

/// Enumerates the element types a tensor can hold.
///
/// Kernels dispatch on `DType` once per call. `I32` is part of the vocabulary
/// so that models declaring it load and bind, but no activation kernel
/// computes on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 32-bit IEEE 754 floating point.
    F32,
    /// 8-bit signed integer, asymmetric quantization.
    I8,
    /// 8-bit unsigned integer, asymmetric quantization.
    U8,
    /// 16-bit signed integer, symmetric power-of-two quantization.
    I16,
    /// 32-bit signed integer (bias and index tensors).
    I32,
}

impl DType {
    /// Returns the size of a single element in bytes.
    pub fn size_bytes(self) -> usize {
        match self {
            DType::F32 | DType::I32 => 4,
            DType::I16 => 2,
            DType::I8 | DType::U8 => 1,
        }
    }

    /// Returns a human-readable label for this data type.
    pub fn as_str(self) -> &'static str {
        match self {
            DType::F32 => "f32",
            DType::I8 => "i8",
            DType::U8 => "u8",
            DType::I16 => "i16",
            DType::I32 => "i32",
        }
    }

    /// `true` for the integer types that carry quantization parameters.
    pub fn is_quantized(self) -> bool {
        matches!(self, DType::I8 | DType::U8 | DType::I16)
    }

    /// Inclusive value range of the quantized types, which bounds their
    /// zero point.
    pub fn quantized_range(self) -> Option<(i32, i32)> {
        match self {
            DType::I8 => Some((i8::MIN as i32, i8::MAX as i32)),
            DType::U8 => Some((u8::MIN as i32, u8::MAX as i32)),
            DType::I16 => Some((i16::MIN as i32, i16::MAX as i32)),
            DType::F32 | DType::I32 => None,
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        assert_eq!(DType::F32.size_bytes(), 4);
        assert_eq!(DType::I16.size_bytes(), 2);
        assert_eq!(DType::U8.size_bytes(), 1);
    }

    #[test]
    fn test_serde_lowercase() {
        let d: DType = serde_json::from_str("\"i16\"").unwrap();
        assert_eq!(d, DType::I16);
        assert_eq!(serde_json::to_string(&DType::U8).unwrap(), "\"u8\"");
    }

    #[test]
    fn test_quantized_flag() {
        assert!(DType::I8.is_quantized());
        assert!(!DType::F32.is_quantized());
        assert!(!DType::I32.is_quantized());
    }
}
