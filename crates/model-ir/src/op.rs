// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor and operator definitions for the model IR.
//!
//! A [`TensorDef`] describes one tensor's element type, shape and
//! quantization; an [`OperatorDescriptor`] names the kernel to run and
//! which tensors it reads and writes, by index into the graph's tensor
//! table. Neither owns any data: tensor bytes live in the arena.

use tensor_core::{DType, QuantParams, Shape};

/// The operator vocabulary.
///
/// Every kind can appear in a model, but only those registered with the
/// runtime's op registry can be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Tanh,
    Logistic,
    Softmax,
    Reshape,
    FullyConnected,
    Quantize,
    Svdf,
    Conv2d,
    LeakyRelu,
}

impl OpKind {
    /// Number of kinds; sizes the registry slot table.
    pub const COUNT: usize = 9;

    /// Every kind, in slot order.
    pub const ALL: [OpKind; Self::COUNT] = [
        OpKind::Tanh,
        OpKind::Logistic,
        OpKind::Softmax,
        OpKind::Reshape,
        OpKind::FullyConnected,
        OpKind::Quantize,
        OpKind::Svdf,
        OpKind::Conv2d,
        OpKind::LeakyRelu,
    ];

    /// Dense slot index in `0..COUNT`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Parses an operator type from a manifest string.
    ///
    /// Accepts snake_case (`"fully_connected"`) as well as the upper-case
    /// builtin names used by model converters (`"FULLY_CONNECTED"`,
    /// `"SIGMOID"`, ...).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tanh" => Some(Self::Tanh),
            "logistic" | "sigmoid" => Some(Self::Logistic),
            "softmax" => Some(Self::Softmax),
            "reshape" => Some(Self::Reshape),
            "fully_connected" | "fc" | "dense" => Some(Self::FullyConnected),
            "quantize" => Some(Self::Quantize),
            "svdf" => Some(Self::Svdf),
            "conv_2d" | "conv2d" => Some(Self::Conv2d),
            "leaky_relu" | "leakyrelu" => Some(Self::LeakyRelu),
            _ => None,
        }
    }

    /// Label used in logs and profiler events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tanh => "TANH",
            Self::Logistic => "LOGISTIC",
            Self::Softmax => "SOFTMAX",
            Self::Reshape => "RESHAPE",
            Self::FullyConnected => "FULLY_CONNECTED",
            Self::Quantize => "QUANTIZE",
            Self::Svdf => "SVDF",
            Self::Conv2d => "CONV_2D",
            Self::LeakyRelu => "LEAKY_RELU",
        }
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tensor of the model.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TensorDef {
    pub name: String,
    pub dtype: DType,
    pub shape: Shape,
    /// `None` for float tensors.
    #[serde(default)]
    pub quantization: Option<QuantParams>,
}

impl TensorDef {
    pub fn new(name: impl Into<String>, dtype: DType, shape: Shape) -> Self {
        Self {
            name: name.into(),
            dtype,
            shape,
            quantization: None,
        }
    }

    pub fn with_quant(mut self, quant: QuantParams) -> Self {
        self.quantization = Some(quant);
        self
    }

    /// Bytes of arena this tensor occupies (before alignment).
    pub fn size_bytes(&self) -> usize {
        self.shape.size_bytes(self.dtype)
    }
}

/// Builtin options; only softmax reads any today.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OpOptions {
    #[serde(default = "default_beta")]
    pub beta: f32,
}

fn default_beta() -> f32 {
    1.0
}

impl Default for OpOptions {
    fn default() -> Self {
        Self { beta: 1.0 }
    }
}

/// One node of the graph: which kernel, which tensors.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OperatorDescriptor {
    pub name: String,
    pub kind: OpKind,
    /// Indices into the graph's tensor table.
    pub inputs: Vec<usize>,
    pub output: usize,
    #[serde(default)]
    pub options: OpOptions,
}

impl OperatorDescriptor {
    pub fn new(name: impl Into<String>, kind: OpKind, inputs: Vec<usize>, output: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            inputs,
            output,
            options: OpOptions::default(),
        }
    }

    /// The first input; every kernel in the vocabulary has one.
    pub fn primary_input(&self) -> Option<usize> {
        self.inputs.first().copied()
    }

    /// Returns a concise summary string for display.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}) inputs {:?} -> {}",
            self.name, self.kind, self.inputs, self.output
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all() {
        for (i, kind) in OpKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_from_str_loose() {
        assert_eq!(OpKind::from_str_loose("SIGMOID"), Some(OpKind::Logistic));
        assert_eq!(OpKind::from_str_loose("fully_connected"), Some(OpKind::FullyConnected));
        assert_eq!(OpKind::from_str_loose("CONV_2D"), Some(OpKind::Conv2d));
        assert_eq!(OpKind::from_str_loose("bogus"), None);
    }

    #[test]
    fn test_tensor_size() {
        let t = TensorDef::new("x", DType::I16, Shape::matrix(1, 10));
        assert_eq!(t.size_bytes(), 20);
    }

    #[test]
    fn test_options_default_beta() {
        let op: OperatorDescriptor =
            serde_json::from_str(r#"{"name":"s","kind":"softmax","inputs":[0],"output":1}"#).unwrap();
        assert_eq!(op.options.beta, 1.0);
        assert_eq!(op.summary(), "s (SOFTMAX) inputs [0] -> 1");
    }
}
