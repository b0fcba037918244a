// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for model loading and IR construction.

/// Errors that can occur when working with model representations.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The model manifest file could not be read.
    #[error("failed to read manifest: {0}")]
    ManifestReadError(#[from] std::io::Error),

    /// The manifest JSON is malformed.
    #[error("failed to parse manifest: {0}")]
    ManifestParseError(#[from] serde_json::Error),

    /// An operator or graph endpoint names a tensor that does not exist.
    #[error("'{referenced_by}' references unknown tensor '{tensor}'")]
    UnknownTensor {
        referenced_by: String,
        tensor: String,
    },

    /// An operator type string is not in the operator vocabulary.
    #[error("operator '{name}' has unrecognised type '{op}'")]
    UnknownOperator { name: String, op: String },

    /// A tensor definition is invalid (zero-sized, bad dtype, ...).
    #[error("invalid tensor '{tensor}': {detail}")]
    InvalidTensor { tensor: String, detail: String },

    /// An operator definition is invalid.
    #[error("invalid operator '{op}': {detail}")]
    InvalidOperator { op: String, detail: String },

    /// The model graph is empty, out of order or otherwise malformed.
    #[error("invalid model graph: {0}")]
    InvalidGraph(String),
}
