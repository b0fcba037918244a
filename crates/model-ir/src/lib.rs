// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-ir
//!
//! A minimal, read-only intermediate representation for fixed operator
//! graphs. It captures only what the static-arena runner needs:
//!
//! - [`OpKind`]: the operator vocabulary.
//! - [`TensorDef`]: one tensor's dtype, shape and quantization.
//! - [`OperatorDescriptor`]: which kernel runs over which tensors.
//! - [`ModelGraph`]: tensors plus operators in execution order, with a
//!   **type-state pattern** (`Loaded` → `Validated`).
//! - [`ModelLoader`]: loads models from a JSON manifest.
//! - [`ModelManifest`]: the JSON model descriptor.
//!
//! # Example
//! ```no_run
//! use model_ir::ModelLoader;
//! use std::path::Path;
//!
//! let graph = ModelLoader::load(Path::new("./models/kws_head.json")).unwrap();
//! println!("{}", graph.summary());
//! for op in graph.iter_operators() {
//!     println!("  {}", op.summary());
//! }
//! ```

mod error;
pub mod graph;
mod loader;
pub mod manifest;
mod op;

pub use error::ModelError;
pub use graph::{ModelGraph, TensorLifetime};
pub use loader::ModelLoader;
pub use manifest::ModelManifest;
pub use op::{OpKind, OpOptions, OperatorDescriptor, TensorDef};
