// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `micro-rt models` command: list the compiled-in models.

use crate::models::{describe, resolve, BUILTIN_MODELS};

pub fn execute() -> anyhow::Result<()> {
    println!("  {:<18} {:>4} {:>9}  {}", "Name", "Ops", "Bytes", "Description");
    println!("  {}", "-".repeat(72));
    for model in BUILTIN_MODELS {
        let graph = resolve(model.name)?;
        println!(
            "  {:<18} {:>4} {:>9}  {}",
            model.name,
            graph.num_operators(),
            graph.total_tensor_bytes(),
            describe(model)?,
        );
    }
    Ok(())
}
