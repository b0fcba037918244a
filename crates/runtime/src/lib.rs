// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # runtime
//!
//! Executes a fixed operator graph inside a pre-sized arena and profiles it.
//!
//! The runtime takes:
//! - A validated `ModelGraph` from `model-ir`.
//! - An [`OpRegistry`] mapping operator kinds to [`OpKernel`]s.
//! - An `Arena` from `memory-manager` over caller-declared storage.
//!
//! and binds them once in [`Runner::setup`]. After setup no allocation
//! happens: every iteration reads and writes arena bytes only, and each
//! operator call is timed by a [`Profiler`].
//!
//! # Type-State Pipeline
//! ```text
//! Runner<Constructed> → Runner<Ready>
//! ```
//! Running an unbound model is a compile error.
//!
//! # Benchmarking
//! [`run_iterations`] drives the usual loop: reseed inputs, clear
//! profiler events, run one iteration, accumulate ticks.

mod config;
mod error;
mod harness;
pub mod kernels;
pub mod profiler;
mod registry;
pub mod runner;

pub use config::BenchmarkConfig;
pub use error::{RegistryError, RuntimeError};
pub use harness::{run_iterations, BenchmarkReport};
pub use kernels::{KernelIo, OpKernel};
pub use profiler::{
    ticks_to_ms, EventHandle, ManualClock, MonotonicClock, ProfileEvent, Profiler, TagTotal,
    TickSource, MAX_EVENTS,
};
pub use registry::OpRegistry;
pub use runner::{Constructed, Ready, Runner, RunnerState, SetupReport};
