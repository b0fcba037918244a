// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for arena management.

/// Errors that can occur while carving up the arena.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// The requested reservation does not fit in the remaining arena.
    #[error("out of memory: requested {requested_bytes} bytes, but only {available_bytes} available (arena: {capacity_bytes})")]
    OutOfMemory {
        requested_bytes: usize,
        available_bytes: usize,
        capacity_bytes: usize,
    },

    /// Attempted to allocate a zero-sized persistent block.
    #[error("cannot allocate zero-sized buffer")]
    ZeroSizedAllocation,

    /// The layout was sealed by a successful setup; reset before reserving again.
    #[error("arena is sealed; reset it before binding a new model")]
    Sealed,

    /// The tensor or scratch region was already reserved for this binding.
    #[error("{region} region already reserved")]
    AlreadyReserved { region: &'static str },

    /// A region lies outside the arena.
    #[error("region [{offset}, +{len}) lies outside the {capacity_bytes}-byte arena")]
    InvalidRegion {
        offset: usize,
        len: usize,
        capacity_bytes: usize,
    },

    /// Two regions requested for simultaneous mutable access overlap.
    #[error("regions starting at {first} and {second} overlap")]
    OverlappingRegions { first: usize, second: usize },

    /// A size string could not be parsed.
    #[error("invalid size string '{0}': expected a number followed by an optional suffix (K, M, G)")]
    InvalidBudget(String),
}
