// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # memory-manager
//!
//! A static arena allocator for inference on memory-constrained devices.
//! The whole working set of a model (activation tensors, per-operator
//! scratch and per-operator persistent data) lives in one byte region
//! whose size is fixed before the model is bound.
//!
//! # Key Components
//!
//! - [`MemoryBudget`]: the arena size, with human-readable parsing
//!   (`"21K"`, `"1M"`, etc.).
//! - [`ArenaBuffer`]: owned, 16-byte aligned storage declared by the caller.
//! - [`Arena`]: carves tensor, scratch and persistent regions out of the
//!   storage and hands out disjoint mutable views per operator call.
//! - [`ArenaStats`]: what the current binding uses (peak scratch, persistent
//!   bytes, OOM count).
//!
//! # Ownership Model
//!
//! ```text
//! ArenaBuffer (owned, aligned)
//!       │  &mut [u8]
//!       ▼
//!   Arena<'a>  ── reserve_* / allocate_persistent ──► ArenaRegion { offset, len }
//!       │
//!       │  split_mut([regions; N])
//!       ▼
//!   [&mut [u8]; N]   (one operator call)
//! ```
//!
//! Regions are plain offsets, so the arena can hand out fresh disjoint
//! borrows for every operator without any unsafe aliasing.
//!
//! # Example
//! ```
//! use memory_manager::{ArenaBuffer, MemoryBudget};
//!
//! let mut storage = ArenaBuffer::with_budget(MemoryBudget::parse("4K").unwrap());
//! let mut arena = storage.arena();
//! let tensors = arena.reserve_tensor_region(1000).unwrap();
//! let block = arena.allocate_persistent(288).unwrap();
//! let [t, b] = arena.split_mut([tensors, block]).unwrap();
//! t[0] = 1;
//! b[0] = 2;
//! assert_eq!(arena.stats().persistent_allocations, 1);
//! ```

pub mod arena;
mod budget;
mod error;
mod stats;

pub use arena::{required_bytes, Arena, ArenaBuffer, ArenaRegion, ARENA_ALIGN};
pub use budget::MemoryBudget;
pub use error::MemoryError;
pub use stats::ArenaStats;
