// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Static arena over caller-supplied storage.
//!
//! The arena never grows and never frees individual blocks. Its layout is
//!
//! ```text
//! 0                                                         capacity
//! | tensor region | scratch region | ....... free ....... | persistent |
//!   head ─────────────────────────►           ◄────────────────── tail
//! ```
//!
//! Activation tensors and the shared scratch region are reserved from the
//! head once per model binding. Per-operator persistent blocks are carved
//! from the tail downward and live until [`Arena::reset`]. Every operator's
//! scratch starts at the same offset, so scratch is reclaimed implicitly
//! after each call and its size is the largest single request.
//!
//! All offsets are relative to the 16-byte aligned start of the storage and
//! are themselves multiples of [`ARENA_ALIGN`].

use crate::{ArenaStats, MemoryBudget, MemoryError};
use bytemuck::{Pod, Zeroable};

/// Alignment of the arena start and of every region within it.
pub const ARENA_ALIGN: usize = 16;

/// Rounds `n` up to the next multiple of `align` (a power of two).
#[inline]
pub fn align_up(n: usize, align: usize) -> usize {
    (n + align - 1) & !(align - 1)
}

/// Total arena bytes a binding needs, including alignment padding.
///
/// This is the dry-run counterpart of the reservations below: if a layout
/// fits in `required_bytes(..)`, the real reservations cannot fail.
pub fn required_bytes(
    tensor_bytes: usize,
    scratch_bytes: usize,
    persistent: impl IntoIterator<Item = usize>,
) -> usize {
    align_up(tensor_bytes, ARENA_ALIGN)
        + align_up(scratch_bytes, ARENA_ALIGN)
        + persistent
            .into_iter()
            .map(|b| align_up(b, ARENA_ALIGN))
            .sum::<usize>()
}

/// A byte range inside the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ArenaRegion {
    pub offset: usize,
    pub len: usize,
}

impl ArenaRegion {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Sub-range relative to this region's start.
    pub fn slice(&self, offset: usize, len: usize) -> Self {
        debug_assert!(offset + len <= self.len);
        Self {
            offset: self.offset + offset,
            len,
        }
    }

    /// `true` if both regions are non-empty and share a byte.
    pub fn overlaps(&self, other: &ArenaRegion) -> bool {
        self.len > 0 && other.len > 0 && self.offset < other.end() && other.offset < self.end()
    }
}

#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C, align(16))]
struct Block([u8; ARENA_ALIGN]);

/// Owned, 16-byte aligned backing storage for an [`Arena`].
///
/// This is the Rust spelling of `alignas(16) uint8_t tensor_arena[N]`:
/// declared once by the caller, lent to the arena for the lifetime of a
/// runner.
pub struct ArenaBuffer {
    blocks: Vec<Block>,
    len: usize,
}

impl ArenaBuffer {
    /// Allocates `len` zeroed bytes.
    pub fn new(len: usize) -> Self {
        Self {
            blocks: vec![Block::zeroed(); len.div_ceil(ARENA_ALIGN)],
            len,
        }
    }

    pub fn with_budget(budget: MemoryBudget) -> Self {
        Self::new(budget.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut::<Block, u8>(&mut self.blocks)[..self.len]
    }

    /// Lends the storage to a fresh arena.
    pub fn arena(&mut self) -> Arena<'_> {
        Arena::new(self.as_mut_slice())
    }
}

impl std::fmt::Debug for ArenaBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaBuffer").field("len", &self.len).finish()
    }
}

/// The static arena allocator.
///
/// # Example
/// ```
/// use memory_manager::ArenaBuffer;
///
/// let mut storage = ArenaBuffer::new(1024);
/// let mut arena = storage.arena();
/// let tensors = arena.reserve_tensor_region(300).unwrap();
/// let scratch = arena.reserve_scratch(64).unwrap();
/// let op_data = arena.allocate_persistent(20).unwrap();
/// arena.seal();
///
/// assert_eq!(tensors.offset, 0);
/// assert_eq!(scratch.offset, 304);
/// assert_eq!(op_data.end(), 1024);
/// assert!(arena.reserve_scratch(16).is_err());
/// ```
pub struct Arena<'a> {
    storage: &'a mut [u8],
    tensor: Option<ArenaRegion>,
    scratch: Option<ArenaRegion>,
    /// Start of the persistent area; persistent blocks occupy `[tail, capacity)`.
    tail: usize,
    sealed: bool,
    stats: ArenaStats,
}

impl<'a> Arena<'a> {
    /// Wraps `storage`, skipping leading bytes until the start is aligned
    /// and trimming the end to a multiple of [`ARENA_ALIGN`].
    pub fn new(storage: &'a mut [u8]) -> Self {
        let skip = storage.as_ptr().align_offset(ARENA_ALIGN).min(storage.len());
        let usable = (storage.len() - skip) & !(ARENA_ALIGN - 1);
        let storage = &mut storage[skip..skip + usable];
        let capacity = storage.len();
        Self {
            storage,
            tensor: None,
            scratch: None,
            tail: capacity,
            sealed: false,
            stats: ArenaStats::new(capacity),
        }
    }

    /// Usable bytes after alignment.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// End of the head reservations.
    fn head(&self) -> usize {
        self.scratch
            .or(self.tensor)
            .map(|r| r.end())
            .unwrap_or(0)
    }

    /// Bytes between the head and the persistent tail.
    pub fn available(&self) -> usize {
        self.tail - self.head()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn stats(&self) -> &ArenaStats {
        &self.stats
    }

    pub fn tensor_region(&self) -> Option<ArenaRegion> {
        self.tensor
    }

    pub fn scratch_region(&self) -> Option<ArenaRegion> {
        self.scratch
    }

    fn ensure_unsealed(&self) -> Result<(), MemoryError> {
        if self.sealed {
            return Err(MemoryError::Sealed);
        }
        Ok(())
    }

    fn out_of_memory(&mut self, requested_bytes: usize) -> MemoryError {
        self.stats.record_oom();
        MemoryError::OutOfMemory {
            requested_bytes,
            available_bytes: self.available(),
            capacity_bytes: self.capacity(),
        }
    }

    fn reserve_head(&mut self, bytes: usize) -> Result<ArenaRegion, MemoryError> {
        let size = align_up(bytes, ARENA_ALIGN);
        if size > self.available() {
            return Err(self.out_of_memory(bytes));
        }
        Ok(ArenaRegion::new(self.head(), size))
    }

    /// Reserves the head region that holds every activation tensor.
    ///
    /// Must precede [`reserve_scratch`](Self::reserve_scratch).
    pub fn reserve_tensor_region(&mut self, bytes: usize) -> Result<ArenaRegion, MemoryError> {
        self.ensure_unsealed()?;
        if self.tensor.is_some() || self.scratch.is_some() {
            return Err(MemoryError::AlreadyReserved { region: "tensor" });
        }
        let region = self.reserve_head(bytes)?;
        self.tensor = Some(region);
        self.stats.tensor_bytes = region.len;
        Ok(region)
    }

    /// Reserves the scratch region shared by every operator.
    pub fn reserve_scratch(&mut self, bytes: usize) -> Result<ArenaRegion, MemoryError> {
        self.ensure_unsealed()?;
        if self.scratch.is_some() {
            return Err(MemoryError::AlreadyReserved { region: "scratch" });
        }
        let region = self.reserve_head(bytes)?;
        self.scratch = Some(region);
        self.stats.scratch_reserved_bytes = region.len;
        Ok(region)
    }

    /// Carves a block from the tail that lives until the next reset.
    pub fn allocate_persistent(&mut self, bytes: usize) -> Result<ArenaRegion, MemoryError> {
        self.ensure_unsealed()?;
        if bytes == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }
        let size = align_up(bytes, ARENA_ALIGN);
        if size > self.available() {
            return Err(self.out_of_memory(bytes));
        }
        self.tail -= size;
        self.stats.record_persistent(size);
        Ok(ArenaRegion::new(self.tail, size))
    }

    /// Freezes the layout. Later reservations fail with [`MemoryError::Sealed`].
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Drops every reservation so a new model can be bound.
    pub fn reset(&mut self) {
        self.tensor = None;
        self.scratch = None;
        self.tail = self.capacity();
        self.sealed = false;
        self.stats = ArenaStats::new(self.capacity());
    }

    /// Records that one operator call used `bytes` of the scratch region.
    pub fn note_scratch_use(&mut self, bytes: usize) -> Result<(), MemoryError> {
        let reserved = self.scratch.map(|r| r.len).unwrap_or(0);
        if bytes > reserved {
            return Err(MemoryError::OutOfMemory {
                requested_bytes: bytes,
                available_bytes: reserved,
                capacity_bytes: self.capacity(),
            });
        }
        self.stats.update_scratch_peak(bytes);
        Ok(())
    }

    fn check_bounds(&self, region: ArenaRegion) -> Result<(), MemoryError> {
        if region.end() > self.capacity() {
            return Err(MemoryError::InvalidRegion {
                offset: region.offset,
                len: region.len,
                capacity_bytes: self.capacity(),
            });
        }
        Ok(())
    }

    pub fn bytes(&self, region: ArenaRegion) -> Result<&[u8], MemoryError> {
        self.check_bounds(region)?;
        Ok(&self.storage[region.offset..region.end()])
    }

    pub fn bytes_mut(&mut self, region: ArenaRegion) -> Result<&mut [u8], MemoryError> {
        self.check_bounds(region)?;
        Ok(&mut self.storage[region.offset..region.end()])
    }

    /// Borrows `N` pairwise-disjoint regions mutably at once, in the order
    /// given. Empty regions never conflict.
    pub fn split_mut<const N: usize>(
        &mut self,
        regions: [ArenaRegion; N],
    ) -> Result<[&mut [u8]; N], MemoryError> {
        for r in &regions {
            self.check_bounds(*r)?;
        }
        let mut order: [usize; N] = std::array::from_fn(|i| i);
        order.sort_unstable_by_key(|&i| (regions[i].offset, regions[i].len));
        let mut prev: Option<ArenaRegion> = None;
        for &i in &order {
            let r = regions[i];
            if r.len == 0 {
                continue;
            }
            if let Some(p) = prev {
                if p.overlaps(&r) {
                    return Err(MemoryError::OverlappingRegions {
                        first: p.offset,
                        second: r.offset,
                    });
                }
            }
            prev = Some(r);
        }

        let mut out: [&mut [u8]; N] = std::array::from_fn(|_| Default::default());
        let mut rest: &mut [u8] = &mut *self.storage;
        let mut consumed = 0;
        for &i in &order {
            let r = regions[i];
            if r.len == 0 {
                continue;
            }
            let tail = std::mem::take(&mut rest);
            let (_, tail) = tail.split_at_mut(r.offset - consumed);
            let (piece, tail) = tail.split_at_mut(r.len);
            out[i] = piece;
            rest = tail;
            consumed = r.end();
        }
        Ok(out)
    }
}

impl std::fmt::Debug for Arena<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("tensor", &self.tensor)
            .field("scratch", &self.scratch)
            .field("tail", &self.tail)
            .field("sealed", &self.sealed)
            .finish()
    }
}
