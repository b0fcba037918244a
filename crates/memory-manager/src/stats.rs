// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Arena usage statistics for profiling and diagnostics.
//!
//! [`ArenaStats`] records how the arena was carved up for the current model
//! binding. These numbers are what a benchmark reports when tuning the
//! arena size down to the minimum a model needs.

/// Usage of one arena binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ArenaStats {
    /// Usable capacity after alignment.
    pub capacity_bytes: usize,
    /// Size of the head region holding activation tensors.
    pub tensor_bytes: usize,
    /// Size of the shared scratch region.
    pub scratch_reserved_bytes: usize,
    /// Largest single scratch request seen.
    pub scratch_peak_bytes: usize,
    /// Bytes carved from the tail for persistent blocks.
    pub persistent_bytes: usize,
    /// Number of persistent blocks.
    pub persistent_allocations: u64,
    /// Reservations refused for lack of space.
    pub oom_count: u64,
}

impl ArenaStats {
    pub(crate) fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            ..Self::default()
        }
    }

    pub(crate) fn record_persistent(&mut self, size: usize) {
        self.persistent_allocations += 1;
        self.persistent_bytes += size;
    }

    pub(crate) fn record_oom(&mut self) {
        self.oom_count += 1;
    }

    /// Updates the scratch high-water mark if needed.
    pub(crate) fn update_scratch_peak(&mut self, bytes: usize) {
        if bytes > self.scratch_peak_bytes {
            self.scratch_peak_bytes = bytes;
        }
    }

    /// Bytes reserved by all three kinds of region.
    pub fn used_bytes(&self) -> usize {
        self.tensor_bytes + self.scratch_reserved_bytes + self.persistent_bytes
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Arena: {} / {} bytes used (tensors {}, scratch {} reserved / {} peak, \
             persistent {} in {} blocks), {} OOMs",
            self.used_bytes(),
            self.capacity_bytes,
            self.tensor_bytes,
            self.scratch_reserved_bytes,
            self.scratch_peak_bytes,
            self.persistent_bytes,
            self.persistent_allocations,
            self.oom_count,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let s = ArenaStats::new(1024);
        assert_eq!(s.capacity_bytes, 1024);
        assert_eq!(s.used_bytes(), 0);
    }

    #[test]
    fn test_scratch_peak_never_decreases() {
        let mut s = ArenaStats::default();
        s.update_scratch_peak(100);
        s.update_scratch_peak(50);
        assert_eq!(s.scratch_peak_bytes, 100);
        s.update_scratch_peak(200);
        assert_eq!(s.scratch_peak_bytes, 200);
    }

    #[test]
    fn test_summary() {
        let mut s = ArenaStats::new(4096);
        s.tensor_bytes = 1024;
        s.record_persistent(32);
        s.record_persistent(288);
        let summary = s.summary();
        assert!(summary.contains("1344 / 4096"));
        assert!(summary.contains("persistent 320 in 2 blocks"));
    }
}
