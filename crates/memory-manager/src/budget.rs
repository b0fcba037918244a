// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Arena size configuration and parsing.
//!
//! A [`MemoryBudget`] is the byte size of the static arena a benchmark
//! declares up front. It parses the human-readable strings used in config
//! files and on the command line.

use crate::MemoryError;
use std::fmt;

const KB: usize = 1024;
const MB: usize = 1024 * KB;
const GB: usize = 1024 * MB;

/// Longest suffixes first so `"KB"` wins over `"B"`.
const SUFFIXES: [(&str, usize); 7] = [
    ("GB", GB),
    ("MB", MB),
    ("KB", KB),
    ("G", GB),
    ("M", MB),
    ("K", KB),
    ("B", 1),
];

/// The size of a statically declared arena.
///
/// # Parsing
/// Supports human-readable strings with binary suffixes:
/// - `"21K"` or `"21KB"` → 21 × 1024 bytes
/// - `"1M"` or `"1MB"` → 1024² bytes
/// - `"1G"` or `"1GB"` → 1024³ bytes
/// - `"4096"` → raw byte count
///
/// # Examples
/// ```
/// use memory_manager::MemoryBudget;
///
/// let b = MemoryBudget::parse("21K").unwrap();
/// assert_eq!(b.as_bytes(), 21 * 1024);
///
/// let b = MemoryBudget::from_kb(136);
/// assert_eq!(b.to_string(), "136 KB");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemoryBudget {
    /// Size in bytes.
    bytes: usize,
}

impl MemoryBudget {
    /// Creates a budget from a byte count.
    pub fn from_bytes(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Creates a budget from kilobytes.
    pub fn from_kb(kb: usize) -> Self {
        Self { bytes: kb * KB }
    }

    /// Creates a budget from megabytes.
    pub fn from_mb(mb: usize) -> Self {
        Self { bytes: mb * MB }
    }

    /// Returns the budget in bytes.
    pub fn as_bytes(&self) -> usize {
        self.bytes
    }

    /// Returns the budget in kilobytes (truncated).
    pub fn as_kb(&self) -> usize {
        self.bytes / KB
    }

    /// Parses a human-readable size string. Case-insensitive.
    pub fn parse(s: &str) -> Result<Self, MemoryError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MemoryError::ZeroSizedAllocation);
        }

        let upper = trimmed.to_ascii_uppercase();
        let (num_str, multiplier) = SUFFIXES
            .iter()
            .find(|(suffix, _)| upper.ends_with(suffix))
            .map(|(suffix, mult)| (&trimmed[..trimmed.len() - suffix.len()], *mult))
            .unwrap_or((trimmed, 1));

        let value: usize = num_str
            .trim()
            .parse()
            .map_err(|_| MemoryError::InvalidBudget(trimmed.to_string()))?;
        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| MemoryError::InvalidBudget(trimmed.to_string()))?;

        if bytes == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }
        Ok(Self { bytes })
    }
}

impl std::str::FromStr for MemoryBudget {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MemoryBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bytes {
            b if b >= GB && b % GB == 0 => write!(f, "{} GB", b / GB),
            b if b >= MB && b % MB == 0 => write!(f, "{} MB", b / MB),
            b if b >= KB && b % KB == 0 => write!(f, "{} KB", b / KB),
            b => write!(f, "{b} B"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kilobytes() {
        assert_eq!(MemoryBudget::parse("21K").unwrap().as_bytes(), 21 * 1024);
        assert_eq!(MemoryBudget::parse("136kb").unwrap().as_kb(), 136);
    }

    #[test]
    fn test_parse_larger_units() {
        assert_eq!(MemoryBudget::parse("1M").unwrap().as_bytes(), 1024 * 1024);
        assert_eq!(MemoryBudget::parse("1GB").unwrap().as_bytes(), 1 << 30);
    }

    #[test]
    fn test_parse_raw_bytes_and_whitespace() {
        assert_eq!(MemoryBudget::parse("4096").unwrap().as_bytes(), 4096);
        assert_eq!(MemoryBudget::parse("  512B ").unwrap().as_bytes(), 512);
        assert_eq!("8K".parse::<MemoryBudget>().unwrap(), MemoryBudget::from_kb(8));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(MemoryBudget::parse(""), Err(MemoryError::ZeroSizedAllocation)));
        assert!(matches!(MemoryBudget::parse("abc"), Err(MemoryError::InvalidBudget(_))));
        assert!(MemoryBudget::parse("0K").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(MemoryBudget::from_mb(1).to_string(), "1 MB");
        assert_eq!(MemoryBudget::from_kb(21).to_string(), "21 KB");
        assert_eq!(MemoryBudget::from_bytes(100).to_string(), "100 B");
    }

    #[test]
    fn test_serde_roundtrip() {
        let b = MemoryBudget::from_kb(21);
        let json = serde_json::to_string(&b).unwrap();
        let back: MemoryBudget = serde_json::from_str(&json).unwrap();
        assert_eq!(b, back);
    }
}
