// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Repeated-iteration benchmark loop.

use crate::profiler::{ticks_to_ms, Profiler, TickSource};
use crate::runner::{Ready, Runner};
use crate::RuntimeError;

/// Outcome of [`run_iterations`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BenchmarkReport {
    pub tag: String,
    pub iterations: u32,
    /// Ticks summed over every iteration.
    pub total_ticks: u64,
    pub ticks_per_second: u64,
}

impl BenchmarkReport {
    pub fn average_ticks(&self) -> u64 {
        match self.iterations {
            0 => 0,
            n => self.total_ticks / u64::from(n),
        }
    }

    pub fn total_ms(&self) -> u64 {
        ticks_to_ms(self.total_ticks, self.ticks_per_second)
    }
}

impl std::fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} took {} ticks or ({} ms)",
            self.tag,
            self.total_ticks,
            self.total_ms()
        )
    }
}

/// Runs `iterations` inferences, reseeding the inputs with the iteration
/// index each time.
///
/// Events are cleared before every iteration, so after the call the
/// profiler holds exactly the per-op events of the last iteration.
///
/// # Errors
/// The first failing iteration aborts the loop.
pub fn run_iterations<C: TickSource>(
    runner: &mut Runner<'_, Ready>,
    profiler: &mut Profiler<C>,
    iterations: u32,
    tag: &str,
) -> Result<BenchmarkReport, RuntimeError> {
    let mut total_ticks = 0u64;
    for i in 0..iterations {
        runner.set_random_input(u64::from(i))?;
        profiler.clear_events();
        runner.run_single_iteration(profiler)?;
        total_ticks += profiler.total_ticks();
    }

    let report = BenchmarkReport {
        tag: tag.to_string(),
        iterations,
        total_ticks,
        ticks_per_second: profiler.ticks_per_second(),
    };
    tracing::debug!("{report} over {iterations} iterations");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(total_ticks: u64, iterations: u32) -> BenchmarkReport {
        BenchmarkReport {
            tag: "NoOp".into(),
            iterations,
            total_ticks,
            ticks_per_second: 1_000_000,
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            report(2_500_000, 10).to_string(),
            "NoOp took 2500000 ticks or (2500 ms)"
        );
    }

    #[test]
    fn test_average() {
        assert_eq!(report(1000, 10).average_ticks(), 100);
        assert_eq!(report(1000, 0).average_ticks(), 0);
    }
}
