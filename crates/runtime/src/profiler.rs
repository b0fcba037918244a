// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tick-based event profiler.
//!
//! A [`Profiler`] records labelled `(start, end)` tick pairs in a list whose
//! capacity is fixed at construction. The runner opens one event per
//! operator; callers may wrap whole phases (initialization, an iteration
//! loop) in outer events. Events nest, and must be closed innermost first.
//!
//! Ticks come from a [`TickSource`]. [`MonotonicClock`] reads
//! [`std::time::Instant`] and scales to a configurable tick rate;
//! [`ManualClock`] is fully deterministic for tests.

use std::time::Instant;

/// Maximum number of events a profiler holds between clears.
pub const MAX_EVENTS: usize = 1024;

/// Default tick rate: one tick per microsecond.
pub const DEFAULT_TICKS_PER_SECOND: u64 = 1_000_000;

/// A monotonic tick counter.
pub trait TickSource {
    /// Current tick count.
    fn ticks(&mut self) -> u64;

    fn ticks_per_second(&self) -> u64;
}

/// Wall-clock ticks since construction.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
    ticks_per_second: u64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::with_rate(DEFAULT_TICKS_PER_SECOND)
    }

    /// A clock that reports `ticks_per_second` ticks per elapsed second.
    pub fn with_rate(ticks_per_second: u64) -> Self {
        Self {
            origin: Instant::now(),
            ticks_per_second,
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for MonotonicClock {
    fn ticks(&mut self) -> u64 {
        let nanos = self.origin.elapsed().as_nanos();
        let ticks = nanos * u128::from(self.ticks_per_second) / 1_000_000_000;
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }

    fn ticks_per_second(&self) -> u64 {
        self.ticks_per_second
    }
}

/// A clock that only moves when told to.
///
/// Every read returns the current value and then advances it by `step`,
/// so each event has a predictable, non-zero duration.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: u64,
    step: u64,
    ticks_per_second: u64,
}

impl ManualClock {
    /// Starts at tick 0 and advances `step` ticks per read.
    pub fn new(step: u64) -> Self {
        Self {
            now: 0,
            step,
            ticks_per_second: DEFAULT_TICKS_PER_SECOND,
        }
    }

    pub fn with_rate(mut self, ticks_per_second: u64) -> Self {
        self.ticks_per_second = ticks_per_second;
        self
    }

    pub fn advance(&mut self, ticks: u64) {
        self.now += ticks;
    }

    pub fn set(&mut self, now: u64) {
        self.now = now;
    }

    pub fn now(&self) -> u64 {
        self.now
    }
}

impl TickSource for ManualClock {
    fn ticks(&mut self) -> u64 {
        let t = self.now;
        self.now += self.step;
        t
    }

    fn ticks_per_second(&self) -> u64 {
        self.ticks_per_second
    }
}

/// Converts ticks to milliseconds. A zero rate yields zero.
pub fn ticks_to_ms(ticks: u64, ticks_per_second: u64) -> u64 {
    if ticks_per_second == 0 {
        return 0;
    }
    let ms = u128::from(ticks) * 1000 / u128::from(ticks_per_second);
    u64::try_from(ms).unwrap_or(u64::MAX)
}

/// One recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ProfileEvent {
    pub label: &'static str,
    pub start_ticks: u64,
    /// `None` while the event is still open.
    pub end_ticks: Option<u64>,
}

impl ProfileEvent {
    /// Elapsed ticks; zero while open.
    pub fn duration(&self) -> u64 {
        self.end_ticks
            .map(|end| end.saturating_sub(self.start_ticks))
            .unwrap_or(0)
    }
}

/// Token returned by [`Profiler::begin_event`]; hand it back to
/// [`Profiler::end_event`].
#[must_use = "an event must be ended with Profiler::end_event"]
#[derive(Debug, PartialEq, Eq)]
pub struct EventHandle(usize);

/// Per-label totals from [`Profiler::tag_totals`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TagTotal {
    pub tag: &'static str,
    pub count: usize,
    pub ticks: u64,
}

/// Fixed-capacity event recorder.
///
/// # Example
/// ```
/// use runtime::{ManualClock, Profiler};
///
/// let mut profiler = Profiler::with_clock(ManualClock::new(5));
/// let outer = profiler.begin_event("Invoke");
/// let inner = profiler.begin_event("TANH");
/// profiler.end_event(inner);
/// profiler.end_event(outer);
/// assert_eq!(profiler.events()[1].duration(), 5);
/// assert_eq!(profiler.total_ticks(), 15 + 5);
/// ```
#[derive(Debug)]
pub struct Profiler<C: TickSource = MonotonicClock> {
    clock: C,
    events: Vec<ProfileEvent>,
}

impl Profiler<MonotonicClock> {
    /// A profiler over the default 1 MHz wall clock.
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }
}

impl Default for Profiler<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TickSource> Profiler<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            events: Vec::with_capacity(MAX_EVENTS),
        }
    }

    /// Opens an event stamped with the current tick.
    ///
    /// # Panics
    /// If [`MAX_EVENTS`] events are already recorded.
    pub fn begin_event(&mut self, label: &'static str) -> EventHandle {
        assert!(
            self.events.len() < MAX_EVENTS,
            "profiler is full ({MAX_EVENTS} events); call clear_events between iterations"
        );
        let start_ticks = self.clock.ticks();
        self.events.push(ProfileEvent {
            label,
            start_ticks,
            end_ticks: None,
        });
        EventHandle(self.events.len() - 1)
    }

    /// Closes the innermost open event.
    ///
    /// # Panics
    /// If `handle` does not name the innermost open event.
    pub fn end_event(&mut self, handle: EventHandle) {
        let innermost = self.events.iter().rposition(|e| e.end_ticks.is_none());
        assert_eq!(
            innermost,
            Some(handle.0),
            "profiler event {} ended out of order",
            handle.0
        );
        let end = self.clock.ticks();
        self.events[handle.0].end_ticks = Some(end);
    }

    /// Drops every recorded event. The clock is left running.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Sum of the durations of every closed event.
    pub fn total_ticks(&self) -> u64 {
        self.events.iter().map(ProfileEvent::duration).sum()
    }

    pub fn events(&self) -> &[ProfileEvent] {
        &self.events
    }

    pub fn ticks_per_second(&self) -> u64 {
        self.clock.ticks_per_second()
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// One `"<label> took <ticks> ticks (<ms> ms)"` line per closed event,
    /// in record order.
    pub fn report(&self) -> String {
        let tps = self.ticks_per_second();
        let mut out = String::new();
        for event in self.events.iter().filter(|e| e.end_ticks.is_some()) {
            let ticks = event.duration();
            out.push_str(&format!(
                "{} took {} ticks ({} ms)\n",
                event.label,
                ticks,
                ticks_to_ms(ticks, tps)
            ));
        }
        out
    }

    /// Emits [`report`](Self::report) through `tracing`.
    pub fn log(&self) {
        let tps = self.ticks_per_second();
        for event in self.events.iter().filter(|e| e.end_ticks.is_some()) {
            let ticks = event.duration();
            tracing::info!(
                "{} took {} ticks ({} ms)",
                event.label,
                ticks,
                ticks_to_ms(ticks, tps)
            );
        }
    }

    /// Count and ticks per label, in order of first appearance.
    pub fn tag_totals(&self) -> Vec<TagTotal> {
        let mut totals: Vec<TagTotal> = Vec::new();
        for event in self.events.iter().filter(|e| e.end_ticks.is_some()) {
            match totals.iter_mut().find(|t| t.tag == event.label) {
                Some(t) => {
                    t.count += 1;
                    t.ticks += event.duration();
                }
                None => totals.push(TagTotal {
                    tag: event.label,
                    count: 1,
                    ticks: event.duration(),
                }),
            }
        }
        totals
    }

    /// [`tag_totals`](Self::tag_totals) as CSV with a `"tag","ticks"` header.
    pub fn report_csv(&self) -> String {
        let mut out = String::from("\"tag\",\"ticks\"\n");
        for t in self.tag_totals() {
            out.push_str(&format!("{},{}\n", t.tag, t.ticks));
        }
        out
    }
}
