//! Content-change detection and adaptive refresh interval estimation.
//!
//! The header refresh worker calls [`ChangeDetector::observe`] once per tick
//! to decide whether a redraw is warranted, and commits the fingerprint with
//! [`ChangeDetector::mark_rendered`] only after the render actually happened.
//! Skipped ticks therefore never absorb a pending change. The
//! [`AdaptiveInterval`] estimator turns recent render cost and change
//! frequency into the next tick period, clamped to a configured floor and
//! ceiling.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Sliding window over which change frequency is measured.
const CHANGE_WINDOW: Duration = Duration::from_secs(10);

/// Result of comparing new content against the last rendered fingerprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentChange {
    pub changed: bool,
    /// Normalized change magnitude in `0.0..=1.0`.
    pub magnitude: f64,
}

impl ContentChange {
    const NONE: ContentChange = ContentChange {
        changed: false,
        magnitude: 0.0,
    };
}

/// Cheap O(len) fingerprint of a content string: length, boundary bytes and
/// an FNV-1a digest of the whole string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    len: usize,
    head: u8,
    tail: u8,
    digest: u64,
}

impl Fingerprint {
    fn of(content: &str) -> Self {
        let bytes = content.as_bytes();
        let mut digest: u64 = 0xcbf29ce484222325;
        for &b in bytes {
            digest ^= u64::from(b);
            digest = digest.wrapping_mul(0x100000001b3);
        }
        Self {
            len: bytes.len(),
            head: bytes.first().copied().unwrap_or(0),
            tail: bytes.last().copied().unwrap_or(0),
            digest,
        }
    }

    /// Normalized distance to another fingerprint. Weighted so that any
    /// difference yields at least 0.2, well above the default render
    /// threshold, while large length shifts push toward 1.0.
    fn distance(&self, other: &Fingerprint) -> f64 {
        if self == other {
            return 0.0;
        }
        let max_len = self.len.max(other.len).max(1);
        let len_delta = self.len.abs_diff(other.len) as f64 / max_len as f64;
        let mut magnitude = (len_delta * 0.4).min(0.4);
        if self.head != other.head {
            magnitude += 0.2;
        }
        if self.tail != other.tail {
            magnitude += 0.2;
        }
        if self.digest != other.digest {
            magnitude += 0.2;
        }
        magnitude.min(1.0)
    }
}

/// Detects whether header content changed since the last committed render.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last_rendered: Option<Fingerprint>,
    change_history: VecDeque<Instant>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `content` against the last rendered fingerprint. Does not
    /// store anything; call [`mark_rendered`](Self::mark_rendered) after the
    /// render succeeds.
    pub fn observe(&self, content: &str) -> ContentChange {
        let current = Fingerprint::of(content);
        match self.last_rendered {
            None => ContentChange {
                changed: true,
                magnitude: 1.0,
            },
            Some(previous) if previous == current => ContentChange::NONE,
            Some(previous) => ContentChange {
                changed: true,
                magnitude: previous.distance(&current),
            },
        }
    }

    /// Commit `content` as the rendered state and record the change instant.
    pub fn mark_rendered(&mut self, content: &str) {
        self.last_rendered = Some(Fingerprint::of(content));
        let now = Instant::now();
        self.change_history.push_back(now);
        while let Some(&front) = self.change_history.front() {
            if now.duration_since(front) > CHANGE_WINDOW {
                self.change_history.pop_front();
            } else {
                break;
            }
        }
    }

    /// Observed changes per second over the sliding window.
    pub fn change_frequency(&self) -> f64 {
        let now = Instant::now();
        let recent = self
            .change_history
            .iter()
            .filter(|t| now.duration_since(**t) <= CHANGE_WINDOW)
            .count();
        recent as f64 / CHANGE_WINDOW.as_secs_f64()
    }
}

/// Proposes the next refresh interval from observed render cost and change
/// frequency. Frequent changes pull the interval toward the floor; rare
/// changes and expensive renders push it toward the ceiling. The result is
/// always within `[floor, ceiling]`.
#[derive(Debug, Clone)]
pub struct AdaptiveInterval {
    floor: Duration,
    ceiling: Duration,
    current: Duration,
}

impl AdaptiveInterval {
    /// Change frequency (per second) at or above which the floor is used.
    const SATURATION_FREQ: f64 = 4.0;
    /// A render should occupy at most this fraction of its interval.
    const COST_HEADROOM: u32 = 8;

    pub fn new(floor: Duration, ceiling: Duration) -> Self {
        let ceiling = ceiling.max(floor);
        Self {
            floor,
            ceiling,
            current: floor,
        }
    }

    /// The most recently estimated interval.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Estimate the next interval. Monotonic: non-increasing in
    /// `change_frequency`, non-decreasing in `render_cost`.
    pub fn next_interval(&mut self, render_cost: Duration, change_frequency: f64) -> Duration {
        let span = self.ceiling.saturating_sub(self.floor);
        let freq_norm = (change_frequency / Self::SATURATION_FREQ).clamp(0.0, 1.0);
        let from_frequency = self.floor + span.mul_f64(1.0 - freq_norm);

        // Never let rendering itself dominate the tick budget.
        let from_cost = render_cost.saturating_mul(Self::COST_HEADROOM);

        self.current = from_frequency.max(from_cost).clamp(self.floor, self.ceiling);
        self.current
    }
}
