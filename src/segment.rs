// SPDX-FileCopyrightText: The interval-pathtree authors
// SPDX-License-Identifier: MPL-2.0

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d*\.?\d+)\s*-\s*(\d*\.?\d+)\s*$").expect("valid number range pattern")
});

/// Closed numeric interval `[low, high]`.
///
/// Both bounds are never NaN and `low <= high` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    low: f64,
    high: f64,
}

impl Interval {
    /// The whole numeric domain.
    pub const UNBOUNDED: Self = Self {
        low: f64::NEG_INFINITY,
        high: f64::INFINITY,
    };

    /// Create an interval from its bounds.
    ///
    /// Returns `None` if a bound is NaN or if the bounds are inverted.
    #[must_use]
    pub fn new(low: f64, high: f64) -> Option<Self> {
        if low.is_nan() || high.is_nan() || low > high {
            return None;
        }
        Some(Self { low, high })
    }

    /// Degenerate interval `[value, value]`.
    ///
    /// Returns `None` if `value` is NaN.
    #[must_use]
    pub fn point(value: f64) -> Option<Self> {
        Self::new(value, value)
    }

    #[must_use]
    pub const fn low(&self) -> f64 {
        self.low
    }

    #[must_use]
    pub const fn high(&self) -> f64 {
        self.high
    }

    /// Check if both closed intervals share at least one value.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.low <= other.high && other.low <= self.high
    }

    pub(crate) fn cmp_low_high(&self, other: &Self) -> Ordering {
        self.low
            .total_cmp(&other.low)
            .then_with(|| self.high.total_cmp(&other.high))
    }

    pub(crate) fn cmp_high_low(&self, other: &Self) -> Ordering {
        self.high
            .total_cmp(&other.high)
            .then_with(|| self.low.total_cmp(&other.low))
    }
}

/// Classification of a path segment.
///
/// Derived once from the raw segment string when a node is created.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SegmentKind {
    /// Opaque name, addressed by string equality.
    Name,

    /// Single number.
    Point(f64),

    /// Numeric range with the bounds taken verbatim from the segment.
    ///
    /// The bounds might be inverted, i.e. `low > high`.
    Range { low: f64, high: f64 },
}

impl SegmentKind {
    #[must_use]
    pub const fn is_name(&self) -> bool {
        matches!(self, Self::Name)
    }

    /// The numeric interval addressed by this segment.
    ///
    /// Returns `None` for names and for inverted ranges.
    #[must_use]
    pub fn interval(&self) -> Option<Interval> {
        match *self {
            Self::Name => None,
            Self::Point(value) => Interval::point(value),
            Self::Range { low, high } => Interval::new(low, high),
        }
    }

    /// Check if a node could be created for this segment.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_name() || self.interval().is_some()
    }
}

/// Classify a path segment.
///
/// Total and deterministic: every string is either a point, a range, or a name.
#[must_use]
pub fn classify(segment: &str) -> SegmentKind {
    if let Some(value) = parse_point(segment) {
        return SegmentKind::Point(value);
    }
    if let Some((low, high)) = parse_range(segment) {
        return SegmentKind::Range { low, high };
    }
    SegmentKind::Name
}

fn parse_point(segment: &str) -> Option<f64> {
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return None;
    }
    // Rejects "NaN", "inf", and friends that `f64::from_str` would accept
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn parse_range(segment: &str) -> Option<(f64, f64)> {
    let captures = NUMBER_RANGE.captures(segment)?;
    let parse_bound = |index| {
        captures
            .get(index)?
            .as_str()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
    };
    Some((parse_bound(1)?, parse_bound(2)?))
}

/// Split a path into its non-empty segments.
///
/// Leading, trailing, and repeated delimiters are ignored. The empty path
/// has no segments and denotes the root node.
pub fn split_path(path: &str, delimiter: char) -> impl Iterator<Item = &str> + '_ {
    path.split(delimiter).filter(|segment| !segment.is_empty())
}
