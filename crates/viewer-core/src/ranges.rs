//! History of rendered page ranges
//!
//! Ranges are kept sorted, with at least one unrecorded page between
//! neighbours. A new range absorbs every range it overlaps or touches, and
//! only the last few ranges of the merged list are retained.

use doc_model::PageNumber;
use std::fmt;
use std::str::FromStr;

/// Ranges kept after each merge unless configured otherwise.
pub const DEFAULT_RANGE_RETENTION: usize = 3;

/// Inclusive span of pages. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRange {
    start: PageNumber,
    end: PageNumber,
}

impl PageRange {
    /// Reversed bounds are swapped.
    pub fn new(start: PageNumber, end: PageNumber) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    pub fn single(page: PageNumber) -> Self {
        Self { start: page, end: page }
    }

    pub fn start(&self) -> PageNumber {
        self.start
    }

    pub fn end(&self) -> PageNumber {
        self.end
    }

    pub fn contains(&self, page: PageNumber) -> bool {
        (self.start..=self.end).contains(&page)
    }

    pub fn page_count(&self) -> u32 {
        self.end - self.start + 1
    }

    /// True when `self` ends at least two pages before `other` starts.
    fn strictly_before(&self, other: &PageRange) -> bool {
        self.end.saturating_add(1) < other.start
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPageRange(pub String);

impl fmt::Display for InvalidPageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid page range `{}` (expected N or START-END, pages from 1)", self.0)
    }
}

impl std::error::Error for InvalidPageRange {}

/// Accepts `7` or `3-9`.
impl FromStr for PageRange {
    type Err = InvalidPageRange;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidPageRange(value.to_owned());
        let parse_page = |text: &str| match text.trim().parse::<PageNumber>() {
            Ok(page) if page >= 1 => Ok(page),
            _ => Err(invalid()),
        };

        match value.split_once('-') {
            Some((start, end)) => Ok(Self::new(parse_page(start)?, parse_page(end)?)),
            None => parse_page(value).map(Self::single),
        }
    }
}

/// Merge `incoming` into `existing` and keep the last `retention` ranges.
///
/// `existing` must be sorted by start with gaps of at least one page
/// between neighbours, which every output of this function satisfies.
pub fn merge_range(
    existing: &[PageRange],
    incoming: PageRange,
    retention: usize,
) -> Vec<PageRange> {
    let mut merged = merge_all(existing, incoming);
    let keep_from = merged.len().saturating_sub(retention);
    merged.drain(..keep_from);
    merged
}

fn merge_all(existing: &[PageRange], incoming: PageRange) -> Vec<PageRange> {
    let mut growing = incoming;
    let mut emitted = false;
    let mut merged = Vec::with_capacity(existing.len() + 1);

    for range in existing {
        if growing.strictly_before(range) {
            if !emitted {
                merged.push(growing);
                emitted = true;
            }
            merged.push(*range);
        } else if range.strictly_before(&growing) {
            merged.push(*range);
        } else {
            growing = PageRange {
                start: growing.start.min(range.start),
                end: growing.end.max(range.end),
            };
        }
    }

    if !emitted {
        merged.push(growing);
    }

    merged
}

/// Page ranges already requested for one document.
#[derive(Debug, Clone)]
pub struct RangeHistory {
    ranges: Vec<PageRange>,
    retention: usize,
}

impl Default for RangeHistory {
    fn default() -> Self {
        Self::new(DEFAULT_RANGE_RETENTION)
    }
}

impl RangeHistory {
    pub fn new(retention: usize) -> Self {
        Self { ranges: Vec::new(), retention: retention.max(1) }
    }

    pub fn ranges(&self) -> &[PageRange] {
        &self.ranges
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Record a range in request order and return the ranges that fell out
    /// of the history, so callers can re-request them if they care.
    pub fn record(&mut self, range: PageRange) -> Vec<PageRange> {
        let mut merged = merge_all(&self.ranges, range);
        let keep_from = merged.len().saturating_sub(self.retention);
        let dropped: Vec<PageRange> = merged.drain(..keep_from).collect();

        if !dropped.is_empty() {
            log::debug!("range history full, forgetting {dropped:?}");
        }

        self.ranges = merged;
        dropped
    }

    pub fn contains(&self, page: PageNumber) -> bool {
        self.ranges.iter().any(|range| range.contains(page))
    }

    /// Pages from `pages` that no recorded range covers, in input order.
    pub fn missing_pages(&self, pages: &[PageNumber]) -> Vec<PageNumber> {
        pages.iter().copied().filter(|page| !self.contains(*page)).collect()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }
}
