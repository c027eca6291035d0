//! The day feed: a forward-growing window of calendar dates.
//!
//! The feed starts a week before today, extends sixty days forward, and
//! grows in thirty-day pages as the view scrolls toward its end. It never
//! prepends: dates before the initial lookback stay unreachable. An
//! explicit `{Idle, Appending}` state owned by the feed makes the
//! append single-flight: re-entrant scroll events while a page is being
//! computed are ignored until the append completes.

use chrono::{Duration, NaiveDate};

/// Days shown before today in the initial window.
pub const LOOKBACK_DAYS: i64 = 7;
/// Days shown after today in the initial window.
pub const INITIAL_FORWARD_DAYS: i64 = 60;
/// Days added by one append page.
pub const APPEND_PAGE_DAYS: i64 = 30;
/// Append when fewer than this many rows remain below the viewport.
pub const APPEND_THRESHOLD_ROWS: usize = 10;

/// Single-flight state for page appends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppendState {
    Idle,
    Appending,
}

/// Which way the jump-to-today affordance should point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpDirection {
    Up,
    Down,
}

/// Contiguous, ordered sequence of calendar days.
#[derive(Debug)]
pub struct DayFeed {
    first: NaiveDate,
    last: NaiveDate,
    append_state: AppendState,
}

impl DayFeed {
    /// Initial feed around `today`: `today - 7 ..= today + 60`.
    pub fn new(today: NaiveDate) -> Self {
        DayFeed {
            first: today - Duration::days(LOOKBACK_DAYS),
            last: today + Duration::days(INITIAL_FORWARD_DAYS),
            append_state: AppendState::Idle,
        }
    }

    pub fn first(&self) -> NaiveDate {
        self.first
    }

    pub fn last(&self) -> NaiveDate {
        self.last
    }

    /// Number of days currently in the feed.
    pub fn len(&self) -> usize {
        ((self.last - self.first).num_days() + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false // the feed always holds at least the initial window
    }

    /// The date at a feed row, if in range.
    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        let date = self.first + Duration::days(index as i64);
        (date <= self.last).then_some(date)
    }

    /// The feed row of a date, if in range. Contiguity makes this pure
    /// arithmetic.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        if date < self.first || date > self.last {
            return None;
        }
        Some((date - self.first).num_days() as usize)
    }

    /// Begin an append page. Returns false while a previous append is
    /// still in flight; at most one page can be pending at a time.
    pub fn begin_append(&mut self) -> bool {
        if self.append_state == AppendState::Appending {
            return false;
        }
        self.append_state = AppendState::Appending;
        true
    }

    /// Complete the pending append: extend the feed by one page and
    /// return to idle. No-op when no append was begun.
    pub fn complete_append(&mut self) {
        if self.append_state == AppendState::Appending {
            self.last += Duration::days(APPEND_PAGE_DAYS);
            self.append_state = AppendState::Idle;
        }
    }

    /// Scroll hook: begin an append when the viewport has nearly reached
    /// the end of the feed. Returns true when a page was scheduled.
    pub fn on_scroll(&mut self, rows_below_viewport: usize) -> bool {
        if rows_below_viewport < APPEND_THRESHOLD_ROWS {
            self.begin_append()
        } else {
            false
        }
    }

    /// Make `date` reachable and return its row for scrolling.
    ///
    /// Extends the feed with exactly enough days when `date` lies beyond
    /// the last day. Returns `None` for dates before the feed's first
    /// day; the feed never prepends, so those stay unreachable.
    pub fn reveal(&mut self, date: NaiveDate) -> Option<usize> {
        if date < self.first {
            return None;
        }
        if date > self.last {
            self.last = date;
        }
        self.index_of(date)
    }

    /// Jump direction for the today affordance, or `None` while today's
    /// row sits fully inside the viewport.
    pub fn today_indicator(
        &self,
        today: NaiveDate,
        viewport_top: usize,
        viewport_rows: usize,
    ) -> Option<JumpDirection> {
        let index = self.index_of(today)?;
        if index < viewport_top {
            Some(JumpDirection::Up)
        } else if index >= viewport_top + viewport_rows {
            Some(JumpDirection::Down)
        } else {
            None
        }
    }
}
