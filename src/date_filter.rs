//! Date filtering based on timestamps embedded in file names.
//!
//! Dashcams and phones name their recordings after the moment they were
//! taken (`20250515_143022_F.mp4`, `VID-2025-05-15-0001.mp4`). The filter
//! reads that date back out of the name and compares it against an inclusive
//! [`DateRange`].
//!
//! A file whose name carries no recognisable date is excluded whenever the
//! range has at least one bound, and included when the range is unbounded.

use std::sync::OnceLock;

use chrono::{Months, NaiveDate};
use regex::Regex;

use crate::error::{Error, Result};

fn dashed_date() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").expect("valid dashed date regex"))
}

// The leading group keeps us from matching the tail of a longer number.
fn compact_date() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|\D)(\d{4})(\d{2})(\d{2})").expect("valid compact date regex")
    })
}

fn boundary_format() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4})-?(\d{2})-?(\d{2})$").expect("valid boundary regex")
    })
}

fn month_format() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})-?(\d{2})$").expect("valid month regex"))
}

/// Inclusive date range. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateRange {
    /// A range with no bounds; every file passes.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Build a range, rejecting `start > end`.
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(Error::InvalidDateRange { start, end });
            }
        }
        Ok(Self { start, end })
    }

    /// Build a range from user-supplied boundary strings.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let start = start.map(parse_boundary).transpose()?;
        let end = end.map(parse_boundary).transpose()?;
        Self::new(start, end)
    }

    /// The whole calendar month named by `YYYY-MM` (or `YYYYMM`).
    pub fn month(value: &str) -> Result<Self> {
        let invalid = || Error::InvalidDateFormat(value.to_string());
        let caps = month_format().captures(value.trim()).ok_or_else(invalid)?;

        let year: i32 = caps[1].parse().map_err(|_| invalid())?;
        let month: u32 = caps[2].parse().map_err(|_| invalid())?;

        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(invalid)?;

        Self::new(Some(first), Some(last))
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    /// True when at least one bound is set.
    pub fn is_active(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }

    /// Decide whether a file with this name belongs to the range.
    pub fn includes_file(&self, file_name: &str) -> bool {
        self.includes_date(date_from_filename(file_name))
    }

    /// Same decision for a date already read from a file name.
    pub fn includes_date(&self, date: Option<NaiveDate>) -> bool {
        match date {
            _ if !self.is_active() => true,
            Some(date) => self.contains(date),
            None => false,
        }
    }
}

/// Parse a `YYYY-MM-DD` or `YYYYMMDD` boundary given on the command line.
pub fn parse_boundary(value: &str) -> Result<NaiveDate> {
    let invalid = || Error::InvalidDateFormat(value.to_string());
    let caps = boundary_format().captures(value.trim()).ok_or_else(invalid)?;
    ymd(&caps[1], &caps[2], &caps[3]).ok_or_else(invalid)
}

/// Find the first valid calendar date embedded in a file name.
pub fn date_from_filename(file_name: &str) -> Option<NaiveDate> {
    let dashed = dashed_date()
        .captures_iter(file_name)
        .filter_map(|caps| {
            let at = caps.get(0)?.start();
            Some((at, ymd(&caps[1], &caps[2], &caps[3])?))
        });
    let compact = compact_date()
        .captures_iter(file_name)
        .filter_map(|caps| {
            let at = caps.get(1)?.start();
            Some((at, ymd(&caps[1], &caps[2], &caps[3])?))
        });

    dashed
        .chain(compact)
        .min_by_key(|(at, _)| *at)
        .map(|(_, date)| date)
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}
