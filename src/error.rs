use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Fatal errors for a compilation run.
///
/// Per-file problems (a corrupt source, a failed extraction) are reported as
/// [`crate::media::ToolError`] and handled inside the sampler; only the
/// conditions below abort a run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("input directory not found: {}", .0.display())]
    InputDirectoryNotFound(PathBuf),

    #[error("invalid date format: {0:?} (expected YYYY-MM-DD or YYYYMMDD, months as YYYY-MM)")]
    InvalidDateFormat(String),

    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("not enough usable source footage: gave up after {attempts} consecutive failed attempts")]
    InsufficientSourceDuration { attempts: usize },

    #[error("failed to concatenate clips: {0}")]
    Concatenation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
