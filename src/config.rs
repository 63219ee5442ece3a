//! Run configuration.
//!
//! Every tunable that used to be a module constant lives here and is passed
//! explicitly to the pipeline.

use std::path::{Path, PathBuf};

use crate::date_filter::DateRange;
use crate::error::{Error, Result};

pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_OUTPUT_FILENAME: &str = "compiled-video.mp4";
pub const DEFAULT_TARGET_DURATION: f64 = 30.0;
pub const DEFAULT_MIN_CLIP: f64 = 3.0;
pub const DEFAULT_MAX_CLIP: f64 = 5.0;
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: usize = 100;

/// Bounds for the length of a single clip, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRange {
    min: f64,
    max: f64,
}

impl ClipRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !(min.is_finite() && max.is_finite()) || min <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "minimum clip length must be a positive number of seconds, got {min}"
            )));
        }
        if min > max {
            return Err(Error::InvalidConfig(format!(
                "minimum clip length {min}s exceeds maximum {max}s"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

impl Default for ClipRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_CLIP,
            max: DEFAULT_MAX_CLIP,
        }
    }
}

/// Knobs for the clip sampler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    pub clip_range: ClipRange,
    /// Failed attempts in a row before the run is abandoned.
    pub max_consecutive_failures: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            clip_range: ClipRange::default(),
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
        }
    }
}

/// Everything one compilation run needs.
#[derive(Debug, Clone)]
pub struct Config {
    pub input_dir: PathBuf,
    /// Target total length of the compilation, in seconds.
    pub target_duration: f64,
    pub output_dir: PathBuf,
    pub output_filename: String,
    pub date_range: DateRange,
    pub sampler: SamplerConfig,
    /// Lowercase file extensions (without the dot) treated as media.
    pub extensions: Vec<String>,
    /// Parent for the scratch directory; system temp when unset.
    pub temp_root: Option<PathBuf>,
}

impl Config {
    pub fn new(input_dir: impl Into<PathBuf>, target_duration: f64) -> Self {
        Self {
            input_dir: input_dir.into(),
            target_duration,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            output_filename: DEFAULT_OUTPUT_FILENAME.to_string(),
            date_range: DateRange::unbounded(),
            sampler: SamplerConfig::default(),
            extensions: vec!["mp4".to_string()],
            temp_root: None,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_filename)
    }

    pub fn temp_root(&self) -> Option<&Path> {
        self.temp_root.as_deref()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.target_duration.is_finite() || self.target_duration <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "target duration must be greater than 0 seconds, got {}",
                self.target_duration
            )));
        }
        if self.output_filename.trim().is_empty() {
            return Err(Error::InvalidConfig("output filename is empty".to_string()));
        }
        if self.sampler.max_consecutive_failures == 0 {
            return Err(Error::InvalidConfig(
                "max consecutive failures must be at least 1".to_string(),
            ));
        }
        if self.extensions.is_empty() {
            return Err(Error::InvalidConfig("no media extensions configured".to_string()));
        }
        Ok(())
    }
}
