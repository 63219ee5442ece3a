//! Command line surface and interactive fallback prompts.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Parser;

use crate::config::{
    ClipRange, Config, SamplerConfig, DEFAULT_MAX_CLIP, DEFAULT_MAX_CONSECUTIVE_FAILURES,
    DEFAULT_MIN_CLIP, DEFAULT_OUTPUT_DIR, DEFAULT_OUTPUT_FILENAME, DEFAULT_TARGET_DURATION,
};
use crate::date_filter::DateRange;
use crate::error::{Error, Result};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Compile random clips from MP4 files into a single video")]
pub struct Args {
    /// Directory scanned (recursively) for source videos
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Target duration of the final video in seconds
    #[arg(long)]
    pub duration: Option<f64>,

    /// Output filename for the compiled video
    #[arg(long)]
    pub output: Option<String>,

    /// Directory the compiled video is written to
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Only use files dated on or after this day (YYYY-MM-DD or YYYYMMDD)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Only use files dated on or before this day (YYYY-MM-DD or YYYYMMDD)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Only use files from this month (YYYY-MM); overrides --start-date/--end-date
    #[arg(long)]
    pub month: Option<String>,

    /// Shortest clip to cut, in seconds
    #[arg(long, default_value_t = DEFAULT_MIN_CLIP)]
    pub min_clip: f64,

    /// Longest clip to cut, in seconds
    #[arg(long, default_value_t = DEFAULT_MAX_CLIP)]
    pub max_clip: f64,

    /// Give up after this many failed clip attempts in a row
    #[arg(long, default_value_t = DEFAULT_MAX_CONSECUTIVE_FAILURES)]
    pub max_failures: usize,

    /// File extension treated as video (repeatable)
    #[arg(long = "extension", default_value = "mp4")]
    pub extensions: Vec<String>,

    /// Seed for reproducible clip selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// ffmpeg binary
    #[arg(long, default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// ffprobe binary
    #[arg(long, default_value = "ffprobe")]
    pub ffprobe: PathBuf,

    /// Where to create the scratch directory for extracted clips
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Resolve the date filter. `--month` wins over explicit bounds.
    pub fn date_range(&self) -> Result<DateRange> {
        match &self.month {
            Some(month) => {
                if self.start_date.is_some() || self.end_date.is_some() {
                    tracing::warn!("--month {} overrides --start-date/--end-date", month);
                }
                DateRange::month(month)
            }
            None => DateRange::from_bounds(self.start_date.as_deref(), self.end_date.as_deref()),
        }
    }

    /// Build the run configuration, prompting for any primary value that was
    /// not given as a flag.
    ///
    /// Date and clip settings are checked before any prompt is shown.
    pub fn into_config<R: BufRead, W: Write>(
        self,
        prompter: &mut Prompter<R, W>,
    ) -> Result<Config> {
        let date_range = self.date_range()?;
        let clip_range = ClipRange::new(self.min_clip, self.max_clip)?;

        let input_dir = match self.input_dir {
            Some(dir) => dir,
            None => prompter.ask("Enter the input directory path", Some("."), validate_directory)?,
        };
        let target_duration = match self.duration {
            Some(duration) => duration,
            None => prompter.ask(
                "Enter the target duration in seconds",
                Some(&DEFAULT_TARGET_DURATION.to_string()),
                validate_duration,
            )?,
        };
        let output_filename = match self.output {
            Some(output) => output,
            None => prompter.ask(
                "Enter the output filename",
                Some(DEFAULT_OUTPUT_FILENAME),
                |value| Ok(value.to_string()),
            )?,
        };

        let config = Config {
            output_dir: self.output_dir,
            output_filename,
            date_range,
            sampler: SamplerConfig {
                clip_range,
                max_consecutive_failures: self.max_failures,
            },
            extensions: self
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            temp_root: self.temp_dir,
            ..Config::new(input_dir, target_duration)
        };
        config.validate()?;
        Ok(config)
    }
}

/// Asks questions on `output` and reads answers from `input`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask until `validate` accepts an answer. An empty answer takes the default.
    pub fn ask<T>(
        &mut self,
        prompt: &str,
        default: Option<&str>,
        validate: impl Fn(&str) -> std::result::Result<T, String>,
    ) -> Result<T> {
        loop {
            match default {
                Some(default) => write!(self.output, "{prompt} (default: {default}): ")?,
                None => write!(self.output, "{prompt}: ")?,
            }
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(Error::InvalidConfig(format!("no answer given for {prompt:?}")));
            }

            let answer = match (line.trim(), default) {
                ("", Some(default)) => default,
                ("", None) => {
                    writeln!(self.output, "Input cannot be empty. Please try again.")?;
                    continue;
                }
                (answer, _) => answer,
            };

            match validate(answer) {
                Ok(value) => return Ok(value),
                Err(msg) => writeln!(self.output, "Invalid input: {msg}")?,
            }
        }
    }
}

fn validate_directory(value: &str) -> std::result::Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_dir() {
        Ok(path)
    } else {
        Err("Directory does not exist".to_string())
    }
}

fn validate_duration(value: &str) -> std::result::Result<f64, String> {
    match value.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs > 0.0 => Ok(secs),
        Ok(_) => Err("Duration must be greater than 0 seconds".to_string()),
        Err(_) => Err("Duration must be a positive number".to_string()),
    }
}
