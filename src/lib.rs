//! dashreel builds a random compilation video out of a directory of recordings.
//!
//! Source files are found recursively, optionally narrowed to a date range
//! read from their names, sampled for short random clips with ffmpeg stream
//! copy, and joined into one output file once the target duration is reached.

pub mod cli;
pub mod compiler;
pub mod config;
pub mod date_filter;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod media;
pub mod pipeline;
pub mod sampler;

#[cfg(test)]
mod testing;

pub use config::{ClipRange, Config, SamplerConfig};
pub use date_filter::DateRange;
pub use error::{Error, Result};
pub use media::{Ffmpeg, MediaFile, MediaTool, ToolError};
pub use pipeline::{run, Outcome, Summary};
pub use sampler::{Clip, CompilationPlan, Sampler};
