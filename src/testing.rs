//! In-process stand-in for ffmpeg used by unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::media::{MediaTool, ToolError};

/// Durations are looked up by file name; extraction and concatenation write
/// small text files so the results can be inspected.
#[derive(Default)]
pub struct FakeTool {
    durations: HashMap<String, f64>,
    corrupt: HashSet<String>,
    fail_concat: Option<String>,
    pub extractions: RefCell<Vec<(String, f64, f64)>>,
}

impl FakeTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: &str, duration: f64) -> Self {
        self.durations.insert(name.to_string(), duration);
        self
    }

    /// Probes fine but every extraction fails.
    pub fn with_corrupt(mut self, name: &str, duration: f64) -> Self {
        self.durations.insert(name.to_string(), duration);
        self.corrupt.insert(name.to_string());
        self
    }

    pub fn failing_concat(mut self, stderr: &str) -> Self {
        self.fail_concat = Some(stderr.to_string());
        self
    }
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl MediaTool for FakeTool {
    fn probe_duration(&self, path: &Path) -> Result<f64, ToolError> {
        self.durations
            .get(&name_of(path))
            .copied()
            .ok_or_else(|| ToolError::Parse {
                tool: "fake-probe".to_string(),
                output: "N/A".to_string(),
            })
    }

    fn extract_clip(
        &self,
        source: &Path,
        start: f64,
        length: f64,
        dest: &Path,
    ) -> Result<(), ToolError> {
        let name = name_of(source);
        if self.corrupt.contains(&name) {
            // Leave a partial file behind like a real failed ffmpeg run would.
            fs::write(dest, b"")?;
            return Err(ToolError::Failed {
                tool: "fake-ffmpeg".to_string(),
                code: Some(1),
                stderr: "moov atom not found".to_string(),
            });
        }
        fs::write(dest, format!("{name}@{start:.3}+{length:.3}\n"))?;
        self.extractions.borrow_mut().push((name, start, length));
        Ok(())
    }

    fn concatenate(&self, clips: &[PathBuf], output: &Path) -> Result<(), ToolError> {
        if let Some(stderr) = &self.fail_concat {
            fs::write(output, b"partial")?;
            return Err(ToolError::Failed {
                tool: "fake-ffmpeg".to_string(),
                code: Some(1),
                stderr: stderr.clone(),
            });
        }
        let mut joined = String::new();
        for clip in clips {
            joined.push_str(&fs::read_to_string(clip)?);
        }
        fs::write(output, joined)?;
        Ok(())
    }
}
