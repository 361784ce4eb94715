// src/exec/progress.rs

//! The `[PROGRESS] n/m` marker jobs print to report progress.
//!
//! Any line containing the marker counts, wherever it appears in the line.
//! The format is an interop contract with the jobs and is matched exactly.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Progress;

static PROGRESS_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[PROGRESS\]\s*(\d+)/(\d+)").expect("progress marker regex is valid")
});

/// Parse a progress marker out of one output line.
///
/// Lines without a marker, with numbers that overflow `u64`, or with
/// `current > total` yield `None`.
pub fn parse_progress(line: &str) -> Option<Progress> {
    let caps = PROGRESS_MARKER.captures(line)?;
    let current: u64 = caps.get(1)?.as_str().parse().ok()?;
    let total: u64 = caps.get(2)?.as_str().parse().ok()?;
    Progress::new(current, total)
}
