// src/parse.rs

//! Line-oriented parsers for build-tool output.
//!
//! There is no formal protocol here: the build executor prints free-form,
//! possibly ANSI-colored text, and these pure functions pick out the two
//! shapes we care about:
//!
//! - `[n/m] <description>` progress markers, turned into progress events
//! - `<path>:<line>:<col>: error|note|warning:` compiler diagnostics, whose
//!   paths are rewritten from build-output-relative to checkout-relative
//!
//! Pattern matching always happens on a decolorized copy; substitution
//! happens into the original line so colors outside the path survive.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

static ANSI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").unwrap());

static DIAGNOSTIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<path>\S+?):(?P<line>\d+):(?P<col>\d+): (?:error|note|warning): ").unwrap()
});

/// Remove ANSI escape sequences from a line.
pub fn strip_ansi(line: &str) -> Cow<'_, str> {
    ANSI_RE.replace_all(line, "")
}

/// A recognised `[completed/total]` progress marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressLine {
    pub completed: u64,
    pub total: u64,
    /// Remainder of the line with the marker stripped and trimmed.
    pub what: String,
}

impl ProgressLine {
    pub fn done(&self) -> bool {
        self.completed == self.total
    }
}

/// Recognise a leading bracketed `completed/total` marker.
///
/// The first whitespace-delimited token of the (decolorized, trimmed) line
/// must start with `[`, end with `]`, and contain exactly one `/` separating
/// two integers, with `total >= completed` and `total >= 1`. A `Some` return
/// means the line was consumed as progress and must not be treated as
/// ordinary output.
///
/// This is a heuristic, not a protocol: any tool that happens to print a
/// `[n/m]`-shaped leading token will be treated as reporting progress.
pub fn parse_progress(line: &str) -> Option<ProgressLine> {
    let plain = strip_ansi(line);
    let trimmed = plain.trim_start();
    let token = trimmed.split_whitespace().next()?;
    let inner = token.strip_prefix('[')?.strip_suffix(']')?;

    let mut parts = inner.split('/');
    let completed: u64 = parts.next()?.parse().ok()?;
    let total: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    if total == 0 || completed > total {
        return None;
    }

    Some(ProgressLine {
        completed,
        total,
        what: trimmed[token.len()..].trim().to_string(),
    })
}

/// Rewrite a compiler-diagnostic path from build-output-relative to
/// checkout-relative.
///
/// `out_dir` is the directory the diagnostic path is relative to; `cwd` is
/// the directory the rewritten path should be expressed relative to
/// (prefixed with `./`). Lines that do not look like a diagnostic, or whose
/// resolved path falls outside `cwd`, are returned unchanged. The match runs
/// on a decolorized copy but the substitution happens in the original line,
/// so any ANSI codes outside the path are preserved verbatim.
pub fn rewrite_diagnostic_path(line: &str, out_dir: &Path, cwd: &Path) -> String {
    let plain = strip_ansi(line);
    let Some(caps) = DIAGNOSTIC_RE.captures(plain.as_ref()) else {
        return line.to_string();
    };

    let path_text = &caps["path"];
    let resolved = normalize_lexically(&out_dir.join(path_text));
    let Ok(relative) = resolved.strip_prefix(cwd) else {
        return line.to_string();
    };

    let new_path = format!("./{}", relative.display());
    line.replacen(path_text, &new_path, 1)
}

/// Lexically resolve `.` and `..` components without touching the
/// filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
