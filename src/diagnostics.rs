//! @ai:module:intent Parse compiler escape-analysis output into findings
//! @ai:module:layer application
//! @ai:module:public_api DiagnosticParser, EscapeParser, parse_diagnostics, resolve_path, normalize_path
//! @ai:module:depends_on finding
//! @ai:module:stateless true

use crate::finding::Finding;
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

/// `PATH:LINE:COLUMN: DESCRIPTION escapes to heap`, matched per line.
static ESCAPE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*\.go):(\d+):(\d+):\s(.*?) escapes to heap").expect("Invalid regex pattern")
});

/// @ai:intent Narrow contract for turning diagnostic text into findings
pub trait DiagnosticParser: Send + Sync {
    /// @ai:intent Extract findings from raw diagnostic text
    /// @ai:post findings appear in the order of their lines in `text`
    /// @ai:effects pure
    fn parse(&self, text: &str, base_dir: &Path) -> Vec<Finding>;
}

/// @ai:intent Regex-based parser for `go build -gcflags -m` heap escapes
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapeParser;

impl EscapeParser {
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticParser for EscapeParser {
    fn parse(&self, text: &str, base_dir: &Path) -> Vec<Finding> {
        parse_diagnostics(text, base_dir)
    }
}

/// @ai:intent Extract all heap-escape findings from compiler output
/// @ai:pre base_dir is the directory the build ran in
/// @ai:post unmatched lines contribute nothing; duplicates are kept
/// @ai:effects pure
pub fn parse_diagnostics(text: &str, base_dir: &Path) -> Vec<Finding> {
    let findings: Vec<Finding> = text
        .lines()
        .filter_map(|line| parse_line(line, base_dir))
        .collect();

    tracing::debug!(
        "Parsed {} heap escape findings relative to {}",
        findings.len(),
        base_dir.display()
    );

    findings
}

/// @ai:intent Parse a single diagnostic line
/// @ai:effects pure
fn parse_line(line: &str, base_dir: &Path) -> Option<Finding> {
    let captures = ESCAPE_LINE.captures(line)?;

    let path = captures.get(1)?.as_str();
    let line_number: usize = captures.get(2)?.as_str().parse().ok()?;
    // Column is validated by the pattern but not kept.
    captures.get(3)?.as_str().parse::<usize>().ok()?;
    let description = captures.get(4)?.as_str();

    if line_number == 0 {
        return None;
    }

    let source_path = PathBuf::from(path);
    let resolved_path = resolve_path(base_dir, &source_path);

    Some(Finding {
        source_path,
        resolved_path,
        line: line_number,
        description: description.to_string(),
    })
}

/// @ai:intent Resolve a reported path against the build directory
/// @ai:post absolute `path` is returned normalized and otherwise unchanged
/// @ai:effects pure
pub fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    normalize_path(&base_dir.join(path))
}

/// @ai:intent Lexically remove `.` and `..` components without touching the filesystem
/// @ai:effects pure
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );

                if can_pop {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}
