//! @ai:module:intent Define data structures for heap-escape findings and annotations
//! @ai:module:layer domain
//! @ai:module:public_api Finding, Span, RegionStyle, AnnotationSet
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Sublime-compatible draw flag: do not fill the region background.
pub const DRAW_NO_FILL: u32 = 32;
/// Sublime-compatible draw flag: do not outline the region.
pub const DRAW_NO_OUTLINE: u32 = 256;

/// @ai:intent One compiler-reported heap escape, scoped to a file and line
/// @ai:invariant line >= 1
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    /// Path exactly as the compiler printed it.
    pub source_path: PathBuf,
    /// `source_path` resolved against the directory the build ran in.
    pub resolved_path: PathBuf,
    pub line: usize,
    pub description: String,
}

impl Finding {
    /// @ai:intent Check whether this finding belongs to the given absolute file
    /// @ai:effects pure
    pub fn is_for(&self, file: &Path) -> bool {
        self.resolved_path == file
    }

    /// @ai:intent Zero-based line index used by editor views
    /// @ai:effects pure
    pub fn line_index(&self) -> usize {
        self.line - 1
    }
}

/// @ai:intent Half-open byte range covering one full line of a view
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// @ai:intent Visual style handed to the host editor's region renderer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegionStyle {
    pub scope: String,
    pub icon: String,
    pub flags: u32,
}

impl Default for RegionStyle {
    fn default() -> Self {
        Self {
            scope: "invalid".to_string(),
            icon: "dot".to_string(),
            flags: DRAW_NO_FILL | DRAW_NO_OUTLINE,
        }
    }
}

/// @ai:intent The complete set of flagged line regions displayed in one view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnotationSet {
    pub key: String,
    pub spans: Vec<Span>,
    pub style: RegionStyle,
}

impl AnnotationSet {
    /// @ai:intent Create an annotation set with no regions
    /// @ai:effects pure
    pub fn empty(key: impl Into<String>, style: RegionStyle) -> Self {
        Self {
            key: key.into(),
            spans: Vec::new(),
            style,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finding_line_index_is_zero_based() {
        let finding = Finding {
            source_path: PathBuf::from("./main.go"),
            resolved_path: PathBuf::from("/proj/main.go"),
            line: 10,
            description: "x".to_string(),
        };

        assert_eq!(finding.line_index(), 9);
        assert!(finding.is_for(Path::new("/proj/main.go")));
        assert!(!finding.is_for(Path::new("/proj/util.go")));
    }

    #[test]
    fn test_default_style_is_unfilled_and_unoutlined() {
        let style = RegionStyle::default();
        assert_eq!(style.scope, "invalid");
        assert_eq!(style.flags & DRAW_NO_FILL, DRAW_NO_FILL);
        assert_eq!(style.flags & DRAW_NO_OUTLINE, DRAW_NO_OUTLINE);
    }
}
