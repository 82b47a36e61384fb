//! @ai:module:intent Editor host abstraction and an in-memory buffer view
//! @ai:module:layer infrastructure
//! @ai:module:public_api View, BufferView
//! @ai:module:depends_on finding, error
//! @ai:module:stateless false
//! @ai:module:thread_safe true

use crate::error::{Error, Result};
use crate::finding::{AnnotationSet, RegionStyle, Span};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// @ai:intent Operations the highlighter needs from an editor view
///
/// Views are shared with timer tasks, so every method takes `&self` and
/// implementations use interior mutability.
pub trait View: Send + Sync {
    /// @ai:intent Make the backing file and the buffer agree before a build
    /// @ai:effects fs:write
    fn save(&self) -> Result<()>;

    /// @ai:intent Backing file path, or None for an unsaved buffer
    fn file_path(&self) -> Option<PathBuf>;

    /// @ai:intent Number of lines in the current content
    fn line_count(&self) -> usize;

    /// @ai:intent Full-line span for a zero-based line index
    fn line_span(&self, index: usize) -> Option<Span>;

    /// @ai:intent Replace the named region set with the given spans
    fn add_regions(&self, key: &str, spans: Vec<Span>, style: &RegionStyle);

    /// @ai:intent Remove the named region set
    fn erase_regions(&self, key: &str);
}

struct BufferState {
    text: String,
    regions: HashMap<String, AnnotationSet>,
}

/// @ai:intent Text buffer with an optional backing file, usable as a headless view
///
/// A mirroring buffer treats the file on disk as the source of truth: its
/// `save` reloads from disk and never writes.
pub struct BufferView {
    path: Option<PathBuf>,
    mirror: bool,
    state: Mutex<BufferState>,
}

impl BufferView {
    /// @ai:intent Create a view over the given text
    /// @ai:effects pure
    pub fn new(path: Option<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path,
            mirror: false,
            state: Mutex::new(BufferState {
                text: text.into(),
                regions: HashMap::new(),
            }),
        }
    }

    /// @ai:intent Create a view backed by an existing file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn open(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(Self::new(Some(path.to_path_buf()), text))
    }

    /// @ai:intent Create a view that follows an existing file without ever writing it
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn mirror(path: &Path) -> Result<Self> {
        Ok(Self {
            mirror: true,
            ..Self::open(path)?
        })
    }

    pub fn is_mirror(&self) -> bool {
        self.mirror
    }

    /// @ai:intent Replace the buffer content from the backing file
    /// @ai:post returns true when the content differs from what was loaded before
    /// @ai:effects fs:read
    pub fn reload(&self) -> Result<bool> {
        let path = self.path.as_ref().ok_or(Error::NoBackingFile)?;
        let text = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.clone(),
            source: e,
        })?;

        let mut state = self.lock();
        if state.text == text {
            return Ok(false);
        }
        state.text = text;
        Ok(true)
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.lock().text = text.into();
    }

    pub fn text(&self) -> String {
        self.lock().text.clone()
    }

    /// @ai:intent Currently displayed region set for a key, if any
    pub fn regions(&self, key: &str) -> Option<AnnotationSet> {
        self.lock().regions.get(key).cloned()
    }

    /// @ai:intent Text covered by a span, for display
    pub fn slice(&self, span: Span) -> Option<String> {
        self.lock().text.get(span.start..span.end).map(str::to_string)
    }

    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl View for BufferView {
    fn save(&self) -> Result<()> {
        if self.mirror {
            return self.reload().map(|_| ());
        }

        let path = self.path.as_ref().ok_or(Error::NoBackingFile)?;
        let text = self.text();

        std::fs::write(path, text).map_err(|e| Error::FileWrite {
            path: path.clone(),
            source: e,
        })
    }

    fn file_path(&self) -> Option<PathBuf> {
        self.path.clone()
    }

    fn line_count(&self) -> usize {
        self.lock().text.split('\n').count()
    }

    fn line_span(&self, index: usize) -> Option<Span> {
        let state = self.lock();
        let mut start = 0;

        for (idx, line) in state.text.split('\n').enumerate() {
            if idx == index {
                let content = line.strip_suffix('\r').unwrap_or(line);
                return Some(Span::new(start, start + content.len()));
            }
            start += line.len() + 1;
        }

        None
    }

    fn add_regions(&self, key: &str, spans: Vec<Span>, style: &RegionStyle) {
        self.lock().regions.insert(
            key.to_string(),
            AnnotationSet {
                key: key.to_string(),
                spans,
                style: style.clone(),
            },
        );
    }

    fn erase_regions(&self, key: &str) {
        self.lock().regions.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_line_spans_exclude_newlines() {
        let view = BufferView::new(None, "package main\n\nfunc f() {}\r\n");

        assert_eq!(view.line_count(), 4);
        assert_eq!(view.line_span(0), Some(Span::new(0, 12)));
        assert_eq!(view.line_span(1), Some(Span::new(13, 13)));
        assert_eq!(view.line_span(2), Some(Span::new(14, 25)));
        assert_eq!(view.line_span(4), None);
        assert_eq!(view.slice(Span::new(14, 25)).as_deref(), Some("func f() {}"));
    }

    #[test]
    fn test_save_without_backing_file_fails() {
        let view = BufferView::new(None, "x");
        assert!(matches!(view.save(), Err(Error::NoBackingFile)));
    }

    #[test]
    fn test_save_and_reload_round_trip_through_disk() {
        let mut file = NamedTempFile::with_suffix(".go").unwrap();
        writeln!(file, "package main").unwrap();

        let view = BufferView::open(file.path()).unwrap();
        view.set_text("package other\n");
        view.save().unwrap();

        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "package other\n");

        assert!(!view.reload().unwrap());

        std::fs::write(file.path(), "package third\n").unwrap();
        assert!(view.reload().unwrap());
        assert_eq!(view.text(), "package third\n");
    }

    #[test]
    fn test_mirror_save_reloads_instead_of_writing() {
        let mut file = NamedTempFile::with_suffix(".go").unwrap();
        writeln!(file, "package main").unwrap();

        let view = BufferView::mirror(file.path()).unwrap();
        assert!(view.is_mirror());

        std::fs::write(file.path(), "package main\n\nvar x = 1\n").unwrap();
        let modified = std::fs::metadata(file.path()).unwrap().modified().unwrap();

        view.save().unwrap();

        assert_eq!(
            std::fs::read_to_string(file.path()).unwrap(),
            "package main\n\nvar x = 1\n"
        );
        assert_eq!(std::fs::metadata(file.path()).unwrap().modified().unwrap(), modified);
        assert_eq!(view.text(), "package main\n\nvar x = 1\n");
    }

    #[test]
    fn test_add_regions_replaces_and_erase_removes() {
        let view = BufferView::new(None, "a\nb\n");
        let style = RegionStyle::default();

        view.add_regions("k", vec![Span::new(0, 1)], &style);
        view.add_regions("k", vec![Span::new(2, 3)], &style);
        assert_eq!(view.regions("k").unwrap().spans, vec![Span::new(2, 3)]);

        view.erase_regions("k");
        assert!(view.regions("k").is_none());
    }
}
