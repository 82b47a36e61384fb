//! @ai:module:intent Headless editor host: watch a Go file and report its heap escapes
//! @ai:module:layer presentation
//! @ai:module:public_api ReportingView, FileWatcher
//! @ai:module:depends_on host, scheduler, output, error
//! @ai:module:stateless false

use crate::error::Result;
use crate::finding::{RegionStyle, Span};
use crate::host::{BufferView, View};
use crate::output::format_flagged_lines;
use crate::scheduler::Listener;
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

/// @ai:intent View that prints its flagged lines whenever annotations change
///
/// The file on disk is the source of truth, so `save` only refreshes the
/// buffer from it.
pub struct ReportingView {
    buffer: BufferView,
}

impl ReportingView {
    /// @ai:effects fs:read
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            buffer: BufferView::mirror(path)?,
        })
    }

    pub fn buffer(&self) -> &BufferView {
        &self.buffer
    }
}

impl View for ReportingView {
    fn save(&self) -> Result<()> {
        self.buffer.save()
    }

    fn file_path(&self) -> Option<PathBuf> {
        self.buffer.file_path()
    }

    fn line_count(&self) -> usize {
        self.buffer.line_count()
    }

    fn line_span(&self, index: usize) -> Option<Span> {
        self.buffer.line_span(index)
    }

    fn add_regions(&self, key: &str, spans: Vec<Span>, style: &RegionStyle) {
        self.buffer.add_regions(key, spans, style);

        if let Some(set) = self.buffer.regions(key) {
            print!("{}", format_flagged_lines(&self.buffer.text(), &set));
        }
    }

    fn erase_regions(&self, key: &str) {
        self.buffer.erase_regions(key);
    }
}

/// @ai:intent Directory watch on one file, armed before the first analysis runs
pub struct FileWatcher {
    file: PathBuf,
    events: Receiver<notify::Result<Event>>,
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// @ai:intent Start collecting change events for `file`
    /// @ai:post events that happen from now on are queued until `run` drains them
    /// @ai:effects fs:watch
    pub fn new(file: &Path) -> Result<Self> {
        let dir = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let (tx, events) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(tx, NotifyConfig::default())?;
        // Editors often replace files on save, so watch the directory.
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        tracing::info!("Watching {}", file.display());

        Ok(Self {
            file: file.to_path_buf(),
            events,
            _watcher: watcher,
        })
    }

    /// @ai:intent Feed every content change of the file to the listener until `shutdown` is set
    /// @ai:pre the view is backed by the watched file
    /// @ai:effects fs:read, state:write
    pub fn run(
        &self,
        view: Arc<ReportingView>,
        listener: &Listener,
        shutdown: &AtomicBool,
    ) -> Result<()> {
        loop {
            if shutdown.load(Ordering::SeqCst) {
                break;
            }

            match self.events.recv_timeout(Duration::from_millis(250)) {
                Ok(Ok(event)) => {
                    if !touches(&event, &self.file) {
                        continue;
                    }

                    match view.buffer().reload() {
                        Ok(true) => listener.on_modified(view.clone()),
                        Ok(false) => {}
                        Err(e) => {
                            tracing::warn!("Failed to reload {}: {}", self.file.display(), e)
                        }
                    }
                }
                Ok(Err(e)) => tracing::warn!("File watcher error: {:?}", e),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        Ok(())
    }
}

/// @ai:intent Whether a watcher event writes or recreates `file`
/// @ai:effects pure
fn touches(event: &Event, file: &Path) -> bool {
    let relevant = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_));

    relevant
        && event
            .paths
            .iter()
            .any(|path| path.file_name().is_some() && path.file_name() == file.file_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::MockBuildTool;
    use crate::diagnostics::EscapeParser;
    use crate::reconciler::Reconciler;
    use crate::state::AnalysisState;
    use crate::trigger::Analyzer;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use pretty_assertions::assert_eq;
    use std::time::Instant;

    fn analyzer_with(output: &str) -> Arc<Analyzer> {
        Arc::new(Analyzer::new(
            Arc::new(AnalysisState::new()),
            Arc::new(MockBuildTool::new(output)),
            Arc::new(EscapeParser::new()),
            Reconciler::default(),
        ))
    }

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_touches_matches_writes_to_file() {
        let file = Path::new("/proj/main.go");

        assert!(touches(&event(EventKind::Modify(ModifyKind::Any), "/proj/main.go"), file));
        assert!(touches(&event(EventKind::Create(CreateKind::File), "/proj/main.go"), file));
        assert!(!touches(&event(EventKind::Modify(ModifyKind::Any), "/proj/util.go"), file));
        assert!(!touches(&event(EventKind::Remove(RemoveKind::File), "/proj/main.go"), file));
    }

    #[test]
    fn test_reporting_view_delegates_to_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.go");
        std::fs::write(&path, "package main\n").unwrap();

        let view = ReportingView::open(&path).unwrap();
        view.add_regions("k", vec![Span::new(0, 12)], &RegionStyle::default());

        assert_eq!(view.file_path(), Some(path));
        assert_eq!(view.line_count(), 2);
        assert_eq!(view.buffer().regions("k").unwrap().len(), 1);

        view.erase_regions("k");
        assert!(view.buffer().regions("k").is_none());
    }

    #[test]
    fn test_analysis_keeps_newer_disk_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.go");
        std::fs::write(&path, "package main\n// v1\n").unwrap();

        let view = ReportingView::open(&path).unwrap();
        std::fs::write(&path, "package main\n// v2 user edit\n").unwrap();

        analyzer_with("./main.go:2:1: x escapes to heap\n").run_analysis(&view);

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "package main\n// v2 user edit\n"
        );
        assert_eq!(view.buffer().text(), "package main\n// v2 user edit\n");
        assert_eq!(view.buffer().regions("go_heap_allocations").unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_change_before_run_is_delivered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.go");
        std::fs::write(&path, "package main\n").unwrap();

        let view = Arc::new(ReportingView::open(&path).unwrap());
        view.add_regions("go_heap_allocations", vec![Span::new(0, 12)], &RegionStyle::default());
        let watcher = FileWatcher::new(&path).unwrap();

        // Written after the watch is armed but before anything drains it.
        std::fs::write(&path, "package main\n\nvar x = 1\n").unwrap();

        // Analysis is off, so the change only clears the stale annotations.
        let listener = Listener::new(
            analyzer_with(""),
            Duration::from_millis(100),
            tokio::runtime::Handle::current(),
        );
        let shutdown = Arc::new(AtomicBool::new(false));
        let task = {
            let view = Arc::clone(&view);
            let shutdown = Arc::clone(&shutdown);
            tokio::task::spawn_blocking(move || watcher.run(view, &listener, &shutdown))
        };

        let deadline = Instant::now() + Duration::from_secs(5);
        while view.buffer().regions("go_heap_allocations").is_some() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        shutdown.store(true, Ordering::SeqCst);
        task.await.unwrap().unwrap();

        assert_eq!(view.buffer().text(), "package main\n\nvar x = 1\n");
        assert!(view.buffer().regions("go_heap_allocations").is_none());
    }
}
