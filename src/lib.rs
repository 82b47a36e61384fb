//! @ai:module:intent Live Go escape-analysis highlighting for editor views
//! @ai:module:layer infrastructure
//! @ai:module:public_api diagnostics, compiler, reconciler, trigger, scheduler, host, config, output, watch, error
//!
//! # Go escape highlighter
//!
//! Runs `go build -gcflags -m` next to the edited file, extracts the
//! "escapes to heap" diagnostics for that file, and marks the offending lines
//! in the editor view. Edits are debounced so the build only runs once the
//! user has stopped typing.
//!
//! ## Example
//!
//! ```rust,no_run
//! use go_escape_highlighter::{AnalysisState, Analyzer, BufferView, Config};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let analyzer = Analyzer::from_config(Arc::new(AnalysisState::new()), &config);
//! let view = BufferView::open(Path::new("main.go")).unwrap();
//!
//! analyzer.toggle(&view);
//! let set = view.regions(&config.annotations.key).unwrap();
//! println!("{} lines flagged", set.len());
//! ```

pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod finding;
pub mod host;
pub mod output;
pub mod reconciler;
pub mod scheduler;
pub mod state;
pub mod trigger;
pub mod watch;

pub use compiler::{BuildTool, GoBuild, MockBuildTool};
pub use config::{AnnotationConfig, BuildConfig, Config};
pub use diagnostics::{parse_diagnostics, DiagnosticParser, EscapeParser};
pub use error::{Error, Result};
pub use finding::{AnnotationSet, Finding, RegionStyle, Span};
pub use host::{BufferView, View};
pub use output::{format_findings, format_flagged_lines, format_report, OutputFormat};
pub use reconciler::Reconciler;
pub use scheduler::{DebounceScheduler, Listener, SchedulerState};
pub use state::AnalysisState;
pub use trigger::{AnalysisReport, Analyzer};
pub use watch::{FileWatcher, ReportingView};
