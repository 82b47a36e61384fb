//! @ai:module:intent Run escape analysis for a view and apply the resulting annotations
//! @ai:module:layer application
//! @ai:module:public_api Analyzer, AnalysisReport
//! @ai:module:depends_on compiler, diagnostics, reconciler, state, host, config
//! @ai:module:stateless false

use crate::compiler::{BuildTool, GoBuild};
use crate::config::Config;
use crate::diagnostics::{normalize_path, DiagnosticParser, EscapeParser};
use crate::finding::{AnnotationSet, Finding};
use crate::host::View;
use crate::reconciler::Reconciler;
use crate::state::AnalysisState;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// @ai:intent Outcome of one analysis run for a single file
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub target: PathBuf,
    pub findings: Vec<Finding>,
    pub annotations: AnnotationSet,
}

/// @ai:intent Owns the build -> parse -> filter -> reconcile pipeline
pub struct Analyzer {
    state: Arc<AnalysisState>,
    tool: Arc<dyn BuildTool>,
    parser: Arc<dyn DiagnosticParser>,
    reconciler: Reconciler,
}

impl Analyzer {
    /// @ai:intent Assemble an analyzer from explicit collaborators
    /// @ai:effects pure
    pub fn new(
        state: Arc<AnalysisState>,
        tool: Arc<dyn BuildTool>,
        parser: Arc<dyn DiagnosticParser>,
        reconciler: Reconciler,
    ) -> Self {
        Self {
            state,
            tool,
            parser,
            reconciler,
        }
    }

    /// @ai:intent Assemble the production analyzer (`go build`, regex parser)
    /// @ai:effects pure
    pub fn from_config(state: Arc<AnalysisState>, config: &Config) -> Self {
        Self::new(
            state,
            Arc::new(GoBuild::new(&config.build)),
            Arc::new(EscapeParser::new()),
            Reconciler::new(config.annotations.key.clone(), config.annotations.style()),
        )
    }

    pub fn state(&self) -> &Arc<AnalysisState> {
        &self.state
    }

    /// @ai:intent Flip the toggle; analyze now when enabling, clear when disabling
    /// @ai:post disabling never invokes the build tool
    /// @ai:effects state:write, fs:write, io, view:write
    pub fn toggle(&self, view: &dyn View) -> bool {
        let target = view.file_path().map(|path| absolute_path(&path));
        let enabled = self.state.toggle(target.as_deref());

        if enabled {
            tracing::info!("Escape analysis enabled");
            self.run_analysis(view);
        } else {
            tracing::info!("Escape analysis disabled");
            self.clear(view);
        }

        enabled
    }

    /// @ai:intent Remove this analyzer's annotations from a view
    /// @ai:effects view:write
    pub fn clear(&self, view: &dyn View) {
        self.reconciler.clear(view);
    }

    /// @ai:intent Save, build, parse, filter to the view's file, and reconcile
    /// @ai:pre view has a backing file, otherwise nothing happens
    /// @ai:post returns the annotation set now displayed in the view
    /// @ai:effects fs:write, io, view:write
    pub fn run_analysis(&self, view: &dyn View) -> Option<AnnotationSet> {
        self.analyze(view).map(|report| report.annotations)
    }

    /// @ai:intent Same as `run_analysis`, also returning the kept findings
    /// @ai:effects fs:write, io, view:write
    pub fn analyze(&self, view: &dyn View) -> Option<AnalysisReport> {
        let Some(path) = view.file_path() else {
            tracing::debug!("Skipping escape analysis for a view without a backing file");
            return None;
        };

        if let Err(e) = view.save() {
            tracing::warn!("Failed to save {} before analysis: {}", path.display(), e);
        }

        let target = absolute_path(&path);
        let dir = target.parent().unwrap_or(Path::new(".")).to_path_buf();

        let diagnostics = match self.tool.diagnostics(&dir) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Escape analysis produced no diagnostics: {}", e);
                String::new()
            }
        };

        let findings = self.findings_for(&diagnostics, &dir, &target);
        let annotations = self.reconciler.reconcile(view, &findings);

        tracing::info!(
            "Flagged {} heap escapes in {}",
            annotations.len(),
            target.display()
        );

        Some(AnalysisReport {
            target,
            findings,
            annotations,
        })
    }

    /// @ai:intent Parse diagnostics and keep only findings for `target`
    /// @ai:effects pure
    fn findings_for(&self, diagnostics: &str, dir: &Path, target: &Path) -> Vec<Finding> {
        self.parser
            .parse(diagnostics, dir)
            .into_iter()
            .filter(|finding| finding.is_for(target))
            .collect()
    }
}

/// @ai:intent Absolute, lexically normalized form of a view's file path
/// @ai:effects pure
fn absolute_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    normalize_path(&absolute)
}
