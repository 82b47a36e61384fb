//! @ai:module:intent Replace a view's displayed escape annotations with fresh findings
//! @ai:module:layer application
//! @ai:module:public_api Reconciler
//! @ai:module:depends_on finding, host
//! @ai:module:stateless true

use crate::finding::{AnnotationSet, Finding, RegionStyle, Span};
use crate::host::View;

/// @ai:intent Maps findings to line regions under one fixed annotation key
#[derive(Debug, Clone)]
pub struct Reconciler {
    key: String,
    style: RegionStyle,
}

impl Reconciler {
    /// @ai:intent Create a reconciler for the given key and style
    /// @ai:effects pure
    pub fn new(key: impl Into<String>, style: RegionStyle) -> Self {
        Self {
            key: key.into(),
            style,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// @ai:intent Clear the old set, then display one region per in-range finding
    /// @ai:post the view shows exactly the returned spans under `key`
    /// @ai:effects view:write
    pub fn reconcile(&self, view: &dyn View, findings: &[Finding]) -> AnnotationSet {
        self.clear(view);

        let line_count = view.line_count();
        let spans: Vec<Span> = findings
            .iter()
            .filter(|finding| (1..=line_count).contains(&finding.line))
            .filter_map(|finding| view.line_span(finding.line_index()))
            .collect();

        let dropped = findings.len() - spans.len();
        if dropped > 0 {
            tracing::debug!("Dropped {} findings past the end of the buffer", dropped);
        }

        view.add_regions(&self.key, spans.clone(), &self.style);

        AnnotationSet {
            key: self.key.clone(),
            spans,
            style: self.style.clone(),
        }
    }

    /// @ai:intent Remove every region this reconciler displays
    /// @ai:effects view:write
    pub fn clear(&self, view: &dyn View) {
        view.erase_regions(&self.key);
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new("go_heap_allocations", RegionStyle::default())
    }
}
