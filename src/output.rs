//! @ai:module:intent Format analysis results for the terminal (text, JSON)
//! @ai:module:layer infrastructure
//! @ai:module:public_api OutputFormat, format_report, format_findings, format_flagged_lines
//! @ai:module:depends_on finding, trigger
//! @ai:module:stateless true

use crate::finding::{AnnotationSet, Finding};
use crate::trigger::AnalysisReport;
use colored::Colorize;

/// @ai:intent Output format options
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

/// @ai:intent Format an analysis report as a string
/// @ai:effects pure
pub fn format_report(report: &AnalysisReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(report).unwrap_or_default(),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(report).unwrap_or_default(),
        OutputFormat::Text => format_findings_text(&report.findings),
    }
}

/// @ai:intent Format a list of findings as a string
/// @ai:effects pure
pub fn format_findings(findings: &[Finding], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(findings).unwrap_or_default(),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(findings).unwrap_or_default(),
        OutputFormat::Text => format_findings_text(findings),
    }
}

/// @ai:intent Format findings as human-readable text
/// @ai:effects pure
fn format_findings_text(findings: &[Finding]) -> String {
    let mut output = String::new();

    for finding in findings {
        let location = format!("{}:{}", finding.source_path.display(), finding.line);

        output.push_str(&format!(
            "{} {} {}\n",
            location.dimmed(),
            finding.description,
            "escapes to heap".red().bold()
        ));
    }

    if findings.is_empty() {
        output.push_str(&format!("{} No heap escapes found\n", "OK".green().bold()));
    } else {
        output.push_str(&format!(
            "\n{} heap escapes\n",
            findings.len().to_string().yellow().bold()
        ));
    }

    output
}

/// @ai:intent Render the lines covered by an annotation set, numbered from 1
/// @ai:effects pure
pub fn format_flagged_lines(text: &str, set: &AnnotationSet) -> String {
    let mut output = String::new();

    for span in &set.spans {
        let Some(line) = text.get(span.start..span.end) else {
            continue;
        };
        let line_number = text[..span.start].matches('\n').count() + 1;

        output.push_str(&format!(
            "{} {} {}\n",
            "●".red(),
            format!("{:>5}", line_number).dimmed(),
            line.trim_end()
        ));
    }

    if set.is_empty() {
        output.push_str(&format!("{} No heap escapes\n", "OK".green().bold()));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::{RegionStyle, Span};
    use std::path::PathBuf;

    fn finding(line: usize, description: &str) -> Finding {
        Finding {
            source_path: PathBuf::from("./main.go"),
            resolved_path: PathBuf::from("/proj/main.go"),
            line,
            description: description.to_string(),
        }
    }

    #[test]
    fn test_text_output_lists_each_finding() {
        colored::control::set_override(false);

        let text = format_findings(&[finding(3, "&x"), finding(9, "buf")], OutputFormat::Text);

        assert!(text.contains("./main.go:3 &x escapes to heap"));
        assert!(text.contains("./main.go:9 buf escapes to heap"));
        assert!(text.contains("2 heap escapes"));
    }

    #[test]
    fn test_text_output_without_findings() {
        colored::control::set_override(false);
        assert!(format_findings(&[], OutputFormat::Text).contains("No heap escapes found"));
    }

    #[test]
    fn test_json_output_is_parseable() {
        let json = format_findings(&[finding(3, "&x")], OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["line"], 3);
        assert_eq!(value[0]["description"], "&x");
    }

    #[test]
    fn test_flagged_lines_are_numbered() {
        colored::control::set_override(false);
        let text = "package main\n\nvar p = &T{}\n";
        let set = AnnotationSet {
            key: "k".to_string(),
            spans: vec![Span::new(14, 26)],
            style: RegionStyle::default(),
        };

        let rendered = format_flagged_lines(text, &set);

        assert!(rendered.contains("    3 var p = &T{}"));
    }
}
