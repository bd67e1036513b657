//! Verifier report formatting
//!
//! The validator answers with a plain-text report. [`format_report`] walks it
//! once, line by line, and files every line under a [`Section`]. Which section
//! a line lands in is decided by the first matching entry of [`RULES`]; the
//! order of that table is the precedence of the markers.

pub mod glossary;
pub mod lines;
pub mod render;
pub mod tokens;

pub use lines::{present, view_line, LineView, PresentedSection};
pub use render::{render_report, RenderOptions};
pub use tokens::{tokenize, Token, TokenKind};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Phrase the validator prints when the two modules are equivalent
pub const SUCCESS_PHRASE: &str = "Transformation seems to be correct!";

/// Opens the verifier's rendering of the two IR modules
const IR_SEPARATOR: &str = "----------------------------------------";
/// Opens and closes an undefined-behavior warning
const UB_BANNER: &str = "****************************************";
const TIMEOUT_LINE: &str = "ERROR: Timeout";

/// Named part of a verifier report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Section {
    #[serde(rename = "main")]
    Main,
    #[serde(rename = "source")]
    Source,
    #[serde(rename = "target")]
    Target,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "verifierSourceIR")]
    VerifierSourceIr,
    #[serde(rename = "verifierTargetIR")]
    VerifierTargetIr,
    #[serde(rename = "counterexample")]
    Counterexample,
    #[serde(rename = "undefinedBehaviorWarning")]
    UndefinedBehaviorWarning,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::Main,
        Section::Source,
        Section::Target,
        Section::Error,
        Section::VerifierSourceIr,
        Section::VerifierTargetIr,
        Section::Counterexample,
        Section::UndefinedBehaviorWarning,
    ];

    /// Display order; the summary goes last
    pub const DISPLAY_ORDER: [Section; 8] = [
        Section::VerifierSourceIr,
        Section::VerifierTargetIr,
        Section::UndefinedBehaviorWarning,
        Section::Error,
        Section::Counterexample,
        Section::Source,
        Section::Target,
        Section::Main,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Section::Main => "main",
            Section::Source => "source",
            Section::Target => "target",
            Section::Error => "error",
            Section::VerifierSourceIr => "verifierSourceIR",
            Section::VerifierTargetIr => "verifierTargetIR",
            Section::Counterexample => "counterexample",
            Section::UndefinedBehaviorWarning => "undefinedBehaviorWarning",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Section::Main => "Verifier Summary",
            Section::Source => "Source Program State",
            Section::Target => "Target Program State",
            Section::Error => "Error Message",
            Section::VerifierSourceIr => "Source C++ Program",
            Section::VerifierTargetIr => "Translated Rust Program",
            Section::Counterexample => "Counterexample",
            Section::UndefinedBehaviorWarning => "Undefined Behavior Detected",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Section::Main => "Everything the verifier printed outside the other sections",
            Section::Source => "The state of the source program that leads to verification failure",
            Section::Target => "The state of the target program that leads to verification failure",
            Section::Error => "Why the verifier rejected the translation",
            Section::VerifierSourceIr => "The original C++ program converted to the verifier's IR form",
            Section::VerifierTargetIr => "The translated Rust program converted to the verifier's IR form",
            Section::Counterexample => "The counterexample used to justify the failure of the translation",
            Section::UndefinedBehaviorWarning => "Undefined behavior detected for the original C++ program",
        }
    }

    /// Sections that only make sense when verification failed
    pub fn is_failure_detail(self) -> bool {
        matches!(
            self,
            Section::Error | Section::Counterexample | Section::Source | Section::Target
        )
    }
}

/// A verifier report split into sections
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedReport {
    pub success: bool,
    pub sections: BTreeMap<Section, Vec<String>>,
}

impl FormattedReport {
    fn empty(success: bool) -> Self {
        Self {
            success,
            sections: Section::ALL.iter().map(|s| (*s, Vec::new())).collect(),
        }
    }

    pub fn lines(&self, section: Section) -> &[String] {
        self.sections.get(&section).map(Vec::as_slice).unwrap_or(&[])
    }

    fn push(&mut self, section: Section, line: impl Into<String>) {
        self.sections.entry(section).or_default().push(line.into());
    }

    /// Non-empty sections in display order, without failure details on success
    pub fn visible_sections(&self) -> Vec<Section> {
        Section::DISPLAY_ORDER
            .into_iter()
            .filter(|s| !(self.success && s.is_failure_detail()))
            .filter(|s| !self.lines(*s).is_empty())
            .collect()
    }
}

/// Where the classification pass currently is
#[derive(Debug, Clone, Copy)]
struct Cursor {
    section: Section,
    in_verifier_ir: bool,
    in_ub_warning: bool,
}

/// What happens to the line after a rule fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// The rule took care of the line (or dropped it)
    Consumed,
    /// Append the line to the cursor's section
    Append,
}

struct Rule {
    name: &'static str,
    matches: fn(&str, &Cursor) -> bool,
    apply: fn(&str, &mut Cursor, &mut FormattedReport) -> Flow,
}

/// Marker rules, highest precedence first
static RULES: &[Rule] = &[
    Rule {
        name: "verifier-ir-separator",
        matches: |line, _| line.starts_with(IR_SEPARATOR),
        apply: |_, cursor, _| {
            cursor.in_verifier_ir = true;
            cursor.section = Section::VerifierSourceIr;
            Flow::Consumed
        },
    },
    Rule {
        name: "verifier-target-arrow",
        matches: |line, _| line.starts_with("=>"),
        apply: |_, cursor, _| {
            cursor.section = Section::VerifierTargetIr;
            Flow::Consumed
        },
    },
    Rule {
        name: "timeout",
        matches: |line, _| line == TIMEOUT_LINE,
        apply: |line, _, report| {
            report.push(Section::Error, line);
            Flow::Consumed
        },
    },
    Rule {
        name: "transformation-verdict",
        matches: |line, _| line.starts_with("Transformation"),
        apply: |_, cursor, _| {
            cursor.in_verifier_ir = false;
            cursor.section = Section::Main;
            Flow::Consumed
        },
    },
    Rule {
        name: "counterexample",
        matches: |line, _| line.starts_with("Example:"),
        apply: |_, cursor, _| {
            cursor.section = Section::Counterexample;
            Flow::Consumed
        },
    },
    Rule {
        name: "ub-banner",
        matches: |line, _| line == UB_BANNER,
        apply: |_, cursor, _| {
            cursor.in_ub_warning = !cursor.in_ub_warning;
            Flow::Consumed
        },
    },
    Rule {
        name: "ub-warning-body",
        matches: |_, cursor| cursor.in_ub_warning,
        apply: |line, _, report| {
            report.push(Section::UndefinedBehaviorWarning, line);
            Flow::Consumed
        },
    },
    Rule {
        name: "error-marker",
        matches: |line, cursor| !cursor.in_verifier_ir && line.starts_with("ERROR:"),
        apply: |_, cursor, _| {
            cursor.section = Section::Error;
            Flow::Append
        },
    },
    Rule {
        name: "source-marker",
        matches: |line, cursor| !cursor.in_verifier_ir && line.starts_with("Source:"),
        apply: |_, cursor, _| {
            cursor.section = Section::Source;
            Flow::Consumed
        },
    },
    Rule {
        name: "target-marker",
        matches: |line, cursor| !cursor.in_verifier_ir && line.starts_with("Target:"),
        apply: |_, cursor, _| {
            cursor.section = Section::Target;
            Flow::Consumed
        },
    },
    Rule {
        name: "memory-state-banner",
        matches: |line, cursor| {
            !cursor.in_verifier_ir
                && (line.starts_with("SOURCE MEMORY STATE") || line.starts_with("TARGET MEMORY STATE"))
        },
        apply: |_, cursor, report| {
            report.push(cursor.section, "");
            Flow::Append
        },
    },
];

/// First rule that claims `line` under `cursor`
fn matching_rule(line: &str, cursor: &Cursor) -> Option<&'static Rule> {
    RULES.iter().find(|rule| (rule.matches)(line, cursor))
}

/// Split a verifier report into sections
///
/// Text without any known marker ends up entirely in [`Section::Main`].
pub fn format_report(output: &str) -> FormattedReport {
    let mut report = FormattedReport::empty(output.contains(SUCCESS_PHRASE));
    let mut cursor = Cursor {
        section: Section::Main,
        in_verifier_ir: false,
        in_ub_warning: false,
    };

    for raw in output.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        let flow = match matching_rule(line, &cursor) {
            Some(rule) => (rule.apply)(line, &mut cursor, &mut report),
            None => Flow::Append,
        };
        if flow == Flow::Append {
            report.push(cursor.section, line);
        }
    }

    report
}

/// Rule names in precedence order
pub fn rule_names() -> Vec<&'static str> {
    RULES.iter().map(|rule| rule.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAILED_ADD: &str = "\
----------------------------------------
define i32 @src(i32 noundef %a, i32 noundef %b) {
#0:
  %0 = add nsw i32 %a, %b
  ret i32 %0
}
=>
define i32 @tgt(i32 noundef %a, i32 noundef %b) {
#0:
  %0 = add i32 %a, %b
  ret i32 %0
}
Transformation doesn't verify!

ERROR: Target is more poisonous than source

Example:
i32 noundef %a = #x80000000 (2147483648, -2147483648)
i32 noundef %b = #xffffffff (4294967295, -1)

Source:
i32 %0 = poison

SOURCE MEMORY STATE
===================
NON-LOCAL BLOCKS:
Block 0 >\tsize: 0\talign: 1\talloc type: 0\talive: false\taddress: 0

Target:
i32 %0 = #x7fffffff (2147483647)
Source value: poison
Target value: #x7fffffff (2147483647)
";

    const CORRECT_ADD: &str = "\
----------------------------------------
define i32 @src(i32 noundef %a, i32 noundef %b) {
#0:
  %0 = add i32 %a, %b
  ret i32 %0
}
=>
define i32 @tgt(i32 noundef %a, i32 noundef %b) {
#0:
  %0 = add i32 %a, %b
  ret i32 %0
}
Transformation seems to be correct!

Summary:
  1 correct transformations
  0 incorrect transformations
";

    fn lines(report: &FormattedReport, section: Section) -> Vec<&str> {
        report.lines(section).iter().map(String::as_str).collect()
    }

    #[test]
    fn test_failed_report_sections() {
        let report = format_report(FAILED_ADD);
        assert!(!report.success);

        assert_eq!(
            lines(&report, Section::VerifierSourceIr),
            vec![
                "define i32 @src(i32 noundef %a, i32 noundef %b) {",
                "#0:",
                "  %0 = add nsw i32 %a, %b",
                "  ret i32 %0",
                "}",
            ]
        );
        assert_eq!(lines(&report, Section::VerifierTargetIr).len(), 5);
        assert_eq!(
            lines(&report, Section::Error),
            vec!["ERROR: Target is more poisonous than source", ""]
        );
        assert_eq!(lines(&report, Section::Main), vec![""]);
        assert_eq!(
            lines(&report, Section::Counterexample),
            vec![
                "i32 noundef %a = #x80000000 (2147483648, -2147483648)",
                "i32 noundef %b = #xffffffff (4294967295, -1)",
                "",
            ]
        );
        assert_eq!(
            lines(&report, Section::Source),
            vec![
                "i32 %0 = poison",
                "",
                "",
                "SOURCE MEMORY STATE",
                "===================",
                "NON-LOCAL BLOCKS:",
                "Block 0 >\tsize: 0\talign: 1\talloc type: 0\talive: false\taddress: 0",
                "",
            ]
        );
        assert_eq!(
            lines(&report, Section::Target),
            vec![
                "i32 %0 = #x7fffffff (2147483647)",
                "Source value: poison",
                "Target value: #x7fffffff (2147483647)",
                "",
            ]
        );
    }

    #[test]
    fn test_markers_are_dropped() {
        let report = format_report(FAILED_ADD);
        for (_, section_lines) in &report.sections {
            for line in section_lines {
                assert!(!line.starts_with("Source:"));
                assert!(!line.starts_with("Target:"));
                assert!(!line.starts_with("Example:"));
                assert!(!line.starts_with("Transformation"));
                assert!(!line.starts_with("----"));
                assert_ne!(line, "=>");
            }
        }
    }

    #[test]
    fn test_success_report() {
        let report = format_report(CORRECT_ADD);
        assert!(report.success);
        assert!(report.lines(Section::Counterexample).is_empty());
        assert!(report.lines(Section::Source).is_empty());
        assert!(report.lines(Section::Target).is_empty());
        assert_eq!(
            lines(&report, Section::Main),
            vec!["", "Summary:", "  1 correct transformations", "  0 incorrect transformations", ""]
        );
        assert_eq!(
            report.visible_sections(),
            vec![Section::VerifierSourceIr, Section::VerifierTargetIr, Section::Main]
        );
    }

    #[test]
    fn test_formatting_is_idempotent() {
        assert_eq!(format_report(FAILED_ADD), format_report(FAILED_ADD));
        assert_eq!(format_report(CORRECT_ADD), format_report(CORRECT_ADD));
    }

    #[test]
    fn test_source_then_target() {
        let report = format_report("Source:\nfirst block\nTarget:\nsecond block");
        assert_eq!(lines(&report, Section::Source), vec!["first block"]);
        assert_eq!(lines(&report, Section::Target), vec!["second block"]);
        assert!(report.lines(Section::Main).is_empty());
    }

    #[test]
    fn test_ub_banner_content_is_isolated() {
        let text = "before\n****************************************\nERROR: something undefined\nSource: x\n****************************************\nafter";
        let report = format_report(text);
        assert_eq!(
            lines(&report, Section::UndefinedBehaviorWarning),
            vec!["ERROR: something undefined", "Source: x"]
        );
        assert_eq!(lines(&report, Section::Main), vec!["before", "after"]);
        assert!(report.lines(Section::Error).is_empty());
        assert!(report.lines(Section::Source).is_empty());
        for (_, section_lines) in &report.sections {
            assert!(section_lines.iter().all(|l| l != UB_BANNER));
        }
    }

    #[test]
    fn test_timeout_goes_to_error() {
        let report = format_report("----------------------------------------\ndefine void @src()\nERROR: Timeout\n");
        assert_eq!(lines(&report, Section::Error), vec!["ERROR: Timeout"]);
        assert_eq!(lines(&report, Section::VerifierSourceIr), vec!["define void @src()", ""]);
    }

    #[test]
    fn test_markers_inside_verifier_ir_are_content() {
        let report = format_report("----------------------------------------\nSource: kept\nERROR: kept too");
        assert_eq!(
            lines(&report, Section::VerifierSourceIr),
            vec!["Source: kept", "ERROR: kept too"]
        );
        assert!(report.lines(Section::Error).is_empty());
    }

    #[test]
    fn test_unmarked_text_is_main() {
        let text = "connection refused\nretry later";
        let report = format_report(text);
        assert!(!report.success);
        assert_eq!(lines(&report, Section::Main), vec!["connection refused", "retry later"]);
        assert_eq!(report.visible_sections(), vec![Section::Main]);
    }

    #[test]
    fn test_empty_input() {
        let report = format_report("");
        assert_eq!(lines(&report, Section::Main), vec![""]);
        assert_eq!(report.sections.len(), Section::ALL.len());
    }

    #[test]
    fn test_crlf_lines() {
        let report = format_report("Source:\r\nx\r\n");
        assert_eq!(lines(&report, Section::Source), vec!["x", ""]);
    }

    #[test]
    fn test_rule_precedence_order() {
        assert_eq!(
            rule_names(),
            vec![
                "verifier-ir-separator",
                "verifier-target-arrow",
                "timeout",
                "transformation-verdict",
                "counterexample",
                "ub-banner",
                "ub-warning-body",
                "error-marker",
                "source-marker",
                "target-marker",
                "memory-state-banner",
            ]
        );
    }

    #[test]
    fn test_section_keys_match_serialization() {
        for section in Section::ALL {
            let json = serde_json::to_value(section).unwrap();
            assert_eq!(json, section.key());
        }
    }
}
