//! Presentation model for report lines and sections

use super::glossary;
use super::tokens::{tokenize, Token};
use super::{FormattedReport, Section};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(SOURCE MEMORY STATE|TARGET MEMORY STATE|LOCAL BLOCKS|NON-LOCAL BLOCKS):?$")
        .expect("heading pattern is valid")
});
static FUNCTION_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@[_A-Za-z]").expect("function pattern is valid"));
static FUNCTION_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([_A-Za-z0-9]+)").expect("function pattern is valid"));
static JUMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">>\s*Jump to\s*(%[\w.]+)").expect("jump pattern is valid"));

/// A highlighted phrase with an explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Emphasis {
    pub text: &'static str,
    pub hover: &'static str,
}

/// How a single report line is shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum LineView {
    /// Verifier error message, with at most one explained phrase
    Error {
        before: String,
        emphasis: Option<Emphasis>,
        after: String,
    },
    /// Memory-state heading
    Heading { text: String },
    /// `Function @name ...` line
    Function {
        name: String,
        hover: Option<&'static str>,
        triggered_ub: bool,
    },
    /// `  >> Jump to %label`
    Jump { target: String },
    Tokens { tokens: Vec<Token> },
}

/// Pick the view for a line, trying special shapes before plain tokens
pub fn view_line(line: &str) -> LineView {
    if line.contains("ERROR:") {
        return error_view(line);
    }

    if HEADING_RE.is_match(line) {
        return LineView::Heading {
            text: line.to_string(),
        };
    }

    if line.contains("Function @") || FUNCTION_START_RE.is_match(line) {
        if let Some(caps) = FUNCTION_NAME_RE.captures(line) {
            let name = caps[1].to_string();
            return LineView::Function {
                hover: glossary::symbol_hover(&name),
                triggered_ub: line.contains("triggered UB"),
                name,
            };
        }
    }

    if line.starts_with("  >>") {
        if let Some(caps) = JUMP_RE.captures(line) {
            return LineView::Jump {
                target: caps[1].to_string(),
            };
        }
    }

    LineView::Tokens {
        tokens: tokenize(line),
    }
}

fn error_view(line: &str) -> LineView {
    let message = match line.split_once("ERROR: ") {
        Some((_, rest)) => rest,
        None => line.split_once("ERROR:").map_or(line, |(_, rest)| rest),
    };

    let emphasized = |phrase: &'static str, hover: &'static str| {
        let (before, after) = message.split_once(phrase).unwrap_or((message, ""));
        LineView::Error {
            before: before.to_string(),
            emphasis: Some(Emphasis { text: phrase, hover }),
            after: after.to_string(),
        }
    };

    if message.contains("type check") {
        emphasized("type check", glossary::TYPE_CHECK)
    } else if message.contains("defined") {
        emphasized("defined", glossary::DEFINED_STATE)
    } else if message.contains("Timeout") {
        LineView::Error {
            before: "The verification process ".to_string(),
            emphasis: Some(Emphasis {
                text: "timed out",
                hover: glossary::TIMED_OUT,
            }),
            after: String::new(),
        }
    } else {
        LineView::Error {
            before: message.to_string(),
            emphasis: None,
            after: String::new(),
        }
    }
}

/// A section ready to show
#[derive(Debug, Clone, Serialize)]
pub struct PresentedSection {
    pub section: Section,
    pub title: &'static str,
    pub description: &'static str,
    pub lines: Vec<LineView>,
}

/// Lines to show for a section; a lone empty line reads as "(None)"
pub fn display_lines(lines: &[String]) -> Vec<&str> {
    match lines {
        [only] if only.is_empty() => vec!["(None)"],
        _ => lines.iter().map(String::as_str).collect(),
    }
}

/// Visible sections of a report, in display order, with line views
pub fn present(report: &FormattedReport) -> Vec<PresentedSection> {
    report
        .visible_sections()
        .into_iter()
        .map(|section| PresentedSection {
            section,
            title: section.title(),
            description: section.description(),
            lines: display_lines(report.lines(section))
                .into_iter()
                .map(view_line)
                .collect(),
        })
        .collect()
}
