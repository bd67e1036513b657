//! Terminal rendering of formatted reports

use super::glossary;
use super::lines::{present, LineView};
use super::tokens::{Token, TokenKind};
use super::FormattedReport;
use colored::Colorize;
use std::collections::BTreeMap;

/// Rendering switches
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Append a glossary of every explained term that appeared
    pub explain: bool,
}

/// Render a report as colored terminal text
pub fn render_report(report: &FormattedReport, options: &RenderOptions) -> String {
    let mut out = String::new();

    let verdict = if report.success {
        "✔ Translation Verified".green().bold()
    } else {
        "✘ Verification Failed".red().bold()
    };
    out.push_str(&format!("{}\n", verdict));

    let presented = present(report);
    let mut notes: BTreeMap<String, &'static str> = BTreeMap::new();

    for section in &presented {
        out.push('\n');
        out.push_str(&format!(
            "{}\n",
            format!("┌─ {} ", section.title).cyan().bold()
        ));
        out.push_str(&format!("{} {}\n", "│".cyan(), section.description.dimmed()));
        for view in &section.lines {
            out.push_str(&format!("{} {}\n", "│".cyan(), render_line(view)));
            collect_notes(view, &mut notes);
        }
        out.push_str(&format!("{}\n", "└────────────────────────────────────────".cyan()));
    }

    if options.explain && !notes.is_empty() {
        out.push('\n');
        out.push_str(&format!("{}\n", "Glossary:".bold()));
        let width = notes.keys().map(|k| k.chars().count()).max().unwrap_or(0);
        for (term, hover) in &notes {
            out.push_str(&format!("  {:width$}  {}\n", term, hover.dimmed(), width = width));
        }
    }

    out
}

/// Render one line view
pub fn render_line(view: &LineView) -> String {
    match view {
        LineView::Error {
            before,
            emphasis,
            after,
        } => {
            let middle = emphasis
                .as_ref()
                .map(|e| e.text.red().bold().underline().to_string())
                .unwrap_or_default();
            format!("{}{}{}", before.red(), middle, after.red())
        }
        LineView::Heading { text } => text.blue().bold().to_string(),
        LineView::Function {
            name,
            triggered_ub,
            ..
        } => {
            let mut line = format!(
                "{} {}",
                "Function".magenta(),
                format!("@{}", name).green().bold().underline()
            );
            if *triggered_ub {
                line.push_str(&format!(" {}", "triggered UB".red().underline()));
            }
            line
        }
        LineView::Jump { target } => {
            format!("{}{} {}", "  >> ".blue(), "Jump to".underline(), target.magenta())
        }
        LineView::Tokens { tokens } => tokens.iter().map(render_token).collect(),
    }
}

fn render_token(token: &Token) -> String {
    match &token.kind {
        TokenKind::Plain => token.text.clone(),
        TokenKind::Keyword => token.text.underline().to_string(),
        TokenKind::Variable => token.text.magenta().to_string(),
        TokenKind::Global if token.hover.is_some() => token.text.green().bold().underline().to_string(),
        TokenKind::Global => token.text.clone(),
        TokenKind::Hex { digits, annotation } => {
            let mut text = format!("#x{}", digits.yellow());
            if let Some(note) = annotation {
                let spacing = if token.text.contains(" (") { " " } else { "" };
                text.push_str(&format!("{}({})", spacing, note.bright_yellow()));
            }
            text
        }
        TokenKind::MemoryDescriptor { key, value } => format!("{}={}", key, value.bright_yellow()),
        TokenKind::Address => token.text.cyan().to_string(),
    }
}

fn collect_notes(view: &LineView, notes: &mut BTreeMap<String, &'static str>) {
    match view {
        LineView::Error {
            emphasis: Some(emphasis),
            ..
        } => {
            notes.insert(emphasis.text.to_string(), emphasis.hover);
        }
        LineView::Function {
            name,
            hover,
            triggered_ub,
        } => {
            if let Some(hover) = hover {
                notes.insert(format!("@{}", name), hover);
            }
            if *triggered_ub {
                notes.insert("triggered UB".to_string(), glossary::TRIGGERED_UB);
            }
        }
        LineView::Jump { .. } => {
            notes.insert("Jump to".to_string(), glossary::JUMP);
        }
        LineView::Tokens { tokens } => {
            for token in tokens {
                if let Some(hover) = token.hover {
                    let term = match &token.kind {
                        TokenKind::MemoryDescriptor { key, .. } => key.clone(),
                        _ => token.text.clone(),
                    };
                    notes.insert(term, hover);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::format_report;

    fn plain<T>(f: impl FnOnce() -> T) -> T {
        colored::control::set_override(false);
        f()
    }

    #[test]
    fn test_render_failed_report() {
        let text = "ERROR: Value mismatch\n\nExample:\ni32 %x = #x00000001 (1)\n";
        let out = plain(|| render_report(&format_report(text), &RenderOptions::default()));
        assert!(out.starts_with("✘ Verification Failed"));
        assert!(out.contains("┌─ Error Message"));
        assert!(out.contains("│ Value mismatch"));
        assert!(out.contains("┌─ Counterexample"));
        assert!(out.contains("│ i32 %x = #x00000001 (1)"));
        assert!(!out.contains("Glossary:"));
    }

    #[test]
    fn test_render_success_hides_details() {
        let text = "Source:\ni32 %0 = 1\nTransformation seems to be correct!\nSummary:\n";
        let out = plain(|| render_report(&format_report(text), &RenderOptions::default()));
        assert!(out.starts_with("✔ Translation Verified"));
        assert!(!out.contains("Source Program State"));
        assert!(out.contains("│ Summary:"));
    }

    #[test]
    fn test_glossary_lists_terms_once() {
        let text = "Example:\ni32 %a = poison\ni32 %b = poison\n";
        let out = plain(|| render_report(&format_report(text), &RenderOptions { explain: true }));
        let footer = out.split("Glossary:").nth(1).unwrap();
        assert_eq!(footer.matches("poison").count(), 1);
        assert!(footer.contains("32-bit integer type"));
    }

    #[test]
    fn test_glossary_covers_ub_and_jumps() {
        let text = "Example:\nFunction @_ZN4core9panicking5panic17h1E triggered UB\n  >> Jump to %bb1\n";
        let out = plain(|| render_report(&format_report(text), &RenderOptions { explain: true }));
        let footer = out.split("Glossary:").nth(1).unwrap();
        assert!(footer.contains(glossary::TRIGGERED_UB));
        assert!(footer.contains(glossary::JUMP));
        assert!(footer.contains("Rust mangled function name (panic handler)"));
    }

    #[test]
    fn test_render_line_keeps_text() {
        let line = "store ptr %p, ptr @_Z3addii block_id=1 offset=4 #xff";
        let out = plain(|| render_line(&crate::report::view_line(line)));
        assert_eq!(out, line);
    }
}
