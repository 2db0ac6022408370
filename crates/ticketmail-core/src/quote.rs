//! Quoted-reply folding.
//!
//! Finds where the quoted history of a reply starts and either drops it or
//! tucks it into a collapsible `<details>` block, so issue comments show only
//! what the sender actually wrote.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Label of the disclosure toggle.
const SUMMARY: &str = "Show quoted email";

/// Minimum number of `>` lines that make a quote block.
const QUOTE_BLOCK_LINES: usize = 3;

/// Header-like lines that open a quoted or forwarded message, in priority
/// order. Matched against the trimmed line.
const RULE_PATTERNS: &[(&str, &str)] = &[
    ("reply-attribution", r"(?i)^On .+ wrote:"),
    ("from-header", r"(?i)^\**From:\s*.+@.+"),
    ("sent-header", r"(?i)^Sent:\s*"),
    ("to-header", r"(?i)^\**To:\s*"),
    ("subject-header", r"(?i)^\**Subject:\s*"),
    ("original-message", r"(?i)^-+ ?Original Message ?-+"),
    ("forwarded-message", r"(?i)^Begin forwarded message:"),
    ("signature", r"^--\s*$"),
];

/// A single line predicate marking the start of quoted content.
struct QuoteRule {
    name: &'static str,
    pattern: Regex,
}

static QUOTE_RULES: LazyLock<Vec<QuoteRule>> = LazyLock::new(compile_rules);

#[allow(clippy::expect_used)]
fn compile_rules() -> Vec<QuoteRule> {
    RULE_PATTERNS
        .iter()
        .map(|&(name, pattern)| QuoteRule {
            name,
            pattern: Regex::new(pattern).expect("quote rule patterns are valid literals"),
        })
        .collect()
}

/// Folds the quoted part of a Markdown reply.
///
/// Scans non-blank lines top to bottom. The split point is the first line
/// that opens a run of at least three `>` lines (blank lines inside the run
/// are allowed) or that matches one of the header-like rules. Everything
/// before the split is the visible reply; everything from it on is quoted.
///
/// - No split: the input is returned unchanged.
/// - Nothing visible: only the disclosure block, whatever `discard_quotes` says.
/// - `discard_quotes`: the visible reply plus a newline.
/// - Otherwise: the visible reply, a blank line, and the disclosure block.
///
/// ```
/// use ticketmail_core::fold_quotes;
///
/// let reply = "Thanks!\n\nOn Mon, Jan 1, Ann wrote:\n> hi";
/// assert_eq!(fold_quotes(reply, true), "Thanks!\n");
/// ```
#[must_use]
pub fn fold_quotes(markdown: &str, discard_quotes: bool) -> String {
    if markdown.trim().is_empty() {
        return markdown.to_string();
    }

    let lines: Vec<&str> = markdown.split('\n').collect();
    let Some(split) = find_split(&lines) else {
        return markdown.to_string();
    };

    let visible = &lines[..split];
    let end = visible
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(0, |last| last + 1);
    let visible = visible[..end].join("\n");
    let visible = visible.trim_end();
    let quoted = lines[split..].join("\n");
    let quoted = quoted.trim_matches(['\r', '\n']);

    let details = format!("<details>\n<summary>{SUMMARY}</summary>\n\n{quoted}\n\n</details>");

    if visible.trim().is_empty() {
        details
    } else if discard_quotes {
        format!("{visible}\n")
    } else {
        format!("{visible}\n\n{details}")
    }
}

fn find_split(lines: &[&str]) -> Option<usize> {
    for (index, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if starts_quote_block(&lines[index..]) {
            debug!(line = index, "quote block found");
            return Some(index);
        }
        if let Some(rule) = QUOTE_RULES.iter().find(|rule| rule.pattern.is_match(trimmed)) {
            debug!(line = index, rule = rule.name, "quoted content found");
            return Some(index);
        }
    }
    None
}

/// Whether `lines` opens with at least [`QUOTE_BLOCK_LINES`] `>` lines,
/// ignoring interleaved blank lines.
fn starts_quote_block(lines: &[&str]) -> bool {
    let mut count = 0;
    for line in lines {
        let trimmed = line.trim();
        if trimmed.starts_with('>') {
            count += 1;
            if count >= QUOTE_BLOCK_LINES {
                return true;
            }
        } else if !trimmed.is_empty() {
            return false;
        }
    }
    false
}
