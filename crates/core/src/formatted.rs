//! Line-oriented renderer for the small Markdown subset produced by study
//! guides, summaries and chat answers: `#` headings, `*`/`-` bullets,
//! `**bold**` runs, whole-fragment `` `code` `` and blank spacer lines.
//!
//! Every input line maps to exactly one [`TextBlock`]; anything unrecognised
//! degrades to a paragraph of plain text.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static BOLD_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*.*?\*\*").expect("bold pattern compiles"));

/// A styled fragment of a single line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "style", content = "text", rename_all = "snake_case")]
pub enum InlineSpan {
    Plain(String),
    Bold(String),
    Code(String),
}

impl InlineSpan {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            InlineSpan::Plain(t) | InlineSpan::Bold(t) | InlineSpan::Code(t) => t,
        }
    }
}

/// One rendered line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextBlock {
    Heading { text: String },
    ListItem { spans: Vec<InlineSpan> },
    Paragraph { spans: Vec<InlineSpan> },
    Blank,
}

impl TextBlock {
    /// Text of the block with all styling dropped.
    #[must_use]
    pub fn plain_text(&self) -> String {
        match self {
            TextBlock::Heading { text } => text.clone(),
            TextBlock::ListItem { spans } | TextBlock::Paragraph { spans } => {
                spans.iter().map(InlineSpan::text).collect()
            }
            TextBlock::Blank => String::new(),
        }
    }
}

/// Render `text` into one block per line.
///
/// ```
/// use nexus_core::formatted::{render, InlineSpan, TextBlock};
///
/// let blocks = render("### Dosing\n* take **twice** daily");
/// assert_eq!(blocks[0], TextBlock::Heading { text: "Dosing".into() });
/// assert_eq!(
///     blocks[1],
///     TextBlock::ListItem {
///         spans: vec![
///             InlineSpan::Plain("take ".into()),
///             InlineSpan::Bold("twice".into()),
///             InlineSpan::Plain(" daily".into()),
///         ]
///     }
/// );
/// ```
#[must_use]
pub fn render(text: &str) -> Vec<TextBlock> {
    text.lines().map(render_line).collect()
}

fn render_line(line: &str) -> TextBlock {
    let leading = line.trim_start();
    if leading.starts_with('#') {
        // Trailing whitespace belongs to the heading text.
        let text = leading.trim_start_matches('#').trim_start().replace("**", "");
        return TextBlock::Heading { text };
    }

    let trimmed = leading.trim_end();

    if trimmed.starts_with("* ") || trimmed.starts_with("- ") {
        // Marker plus any run of spaces after it.
        let content = trimmed[1..].trim_start();
        return TextBlock::ListItem {
            spans: parse_inline(content),
        };
    }

    if trimmed.is_empty() {
        return TextBlock::Blank;
    }

    TextBlock::Paragraph {
        spans: parse_inline(line),
    }
}

/// Split on non-greedy `**…**` runs, keeping the runs as their own fragments.
#[must_use]
pub fn parse_inline(content: &str) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    let mut last = 0;
    for m in BOLD_RUN.find_iter(content) {
        push_fragment(&mut spans, &content[last..m.start()]);
        push_fragment(&mut spans, m.as_str());
        last = m.end();
    }
    push_fragment(&mut spans, &content[last..]);
    spans
}

fn push_fragment(spans: &mut Vec<InlineSpan>, fragment: &str) {
    if fragment.is_empty() {
        return;
    }
    let span = if fragment.len() > 4 && fragment.starts_with("**") && fragment.ends_with("**") {
        InlineSpan::Bold(fragment[2..fragment.len() - 2].to_owned())
    } else if fragment.len() >= 2 && fragment.starts_with('`') && fragment.ends_with('`') {
        InlineSpan::Code(fragment[1..fragment.len() - 1].to_owned())
    } else {
        InlineSpan::Plain(fragment.to_owned())
    };
    spans.push(span);
}
