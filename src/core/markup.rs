// LogPoller - core/markup.rs
//
// Snapshot comparison and display preparation.
//
// The poller treats snapshots as opaque for comparison and replacement. This
// module only provides:
//   - `snapshots_equal`: the change test, in either exact or text-content mode
//   - `text_content`: tag-stripped, entity-decoded text (for text mode)
//   - `render_lines`: a line-by-line view for the GUI and terminal regions,
//     honouring inline `color:` styles and falling back to level keywords
//
// The log-stream server wraps each line in `<div style="color:...">` chosen
// by level; plain-text snapshots are coloured by the level keyword instead.

use crate::core::model::ComparisonMode;
use regex::{Captures, Regex};
use std::sync::OnceLock;

// =============================================================================
// Severity
// =============================================================================

/// Severity detected from a log line, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Severity {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
    #[default]
    Unknown,
}

impl Severity {
    /// Detect the level from the first level keyword in `line`.
    pub fn detect(line: &str) -> Severity {
        static LEVEL_RE: OnceLock<Regex> = OnceLock::new();
        let re = LEVEL_RE.get_or_init(|| {
            Regex::new(r"\b(CRITICAL|FATAL|ERROR|WARNING|WARN|INFO|DEBUG|TRACE)\b")
                .expect("Severity::detect: invalid regex")
        });
        match re.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str()) {
            Some("CRITICAL") | Some("FATAL") => Severity::Critical,
            Some("ERROR") => Severity::Error,
            Some("WARNING") | Some("WARN") => Severity::Warning,
            Some("INFO") => Severity::Info,
            Some("DEBUG") | Some("TRACE") => Severity::Debug,
            _ => Severity::Unknown,
        }
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Info => "Info",
            Severity::Debug => "Debug",
            Severity::Unknown => "Unknown",
        }
    }
}

// =============================================================================
// Rendered lines
// =============================================================================

/// How a rendered line should be coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// An inline `color:` style supplied by the server (RGB).
    Explicit([u8; 3]),
    /// No inline colour; coloured by detected level.
    Level(Severity),
}

/// One display line of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub text: String,
    pub style: LineStyle,
}

// =============================================================================
// Comparison
// =============================================================================

/// True if `displayed` and `fetched` count as the same content under `mode`.
pub fn snapshots_equal(displayed: &str, fetched: &str, mode: ComparisonMode) -> bool {
    match mode {
        ComparisonMode::Exact => displayed == fetched,
        ComparisonMode::TextContent => text_content(displayed) == text_content(fetched),
    }
}

/// Text content of a markup fragment: tags removed, entities decoded.
/// Whitespace is kept as-is.
pub fn text_content(markup: &str) -> String {
    decode_entities(&tag_re().replace_all(markup, ""))
}

// =============================================================================
// Line rendering
// =============================================================================

/// Elements that start and end a display line.
const BLOCK_TAGS: &[&str] = &[
    "div", "p", "li", "tr", "pre", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article",
];

/// Elements with no closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "meta", "link", "input", "wbr"];

/// Split a snapshot into display lines.
///
/// Markup-free snapshots are split on newlines. Markup snapshots break lines
/// at block elements, `<br>` and newlines; blank lines are kept only for
/// explicit `<br>` breaks.
pub fn render_lines(snapshot: &str) -> Vec<RenderedLine> {
    if !tag_re().is_match(snapshot) {
        return snapshot
            .lines()
            .map(|line| RenderedLine {
                text: line.to_string(),
                style: LineStyle::Level(Severity::detect(line)),
            })
            .collect();
    }

    let mut builder = LineBuilder::default();
    // Open elements and the colour each one set (None = inherited).
    let mut stack: Vec<(String, Option<[u8; 3]>)> = Vec::new();
    let mut cursor = 0;

    for caps in element_re().captures_iter(snapshot) {
        let whole = caps.get(0).expect("capture 0 always present");
        builder.text(&snapshot[cursor..whole.start()], current_colour(&stack));
        cursor = whole.end();

        let closing = !caps[1].is_empty();
        let name = caps[2].to_lowercase();
        let attrs = caps.get(3).map(|m| m.as_str()).unwrap_or("");
        let block = BLOCK_TAGS.contains(&name.as_str());

        if name == "br" {
            builder.break_line(true);
            continue;
        }
        if VOID_TAGS.contains(&name.as_str()) || attrs.trim_end().ends_with('/') {
            if block {
                builder.break_line(false);
            }
            continue;
        }

        if closing {
            if block {
                builder.break_line(false);
            }
            if let Some(pos) = stack.iter().rposition(|(open, _)| *open == name) {
                stack.truncate(pos);
            }
        } else {
            if block {
                builder.break_line(false);
            }
            stack.push((name, style_colour(attrs)));
        }
    }
    builder.text(&snapshot[cursor..], current_colour(&stack));
    builder.break_line(false);
    builder.lines
}

#[derive(Default)]
struct LineBuilder {
    lines: Vec<RenderedLine>,
    current: String,
    colour: Option<[u8; 3]>,
}

impl LineBuilder {
    fn text(&mut self, raw: &str, colour: Option<[u8; 3]>) {
        if raw.is_empty() || (self.current.is_empty() && raw.trim().is_empty()) {
            return;
        }
        // Comments and doctype declarations are not elements; drop them.
        let decoded = decode_entities(&tag_re().replace_all(raw, ""));
        let mut parts = decoded.split('\n').peekable();
        while let Some(part) = parts.next() {
            if self.current.is_empty() {
                self.colour = colour;
            }
            self.current.push_str(part.trim_end_matches('\r'));
            if parts.peek().is_some() {
                self.break_line(false);
            }
        }
    }

    /// End the current line. `force` keeps empty lines (explicit breaks).
    fn break_line(&mut self, force: bool) {
        if self.current.is_empty() && !force {
            return;
        }
        let text = std::mem::take(&mut self.current);
        let style = match self.colour.take() {
            Some(rgb) => LineStyle::Explicit(rgb),
            None => LineStyle::Level(Severity::detect(&text)),
        };
        self.lines.push(RenderedLine { text, style });
    }
}

fn current_colour(stack: &[(String, Option<[u8; 3]>)]) -> Option<[u8; 3]> {
    stack.iter().rev().find_map(|(_, colour)| *colour)
}

/// Extract the `color:` value from an element's attribute text.
fn style_colour(attrs: &str) -> Option<[u8; 3]> {
    static COLOUR_RE: OnceLock<Regex> = OnceLock::new();
    let re = COLOUR_RE.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[;\s])color\s*:\s*(#[0-9a-f]{3,6}|[a-z]+)")
            .expect("style_colour: invalid regex")
    });
    let style = style_attr(attrs)?;
    let value = re.captures(style)?.get(1)?.as_str().to_lowercase();
    parse_colour(&value)
}

fn style_attr(attrs: &str) -> Option<&str> {
    static STYLE_RE: OnceLock<Regex> = OnceLock::new();
    let re = STYLE_RE.get_or_init(|| {
        Regex::new(r#"(?i)style\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .expect("style_attr: invalid regex")
    });
    let caps = re.captures(attrs)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

/// CSS colour name or hex literal to RGB. Unknown names yield `None`.
fn parse_colour(value: &str) -> Option<[u8; 3]> {
    if let Some(hex) = value.strip_prefix('#') {
        let expand = |s: &str| u8::from_str_radix(s, 16).ok();
        return match hex.len() {
            6 => Some([expand(&hex[0..2])?, expand(&hex[2..4])?, expand(&hex[4..6])?]),
            3 => {
                let c = |i: usize| expand(&hex[i..=i]).map(|v| v * 17);
                Some([c(0)?, c(1)?, c(2)?])
            }
            _ => None,
        };
    }
    let rgb = match value {
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "red" => [255, 0, 0],
        "green" => [0, 128, 0],
        "lime" => [0, 255, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "orange" => [255, 165, 0],
        "purple" => [128, 0, 128],
        "gray" | "grey" => [128, 128, 128],
        "silver" => [192, 192, 192],
        "maroon" => [128, 0, 0],
        "navy" => [0, 0, 128],
        "teal" => [0, 128, 128],
        _ => return None,
    };
    Some(rgb)
}

// =============================================================================
// Shared helpers
// =============================================================================

fn tag_re() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag_re: invalid regex"))
}

fn element_re() -> &'static Regex {
    static ELEMENT_RE: OnceLock<Regex> = OnceLock::new();
    ELEMENT_RE.get_or_init(|| {
        Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9]*)([^>]*)>").expect("element_re: invalid regex")
    })
}

/// Decode named and numeric character references. Unknown references are
/// left untouched.
fn decode_entities(text: &str) -> String {
    static ENTITY_RE: OnceLock<Regex> = OnceLock::new();
    let re = ENTITY_RE.get_or_init(|| {
        Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);")
            .expect("decode_entities: invalid regex")
    });
    if !text.contains('&') {
        return text.to_string();
    }
    re.replace_all(text, |caps: &Captures| {
        let name = &caps[1];
        let decoded = if let Some(hex) = name.strip_prefix("#x").or(name.strip_prefix("#X")) {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = name.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(char::from_u32)
        } else {
            match name {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{00a0}'),
                _ => None,
            }
        };
        match decoded {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        }
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_mode_distinguishes_markup() {
        assert!(snapshots_equal(
            "<div>log A</div>",
            "<div>log A</div>",
            ComparisonMode::Exact
        ));
        assert!(!snapshots_equal(
            "<div>log A</div>",
            "<div style=\"color:red\">log A</div>",
            ComparisonMode::Exact
        ));
    }

    #[test]
    fn test_text_mode_ignores_markup_only_changes() {
        assert!(snapshots_equal(
            "<div>log A</div>",
            "<div style=\"color:red\">log A</div>",
            ComparisonMode::TextContent
        ));
        assert!(!snapshots_equal(
            "<div>log A</div>",
            "<div>log B</div>",
            ComparisonMode::TextContent
        ));
    }

    #[test]
    fn test_text_mode_keeps_whitespace_significant() {
        assert!(!snapshots_equal("log  A", "log A", ComparisonMode::TextContent));
    }

    #[test]
    fn test_text_content_decodes_entities() {
        assert_eq!(text_content("<b>a &lt; b &amp;&amp; c</b>"), "a < b && c");
        assert_eq!(text_content("&#65;&#x42;&unknown;"), "AB&unknown;");
    }

    #[test]
    fn test_plain_text_lines_get_levels() {
        let lines = render_lines(
            "2024-01-01 | INFO     | started\n2024-01-01 | ERROR    | boom\nno level\n",
        );
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].style, LineStyle::Level(Severity::Info));
        assert_eq!(lines[1].style, LineStyle::Level(Severity::Error));
        assert_eq!(lines[2].style, LineStyle::Level(Severity::Unknown));
    }

    #[test]
    fn test_coloured_divs_become_coloured_lines() {
        let snapshot = "<div style=\"color:green\">12:00 | INFO    | ok</div>\n\
                        <div style=\"color:red\">12:01 | ERROR    | bad</div>\n\
                        trailing text\n";
        let lines = render_lines(snapshot);
        assert_eq!(lines.len(), 3, "{lines:?}");
        assert_eq!(lines[0].text, "12:00 | INFO    | ok");
        assert_eq!(lines[0].style, LineStyle::Explicit([0, 128, 0]));
        assert_eq!(lines[1].style, LineStyle::Explicit([255, 0, 0]));
        assert_eq!(lines[2].text, "trailing text");
        assert_eq!(lines[2].style, LineStyle::Level(Severity::Unknown));
    }

    #[test]
    fn test_br_and_nested_inline_colour() {
        let lines = render_lines("<p>first<br>second <span style='color:#00f'>blue</span></p>");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "first");
        assert_eq!(lines[1].text, "second blue");
    }

    #[test]
    fn test_hex_colours() {
        assert_eq!(parse_colour("#ff8000"), Some([255, 128, 0]));
        assert_eq!(parse_colour("#0f0"), Some([0, 255, 0]));
        assert_eq!(parse_colour("#12"), None);
        assert_eq!(parse_colour("chartreuse"), None);
    }

    #[test]
    fn test_severity_detect_prefers_first_keyword() {
        assert_eq!(Severity::detect("WARNING about ERROR"), Severity::Warning);
        assert_eq!(Severity::detect("INFORMATION"), Severity::Unknown);
    }
}
