//! Markup and code stripping that keeps the explanatory prose around it.
//!
//! Stages, in order:
//! 1. fenced code blocks (```` ``` ```` / `~~~`) are dropped unless their body is a
//!    single line, which is kept as plain text;
//! 2. HTML comments, `<script>`/`<style>` blocks, multi-line `<pre>`/`<code>` blocks
//!    and multi-line inline code are removed; remaining tags become whitespace;
//! 3. every line is cleaned (markers, links, entities, URLs, stray symbols) and
//!    boilerplate lines (navigation, shell commands, symbol soup) are dropped.
//!
//! Malformed markup never fails: it is reported as [`MalformedInput`] and the
//! text around it is kept. The output is a single line and `normalize` is
//! idempotent.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::error::{MalformedInput, MalformedKind};

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex")
}

static HTML_COMMENT: LazyLock<Regex> = LazyLock::new(|| re(r"(?s)<!--.*?-->"));
static SCRIPT_STYLE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?is)<(?:script|style)\b[^>]*>.*?</(?:script|style)\s*>"));
static PRE_CODE: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<(?:pre|code)\b[^>]*>(.*?)</(?:pre|code)\s*>"));
static OPEN_BLOCK: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)<(?:script|style|pre|code)\b|<!--"));
static TAG: LazyLock<Regex> = LazyLock::new(|| re(r"</?[A-Za-z!][^<>\n]*>"));
static TAG_START: LazyLock<Regex> = LazyLock::new(|| re(r"</?[A-Za-z!]"));

static HEADING: LazyLock<Regex> = LazyLock::new(|| re(r"^\s*#{1,6}(?:\s+|$)"));
static BLOCKQUOTE: LazyLock<Regex> = LazyLock::new(|| re(r"^\s*(?:>\s?)+"));
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| re(r"^\s*(?:(?:[-*+]|\d+[.)])\s+)+"));
static IMAGE: LazyLock<Regex> = LazyLock::new(|| re(r"!\[[^\]]*\]\([^)]*\)"));
static LINK: LazyLock<Regex> = LazyLock::new(|| re(r"\[([^\]]*)\]\([^)]*\)"));
static REF_LINK: LazyLock<Regex> = LazyLock::new(|| re(r"\[([^\]]+)\]\[[^\]]*\]"));
static NUMERIC_ENTITY: LazyLock<Regex> = LazyLock::new(|| re(r"&#(?:[xX]([0-9a-fA-F]{1,6})|([0-9]{1,7}));"));
static NAMED_ENTITY: LazyLock<Regex> = LazyLock::new(|| re(r"&[a-zA-Z]{2,8};"));
static URL: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\b(?:https?://|www\.)\S+"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| re(r"\s+"));
static SPACE_BEFORE_PUNCT: LazyLock<Regex> = LazyLock::new(|| re(r"\s+([.,!?;:)])"));
static SPACE_AFTER_PAREN: LazyLock<Regex> = LazyLock::new(|| re(r"\(\s+"));

static LETTER_RUN: LazyLock<Regex> = LazyLock::new(|| re(r"\p{L}{2,}"));
static SHELL_PROMPT: LazyLock<Regex> = LazyLock::new(|| re(r"^\s*(?:[-*+]\s+)?\$\s+\S"));
/// `tool subcommand ...`, or a bare utility followed by arguments.
static SHELL_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    re(concat!(
        r"^(?:(?:sudo|npx|cd|mkdir|curl|wget)\s+\S",
        r"|(?:npm|yarn|pnpm|pip3?|git|docker|cargo|brew|apt|apt-get)\s+",
        r"(?:install|i|add|remove|uninstall|run|exec|init|create|ci|start|test|build|new|check|update|upgrade",
        r"|clone|commit|push|pull|checkout|switch|status|log|merge|rebase|branch|fetch|diff|compose|ps|stop|rm|login)\b)",
    ))
});
static SHELL_FLAGGED: LazyLock<Regex> = LazyLock::new(|| {
    re(r"^(?:sudo|npx|npm|yarn|pnpm|pip3?|git|docker|cargo|brew|apt|apt-get|curl|wget)\s.*\s--?[A-Za-z][\w-]*(?:\s|$)")
});

const NAV_LINES: &[&str] = &[
    "skip to content",
    "skip to main content",
    "on this page",
    "edit this page",
    "edit on github",
    "previous",
    "next",
    "previous page",
    "next page",
    "back to top",
    "table of contents",
    "in this article",
    "copy",
    "copied",
    "menu",
    "search",
    "home",
];
const NAV_PREFIXES: &[&str] = &["previous:", "next:", "last updated", "was this page helpful"];

const CODE_SYMBOLS: &[char] = &['{', '}', '=', '<', '>', '[', ']'];
const MAX_CLEAN_PASSES: usize = 32;

enum Piece {
    Prose { text: String, first_line: usize },
    /// Body of a one-line fenced block.
    Code(String),
}

/// Strip markup and code from `raw`, keeping explanatory prose.
pub fn normalize(raw: &str) -> String {
    normalize_with_report(raw).0
}

/// Like [`normalize`], also returning what malformed markup was worked around.
pub fn normalize_with_report(raw: &str) -> (String, Vec<MalformedInput>) {
    let mut report = Vec::new();
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut kept: Vec<String> = Vec::new();
    for piece in split_fences(&text, &mut report) {
        match piece {
            Piece::Code(line) => {
                if looks_like_statement(&line) {
                    continue;
                }
                let cleaned = clean_line(&line);
                if keep(&cleaned) {
                    kept.push(cleaned);
                }
            }
            Piece::Prose { text, first_line } => {
                let stripped = strip_html(&text, first_line, &mut report);
                for line in stripped.lines() {
                    if let Some(cleaned) = prose_line(line) {
                        kept.push(cleaned);
                    }
                }
            }
        }
    }

    // The joined text is judged again on a second pass, and it can take a
    // command shape its first line did not have on its own.
    let mut first = 0;
    let out = loop {
        if first == kept.len() {
            break String::new();
        }
        let joined = clean_line(&kept[first..].join(" "));
        if keep(&joined) {
            break joined;
        }
        first += 1;
    };
    (out, report)
}

fn fence_marker(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("```") {
        Some("```")
    } else if trimmed.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

fn flush(prose: &mut Vec<&str>, start: usize, pieces: &mut Vec<Piece>) {
    if !prose.is_empty() {
        pieces.push(Piece::Prose { text: prose.join("\n"), first_line: start });
        prose.clear();
    }
}

fn split_fences(text: &str, report: &mut Vec<MalformedInput>) -> Vec<Piece> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut pieces = Vec::new();
    let mut prose: Vec<&str> = Vec::new();
    let mut prose_start = 1;

    let mut i = 0;
    while i < lines.len() {
        let Some(marker) = fence_marker(lines[i]) else {
            if prose.is_empty() {
                prose_start = i + 1;
            }
            prose.push(lines[i]);
            i += 1;
            continue;
        };
        match (i + 1..lines.len()).find(|&j| lines[j].trim_start().starts_with(marker)) {
            Some(close) => {
                flush(&mut prose, prose_start, &mut pieces);
                let body: Vec<&str> =
                    lines[i + 1..close].iter().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();
                if let [only] = body.as_slice() {
                    pieces.push(Piece::Code((*only).to_string()));
                }
                i = close + 1;
            }
            None => {
                report.push(MalformedInput { kind: MalformedKind::UnclosedFence, line: i + 1 });
                // The fence line goes, the body stays as prose. An empty
                // line keeps later line numbers right.
                if prose.is_empty() {
                    prose_start = i + 1;
                }
                prose.push("");
                i += 1;
            }
        }
    }
    flush(&mut prose, prose_start, &mut pieces);
    pieces
}

fn newlines_of(s: &str) -> String {
    "\n".repeat(s.matches('\n').count())
}

fn line_at(text: &str, offset: usize, first_line: usize) -> usize {
    first_line + text[..offset].matches('\n').count()
}

/// Remove HTML blocks, inline code and tags. Line structure is preserved.
fn strip_html(text: &str, first_line: usize, report: &mut Vec<MalformedInput>) -> String {
    let text = HTML_COMMENT.replace_all(text, |c: &Captures| newlines_of(&c[0]));
    let text = SCRIPT_STYLE.replace_all(&text, |c: &Captures| newlines_of(&c[0]));
    let text = PRE_CODE.replace_all(&text, |c: &Captures| {
        let body: Vec<&str> = c[1].lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        match body.as_slice() {
            [only] => format!(" {} {}", only, newlines_of(&c[0])),
            _ => newlines_of(&c[0]),
        }
    });

    let mut text = text.into_owned();
    for m in OPEN_BLOCK.find_iter(&text) {
        report.push(MalformedInput { kind: MalformedKind::UnclosedHtmlBlock, line: line_at(&text, m.start(), first_line) });
    }
    if text.contains("<!--") {
        text = text.replace("<!--", " ");
    }

    let text = strip_inline_code(&text, first_line, report);
    let text = TAG.replace_all(&text, " ");
    for m in TAG_START.find_iter(&text) {
        report.push(MalformedInput { kind: MalformedKind::UnterminatedTag, line: line_at(&text, m.start(), first_line) });
    }
    text.into_owned()
}

/// Backtick spans on one line keep their text; spans crossing lines are dropped.
fn strip_inline_code(text: &str, first_line: usize, report: &mut Vec<MalformedInput>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('`') {
        out.push_str(&rest[..open]);
        let run = rest[open..].len() - rest[open..].trim_start_matches('`').len();
        let body_start = open + run;
        let ticks = &rest[open..body_start];
        match rest[body_start..].find(ticks) {
            Some(len) => {
                let body = &rest[body_start..body_start + len];
                if body.contains('\n') {
                    out.push(' ');
                    out.push_str(&newlines_of(body));
                } else {
                    out.push_str(body);
                }
                rest = &rest[body_start + len + run..];
            }
            None => {
                let offset = text.len() - rest.len() + open;
                report.push(MalformedInput {
                    kind: MalformedKind::UnclosedInlineCode,
                    line: line_at(text, offset, first_line),
                });
                out.push(' ');
                rest = &rest[body_start..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn looks_like_code(line: &str) -> bool {
    let symbols = line.chars().filter(|c| CODE_SYMBOLS.contains(c)).count();
    let visible = line.chars().filter(|c| !c.is_whitespace()).count();
    symbols >= 3 && symbols as f32 / visible as f32 > 0.15
}

/// Stricter test for the body of a one-line fence, where even a single
/// assignment or terminated statement is code.
fn looks_like_statement(line: &str) -> bool {
    let line = line.trim();
    looks_like_code(line)
        || line.contains(CODE_SYMBOLS)
        || line.ends_with([';', ')'])
        || SHELL_PROMPT.is_match(line)
}

/// A command line rather than prose about the tool: a `$` prompt, or a
/// `tool subcommand` or flagged invocation without sentence-final punctuation.
fn is_shell_command(line: &str) -> bool {
    if SHELL_PROMPT.is_match(line) {
        return true;
    }
    let terminal = line.trim_end().ends_with(['.', '!', '?', ':']);
    !terminal && (SHELL_COMMAND.is_match(line) || SHELL_FLAGGED.is_match(line))
}

fn prose_line(line: &str) -> Option<String> {
    let delinked = reduce_links(line);
    if SHELL_PROMPT.is_match(&delinked) || looks_like_code(&delinked) {
        return None;
    }
    let mut cleaned = clean_line(&delinked);
    if HEADING.is_match(line) && !cleaned.is_empty() && !cleaned.ends_with(['.', '!', '?', ':']) {
        cleaned.push('.');
    }
    keep(&cleaned).then_some(cleaned)
}

fn reduce_links(line: &str) -> String {
    let line = IMAGE.replace_all(line, " ");
    let line = LINK.replace_all(&line, "$1");
    REF_LINK.replace_all(&line, "$1").into_owned()
}

fn strip_markers(line: &str) -> String {
    let line = HEADING.replace(line, "");
    let line = BLOCKQUOTE.replace(&line, "");
    LIST_MARKER.replace(&line, "").into_owned()
}

fn decode_entities(line: &str) -> String {
    let line = NUMERIC_ENTITY.replace_all(line, |c: &Captures| {
        let code = match (c.get(1), c.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (_, Some(dec)) => dec.as_str().parse().ok(),
            _ => None,
        };
        code.and_then(char::from_u32).map_or_else(|| " ".to_string(), String::from)
    });
    let line = line
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&");
    NAMED_ENTITY.replace_all(&line, " ").into_owned()
}

fn allowed(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c.is_whitespace() || ".,!?;:()'\"/-%".contains(c)
}

fn clean_once(line: &str) -> String {
    let line = strip_markers(line);
    let line = reduce_links(&line);
    let line = decode_entities(&line);
    let line = URL.replace_all(&line, " ");
    let line: String = line.chars().map(|c| if allowed(c) { c } else { ' ' }).collect();
    let line = URL.replace_all(&line, " ");
    let line = WHITESPACE.replace_all(&line, " ");
    let line = SPACE_BEFORE_PUNCT.replace_all(&line, "$1");
    let line = SPACE_AFTER_PAREN.replace_all(&line, "(");
    strip_markers(line.trim()).trim().to_string()
}

/// Clean a single line until it stops changing.
fn clean_line(line: &str) -> String {
    let mut current = clean_once(line);
    for _ in 0..MAX_CLEAN_PASSES {
        let next = clean_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn is_navigation(line: &str) -> bool {
    let lower = line.trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace()).to_lowercase();
    NAV_LINES.contains(&lower.as_str()) || NAV_PREFIXES.iter().any(|p| lower.starts_with(p))
}

fn keep(line: &str) -> bool {
    !line.is_empty() && LETTER_RUN.is_match(line) && !is_shell_command(line) && !is_navigation(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_is_reduced_to_prose() {
        let raw = "# Getting Started\n\nThis means you can **define** a [function](https://x.dev/fn).\n";
        assert_eq!(normalize(raw), "Getting Started. This means you can define a function.");
    }

    #[test]
    fn long_fenced_code_goes_but_surrounding_prose_stays() {
        let raw = "Create a component like this:\n```jsx\nfunction App() {\n  return <div/>;\n}\n```\nThe component returns markup.";
        assert_eq!(normalize(raw), "Create a component like this: The component returns markup.");
    }

    #[test]
    fn one_line_fence_is_kept_unformatted() {
        let raw = "The hook is\n```\nuseState\n```\nin React.";
        assert_eq!(normalize(raw), "The hook is useState in React.");
    }

    #[test]
    fn unclosed_fence_keeps_prose_and_reports() {
        let raw = "Intro text here.\n```python\nThis prose survives.\n";
        let (out, report) = normalize_with_report(raw);
        assert_eq!(out, "Intro text here. This prose survives.");
        assert_eq!(report, vec![MalformedInput { kind: MalformedKind::UnclosedFence, line: 2 }]);
    }

    #[test]
    fn inline_code_keeps_its_text() {
        assert_eq!(normalize("Call `map()` on the array."), "Call map() on the array.");
    }

    #[test]
    fn unclosed_inline_code_is_reported() {
        let (out, report) = normalize_with_report("Use the `map function.");
        assert_eq!(out, "Use the map function.");
        assert_eq!(report[0].kind, MalformedKind::UnclosedInlineCode);
    }

    #[test]
    fn html_tags_scripts_and_entities_are_stripped() {
        let raw = "<p>Hello <b>world</b> &amp; friends</p><script>var x = 1;</script>";
        assert_eq!(normalize(raw), "Hello world friends");
    }

    #[test]
    fn short_pre_block_is_kept_long_one_dropped() {
        let raw = "<pre>npm run dev</pre>\nStart the server.\n<pre>\nline one\nline two\n</pre>\nThen open it.";
        assert_eq!(normalize(raw), "Start the server. Then open it.");
        assert_eq!(normalize("<code>useEffect</code> runs after render."), "useEffect runs after render.");
    }

    #[test]
    fn navigation_and_shell_lines_are_dropped() {
        let raw = "Skip to content\nnpm install react\nReact renders components.\nNext\nLast updated on May 3";
        assert_eq!(normalize(raw), "React renders components.");
    }

    #[test]
    fn prose_about_command_line_tools_is_kept() {
        assert_eq!(
            normalize("git is a distributed version control system. It tracks changes."),
            "git is a distributed version control system. It tracks changes."
        );
        assert_eq!(
            normalize("npm is the package manager for Node. It installs packages."),
            "npm is the package manager for Node. It installs packages."
        );
        assert_eq!(normalize("- `git` stores history as snapshots."), "git stores history as snapshots.");
        assert_eq!(normalize("`cargo` builds your Rust project"), "cargo builds your Rust project");
        assert_eq!(normalize("npm accepts the -g option for global installs."), "npm accepts the -g option for global installs.");
    }

    #[test]
    fn command_shapes_are_dropped() {
        let raw = "$ npm install react\ncargo build --release\ngit clone https://example.com/repo.git\ncd my-app\nDocker packages an application.";
        assert_eq!(normalize(raw), "Docker packages an application.");
    }

    #[test]
    fn prose_starting_with_a_subcommand_is_stable() {
        let raw = "git commit records a snapshot.\nThe message explains why";
        let once = normalize(raw);
        assert_eq!(once, "The message explains why");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn one_line_fenced_statement_is_dropped() {
        let raw = "Declare the state:\n```js\nconst x = useState(0);\n```\nThe hook returns a pair.";
        assert_eq!(normalize(raw), "Declare the state: The hook returns a pair.");
    }

    #[test]
    fn unterminated_tag_does_not_lose_text() {
        let (out, report) = normalize_with_report("Some text <div class=\"x\"\nmore text.");
        assert!(out.starts_with("Some text"));
        assert!(out.ends_with("more text."));
        assert!(report.iter().any(|r| r.kind == MalformedKind::UnterminatedTag && r.line == 1));
    }

    #[test]
    fn symbol_heavy_lines_are_dropped() {
        let raw = "const x = { a: [1, 2] };\nObjects group related values.";
        assert_eq!(normalize(raw), "Objects group related values.");
    }

    #[test]
    fn list_and_quote_markers_are_removed() {
        let raw = "> Note: hooks are functions.\n- First, import the hook.\n2. Then call it.";
        assert_eq!(normalize(raw), "Note: hooks are functions. First, import the hook. Then call it.");
    }

    #[test]
    fn normalize_is_idempotent_on_samples() {
        for raw in [
            "# Title\n\n* item one\n* item two (see [docs](http://a.b))",
            "Weird ( spacing ) here , and there .",
            "<div>1. - nested markers</div>",
            "",
        ] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "input {:?}", raw);
        }
    }
}
