// Markdown-ish model output to an HTML fragment.
//
// Four rewrites, always in this order. Line breaks go last, so newlines that
// ended up inside <pre> blocks become <br/> too. Nothing is escaped.
// CRLF mode: a `\r` before `\n` stays outside headings and bold runs.

use std::sync::LazyLock;

use regex::Regex;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mR)^##\s(.*)$").expect("heading pattern"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?R)\*\*(.*?)\*\*").expect("bold pattern"));
static CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(.*?)```").expect("code block pattern"));

pub const HEADING_OPEN: &str = "<h2>";
pub const HEADING_CLOSE: &str = "</h2>";
pub const STRONG_OPEN: &str = "<strong>";
pub const STRONG_CLOSE: &str = "</strong>";
pub const PRE_OPEN: &str = "<pre>";
pub const PRE_CLOSE: &str = "</pre>";
pub const LINE_BREAK: &str = "<br/>";

pub fn format_message(raw: &str) -> String {
    let text = HEADING.replace_all(raw, "<h2>${1}</h2>");
    let text = BOLD.replace_all(&text, "<strong>${1}</strong>");
    let text = CODE_BLOCK.replace_all(&text, "<pre>${1}</pre>");
    text.replace('\n', LINE_BREAK)
}
