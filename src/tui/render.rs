// Terminal rendering of message bodies.
//
// System messages hold the HTML fragment produced by parse::markup. Only the
// tags that formatter emits are interpreted; anything else that looks like
// markup is shown as typed.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::parse::markup::{
    HEADING_CLOSE, HEADING_OPEN, LINE_BREAK, PRE_CLOSE, PRE_OPEN, STRONG_CLOSE, STRONG_OPEN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    HeadingOpen,
    HeadingClose,
    StrongOpen,
    StrongClose,
    PreOpen,
    PreClose,
    Break,
}

const TAGS: [(&str, Tag); 7] = [
    (HEADING_OPEN, Tag::HeadingOpen),
    (HEADING_CLOSE, Tag::HeadingClose),
    (STRONG_OPEN, Tag::StrongOpen),
    (STRONG_CLOSE, Tag::StrongClose),
    (PRE_OPEN, Tag::PreOpen),
    (PRE_CLOSE, Tag::PreClose),
    (LINE_BREAK, Tag::Break),
];

pub fn heading_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

pub fn code_style() -> Style {
    Style::default()
        .fg(ratatui::style::Color::White)
        .bg(ratatui::style::Color::Rgb(40, 42, 54))
}

#[derive(Default)]
struct Builder {
    lines: Vec<Vec<Span<'static>>>,
    current: Vec<Span<'static>>,
    heading: bool,
    strong: bool,
    pre: bool,
    after_block: bool,
}

impl Builder {
    fn style(&self, base: Style) -> Style {
        let mut style = base;
        if self.pre {
            style = style.patch(code_style());
        }
        if self.heading {
            style = style.patch(heading_style());
        }
        if self.strong {
            style = style.add_modifier(Modifier::BOLD);
        }
        style
    }

    fn text(&mut self, text: &str, base: Style) {
        if text.is_empty() {
            return;
        }
        self.after_block = false;
        let style = self.style(base);
        self.current.push(Span::styled(text.to_string(), style));
    }

    fn end_line(&mut self) {
        self.lines.push(std::mem::take(&mut self.current));
    }

    fn open_block(&mut self) {
        if !self.current.is_empty() {
            self.end_line();
        }
        self.after_block = false;
    }

    fn close_block(&mut self) {
        if !self.current.is_empty() {
            self.end_line();
        }
        self.after_block = true;
    }

    fn apply(&mut self, tag: Tag) {
        match tag {
            Tag::HeadingOpen => {
                self.open_block();
                self.heading = true;
            }
            Tag::HeadingClose => {
                self.heading = false;
                self.close_block();
            }
            Tag::PreOpen => {
                self.open_block();
                self.pre = true;
            }
            Tag::PreClose => {
                self.pre = false;
                self.close_block();
            }
            Tag::StrongOpen => self.strong = true,
            Tag::StrongClose => self.strong = false,
            Tag::Break => {
                // A block already ended the line.
                if self.after_block {
                    self.after_block = false;
                } else {
                    self.end_line();
                }
            }
        }
    }

    fn finish(mut self) -> Vec<Vec<Span<'static>>> {
        if !self.current.is_empty() || self.lines.is_empty() {
            self.end_line();
        }
        self.lines
    }
}

fn tag_at(rest: &str) -> Option<(Tag, usize)> {
    TAGS.iter()
        .find(|(text, _)| rest.starts_with(text))
        .map(|(text, tag)| (*tag, text.len()))
}

/// Logical lines of a formatted fragment, before wrapping.
fn fragment_spans(fragment: &str, base: Style) -> Vec<Vec<Span<'static>>> {
    let mut builder = Builder::default();
    let mut literal_start = 0;
    let mut idx = 0;

    while idx < fragment.len() {
        let rest = &fragment[idx..];
        if rest.starts_with('<') {
            if let Some((tag, len)) = tag_at(rest) {
                builder.text(&fragment[literal_start..idx], base);
                builder.apply(tag);
                idx += len;
                literal_start = idx;
                continue;
            }
        }
        let step = rest.chars().next().map(char::len_utf8).unwrap_or(1);
        idx += step;
    }
    builder.text(&fragment[literal_start..], base);
    builder.finish()
}

/// Wrapped lines for a system message body.
pub fn fragment_lines(fragment: &str, width: usize, base: Style) -> Vec<Line<'static>> {
    fragment_spans(fragment, base)
        .into_iter()
        .flat_map(|spans| wrap_spans(spans, width))
        .collect()
}

/// Wrapped lines for plain text (user input, error bubbles).
pub fn plain_lines(text: &str, width: usize, style: Style) -> Vec<Line<'static>> {
    text.replace("\r\n", "\n")
        .split('\n')
        .flat_map(|line| wrap_spans(vec![Span::styled(line.to_string(), style)], width))
        .collect()
}

fn split_words(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;
    for (idx, ch) in text.char_indices() {
        let space = ch.is_whitespace();
        match in_space {
            Some(prev) if prev != space => {
                out.push(&text[start..idx]);
                start = idx;
            }
            _ => {}
        }
        in_space = Some(space);
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

fn push_line(lines: &mut Vec<Line<'static>>, current: &mut Vec<Span<'static>>) {
    while current
        .last()
        .is_some_and(|s| s.content.chars().all(char::is_whitespace))
    {
        current.pop();
    }
    lines.push(Line::from(std::mem::take(current)));
}

/// Word wrap over styled spans. Words longer than the width are split.
pub fn wrap_spans(spans: Vec<Span<'static>>, width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut used = 0usize;

    for span in spans {
        let style = span.style;
        for piece in split_words(&span.content) {
            let w = piece.width();
            let blank = piece.chars().all(char::is_whitespace);

            if blank {
                // Leading whitespace survives only on the first visual line.
                if used == 0 && !lines.is_empty() {
                    continue;
                }
                if used + w > width {
                    push_line(&mut lines, &mut current);
                    used = 0;
                    continue;
                }
                current.push(Span::styled(piece.to_string(), style));
                used += w;
            } else if used + w <= width {
                current.push(Span::styled(piece.to_string(), style));
                used += w;
            } else if w <= width {
                push_line(&mut lines, &mut current);
                current.push(Span::styled(piece.to_string(), style));
                used = w;
            } else {
                let mut chunk = String::new();
                for ch in piece.chars() {
                    let cw = ch.width().unwrap_or(0);
                    if used + cw > width && used > 0 {
                        if !chunk.is_empty() {
                            current.push(Span::styled(std::mem::take(&mut chunk), style));
                        }
                        push_line(&mut lines, &mut current);
                        used = 0;
                    }
                    chunk.push(ch);
                    used += cw;
                }
                if !chunk.is_empty() {
                    current.push(Span::styled(chunk, style));
                }
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(Line::from(current));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn heading_then_break_gives_two_lines() {
        let lines = fragment_lines("<h2>Hi</h2><br/>Welcome", 40, Style::default());
        assert_eq!(texts(&lines), vec!["Hi", "Welcome"]);
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert!(!lines[1].spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn strong_is_bold_inline() {
        let lines = fragment_lines("a <strong>b</strong> c", 40, Style::default());
        assert_eq!(texts(&lines), vec!["a b c"]);
        let bold: Vec<&str> = lines[0]
            .spans
            .iter()
            .filter(|s| s.style.add_modifier.contains(Modifier::BOLD))
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(bold, vec!["b"]);
    }

    #[test]
    fn pre_block_breaks_into_lines() {
        let lines = fragment_lines("<pre><br/>let x = 1;<br/></pre>done", 40, Style::default());
        assert_eq!(texts(&lines), vec!["", "let x = 1;", "done"]);
        assert_eq!(lines[1].spans[0].style.bg, code_style().bg);
    }

    #[test]
    fn unknown_markup_is_shown_literally() {
        let lines = fragment_lines("<b>x</b> <script>", 40, Style::default());
        assert_eq!(texts(&lines), vec!["<b>x</b> <script>"]);
    }

    #[test]
    fn empty_fragment_is_one_empty_line() {
        assert_eq!(texts(&fragment_lines("", 10, Style::default())), vec![""]);
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = plain_lines("the quick brown fox", 10, Style::default());
        assert_eq!(texts(&lines), vec!["the quick", "brown fox"]);
    }

    #[test]
    fn long_words_are_split() {
        let lines = plain_lines("abcdefghij", 4, Style::default());
        assert_eq!(texts(&lines), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn plain_text_keeps_newlines_and_indent() {
        let lines = plain_lines("a\n  b", 10, Style::default());
        assert_eq!(texts(&lines), vec!["a", "  b"]);
    }

    #[test]
    fn multibyte_text_is_not_split_mid_char() {
        let lines = fragment_lines("<strong>héllo</strong> wörld", 40, Style::default());
        assert_eq!(texts(&lines), vec!["héllo wörld"]);
    }
}
