//! Flattens rendered message markup into Markdown-ish plain text.
//!
//! The exporter renders each turn as HTML produced from Markdown, so the
//! walk puts back the obvious markers (list dashes, quote arrows, emphasis)
//! and drops everything else. The result is not meant to round-trip.

use scraper::{ElementRef, Node};

/// Normalize the children of `root` to text. The root's own tag is ignored.
pub fn normalize_element(root: ElementRef<'_>) -> String {
    let mut writer = TextWriter::default();
    writer.walk_children(root);
    tidy(&writer.out)
}

/// Concatenate every text node under `element`, each trimmed.
///
/// Used for short header fields (timestamp, model name) where the markup
/// splits one value across several spans.
pub fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

#[derive(Default)]
struct TextWriter {
    out: String,
    pre_depth: usize,
    at_line_start: bool,
}

impl TextWriter {
    fn walk_children(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.walk_element(child);
                    }
                }
                _ => {}
            }
        }
    }

    fn walk_element(&mut self, element: ElementRef<'_>) {
        match element.value().name() {
            "script" | "style" | "noscript" | "template" => {}
            "br" => self.newline(),
            "p" | "div" => {
                self.ensure_line_break();
                self.walk_children(element);
                self.ensure_line_break();
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.blank_line();
                self.walk_children(element);
                self.blank_line();
            }
            "li" => {
                self.ensure_line_break();
                self.push_prefix("- ");
                self.walk_children(element);
            }
            "blockquote" => {
                self.ensure_line_break();
                self.push_prefix("> ");
                self.walk_children(element);
                self.ensure_line_break();
            }
            "pre" => {
                self.ensure_line_break();
                self.push_raw("```\n");
                self.pre_depth += 1;
                self.walk_children(element);
                self.pre_depth -= 1;
                self.ensure_line_break();
                self.push_raw("```\n");
            }
            "code" if self.pre_depth == 0 => self.wrap(element, "`"),
            "strong" | "b" => self.wrap(element, "**"),
            "em" | "i" => self.wrap(element, "*"),
            _ => self.walk_children(element),
        }
    }

    /// Render `element` with `marker` on both sides of its trimmed text.
    /// Whitespace that sat inside the element ends up outside the markers.
    fn wrap(&mut self, element: ElementRef<'_>, marker: &str) {
        let mut inner = TextWriter {
            pre_depth: self.pre_depth,
            ..Default::default()
        };
        inner.walk_children(element);

        let raw: String = element.text().collect();
        let trimmed = inner.out.trim();
        if trimmed.is_empty() {
            if !raw.is_empty() {
                self.push_space();
            }
            return;
        }
        if raw.starts_with(char::is_whitespace) {
            self.push_space();
        }
        self.push_raw(marker);
        self.push_raw(trimmed);
        self.push_raw(marker);
        if raw.ends_with(char::is_whitespace) {
            self.push_space();
        }
    }

    fn push_text(&mut self, raw: &str) {
        if self.pre_depth > 0 {
            self.push_raw(raw);
            return;
        }

        let mut words = raw.split_whitespace().peekable();
        if words.peek().is_none() {
            if !raw.is_empty() {
                self.push_space();
            }
            return;
        }
        if raw.starts_with(char::is_whitespace) {
            self.push_space();
        }
        let mut first = true;
        for word in words {
            if !first {
                self.out.push(' ');
            }
            self.out.push_str(word);
            first = false;
        }
        self.at_line_start = false;
        if raw.ends_with(char::is_whitespace) {
            self.push_space();
        }
    }

    fn push_raw(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        self.out.push_str(s);
        self.at_line_start = s.ends_with('\n');
    }

    fn push_prefix(&mut self, prefix: &str) {
        self.out.push_str(prefix);
        self.at_line_start = true;
    }

    fn push_space(&mut self) {
        if self.out.is_empty() || self.at_line_start || self.out.ends_with(' ') {
            return;
        }
        self.out.push(' ');
    }

    fn newline(&mut self) {
        let trimmed = self.out.trim_end_matches(' ').len();
        self.out.truncate(trimmed);
        self.out.push('\n');
        self.at_line_start = true;
    }

    fn ensure_line_break(&mut self) {
        if !self.out.is_empty() && !self.at_line_start {
            self.newline();
        }
    }

    fn blank_line(&mut self) {
        if self.out.is_empty() {
            return;
        }
        self.ensure_line_break();
        if !self.out.ends_with("\n\n") {
            self.newline();
        }
    }
}

/// Strip trailing spaces per line, squeeze runs of blank lines down to one,
/// and trim the whole.
fn tidy(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = false;
    for line in raw.lines() {
        let line = line.trim_end();
        let blank = line.is_empty();
        if blank && previous_blank {
            continue;
        }
        lines.push(line);
        previous_blank = blank;
    }
    lines.join("\n").trim().to_string()
}
