// SPDX-License-Identifier: GPL-3.0-or-later
// notestamp - Line-oriented YAML frontmatter editing

use std::cell::OnceCell;
use std::collections::HashMap;

const DELIMITER: &str = "---";

/// One frontmatter line and the line ending it was read with.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    text: String,
    eol: &'static str,
}

/// Frontmatter block kept as raw lines. Keys are looked up through an index
/// built on first use and dropped whenever the lines change. Lines written
/// here use the ending of the opening delimiter.
#[derive(Debug, Clone)]
pub struct Frontmatter {
    lines: Vec<Line>,
    newline: &'static str,
    index: OnceCell<HashMap<String, usize>>,
}

impl Frontmatter {
    fn new(lines: Vec<Line>, newline: &'static str) -> Self {
        Self {
            lines,
            newline,
            index: OnceCell::new(),
        }
    }

    /// Key -> first line index. The key is everything before the first ':'.
    fn key_index(&self) -> &HashMap<String, usize> {
        self.index.get_or_init(|| {
            let mut index = HashMap::new();
            for (i, line) in self.lines.iter().enumerate() {
                if let Some((key, _)) = line.text.split_once(':') {
                    index.entry(key.to_string()).or_insert(i);
                }
            }
            index
        })
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.key_index().contains_key(key)
    }

    fn new_line(&self, key: &str, value: &str) -> Line {
        Line {
            text: field_line(key, value),
            eol: self.newline,
        }
    }

    pub fn prepend(&mut self, key: &str, value: &str) {
        let line = self.new_line(key, value);
        self.lines.insert(0, line);
        self.index.take();
    }

    pub fn append(&mut self, key: &str, value: &str) {
        let line = self.new_line(key, value);
        self.lines.push(line);
        self.index.take();
    }

    /// Replace the text of the line holding `key` in place, or append it.
    pub fn set(&mut self, key: &str, value: &str) {
        match self.key_index().get(key).copied() {
            Some(i) => self.lines[i].text = field_line(key, value),
            None => self.append(key, value),
        }
    }
}

fn field_line(key: &str, value: &str) -> String {
    format!("{}: {}", key, value)
}

/// A note split into its frontmatter block and the untouched remainder.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    pub frontmatter: Frontmatter,
    /// Line ending after the closing delimiter ("" at end of file).
    closing_eol: &'static str,
    pub body: &'a str,
}

impl Document<'_> {
    pub fn render(&self) -> String {
        let nl = self.frontmatter.newline;
        let mut out = String::with_capacity(self.body.len() + 64);
        out.push_str(DELIMITER);
        out.push_str(nl);
        for line in &self.frontmatter.lines {
            out.push_str(&line.text);
            out.push_str(line.eol);
        }
        out.push_str(DELIMITER);
        out.push_str(self.closing_eol);
        out.push_str(self.body);
        out
    }
}

/// Split `text` into frontmatter and body. Returns None unless the very first
/// line is exactly `---` and a closing `---` line follows.
pub fn parse(text: &str) -> Option<Document<'_>> {
    let newline = if text.starts_with("---\r\n") {
        "\r\n"
    } else if text.starts_with("---\n") {
        "\n"
    } else {
        return None;
    };

    let rest = &text[DELIMITER.len() + newline.len()..];
    let mut lines = Vec::new();
    let mut offset = 0;
    for segment in rest.split_inclusive('\n') {
        let (line, eol) = split_eol(segment);
        if line == DELIMITER {
            return Some(Document {
                frontmatter: Frontmatter::new(lines, newline),
                closing_eol: eol,
                body: &rest[offset + segment.len()..],
            });
        }
        lines.push(Line {
            text: line.to_string(),
            eol,
        });
        offset += segment.len();
    }
    None
}

fn split_eol(segment: &str) -> (&str, &'static str) {
    if let Some(line) = segment.strip_suffix("\r\n") {
        (line, "\r\n")
    } else if let Some(line) = segment.strip_suffix('\n') {
        (line, "\n")
    } else if let Some(line) = segment.strip_suffix('\r') {
        (line, "\r")
    } else {
        (segment, "")
    }
}

/// Ensure both timestamp keys exist. Missing `created_key` goes first,
/// missing `modified_key` goes last; nothing else moves. Text without a
/// frontmatter block gets a fresh one in front of the unchanged body.
pub fn add_frontmatter(
    text: &str,
    created_value: &str,
    modified_value: &str,
    created_key: &str,
    modified_key: &str,
) -> String {
    match parse(text) {
        Some(mut doc) => {
            if !doc.frontmatter.has_key(created_key) {
                doc.frontmatter.prepend(created_key, created_value);
            }
            if !doc.frontmatter.has_key(modified_key) {
                doc.frontmatter.append(modified_key, modified_value);
            }
            doc.render()
        }
        None => format!(
            "{delim}\n{}\n{}\n{delim}\n{}",
            field_line(created_key, created_value),
            field_line(modified_key, modified_value),
            text,
            delim = DELIMITER,
        ),
    }
}

/// Refresh `modified_key` inside an existing block. A block without
/// `created_key` gets it backfilled with the same value. Text without a
/// block is returned unchanged.
pub fn update_modified_time(
    text: &str,
    modified_value: &str,
    created_key: &str,
    modified_key: &str,
) -> String {
    let Some(mut doc) = parse(text) else {
        return text.to_string();
    };
    doc.frontmatter.set(modified_key, modified_value);
    if !doc.frontmatter.has_key(created_key) {
        doc.frontmatter.prepend(created_key, modified_value);
    }
    doc.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_to_plain_note() {
        let out = add_frontmatter("# Title\n\nbody\n", "V", "V", "created", "modified");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(&lines[..4], &["---", "created: V", "modified: V", "---"]);
        assert_eq!(&out[out.find("# Title").unwrap()..], "# Title\n\nbody\n");
    }

    #[test]
    fn add_to_empty_note() {
        let out = add_frontmatter("", "A", "B", "created", "modified");
        assert_eq!(out, "---\ncreated: A\nmodified: B\n---\n");
    }

    #[test]
    fn add_keeps_unrelated_keys() {
        let out = add_frontmatter("---\nfoo: bar\n---\nbody", "X", "X", "created", "modified");
        assert_eq!(out, "---\ncreated: X\nfoo: bar\nmodified: X\n---\nbody");
    }

    #[test]
    fn add_leaves_existing_keys_alone() {
        let text = "---\nmodified: old\ntags: [a, b]\ncreated: older\n---\nbody\n";
        assert_eq!(add_frontmatter(text, "X", "X", "created", "modified"), text);
    }

    #[test]
    fn add_only_missing_key() {
        let text = "---\ncreated: 2020\ntitle: t\n---\n";
        let out = add_frontmatter(text, "X", "Y", "created", "modified");
        assert_eq!(out, "---\ncreated: 2020\ntitle: t\nmodified: Y\n---\n");
    }

    #[test]
    fn key_match_is_case_sensitive_and_anchored() {
        let text = "---\nCreated: a\n  modified: b\n---\n";
        let out = add_frontmatter(text, "X", "X", "created", "modified");
        assert_eq!(
            out,
            "---\ncreated: X\nCreated: a\n  modified: b\nmodified: X\n---\n"
        );
    }

    #[test]
    fn prefix_key_does_not_count() {
        let text = "---\ncreated_at: a\n---\n";
        let out = add_frontmatter(text, "X", "X", "created", "modified");
        assert!(out.starts_with("---\ncreated: X\ncreated_at: a\n"));
    }

    #[test]
    fn empty_block() {
        let out = add_frontmatter("---\n---\nbody", "X", "X", "created", "modified");
        assert_eq!(out, "---\ncreated: X\nmodified: X\n---\nbody");
    }

    #[test]
    fn unclosed_block_is_body() {
        let text = "---\nfoo: bar\nno closing";
        let out = add_frontmatter(text, "X", "X", "c", "m");
        assert_eq!(out, format!("---\nc: X\nm: X\n---\n{}", text));
        assert_eq!(update_modified_time(text, "X", "c", "m"), text);
    }

    #[test]
    fn crlf_preserved() {
        let text = "---\r\nfoo: bar\r\n---\r\nbody\r\n";
        let out = add_frontmatter(text, "X", "X", "created", "modified");
        assert_eq!(out, "---\r\ncreated: X\r\nfoo: bar\r\nmodified: X\r\n---\r\nbody\r\n");
    }

    #[test]
    fn mixed_line_endings_kept_per_line() {
        let out = add_frontmatter("---\r\nfoo: bar\ntitle: t\n---\nbody", "X", "X", "created", "modified");
        assert_eq!(out, "---\r\ncreated: X\r\nfoo: bar\ntitle: t\nmodified: X\r\n---\nbody");
    }

    #[test]
    fn update_keeps_ending_of_replaced_line() {
        let text = "---\ncreated: a\r\nmodified: b\r\ntags: x\n---\n";
        let out = update_modified_time(text, "NEW", "created", "modified");
        assert_eq!(out, "---\ncreated: a\r\nmodified: NEW\r\ntags: x\n---\n");
    }

    #[test]
    fn closing_at_end_of_file() {
        let out = update_modified_time("---\nmodified: a\ncreated: b\n---", "X", "created", "modified");
        assert_eq!(out, "---\nmodified: X\ncreated: b\n---");
    }

    #[test]
    fn update_without_block_is_noop() {
        let text = "just a body\n---\nmodified: a\n---\n";
        assert_eq!(update_modified_time(text, "X", "created", "modified"), text);
    }

    #[test]
    fn update_in_place() {
        let text = "---\ncreated: a\nmodified: b\ntags: x\n---\nbody";
        let out = update_modified_time(text, "NEW", "created", "modified");
        assert_eq!(out, "---\ncreated: a\nmodified: NEW\ntags: x\n---\nbody");
    }

    #[test]
    fn update_appends_and_backfills_created() {
        let out = update_modified_time("---\ntitle: t\n---\nbody", "NOW", "created", "modified");
        assert_eq!(out, "---\ncreated: NOW\ntitle: t\nmodified: NOW\n---\nbody");
    }

    #[test]
    fn update_is_idempotent() {
        let text = "---\ntitle: t\n---\nbody";
        let once = update_modified_time(text, "V", "created", "modified");
        let twice = update_modified_time(&once, "V", "created", "modified");
        assert_eq!(once, twice);
    }

    #[test]
    fn body_delimiters_untouched() {
        let text = "---\nmodified: a\n---\nintro\n---\nmodified: keep\n";
        let out = update_modified_time(text, "X", "created", "modified");
        assert_eq!(out, "---\ncreated: X\nmodified: X\n---\nintro\n---\nmodified: keep\n");
    }

    #[test]
    fn index_follows_edits() {
        let mut doc = parse("---\na: 1\nb:  two \n---\n").unwrap();
        assert!(doc.frontmatter.has_key("b"));
        doc.frontmatter.prepend("c", "3");
        doc.frontmatter.set("a", "9");
        assert!(!doc.frontmatter.has_key("z"));
        assert_eq!(doc.render(), "---\nc: 3\na: 9\nb:  two \n---\n");
    }
}
