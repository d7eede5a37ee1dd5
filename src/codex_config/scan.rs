//! Line-level view of a TOML document.
//!
//! The structural parse goes through the `toml` crate, but preserving
//! unmanaged content verbatim needs the original lines grouped into
//! statements, comments and table headers. A statement may span several
//! lines (multi-line arrays, inline tables, `"""` strings); headers are
//! only recognised at statement boundaries.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineKind {
    Blank,
    Comment,
    Header,
    Statement,
    Continuation,
}

#[derive(Debug, Default)]
pub(crate) struct LineScanner {
    depth: usize,
    ml_basic: bool,
    ml_literal: bool,
}

impl LineScanner {
    pub(crate) fn in_value(&self) -> bool {
        self.depth > 0 || self.ml_basic || self.ml_literal
    }

    pub(crate) fn classify(&mut self, line: &str) -> LineKind {
        if self.in_value() {
            self.consume(line);
            return LineKind::Continuation;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            LineKind::Blank
        } else if trimmed.starts_with('#') {
            LineKind::Comment
        } else if trimmed.starts_with('[') {
            LineKind::Header
        } else {
            let value = split_assignment(trimmed).map(|(_, v)| v).unwrap_or("");
            self.consume(value);
            LineKind::Statement
        }
    }

    fn consume(&mut self, text: &str) {
        let bytes = text.as_bytes();
        let mut in_basic = false;
        let mut in_literal = false;
        let mut i = 0;

        while i < bytes.len() {
            let rest = &bytes[i..];
            if self.ml_basic {
                if rest[0] == b'\\' {
                    i += 2;
                } else if rest.starts_with(b"\"\"\"") {
                    self.ml_basic = false;
                    i += 3;
                } else {
                    i += 1;
                }
                continue;
            }
            if self.ml_literal {
                if rest.starts_with(b"'''") {
                    self.ml_literal = false;
                    i += 3;
                } else {
                    i += 1;
                }
                continue;
            }
            if in_basic {
                match rest[0] {
                    b'\\' => i += 2,
                    b'"' => {
                        in_basic = false;
                        i += 1;
                    }
                    _ => i += 1,
                }
                continue;
            }
            if in_literal {
                if rest[0] == b'\'' {
                    in_literal = false;
                }
                i += 1;
                continue;
            }

            match rest[0] {
                b'"' if rest.starts_with(b"\"\"\"") => {
                    self.ml_basic = true;
                    i += 3;
                    continue;
                }
                b'\'' if rest.starts_with(b"'''") => {
                    self.ml_literal = true;
                    i += 3;
                    continue;
                }
                b'"' => in_basic = true,
                b'\'' => in_literal = true,
                b'[' | b'{' => self.depth += 1,
                b']' | b'}' => self.depth = self.depth.saturating_sub(1),
                b'#' => break,
                _ => {}
            }
            i += 1;
        }
    }
}

/// A logical unit of the document.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Item {
    Blank(String),
    Comment(String),
    Header(String),
    Statement { key: Vec<String>, lines: Vec<String> },
}

impl Item {
    pub(crate) fn push_lines(&self, out: &mut Vec<String>) {
        match self {
            Item::Blank(line) | Item::Comment(line) | Item::Header(line) => {
                out.push(line.clone())
            }
            Item::Statement { lines, .. } => out.extend(lines.iter().cloned()),
        }
    }
}

pub(crate) fn scan_items(text: &str) -> Vec<Item> {
    let mut scanner = LineScanner::default();
    let mut items = Vec::new();

    for line in text.lines() {
        match scanner.classify(line) {
            LineKind::Blank => items.push(Item::Blank(line.to_string())),
            LineKind::Comment => items.push(Item::Comment(line.to_string())),
            LineKind::Header => items.push(Item::Header(line.to_string())),
            LineKind::Statement => {
                let key = split_assignment(line.trim())
                    .map(|(k, _)| key_segments(k))
                    .unwrap_or_default();
                items.push(Item::Statement {
                    key,
                    lines: vec![line.to_string()],
                });
            }
            LineKind::Continuation => match items.last_mut() {
                Some(Item::Statement { lines, .. }) => lines.push(line.to_string()),
                _ => items.push(Item::Comment(line.to_string())),
            },
        }
    }

    items
}

/// Index where the table part of `lines` begins: the first header, pulled
/// back over the comment lines sitting directly on top of it. `lines.len()`
/// when there is no header.
pub(crate) fn table_block_start(lines: &[String]) -> usize {
    let mut scanner = LineScanner::default();
    let mut kinds = Vec::with_capacity(lines.len());
    for line in lines {
        let kind = scanner.classify(line);
        if kind == LineKind::Header {
            break;
        }
        kinds.push(kind);
    }
    if kinds.len() == lines.len() {
        return lines.len();
    }

    let mut start = kinds.len();
    while start > 0 && kinds[start - 1] == LineKind::Comment {
        start -= 1;
    }
    start
}

/// Split `key = value` at the first `=` outside a quoted key.
pub(crate) fn split_assignment(trimmed: &str) -> Option<(&str, &str)> {
    let mut quote: Option<char> = None;
    for (idx, ch) in trimmed.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '=' => return Some((trimmed[..idx].trim(), trimmed[idx + 1..].trim())),
                _ => {}
            },
        }
    }
    None
}

/// `a."b.c".d` -> `["a", "b.c", "d"]`
pub(crate) fn key_segments(key: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in key.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '.' => {
                    segments.push(current.trim().to_string());
                    current.clear();
                }
                c if c.is_whitespace() => {}
                c => current.push(c),
            },
        }
    }
    segments.push(current.trim().to_string());
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiline_array_is_one_statement() {
        let text = "args = [\n  \"-y\",\n  \"[not-a-header]\",\n]\n[next]\n";
        let items = scan_items(text);
        assert_eq!(items.len(), 2);
        match &items[0] {
            Item::Statement { key, lines } => {
                assert_eq!(key, &vec!["args".to_string()]);
                assert_eq!(lines.len(), 4);
            }
            other => panic!("unexpected item {other:?}"),
        }
        assert_eq!(items[1], Item::Header("[next]".into()));
    }

    #[test]
    fn multiline_string_hides_brackets() {
        let text = "note = \"\"\"\n[fake]\n# not a comment\n\"\"\"\nkey = 1\n";
        let items = scan_items(text);
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[1], Item::Statement { key, .. } if key == &vec!["key".to_string()]));
    }

    #[test]
    fn brackets_in_strings_and_comments_do_not_open_values() {
        let mut scanner = LineScanner::default();
        assert_eq!(scanner.classify("a = \"[\" # ["), LineKind::Statement);
        assert!(!scanner.in_value());
        assert_eq!(scanner.classify("[table]"), LineKind::Header);
    }

    #[test]
    fn key_segments_handle_quotes() {
        assert_eq!(
            key_segments("projects.\"/a.b\""),
            vec!["projects".to_string(), "/a.b".to_string()]
        );
        assert_eq!(key_segments(" model_provider "), vec!["model_provider".to_string()]);
    }

    #[test]
    fn table_block_start_skips_root_lines() {
        let lines: Vec<String> = ["# note", "approval_policy = \"never\"", "", "[projects.\"/a\"]"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(table_block_start(&lines), 3);
        assert_eq!(table_block_start(&lines[..2]), 2);
    }

    #[test]
    fn table_block_start_keeps_heading_comments_with_table() {
        let lines: Vec<String> = ["x = 1", "", "# trusted", "# workspaces", "[projects.\"/w\"]"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(table_block_start(&lines), 2);
    }
}
