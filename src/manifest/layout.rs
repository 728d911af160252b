//! Text layout of the `projects` list.
//!
//! The semantic view of a manifest comes from `serde_yaml`, which forgets comments,
//! quoting and key order. This module indexes the original text instead: for every
//! project entry it records where the `revision` scalar lives (or where one would be
//! inserted), so a revision change can be written back as a single in-place edit.

use super::Project;
use crate::error::{Result, UpdaterError};
use std::collections::BTreeMap;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    Plain,
    Single,
    Double,
}

impl Quote {
    /// Render `value` as a scalar in this quoting style.
    fn render(self, value: &str) -> String {
        match self {
            Quote::Single => format!("'{}'", value.replace('\'', "''")),
            Quote::Double => format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\"")),
            Quote::Plain if is_plain_safe(value) => value.to_string(),
            Quote::Plain => Quote::Double.render(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RevisionSlot {
    /// `revision: <scalar>`; the range covers the scalar including quotes.
    Scalar { range: Range<usize>, quote: Quote },
    /// `revision:` with no value.
    Empty { at: usize },
    /// Block entry without a `revision` key.
    Missing {
        at: usize,
        indent: usize,
        leading_newline: bool,
    },
    /// Flow entry (`{ ... }`) without a `revision` key.
    FlowMissing { at: usize, needs_comma: bool },
}

#[derive(Debug, Clone)]
struct ProjectEntry {
    name: Option<String>,
    line: usize,
    slot: RevisionSlot,
}

impl ProjectEntry {
    fn edit(&self, revision: &str, newline: &str) -> (Range<usize>, String) {
        match &self.slot {
            RevisionSlot::Scalar { range, quote } => (range.clone(), quote.render(revision)),
            RevisionSlot::Empty { at } => (*at..*at, format!(" {}", Quote::Plain.render(revision))),
            RevisionSlot::Missing {
                at,
                indent,
                leading_newline,
            } => {
                let (lead, trail) = if *leading_newline {
                    (newline, "")
                } else {
                    ("", newline)
                };
                let text = format!(
                    "{lead}{}revision: {}{trail}",
                    " ".repeat(*indent),
                    Quote::Plain.render(revision)
                );
                (*at..*at, text)
            }
            RevisionSlot::FlowMissing { at, needs_comma } => {
                let sep = if *needs_comma { ", " } else { " " };
                (*at..*at, format!("{sep}revision: {}", Quote::Plain.render(revision)))
            }
        }
    }
}

/// Location of every project entry in the manifest text, in document order.
#[derive(Debug, Clone)]
pub(super) struct ManifestLayout {
    entries: Vec<ProjectEntry>,
    newline: &'static str,
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    number: usize,
    start: usize,
    text: &'a str,
    has_terminator: bool,
    next: usize,
}

impl Line<'_> {
    fn indent(&self) -> usize {
        self.text.len() - self.text.trim_start_matches(' ').len()
    }

    fn content(&self) -> &str {
        &self.text[self.indent()..]
    }

    fn is_content(&self) -> bool {
        let content = self.content().trim_end();
        !content.is_empty() && !content.starts_with('#')
    }
}

#[derive(Debug, Clone, Copy)]
struct Scalar {
    start: usize,
    end: usize,
    quote: Quote,
}

impl ManifestLayout {
    pub(super) fn scan(source: &str) -> Result<Self> {
        let newline = if source.contains("\r\n") { "\r\n" } else { "\n" };
        let mut layout = Self {
            entries: Vec::new(),
            newline,
        };

        let lines = split_lines(source);
        let Some(root) = lines.iter().position(|line| {
            line.indent() == 0
                && line.is_content()
                && block_key(line.text).is_some_and(|(key, _)| key == "manifest")
        }) else {
            return Ok(layout);
        };

        let root_line = &lines[root];
        if let Some((_, offset)) = block_key(root_line.text) {
            if !value_is_empty(&root_line.text[offset..]) {
                return Err(unsupported(root_line, "inline value for 'manifest'"));
            }
        }

        let body_end = lines[root + 1..]
            .iter()
            .position(|line| line.is_content() && line.indent() == 0)
            .map(|pos| root + 1 + pos)
            .unwrap_or(lines.len());
        let body = root + 1..body_end;

        let Some(child_indent) = lines[body.clone()]
            .iter()
            .find(|line| line.is_content())
            .map(Line::indent)
        else {
            return Ok(layout);
        };

        let Some(projects) = body.clone().find(|&idx| {
            let line = &lines[idx];
            line.is_content()
                && line.indent() == child_indent
                && block_key(line.content()).is_some_and(|(key, _)| key == "projects")
        }) else {
            return Ok(layout);
        };

        let projects_line = &lines[projects];
        if let Some((_, offset)) = block_key(projects_line.content()) {
            let value = strip_comment(&projects_line.content()[offset..]);
            if value == "[]" {
                return Ok(layout);
            }
            if !value.is_empty() {
                return Err(unsupported(projects_line, "flow-style 'projects' sequence"));
            }
        }

        let region = projects + 1..body_end;
        let Some(first) = lines[region.clone()].iter().find(|line| line.is_content()) else {
            return Ok(layout);
        };
        if first.indent() < child_indent || !is_dash(first.content()) {
            return Ok(layout);
        }
        let seq_indent = first.indent();

        let mut items: Vec<Vec<usize>> = Vec::new();
        for idx in region {
            let line = &lines[idx];
            if !line.is_content() {
                continue;
            }
            let indent = line.indent();
            if indent < seq_indent || (indent == seq_indent && !is_dash(line.content())) {
                break;
            }
            if indent == seq_indent {
                items.push(vec![idx]);
            } else if let Some(item) = items.last_mut() {
                item.push(idx);
            }
        }

        for item in &items {
            layout.entries.push(scan_item(&lines, item, seq_indent)?);
        }

        Ok(layout)
    }

    /// Fail unless the located entries line up one-to-one with the parsed projects.
    pub(super) fn ensure_matches(&self, projects: &[Project]) -> Result<()> {
        if self.entries.len() != projects.len() {
            return Err(UpdaterError::Manifest(format!(
                "Located {} project entries in the manifest text but parsed {}; unsupported layout",
                self.entries.len(),
                projects.len()
            )));
        }

        for (entry, project) in self.entries.iter().zip(projects) {
            if entry.name.as_deref() != Some(project.name.as_str()) {
                return Err(UpdaterError::Manifest(format!(
                    "Project entry at line {} does not match parsed project '{}'",
                    entry.line, project.name
                )));
            }
        }

        Ok(())
    }

    /// Replay `source` with the given per-entry revisions written in.
    pub(super) fn render(&self, source: &str, revisions: &BTreeMap<usize, String>) -> String {
        let mut edits: Vec<(Range<usize>, String)> = revisions
            .iter()
            .filter_map(|(idx, revision)| {
                self.entries
                    .get(*idx)
                    .map(|entry| entry.edit(revision, self.newline))
            })
            .collect();
        edits.sort_by_key(|(range, _)| range.start);

        let mut out = String::with_capacity(source.len() + 32 * edits.len());
        let mut cursor = 0;
        for (range, text) in edits {
            out.push_str(&source[cursor..range.start]);
            out.push_str(&text);
            cursor = range.end;
        }
        out.push_str(&source[cursor..]);
        out
    }
}

fn scan_item(lines: &[Line<'_>], item: &[usize], seq_indent: usize) -> Result<ProjectEntry> {
    let head = &lines[item[0]];
    let after_dash = seq_indent + 1;
    let gap = head.text[after_dash..].len() - head.text[after_dash..].trim_start_matches(' ').len();
    let key_start = after_dash + gap;
    let rest = &head.text[key_start..];

    if rest.starts_with('{') {
        return scan_flow_item(head, key_start);
    }
    if rest.starts_with(['[', '&', '*', '!', '|', '>']) {
        return Err(unsupported(head, "project entry is not a mapping"));
    }

    let inline_key = !value_is_empty(rest);
    let key_column = if inline_key {
        key_start
    } else {
        match item.get(1) {
            Some(&idx) => lines[idx].indent(),
            None => return Err(unsupported(head, "empty project entry")),
        }
    };

    let mut name = None;
    let mut revision = None;
    for (pos, &idx) in item.iter().enumerate() {
        let line = &lines[idx];
        let at_key = if pos == 0 {
            inline_key
        } else {
            line.indent() == key_column
        };
        if !at_key {
            continue;
        }
        let Some((key, offset)) = block_key(&line.text[key_column..]) else {
            continue;
        };
        let value_start = key_column + offset;
        match key.as_str() {
            "name" => {
                name = scalar_at(line, value_start, false)?
                    .map(|scalar| decode(&line.text[scalar.start..scalar.end], scalar.quote));
            }
            "revision" => {
                let continued = item
                    .get(pos + 1)
                    .is_some_and(|&next| lines[next].indent() > key_column);
                if continued {
                    return Err(unsupported(line, "revision value continues on the next line"));
                }
                revision = Some(revision_slot(line, value_start)?);
            }
            _ => {}
        }
    }

    let slot = match revision {
        Some(slot) => slot,
        None => {
            let last = &lines[item[item.len() - 1]];
            RevisionSlot::Missing {
                at: last.next,
                indent: key_column,
                leading_newline: !last.has_terminator,
            }
        }
    };

    Ok(ProjectEntry {
        name,
        line: head.number,
        slot,
    })
}

fn scan_flow_item(line: &Line<'_>, open: usize) -> Result<ProjectEntry> {
    let text = line.text;
    let bytes = text.as_bytes();
    let mut name = None;
    let mut revision = None;
    let mut pos = open + 1;

    let close = loop {
        pos = skip_spaces(text, pos);
        match bytes.get(pos) {
            None => return Err(unsupported(line, "multi-line flow mapping")),
            Some(b'}') => break pos,
            Some(_) => {}
        }

        let colon = flow_key_end(text, pos).ok_or_else(|| unsupported(line, "malformed flow mapping"))?;
        let key = decode_key(text[pos..colon].trim_end());
        let value_start = colon + 1;

        let value_end = match key.as_str() {
            "name" | "revision" => {
                let scalar = scalar_at(line, value_start, true)?;
                if key == "name" {
                    name = scalar.map(|s| decode(&text[s.start..s.end], s.quote));
                } else {
                    revision = Some(match scalar {
                        Some(s) => RevisionSlot::Scalar {
                            range: line.start + s.start..line.start + s.end,
                            quote: s.quote,
                        },
                        None => RevisionSlot::Empty {
                            at: line.start + value_start,
                        },
                    });
                }
                scalar.map(|s| s.end).unwrap_or(value_start)
            }
            _ => skip_flow_value(text, value_start)
                .ok_or_else(|| unsupported(line, "malformed flow mapping"))?,
        };

        pos = skip_spaces(text, value_end);
        match bytes.get(pos) {
            Some(b',') => pos += 1,
            Some(b'}') => break pos,
            None => return Err(unsupported(line, "multi-line flow mapping")),
            Some(_) => return Err(unsupported(line, "malformed flow mapping")),
        }
    };

    let slot = match revision {
        Some(slot) => slot,
        None => {
            let before = text[..close].trim_end_matches(' ');
            RevisionSlot::FlowMissing {
                at: line.start + before.len(),
                needs_comma: !(before.ends_with(',') || before.ends_with('{')),
            }
        }
    };

    Ok(ProjectEntry {
        name,
        line: line.number,
        slot,
    })
}

fn revision_slot(line: &Line<'_>, value_start: usize) -> Result<RevisionSlot> {
    Ok(match scalar_at(line, value_start, false)? {
        Some(scalar) => RevisionSlot::Scalar {
            range: line.start + scalar.start..line.start + scalar.end,
            quote: scalar.quote,
        },
        None => RevisionSlot::Empty {
            at: line.start + value_start,
        },
    })
}

/// Locate the scalar value starting at or after `from` on `line`.
fn scalar_at(line: &Line<'_>, from: usize, flow: bool) -> Result<Option<Scalar>> {
    let text = line.text;
    let start = skip_spaces(text, from);
    let rest = &text[start..];

    if rest.is_empty() || rest.starts_with('#') || (flow && rest.starts_with([',', '}'])) {
        return Ok(None);
    }

    let (len, quote) = match rest.as_bytes()[0] {
        b'\'' => (
            closing_single(rest).ok_or_else(|| unsupported(line, "unterminated quoted value"))?,
            Quote::Single,
        ),
        b'"' => (
            closing_double(rest).ok_or_else(|| unsupported(line, "unterminated quoted value"))?,
            Quote::Double,
        ),
        b'|' | b'>' => return Err(unsupported(line, "block scalar value")),
        b'&' | b'*' | b'!' => return Err(unsupported(line, "anchor, alias or tag")),
        b'[' | b'{' => return Err(unsupported(line, "collection where a scalar was expected")),
        _ => (plain_len(rest, flow), Quote::Plain),
    };

    Ok(Some(Scalar {
        start,
        end: start + len,
        quote,
    }))
}

fn split_lines(source: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut start = if source.starts_with('\u{feff}') { '\u{feff}'.len_utf8() } else { 0 };
    for (idx, raw) in source[start..].split_inclusive('\n').enumerate() {
        let next = start + raw.len();
        let has_terminator = raw.ends_with('\n');
        let text = raw.strip_suffix('\n').unwrap_or(raw);
        let text = text.strip_suffix('\r').unwrap_or(text);
        lines.push(Line {
            number: idx + 1,
            start,
            text,
            has_terminator,
            next,
        });
        start = next;
    }
    lines
}

/// Split `key: value` at the start of `text`, returning the key and the offset just
/// past the colon.
fn block_key(text: &str) -> Option<(String, usize)> {
    let colon = match text.as_bytes().first()? {
        b'\'' => {
            let end = closing_single(text)?;
            end + text[end..].find(':')?
        }
        b'"' => {
            let end = closing_double(text)?;
            end + text[end..].find(':')?
        }
        _ => text
            .char_indices()
            .find(|&(idx, ch)| {
                ch == ':' && text[idx + 1..].chars().next().is_none_or(|c| c == ' ' || c == '\t')
            })
            .map(|(idx, _)| idx)?,
    };
    Some((decode_key(text[..colon].trim_end()), colon + 1))
}

fn flow_key_end(text: &str, pos: usize) -> Option<usize> {
    let rest = &text[pos..];
    let key_len = match rest.as_bytes().first()? {
        b'\'' => closing_single(rest)?,
        b'"' => closing_double(rest)?,
        _ => 0,
    };
    rest[key_len..].find(':').map(|idx| pos + key_len + idx)
}

fn skip_flow_value(text: &str, from: usize) -> Option<usize> {
    let start = skip_spaces(text, from);
    let rest = &text[start..];
    let len = match rest.as_bytes().first() {
        None | Some(b',') | Some(b'}') => 0,
        Some(b'\'') => closing_single(rest)?,
        Some(b'"') => closing_double(rest)?,
        Some(b'[') | Some(b'{') => {
            let mut depth = 0usize;
            let mut quote: Option<char> = None;
            let mut end = None;
            for (idx, ch) in rest.char_indices() {
                match (quote, ch) {
                    (Some(q), c) if c == q => quote = None,
                    (Some(_), _) => {}
                    (None, '\'' | '"') => quote = Some(ch),
                    (None, '[' | '{') => depth += 1,
                    (None, ']' | '}') => {
                        depth -= 1;
                        if depth == 0 {
                            end = Some(idx + 1);
                            break;
                        }
                    }
                    _ => {}
                }
            }
            end?
        }
        Some(_) => plain_len(rest, true),
    };
    Some(start + len)
}

fn closing_single(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut idx = 1;
    while idx < bytes.len() {
        if bytes[idx] == b'\'' {
            if bytes.get(idx + 1) == Some(&b'\'') {
                idx += 2;
                continue;
            }
            return Some(idx + 1);
        }
        idx += 1;
    }
    None
}

fn closing_double(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut idx = 1;
    while idx < bytes.len() {
        match bytes[idx] {
            b'\\' => idx += 2,
            b'"' => return Some(idx + 1),
            _ => idx += 1,
        }
    }
    None
}

fn plain_len(text: &str, flow: bool) -> usize {
    let mut prev_space = false;
    let mut end = text.len();
    for (idx, ch) in text.char_indices() {
        if (ch == '#' && prev_space) || (flow && matches!(ch, ',' | '}' | ']')) {
            end = idx;
            break;
        }
        prev_space = ch == ' ' || ch == '\t';
    }
    text[..end].trim_end().len()
}

fn decode(raw: &str, quote: Quote) -> String {
    match quote {
        Quote::Plain => raw.to_string(),
        Quote::Single => raw[1..raw.len() - 1].replace("''", "'"),
        Quote::Double => {
            let inner = &raw[1..raw.len() - 1];
            let mut out = String::with_capacity(inner.len());
            let mut chars = inner.chars();
            while let Some(ch) = chars.next() {
                if ch != '\\' {
                    out.push(ch);
                    continue;
                }
                match chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(other) => out.push(other),
                    None => {}
                }
            }
            out
        }
    }
}

fn decode_key(raw: &str) -> String {
    match raw.as_bytes().first() {
        Some(b'\'') if raw.len() >= 2 => decode(raw, Quote::Single),
        Some(b'"') if raw.len() >= 2 => decode(raw, Quote::Double),
        _ => raw.to_string(),
    }
}

fn skip_spaces(text: &str, from: usize) -> usize {
    from + text[from..].len() - text[from..].trim_start_matches([' ', '\t']).len()
}

fn strip_comment(value: &str) -> &str {
    let value = value.trim();
    if value.starts_with('#') { "" } else { &value[..plain_len(value, false)] }
}

fn value_is_empty(value: &str) -> bool {
    strip_comment(value).is_empty()
}

fn is_dash(content: &str) -> bool {
    content == "-" || content.starts_with("- ")
}

fn is_plain_safe(value: &str) -> bool {
    const RESERVED: &[&str] = &["", "~", "null", "true", "false", "yes", "no", "on", "off"];

    if RESERVED.contains(&value.to_ascii_lowercase().as_str()) || value.parse::<f64>().is_ok() {
        return false;
    }
    if value.trim() != value || value.starts_with(['-', '?', ':', '&', '*', '!', '|', '>', '\'', '"', '%', '@', '`']) {
        return false;
    }
    !value.contains([',', '[', ']', '{', '}', '#']) && !value.contains(": ") && !value.ends_with(':')
}

fn unsupported(line: &Line<'_>, what: &str) -> UpdaterError {
    UpdaterError::Manifest(format!(
        "Unsupported manifest layout at line {}: {}",
        line.number, what
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_one(source: &str, index: usize, revision: &str) -> String {
        let layout = ManifestLayout::scan(source).unwrap();
        let mut revisions = BTreeMap::new();
        revisions.insert(index, revision.to_string());
        layout.render(source, &revisions)
    }

    #[test]
    fn locates_block_entries() {
        let source = "manifest:\n  projects:\n    - name: a\n      revision: v1\n    - name: b\n";
        let layout = ManifestLayout::scan(source).unwrap();
        let names: Vec<_> = layout.entries.iter().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec![Some("a".to_string()), Some("b".to_string())]);
        assert_eq!(layout.entries[0].line, 3);
    }

    #[test]
    fn replaces_plain_revision_and_keeps_comment() {
        let source = "manifest:\n  projects:\n    - name: a\n      revision: v1  # pinned\n";
        assert_eq!(
            render_one(source, 0, "pull/7/head"),
            "manifest:\n  projects:\n    - name: a\n      revision: pull/7/head  # pinned\n"
        );
    }

    #[test]
    fn keeps_quote_style() {
        let source = "manifest:\n  projects:\n    - name: a\n      revision: 'v1'\n    - name: b\n      revision: \"v2\"\n";
        let layout = ManifestLayout::scan(source).unwrap();
        let mut revisions = BTreeMap::new();
        revisions.insert(0, "pull/1/head".to_string());
        revisions.insert(1, "pull/1/head".to_string());
        assert_eq!(
            layout.render(source, &revisions),
            "manifest:\n  projects:\n    - name: a\n      revision: 'pull/1/head'\n    - name: b\n      revision: \"pull/1/head\"\n"
        );
    }

    #[test]
    fn inserts_missing_revision_at_key_column() {
        let source = "manifest:\n  projects:\n  - name: a\n    path: mod/a\n\n  - name: b\n";
        assert_eq!(
            render_one(source, 0, "pull/3/head"),
            "manifest:\n  projects:\n  - name: a\n    path: mod/a\n    revision: pull/3/head\n\n  - name: b\n"
        );
    }

    #[test]
    fn inserts_missing_revision_at_end_of_file_without_newline() {
        let source = "manifest:\n  projects:\n    - name: a";
        assert_eq!(
            render_one(source, 0, "pull/3/head"),
            "manifest:\n  projects:\n    - name: a\n      revision: pull/3/head"
        );
    }

    #[test]
    fn handles_dash_on_its_own_line() {
        let source = "manifest:\n  projects:\n    -\n      name: a\n      revision: old\n";
        assert_eq!(
            render_one(source, 0, "pull/9/head"),
            "manifest:\n  projects:\n    -\n      name: a\n      revision: pull/9/head\n"
        );
    }

    #[test]
    fn edits_flow_entries() {
        let source = "manifest:\n  projects:\n    - { name: a, revision: v1 }\n    - {name: b}\n";
        let layout = ManifestLayout::scan(source).unwrap();
        let mut revisions = BTreeMap::new();
        revisions.insert(0, "pull/2/head".to_string());
        revisions.insert(1, "pull/2/head".to_string());
        assert_eq!(
            layout.render(source, &revisions),
            "manifest:\n  projects:\n    - { name: a, revision: pull/2/head }\n    - {name: b, revision: pull/2/head}\n"
        );
    }

    #[test]
    fn skips_nested_flow_values() {
        let source = "manifest:\n  projects:\n    - { name: a, groups: [x, y], revision: v1 }\n";
        assert_eq!(
            render_one(source, 0, "pull/5/head"),
            "manifest:\n  projects:\n    - { name: a, groups: [x, y], revision: pull/5/head }\n"
        );
    }

    #[test]
    fn ignores_nested_revision_keys() {
        let source = "manifest:\n  projects:\n    - name: a\n      userdata:\n        revision: keep\n      revision: v1\n";
        assert_eq!(
            render_one(source, 0, "pull/4/head"),
            "manifest:\n  projects:\n    - name: a\n      userdata:\n        revision: keep\n      revision: pull/4/head\n"
        );
    }

    #[test]
    fn reuses_crlf_line_endings() {
        let source = "manifest:\r\n  projects:\r\n    - name: a\r\n      path: x\r\n";
        assert_eq!(
            render_one(source, 0, "pull/1/head"),
            "manifest:\r\n  projects:\r\n    - name: a\r\n      path: x\r\n      revision: pull/1/head\r\n"
        );
    }

    #[test]
    fn stops_at_next_manifest_key() {
        let source = "manifest:\n  projects:\n  - name: a\n  self:\n    path: app\n";
        let layout = ManifestLayout::scan(source).unwrap();
        assert_eq!(layout.entries.len(), 1);
    }

    #[test]
    fn rejects_flow_sequence() {
        let source = "manifest:\n  projects: [{name: a}]\n";
        let err = ManifestLayout::scan(source).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn rejects_block_scalar_revision() {
        let source = "manifest:\n  projects:\n    - name: a\n      revision: |\n        v1\n";
        assert!(matches!(
            ManifestLayout::scan(source),
            Err(UpdaterError::Manifest(_))
        ));
    }

    #[test]
    fn rejects_revision_continued_on_next_line() {
        let source = "manifest:\n  projects:\n    - name: a\n      revision:\n        abcdef\n";
        let err = ManifestLayout::scan(source).unwrap_err();
        assert!(matches!(&err, UpdaterError::Manifest(msg) if msg.contains("line 4")));

        let source = "manifest:\n  projects:\n    - name: a\n      revision: abc\n        def\n";
        assert!(ManifestLayout::scan(source).is_err());
    }

    #[test]
    fn empty_revision_followed_by_sibling_key_is_filled_in() {
        let source = "manifest:\n  projects:\n    - name: a\n      revision:\n      path: x\n";
        assert_eq!(
            render_one(source, 0, "pull/42/head"),
            "manifest:\n  projects:\n    - name: a\n      revision: pull/42/head\n      path: x\n"
        );
    }

    #[test]
    fn treats_tab_after_colon_as_key_separator() {
        let source = "manifest:\n  projects:\n    - name: a\n      revision:\tabcdef\n";
        let layout = ManifestLayout::scan(source).unwrap();
        assert!(matches!(layout.entries[0].slot, RevisionSlot::Scalar { .. }));
        assert_eq!(
            render_one(source, 0, "pull/42/head"),
            "manifest:\n  projects:\n    - name: a\n      revision:\tpull/42/head\n"
        );
    }

    #[test]
    fn skips_byte_order_mark() {
        let source = "\u{feff}manifest:\n  projects:\n    - name: a\n      revision: v1\n";
        assert_eq!(
            render_one(source, 0, "pull/1/head"),
            "\u{feff}manifest:\n  projects:\n    - name: a\n      revision: pull/1/head\n"
        );
    }

    #[test]
    fn quotes_values_that_are_not_plain_safe() {
        assert_eq!(Quote::Plain.render("pull/1/head"), "pull/1/head");
        assert_eq!(Quote::Plain.render("1.0"), "\"1.0\"");
        assert_eq!(Quote::Plain.render("a: b"), "\"a: b\"");
        assert_eq!(Quote::Single.render("it's"), "'it''s'");
    }
}
