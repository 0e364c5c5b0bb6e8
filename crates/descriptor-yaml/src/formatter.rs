//! Block-style YAML emitter.
//!
//! Layout is driven by [`EmitOptions`]:
//! - nested mappings are indented by `indent` columns
//! - sequence dashes sit `sequence_dash_offset` columns right of their parent
//!   key, with item content at `indent`
//! - lines are never wrapped
//!
//! Keys that still carry their source lines are written back verbatim;
//! the layout rules only apply to keys inserted or replaced since parsing.
//!
//! Scalars are rendered by `serde_yaml` so quoting follows its rules.
//! Multi-line strings become literal blocks re-indented under their parent.

use crate::{Document, Result, Value};
use std::fmt::Write;

/// Indentation settings for emitted documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    /// Columns added per nested mapping level.
    pub indent: usize,
    /// Columns between a parent key and the dash of its sequence items.
    pub sequence_dash_offset: usize,
}

impl Default for EmitOptions {
    /// The layout used by existing image descriptors.
    fn default() -> Self {
        Self {
            indent: 6,
            sequence_dash_offset: 4,
        }
    }
}

impl EmitOptions {
    /// Column offset of sequence item content. Never less than the dash
    /// column plus `"- "`.
    fn item_indent(&self) -> usize {
        self.indent.max(self.sequence_dash_offset + 2)
    }
}

/// Render `document` as YAML text with a trailing newline.
pub fn emit(document: &Document, options: &EmitOptions) -> Result<String> {
    let mut emitter = Emitter::new(options);

    emitter.verbatim(document.header());

    if document.is_empty() {
        emitter.push(0, "{}");
    }

    for (key, value) in document.iter() {
        let annotation = document.annotation(key);
        if let Some(annotation) = annotation {
            emitter.verbatim(&annotation.leading);
        }

        match document.source_lines(key) {
            Some(lines) => emitter.verbatim(lines),
            None => emitter.entry(0, &Value::String(key.to_string()), value)?,
        }

        if annotation.is_some_and(|a| a.blank_line_after) {
            emitter.blank();
        }
    }

    emitter.verbatim(document.trailer());

    Ok(emitter.finish())
}

enum Scalar {
    Inline(String),
    Block { header: String, body: Vec<String> },
}

struct Emitter<'a> {
    options: &'a EmitOptions,
    lines: Vec<String>,
}

impl<'a> Emitter<'a> {
    fn new(options: &'a EmitOptions) -> Self {
        Self {
            options,
            lines: Vec::new(),
        }
    }

    fn push(&mut self, column: usize, text: &str) {
        if text.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{:column$}{text}", ""));
        }
    }

    /// Push an empty line unless the output is empty or already ends in one.
    fn blank(&mut self) {
        if self.lines.last().is_some_and(|l| !l.is_empty()) {
            self.lines.push(String::new());
        }
    }

    /// Push source lines unchanged. A leading blank line is dropped when
    /// the output already ends in one.
    fn verbatim(&mut self, lines: &[String]) {
        let skip = usize::from(
            lines.first().is_some_and(|l| l.trim().is_empty())
                && self.lines.last().is_some_and(|l| l.is_empty()),
        );
        self.lines.extend(lines.iter().skip(skip).cloned());
    }

    fn entry(&mut self, column: usize, key: &Value, value: &Value) -> Result<()> {
        let key = match render_scalar(key)? {
            Scalar::Inline(text) => text,
            Scalar::Block { .. } => double_quoted(&key_text(key)),
        };

        match value {
            Value::Mapping(mapping) if !mapping.is_empty() => {
                self.push(column, &format!("{key}:"));
                for (k, v) in mapping {
                    self.entry(column + self.options.indent, k, v)?;
                }
            }
            Value::Sequence(items) if !items.is_empty() => {
                self.push(column, &format!("{key}:"));
                self.sequence(column, items)?;
            }
            Value::Mapping(_) => self.push(column, &format!("{key}: {{}}")),
            Value::Sequence(_) => self.push(column, &format!("{key}: []")),
            scalar => match render_scalar(scalar)? {
                Scalar::Inline(text) => self.push(column, &format!("{key}: {text}")),
                Scalar::Block { header, body } => {
                    self.push(column, &format!("{key}: {header}"));
                    self.block_body(column + self.options.indent, &body);
                }
            },
        }
        Ok(())
    }

    /// Emit sequence items belonging to a parent at `column`.
    fn sequence(&mut self, column: usize, items: &[Value]) -> Result<()> {
        let dash_column = column + self.options.sequence_dash_offset;
        let content_column = column + self.options.item_indent();

        for item in items {
            if let Value::Sequence(nested) = item
                && !nested.is_empty()
            {
                self.push(dash_column, "-");
                self.sequence(content_column, nested)?;
                continue;
            }

            let start = self.lines.len();
            self.item(content_column, item)?;

            // Fold the item's first line onto the dash.
            if let Some(first) = self.lines.get_mut(start) {
                *first = format!("{:dash_column$}- {}", "", first.trim_start());
            }
        }
        Ok(())
    }

    /// Emit a sequence item's content with its first line at `column`.
    fn item(&mut self, column: usize, value: &Value) -> Result<()> {
        match value {
            Value::Mapping(mapping) if !mapping.is_empty() => {
                for (k, v) in mapping {
                    self.entry(column, k, v)?;
                }
            }
            Value::Sequence(items) if !items.is_empty() => self.sequence(column, items)?,
            Value::Mapping(_) => self.push(column, "{}"),
            Value::Sequence(_) => self.push(column, "[]"),
            scalar => match render_scalar(scalar)? {
                Scalar::Inline(text) => self.push(column, &text),
                Scalar::Block { header, body } => {
                    self.push(column, &header);
                    self.block_body(column, &body);
                }
            },
        }
        Ok(())
    }

    fn block_body(&mut self, column: usize, body: &[String]) {
        for line in body {
            self.push(column, line);
        }
    }

    fn finish(mut self) -> String {
        while self.lines.last().is_some_and(|l| l.trim().is_empty()) {
            self.lines.pop();
        }
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

fn render_scalar(value: &Value) -> Result<Scalar> {
    let rendered = serde_yaml::to_string(value)?;
    let mut lines: Vec<&str> = rendered.lines().collect();
    if lines.first() == Some(&"---") {
        lines.remove(0);
    }
    if lines.last() == Some(&"...") {
        lines.pop();
    }

    let Some((&first, rest)) = lines.split_first() else {
        return Ok(Scalar::Inline("''".to_string()));
    };

    if rest.is_empty() {
        return Ok(Scalar::Inline(first.to_string()));
    }

    match value {
        Value::String(_) if is_plain_block_header(first) => Ok(Scalar::Block {
            header: first.to_string(),
            body: dedent(rest),
        }),
        Value::String(s) => Ok(Scalar::Inline(double_quoted(s))),
        _ => Ok(Scalar::Block {
            header: first.to_string(),
            body: dedent(rest),
        }),
    }
}

/// `|`, `|-`, `|+`, `>`... without an explicit indentation indicator, which
/// would no longer hold once the body is re-indented.
fn is_plain_block_header(header: &str) -> bool {
    let mut chars = header.chars();
    matches!(chars.next(), Some('|' | '>')) && chars.all(|c| matches!(c, '-' | '+'))
}

fn dedent(lines: &[&str]) -> Vec<String> {
    let common = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| l.get(common..).unwrap_or("").to_string())
        .collect()
}

fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => format!("{other:?}"),
    }
}

/// YAML double-quoted form of `s`.
fn double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
