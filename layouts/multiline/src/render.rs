// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Render nested values as an indented text tree.
//!
//! Lists render as dashed items, mappings as `key: value` lines; every nesting level pushes
//! the left margin further right:
//!
//! ```text
//! user:
//!   name: alice
//!   roles:
//!     - admin
//!     - ops
//! ```

use std::fmt::Write;

use lograil_core::value::Map;
use lograil_core::value::Value;

/// Containers nested deeper than this render as their bracketed kind, e.g. `[list]`.
pub const MAX_RENDER_DEPTH: usize = 64;

const LIST_INDENT: &str = "    ";
const MAP_INDENT: &str = "  ";

/// Render a value with every line prefixed by `indent`.
///
/// The result ends with exactly one newline, or is empty for an empty container.
pub fn render(value: &Value, indent: &str) -> String {
    render_at(value, indent, None, 0)
}

/// Like [`render`], but the first line is prefixed by `leading` instead of `indent`.
pub fn render_with_leading(value: &Value, indent: &str, leading: &str) -> String {
    render_at(value, indent, Some(leading), 0)
}

fn render_at(value: &Value, indent: &str, leading: Option<&str>, depth: usize) -> String {
    let rendered = match value {
        Value::Null => return indent_text("NULL", indent, leading),
        Value::Bool(true) => return indent_text("true", indent, leading),
        Value::Bool(false) => return indent_text("false", indent, leading),
        Value::Int(v) => return indent_text(&v.to_string(), indent, leading),
        Value::Float(v) => return indent_text(&v.to_string(), indent, leading),
        Value::Str(v) => return indent_text(v, indent, leading),
        Value::List(_) | Value::Map(_) if depth >= MAX_RENDER_DEPTH => {
            return indent_text(&bracketed(value), indent, leading);
        }
        Value::List(items) => render_list(items.iter(), indent, depth),
        Value::Map(map) if map.is_list_like() => {
            render_list(map.iter().map(|(_, v)| v), indent, depth)
        }
        Value::Map(map) => render_map(map, indent, depth),
        _ => return indent_text(&bracketed(value), indent, leading),
    };

    // containers start with `indent`; swap it for the leading override
    match leading {
        Some(leading) if !rendered.is_empty() => {
            format!("{leading}{}", &rendered[indent.len()..])
        }
        _ => rendered,
    }
}

fn render_list<'a>(
    items: impl Iterator<Item = &'a Value>,
    indent: &str,
    depth: usize,
) -> String {
    let nested = format!("{indent}{LIST_INDENT}");
    let mut text = String::new();
    for item in items {
        let rendered = render_at(item, &nested, Some(""), depth + 1);
        if rendered.is_empty() || rendered == "\n" {
            text.push_str(indent);
            text.push_str("-\n");
        } else {
            // SAFETY: write to a string always succeeds
            write!(&mut text, "{indent}- {rendered}").unwrap();
        }
    }
    text
}

fn render_map(map: &Map, indent: &str, depth: usize) -> String {
    let nested = format!("{indent}{MAP_INDENT}");
    let mut text = String::new();
    for (key, value) in map.iter() {
        let rendered = render_at(value, &nested, None, depth + 1);
        if is_single_line(&rendered) {
            // every single-line rendering starts with `nested`, containers included
            let value = &rendered[nested.len()..];
            if value == "\n" {
                // SAFETY: write to a string always succeeds
                writeln!(&mut text, "{indent}{key}:").unwrap();
            } else {
                // SAFETY: write to a string always succeeds
                write!(&mut text, "{indent}{key}: {value}").unwrap();
            }
        } else {
            // SAFETY: write to a string always succeeds
            write!(&mut text, "{indent}{key}:\n{rendered}").unwrap();
        }
    }
    text
}

fn is_single_line(rendered: &str) -> bool {
    rendered.ends_with('\n') && rendered.find('\n') == Some(rendered.len() - 1)
}

fn bracketed(value: &Value) -> String {
    format!("[{}]", value.kind_name())
}

fn indent_text(text: &str, indent: &str, leading: Option<&str>) -> String {
    let text = text.trim();
    let mut out = String::with_capacity(text.len() + indent.len() + 1);
    out.push_str(leading.unwrap_or(indent));
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            out.push_str(indent);
        }
        out.push_str(line.strip_suffix('\r').unwrap_or(line));
    }
    out.push('\n');
    out
}
