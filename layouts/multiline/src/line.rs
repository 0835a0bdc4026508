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

use lograil_core::record::Record;
use lograil_core::value::Map;
use lograil_core::value::Value;

use crate::normalize::Normalizer;
use crate::normalize::to_json;

/// Default header template.
pub const SIMPLE_FORMAT: &str = "[%datetime%] %channel%.%level_name%: %message%";

/// Fills the header template of a record.
#[derive(Debug, Clone)]
pub(crate) struct LineFormatter {
    pub(crate) template: String,
    pub(crate) allow_inline_line_breaks: bool,
    pub(crate) normalizer: Normalizer,
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self {
            template: SIMPLE_FORMAT.to_string(),
            allow_inline_line_breaks: true,
            normalizer: Normalizer::default(),
        }
    }
}

impl LineFormatter {
    /// Substitute every `%name%` placeholder of the template in a single pass.
    ///
    /// Entries consumed by `%context.KEY%` and `%extra.KEY%` are removed from the given maps.
    /// Placeholders that name nothing known are kept as typed.
    pub(crate) fn format(&self, record: &Record, context: &mut Map, extra: &mut Map) -> String {
        let mut out = String::with_capacity(self.template.len() + record.message().len());
        let mut rest = self.template.as_str();
        while let Some(start) = rest.find('%') {
            let (before, tail) = rest.split_at(start);
            out.push_str(before);

            let substituted = tail[1..].find('%').and_then(|end| {
                let name = &tail[1..end + 1];
                self.placeholder(name, record, context, extra)
                    .map(|value| (value, end + 2))
            });
            match substituted {
                Some((value, consumed)) => {
                    out.push_str(&value);
                    rest = &tail[consumed..];
                }
                None => {
                    out.push('%');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn placeholder(
        &self,
        name: &str,
        record: &Record,
        context: &mut Map,
        extra: &mut Map,
    ) -> Option<String> {
        let value = match name {
            "datetime" => self.normalizer.format_time(record.time()),
            "channel" => self.replace_newlines(record.channel()),
            "level_name" => record.level().name().to_string(),
            "level" => record.level().code().to_string(),
            "message" => self.replace_newlines(record.message()),
            _ => {
                let (map, key) = if let Some(key) = name.strip_prefix("context.") {
                    (context, key)
                } else if let Some(key) = name.strip_prefix("extra.") {
                    (extra, key)
                } else {
                    return None;
                };
                if !is_placeholder_key(key) {
                    return None;
                }
                // a missing key still swallows its placeholder
                map.remove(key)
                    .map(|value| self.stringify(&value))
                    .unwrap_or_default()
            }
        };
        Some(value)
    }

    /// Turn a value into inline text: scalars as they are, containers as compact JSON.
    fn stringify(&self, value: &Value) -> String {
        let text = match self.normalizer.normalize(value) {
            Value::Null => "NULL".to_string(),
            Value::Bool(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Str(v) => v,
            other => to_json(&other).to_string(),
        };
        self.replace_newlines(&text)
    }

    fn replace_newlines(&self, text: &str) -> String {
        if self.allow_inline_line_breaks {
            text.to_string()
        } else {
            text.replace("\r\n", " ").replace(['\r', '\n'], " ")
        }
    }
}

fn is_placeholder_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(char::is_whitespace)
}
