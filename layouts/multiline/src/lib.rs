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

//! A layout that formats log record as a header line followed by an indented tree of its
//! context and extra data.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

pub extern crate jiff;

use jiff::tz::TimeZone;
use lograil_core::Error;
use lograil_core::layout::Layout;
use lograil_core::record::Record;
use lograil_core::value::Map;
use lograil_core::value::Value;

pub mod render;

mod line;
pub use self::line::SIMPLE_FORMAT;
use self::line::LineFormatter;

mod normalize;
pub use self::normalize::DATE_FORMAT;
pub use self::normalize::MAX_CAUSE_DEPTH;
pub use self::normalize::Normalizer;

/// Default left rail in front of every line after the first one.
pub const INDENT: &str = " |  ";

/// A layout that formats log record as a header line followed by an indented data tree.
///
/// Output format:
///
/// ```text
/// [2024-08-11T22:44:57.172105+08:00] billing.ERROR: charge failed
///
///  |  context:
///  |    order: 1042
///  |    error:
///  |      type: RuntimeError
///  |      message: card declined
///  |      code: 5
///  |  extra: host: api-1
/// ```
///
/// The header is filled from a template, [`SIMPLE_FORMAT`] by default. A message spanning
/// several lines keeps its line breaks, and every continuation line carries the left rail.
/// You can call [`allow_inline_line_breaks`](MultilineLayout::allow_inline_line_breaks) with
/// `false` to fold them into spaces instead.
///
/// The data block only shows up when the record has context or extra entries. Errors are
/// expanded with their cause chain under `previous`.
///
/// # Examples
///
/// ```
/// use lograil_core::record::Record;
/// use lograil_layout_multiline::MultilineLayout;
///
/// let layout = MultilineLayout::default();
/// let record = Record::builder()
///     .channel("app")
///     .message("started")
///     .context("port", 8080)
///     .build();
///
/// let text = layout.format(&record);
/// assert!(text.ends_with("app.INFO: started\n\n |  context: port: 8080\n"));
/// ```
#[derive(Debug, Clone)]
pub struct MultilineLayout {
    line: LineFormatter,
    indent: String,
}

impl Default for MultilineLayout {
    fn default() -> Self {
        Self {
            line: LineFormatter::default(),
            indent: INDENT.to_string(),
        }
    }
}

impl MultilineLayout {
    /// Set the header template. Default to [`SIMPLE_FORMAT`].
    ///
    /// Recognized placeholders are `%datetime%`, `%channel%`, `%level_name%`, `%level%`,
    /// `%message%`, `%context.KEY%` and `%extra.KEY%`. An entry printed through a
    /// `%context.KEY%` or `%extra.KEY%` placeholder is left out of the data block. Any other
    /// text is copied verbatim.
    ///
    /// # Examples
    ///
    /// ```
    /// use lograil_layout_multiline::MultilineLayout;
    ///
    /// let layout = MultilineLayout::default().template("%level_name% [%context.request%] %message%");
    /// ```
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.line.template = template.into();
        self
    }

    /// Set the [strftime](jiff::fmt::strtime) pattern of `%datetime%` and of timestamps in the
    /// data block. Default to [`DATE_FORMAT`].
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.line.normalizer = self.line.normalizer.date_format(format);
        self
    }

    /// Convert timestamps to this timezone before formatting them.
    ///
    /// Default to the timezone each timestamp carries.
    ///
    /// # Examples
    ///
    /// ```
    /// use jiff::tz::TimeZone;
    /// use lograil_layout_multiline::MultilineLayout;
    ///
    /// let layout = MultilineLayout::default().timezone(TimeZone::UTC);
    /// ```
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.line.normalizer = self.line.normalizer.timezone(tz);
        self
    }

    /// Set the left rail of every line after the first one. Default to [`INDENT`].
    pub fn indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Whether errors list their call frames under `trace`. Default to `true`.
    pub fn include_stacktraces(mut self, include: bool) -> Self {
        self.line.normalizer = self.line.normalizer.include_stacktraces(include);
        self
    }

    /// Whether line breaks in header fields are kept. Default to `true`.
    ///
    /// When disabled, each line break is replaced by a single space.
    pub fn allow_inline_line_breaks(mut self, allow: bool) -> Self {
        self.line.allow_inline_line_breaks = allow;
        self
    }

    /// Set the nesting depth of data past which values are replaced by a marker. Default to 9.
    pub fn max_normalize_depth(mut self, depth: usize) -> Self {
        self.line.normalizer = self.line.normalizer.max_depth(depth);
        self
    }

    /// Set the number of entries kept per container in data. Default to 1000.
    pub fn max_normalize_item_count(mut self, count: usize) -> Self {
        self.line.normalizer = self.line.normalizer.max_item_count(count);
        self
    }

    /// Format a record into text ending with exactly one newline.
    pub fn format(&self, record: &Record) -> String {
        let mut context = record.context().clone();
        let mut extra = record.extra().clone();
        let header = self.line.format(record, &mut context, &mut extra);

        let mut text = render::render_with_leading(&Value::Str(header), &self.indent, "");

        let mut data = Map::new();
        if !context.is_empty() {
            data.insert("context", context);
        }
        if !extra.is_empty() {
            data.insert("extra", extra);
        }
        if !data.is_empty() {
            let data = self.line.normalizer.normalize(&Value::Map(data));
            text.push('\n');
            text.push_str(&render::render(&data, &self.indent));
        }

        let mut text = text.trim_matches(['\r', '\n']).to_string();
        text.push('\n');
        text
    }
}

impl Layout for MultilineLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        Ok(MultilineLayout::format(self, record).into_bytes())
    }
}
