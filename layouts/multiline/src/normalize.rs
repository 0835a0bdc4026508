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

//! Reduce record data to plain nested values before rendering.

use std::sync::Arc;

use jiff::Zoned;
use jiff::fmt::strtime;
use jiff::tz::TimeZone;
use lograil_core::Error;
use lograil_core::throwable::Frame;
use lograil_core::throwable::Throwable;
use lograil_core::value::Map;
use lograil_core::value::Value;

/// Default pattern for timestamps: microsecond precision and a numeric UTC offset.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%6f%:z";

/// A cause chain is followed for at most this many links.
pub const MAX_CAUSE_DEPTH: usize = 32;

/// Turns arbitrary record data into plain nested values.
///
/// Errors become mappings with their cause chain nested under `previous`, objects become
/// single-key mappings named after their type, handles and timestamps become strings.
/// Containers that are too deep or too large are cut off with a marker string.
///
/// # Examples
///
/// ```
/// use lograil_core::throwable::ErrorValue;
/// use lograil_core::value::Value;
/// use lograil_layout_multiline::Normalizer;
///
/// let err = Value::from(ErrorValue::new("RuntimeError", "boom").with_code(5));
/// let normalized = Normalizer::default().normalize_error(&err).unwrap();
/// let Value::Map(map) = normalized else { unreachable!() };
/// assert_eq!(map.get("code"), Some(&Value::Int(5)));
/// ```
#[derive(Debug, Clone)]
pub struct Normalizer {
    max_depth: usize,
    max_item_count: usize,
    include_stacktraces: bool,
    date_format: String,
    timezone: Option<TimeZone>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            max_depth: 9,
            max_item_count: 1000,
            include_stacktraces: true,
            date_format: DATE_FORMAT.to_string(),
            timezone: None,
        }
    }
}

impl Normalizer {
    /// Set the nesting depth past which values are replaced by a marker. Default to 9.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the number of entries kept per container. Default to 1000.
    pub fn max_item_count(mut self, count: usize) -> Self {
        self.max_item_count = count;
        self
    }

    /// Whether errors carry their call frames under `trace`. Default to `true`.
    pub fn include_stacktraces(mut self, include: bool) -> Self {
        self.include_stacktraces = include;
        self
    }

    /// Set the [strftime](jiff::fmt::strtime) pattern for timestamps.
    ///
    /// Default to [`DATE_FORMAT`].
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Convert timestamps to this timezone before formatting them.
    ///
    /// Default to keeping the timezone each timestamp carries.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.timezone = Some(tz);
        self
    }

    /// Format a timestamp with the configured pattern and timezone.
    ///
    /// A pattern jiff cannot apply falls back to ISO 8601 with microseconds.
    pub fn format_time(&self, time: &Zoned) -> String {
        let time = match &self.timezone {
            Some(tz) => time.with_time_zone(tz.clone()),
            None => time.clone(),
        };
        strtime::format(self.date_format.as_str(), &time).unwrap_or_else(|_| {
            format!("{:.6}", time.timestamp().display_with_offset(time.offset()))
        })
    }

    /// Normalize any value.
    pub fn normalize(&self, value: &Value) -> Value {
        self.normalize_at(value, 0)
    }

    /// Normalize an error value into a mapping.
    ///
    /// # Errors
    ///
    /// Return an [`InvalidInput`](lograil_core::ErrorKind::InvalidInput) error if the value
    /// is not an error.
    pub fn normalize_error(&self, value: &Value) -> Result<Value, Error> {
        match value {
            Value::Error(err) => Ok(self.normalize_throwable(err.as_ref())),
            other => Err(Error::invalid_input("value is not an error")
                .with_context("kind", other.kind_name())),
        }
    }

    /// Normalize an error and its cause chain into a mapping.
    ///
    /// Keys, in order: `type`, `message`, `code` and `file` when known, the error's own
    /// fields, `trace` when stack traces are enabled and frames were captured, and
    /// `previous` holding the normalized cause.
    ///
    /// The key set is not fixed: `code` and `file` are left out when the error does not
    /// know them, rather than showing a made-up `code: 0` or an empty location.
    pub fn normalize_throwable(&self, err: &dyn Throwable) -> Value {
        self.normalize_throwable_at(err, 0, 0)
    }

    /// Render call arguments as a comma separated list of compact literals.
    pub fn stringify_args(&self, args: &[Value]) -> String {
        self.stringify_args_at(args, 0)
    }

    fn normalize_at(&self, value: &Value, depth: usize) -> Value {
        if depth > self.max_depth {
            return self.too_deep();
        }

        match value {
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Str(_) | Value::Opaque(_) => {
                value.clone()
            }
            Value::Float(v) if v.is_nan() => Value::from("NaN"),
            Value::Float(v) if v.is_infinite() => {
                Value::from(if *v > 0.0 { "INF" } else { "-INF" })
            }
            Value::Float(_) => value.clone(),
            Value::List(items) => self.normalize_list(items, depth),
            Value::Map(map) => self.normalize_map(map, depth),
            Value::Error(err) => self.normalize_throwable_at(err.as_ref(), depth, 0),
            Value::Object(obj) => {
                let fields = self.normalize_map(obj.fields(), depth + 1);
                Value::Map(Map::new().with(obj.type_name(), fields))
            }
            Value::Handle(handle) => Value::Str(format!("[resource({})]", handle.kind())),
            Value::Time(time) => Value::Str(self.format_time(time)),
        }
    }

    fn normalize_list(&self, items: &[Value], depth: usize) -> Value {
        if items.len() <= self.max_item_count {
            return Value::List(
                items
                    .iter()
                    .map(|item| self.normalize_at(item, depth + 1))
                    .collect(),
            );
        }

        // the marker key breaks list-likeness, so a cut list turns into a mapping
        let mut map = Map::new();
        for (i, item) in items.iter().take(self.max_item_count).enumerate() {
            map.insert(i.to_string(), self.normalize_at(item, depth + 1));
        }
        map.insert("...", self.too_many(items.len()));
        Value::Map(map)
    }

    fn normalize_map(&self, map: &Map, depth: usize) -> Value {
        let mut normalized = Map::new();
        for (count, (key, value)) in map.iter().enumerate() {
            if count >= self.max_item_count {
                normalized.insert("...", self.too_many(map.len()));
                break;
            }
            normalized.insert(key, self.normalize_at(value, depth + 1));
        }
        Value::Map(normalized)
    }

    fn normalize_throwable_at(&self, err: &dyn Throwable, depth: usize, links: usize) -> Value {
        if depth > self.max_depth {
            return self.too_deep();
        }

        let mut map = Map::new();
        map.insert("type", err.type_name().into_owned());
        map.insert("message", err.message().into_owned());
        if let Some(code) = err.code() {
            map.insert("code", code);
        }
        if let Some(location) = err.location() {
            map.insert("file", location.to_string());
        }
        for (key, value) in err.fields() {
            map.insert(key, self.normalize_at(&value, depth + 1));
        }

        if self.include_stacktraces {
            if let Some(frames) = err.frames().filter(|frames| !frames.is_empty()) {
                map.insert("trace", self.normalize_trace(frames, depth + 1));
            }
        }

        if let Some(cause) = err.cause() {
            let previous = if links + 1 >= MAX_CAUSE_DEPTH {
                Value::opaque("cause chain truncated")
            } else {
                self.normalize_throwable_at(cause, depth + 1, links + 1)
            };
            map.insert("previous", previous);
        }

        Value::Map(map)
    }

    fn normalize_trace(&self, frames: &[Frame], depth: usize) -> Value {
        let total = frames.len();
        let width = total.to_string().len().max(2);
        let mut trace = Map::new();
        for (i, frame) in frames.iter().enumerate() {
            let key = format!("#{:0width$}", total - i);
            trace.insert(key, self.normalize_frame(frame, depth + 1));
        }
        Value::Map(trace)
    }

    fn normalize_frame(&self, frame: &Frame, depth: usize) -> Value {
        match (frame.location(), self.call_expression(frame, depth)) {
            (Some(location), Some(call)) => Value::Str(format!("{call} at {location}")),
            (Some(location), None) => Value::Str(location.to_string()),
            (None, _) if frame.is_anonymous() => Value::from(ANONYMOUS_CALLABLE),
            (None, _) => self.normalize_at(&Value::Map(frame.to_map()), depth),
        }
    }

    fn call_expression(&self, frame: &Frame, depth: usize) -> Option<String> {
        let function = match frame.function() {
            Some(function) => function,
            None if frame.is_anonymous() => ANONYMOUS_CALLABLE,
            None => return None,
        };

        let mut call = String::new();
        if let Some(receiver) = frame.receiver() {
            call.push_str(receiver);
            call.push_str(frame.call_type().unwrap_or_default());
        }
        call.push_str(function);
        call.push('(');
        call.push_str(&self.stringify_args_at(frame.args(), depth + 1));
        call.push(')');
        Some(call)
    }

    fn stringify_args_at(&self, args: &[Value], depth: usize) -> String {
        args.iter()
            .map(|arg| self.stringify_arg(arg, depth))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn stringify_arg(&self, arg: &Value, depth: usize) -> String {
        match arg {
            Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Str(_)
            | Value::List(_)
            | Value::Map(_)
            | Value::Time(_) => to_json(&self.normalize_at(arg, depth)).to_string(),
            Value::Object(obj) => {
                let fields = self.normalize_map(obj.fields(), depth);
                format!("{}#{} {}", obj.type_name(), obj.identity(), to_json(&fields))
            }
            Value::Error(err) => {
                let identity = Arc::as_ptr(err) as *const () as usize;
                let normalized = self.normalize_throwable_at(err.as_ref(), depth, 0);
                format!("{}#{identity} {}", err.type_name(), to_json(&normalized))
            }
            Value::Handle(handle) => format!("{}({})", handle.display(), handle.kind()),
            Value::Opaque(name) => format!("?{name}?"),
        }
    }

    fn too_deep(&self) -> Value {
        Value::Str(format!(
            "Over {} levels deep, aborting normalization",
            self.max_depth
        ))
    }

    fn too_many(&self, total: usize) -> Value {
        Value::Str(format!(
            "Over {} items ({total} total), aborting normalization",
            self.max_item_count
        ))
    }
}

const ANONYMOUS_CALLABLE: &str = "{closure}";

/// Convert a normalized value to JSON, keeping mapping order.
pub(crate) fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(v) => serde_json::Value::Bool(*v),
        Value::Int(v) => serde_json::Value::from(*v),
        Value::Float(v) => serde_json::Number::from_f64(*v)
            .map_or_else(|| serde_json::Value::String(v.to_string()), Into::into),
        Value::Str(v) => serde_json::Value::String(v.clone()),
        Value::List(items) => items.iter().map(to_json).collect(),
        Value::Map(map) if map.is_list_like() => map.iter().map(|(_, v)| to_json(v)).collect(),
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.to_owned(), to_json(v)))
                .collect(),
        ),
        other => serde_json::Value::String(format!("[{}]", other.kind_name())),
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use jiff::civil::date;
    use lograil_core::ErrorKind;
    use lograil_core::throwable::ErrorValue;
    use lograil_core::value::Handle;
    use lograil_core::value::Object;

    use super::*;
    use crate::render::render;

    fn as_map(value: Value) -> Map {
        match value {
            Value::Map(map) => map,
            other => panic!("expected a mapping, got {other:?}"),
        }
    }

    #[test]
    fn test_error_chain_nests_previous() {
        let err = ErrorValue::new("RuntimeError", "boom")
            .with_code(5)
            .with_cause(ErrorValue::new("IoError", "root cause"));
        let map = as_map(Normalizer::default().normalize(&Value::from(err)));

        assert_eq!(map.get("message"), Some(&Value::from("boom")));
        assert_eq!(map.get("code"), Some(&Value::Int(5)));
        let previous = as_map(map.get("previous").cloned().unwrap());
        assert_eq!(previous.get("message"), Some(&Value::from("root cause")));
        assert!(previous.get("previous").is_none());
    }

    #[test]
    fn test_shared_cause_nests_under_each_error() {
        let cause: Arc<dyn Throwable> = Arc::new(ErrorValue::new("IoError", "connection reset"));
        let first = ErrorValue::new("ReadError", "read failed").with_shared_cause(cause.clone());
        let second = ErrorValue::new("WriteError", "write failed").with_shared_cause(cause.clone());
        assert_eq!(Arc::strong_count(&cause), 3);

        let normalizer = Normalizer::default();
        for err in [first, second] {
            let map = as_map(normalizer.normalize_throwable(&err));
            let previous = as_map(map.get("previous").cloned().unwrap());
            assert_eq!(previous.get("type"), Some(&Value::from("IoError")));
            assert_eq!(previous.get("message"), Some(&Value::from("connection reset")));
        }
    }

    #[test]
    fn test_caller_located_and_unnamed_frames() {
        let (retry, line) = (Frame::new("retry").with_caller_location(), line!());
        let frames = vec![
            retry.with_args(vec![Value::from(3), Value::Null]),
            Frame::unnamed().with_location("src/lib.rs", 9),
            Frame::unnamed().with_arg("x"),
        ];
        let err = ErrorValue::new("TimeoutError", "gave up").with_frames(frames);
        let map = as_map(Normalizer::default().normalize_throwable(&err));
        let trace = as_map(map.get("trace").cloned().unwrap());

        let expected = format!("retry(3, null) at {}:{line}", file!());
        assert_eq!(trace.get("#03"), Some(&Value::Str(expected)));
        assert_eq!(trace.get("#02"), Some(&Value::from("src/lib.rs:9")));
        assert_eq!(
            trace.get("#01"),
            Some(&Value::Map(Map::new().with("args", vec!["x"])))
        );
    }

    #[test]
    fn test_error_keys_in_fixed_order() {
        let err = ErrorValue::new("QueryError", "syntax error")
            .with_code(1064)
            .with_location("src/db.rs", 88)
            .with_field("sql", "SELECT * FORM users")
            .with_frames(vec![Frame::new("query").with_location("src/db.rs", 88)])
            .with_cause(ErrorValue::new("Error", "inner"));
        let map = as_map(Normalizer::default().normalize_throwable(&err));
        let keys = map.iter().map(|(k, _)| k).collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec!["type", "message", "code", "file", "sql", "trace", "previous"]
        );
        assert_eq!(map.get("file"), Some(&Value::from("src/db.rs:88")));
    }

    #[test]
    fn test_normalize_error_rejects_non_errors() {
        let err = Normalizer::default()
            .normalize_error(&Value::from("boom"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_trace_frames() {
        let frames = vec![
            Frame::new("connect")
                .with_receiver("Pool", "->")
                .with_arg("db.internal")
                .with_arg(5432)
                .with_location("src/pool.rs", 42),
            Frame::anonymous(),
            Frame::new("spawn").with_receiver("Runtime", "::"),
        ];
        let err = ErrorValue::new("ConnectError", "refused").with_frames(frames);
        let map = as_map(Normalizer::default().normalize_throwable(&err));
        let trace = map.get("trace").unwrap();

        insta::assert_snapshot!(render(trace, ""), @r#"
        #03: Pool->connect("db.internal", 5432) at src/pool.rs:42
        #02: {closure}
        #01:
          class: Runtime
          type: ::
          function: spawn
        "#);
    }

    #[test]
    fn test_trace_is_omitted_when_disabled() {
        let err = ErrorValue::new("E", "m").with_frames(vec![Frame::anonymous()]);
        let map = as_map(
            Normalizer::default()
                .include_stacktraces(false)
                .normalize_throwable(&err),
        );
        assert!(map.get("trace").is_none());
    }

    #[test]
    fn test_trace_keys_widen_with_frame_count() {
        let frames = (0..120).map(|_| Frame::anonymous()).collect::<Vec<_>>();
        let err = ErrorValue::new("E", "m").with_frames(frames);
        let map = as_map(Normalizer::default().normalize_throwable(&err));
        let trace = as_map(map.get("trace").cloned().unwrap());
        let keys = trace.iter().map(|(k, _)| k).collect::<Vec<_>>();
        assert_eq!(keys.first(), Some(&"#120"));
        assert_eq!(keys.last(), Some(&"#001"));
    }

    #[test]
    fn test_stringify_args() {
        let normalizer = Normalizer::default();
        let args = vec![
            Value::Null,
            Value::Bool(true),
            Value::Float(0.5),
            Value::from("a/b"),
            Value::from(vec![1, 2]),
            Value::Map(Map::new().with("b", 1).with("a", 2)),
            Value::Handle(Handle::new("Resource id #7", "stream")),
            Value::opaque("Closure"),
        ];
        assert_eq!(
            normalizer.stringify_args(&args),
            r#"null, true, 0.5, "a/b", [1,2], {"b":1,"a":2}, Resource id #7(stream), ?Closure?"#
        );

        let point = Object::new("Point").with_field("x", 1);
        let text = normalizer.stringify_args(&[Value::Object(point)]);
        assert!(text.starts_with("Point#"), "{text}");
        assert!(text.ends_with(r#" {"x":1}"#), "{text}");
    }

    #[test]
    fn test_objects_handles_and_times() {
        let time = date(2024, 8, 11)
            .at(22, 44, 57, 172_105_000)
            .to_zoned(TimeZone::UTC)
            .unwrap();
        let value = Value::Map(
            Map::new()
                .with("point", Object::new("Point").with_field("x", 1))
                .with("file", Handle::new("Resource id #3", "stream"))
                .with("at", time)
                .with("ratio", f64::INFINITY),
        );
        let normalized = Normalizer::default().normalize(&value);
        insta::assert_snapshot!(render(&normalized, ""), @r"
        point: Point: x: 1
        file: [resource(stream)]
        at: 2024-08-11T22:44:57.172105+00:00
        ratio: INF
        ");
    }

    #[test]
    fn test_depth_limit() {
        let value = Value::Map(
            Map::new().with("a", Map::new().with("b", Map::new().with("c", 1))),
        );
        let normalized = Normalizer::default().max_depth(2).normalize(&value);
        insta::assert_snapshot!(render(&normalized, ""), @r"
        a: b: c: Over 2 levels deep, aborting normalization
        ");
    }

    #[test]
    fn test_item_count_limit() {
        let normalizer = Normalizer::default().max_item_count(2);

        let list = normalizer.normalize(&Value::from(vec![1, 2, 3]));
        insta::assert_snapshot!(render(&list, ""), @r"
        0: 1
        1: 2
        ...: Over 2 items (3 total), aborting normalization
        ");

        let map = normalizer.normalize(&Value::Map(Map::new().with("a", 1).with("b", 2)));
        assert_eq!(map, Value::Map(Map::new().with("a", 1).with("b", 2)));
    }

    #[test]
    fn test_cause_cycle_is_bounded() {
        #[derive(Debug)]
        struct Loop;

        impl Throwable for Loop {
            fn message(&self) -> Cow<'_, str> {
                Cow::Borrowed("again")
            }

            fn cause(&self) -> Option<&dyn Throwable> {
                Some(self)
            }
        }

        let normalizer = Normalizer::default().max_depth(usize::MAX);
        let mut node = as_map(normalizer.normalize_throwable(&Loop));
        let mut links = 0;
        while let Some(Value::Map(previous)) = node.get("previous").cloned() {
            node = previous;
            links += 1;
        }
        assert_eq!(links, MAX_CAUSE_DEPTH - 1);
        assert_eq!(
            node.get("previous"),
            Some(&Value::opaque("cause chain truncated"))
        );
    }

    #[test]
    fn test_format_time_with_timezone() {
        let time = date(2024, 1, 2)
            .at(3, 4, 5, 0)
            .to_zoned(TimeZone::UTC)
            .unwrap();
        let normalizer = Normalizer::default().timezone(TimeZone::fixed(jiff::tz::offset(8)));
        assert_eq!(normalizer.format_time(&time), "2024-01-02T11:04:05.000000+08:00");

        let custom = Normalizer::default().date_format("%Y/%m/%d");
        assert_eq!(custom.format_time(&time), "2024/01/02");
    }
}
