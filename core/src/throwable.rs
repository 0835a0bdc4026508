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

//! Errors with cause chains and call frames.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::value::Map;
use crate::value::Value;

/// An error that a layout can take apart.
///
/// Only [`message`](Throwable::message) and [`cause`](Throwable::cause) are required; the other
/// capabilities are optional and default to "absent".
pub trait Throwable: fmt::Debug + Send + Sync {
    /// The human readable message.
    fn message(&self) -> Cow<'_, str>;

    /// The error that caused this one, if any.
    fn cause(&self) -> Option<&dyn Throwable>;

    /// The name of the error type.
    ///
    /// Defaults to the Rust type name of the implementor.
    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }

    /// A numeric error code.
    fn code(&self) -> Option<i64> {
        None
    }

    /// Where the error was raised.
    fn location(&self) -> Option<Location> {
        None
    }

    /// The error's own fields, in declaration order.
    fn fields(&self) -> Map {
        Map::new()
    }

    /// The call frames captured when the error was raised, innermost first.
    fn frames(&self) -> Option<&[Frame]> {
        None
    }
}

/// A source location.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    file: String,
    line: u32,
}

impl Location {
    /// Create a location from a file path and a line number.
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// The location of the caller of this function.
    #[track_caller]
    pub fn caller() -> Self {
        let loc = std::panic::Location::caller();
        Self::new(loc.file(), loc.line())
    }

    /// The file path.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// The line number.
    pub fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One call site of a captured stack trace.
///
/// # Examples
///
/// ```
/// use lograil_core::throwable::Frame;
///
/// let frame = Frame::new("connect")
///     .with_receiver("Pool", "->")
///     .with_arg("db.internal")
///     .with_arg(5432)
///     .with_location("src/pool.rs", 42);
/// assert_eq!(frame.function(), Some("connect"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    receiver: Option<String>,
    call_type: Option<String>,
    function: Option<String>,
    args: Vec<Value>,
    location: Option<Location>,
    anonymous: bool,
}

impl Frame {
    /// A frame calling the named function.
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: Some(function.into()),
            ..Default::default()
        }
    }

    /// A frame of an anonymous, inline callable such as a closure.
    pub fn anonymous() -> Self {
        Self {
            anonymous: true,
            ..Default::default()
        }
    }

    /// A frame with no function name, to be filled in from its parts.
    pub fn unnamed() -> Self {
        Self::default()
    }

    /// Set the receiver (type or instance) and the call operator, e.g. `("Pool", "->")` or
    /// `("Pool", "::")`.
    pub fn with_receiver(
        mut self,
        receiver: impl Into<String>,
        call_type: impl Into<String>,
    ) -> Self {
        self.receiver = Some(receiver.into());
        self.call_type = Some(call_type.into());
        self
    }

    /// Append one call argument.
    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Replace the call arguments.
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Set the source location.
    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.location = Some(Location::new(file, line));
        self
    }

    /// Set the source location to the caller of this function.
    #[track_caller]
    pub fn with_caller_location(mut self) -> Self {
        self.location = Some(Location::caller());
        self
    }

    /// The receiver.
    pub fn receiver(&self) -> Option<&str> {
        self.receiver.as_deref()
    }

    /// The call operator between receiver and function.
    pub fn call_type(&self) -> Option<&str> {
        self.call_type.as_deref()
    }

    /// The function name.
    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    /// The call arguments.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// The source location.
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Whether the frame belongs to an anonymous callable.
    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// The frame's parts as a plain mapping.
    pub fn to_map(&self) -> Map {
        let mut map = Map::new();
        if let Some(receiver) = &self.receiver {
            map.insert("class", receiver.as_str());
        }
        if let Some(call_type) = &self.call_type {
            map.insert("type", call_type.as_str());
        }
        if let Some(function) = &self.function {
            map.insert("function", function.as_str());
        }
        if !self.args.is_empty() {
            map.insert("args", Value::List(self.args.clone()));
        }
        if let Some(location) = &self.location {
            map.insert("file", location.file());
            map.insert("line", location.line());
        }
        map
    }
}

/// An owned error node, the general purpose [`Throwable`].
///
/// # Examples
///
/// ```
/// use lograil_core::throwable::ErrorValue;
/// use lograil_core::throwable::Throwable;
///
/// let err = ErrorValue::new("RuntimeError", "boom")
///     .with_code(5)
///     .with_cause(ErrorValue::new("IoError", "root cause"));
/// assert_eq!(err.message(), "boom");
/// assert_eq!(err.cause().unwrap().message(), "root cause");
/// ```
#[derive(Clone, Debug)]
pub struct ErrorValue {
    type_name: String,
    message: String,
    code: Option<i64>,
    location: Option<Location>,
    fields: Map,
    frames: Option<Vec<Frame>>,
    cause: Option<Arc<dyn Throwable>>,
}

impl ErrorValue {
    /// Create an error of the given type with the given message.
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            code: None,
            location: None,
            fields: Map::new(),
            frames: None,
            cause: None,
        }
    }

    /// Build an error chain from a standard error and its [`source`] chain.
    ///
    /// The outermost node is named after `E`; the sources are only known as trait objects
    /// and are named `Error`.
    ///
    /// [`source`]: std::error::Error::source
    pub fn from_std<E: std::error::Error + 'static>(err: &E) -> Self {
        let mut node = ErrorValue::new(std::any::type_name::<E>(), err.to_string());
        node.cause = err
            .source()
            .map(|src| Arc::new(chain_from_sources(src)) as Arc<dyn Throwable>);
        node
    }

    /// Set the error code.
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the location the error was raised at.
    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.location = Some(Location::new(file, line));
        self
    }

    /// Add an own field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key, value);
        self
    }

    /// Set the captured call frames, innermost first.
    pub fn with_frames(mut self, frames: Vec<Frame>) -> Self {
        self.frames = Some(frames);
        self
    }

    /// Set the cause.
    pub fn with_cause(mut self, cause: impl Throwable + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Set a cause that is shared with other values.
    pub fn with_shared_cause(mut self, cause: Arc<dyn Throwable>) -> Self {
        self.cause = Some(cause);
        self
    }
}

fn chain_from_sources(err: &(dyn std::error::Error + 'static)) -> ErrorValue {
    let mut node = ErrorValue::new("Error", err.to_string());
    node.cause = err
        .source()
        .map(|src| Arc::new(chain_from_sources(src)) as Arc<dyn Throwable>);
    node
}

impl From<anyhow::Error> for ErrorValue {
    fn from(err: anyhow::Error) -> Self {
        let mut chain = err.chain();
        // anyhow's chain always yields the error itself first
        let head = chain.next().map(|e| e.to_string()).unwrap_or_default();
        let mut node = ErrorValue::new("anyhow::Error", head);
        node.cause = chain
            .next()
            .map(|src| Arc::new(chain_from_sources(src)) as Arc<dyn Throwable>);
        node
    }
}

impl Throwable for ErrorValue {
    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.message)
    }

    fn cause(&self) -> Option<&dyn Throwable> {
        self.cause.as_deref()
    }

    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.type_name)
    }

    fn code(&self) -> Option<i64> {
        self.code
    }

    fn location(&self) -> Option<Location> {
        self.location.clone()
    }

    fn fields(&self) -> Map {
        self.fields.clone()
    }

    fn frames(&self) -> Option<&[Frame]> {
        self.frames.as_deref()
    }
}
