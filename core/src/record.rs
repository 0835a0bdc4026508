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

//! Log record and level.

use std::fmt;
use std::str::FromStr;

use jiff::Zoned;

use crate::Error;
use crate::value::Map;
use crate::value::Value;

/// One log event, as handed to a layout.
#[derive(Clone, Debug)]
pub struct Record {
    // the observed time
    time: Zoned,

    // the metadata
    channel: String,
    level: Level,

    // the payload
    message: String,

    // structural logging
    context: Map,
    extra: Map,
}

impl Record {
    /// The observed time.
    pub fn time(&self) -> &Zoned {
        &self.time
    }

    /// The channel the event was logged on.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// The severity of the event.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The message body, possibly spanning multiple lines.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The context data supplied by the caller.
    pub fn context(&self) -> &Map {
        &self.context
    }

    /// The extra data added by the pipeline.
    pub fn extra(&self) -> &Map {
        &self.extra
    }

    /// Create a builder initialized with the current record's values.
    pub fn to_builder(&self) -> RecordBuilder {
        RecordBuilder {
            record: self.clone(),
        }
    }

    /// Returns a new builder.
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }
}

/// Builder for [`Record`].
///
/// # Examples
///
/// ```
/// use lograil_core::record::Level;
/// use lograil_core::record::Record;
///
/// let record = Record::builder()
///     .channel("billing")
///     .level(Level::Warning)
///     .message("invoice overdue")
///     .context("invoice", 42)
///     .build();
/// assert_eq!(record.context().len(), 1);
/// ```
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
}

impl Default for RecordBuilder {
    fn default() -> Self {
        RecordBuilder {
            record: Record {
                time: Zoned::now(),
                channel: "app".to_string(),
                level: Level::Info,
                message: String::new(),
                context: Map::new(),
                extra: Map::new(),
            },
        }
    }
}

impl RecordBuilder {
    /// Set [`time`](Record::time).
    pub fn time(mut self, time: Zoned) -> Self {
        self.record.time = time;
        self
    }

    /// Set [`channel`](Record::channel).
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.record.channel = channel.into();
        self
    }

    /// Set [`level`](Record::level).
    pub fn level(mut self, level: Level) -> Self {
        self.record.level = level;
        self
    }

    /// Set [`message`](Record::message).
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.record.message = message.into();
        self
    }

    /// Add one [`context`](Record::context) entry.
    pub fn context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.record.context.insert(key, value);
        self
    }

    /// Replace the whole [`context`](Record::context).
    pub fn context_map(mut self, context: Map) -> Self {
        self.record.context = context;
        self
    }

    /// Add one [`extra`](Record::extra) entry.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.record.extra.insert(key, value);
        self
    }

    /// Replace the whole [`extra`](Record::extra).
    pub fn extra_map(mut self, extra: Map) -> Self {
        self.record.extra = extra;
        self
    }

    /// Invoke the builder and return a `Record`
    pub fn build(self) -> Record {
        self.record
    }
}

/// An enum representing the severity of a record.
///
/// Levels are ordered from the least to the most severe.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Detailed debug information.
    Debug,
    /// Interesting events.
    Info,
    /// Normal but significant events.
    Notice,
    /// Exceptional occurrences that are not errors.
    Warning,
    /// Runtime errors that do not require immediate action.
    Error,
    /// Critical conditions.
    Critical,
    /// Action must be taken immediately.
    Alert,
    /// The system is unusable.
    Emergency,
}

impl Level {
    /// Return the upper-case name of the `Level`.
    ///
    /// This returns the same string as the `fmt::Display` implementation.
    pub fn name(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Notice => "NOTICE",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
            Level::Alert => "ALERT",
            Level::Emergency => "EMERGENCY",
        }
    }

    /// Return the numeric severity of the `Level`.
    pub fn code(&self) -> u16 {
        match self {
            Level::Debug => 100,
            Level::Info => 200,
            Level::Notice => 250,
            Level::Warning => 300,
            Level::Error => 400,
            Level::Critical => 500,
            Level::Alert => 550,
            Level::Emergency => 600,
        }
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Level {
    type Err = Error;
    fn from_str(s: &str) -> Result<Level, Self::Err> {
        for level in [
            Level::Debug,
            Level::Info,
            Level::Notice,
            Level::Warning,
            Level::Error,
            Level::Critical,
            Level::Alert,
            Level::Emergency,
        ] {
            if s.eq_ignore_ascii_case(level.name()) {
                return Ok(level);
            }
        }

        Err(Error::invalid_input(format!("malformed level: {s:?}")))
    }
}
