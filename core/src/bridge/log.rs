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

use crate::record::Level;
use crate::record::Record;
use crate::record::RecordBuilder;
use crate::value::Map;
use crate::value::Value;

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warning,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Debug,
        }
    }
}

impl Record {
    /// Convert a record of the `log` crate.
    ///
    /// The target becomes the channel and the key-values become the context. Booleans,
    /// integers, floats and strings keep their kind; any other value is stringified.
    ///
    /// # Examples
    ///
    /// ```
    /// use lograil_core::record::Level;
    /// use lograil_core::record::Record;
    ///
    /// let kvs: &[(&str, log::kv::Value)] = &[("user", log::kv::Value::from("alice"))];
    /// let record = Record::from_log(
    ///     &log::Record::builder()
    ///         .args(format_args!("signed in"))
    ///         .level(log::Level::Warn)
    ///         .target("auth")
    ///         .key_values(&kvs)
    ///         .build(),
    /// );
    /// assert_eq!(record.channel(), "auth");
    /// assert_eq!(record.level(), Level::Warning);
    /// assert_eq!(record.message(), "signed in");
    /// ```
    pub fn from_log(record: &log::Record) -> Record {
        struct ContextVisitor {
            context: Map,
        }

        impl<'kvs> log::kv::VisitSource<'kvs> for ContextVisitor {
            fn visit_pair(
                &mut self,
                key: log::kv::Key<'kvs>,
                value: log::kv::Value<'kvs>,
            ) -> Result<(), log::kv::Error> {
                self.context.insert(key.as_str(), value_from_log(&value));
                Ok(())
            }
        }

        let mut visitor = ContextVisitor {
            context: Map::new(),
        };
        // a failing source still leaves the pairs visited so far
        let _ = record.key_values().visit(&mut visitor);

        RecordBuilder::default()
            .channel(record.target())
            .level(record.level().into())
            .message(record.args().to_string())
            .context_map(visitor.context)
            .build()
    }
}

fn value_from_log(value: &log::kv::Value) -> Value {
    if let Some(v) = value.to_bool() {
        Value::Bool(v)
    } else if let Some(v) = value.to_i64() {
        Value::Int(v)
    } else if let Some(v) = value.to_u64() {
        Value::from(v)
    } else if let Some(v) = value.to_f64() {
        Value::Float(v)
    } else if let Some(v) = value.to_borrowed_str() {
        Value::Str(v.to_owned())
    } else {
        Value::Str(value.to_string())
    }
}
