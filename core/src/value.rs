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

//! Nested values attached to a log record.

use std::borrow::Cow;
use std::sync::Arc;

use indexmap::IndexMap;
use jiff::Zoned;

use crate::throwable::ErrorValue;
use crate::throwable::Throwable;

/// An arbitrarily nested value carried in a record's context or extra data.
#[derive(Clone, Debug)]
pub enum Value {
    /// The absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string, possibly spanning multiple lines.
    Str(String),
    /// An ordered list.
    List(Vec<Value>),
    /// An ordered string-keyed mapping.
    Map(Map),
    /// An error, possibly with a chain of causes.
    Error(Arc<dyn Throwable>),
    /// A named record with its own fields.
    Object(Object),
    /// A resource-like handle (file descriptor, stream, socket, ...).
    Handle(Handle),
    /// A point in time.
    Time(Zoned),
    /// A value of a kind no layout knows how to look into.
    Opaque(Cow<'static, str>),
}

impl Value {
    /// The name of the runtime kind of this value.
    ///
    /// For opaque values this is the type name they were created with.
    pub fn kind_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Error(_) => "error",
            Value::Object(_) => "object",
            Value::Handle(_) => "resource",
            Value::Time(_) => "time",
            Value::Opaque(name) => name.as_ref(),
        }
    }

    /// Whether this value is a list, or a mapping whose keys are exactly `"0"` to `"n-1"` in
    /// order.
    pub fn is_list_like(&self) -> bool {
        match self {
            Value::List(_) => true,
            Value::Map(map) => map.is_list_like(),
            _ => false,
        }
    }

    /// Create an opaque value tagged with the given type name.
    pub fn opaque(type_name: impl Into<Cow<'static, str>>) -> Self {
        Value::Opaque(type_name.into())
    }

    /// Create an error value from anything implementing [`Throwable`].
    pub fn error(err: impl Throwable + 'static) -> Self {
        Value::Error(Arc::new(err))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            // errors have no structural equality, only identity
            (Value::Error(a), Value::Error(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Handle(a), Value::Handle(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Str(value.to_string()),
        }
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::from(value as u64)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Cow<'_, str>> for Value {
    fn from(value: Cow<'_, str>) -> Self {
        Value::Str(value.into_owned())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Map(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<Handle> for Value {
    fn from(value: Handle) -> Self {
        Value::Handle(value)
    }
}

impl From<Zoned> for Value {
    fn from(value: Zoned) -> Self {
        Value::Time(value)
    }
}

impl From<ErrorValue> for Value {
    fn from(value: ErrorValue) -> Self {
        Value::Error(Arc::new(value))
    }
}

impl From<Arc<dyn Throwable>> for Value {
    fn from(value: Arc<dyn Throwable>) -> Self {
        Value::Error(value)
    }
}

/// An ordered string-keyed mapping.
///
/// Iteration yields entries in insertion order. Inserting an existing key replaces the value
/// in place without moving the entry.
#[derive(Clone, Debug, Default)]
pub struct Map {
    entries: IndexMap<String, Value>,
}

impl Map {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key-value pair, returning the previous value of the key if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Insert a key-value pair and return the map, for building maps inline.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get the value of a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Remove a key, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the keys are exactly `"0"`, `"1"`, ..., `"n-1"` in this order.
    ///
    /// Such a map is rendered as a list. The test only looks at the keys.
    pub fn is_list_like(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(i, (k, _))| is_index_key(k, i))
    }
}

// only the canonical spelling counts: "01" and "+1" are not indexes
fn is_index_key(key: &str, index: usize) -> bool {
    key.parse::<usize>().is_ok_and(|n| n == index) && key.len() == index.to_string().len()
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Map::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Map {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

// equal maps hold equal entries in the same order
impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A named record, the analogue of a class instance.
#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    type_name: String,
    fields: Map,
}

impl Object {
    /// Create an object of the given type name with no fields.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Map::new(),
        }
    }

    /// Add a field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key, value);
        self
    }

    /// The type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The fields, in declaration order.
    pub fn fields(&self) -> &Map {
        &self.fields
    }

    /// A process-local identifier of this object.
    ///
    /// It distinguishes live objects from each other and is not stable across runs or clones.
    pub fn identity(&self) -> usize {
        self as *const Object as usize
    }
}

/// A resource-like handle, such as an open file or a socket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Handle {
    display: String,
    kind: String,
}

impl Handle {
    /// Create a handle from its display form and resource kind, e.g. `("Resource id #3",
    /// "stream")`.
    pub fn new(display: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            kind: kind.into(),
        }
    }

    /// The display form.
    pub fn display(&self) -> &str {
        &self.display
    }

    /// The resource kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }
}
