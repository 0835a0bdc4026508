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

//! Core structs for lograil layouts.
//!
//! A [`Record`](record::Record) carries one log event: timestamp, channel, level, message and
//! two ordered side-data maps (context and extra) holding arbitrarily nested
//! [`Value`](value::Value)s, including error chains described by the
//! [`Throwable`](throwable::Throwable) capability trait.
//!
//! Layouts turn records into text; see [`Layout`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

pub extern crate jiff;

pub mod layout;
pub mod record;
pub mod throwable;
pub mod value;

pub use self::layout::Layout;

mod error;
pub use self::error::Error;
pub use self::error::ErrorKind;

#[cfg(feature = "bridge-log")]
mod bridge {
    mod log;
}
