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

use std::borrow::Cow;

use jiff::civil::date;
use jiff::tz::TimeZone;
use lograil_core::layout::Layout;
use lograil_core::record::Level;
use lograil_core::record::Record;
use lograil_core::record::RecordBuilder;
use lograil_core::throwable::ErrorValue;
use lograil_core::throwable::Frame;
use lograil_core::throwable::Throwable;
use lograil_core::value::Map;
use lograil_core::value::Value;
use lograil_layout_multiline::MultilineLayout;

fn builder() -> RecordBuilder {
    Record::builder()
        .time(
            date(2024, 8, 11)
                .at(22, 44, 57, 172_105_000)
                .to_zoned(TimeZone::fixed(jiff::tz::offset(8)))
                .unwrap(),
        )
        .channel("billing")
        .level(Level::Error)
        .message("charge failed")
}

#[derive(Debug)]
struct QuotaExceeded {
    limit: i64,
    source: ErrorValue,
}

impl Throwable for QuotaExceeded {
    fn message(&self) -> Cow<'_, str> {
        Cow::Owned(format!("quota of {} exceeded", self.limit))
    }

    fn cause(&self) -> Option<&dyn Throwable> {
        Some(&self.source)
    }

    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed("QuotaExceeded")
    }

    fn fields(&self) -> Map {
        Map::new().with("limit", self.limit)
    }
}

#[test]
fn full_record() {
    let err = ErrorValue::new("PaymentError", "card declined")
        .with_code(5)
        .with_location("src/charge.rs", 88)
        .with_field("gateway", "stripe")
        .with_frames(vec![
            Frame::new("charge")
                .with_receiver("Gateway", "->")
                .with_arg(1042)
                .with_arg("EUR")
                .with_location("src/gateway.rs", 17),
            Frame::new("main").with_location("src/main.rs", 3),
        ])
        .with_cause(ErrorValue::new("IoError", "connection reset"));
    let record = builder()
        .context("order", 1042)
        .context("error", err)
        .extra("host", "api-1")
        .build();

    let text = MultilineLayout::default().indent("| ").format(&record);
    insta::assert_snapshot!(text, @r#"
    [2024-08-11T22:44:57.172105+08:00] billing.ERROR: charge failed

    | context:
    |   order: 1042
    |   error:
    |     type: PaymentError
    |     message: card declined
    |     code: 5
    |     file: src/charge.rs:88
    |     gateway: stripe
    |     trace:
    |       #02: Gateway->charge(1042, "EUR") at src/gateway.rs:17
    |       #01: main() at src/main.rs:3
    |     previous:
    |       type: IoError
    |       message: connection reset
    | extra: host: api-1
    "#);
}

#[test]
fn header_without_data_is_a_single_block() {
    let text = MultilineLayout::default().format(&builder().build());
    assert_eq!(
        text,
        "[2024-08-11T22:44:57.172105+08:00] billing.ERROR: charge failed\n"
    );
    assert!(!text.contains("\n\n"));
}

#[test]
fn output_is_trimmed_to_one_trailing_newline() {
    let record = builder()
        .message("\n\ncharge failed\r\n\r\n")
        .extra("host", "api-1\n")
        .build();
    let layout = MultilineLayout::default().template("%message%");
    assert_eq!(
        layout.format(&record),
        "charge failed\n\n |  extra: host: api-1\n"
    );
}

#[test]
fn custom_error_with_fields_and_cause() {
    let err = QuotaExceeded {
        limit: 10,
        source: ErrorValue::new("RateLimit", "slow down").with_code(429),
    };
    let record = builder().context("error", Value::error(err)).build();
    let text = MultilineLayout::default()
        .template("%message%")
        .indent("| ")
        .format(&record);
    insta::assert_snapshot!(text, @r"
    charge failed

    | context:
    |   error:
    |     type: QuotaExceeded
    |     message: quota of 10 exceeded
    |     limit: 10
    |     previous:
    |       type: RateLimit
    |       message: slow down
    |       code: 429
    ");
}

#[test]
fn anyhow_chain_nests_under_previous() {
    let err = anyhow::anyhow!("root cause").context("middle").context("top");
    let record = builder().context("error", ErrorValue::from(err)).build();
    let text = MultilineLayout::default()
        .template("%message%")
        .indent("| ")
        .format(&record);
    insta::assert_snapshot!(text, @r"
    charge failed

    | context:
    |   error:
    |     type: anyhow::Error
    |     message: top
    |     previous:
    |       type: Error
    |       message: middle
    |       previous:
    |         type: Error
    |         message: root cause
    ");
}

#[test]
fn stacktraces_can_be_left_out() {
    let err = ErrorValue::new("PaymentError", "card declined")
        .with_frames(vec![Frame::new("main").with_location("src/main.rs", 3)]);
    let record = builder().context("error", err).build();
    let text = MultilineLayout::default()
        .include_stacktraces(false)
        .format(&record);
    assert!(!text.contains("trace:"), "{text}");
    assert!(text.contains(" |      message: card declined\n"), "{text}");
}

#[test]
fn data_limits_apply() {
    let nested = Value::from(vec![Value::from(vec![Value::from(vec![1, 2])])]);
    let record = builder()
        .context("nested", nested)
        .context("many", vec![1, 2, 3])
        .build();
    let text = MultilineLayout::default()
        .template("%message%")
        .indent("| ")
        .max_normalize_depth(3)
        .max_normalize_item_count(2)
        .format(&record);
    insta::assert_snapshot!(text, @r"
    charge failed

    | context:
    |   nested: - - Over 3 levels deep, aborting normalization
    |   many:
    |     0: 1
    |     1: 2
    |     ...: Over 2 items (3 total), aborting normalization
    ");
}

#[test]
fn log_records_are_bridged() {
    let kvs: &[(&str, log::kv::Value)] = &[
        ("user", log::kv::Value::from("alice")),
        ("attempt", log::kv::Value::from(2)),
    ];
    let record = Record::from_log(
        &log::Record::builder()
            .args(format_args!("signed in\nfrom a new device"))
            .level(log::Level::Warn)
            .target("auth")
            .key_values(&kvs)
            .build(),
    );
    let layout = MultilineLayout::default()
        .template("%channel%.%level_name% (%level%): %message%")
        .allow_inline_line_breaks(false);
    assert_eq!(
        layout.format(&record),
        "auth.WARNING (300): signed in from a new device\n\n |  context:\n |    user: alice\n |    attempt: 2\n"
    );
}

#[test]
fn timestamps_follow_the_configured_zone_and_pattern() {
    let at = date(2024, 8, 11)
        .at(14, 44, 57, 0)
        .to_zoned(TimeZone::UTC)
        .unwrap();
    let record = builder().context("paid_at", at).build();
    let text = MultilineLayout::default()
        .template("%datetime%")
        .date_format("%Y-%m-%d %H:%M:%S %:z")
        .timezone(TimeZone::UTC)
        .format(&record);
    assert_eq!(
        text,
        "2024-08-11 14:44:57 +00:00\n\n |  context: paid_at: 2024-08-11 14:44:57 +00:00\n"
    );
}

#[test]
fn layout_trait_matches_inherent_format() {
    let layout = MultilineLayout::default();
    let record = builder().context("order", 1042).build();
    let bytes = Layout::format(&layout, &record).unwrap();
    assert_eq!(bytes, layout.format(&record).into_bytes());
}
