// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Leveled, structured log output.
//!
//! Events are regular `tracing` events. A `tracing-subscriber` fmt
//! subscriber filters them by level and renders each one on its own line,
//! either as `key=value` text or as a JSON object:
//!
//! ```text
//! time=2024-05-01T10:00:00.000+00:00 level=DEBUG msg="read value from directory" name=TOKEN value=abc
//! {"time":"2024-05-01T10:00:00.000+00:00","level":"DEBUG","msg":"read value from directory","name":"TOKEN","value":"abc"}
//! ```

use std::fmt::{self, Write as _};

use chrono::{Local, SecondsFormat};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;

use crate::config::{Config, LogFormat, LogLevel};

#[cfg(test)]
#[path = "./logging_test.rs"]
pub(crate) mod logging_test;

/// Build a subscriber that writes records at or above `level` to `writer`.
pub fn subscriber<W>(format: LogFormat, level: LogLevel, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_max_level(level.as_tracing())
        .with_writer(writer)
        .event_format(EventFormat::new(format))
        .finish()
}

/// Install the process-wide subscriber, writing to standard output.
pub fn init(config: &Config) {
    let subscriber = subscriber(config.log_format, config.log_level, std::io::stdout);
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("a global log subscriber was already installed");
    }
}

/// Renders a single event in one of the supported formats.
#[derive(Debug, Clone, Copy)]
pub struct EventFormat {
    format: LogFormat,
}

impl EventFormat {
    pub fn new(format: LogFormat) -> Self {
        Self { format }
    }
}

impl<S, N> FormatEvent<S, N> for EventFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut record = Record::new(*event.metadata().level());
        event.record(&mut record);
        match self.format {
            LogFormat::Text => record.write_text(&mut writer),
            LogFormat::Json => record.write_json(&mut writer),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    Str(String),
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
}

impl FieldValue {
    fn write_text(&self, writer: &mut impl fmt::Write) -> fmt::Result {
        match self {
            Self::Str(value) => write_text_string(writer, value),
            Self::Bool(value) => write!(writer, "{value}"),
            Self::I64(value) => write!(writer, "{value}"),
            Self::U64(value) => write!(writer, "{value}"),
            Self::F64(value) => write!(writer, "{value}"),
        }
    }

    fn write_json(&self, writer: &mut impl fmt::Write) -> fmt::Result {
        match self {
            Self::Str(value) => write_json_string(writer, value),
            Self::Bool(value) => write!(writer, "{value}"),
            Self::I64(value) => write!(writer, "{value}"),
            Self::U64(value) => write!(writer, "{value}"),
            Self::F64(value) => match serde_json::Number::from_f64(*value) {
                Some(number) => write!(writer, "{number}"),
                None => writer.write_str("null"),
            },
        }
    }
}

/// The message and fields collected from one event.
#[derive(Debug)]
struct Record {
    time: String,
    level: Level,
    message: String,
    fields: Vec<(&'static str, FieldValue)>,
}

impl Record {
    fn new(level: Level) -> Self {
        Self {
            time: Local::now().to_rfc3339_opts(SecondsFormat::Millis, false),
            level,
            message: String::new(),
            fields: Vec::new(),
        }
    }

    fn push(&mut self, field: &Field, value: FieldValue) {
        match (field.name(), value) {
            ("message", FieldValue::Str(message)) => self.message = message,
            (name, value) => self.fields.push((name, value)),
        }
    }

    fn write_text(&self, writer: &mut impl fmt::Write) -> fmt::Result {
        write!(writer, "time={} level={} msg=", self.time, self.level)?;
        write_text_string(writer, &self.message)?;
        for (name, value) in &self.fields {
            write!(writer, " {name}=")?;
            value.write_text(writer)?;
        }
        writer.write_char('\n')
    }

    fn write_json(&self, writer: &mut impl fmt::Write) -> fmt::Result {
        writer.write_str("{\"time\":")?;
        write_json_string(writer, &self.time)?;
        write!(writer, ",\"level\":\"{}\",\"msg\":", self.level)?;
        write_json_string(writer, &self.message)?;
        for (name, value) in &self.fields {
            writer.write_char(',')?;
            write_json_string(writer, name)?;
            writer.write_char(':')?;
            value.write_json(writer)?;
        }
        writer.write_str("}\n")
    }
}

impl Visit for Record {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, FieldValue::Str(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, FieldValue::Str(value.to_owned()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, FieldValue::Bool(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, FieldValue::I64(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, FieldValue::U64(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, FieldValue::F64(value));
    }
}

/// Empty values and values with whitespace, quotes, `=` or control
/// characters are quoted and escaped.
fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '"' || c == '=')
}

fn write_text_string(writer: &mut impl fmt::Write, value: &str) -> fmt::Result {
    if needs_quoting(value) {
        write!(writer, "{value:?}")
    } else {
        writer.write_str(value)
    }
}

fn write_json_string(writer: &mut impl fmt::Write, value: &str) -> fmt::Result {
    let encoded = serde_json::to_string(value).map_err(|_| fmt::Error)?;
    writer.write_str(&encoded)
}
