// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tracing` layer that renders events through a [`JsonSink`].
//!
//! `ERROR` events become `ERROR` entries, everything else becomes `INFO`.
//! An event carrying `fatal = true` is written as `FATAL`, after which the
//! process exits with status 1. The event's
//! `message` field becomes the entry message and every other field lands in
//! `properties` as a string, together with the fields of every enclosing
//! span (outermost first, event fields win on collision).

use std::collections::BTreeMap;
use std::fmt;

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::sink::{JsonSink, Level};

pub struct JsonLayer {
    sink: JsonSink,
    exit_on_fatal: bool,
}

impl JsonLayer {
    pub fn new(sink: JsonSink) -> Self {
        Self {
            sink,
            exit_on_fatal: true,
        }
    }

    /// Whether a FATAL entry ends the process once it is written.
    pub fn exit_on_fatal(mut self, exit: bool) -> Self {
        self.exit_on_fatal = exit;
        self
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fatal: bool,
    properties: BTreeMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.properties
                .insert(field.name().to_string(), format!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.properties
                .insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "fatal" {
            self.fatal = value;
        } else {
            self.properties
                .insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.properties
            .insert(field.name().to_string(), value.to_string());
    }
}

/// Fields recorded on a span, stored in its extensions.
struct SpanFields(BTreeMap<String, String>);

impl<S> Layer<S> for JsonLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);
        span.extensions_mut()
            .insert(SpanFields(visitor.properties));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = FieldVisitor::default();
        values.record(&mut visitor);
        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<SpanFields>() {
            Some(fields) => fields.0.extend(visitor.properties),
            None => extensions.insert(SpanFields(visitor.properties)),
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut properties = BTreeMap::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(fields) = span.extensions().get::<SpanFields>() {
                    properties.extend(fields.0.clone());
                }
            }
        }
        properties.extend(visitor.properties);

        let level = if visitor.fatal {
            Level::Fatal
        } else if *event.metadata().level() == tracing::Level::ERROR {
            Level::Error
        } else {
            Level::Info
        };

        // Nowhere left to report a failed log write.
        let _ = self.sink.print(level, &visitor.message, &properties);

        if level == Level::Fatal && self.exit_on_fatal {
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::Capture;
    use tracing_subscriber::layer::SubscriberExt;

    fn capture(min: Level, f: impl FnOnce()) -> Vec<serde_json::Value> {
        let cap = Capture::default();
        let subscriber = tracing_subscriber::registry()
            .with(JsonLayer::new(JsonSink::new(cap.clone(), min)).exit_on_fatal(false));
        tracing::subscriber::with_default(subscriber, f);
        cap.lines()
    }

    #[test]
    fn info_event_with_fields() {
        let lines = capture(Level::Info, || {
            tracing::info!(addr = "0.0.0.0:4000", env = "development", "starting server");
        });
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], "INFO");
        assert_eq!(lines[0]["message"], "starting server");
        assert_eq!(lines[0]["properties"]["addr"], "0.0.0.0:4000");
        assert_eq!(lines[0]["properties"]["env"], "development");
    }

    #[test]
    fn warn_maps_to_info_and_error_to_error() {
        let lines = capture(Level::Info, || {
            tracing::warn!("heads up");
            tracing::error!(error = %"db down", "request failed");
        });
        assert_eq!(lines[0]["level"], "INFO");
        assert_eq!(lines[1]["level"], "ERROR");
        assert_eq!(lines[1]["properties"]["error"], "db down");
        assert!(lines[1]["trace"].is_string());
    }

    #[test]
    fn fatal_flag() {
        let lines = capture(Level::Info, || {
            tracing::error!(fatal = true, "cannot open database");
        });
        assert_eq!(lines[0]["level"], "FATAL");
        assert!(lines[0].get("properties").is_none());
    }

    #[test]
    fn fatal_event_exits_the_process() {
        const CHILD: &str = "MARQUEE_LOG_FATAL_CHILD";
        if std::env::var_os(CHILD).is_some() {
            let subscriber = tracing_subscriber::registry()
                .with(JsonLayer::new(JsonSink::new(std::io::sink(), Level::Info)));
            tracing::subscriber::with_default(subscriber, || {
                tracing::error!(fatal = true, "cannot open database");
            });
            return;
        }

        let status = std::process::Command::new(std::env::current_exe().unwrap())
            .args(["--exact", "layer::tests::fatal_event_exits_the_process", "--quiet"])
            .env(CHILD, "1")
            .status()
            .unwrap();
        assert_eq!(status.code(), Some(1));
    }

    #[test]
    fn minimum_level_filters_events() {
        let lines = capture(Level::Error, || {
            tracing::info!("dropped");
            tracing::error!("kept");
        });
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["message"], "kept");
    }

    #[test]
    fn span_fields_are_merged() {
        let lines = capture(Level::Info, || {
            let span = tracing::info_span!("request", method = "GET", uri = "/v1/movies");
            let _guard = span.enter();
            tracing::error!(uri = "/v1/movies/7", "failed");
        });
        assert_eq!(lines[0]["properties"]["method"], "GET");
        assert_eq!(lines[0]["properties"]["uri"], "/v1/movies/7");
    }

    #[test]
    fn numeric_fields_are_stringified() {
        let lines = capture(Level::Info, || {
            tracing::info!(status = 404_u64, latency_ms = 12_i64, "request");
        });
        assert_eq!(lines[0]["properties"]["status"], "404");
        assert_eq!(lines[0]["properties"]["latency_ms"], "12");
    }
}
