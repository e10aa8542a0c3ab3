//! Record encoders and the backends that choose between them
//!
//! A [`Backend`] is one of a closed set of engines. Each maps a writer's
//! [`Output`] to an [`Encoder`]: human-readable text for the console,
//! single-line JSON for files and remote telemetry. Every field kind is
//! translated in one exhaustive match per encoder.

use super::chain::ContextItem;
use super::field::{Field, FieldValue};
use super::output::Output;
use super::record::Record;
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};

/// Logging engine behind a [`Logger`](crate::Logger)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Tab-separated console lines with a trailing JSON object of fields
    ///
    /// Example: `2025-01-08T10:30:45.123Z  INFO   Request processed  {"id":7}`
    #[default]
    Structured,

    /// `key=value` console lines, group members dotted under the group key
    ///
    /// Example: `time=2025-01-08T10:30:45.123Z level=INFO msg="Request processed" id=7`
    Logfmt,
}

/// Timestamp settings shared by every encoder a backend builds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderOptions {
    pub text_timestamp: TimestampFormat,
    pub json_timestamp: TimestampFormat,
    pub use_colors: bool,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            text_timestamp: TimestampFormat::Iso8601,
            json_timestamp: TimestampFormat::Rfc3339,
            use_colors: true,
        }
    }
}

impl Backend {
    /// Pick the encoder for one writer
    #[must_use]
    pub fn encoder_for(&self, output: Output, options: &EncoderOptions) -> Encoder {
        if output.is_structured() {
            return Encoder::Json {
                timestamp: options.json_timestamp.clone(),
            };
        }
        match self {
            Backend::Structured => Encoder::Pretty {
                timestamp: options.text_timestamp.clone(),
                use_colors: options.use_colors,
            },
            Backend::Logfmt => Encoder::Logfmt {
                timestamp: options.text_timestamp.clone(),
            },
        }
    }
}

/// Turns a [`Record`] into one newline-terminated line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoder {
    Pretty {
        timestamp: TimestampFormat,
        use_colors: bool,
    },
    Logfmt {
        timestamp: TimestampFormat,
    },
    Json {
        timestamp: TimestampFormat,
    },
}

impl Encoder {
    pub fn encode(&self, record: &Record<'_>) -> String {
        let mut line = match self {
            Encoder::Pretty {
                timestamp,
                use_colors,
            } => Self::format_pretty(record, timestamp, *use_colors),
            Encoder::Logfmt { timestamp } => Self::format_logfmt(record, timestamp),
            Encoder::Json { timestamp } => Self::format_json(record, timestamp),
        };
        line.push('\n');
        line
    }

    /// Context and call-site fields as one JSON object, groups nested
    fn fields_object(record: &Record<'_>) -> serde_json::Map<String, serde_json::Value> {
        let mut obj = serde_json::Map::new();
        for item in record.context.items() {
            match item {
                ContextItem::Field(field) => {
                    obj.insert(field.key().to_string(), field.value().to_json_value());
                }
                ContextItem::Group { key, fields } => {
                    obj.insert(key.clone(), Self::group_object(fields));
                }
            }
        }
        for field in record.fields {
            obj.insert(field.key().to_string(), field.value().to_json_value());
        }
        obj
    }

    fn group_object(fields: &[Field]) -> serde_json::Value {
        let group = fields
            .iter()
            .map(|f| (f.key().to_string(), f.value().to_json_value()))
            .collect();
        serde_json::Value::Object(group)
    }

    fn format_json(record: &Record<'_>, timestamp: &TimestampFormat) -> String {
        let mut json_obj = serde_json::Map::new();
        json_obj.insert("time".to_string(), timestamp.to_json_value(&record.timestamp));
        json_obj.insert(
            "level".to_string(),
            serde_json::Value::String(record.level.to_str().to_string()),
        );
        json_obj.insert(
            "msg".to_string(),
            serde_json::Value::String(record.message.clone()),
        );
        json_obj.extend(Self::fields_object(record));

        serde_json::to_string(&serde_json::Value::Object(json_obj)).unwrap_or_default()
    }

    fn format_pretty(record: &Record<'_>, timestamp: &TimestampFormat, use_colors: bool) -> String {
        let level_str = Self::level_label(record, use_colors);
        let mut line = format!(
            "{}\t{}\t{}",
            timestamp.format(&record.timestamp),
            level_str,
            record.message
        );

        let fields = Self::fields_object(record);
        if !fields.is_empty() {
            line.push('\t');
            line.push_str(
                &serde_json::to_string(&serde_json::Value::Object(fields)).unwrap_or_default(),
            );
        }
        line
    }

    #[cfg(feature = "console")]
    fn level_label(record: &Record<'_>, use_colors: bool) -> String {
        use colored::Colorize;
        let label = format!("{:5}", record.level.to_str());
        if use_colors {
            label.color(record.level.color_code()).to_string()
        } else {
            label
        }
    }

    #[cfg(not(feature = "console"))]
    fn level_label(record: &Record<'_>, _use_colors: bool) -> String {
        format!("{:5}", record.level.to_str())
    }

    fn format_logfmt(record: &Record<'_>, timestamp: &TimestampFormat) -> String {
        let mut parts = vec![
            format!(
                "time={}",
                escape_logfmt_value(&timestamp.format(&record.timestamp))
            ),
            format!("level={}", record.level.to_str()),
            format!("msg={}", escape_logfmt_value(&record.message)),
        ];

        for item in record.context.items() {
            match item {
                ContextItem::Field(field) => parts.push(logfmt_pair("", field)),
                ContextItem::Group { key, fields } => {
                    let prefix = format!("{}.", escape_logfmt_key(key));
                    parts.extend(fields.iter().map(|f| logfmt_pair(&prefix, f)));
                }
            }
        }
        parts.extend(record.fields.iter().map(|f| logfmt_pair("", f)));

        parts.join(" ")
    }
}

fn logfmt_pair(prefix: &str, field: &Field) -> String {
    let value = match field.value() {
        FieldValue::String(s) => escape_logfmt_value(s),
        FieldValue::Num(i) => i.to_string(),
        FieldValue::Float(f) => f.to_string(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Any(serde_json::Value::String(s)) => escape_logfmt_value(s),
        FieldValue::Any(v) => escape_logfmt_value(&v.to_string()),
        FieldValue::Error(e) => escape_logfmt_value(&e.to_string()),
    };
    format!("{}{}={}", prefix, escape_logfmt_key(field.key()), value)
}

/// Escape a logfmt key (remove spaces and special chars)
fn escape_logfmt_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || *c == '.')
        .collect()
}

/// Escape a logfmt value (quote if it contains spaces, quotes, `=` or is empty)
fn escape_logfmt_value(value: &str) -> String {
    if value.is_empty() || value.contains(' ') || value.contains('"') || value.contains('=') {
        quote_logfmt_value(value)
    } else {
        value.to_string()
    }
}

fn quote_logfmt_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chain::FieldChain;
    use crate::core::log_level::Level;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn fixed() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
    }

    fn json() -> Encoder {
        Backend::Structured.encoder_for(Output::File, &EncoderOptions::default())
    }

    #[test]
    fn test_backend_picks_encoder_by_output() {
        let opts = EncoderOptions::default();
        for backend in [Backend::Structured, Backend::Logfmt] {
            assert!(matches!(backend.encoder_for(Output::File, &opts), Encoder::Json { .. }));
            assert!(matches!(
                backend.encoder_for(Output::RemoteTelemetry, &opts),
                Encoder::Json { .. }
            ));
        }
        assert!(matches!(
            Backend::Structured.encoder_for(Output::Console, &opts),
            Encoder::Pretty { .. }
        ));
        assert!(matches!(
            Backend::Logfmt.encoder_for(Output::Console, &opts),
            Encoder::Logfmt { .. }
        ));
    }

    #[test]
    fn test_json_record_shape() {
        let chain = FieldChain::new();
        let fields = [Field::num("x", 5)];
        let record = Record::new(Level::Warn, "hello", &chain, &fields).at(fixed());

        let line = json().encode(&record);
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);

        let parsed: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(
            parsed,
            json!({"time": "2025-01-08T10:30:45Z", "level": "WARN", "msg": "hello", "x": 5})
        );
        assert!(line.starts_with("{\"time\""));
    }

    #[test]
    fn test_json_every_field_kind() {
        let chain = FieldChain::new();
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let fields = [
            Field::string("s", "v"),
            Field::num("n", -1),
            Field::float("f", 0.5),
            Field::bool("b", true),
            Field::any("a", &vec!["x", "y"]),
            Field::error(io),
        ];
        let record = Record::new(Level::Info, "kinds", &chain, &fields);
        let parsed: serde_json::Value = serde_json::from_str(&json().encode(&record)).unwrap();

        assert_eq!(parsed["s"], "v");
        assert_eq!(parsed["n"], -1);
        assert_eq!(parsed["f"], 0.5);
        assert_eq!(parsed["b"], true);
        assert_eq!(parsed["a"], json!(["x", "y"]));
        assert_eq!(parsed["error"], "boom");
    }

    #[test]
    fn test_json_group_is_sealed() {
        let chain = FieldChain::new()
            .with_group("ns", &[Field::num("a", 1)])
            .with_fields(&[Field::num("b", 2)]);
        let record = Record::new(Level::Info, "grouped", &chain, &[]);
        let parsed: serde_json::Value = serde_json::from_str(&json().encode(&record)).unwrap();

        assert_eq!(parsed["ns"], json!({"a": 1}));
        assert_eq!(parsed["b"], 2);
        assert!(parsed["ns"].get("b").is_none());
    }

    #[test]
    fn test_pretty_without_colors() {
        let opts = EncoderOptions {
            use_colors: false,
            ..EncoderOptions::default()
        };
        let chain = FieldChain::new().with_fields(&[Field::string("req", "r1")]);
        let record = Record::new(Level::Info, "served", &chain, &[]).at(fixed());
        let line = Backend::Structured
            .encoder_for(Output::Console, &opts)
            .encode(&record);

        assert_eq!(
            line,
            "2025-01-08T10:30:45.000Z\tINFO \tserved\t{\"req\":\"r1\"}\n"
        );
    }

    #[test]
    fn test_pretty_omits_empty_fields() {
        let opts = EncoderOptions {
            use_colors: false,
            ..EncoderOptions::default()
        };
        let chain = FieldChain::new();
        let record = Record::new(Level::Error, "bare", &chain, &[]).at(fixed());
        let line = Backend::Structured
            .encoder_for(Output::Console, &opts)
            .encode(&record);
        assert_eq!(line, "2025-01-08T10:30:45.000Z\tERROR\tbare\n");
    }

    #[test]
    fn test_logfmt_dotted_groups() {
        let chain = FieldChain::new()
            .with_group("db", &[Field::string("table", "users")])
            .with_fields(&[Field::num("rows", 3)]);
        let fields = [Field::string("query", "SELECT * FROM users WHERE id=1")];
        let record = Record::new(Level::Debug, "Query executed", &chain, &fields).at(fixed());
        let line = Backend::Logfmt
            .encoder_for(Output::Console, &EncoderOptions::default())
            .encode(&record);

        assert_eq!(
            line,
            "time=2025-01-08T10:30:45.000Z level=DEBUG msg=\"Query executed\" \
             db.table=users rows=3 query=\"SELECT * FROM users WHERE id=1\"\n"
        );
    }

    #[test]
    fn test_logfmt_quotes_empty_and_escapes() {
        assert_eq!(escape_logfmt_value(""), "\"\"");
        assert_eq!(escape_logfmt_value("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(escape_logfmt_key("bad key!"), "badkey");
    }
}
