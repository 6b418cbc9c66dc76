//! Process-wide logging.
//!
//! Every record is written as one JSON line to a daily-rolling
//! `lookbook.log`, carrying timestamp (ISO 8601, milliseconds, offset),
//! level, target, pid, tid, file and line, the message and any structured
//! fields. Debug builds also print a coloured human-readable line to stdout.
//!
//! `log` records from the infrastructure crates are bridged into tracing.

use log::LevelFilter;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_log::LogTracer;
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

pub const LOG_FILE_NAME: &str = "lookbook.log";

const FILE_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";
const STDOUT_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S%.3f";

static LOG_DIR: OnceLock<PathBuf> = OnceLock::new();
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber. Calling it again is a no-op.
pub fn init_logger(log_dir: PathBuf) -> anyhow::Result<()> {
    if LOG_DIR.get().is_some() {
        return Ok(());
    }

    std::fs::create_dir_all(&log_dir)?;

    let _ = LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init();

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&log_dir, LOG_FILE_NAME));
    let _ = FILE_GUARD.set(guard);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .event_format(JsonLineFormat::new())
        .with_filter(env_filter(default_directives()));

    let stdout_layer = cfg!(debug_assertions).then(|| {
        fmt::layer()
            .event_format(ConsoleFormat::new())
            .with_filter(env_filter("debug,lookbook=trace"))
    });

    let subscriber = Registry::default().with(file_layer).with(stdout_layer);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    let _ = LOG_DIR.set(log_dir.clone());

    tracing::info!(
        target: "lookbook::logging",
        log_dir = %log_dir.display(),
        version = env!("CARGO_PKG_VERSION"),
        profile = if cfg!(debug_assertions) { "debug" } else { "release" },
        "Logger initialized"
    );

    Ok(())
}

/// Directory chosen by `init_logger`, if it ran
pub fn log_dir() -> Option<PathBuf> {
    LOG_DIR.get().cloned()
}

fn default_directives() -> &'static str {
    if cfg!(debug_assertions) {
        "debug,lookbook=trace"
    } else {
        "info,lookbook=info"
    }
}

/// `RUST_LOG` wins over the built-in directives
fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// One JSON object per line
struct JsonLineFormat {
    pid: u32,
}

impl JsonLineFormat {
    fn new() -> Self {
        Self {
            pid: std::process::id(),
        }
    }
}

impl<S, N> FormatEvent<S, N> for JsonLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let timestamp = chrono::Local::now().format(FILE_TIMESTAMP).to_string();
        let record = json_record(
            EventSite::of(event.metadata()),
            fields.0,
            self.pid,
            &timestamp,
            &thread_id(),
        );

        writeln!(writer, "{}", serde_json::to_string(&record).unwrap_or_default())
    }
}

/// Where an event came from
struct EventSite<'a> {
    level: Level,
    target: &'a str,
    file: Option<&'a str>,
    line: Option<u32>,
}

impl<'a> EventSite<'a> {
    fn of(metadata: &'a Metadata<'a>) -> Self {
        Self {
            level: *metadata.level(),
            target: metadata.target(),
            file: metadata.file(),
            line: metadata.line(),
        }
    }
}

/// Assemble the JSON line for one event
fn json_record(
    site: EventSite<'_>,
    mut fields: Map<String, Value>,
    pid: u32,
    timestamp: &str,
    tid: &str,
) -> Value {
    let mut record = json!({
        "timestamp": timestamp,
        "level": site.level.to_string(),
        "target": site.target,
        "pid": pid,
        "tid": tid,
    });

    if let Some(file) = site.file {
        record["file"] = json!(file);
    }
    if let Some(line) = site.line {
        record["line"] = json!(line);
    }
    if let Some(message) = fields.remove("message") {
        record["message"] = message;
    }
    if !fields.is_empty() {
        record["fields"] = Value::Object(fields);
    }

    record
}

/// `2025-03-14 10:32:15.123 [INFO] (target) pid=1 tid=ThreadId(2) key=value: message (file:line)`
struct ConsoleFormat {
    pid: u32,
}

impl ConsoleFormat {
    fn new() -> Self {
        Self {
            pid: std::process::id(),
        }
    }
}

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let message = fields
            .0
            .remove("message")
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .unwrap_or_default();

        let extra: String = fields
            .0
            .iter()
            .map(|(key, value)| format!(" {key}={value}"))
            .collect();

        let location = match (metadata.file(), metadata.line()) {
            (Some(file), Some(line)) => format!(" ({file}:{line})"),
            _ => String::new(),
        };

        writeln!(
            writer,
            "{} [{}] ({}) pid={} tid={}{}: {}{}",
            chrono::Local::now().format(STDOUT_TIMESTAMP),
            coloured_level(metadata.level()),
            metadata.target(),
            self.pid,
            thread_id(),
            extra,
            message,
            location
        )
    }
}

fn coloured_level(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "\x1b[31mERROR\x1b[0m",
        Level::WARN => "\x1b[33mWARN\x1b[0m",
        Level::INFO => "\x1b[32mINFO\x1b[0m",
        Level::DEBUG => "\x1b[36mDEBUG\x1b[0m",
        Level::TRACE => "\x1b[35mTRACE\x1b[0m",
    }
}

fn thread_id() -> String {
    format!("{:?}", std::thread::current().id())
}

/// Event fields as JSON values
#[derive(Default)]
struct FieldCollector(Map<String, Value>);

impl tracing::field::Visit for FieldCollector {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.insert(field.name().to_string(), json!(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.insert(field.name().to_string(), json!(value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), json!(value));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0
            .insert(field.name().to_string(), json!(format!("{:?}", value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> EventSite<'static> {
        EventSite {
            level: Level::WARN,
            target: "lookbook::test",
            file: Some("src/http/resilient.rs"),
            line: Some(120),
        }
    }

    #[test]
    fn test_json_record_splits_message_and_fields() {
        let mut fields = Map::new();
        fields.insert("message".to_string(), json!("Fetch failed"));
        fields.insert("attempts".to_string(), json!(5));

        let record = json_record(
            site(),
            fields,
            42,
            "2025-03-14T10:00:00.000+00:00",
            "ThreadId(1)",
        );

        assert_eq!(record["level"], "WARN");
        assert_eq!(record["target"], "lookbook::test");
        assert_eq!(record["pid"], 42);
        assert_eq!(record["line"], 120);
        assert_eq!(record["message"], "Fetch failed");
        assert_eq!(record["fields"], json!({"attempts": 5}));
    }

    #[test]
    fn test_json_record_without_extra_fields() {
        let record = json_record(site(), Map::new(), 1, "t", "ThreadId(1)");
        assert!(record.get("fields").is_none());
        assert!(record.get("message").is_none());
    }

    #[test]
    fn test_init_logger_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();

        init_logger(dir.path().to_path_buf()).unwrap();
        init_logger(dir.path().join("other")).unwrap();

        assert_eq!(log_dir(), Some(dir.path().to_path_buf()));
        assert!(!dir.path().join("other").exists());
    }
}
