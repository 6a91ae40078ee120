//! Tracing setup and an in-memory capture for asserting on emitted events.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

/// One captured tracing event.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

impl LogEntry {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Collects every event emitted while [`TestLogSubscriber::capture`] runs.
#[derive(Debug, Clone, Default)]
pub struct TestLogSubscriber {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries_mut(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs `f` with this capture as the thread's default subscriber.
    pub fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
        let dispatch = Registry::default().with(CaptureLayer {
            sink: self.clone(),
        });
        tracing::subscriber::with_default(dispatch, f)
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries_mut().clone()
    }

    /// Entries whose message equals `message`, in emission order.
    pub fn with_message(&self, message: &str) -> Vec<LogEntry> {
        self.entries_mut()
            .iter()
            .filter(|e| e.message == message)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.entries_mut().clear();
    }
}

struct CaptureLayer {
    sink: TestLogSubscriber,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = FieldCollector::default();
        event.record(&mut fields);
        let metadata = event.metadata();
        self.sink.entries_mut().push(LogEntry {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: fields.message,
            fields: fields.values,
        });
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    values: BTreeMap<String, String>,
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.store(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.store(field, format!("{value:?}"));
    }
}

impl FieldCollector {
    fn store(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.values.insert(field.name().to_string(), value);
        }
    }
}

/// Installs the global fmt subscriber on stderr.
///
/// `RUST_LOG` overrides the default filter. Fails if a global subscriber was
/// already installed.
pub fn init_logging() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cardroom_sync=debug"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}
