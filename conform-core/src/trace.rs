//! Invocation tracing.
//!
//! Every invocation is wrapped in an [`InvocationSpan`]. The span collects
//! attempt records and emits exactly one [`InvocationTrace`] to a
//! [`TraceSink`]: on success, on terminal failure, or from `Drop` when the
//! invocation ends any other way (panic, cancelled future).
//!
//! Emission is fire-and-forget. A sink that errors or panics is logged and
//! otherwise ignored.

use crate::error::{ConformError, ErrorKind, TerminalFailure};
use crate::retry::AttemptObserver;
use crate::types::AttemptRecord;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tokio::time::Instant;
use uuid::Uuid;

/// Final state of an invocation as recorded in its trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TraceOutcome {
    Succeeded,
    Exhausted { last_error: ErrorKind },
    /// The invocation ended without reaching either terminal state
    Fault,
}

impl TraceOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Exhausted { .. } => "exhausted",
            Self::Fault => "fault",
        }
    }
}

/// One observability event per invocation.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationTrace {
    pub invocation_id: Uuid,
    pub backend_id: String,
    pub started_at: SystemTime,
    pub elapsed: Duration,
    pub attempts: Vec<AttemptRecord>,
    pub outcome: TraceOutcome,
    /// Shape of the validated value, never its content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Destination for invocation traces.
///
/// Sinks are shared by all concurrent invocations of an executor and must not
/// block: `record` is called inline on the invocation path.
pub trait TraceSink: Send + Sync + Debug + 'static {
    fn record(&self, trace: &InvocationTrace) -> Result<(), ConformError>;
}

/// Emits each trace as a structured `tracing` event.
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn record(&self, trace: &InvocationTrace) -> Result<(), ConformError> {
        let last_error = match trace.outcome {
            TraceOutcome::Exhausted { last_error } => last_error.as_str(),
            _ => "",
        };
        tracing::info!(
            event = "invocation.finished",
            invocation_id = %trace.invocation_id,
            backend_id = %trace.backend_id,
            outcome = trace.outcome.as_str(),
            attempts = trace.attempts.len(),
            elapsed_ms = trace.elapsed.as_millis() as u64,
            last_error = last_error,
            summary = trace.summary.as_deref().unwrap_or(""),
        );
        Ok(())
    }
}

/// Discards every trace.
#[derive(Debug, Clone, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {
    fn record(&self, _trace: &InvocationTrace) -> Result<(), ConformError> {
        Ok(())
    }
}

/// Hands traces to an exporter task over a bounded channel.
///
/// When the channel is full the trace is dropped rather than waiting.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<InvocationTrace>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<InvocationTrace>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl TraceSink for ChannelSink {
    fn record(&self, trace: &InvocationTrace) -> Result<(), ConformError> {
        self.tx.try_send(trace.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ConformError::trace("trace channel is full"),
            mpsc::error::TrySendError::Closed(_) => ConformError::trace("trace receiver dropped"),
        })
    }
}

/// Scoped guard around one invocation.
#[derive(Debug)]
pub struct InvocationSpan {
    sink: Arc<dyn TraceSink>,
    invocation_id: Uuid,
    backend_id: String,
    started_at: SystemTime,
    started: Instant,
    attempts: Vec<AttemptRecord>,
    span: tracing::Span,
    emitted: bool,
}

impl InvocationSpan {
    pub fn open(sink: Arc<dyn TraceSink>, backend_id: impl Into<String>) -> Self {
        let invocation_id = Uuid::new_v4();
        let backend_id = backend_id.into();
        let span = tracing::info_span!(
            "conform.invoke",
            invocation_id = %invocation_id,
            backend_id = %backend_id
        );
        Self {
            sink,
            invocation_id,
            backend_id,
            started_at: SystemTime::now(),
            started: Instant::now(),
            attempts: Vec::new(),
            span,
            emitted: false,
        }
    }

    /// The `tracing` span the invocation runs in
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    pub fn succeed(mut self, value: &Value) {
        self.emit(TraceOutcome::Succeeded, Some(redacted_summary(value)), None);
    }

    pub fn fail(mut self, failure: &TerminalFailure) {
        self.emit(
            TraceOutcome::Exhausted {
                last_error: failure.last_error_kind(),
            },
            None,
            Some(failure.to_string()),
        );
    }

    fn emit(&mut self, outcome: TraceOutcome, summary: Option<String>, error: Option<String>) {
        if self.emitted {
            return;
        }
        self.emitted = true;

        let trace = InvocationTrace {
            invocation_id: self.invocation_id,
            backend_id: self.backend_id.clone(),
            started_at: self.started_at,
            elapsed: self.started.elapsed(),
            attempts: std::mem::take(&mut self.attempts),
            outcome,
            summary,
            error,
        };

        let sink = &self.sink;
        match catch_unwind(AssertUnwindSafe(|| sink.record(&trace))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(
                    invocation_id = %trace.invocation_id,
                    "Failed to record trace: {}",
                    e
                );
            }
            Err(_) => {
                tracing::warn!(invocation_id = %trace.invocation_id, "Trace sink panicked");
            }
        }
    }
}

impl AttemptObserver for InvocationSpan {
    fn on_attempt(&mut self, record: AttemptRecord) {
        self.attempts.push(record);
    }
}

impl Drop for InvocationSpan {
    fn drop(&mut self) {
        if !self.emitted {
            self.emit(TraceOutcome::Fault, None, None);
        }
    }
}

/// Describe the shape of a value without its content.
///
/// `{"label": "positive", "tags": ["a", "b"]}` becomes `label:string, tags:array[2]`.
pub fn redacted_summary(value: &Value) -> String {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, v)| format!("{key}:{}", shape(v)))
            .collect::<Vec<_>>()
            .join(", "),
        other => shape(other),
    }
}

fn shape(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(_) => "boolean".into(),
        Value::Number(_) => "number".into(),
        Value::String(_) => "string".into(),
        Value::Array(items) => format!("array[{}]", items.len()),
        Value::Object(map) => format!("object{{{}}}", map.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::types::AttemptOutcome;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct MemorySink {
        traces: Mutex<Vec<InvocationTrace>>,
    }

    impl TraceSink for MemorySink {
        fn record(&self, trace: &InvocationTrace) -> Result<(), ConformError> {
            self.traces.lock().unwrap().push(trace.clone());
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FailingSink;

    impl TraceSink for FailingSink {
        fn record(&self, _trace: &InvocationTrace) -> Result<(), ConformError> {
            Err(ConformError::trace("collector unreachable"))
        }
    }

    #[derive(Debug)]
    struct PanickingSink;

    impl TraceSink for PanickingSink {
        fn record(&self, _trace: &InvocationTrace) -> Result<(), ConformError> {
            panic!("exporter bug")
        }
    }

    fn record(index: u32) -> AttemptRecord {
        AttemptRecord {
            index,
            outcome: AttemptOutcome::Succeeded,
            error: None,
            elapsed: Duration::ZERO,
            backoff: None,
        }
    }

    #[test]
    fn test_success_emits_once_with_summary() {
        let sink = Arc::new(MemorySink::default());
        let mut span = InvocationSpan::open(sink.clone(), "model-a");
        span.on_attempt(record(0));
        span.succeed(&json!({"label": "positive", "tags": ["x", "y"]}));

        let traces = sink.traces.lock().unwrap();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].outcome, TraceOutcome::Succeeded);
        assert_eq!(traces[0].attempts.len(), 1);
        assert_eq!(traces[0].backend_id, "model-a");
        let summary = traces[0].summary.as_deref().unwrap();
        assert_eq!(summary, "label:string, tags:array[2]");
        assert!(!summary.contains("positive"));
    }

    #[test]
    fn test_failure_records_terminal_kind() {
        let sink = Arc::new(MemorySink::default());
        let span = InvocationSpan::open(sink.clone(), "model-a");
        span.fail(&TerminalFailure {
            attempts: 3,
            last_error: BackendError::transport("timeout").into(),
        });

        let traces = sink.traces.lock().unwrap();
        assert_eq!(
            traces[0].outcome,
            TraceOutcome::Exhausted {
                last_error: ErrorKind::Transport
            }
        );
        assert!(traces[0].error.as_deref().unwrap().contains("timeout"));
    }

    #[test]
    fn test_drop_without_close_emits_fault() {
        let sink = Arc::new(MemorySink::default());
        {
            let mut span = InvocationSpan::open(sink.clone(), "model-a");
            span.on_attempt(record(0));
        }
        let traces = sink.traces.lock().unwrap();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].outcome, TraceOutcome::Fault);
        assert_eq!(traces[0].attempts.len(), 1);
    }

    #[test]
    fn test_sink_errors_and_panics_are_swallowed() {
        InvocationSpan::open(Arc::new(FailingSink), "m").succeed(&json!({}));
        InvocationSpan::open(Arc::new(PanickingSink), "m").succeed(&json!({}));
        drop(InvocationSpan::open(Arc::new(PanickingSink), "m"));
    }

    #[tokio::test]
    async fn test_channel_sink_drops_when_full() {
        let (sink, mut rx) = ChannelSink::new(1);
        let sink = Arc::new(sink);
        InvocationSpan::open(sink.clone(), "m").succeed(&json!({"a": 1}));
        InvocationSpan::open(sink.clone(), "m").succeed(&json!({"a": 2}));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.summary.as_deref(), Some("a:number"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_trace_serializes() {
        let sink = Arc::new(MemorySink::default());
        InvocationSpan::open(sink.clone(), "m").succeed(&json!({"ok": true}));
        let traces = sink.traces.lock().unwrap();
        let json = serde_json::to_value(&traces[0]).unwrap();
        assert_eq!(json["outcome"]["status"], "succeeded");
        assert_eq!(json["summary"], "ok:boolean");
    }
}
