#![allow(dead_code)]

use async_trait::async_trait;
use conform::{
    BackendError, BackendResponse, ChatCompletionRequest, ConformError, FieldSpec, FinishReason,
    InvocationTrace, Provider, ProviderInfo, SchemaDescriptor, TraceSink, Usage,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// One scripted backend reply.
#[derive(Debug, Clone)]
pub struct Step {
    pub delay: Duration,
    pub reply: Result<String, BackendError>,
}

impl Step {
    pub fn text(text: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            reply: Ok(text.to_string()),
        }
    }

    pub fn error(err: BackendError) -> Self {
        Self {
            delay: Duration::ZERO,
            reply: Err(err),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Provider that replays a script; the last step repeats once the script runs out.
#[derive(Debug)]
pub struct ScriptedProvider {
    id: String,
    script: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    calls: Mutex<Vec<(Instant, ChatCompletionRequest)>>,
}

impl ScriptedProvider {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Self::with_id("scripted", steps)
    }

    pub fn with_id(id: &str, steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            script: Mutex::new(steps.into_iter().collect()),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn always(step: Step) -> Arc<Self> {
        Self::new([step])
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Offsets of each call from `origin`
    pub fn call_offsets(&self, origin: Instant) -> Vec<Duration> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(at, _)| at.duration_since(origin))
            .collect()
    }

    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, req)| req.clone())
            .collect()
    }

    fn next_step(&self) -> Step {
        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(step) => {
                *last = Some(step.clone());
                step
            }
            None => last
                .clone()
                .unwrap_or_else(|| Step::error(BackendError::transport("empty script"))),
        }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn info(&self) -> Arc<ProviderInfo> {
        Arc::new(ProviderInfo {
            id: self.id.clone(),
            name: "Scripted".to_string(),
        })
    }

    async fn chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<BackendResponse, BackendError> {
        let model = req.model.clone();
        self.calls.lock().unwrap().push((Instant::now(), req));
        let step = self.next_step();
        tokio::time::sleep(step.delay).await;

        let text = step.reply?;
        Ok(BackendResponse {
            id: format!("resp-{}", self.call_count()),
            model,
            text,
            finish_reason: FinishReason::Stop,
            usage: Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
            latency: step.delay,
        })
    }
}

/// Sink that keeps every trace in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    traces: Mutex<Vec<InvocationTrace>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn traces(&self) -> Vec<InvocationTrace> {
        self.traces.lock().unwrap().clone()
    }
}

impl TraceSink for RecordingSink {
    fn record(&self, trace: &InvocationTrace) -> Result<(), ConformError> {
        self.traces.lock().unwrap().push(trace.clone());
        Ok(())
    }
}

/// Sink whose every write fails.
#[derive(Debug)]
pub struct BrokenSink;

impl TraceSink for BrokenSink {
    fn record(&self, _trace: &InvocationTrace) -> Result<(), ConformError> {
        Err(ConformError::trace("collector unreachable"))
    }
}

/// `{sentiment, confidence in [0, 1], tags?}`
pub fn review_schema() -> Arc<SchemaDescriptor> {
    Arc::new(
        SchemaDescriptor::builder("review")
            .field(FieldSpec::string("sentiment").one_of(["positive", "negative", "neutral"]))
            .field(FieldSpec::number("confidence").range(0.0, 1.0))
            .field(
                FieldSpec::array("tags", conform::ValueSpec::string())
                    .with_default(serde_json::json!([])),
            )
            .build()
            .unwrap(),
    )
}

pub const VALID_REVIEW: &str = r#"{"sentiment":"positive","confidence":0.8}"#;
