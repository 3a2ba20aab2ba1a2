//! Basic usage of the conform meta crate.
//!
//! Configuration comes from the environment (`CONFORM_API_KEY` or
//! `OPENAI_API_KEY`, optionally `CONFORM_API_BASE` and `CONFORM_BACKEND_ID`).
//! Point `CONFORM_API_BASE` at `https://api.deepseek.com/v1` and set
//! `CONFORM_BACKEND_ID=deepseek-chat` to run it against DeepSeek.
//!
//! This demonstrates:
//! 1. A schema built by hand and a plain `invoke`
//! 2. A schema derived from a Rust type and a typed `invoke_as`
//! 3. What a terminal failure looks like

use conform::prelude::*;
use conform::schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Mixed,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SentimentAnalysis {
    /// Overall sentiment of the text
    overall_sentiment: Sentiment,
    /// Confidence score between 0 and 1
    #[schemars(range(min = 0.0, max = 1.0))]
    confidence: f64,
    /// Important phrases that influenced the sentiment
    key_phrases: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    conform::telemetry::init_tracing(false, tracing::Level::INFO);

    let config = ClientConfig::from_env()?;
    let provider = OpenAiBuilder::from_config(&config).build()?;

    let mut builder = RuntimeExecutor::builder(provider)
        .layer(LoggingLayer::new())
        .default_backend(config.default_backend_id.clone());
    if config.api_base.is_some() {
        // DeepSeek and most compatible endpoints only offer JSON object mode
        builder = builder.json_strategy(Box::new(conform::JsonModeStrategy::new()));
    }
    let executor = builder
        .layer(TimeoutLayer::new(
            config.attempt_timeout.unwrap_or(Duration::from_secs(60)),
        ))
        .finish();

    // Example 1: hand-built schema
    println!("=== Example 1: Person extraction ===");
    let person = Arc::new(
        SchemaDescriptor::builder("person")
            .describe("A person mentioned in the text")
            .field(FieldSpec::string("name").length(Some(1), None))
            .field(FieldSpec::integer("age").range(0.0, 150.0))
            .field(FieldSpec::string("occupation").nullable())
            .field(
                FieldSpec::array("hobbies", ValueSpec::string())
                    .with_default(Vec::<String>::new()),
            )
            .build()?,
    );
    let request = InvocationRequest::builder(
        "John Smith is a 35-year-old engineer who enjoys hiking and playing guitar.",
        person,
    )
    .max_retries(config.retry.max_attempts())
    .base_delay_seconds(config.retry.base_delay().as_secs_f64())
    .build()?;

    let result = executor.invoke(&request).await?;
    println!(
        "{} (attempts: {}, tokens: {})",
        serde_json::to_string_pretty(&result.value)?,
        result.attempts,
        result.usage.total_tokens
    );

    // Example 2: schema derived from a type
    println!("\n=== Example 2: Typed sentiment analysis ===");
    let sentiment = Arc::new(descriptor_for::<SentimentAnalysis>()?);
    let request = InvocationRequest::builder(
        "Analyze: 'The battery life is amazing, but the screen scratches far too easily.'",
        sentiment.clone(),
    )
    .build()?;

    let analysis: SentimentAnalysis = executor.invoke_as(&request).await?;
    println!("{:#?}", analysis);

    // Example 3: a single attempt against an unknown backend fails terminally
    println!("\n=== Example 3: Terminal failure ===");
    let request = InvocationRequest::builder("Analyze: 'fine'", sentiment)
        .backend_id("no-such-model")
        .max_retries(1)
        .build()?;

    match executor.invoke(&request).await {
        Ok(result) => println!("Unexpected success: {}", result.value),
        Err(failure) => println!("{} (kind: {})", failure, failure.last_error_kind()),
    }

    Ok(())
}
