//! Span utilities for publish attempts.

use std::time::Instant;

use tracing::{info_span, Span};

use crate::workspace::PublishState;

/// Extension trait for recording outcomes into spans.
pub trait SpanExt {
    /// Record the result of an operation into the span.
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;

    /// Record the current lifecycle state.
    fn record_state(&self, state: PublishState);

    /// Record elapsed milliseconds since `started`.
    fn record_latency(&self, started: Instant);
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }

    fn record_state(&self, state: PublishState) {
        self.record("state", state.as_str());
    }

    fn record_latency(&self, started: Instant) {
        self.record("latency_ms", started.elapsed().as_millis() as u64);
    }
}

/// Factory for the span wrapping one publish attempt.
pub struct PublishSpan;

impl PublishSpan {
    /// Fields:
    /// - `space_id`: destination identifier
    /// - `model_name`: display name of the model
    /// - `state`: lifecycle state, updated as the attempt progresses
    /// - `status`, `error.message`: filled by `SpanExt::record_result`
    /// - `latency_ms`: filled on completion
    pub fn new(space_id: &str, model_name: &str) -> Span {
        info_span!(
            "publish_attempt",
            space_id = %space_id,
            model_name = %model_name,
            state = tracing::field::Empty,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        )
    }
}
