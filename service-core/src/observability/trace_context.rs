//! Trace propagation for outgoing REST calls.
//!
//! Each request gets a W3C `traceparent` built from the current span (when an
//! OpenTelemetry context is active) and an `x-request-id` for log correlation.

use opentelemetry::trace::TraceContextExt;
use reqwest::Method;
use reqwest::header::HeaderMap;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use uuid::Uuid;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Add `traceparent` (if the current span is sampled into OpenTelemetry) and
/// the given request id to `headers`.
pub fn inject_trace_headers(headers: &mut HeaderMap, request_id: &str) {
    let context = Span::current().context();
    let span = context.span();
    let span_context = span.span_context();

    if span_context.is_valid() {
        let traceparent = format!(
            "00-{}-{}-{:02x}",
            span_context.trace_id(),
            span_context.span_id(),
            span_context.trace_flags().to_u8()
        );
        if let Ok(value) = traceparent.parse() {
            headers.insert(TRACEPARENT_HEADER, value);
        }
    }

    if let Ok(value) = request_id.parse() {
        headers.insert(REQUEST_ID_HEADER, value);
    }
}

/// A request builder that stamps trace headers right before sending.
pub struct TracedRequest {
    request: reqwest::RequestBuilder,
    request_id: String,
}

impl TracedRequest {
    pub fn new(request: reqwest::RequestBuilder) -> Self {
        Self {
            request,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn json<T: serde::Serialize + ?Sized>(self, json: &T) -> Self {
        Self {
            request: self.request.json(json),
            ..self
        }
    }

    pub fn bearer_auth<T: std::fmt::Display>(self, token: T) -> Self {
        Self {
            request: self.request.bearer_auth(token),
            ..self
        }
    }

    pub fn timeout(self, timeout: std::time::Duration) -> Self {
        Self {
            request: self.request.timeout(timeout),
            ..self
        }
    }

    pub async fn send(self) -> Result<reqwest::Response, reqwest::Error> {
        let mut headers = HeaderMap::new();
        inject_trace_headers(&mut headers, &self.request_id);

        self.request.headers(headers).send().await
    }
}

pub trait TracedClientExt {
    fn traced(&self, method: Method, url: &str) -> TracedRequest;
}

impl TracedClientExt for reqwest::Client {
    fn traced(&self, method: Method, url: &str) -> TracedRequest {
        TracedRequest::new(self.request(method, url))
    }
}
