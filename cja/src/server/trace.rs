use tower_http::trace::{MakeSpan, OnResponse};
use tracing::Level;

/// Names each request span after the route it matched, so `/api/recipes/{id}`
/// groups together no matter which recipe was asked for.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tracer;

impl<Body> MakeSpan<Body> for Tracer {
    fn make_span(&mut self, request: &http::Request<Body>) -> tracing::Span {
        let route = matched_route(request);

        tracing::span!(
            Level::INFO,
            "server.request",
            http.request.method = %request.method(),
            http.route = route,
            url.path = %request.uri().path(),
            url.query = request.uri().query(),
            user_agent.original = header(request.headers(), "user-agent"),
            http.response.status_code = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        )
    }
}

impl<Body> OnResponse<Body> for Tracer {
    fn on_response(
        self,
        response: &http::Response<Body>,
        latency: std::time::Duration,
        span: &tracing::Span,
    ) {
        let status_code = response.status().as_u16();
        let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);

        span.record("http.response.status_code", status_code);
        span.record("latency_ms", latency_ms);

        if response.status().is_server_error() {
            tracing::warn!(status = status_code, latency_ms, "request failed");
        } else {
            tracing::info!(status = status_code, latency_ms, "finished processing request");
        }
    }
}

fn header<'a>(headers: &'a http::HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

fn matched_route<B>(req: &http::Request<B>) -> &str {
    req.extensions()
        .get::<axum::extract::MatchedPath>()
        .map_or("", axum::extract::MatchedPath::as_str)
}
