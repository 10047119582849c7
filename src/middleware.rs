//! HTTP boundary: an axum middleware around [`CrawlerGuard`].

use crate::agent::CrawlerGuard;
use crate::decision::Decision;
use crate::detectors::RequestSignal;
use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::sync::Arc;

/// Build the classification input from an incoming request.
pub fn request_signal(req: &Request<Body>) -> RequestSignal {
    let headers = req.headers();
    let forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok());
    // obs-text bytes are legal in header values; keep the header rather
    // than treating it as absent.
    let user_agent = headers
        .get(header::USER_AGENT)
        .map(|v| String::from_utf8_lossy(v.as_bytes()));
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());

    RequestSignal::from_parts(req.uri().path(), forwarded_for, peer, user_agent.as_deref())
}

/// Middleware that rejects requests the guard denies.
///
/// Install with `axum::middleware::from_fn_with_state(guard, guard_layer)`.
pub async fn guard_layer(
    State(guard): State<Arc<CrawlerGuard>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let signal = request_signal(&req);

    match guard.evaluate(&signal).await {
        Decision::Allow | Decision::AllowSilent => next.run(req).await,
        Decision::Deny(reason) => {
            tracing::debug!(
                client_ip = %signal.source_address,
                reason = reason.as_str(),
                "Request denied"
            );
            (StatusCode::FORBIDDEN, reason.message()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_signal_from_headers() {
        let req = Request::builder()
            .uri("/products?page=2")
            .header("x-forwarded-for", "203.0.113.5, 10.0.0.2")
            .header("user-agent", "Mozilla/5.0 (X11; Linux x86_64)")
            .body(Body::empty())
            .unwrap();

        let signal = request_signal(&req);
        assert_eq!(signal.source_address, "203.0.113.5");
        assert_eq!(signal.user_agent, "Mozilla/5.0 (X11; Linux x86_64)");
        assert_eq!(signal.path, "/products");
    }

    #[test]
    fn test_request_signal_uses_connect_info() {
        let mut req = Request::builder().uri("/").body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo::<SocketAddr>("192.0.2.10:50000".parse().unwrap()));

        let signal = request_signal(&req);
        assert_eq!(signal.source_address, "192.0.2.10");
        assert_eq!(signal.user_agent, "");
    }

    #[test]
    fn test_request_signal_keeps_non_utf8_user_agent() {
        let ua = b"Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/121.0 \xE9";
        let req = Request::builder()
            .uri("/")
            .header("user-agent", HeaderValue::from_bytes(ua).unwrap())
            .body(Body::empty())
            .unwrap();

        let signal = request_signal(&req);
        assert!(signal.user_agent.starts_with("Mozilla/5.0 (X11; Linux x86_64)"));
        assert!(signal.user_agent.ends_with('\u{FFFD}'));
    }

    #[test]
    fn test_request_signal_unknown_source() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert!(request_signal(&req).source_is_unknown());
    }
}
