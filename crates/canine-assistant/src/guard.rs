use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, warn};

use crate::server::AppState;

const ALLOW_METHODS: &str = "POST, GET, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type";

/// CORS locked to the configured origin. Requests without an `Origin` header
/// pass untouched; other origins get no CORS headers, so browsers block them.
pub async fn cors_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let allowed = header_str(req.headers(), header::ORIGIN)
        .filter(|origin| *origin == state.config.allowed_origin)
        .and_then(|origin| HeaderValue::from_str(origin).ok());

    let mut resp = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    if let Some(origin) = allowed {
        let headers = resp.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    }
    resp
}

/// `/chat` only answers pages under the allowed origin and path.
pub async fn referer_guard(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let referer = header_str(req.headers(), header::REFERER).unwrap_or("");
    if referer_allowed(referer, &state.config.allowed_origin, &state.config.allowed_path) {
        return next.run(req).await;
    }
    debug!(referer, "rejected request from unexpected referer");
    (
        StatusCode::FORBIDDEN,
        Json(serde_json::json!({ "error": "Forbidden" })),
    )
        .into_response()
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let client = client_ip(&req, state.config.trust_forwarded_for);
    match state.limiter.check(client).await {
        Ok(()) => next.run(req).await,
        Err(wait) => {
            warn!(client = %client, limit = state.limiter.max(), "rate limit exceeded");
            let retry_after = wait.as_secs().max(1).to_string();
            let mut resp = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "Too many requests, please try again later."
                })),
            )
                .into_response();
            if let Ok(v) = HeaderValue::from_str(&retry_after) {
                resp.headers_mut().insert(header::RETRY_AFTER, v);
            }
            resp
        }
    }
}

fn referer_allowed(referer: &str, origin: &str, path: &str) -> bool {
    referer.starts_with(origin) && referer.contains(path)
}

fn client_ip(req: &Request<Body>, trust_forwarded_for: bool) -> IpAddr {
    if trust_forwarded_for {
        let forwarded = header_str(req.headers(), "x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .and_then(|first| first.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip;
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn header_str(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://breeder.example";

    #[test]
    fn referer_must_share_origin_and_contain_path() {
        assert!(referer_allowed(
            "https://breeder.example/all-breed/ask",
            ORIGIN,
            "/all-breed/"
        ));
        assert!(!referer_allowed("https://breeder.example/blog/", ORIGIN, "/all-breed/"));
        assert!(!referer_allowed(
            "https://evil.example/https://breeder.example/all-breed/",
            ORIGIN,
            "/all-breed/"
        ));
        assert!(!referer_allowed("", ORIGIN, "/all-breed/"));
    }

    #[test]
    fn forwarded_for_is_only_used_when_trusted() {
        let req = axum::http::Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            client_ip(&req, true),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
        assert_eq!(client_ip(&req, false), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    #[test]
    fn peer_address_comes_from_connect_info() {
        let mut req = axum::http::Request::builder().body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 4], 5555))));
        assert_eq!(client_ip(&req, false), IpAddr::from([192, 0, 2, 4]));
    }
}
