//! Request middleware feeding the access logger

use axum::{
    body::HttpBody,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use battlebit_access_log::LogEntry;
use chrono::Utc;
use std::net::SocketAddr;
use std::time::Instant;

use crate::state::SharedState;

/// Record one [`LogEntry`] per completed request
pub async fn record_access(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    let timestamp = Utc::now();
    let started = Instant::now();

    let method = request.method().to_string();
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_address(request.headers(), peer);
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let response = next.run(request).await;

    state.access_log.log(&LogEntry {
        timestamp,
        client,
        method,
        path,
        status: response.status().as_u16(),
        size: response_size(&response),
        duration: started.elapsed(),
        user_agent,
    });

    response
}

/// First `X-Forwarded-For` hop, else the socket peer, else `-`
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty());

    match (forwarded, peer) {
        (Some(hop), _) => hop.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "-".to_string(),
    }
}

fn response_size(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .or_else(|| response.body().size_hint().exact())
}
