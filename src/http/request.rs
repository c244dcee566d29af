//! Request inspection helpers shared by the gate middleware.
//!
//! # Responsibilities
//! - Resolve the client IP (socket peer address, `X-Forwarded-For` fallback)
//! - Extract the User-Agent for telemetry

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request},
    http::header,
};

/// Placeholder when no peer address is available (e.g. in-process tests
/// driving the router without a TCP connection).
pub const UNKNOWN_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Resolve the client IP for rate limiting and telemetry.
///
/// Prefers the connection's peer address; falls back to the first entry of
/// `X-Forwarded-For` when the listener did not attach connect info.
pub fn client_ip(request: &Request) -> IpAddr {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip();
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(UNKNOWN_IP)
}

/// Extract the User-Agent header, empty string when absent.
pub fn user_agent(request: &Request) -> String {
    request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn falls_back_to_forwarded_header() {
        let request: Request = axum::http::Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&request), "203.0.113.9".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn unknown_without_peer_or_header() {
        let request: Request = axum::http::Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_ip(&request), UNKNOWN_IP);
    }
}
