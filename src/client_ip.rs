use std::net::IpAddr;

use axum::http::HeaderMap;
use ipnet::IpNet;

/// Address used to rate-limit a request.
pub fn extract(headers: &HeaderMap, peer_addr: IpAddr, trusted_proxies: &[IpNet]) -> IpAddr {
    // Only trust X-Forwarded-For if the direct connection is from a trusted proxy
    if trusted_proxies.is_empty() || !trusted_proxies.iter().any(|net| net.contains(&peer_addr)) {
        return peer_addr;
    }

    let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) else {
        return peer_addr;
    };

    // Take the first (leftmost) IP that isn't a trusted proxy
    xff.split(',')
        .filter_map(|s| s.trim().parse::<IpAddr>().ok())
        .find(|ip| !trusted_proxies.iter().any(|net| net.contains(ip)))
        .unwrap_or(peer_addr)
}
