//! 访客 IP 提取
//!
//! 连接来自可信代理（`site.trusted_proxies`，支持 CIDR）时取 `X-Forwarded-For`
//! 的第一个地址，其次 `X-Real-IP`；否则使用连接地址，不信任转发头。

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;
use tracing::trace;

/// 解析 `ip` 或 `ip:port`
fn parse_peer(addr: &str) -> Option<IpAddr> {
    addr.parse::<SocketAddr>()
        .map(|s| s.ip())
        .or_else(|_| addr.parse::<IpAddr>())
        .ok()
}

/// CIDR 匹配，格式错误视为不匹配
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix)) = cidr.split_once('/') else {
        return false;
    };
    let (Ok(network), Ok(prefix)) = (network.parse::<IpAddr>(), prefix.parse::<u32>()) else {
        return false;
    };

    match (ip, network) {
        (IpAddr::V4(ip), IpAddr::V4(net)) if prefix <= 32 => {
            let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
            u32::from(*ip) & mask == u32::from(net) & mask
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) if prefix <= 128 => {
            let mask = u128::MAX.checked_shl(128 - prefix).unwrap_or(0);
            u128::from(*ip) & mask == u128::from(net) & mask
        }
        _ => false,
    }
}

/// 连接地址是否属于可信代理
pub fn is_trusted_proxy(peer: &str, trusted_proxies: &[String]) -> bool {
    let Some(ip) = parse_peer(peer) else {
        return false;
    };
    trusted_proxies.iter().any(|entry| {
        if entry.contains('/') {
            ip_in_cidr(&ip, entry)
        } else {
            entry.parse::<IpAddr>().is_ok_and(|p| p == ip)
        }
    })
}

/// 转发头中的原始客户端地址
pub fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| headers.get(name).and_then(|h| h.to_str().ok());

    header("x-forwarded-for")
        .and_then(|s| s.split(',').next())
        .or_else(|| header("x-real-ip"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// 从请求提取访客 IP
pub fn extract_client_ip(req: &HttpRequest, trusted_proxies: &[String]) -> Option<String> {
    let conn = req.connection_info();
    let peer = conn.peer_addr()?.to_string();

    if is_trusted_proxy(&peer, trusted_proxies)
        && let Some(real) = forwarded_ip(req.headers())
    {
        trace!("Trusted proxy {} forwarded client {}", peer, real);
        return Some(real);
    }
    Some(peer)
}
