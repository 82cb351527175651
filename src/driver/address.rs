//! 서버 주소
//!
//! 클러스터 멤버의 엔드포인트(host, port)를 표현합니다.

use std::fmt;
use std::net::SocketAddr;

use super::error::{DriverError, DriverResult};

/// Bolt 기본 포트
pub const DEFAULT_PORT: u16 = 7687;

// ============================================================================
// ServerAddress - 서버 주소
// ============================================================================

/// 서버 주소
///
/// 동등성과 해시는 `(host, port)` 쌍으로 결정됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerAddress {
    /// 호스트
    pub host: String,
    /// 포트
    pub port: u16,
}

impl ServerAddress {
    /// 새 서버 주소 생성
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host`, `host:port`, `[ipv6]:port` 형식 파싱
    pub fn parse(s: &str) -> DriverResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DriverError::configuration("Empty server address"));
        }

        // [::1]:7687 형식
        if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| DriverError::configuration(format!("Invalid server address '{}'", s)))?;
            let port = match tail {
                "" => DEFAULT_PORT,
                _ => parse_port(s, tail.strip_prefix(':').unwrap_or(tail))?,
            };
            return Ok(Self::new(host, port));
        }

        let parts: Vec<&str> = s.split(':').collect();
        match parts.len() {
            1 => Ok(Self::new(parts[0], DEFAULT_PORT)),
            2 => Ok(Self::new(parts[0], parse_port(s, parts[1])?)),
            // 괄호 없는 IPv6 리터럴
            _ => Ok(Self::new(s, DEFAULT_PORT)),
        }
    }

    /// URI에서 파싱
    ///
    /// `zeta4g://host:port/path?query` 형식에서 스킴, 경로, 쿼리를 무시합니다.
    pub fn from_uri(uri: &str) -> DriverResult<Self> {
        let authority = match uri.split_once("://") {
            Some((_, rest)) => rest,
            None => uri,
        };
        let authority = authority
            .split(|c: char| c == '/' || c == '?')
            .next()
            .unwrap_or_default();
        Self::parse(authority)
    }

    /// 소켓 주소 문자열로 변환
    pub fn to_socket_addr(&self) -> String {
        self.to_string()
    }
}

fn parse_port(address: &str, port: &str) -> DriverResult<u16> {
    port.parse()
        .map_err(|_| DriverError::configuration(format!("Invalid port in server address '{}'", address)))
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl Default for ServerAddress {
    fn default() -> Self {
        Self::new("localhost", DEFAULT_PORT)
    }
}

impl From<SocketAddr> for ServerAddress {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}
