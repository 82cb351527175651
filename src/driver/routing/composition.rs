//! 클러스터 구성
//!
//! 라우팅 프로시저가 돌려준 역할별 서버 목록과 만료 시각입니다.

use std::fmt;

use super::super::address::ServerAddress;
use super::super::error::{DriverError, DriverResult};
use super::super::record::Record;
use super::super::types::Value;
use super::table::ServerRole;

// ============================================================================
// ClusterComposition - 클러스터 구성
// ============================================================================

/// 클러스터 구성
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterComposition {
    /// 만료 시각 (에포크 기준 밀리초)
    expiration_timestamp: i64,
    readers: Vec<ServerAddress>,
    writers: Vec<ServerAddress>,
    routers: Vec<ServerAddress>,
}

impl ClusterComposition {
    /// 새 구성 생성 (역할별 중복 주소는 처음 것만 유지)
    pub fn new(
        expiration_timestamp: i64,
        readers: Vec<ServerAddress>,
        writers: Vec<ServerAddress>,
        routers: Vec<ServerAddress>,
    ) -> Self {
        Self {
            expiration_timestamp,
            readers: dedup(readers),
            writers: dedup(writers),
            routers: dedup(routers),
        }
    }

    /// 라우팅 프로시저 레코드 파싱
    ///
    /// 레코드는 `ttl`(초, 정수)과 `servers`(`{role, addresses}` 맵의 리스트)를
    /// 가져야 합니다. 형식이 맞지 않으면 `Protocol` 에러입니다.
    pub fn parse(record: &Record, now: i64) -> DriverResult<Self> {
        let ttl = record
            .get("ttl")
            .and_then(Value::as_int)
            .ok_or_else(|| malformed(record, "'ttl' must be an integer"))?;

        let servers = record
            .get("servers")
            .and_then(Value::as_list)
            .ok_or_else(|| malformed(record, "'servers' must be a list"))?;

        let mut readers = Vec::new();
        let mut writers = Vec::new();
        let mut routers = Vec::new();

        for server in servers {
            let server = server
                .as_map()
                .ok_or_else(|| malformed(record, "server entry must be a map"))?;

            let role = server
                .get("role")
                .and_then(Value::as_str)
                .ok_or_else(|| malformed(record, "server entry has no 'role'"))?;
            let role = ServerRole::parse(role)
                .ok_or_else(|| malformed(record, &format!("invalid server role '{}'", role)))?;

            let addresses = server
                .get("addresses")
                .and_then(Value::as_list)
                .ok_or_else(|| malformed(record, "'addresses' must be a list"))?;

            let target = match role {
                ServerRole::Read => &mut readers,
                ServerRole::Write => &mut writers,
                ServerRole::Route => &mut routers,
            };
            for address in addresses {
                let address = address
                    .as_str()
                    .ok_or_else(|| malformed(record, "address must be a string"))?;
                let address = ServerAddress::parse(address)
                    .map_err(|e| malformed(record, &e.to_string()))?;
                target.push(address);
            }
        }

        Ok(Self::new(
            expiration_timestamp(now, ttl),
            readers,
            writers,
            routers,
        ))
    }

    /// 라이터가 있는지 확인
    pub fn has_writers(&self) -> bool {
        !self.writers.is_empty()
    }

    /// 라우터와 리더가 모두 있는지 확인
    pub fn has_routers_and_readers(&self) -> bool {
        !self.routers.is_empty() && !self.readers.is_empty()
    }

    /// 리더 목록
    pub fn readers(&self) -> &[ServerAddress] {
        &self.readers
    }

    /// 라이터 목록
    pub fn writers(&self) -> &[ServerAddress] {
        &self.writers
    }

    /// 라우터 목록
    pub fn routers(&self) -> &[ServerAddress] {
        &self.routers
    }

    /// 만료 시각 (밀리초)
    pub fn expiration_timestamp(&self) -> i64 {
        self.expiration_timestamp
    }
}

impl fmt::Display for ClusterComposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ClusterComposition{{expirationTimestamp={}, readers={:?}, writers={:?}, routers={:?}}}",
            self.expiration_timestamp,
            self.readers.iter().map(ToString::to_string).collect::<Vec<_>>(),
            self.writers.iter().map(ToString::to_string).collect::<Vec<_>>(),
            self.routers.iter().map(ToString::to_string).collect::<Vec<_>>(),
        )
    }
}

/// `now + ttl`초를 밀리초로 계산 (음수이거나 넘치면 `i64::MAX`)
fn expiration_timestamp(now: i64, ttl_seconds: i64) -> i64 {
    if ttl_seconds < 0 || ttl_seconds >= i64::MAX / 1000 {
        return i64::MAX;
    }

    match now.checked_add(ttl_seconds * 1000) {
        Some(expires) if expires >= 0 => expires,
        _ => i64::MAX,
    }
}

fn dedup(addresses: Vec<ServerAddress>) -> Vec<ServerAddress> {
    let mut unique = Vec::with_capacity(addresses.len());
    for address in addresses {
        if !unique.contains(&address) {
            unique.push(address);
        }
    }
    unique
}

fn malformed(record: &Record, reason: &str) -> DriverError {
    DriverError::protocol(format!(
        "Unable to parse routing record {}: {}",
        record, reason
    ))
}
