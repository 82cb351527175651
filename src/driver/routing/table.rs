//! 라우팅 테이블
//!
//! 클러스터의 서버 역할별 목록과 만료 시각을 관리합니다.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::super::address::ServerAddress;
use super::super::clock::{Clock, SystemClock};
use super::super::types::AccessMode;
use super::address_set::AddressSet;
use super::composition::ClusterComposition;

/// 서버 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerRole {
    /// 라우팅 테이블 제공자
    Route,
    /// 쓰기 트랜잭션 처리 (리더)
    Write,
    /// 읽기 트랜잭션 처리 (팔로워)
    Read,
}

impl ServerRole {
    /// 문자열에서 역할 파싱 (대소문자 무시)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ROUTE" => Some(Self::Route),
            "WRITE" => Some(Self::Write),
            "READ" => Some(Self::Read),
            _ => None,
        }
    }

    /// 역할을 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Route => "ROUTE",
            Self::Write => "WRITE",
            Self::Read => "READ",
        }
    }
}

impl fmt::Display for ServerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 라우팅 테이블
///
/// 초기 라우터만 가진 채 만료된 상태(만료 시각 0)로 생성되므로 첫 사용 시
/// 반드시 재탐색이 일어납니다. 내용은 [`update`](Self::update),
/// [`forget`](Self::forget), [`remove_writer`](Self::remove_writer)로만 바뀝니다.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    /// 라우터 목록 (라우팅 테이블 조회용)
    routers: AddressSet,
    /// 리더 목록 (읽기 트랜잭션용)
    readers: AddressSet,
    /// 라이터 목록 (쓰기 트랜잭션용)
    writers: AddressSet,
    /// 만료 시각 (에포크 기준 밀리초)
    expiration_timestamp: i64,
    clock: Arc<dyn Clock>,
}

impl RoutingTable {
    /// 초기 라우터로 테이블 생성
    pub fn new(initial_router: ServerAddress) -> Self {
        Self::with_clock([initial_router], Arc::new(SystemClock))
    }

    /// 시계를 지정하여 테이블 생성
    pub fn with_clock<I>(routers: I, clock: Arc<dyn Clock>) -> Self
    where
        I: IntoIterator<Item = ServerAddress>,
    {
        Self {
            routers: routers.into_iter().collect(),
            readers: AddressSet::new(),
            writers: AddressSet::new(),
            expiration_timestamp: 0,
            clock,
        }
    }

    /// 해당 모드로 사용하기에 오래되었는지 확인
    pub fn is_stale_for(&self, mode: AccessMode) -> bool {
        self.is_expired() || self.servers_for(mode).is_empty()
    }

    /// 재탐색이 필요한지 확인 (만료되었거나 비어 있는 역할이 있음)
    pub fn is_stale(&self) -> bool {
        self.is_expired()
            || self.routers.is_empty()
            || self.readers.is_empty()
            || self.writers.is_empty()
    }

    fn is_expired(&self) -> bool {
        self.clock.now_millis() >= self.expiration_timestamp
    }

    /// 클러스터 구성으로 테이블 교체
    ///
    /// 리더 또는 라이터 목록에서 빠진 주소들을 반환합니다.
    pub fn update(&mut self, composition: &ClusterComposition) -> HashSet<ServerAddress> {
        let mut removed = HashSet::new();
        self.readers
            .update(composition.readers().iter().cloned(), &mut removed);
        self.writers
            .update(composition.writers().iter().cloned(), &mut removed);
        self.routers
            .update(composition.routers().iter().cloned(), &mut HashSet::new());
        self.expiration_timestamp = composition.expiration_timestamp();
        removed
    }

    /// 모든 역할에서 주소 제거
    pub fn forget(&mut self, address: &ServerAddress) {
        self.routers.remove(address);
        self.readers.remove(address);
        self.writers.remove(address);
    }

    /// 라이터 목록에서만 주소 제거
    pub fn remove_writer(&mut self, address: &ServerAddress) {
        self.writers.remove(address);
    }

    /// 라우터 목록
    pub fn routers(&self) -> &AddressSet {
        &self.routers
    }

    /// 리더 목록
    pub fn readers(&self) -> &AddressSet {
        &self.readers
    }

    /// 라이터 목록
    pub fn writers(&self) -> &AddressSet {
        &self.writers
    }

    /// 모드에 해당하는 서버 목록
    pub fn servers_for(&self, mode: AccessMode) -> &AddressSet {
        match mode {
            AccessMode::Read => &self.readers,
            AccessMode::Write => &self.writers,
        }
    }

    /// 만료 시각 (밀리초)
    pub fn expiration_timestamp(&self) -> i64 {
        self.expiration_timestamp
    }
}

impl fmt::Display for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ttl {}, currentTime {}, routers {}, writers {}, readers {}",
            self.expiration_timestamp,
            self.clock.now_millis(),
            self.routers,
            self.writers,
            self.readers
        )
    }
}
