//! 라우팅 정책
//!
//! 같은 역할의 서버들 중 하나를 고르는 선택 전략을 정의합니다.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::super::address::ServerAddress;
use super::super::spi::ConnectionPool;

/// 라우팅 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingPolicy {
    /// 최소 연결 (기본값)
    #[default]
    LeastConnected,
    /// 라운드 로빈
    RoundRobin,
    /// 랜덤
    Random,
}

impl RoutingPolicy {
    /// 정책에 해당하는 전략 생성
    pub fn create_strategy(&self, pool: Arc<dyn ConnectionPool>) -> Arc<dyn LoadBalancingStrategy> {
        match self {
            Self::LeastConnected => Arc::new(LeastConnectedLoadBalancingStrategy::new(pool)),
            Self::RoundRobin => Arc::new(RoundRobinLoadBalancingStrategy::new()),
            Self::Random => Arc::new(RandomLoadBalancingStrategy),
        }
    }
}

/// 서버 선택 전략
///
/// 빈 목록이 주어지면 `None`을 반환합니다.
pub trait LoadBalancingStrategy: Send + Sync {
    /// 리더 하나 선택
    fn select_reader<'a>(&self, known_readers: &'a [ServerAddress]) -> Option<&'a ServerAddress>;

    /// 라이터 하나 선택
    fn select_writer<'a>(&self, known_writers: &'a [ServerAddress]) -> Option<&'a ServerAddress>;
}

// ============================================================================
// RoundRobinArrayIndex - 순환 인덱스
// ============================================================================

/// 배열 길이에 맞춰 순환하는 시작 인덱스
#[derive(Debug, Default)]
pub struct RoundRobinArrayIndex {
    offset: AtomicUsize,
}

impl RoundRobinArrayIndex {
    /// 새 인덱스 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 다음 인덱스 (`len`은 0보다 커야 함)
    pub fn next(&self, len: usize) -> usize {
        self.offset.fetch_add(1, Ordering::Relaxed) % len
    }
}

// ============================================================================
// LeastConnectedLoadBalancingStrategy - 최소 연결
// ============================================================================

/// 활성 연결이 가장 적은 서버를 고르는 전략
///
/// 역할별 순환 시작점에서 출발해 배열 전체를 한 바퀴 돌며, 처음 만난 최소값을
/// 고릅니다. 연결 수가 같으면 시작점이 돌아가며 바뀌므로 부하가 고르게
/// 퍼집니다.
pub struct LeastConnectedLoadBalancingStrategy {
    readers_index: RoundRobinArrayIndex,
    writers_index: RoundRobinArrayIndex,
    connection_pool: Arc<dyn ConnectionPool>,
}

impl LeastConnectedLoadBalancingStrategy {
    /// 새 전략 생성
    pub fn new(connection_pool: Arc<dyn ConnectionPool>) -> Self {
        Self {
            readers_index: RoundRobinArrayIndex::new(),
            writers_index: RoundRobinArrayIndex::new(),
            connection_pool,
        }
    }

    fn select<'a>(
        &self,
        addresses: &'a [ServerAddress],
        index: &RoundRobinArrayIndex,
        address_type: &str,
    ) -> Option<&'a ServerAddress> {
        if addresses.is_empty() {
            trace!("Unable to select {}, no known addresses given", address_type);
            return None;
        }

        let start = index.next(addresses.len());
        let mut least: Option<(&ServerAddress, usize)> = None;

        for offset in 0..addresses.len() {
            let address = &addresses[(start + offset) % addresses.len()];
            let active = self.connection_pool.active_connections(address);
            if least.map_or(true, |(_, min)| active < min) {
                least = Some((address, active));
            }
        }

        let (address, active) = least?;
        trace!(
            "Selected {} with address: '{}' and active connections: {}",
            address_type,
            address,
            active
        );
        Some(address)
    }
}

impl LoadBalancingStrategy for LeastConnectedLoadBalancingStrategy {
    fn select_reader<'a>(&self, known_readers: &'a [ServerAddress]) -> Option<&'a ServerAddress> {
        self.select(known_readers, &self.readers_index, "reader")
    }

    fn select_writer<'a>(&self, known_writers: &'a [ServerAddress]) -> Option<&'a ServerAddress> {
        self.select(known_writers, &self.writers_index, "writer")
    }
}

// ============================================================================
// RoundRobinLoadBalancingStrategy - 라운드 로빈
// ============================================================================

/// 역할별로 돌아가며 고르는 전략
#[derive(Debug, Default)]
pub struct RoundRobinLoadBalancingStrategy {
    readers_index: RoundRobinArrayIndex,
    writers_index: RoundRobinArrayIndex,
}

impl RoundRobinLoadBalancingStrategy {
    /// 새 전략 생성
    pub fn new() -> Self {
        Self::default()
    }

    fn select<'a>(
        addresses: &'a [ServerAddress],
        index: &RoundRobinArrayIndex,
        address_type: &str,
    ) -> Option<&'a ServerAddress> {
        if addresses.is_empty() {
            trace!("Unable to select {}, no known addresses given", address_type);
            return None;
        }

        let address = &addresses[index.next(addresses.len())];
        trace!("Selected {} with address: '{}'", address_type, address);
        Some(address)
    }
}

impl LoadBalancingStrategy for RoundRobinLoadBalancingStrategy {
    fn select_reader<'a>(&self, known_readers: &'a [ServerAddress]) -> Option<&'a ServerAddress> {
        Self::select(known_readers, &self.readers_index, "reader")
    }

    fn select_writer<'a>(&self, known_writers: &'a [ServerAddress]) -> Option<&'a ServerAddress> {
        Self::select(known_writers, &self.writers_index, "writer")
    }
}

// ============================================================================
// RandomLoadBalancingStrategy - 랜덤
// ============================================================================

/// 무작위로 고르는 전략
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomLoadBalancingStrategy;

impl RandomLoadBalancingStrategy {
    fn select(addresses: &[ServerAddress]) -> Option<&ServerAddress> {
        if addresses.is_empty() {
            return None;
        }
        let index = rand::thread_rng().gen_range(0..addresses.len());
        addresses.get(index)
    }
}

impl LoadBalancingStrategy for RandomLoadBalancingStrategy {
    fn select_reader<'a>(&self, known_readers: &'a [ServerAddress]) -> Option<&'a ServerAddress> {
        Self::select(known_readers)
    }

    fn select_writer<'a>(&self, known_writers: &'a [ServerAddress]) -> Option<&'a ServerAddress> {
        Self::select(known_writers)
    }
}
