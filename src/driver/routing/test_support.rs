//! 테스트용 가짜 협력자

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::super::address::ServerAddress;
use super::super::error::{DriverError, DriverResult};
use super::super::record::Record;
use super::super::resolver::DnsResolver;
use super::super::spi::{Connection, ConnectionPool};
use super::super::types::{ServerVersion, Value};
use super::composition::ClusterComposition;
use super::provider::ClusterCompositionProvider;

/// 기본 포트의 주소
pub(crate) fn addr(host: &str) -> ServerAddress {
    ServerAddress::new(host, 7687)
}

fn addrs(hosts: &[&str]) -> Vec<ServerAddress> {
    hosts.iter().map(|h| addr(h)).collect()
}

/// 클러스터 구성
pub(crate) fn composition(
    expiration_timestamp: i64,
    readers: &[&str],
    writers: &[&str],
    routers: &[&str],
) -> ClusterComposition {
    ClusterComposition::new(
        expiration_timestamp,
        addrs(readers),
        addrs(writers),
        addrs(routers),
    )
}

/// 라우팅 프로시저 결과 레코드
pub(crate) fn routing_record(ttl: i64, routers: &[&str], writers: &[&str], readers: &[&str]) -> Record {
    let server = |role: &str, hosts: &[&str]| {
        let addresses: Vec<Value> = hosts
            .iter()
            .map(|h| Value::from(addr(h).to_string()))
            .collect();
        let mut map = HashMap::new();
        map.insert("role".to_string(), Value::from(role));
        map.insert("addresses".to_string(), Value::List(addresses));
        Value::Map(map)
    };

    Record::from_pairs([
        ("ttl", Value::Integer(ttl)),
        (
            "servers",
            Value::List(vec![
                server("ROUTE", routers),
                server("WRITE", writers),
                server("READ", readers),
            ]),
        ),
    ])
}

type QueryLog = Arc<Mutex<Vec<(ServerAddress, String, HashMap<String, Value>)>>>;

// ============================================================================
// FakeConnection / FakePool
// ============================================================================

/// 정해진 결과를 돌려주는 연결
pub(crate) struct FakeConnection {
    address: ServerAddress,
    version: Option<ServerVersion>,
    result: DriverResult<Vec<Record>>,
    queries: QueryLog,
    released: Arc<AtomicUsize>,
}

#[async_trait]
impl Connection for FakeConnection {
    fn server_address(&self) -> &ServerAddress {
        &self.address
    }

    fn server_version(&self) -> Option<ServerVersion> {
        self.version
    }

    async fn run(
        &mut self,
        query: &str,
        parameters: HashMap<String, Value>,
    ) -> DriverResult<Vec<Record>> {
        self.queries
            .lock()
            .push((self.address.clone(), query.to_string(), parameters));
        self.result.clone()
    }

    async fn release(&mut self) -> DriverResult<()> {
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 주소별 동작을 지정할 수 있는 연결 풀
#[derive(Default)]
pub(crate) struct FakePool {
    acquire_failures: Mutex<HashMap<ServerAddress, DriverError>>,
    acquire_delays: Mutex<HashMap<ServerAddress, Duration>>,
    responses: Mutex<HashMap<ServerAddress, DriverResult<Vec<Record>>>>,
    active: Mutex<HashMap<ServerAddress, usize>>,
    acquired: Mutex<Vec<ServerAddress>>,
    purged: Mutex<Vec<ServerAddress>>,
    version: Mutex<Option<ServerVersion>>,
    queries: QueryLog,
    released: Arc<AtomicUsize>,
    closed: AtomicUsize,
}

impl FakePool {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 해당 주소로의 획득 실패 지정
    pub(crate) fn fail_acquire(&self, address: &ServerAddress, error: DriverError) {
        self.acquire_failures.lock().insert(address.clone(), error);
    }

    /// 해당 주소로의 획득을 지연
    pub(crate) fn delay_acquire(&self, address: &ServerAddress, delay: Duration) {
        self.acquire_delays.lock().insert(address.clone(), delay);
    }

    /// 해당 주소 연결의 `run` 결과 지정
    pub(crate) fn respond(&self, address: &ServerAddress, result: DriverResult<Vec<Record>>) {
        self.responses.lock().insert(address.clone(), result);
    }

    pub(crate) fn set_active_connections(&self, address: &ServerAddress, count: usize) {
        self.active.lock().insert(address.clone(), count);
    }

    pub(crate) fn set_server_version(&self, version: Option<ServerVersion>) {
        *self.version.lock() = version;
    }

    pub(crate) fn acquired(&self) -> Vec<ServerAddress> {
        self.acquired.lock().clone()
    }

    pub(crate) fn purged(&self) -> Vec<ServerAddress> {
        self.purged.lock().clone()
    }

    pub(crate) fn queries(&self) -> Vec<(ServerAddress, String, HashMap<String, Value>)> {
        self.queries.lock().clone()
    }

    pub(crate) fn released_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub(crate) fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionPool for FakePool {
    async fn acquire(&self, address: &ServerAddress) -> DriverResult<Box<dyn Connection>> {
        self.acquired.lock().push(address.clone());

        let delay = self.acquire_delays.lock().get(address).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.acquire_failures.lock().get(address) {
            return Err(error.clone());
        }

        let result = self
            .responses
            .lock()
            .get(address)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()));

        Ok(Box::new(FakeConnection {
            address: address.clone(),
            version: *self.version.lock(),
            result,
            queries: Arc::clone(&self.queries),
            released: Arc::clone(&self.released),
        }))
    }

    fn purge(&self, address: &ServerAddress) {
        self.purged.lock().push(address.clone());
    }

    fn active_connections(&self, address: &ServerAddress) -> usize {
        self.active.lock().get(address).copied().unwrap_or(0)
    }

    async fn close(&self) -> DriverResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// FakeProvider
// ============================================================================

/// 라우터별 응답을 차례로 돌려주는 제공자
///
/// 응답이 하나 남으면 그 응답을 계속 반복합니다.
#[derive(Default)]
pub(crate) struct FakeProvider {
    responses: Mutex<HashMap<ServerAddress, VecDeque<DriverResult<ClusterComposition>>>>,
    calls: Mutex<Vec<ServerAddress>>,
    delay: Mutex<Option<Duration>>,
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, router: &ServerAddress, result: DriverResult<ClusterComposition>) {
        self.responses
            .lock()
            .entry(router.clone())
            .or_default()
            .push_back(result);
    }

    /// 매 호출 전 대기 시간
    pub(crate) fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub(crate) fn calls(&self) -> Vec<ServerAddress> {
        self.calls.lock().clone()
    }

    fn next_response(&self, router: &ServerAddress) -> DriverResult<ClusterComposition> {
        let mut responses = self.responses.lock();
        let queue = match responses.get_mut(router) {
            Some(queue) => queue,
            None => {
                return Err(DriverError::service_unavailable(format!(
                    "No response for {}",
                    router
                )))
            }
        };

        if queue.len() > 1 {
            queue
                .pop_front()
                .unwrap_or_else(|| Err(DriverError::internal("empty")))
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(DriverError::internal("empty")))
        }
    }
}

#[async_trait]
impl ClusterCompositionProvider for FakeProvider {
    async fn get_cluster_composition(
        &self,
        _pool: &dyn ConnectionPool,
        router: &ServerAddress,
    ) -> DriverResult<ClusterComposition> {
        self.calls.lock().push(router.clone());

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.next_response(router)
    }
}

// ============================================================================
// FakeResolver
// ============================================================================

/// 지정하지 않은 주소는 그대로 돌려주는 리졸버
#[derive(Default)]
pub(crate) struct FakeResolver {
    responses: Mutex<HashMap<ServerAddress, DriverResult<Vec<ServerAddress>>>>,
    calls: AtomicUsize,
}

impl FakeResolver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, address: &ServerAddress, result: DriverResult<Vec<ServerAddress>>) {
        self.responses.lock().insert(address.clone(), result);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsResolver for FakeResolver {
    async fn resolve(&self, address: &ServerAddress) -> DriverResult<Vec<ServerAddress>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .get(address)
            .cloned()
            .unwrap_or_else(|| Ok(vec![address.clone()]))
    }
}
