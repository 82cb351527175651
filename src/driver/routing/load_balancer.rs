//! 로드 밸런서
//!
//! 라우팅 테이블 갱신, 서버 선택, 연결 획득, 장애 시 재시도를 하나로 묶습니다.
//!
//! 라우팅 테이블 갱신은 한 번에 하나만 진행됩니다. 갱신 중에 들어온 요청은
//! 진행 중인 갱신의 결과(테이블 스냅샷 또는 에러)를 그대로 공유합니다.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::super::address::ServerAddress;
use super::super::clock::{Clock, SystemClock};
use super::super::error::{DriverError, DriverResult};
use super::super::resolver::SystemDnsResolver;
use super::super::spi::{Connection, ConnectionPool};
use super::super::types::AccessMode;
use super::connection::{RoutingConnection, RoutingErrorHandler};
use super::policy::LoadBalancingStrategy;
use super::provider::RoutingProcedureClusterCompositionProvider;
use super::rediscovery::Rediscovery;
use super::settings::{RoutingContext, RoutingSettings};
use super::table::RoutingTable;

/// 진행 중인 라우팅 테이블 갱신
type RefreshFuture = Shared<BoxFuture<'static, DriverResult<RoutingTable>>>;

/// URI가 라우팅용인지 확인
pub fn is_routing_uri(uri: &str) -> bool {
    uri.starts_with("zeta4g://") || uri.starts_with("zeta4g+s://") || uri.starts_with("zeta4g+ssc://")
}

// ============================================================================
// LoadBalancer - 로드 밸런서
// ============================================================================

/// 로드 밸런서
pub struct LoadBalancer {
    connection_pool: Arc<dyn ConnectionPool>,
    routing_table: Arc<Mutex<RoutingTable>>,
    rediscovery: Arc<Rediscovery>,
    strategy: Arc<dyn LoadBalancingStrategy>,
    /// 진행 중인 갱신 (잠금 순서: refresh → routing_table)
    refresh: Arc<Mutex<Option<RefreshFuture>>>,
    error_handler: Arc<RoutingTableErrorHandler>,
    closed: AtomicBool,
}

impl LoadBalancer {
    /// 초기 라우터와 설정으로 생성
    pub fn new(
        initial_router: ServerAddress,
        settings: RoutingSettings,
        connection_pool: Arc<dyn ConnectionPool>,
    ) -> Self {
        Self::with_clock(initial_router, settings, connection_pool, Arc::new(SystemClock))
    }

    /// 시계를 지정하여 생성
    pub fn with_clock(
        initial_router: ServerAddress,
        settings: RoutingSettings,
        connection_pool: Arc<dyn ConnectionPool>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let provider = RoutingProcedureClusterCompositionProvider::new(
            Arc::clone(&clock),
            settings.routing_context.clone(),
        );
        let strategy = settings
            .load_balancing
            .create_strategy(Arc::clone(&connection_pool));
        let table = RoutingTable::with_clock([initial_router.clone()], clock);
        let rediscovery = Rediscovery::new(
            initial_router,
            settings,
            Arc::new(provider),
            Arc::new(SystemDnsResolver),
        );

        Self::with_components(connection_pool, table, rediscovery, strategy)
    }

    /// 구성 요소를 직접 지정하여 생성
    pub fn with_components(
        connection_pool: Arc<dyn ConnectionPool>,
        routing_table: RoutingTable,
        rediscovery: Rediscovery,
        strategy: Arc<dyn LoadBalancingStrategy>,
    ) -> Self {
        let routing_table = Arc::new(Mutex::new(routing_table));
        let error_handler = Arc::new(RoutingTableErrorHandler {
            routing_table: Arc::clone(&routing_table),
            connection_pool: Arc::clone(&connection_pool),
        });

        Self {
            connection_pool,
            routing_table,
            rediscovery: Arc::new(rediscovery),
            strategy,
            refresh: Arc::new(Mutex::new(None)),
            error_handler,
            closed: AtomicBool::new(false),
        }
    }

    /// 라우팅 URI로 생성
    ///
    /// URI 형식: `zeta4g://host:port?key=value`. 쿼리 파라미터는 라우팅
    /// 컨텍스트가 됩니다.
    pub fn from_uri(
        uri: &str,
        mut settings: RoutingSettings,
        connection_pool: Arc<dyn ConnectionPool>,
    ) -> DriverResult<Self> {
        if !is_routing_uri(uri) {
            return Err(DriverError::configuration(format!(
                "Unsupported routing URI scheme in '{}'",
                uri
            )));
        }

        let initial_router = ServerAddress::from_uri(uri)?;
        let context = RoutingContext::from_uri(uri)?;
        if context.is_defined() {
            settings.routing_context = context;
        }

        Ok(Self::new(initial_router, settings, connection_pool))
    }

    /// 접근 모드에 맞는 서버로 연결 획득
    pub async fn acquire_connection(&self, mode: AccessMode) -> DriverResult<RoutingConnection> {
        self.ensure_open()?;

        self.fresh_routing_table(mode).await?;
        let connection = self.acquire(mode).await?;
        let error_handler: Arc<dyn RoutingErrorHandler> = self.error_handler.clone();

        Ok(RoutingConnection::new(connection, mode, error_handler))
    }

    /// 읽기용 라우팅 테이블을 얻을 수 있는지 확인
    pub async fn verify_connectivity(&self) -> DriverResult<()> {
        self.ensure_open()?;
        self.fresh_routing_table(AccessMode::Read).await.map(|_| ())
    }

    /// 연결 풀 닫기 (여러 번 호출해도 한 번만 닫음)
    pub async fn close(&self) -> DriverResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        debug!("Closing load balancer");
        self.connection_pool.close().await
    }

    /// 닫혔는지 확인
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// 서버에 도달할 수 없음 (테이블에서 제거 후 연결 폐기)
    pub fn on_connection_failure(&self, address: &ServerAddress) {
        self.error_handler.on_connection_failure(address);
    }

    /// 서버가 쓰기를 거부함 (라이터에서만 제거)
    pub fn on_write_failure(&self, address: &ServerAddress) {
        self.error_handler.on_write_failure(address);
    }

    /// 현재 라우팅 테이블 스냅샷
    pub fn routing_table(&self) -> RoutingTable {
        self.routing_table.lock().clone()
    }

    fn ensure_open(&self) -> DriverResult<()> {
        if self.is_closed() {
            Err(DriverError::session("Driver is closed"))
        } else {
            Ok(())
        }
    }

    async fn fresh_routing_table(&self, mode: AccessMode) -> DriverResult<RoutingTable> {
        let refresh = {
            let mut slot = self.refresh.lock();
            match slot.as_ref() {
                // 이미 갱신 중이면 그 결과를 공유
                Some(refresh) => refresh.clone(),
                None => {
                    let table = self.routing_table.lock();
                    if !table.is_stale_for(mode) {
                        return Ok(table.clone());
                    }
                    info!("Routing information is stale. {}", *table);
                    drop(table);

                    let refresh = self.start_refresh();
                    *slot = Some(refresh.clone());
                    refresh
                }
            }
        };

        refresh.await
    }

    /// 재탐색 태스크 시작
    ///
    /// 결과 반영(테이블 갱신, 제거된 주소의 연결 폐기)과 슬롯 해제는 태스크
    /// 안에서 슬롯 잠금을 잡은 채 한 번에 일어납니다.
    fn start_refresh(&self) -> RefreshFuture {
        let slot = Arc::clone(&self.refresh);
        let table = Arc::clone(&self.routing_table);
        let pool = Arc::clone(&self.connection_pool);
        let rediscovery = Arc::clone(&self.rediscovery);

        let task = tokio::spawn(async move {
            let result = rediscovery
                .lookup_cluster_composition(&table, &*pool)
                .await;

            let mut slot = slot.lock();
            let outcome = match result {
                Ok(composition) => {
                    let mut table = table.lock();
                    let removed = table.update(&composition);
                    for address in &removed {
                        pool.purge(address);
                    }
                    info!("Refreshed routing information. {}", *table);
                    Ok(table.clone())
                }
                Err(e) => {
                    warn!(
                        "Failed to update routing table. Current routing table: {}. Error: {}",
                        *table.lock(),
                        e
                    );
                    Err(e)
                }
            };
            *slot = None;
            outcome
        });

        let slot = Arc::clone(&self.refresh);
        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    *slot.lock() = None;
                    Err(DriverError::internal(format!(
                        "Routing table refresh task failed: {}",
                        e
                    )))
                }
            }
        }
        .boxed()
        .shared()
    }

    /// 주소 선택과 연결 획득
    ///
    /// 재시도마다 현재 테이블의 주소 집합에서 다시 고르므로 다른 요청이 제거한
    /// 주소는 선택되지 않습니다.
    async fn acquire(&self, mode: AccessMode) -> DriverResult<Box<dyn Connection>> {
        let mut failed: Vec<ServerAddress> = Vec::new();

        loop {
            let candidates: Vec<ServerAddress> = self
                .routing_table
                .lock()
                .servers_for(mode)
                .to_array()
                .iter()
                .filter(|candidate| !failed.contains(candidate))
                .cloned()
                .collect();

            let address = match self.select_address(mode, &candidates) {
                Some(address) => address.clone(),
                None => {
                    return Err(DriverError::no_server_available(format!(
                        "Failed to obtain connection towards {} server. Known routing table is: {}",
                        mode,
                        *self.routing_table.lock()
                    )))
                }
            };

            match self.connection_pool.acquire(&address).await {
                Ok(connection) => return Ok(connection),
                Err(e) if e.is_connectivity_error() => {
                    error!(
                        "Failed to obtain a connection towards address {}: {}",
                        address, e
                    );
                    self.error_handler.on_connection_failure(&address);
                    failed.push(address);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn select_address<'a>(
        &self,
        mode: AccessMode,
        addresses: &'a [ServerAddress],
    ) -> Option<&'a ServerAddress> {
        match mode {
            AccessMode::Read => self.strategy.select_reader(addresses),
            AccessMode::Write => self.strategy.select_writer(addresses),
        }
    }
}

impl RoutingErrorHandler for LoadBalancer {
    fn on_connection_failure(&self, address: &ServerAddress) {
        LoadBalancer::on_connection_failure(self, address);
    }

    fn on_write_failure(&self, address: &ServerAddress) {
        LoadBalancer::on_write_failure(self, address);
    }
}

impl fmt::Debug for LoadBalancer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadBalancer")
            .field("initial_router", self.rediscovery.initial_router())
            .field("routing_table", &*self.routing_table.lock())
            .field("refreshing", &self.refresh.lock().is_some())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// 사용 중 장애를 라우팅 테이블과 연결 풀에 반영
struct RoutingTableErrorHandler {
    routing_table: Arc<Mutex<RoutingTable>>,
    connection_pool: Arc<dyn ConnectionPool>,
}

impl RoutingErrorHandler for RoutingTableErrorHandler {
    fn on_connection_failure(&self, address: &ServerAddress) {
        // 다른 요청이 이 주소를 고르지 않도록 테이블에서 먼저 제거
        self.routing_table.lock().forget(address);
        self.connection_pool.purge(address);
    }

    fn on_write_failure(&self, address: &ServerAddress) {
        self.routing_table.lock().remove_writer(address);
    }
}
