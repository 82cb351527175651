//! 재탐색
//!
//! 알려진 라우터와 초기 라우터를 차례로 시도하여 새 클러스터 구성을 얻습니다.
//!
//! 한 패스는 후보 라우터 전체를 한 번씩 시도합니다. 패스가 모두 실패하면
//! 설정된 지연 후 다음 패스를 시작하고, `max_routing_failures`번 실패하면
//! 포기합니다.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::super::address::ServerAddress;
use super::super::error::{DriverError, DriverResult};
use super::super::resolver::DnsResolver;
use super::super::spi::ConnectionPool;
use super::composition::ClusterComposition;
use super::provider::ClusterCompositionProvider;
use super::settings::{InitialRouterOrder, RoutingSettings};
use super::table::RoutingTable;

/// 재탐색기
pub struct Rediscovery {
    initial_router: ServerAddress,
    settings: RoutingSettings,
    provider: Arc<dyn ClusterCompositionProvider>,
    resolver: Arc<dyn DnsResolver>,
    /// 직전 구성에 라이터가 없었으면 다음 조회는 초기 라우터부터
    use_initial_router: AtomicBool,
}

impl Rediscovery {
    /// 새 재탐색기 생성
    pub fn new(
        initial_router: ServerAddress,
        settings: RoutingSettings,
        provider: Arc<dyn ClusterCompositionProvider>,
        resolver: Arc<dyn DnsResolver>,
    ) -> Self {
        Self {
            initial_router,
            settings,
            provider,
            resolver,
            use_initial_router: AtomicBool::new(false),
        }
    }

    /// 초기 라우터 주소
    pub fn initial_router(&self) -> &ServerAddress {
        &self.initial_router
    }

    /// 새 클러스터 구성 조회
    ///
    /// 실패한 라우터는 테이블에서 제거됩니다. 프로토콜, 보안, 설정 에러는 즉시
    /// 반환하고, 모든 패스가 실패하면 시도한 주소를 담은 `NoServerAvailable`을
    /// 반환합니다.
    pub async fn lookup_cluster_composition(
        &self,
        table: &Mutex<RoutingTable>,
        pool: &dyn ConnectionPool,
    ) -> DriverResult<ClusterComposition> {
        let max_failures = self.settings.max_routing_failures.max(1);
        let mut delay = Duration::ZERO;
        let mut tried = Vec::new();

        for attempt in 1..=max_failures {
            if let Some(composition) = self.lookup(table, pool, &mut tried).await? {
                return Ok(composition);
            }

            if attempt < max_failures {
                delay = self.settings.next_retry_delay(delay);
                info!(
                    "Unable to fetch new routing table, will try again in {}ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
        }

        let tried: Vec<String> = tried.iter().map(ToString::to_string).collect();
        Err(DriverError::no_server_available(format!(
            "Could not perform discovery. No routing servers available. Tried: [{}]",
            tried.join(", ")
        )))
    }

    /// 한 패스
    async fn lookup(
        &self,
        table: &Mutex<RoutingTable>,
        pool: &dyn ConnectionPool,
        tried: &mut Vec<ServerAddress>,
    ) -> DriverResult<Option<ClusterComposition>> {
        let initial_first = self.settings.initial_router_order == InitialRouterOrder::InitialRouterFirst
            || self.use_initial_router.load(Ordering::Acquire);

        let composition = if initial_first {
            self.lookup_on_initial_router_then_known_routers(table, pool, tried)
                .await?
        } else {
            self.lookup_on_known_routers_then_initial_router(table, pool, tried)
                .await?
        };

        if let Some(composition) = &composition {
            if !composition.has_writers() {
                debug!("Received routing table without writers, will query the initial router next time");
            }
            self.use_initial_router
                .store(!composition.has_writers(), Ordering::Release);
        }

        Ok(composition)
    }

    async fn lookup_on_known_routers_then_initial_router(
        &self,
        table: &Mutex<RoutingTable>,
        pool: &dyn ConnectionPool,
        tried: &mut Vec<ServerAddress>,
    ) -> DriverResult<Option<ClusterComposition>> {
        let mut seen = HashSet::new();
        if let Some(composition) = self
            .lookup_on_known_routers(table, pool, &mut seen, tried)
            .await?
        {
            return Ok(Some(composition));
        }

        self.lookup_on_initial_router(table, pool, &seen, tried)
            .await
    }

    async fn lookup_on_initial_router_then_known_routers(
        &self,
        table: &Mutex<RoutingTable>,
        pool: &dyn ConnectionPool,
        tried: &mut Vec<ServerAddress>,
    ) -> DriverResult<Option<ClusterComposition>> {
        if let Some(composition) = self
            .lookup_on_initial_router(table, pool, &HashSet::new(), tried)
            .await?
        {
            return Ok(Some(composition));
        }

        self.lookup_on_known_routers(table, pool, &mut HashSet::new(), tried)
            .await
    }

    async fn lookup_on_known_routers(
        &self,
        table: &Mutex<RoutingTable>,
        pool: &dyn ConnectionPool,
        seen: &mut HashSet<ServerAddress>,
        tried: &mut Vec<ServerAddress>,
    ) -> DriverResult<Option<ClusterComposition>> {
        let routers = table.lock().routers().to_array();

        for router in routers.iter() {
            seen.insert(router.clone());
            if let Some(composition) = self.lookup_on_router(router, table, pool, tried).await? {
                return Ok(Some(composition));
            }
        }

        Ok(None)
    }

    async fn lookup_on_initial_router(
        &self,
        table: &Mutex<RoutingTable>,
        pool: &dyn ConnectionPool,
        seen: &HashSet<ServerAddress>,
        tried: &mut Vec<ServerAddress>,
    ) -> DriverResult<Option<ClusterComposition>> {
        let mut addresses = match self.resolver.resolve(&self.initial_router).await {
            Ok(addresses) => addresses,
            Err(e) => {
                error!(
                    "Failed to resolve address '{}' to IPs due to error: {}",
                    self.initial_router, e
                );
                vec![self.initial_router.clone()]
            }
        };
        addresses.retain(|address| !seen.contains(address));

        for address in &addresses {
            if let Some(composition) = self.lookup_on_router(address, table, pool, tried).await? {
                return Ok(Some(composition));
            }
        }

        Ok(None)
    }

    async fn lookup_on_router(
        &self,
        router: &ServerAddress,
        table: &Mutex<RoutingTable>,
        pool: &dyn ConnectionPool,
        tried: &mut Vec<ServerAddress>,
    ) -> DriverResult<Option<ClusterComposition>> {
        if !tried.contains(router) {
            tried.push(router.clone());
        }

        match self.provider.get_cluster_composition(pool, router).await {
            Ok(composition) => Ok(Some(composition)),
            Err(e) if is_fatal(&e) => {
                error!(
                    "Failed to update routing table with server '{}': {}",
                    router, e
                );
                Err(e)
            }
            Err(e) => {
                warn!(
                    "Failed to update routing table with server '{}': {}",
                    router, e
                );
                table.lock().forget(router);
                Ok(None)
            }
        }
    }
}

/// 다른 라우터로 넘어가지 않고 즉시 중단할 에러
fn is_fatal(error: &DriverError) -> bool {
    matches!(
        error,
        DriverError::Protocol(_) | DriverError::Configuration(_)
    ) || error.is_security_error()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::super::super::clock::FakeClock;
    use super::super::settings::RetryBackoff;
    use super::super::test_support::{addr, composition, FakePool, FakeProvider, FakeResolver};
    use super::*;

    struct Fixture {
        rediscovery: Rediscovery,
        provider: Arc<FakeProvider>,
        resolver: Arc<FakeResolver>,
        table: Mutex<RoutingTable>,
        pool: FakePool,
    }

    fn fixture(settings: RoutingSettings, known_routers: &[&str]) -> Fixture {
        let provider = Arc::new(FakeProvider::new());
        let resolver = Arc::new(FakeResolver::new());
        let rediscovery = Rediscovery::new(
            addr("seed"),
            settings,
            provider.clone(),
            resolver.clone(),
        );
        let table = RoutingTable::with_clock(
            known_routers.iter().map(|h| addr(h)),
            Arc::new(FakeClock::new(0)),
        );

        Fixture {
            rediscovery,
            provider,
            resolver,
            table: Mutex::new(table),
            pool: FakePool::new(),
        }
    }

    fn valid() -> ClusterComposition {
        composition(10_000, &["r1"], &["w1"], &["x1"])
    }

    fn writerless() -> ClusterComposition {
        composition(10_000, &["r1"], &[], &["x1"])
    }

    impl Fixture {
        async fn lookup(&self) -> DriverResult<ClusterComposition> {
            self.rediscovery
                .lookup_cluster_composition(&self.table, &self.pool)
                .await
        }
    }

    #[tokio::test]
    async fn test_first_known_router_succeeds() {
        let f = fixture(RoutingSettings::default(), &["a", "b"]);
        f.provider.respond(&addr("a"), Ok(valid()));

        let composition = f.lookup().await.unwrap();

        assert_eq!(composition, valid());
        assert_eq!(f.provider.calls(), vec![addr("a")]);
        assert_eq!(f.resolver.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_router_forgotten_and_next_tried() {
        let f = fixture(RoutingSettings::default(), &["a", "b"]);
        f.provider.respond(&addr("a"), Err(DriverError::service_unavailable("down")));
        f.provider.respond(&addr("b"), Ok(valid()));

        f.lookup().await.unwrap();

        assert_eq!(f.provider.calls(), vec![addr("a"), addr("b")]);
        let table = f.table.lock();
        assert!(!table.routers().contains(&addr("a")));
        assert!(table.routers().contains(&addr("b")));
    }

    #[tokio::test]
    async fn test_falls_back_to_initial_router() {
        let f = fixture(RoutingSettings::default(), &["a"]);
        f.provider.respond(&addr("a"), Err(DriverError::connection("refused")));
        f.provider.respond(&addr("seed"), Ok(valid()));

        f.lookup().await.unwrap();

        assert_eq!(f.provider.calls(), vec![addr("a"), addr("seed")]);
        assert_eq!(f.resolver.calls(), 1);
    }

    #[tokio::test]
    async fn test_initial_router_skipped_when_already_tried() {
        let f = fixture(RoutingSettings::default(), &["seed"]);
        f.provider.respond(&addr("seed"), Err(DriverError::connection("refused")));

        let err = f.lookup().await.unwrap_err();

        assert!(matches!(err, DriverError::NoServerAvailable(_)));
        // 알려진 라우터로 이미 시도한 초기 라우터는 다시 시도하지 않음
        assert_eq!(f.provider.calls(), vec![addr("seed")]);
    }

    #[tokio::test]
    async fn test_resolved_initial_router_addresses_tried_in_order() {
        let f = fixture(RoutingSettings::default(), &[]);
        f.resolver
            .respond(&addr("seed"), Ok(vec![addr("10.0.0.1"), addr("10.0.0.2")]));
        f.provider
            .respond(&addr("10.0.0.1"), Err(DriverError::connection("refused")));
        f.provider.respond(&addr("10.0.0.2"), Ok(valid()));

        f.lookup().await.unwrap();

        assert_eq!(f.provider.calls(), vec![addr("10.0.0.1"), addr("10.0.0.2")]);
    }

    #[tokio::test]
    async fn test_dns_failure_uses_unresolved_initial_router() {
        let f = fixture(RoutingSettings::default(), &[]);
        f.resolver
            .respond(&addr("seed"), Err(DriverError::service_unavailable("no dns")));
        f.provider.respond(&addr("seed"), Ok(valid()));

        f.lookup().await.unwrap();

        assert_eq!(f.provider.calls(), vec![addr("seed")]);
    }

    #[tokio::test]
    async fn test_initial_router_first_order() {
        let settings = RoutingSettings::builder()
            .initial_router_order(InitialRouterOrder::InitialRouterFirst)
            .build()
            .unwrap();
        let f = fixture(settings, &["a"]);
        f.provider.respond(&addr("seed"), Err(DriverError::connection("refused")));
        f.provider.respond(&addr("a"), Ok(valid()));

        f.lookup().await.unwrap();

        assert_eq!(f.provider.calls(), vec![addr("seed"), addr("a")]);
    }

    #[tokio::test]
    async fn test_writerless_composition_prefers_initial_router_next() {
        let f = fixture(RoutingSettings::default(), &["a"]);
        f.provider.respond(&addr("a"), Ok(writerless()));
        f.provider.respond(&addr("seed"), Ok(valid()));

        let first = f.lookup().await.unwrap();
        assert!(!first.has_writers());
        assert_eq!(f.provider.calls(), vec![addr("a")]);

        let second = f.lookup().await.unwrap();
        assert!(second.has_writers());
        assert_eq!(f.provider.calls(), vec![addr("a"), addr("seed")]);

        // 라이터를 받은 뒤에는 다시 알려진 라우터부터
        f.lookup().await.unwrap();
        assert_eq!(f.provider.calls(), vec![addr("a"), addr("seed"), addr("a")]);
    }

    #[tokio::test]
    async fn test_protocol_error_aborts() {
        let f = fixture(RoutingSettings::default(), &["a", "b"]);
        f.provider.respond(&addr("a"), Err(DriverError::protocol("bad record")));
        f.provider.respond(&addr("b"), Ok(valid()));

        let err = f.lookup().await.unwrap_err();

        assert!(matches!(err, DriverError::Protocol(_)));
        assert_eq!(f.provider.calls(), vec![addr("a")]);
        // 중단된 라우터는 제거하지 않음
        assert!(f.table.lock().routers().contains(&addr("a")));
    }

    #[tokio::test]
    async fn test_security_error_aborts() {
        let f = fixture(RoutingSettings::default(), &["a", "b"]);
        f.provider
            .respond(&addr("a"), Err(DriverError::authentication("bad credentials")));
        f.provider.respond(&addr("b"), Ok(valid()));

        let err = f.lookup().await.unwrap_err();

        assert!(matches!(err, DriverError::Authentication(_)));
        assert_eq!(f.provider.calls(), vec![addr("a")]);
    }

    #[tokio::test]
    async fn test_exhaustion_names_tried_addresses() {
        let f = fixture(RoutingSettings::default(), &["a", "b"]);
        f.provider.respond(&addr("a"), Err(DriverError::connection("refused")));
        f.provider.respond(&addr("b"), Err(DriverError::connection("refused")));
        f.provider.respond(&addr("seed"), Err(DriverError::connection("refused")));

        let err = f.lookup().await.unwrap_err();

        assert!(matches!(err, DriverError::NoServerAvailable(_)));
        let message = err.to_string();
        assert!(message.contains("Could not perform discovery"));
        assert!(message.contains("a:7687"));
        assert!(message.contains("b:7687"));
        assert!(message.contains("seed:7687"));
        assert!(f.table.lock().routers().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_passes_with_exponential_backoff() {
        let settings = RoutingSettings::builder()
            .max_routing_failures(3)
            .retry_timeout_delay(Duration::from_millis(100))
            .build()
            .unwrap();
        let f = fixture(settings, &[]);
        f.provider.respond(&addr("seed"), Err(DriverError::connection("refused")));

        let started = tokio::time::Instant::now();
        let err = f.lookup().await.unwrap_err();

        assert!(matches!(err, DriverError::NoServerAvailable(_)));
        assert_eq!(f.provider.calls().len(), 3);
        // 100ms + 200ms, 마지막 패스 뒤에는 대기하지 않음
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_passes_with_fixed_backoff() {
        let settings = RoutingSettings::builder()
            .max_routing_failures(3)
            .retry_timeout_delay(Duration::from_millis(100))
            .backoff(RetryBackoff::Fixed)
            .build()
            .unwrap();
        let f = fixture(settings, &[]);
        f.provider.respond(&addr("seed"), Err(DriverError::connection("refused")));

        let started = tokio::time::Instant::now();
        f.lookup().await.unwrap_err();

        assert_eq!(started.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_pass_succeeds() {
        let settings = RoutingSettings::builder()
            .max_routing_failures(2)
            .retry_timeout_delay(Duration::from_millis(50))
            .build()
            .unwrap();
        let f = fixture(settings, &[]);
        f.provider.respond(&addr("seed"), Err(DriverError::connection("refused")));
        f.provider.respond(&addr("seed"), Ok(valid()));

        let composition = f.lookup().await.unwrap();

        assert_eq!(composition, valid());
        assert_eq!(f.provider.calls(), vec![addr("seed"), addr("seed")]);
    }
}
