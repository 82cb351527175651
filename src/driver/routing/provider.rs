//! 클러스터 구성 조회
//!
//! 라우터 하나와 한 번 왕복하여 클러스터 구성을 받아오고 검증합니다.

use std::sync::Arc;

use async_trait::async_trait;

use super::super::address::ServerAddress;
use super::super::clock::Clock;
use super::super::error::{DriverError, DriverResult};
use super::super::spi::ConnectionPool;
use super::composition::ClusterComposition;
use super::procedure::{RoutingProcedureResponse, RoutingProcedureRunner};
use super::settings::RoutingContext;

/// 클러스터 구성 제공자
#[async_trait]
pub trait ClusterCompositionProvider: Send + Sync {
    /// 라우터에서 클러스터 구성 조회
    async fn get_cluster_composition(
        &self,
        pool: &dyn ConnectionPool,
        router: &ServerAddress,
    ) -> DriverResult<ClusterComposition>;
}

/// 라우팅 프로시저 기반 제공자
#[derive(Debug)]
pub struct RoutingProcedureClusterCompositionProvider {
    clock: Arc<dyn Clock>,
    runner: RoutingProcedureRunner,
}

impl RoutingProcedureClusterCompositionProvider {
    /// 새 제공자 생성
    pub fn new(clock: Arc<dyn Clock>, context: RoutingContext) -> Self {
        Self::with_runner(clock, RoutingProcedureRunner::new(context))
    }

    /// 실행기를 지정하여 생성
    pub fn with_runner(clock: Arc<dyn Clock>, runner: RoutingProcedureRunner) -> Self {
        Self { clock, runner }
    }

    fn process(&self, response: RoutingProcedureResponse) -> DriverResult<ClusterComposition> {
        let procedure = response.procedure().to_string();
        let records = response.into_result().map_err(|e| {
            DriverError::service_unavailable(format!(
                "Failed to run '{}' on server. Please make sure that there is a Zeta4G server or cluster up running: {}",
                procedure, e
            ))
        })?;

        // 정확히 레코드 하나
        let record = match records.as_slice() {
            [record] => record,
            _ => {
                return Err(DriverError::protocol(format!(
                    "Failed to parse '{}' result received from server due to records received '{}' is too few or too many.",
                    procedure,
                    records.len()
                )))
            }
        };

        let composition = ClusterComposition::parse(record, self.clock.now_millis()).map_err(|e| {
            DriverError::protocol(format!(
                "Failed to parse '{}' result received from server due to unparsable record received: {}",
                procedure, e
            ))
        })?;

        if !composition.has_routers_and_readers() {
            return Err(DriverError::protocol(format!(
                "Failed to parse '{}' result received from server due to no router or reader found in response.",
                procedure
            )));
        }

        Ok(composition)
    }
}

#[async_trait]
impl ClusterCompositionProvider for RoutingProcedureClusterCompositionProvider {
    async fn get_cluster_composition(
        &self,
        pool: &dyn ConnectionPool,
        router: &ServerAddress,
    ) -> DriverResult<ClusterComposition> {
        let connection = pool.acquire(router).await?;
        let response = self.runner.run(connection).await?;
        self.process(response)
    }
}
