//! 라우팅 모듈
//!
//! 클러스터 환경에서 읽기/쓰기 요청을 알맞은 서버로 보냅니다.
//!
//! # 개요
//!
//! 로드 밸런서는 `zeta4g://` 스킴의 초기 라우터에서 출발하여 클러스터 구성을
//! 조회하고, 읽기는 리더로, 쓰기는 라이터로 보냅니다. 라우팅 테이블이 만료되면
//! 한 번의 재탐색으로 갱신하며, 도달할 수 없는 서버는 테이블에서 제거한 뒤
//! 다른 서버로 재시도합니다.
//!
//! # 예시
//!
//! ```ignore
//! use std::sync::Arc;
//! use zeta4g_routing::driver::routing::{LoadBalancer, RoutingSettings};
//! use zeta4g_routing::driver::AccessMode;
//!
//! let load_balancer = LoadBalancer::from_uri(
//!     "zeta4g://server1:7687?region=eu",
//!     RoutingSettings::default(),
//!     Arc::new(my_pool),
//! )?;
//!
//! // 읽기 연결 (리더로 라우팅)
//! let connection = load_balancer.acquire_connection(AccessMode::Read).await?;
//!
//! load_balancer.close().await?;
//! ```

mod address_set;
mod composition;
mod connection;
mod load_balancer;
mod policy;
mod procedure;
mod provider;
mod rediscovery;
mod settings;
mod table;

#[cfg(test)]
mod test_support;

pub use address_set::AddressSet;
pub use composition::ClusterComposition;
pub use connection::{RoutingConnection, RoutingErrorHandler};
pub use load_balancer::{is_routing_uri, LoadBalancer};
pub use policy::{
    LeastConnectedLoadBalancingStrategy, LoadBalancingStrategy, RandomLoadBalancingStrategy,
    RoundRobinArrayIndex, RoundRobinLoadBalancingStrategy, RoutingPolicy,
};
pub use procedure::{
    RoutingProcedureResponse, RoutingProcedureRunner, GET_ROUTING_TABLE, GET_SERVERS,
    ROUTING_CONTEXT_PARAM,
};
pub use provider::{ClusterCompositionProvider, RoutingProcedureClusterCompositionProvider};
pub use rediscovery::Rediscovery;
pub use settings::{
    InitialRouterOrder, RetryBackoff, RoutingContext, RoutingSettings, RoutingSettingsBuilder,
};
pub use table::{RoutingTable, ServerRole};
