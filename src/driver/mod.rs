//! Driver Module
//!
//! 클러스터 라우팅 드라이버 계층
//!
//! # 구성
//!
//! - 서버 주소, 접근 모드, 프로시저 결과 값 (ServerAddress, AccessMode, Value, Record)
//! - 외부 협력자 인터페이스 (ConnectionPool, Connection, DnsResolver, Clock)
//! - 라우팅 (LoadBalancer, RoutingTable, Rediscovery, LoadBalancingStrategy)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use zeta4g_routing::driver::{AccessMode, ServerAddress};
//! use zeta4g_routing::driver::routing::{LoadBalancer, RoutingSettings};
//!
//! let load_balancer = LoadBalancer::new(
//!     ServerAddress::parse("server1:7687")?,
//!     RoutingSettings::default(),
//!     Arc::new(my_pool),
//! );
//!
//! // 쓰기 연결 (라이터로 자동 라우팅)
//! let mut connection = load_balancer.acquire_connection(AccessMode::Write).await?;
//! connection.run("CREATE (n:Node)", Default::default()).await?;
//! connection.release().await?;
//!
//! load_balancer.close().await?;
//! ```

pub mod routing;
mod address;
mod clock;
mod error;
mod record;
mod resolver;
mod spi;
mod types;

// Re-exports
pub use address::{ServerAddress, DEFAULT_PORT};
pub use clock::{Clock, SystemClock};
pub use error::{DriverError, DriverResult, FORBIDDEN_ON_READ_ONLY_DATABASE, NOT_A_LEADER};
pub use record::Record;
pub use resolver::{DnsResolver, SystemDnsResolver};
pub use spi::{Connection, ConnectionPool};
pub use types::{AccessMode, ServerVersion, Value};
