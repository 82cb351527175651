//! 외부 협력자 인터페이스
//!
//! 라우팅 계층은 물리 연결 풀과 Bolt 연결을 직접 구현하지 않고 아래 트레이트를
//! 통해서만 사용합니다.

use std::collections::HashMap;

use async_trait::async_trait;

use super::address::ServerAddress;
use super::error::DriverResult;
use super::record::Record;
use super::types::{ServerVersion, Value};

/// 단일 서버에 대한 논리 연결
#[async_trait]
pub trait Connection: Send {
    /// 연결된 서버 주소
    fn server_address(&self) -> &ServerAddress;

    /// 서버 버전 (HELLO 응답의 에이전트에서 읽음, 모르면 `None`)
    fn server_version(&self) -> Option<ServerVersion>;

    /// 쿼리를 실행하고 모든 레코드를 받음
    async fn run(
        &mut self,
        query: &str,
        parameters: HashMap<String, Value>,
    ) -> DriverResult<Vec<Record>>;

    /// 연결을 풀로 반환
    async fn release(&mut self) -> DriverResult<()>;
}

/// 주소별 연결 풀
#[async_trait]
pub trait ConnectionPool: Send + Sync {
    /// 해당 주소로 연결 획득
    ///
    /// 서버에 도달할 수 없으면 연결 계열 에러
    /// ([`DriverError::is_connectivity_error`](super::DriverError::is_connectivity_error))를 반환해야 합니다.
    async fn acquire(&self, address: &ServerAddress) -> DriverResult<Box<dyn Connection>>;

    /// 해당 주소의 모든 연결 폐기
    fn purge(&self, address: &ServerAddress);

    /// 해당 주소의 사용 중인 연결 수
    fn active_connections(&self, address: &ServerAddress) -> usize;

    /// 풀 닫기
    async fn close(&self) -> DriverResult<()>;
}
