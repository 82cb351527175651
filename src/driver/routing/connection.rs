//! 라우팅 연결
//!
//! 사용 중 발생한 에러를 해석하여 라우팅 테이블에 반영하는 연결 래퍼입니다.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::super::address::ServerAddress;
use super::super::error::{DriverError, DriverResult};
use super::super::record::Record;
use super::super::spi::Connection;
use super::super::types::{AccessMode, ServerVersion, Value};

/// 사용 중 장애 통지 대상
pub trait RoutingErrorHandler: Send + Sync {
    /// 서버에 도달할 수 없음 (모든 역할에서 제거)
    fn on_connection_failure(&self, address: &ServerAddress);

    /// 서버가 더 이상 쓰기를 받지 않음 (라이터에서만 제거)
    fn on_write_failure(&self, address: &ServerAddress);
}

/// 라우팅 연결
pub struct RoutingConnection {
    delegate: Box<dyn Connection>,
    access_mode: AccessMode,
    error_handler: Arc<dyn RoutingErrorHandler>,
}

impl RoutingConnection {
    /// 연결 감싸기
    pub fn new(
        delegate: Box<dyn Connection>,
        access_mode: AccessMode,
        error_handler: Arc<dyn RoutingErrorHandler>,
    ) -> Self {
        Self {
            delegate,
            access_mode,
            error_handler,
        }
    }

    /// 연결을 얻을 때의 접근 모드
    pub fn access_mode(&self) -> AccessMode {
        self.access_mode
    }

    fn handle_error(&self, error: DriverError) -> DriverError {
        let address = self.delegate.server_address();

        if error.is_connectivity_error() {
            self.error_handler.on_connection_failure(address);
            return DriverError::session_expired(format!(
                "Server at {} is no longer available: {}",
                address, error
            ));
        }

        if error.is_write_rejection() {
            return match self.access_mode {
                AccessMode::Read => DriverError::server(
                    error.code().unwrap_or_default(),
                    "Write queries cannot be performed in READ access mode.",
                ),
                AccessMode::Write => {
                    self.error_handler.on_write_failure(address);
                    DriverError::session_expired(format!(
                        "Server at {} no longer accepts writes",
                        address
                    ))
                }
            };
        }

        error
    }
}

impl fmt::Debug for RoutingConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingConnection")
            .field("server_address", self.delegate.server_address())
            .field("access_mode", &self.access_mode)
            .finish()
    }
}

#[async_trait]
impl Connection for RoutingConnection {
    fn server_address(&self) -> &ServerAddress {
        self.delegate.server_address()
    }

    fn server_version(&self) -> Option<ServerVersion> {
        self.delegate.server_version()
    }

    async fn run(
        &mut self,
        query: &str,
        parameters: HashMap<String, Value>,
    ) -> DriverResult<Vec<Record>> {
        match self.delegate.run(query, parameters).await {
            Ok(records) => Ok(records),
            Err(e) => Err(self.handle_error(e)),
        }
    }

    async fn release(&mut self) -> DriverResult<()> {
        match self.delegate.release().await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.handle_error(e)),
        }
    }
}
