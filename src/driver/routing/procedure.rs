//! 라우팅 프로시저 실행
//!
//! 라우터 하나에 연결된 상태에서 서버 버전에 맞는 라우팅 프로시저를 호출합니다.

use std::collections::HashMap;

use tracing::debug;

use super::super::error::{DriverError, DriverResult};
use super::super::record::Record;
use super::super::spi::Connection;
use super::super::types::{ServerVersion, Value};
use super::settings::RoutingContext;

/// 라우팅 컨텍스트를 받는 프로시저 (3.2 이상)
pub const GET_ROUTING_TABLE: &str = "CALL dbms.cluster.routing.getRoutingTable($context)";

/// 컨텍스트 없는 구버전 프로시저
pub const GET_SERVERS: &str = "CALL dbms.cluster.routing.getServers()";

/// 라우팅 컨텍스트 파라미터 이름
pub const ROUTING_CONTEXT_PARAM: &str = "context";

// ============================================================================
// RoutingProcedureResponse - 프로시저 응답
// ============================================================================

/// 프로시저 응답
///
/// 프로시저가 없거나 클러스터가 아닌 경우처럼 서버가 클라이언트 에러로 거절한
/// 호출은 실패 응답으로 담깁니다.
#[derive(Debug, Clone)]
pub struct RoutingProcedureResponse {
    procedure: String,
    result: Result<Vec<Record>, DriverError>,
}

impl RoutingProcedureResponse {
    /// 성공 응답
    pub fn success(procedure: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            procedure: procedure.into(),
            result: Ok(records),
        }
    }

    /// 실패 응답
    pub fn failure(procedure: impl Into<String>, error: DriverError) -> Self {
        Self {
            procedure: procedure.into(),
            result: Err(error),
        }
    }

    /// 실행한 프로시저
    pub fn procedure(&self) -> &str {
        &self.procedure
    }

    /// 성공 여부
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// 받은 레코드 (실패 응답이면 `None`)
    pub fn records(&self) -> Option<&[Record]> {
        self.result.as_deref().ok()
    }

    /// 실패 원인 (성공 응답이면 `None`)
    pub fn error(&self) -> Option<&DriverError> {
        self.result.as_ref().err()
    }

    /// 결과로 분해
    pub fn into_result(self) -> Result<Vec<Record>, DriverError> {
        self.result
    }
}

// ============================================================================
// RoutingProcedureRunner - 프로시저 실행기
// ============================================================================

/// 라우팅 프로시저 실행기
#[derive(Debug, Clone, Default)]
pub struct RoutingProcedureRunner {
    context: RoutingContext,
}

impl RoutingProcedureRunner {
    /// 새 실행기 생성
    pub fn new(context: RoutingContext) -> Self {
        Self { context }
    }

    /// 프로시저 실행 후 연결 반환
    ///
    /// 보안 에러가 아닌 클라이언트 에러는 실패 응답으로, 그 외 에러는 그대로
    /// 반환합니다.
    pub async fn run(
        &self,
        mut connection: Box<dyn Connection>,
    ) -> DriverResult<RoutingProcedureResponse> {
        let (query, parameters) = self.procedure_for(connection.server_version());
        debug!(
            "Running routing procedure '{}' on {}",
            query,
            connection.server_address()
        );

        let result = connection.run(query, parameters).await;
        let released = connection.release().await;

        match result {
            Ok(records) => {
                released?;
                Ok(RoutingProcedureResponse::success(query, records))
            }
            Err(e)
                if e.is_client_error()
                    && !e.is_security_error()
                    && !matches!(e, DriverError::Configuration(_)) =>
            {
                Ok(RoutingProcedureResponse::failure(query, e))
            }
            Err(e) => Err(e),
        }
    }

    /// 서버 버전에 맞는 쿼리와 파라미터 (버전을 모르면 최신 프로시저)
    pub fn procedure_for(
        &self,
        version: Option<ServerVersion>,
    ) -> (&'static str, HashMap<String, Value>) {
        match version {
            Some(version) if version < ServerVersion::V3_2_0 => (GET_SERVERS, HashMap::new()),
            _ => {
                let mut parameters = HashMap::new();
                parameters.insert(ROUTING_CONTEXT_PARAM.to_string(), self.context.to_value());
                (GET_ROUTING_TABLE, parameters)
            }
        }
    }
}
