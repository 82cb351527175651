//! Driver Error Types
//!
//! 라우팅 드라이버 에러 정의

use std::io;
use std::sync::Arc;

use thiserror::Error;

// ============================================================================
// DriverError - 드라이버 에러
// ============================================================================

/// 드라이버 에러
///
/// 하나의 라우팅 테이블 갱신 결과를 여러 대기자에게 그대로 전달해야 하므로
/// `Clone`을 구현합니다.
#[derive(Error, Debug, Clone)]
pub enum DriverError {
    /// 연결 에러 (서버 도달 불가, 연결 리셋)
    #[error("Connection error: {0}")]
    Connection(String),

    /// 인증 에러
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// 프로토콜 에러 (잘못된 응답 형식)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// 세션 에러
    #[error("Session error: {0}")]
    Session(String),

    /// 세션 만료 (사용 중 서버가 역할을 잃음)
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// 타임아웃 에러
    #[error("Timeout: {0}")]
    Timeout(String),

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 서버 에러
    #[error("Server error: {code} - {message}")]
    Server { code: String, message: String },

    /// 서비스 불가
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// 사용 가능한 서버 없음
    #[error("No server available: {0}")]
    NoServerAvailable(String),

    /// I/O 에러
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    /// 내부 에러
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DriverError {
    /// 연결 에러 생성
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// 인증 에러 생성
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// 프로토콜 에러 생성
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// 세션 에러 생성
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// 세션 만료 에러 생성
    pub fn session_expired(msg: impl Into<String>) -> Self {
        Self::SessionExpired(msg.into())
    }

    /// 타임아웃 에러 생성
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// 설정 에러 생성
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// 서비스 불가 에러 생성
    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    /// 사용 가능한 서버 없음 에러 생성
    pub fn no_server_available(msg: impl Into<String>) -> Self {
        Self::NoServerAvailable(msg.into())
    }

    /// 서버 에러 생성
    pub fn server(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Server {
            code: code.into(),
            message: message.into(),
        }
    }

    /// 내부 에러 생성
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 서버 에러 코드 (서버 에러인 경우)
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Server { code, .. } => Some(code),
            _ => None,
        }
    }

    /// 재시도 가능 여부
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_)
            | Self::Timeout(_)
            | Self::ServiceUnavailable(_)
            | Self::SessionExpired(_)
            | Self::NoServerAvailable(_)
            | Self::Io(_) => true,
            Self::Server { code, .. } => is_retryable_code(code),
            _ => false,
        }
    }

    /// 연결 계열 에러 여부
    ///
    /// 해당 주소가 다운된 것으로 간주하고 라우팅 테이블에서 제거해야 하는
    /// 에러입니다. 획득 타임아웃은 서버가 아니라 풀의 포화를 의미하므로 제외합니다.
    pub fn is_connectivity_error(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::ServiceUnavailable(_) | Self::Io(_)
        )
    }

    /// 보안(인증/권한) 에러 여부
    pub fn is_security_error(&self) -> bool {
        match self {
            Self::Authentication(_) => true,
            Self::Server { code, .. } => is_security_code(code),
            _ => false,
        }
    }

    /// 클라이언트 에러 여부
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Authentication(_) | Self::Configuration(_) => true,
            Self::Server { code, .. } => code.starts_with("Neo.ClientError"),
            _ => false,
        }
    }

    /// 쓰기 거부 에러 여부 (리더가 아니거나 읽기 전용 데이터베이스)
    pub fn is_write_rejection(&self) -> bool {
        matches!(
            self.code(),
            Some(NOT_A_LEADER) | Some(FORBIDDEN_ON_READ_ONLY_DATABASE)
        )
    }
}

impl From<io::Error> for DriverError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

/// 리더가 아닌 서버에 쓰기 시도
pub const NOT_A_LEADER: &str = "Neo.ClientError.Cluster.NotALeader";

/// 읽기 전용 데이터베이스에 쓰기 시도
pub const FORBIDDEN_ON_READ_ONLY_DATABASE: &str =
    "Neo.ClientError.General.ForbiddenOnReadOnlyDatabase";

/// 재시도 가능한 에러 코드 확인
fn is_retryable_code(code: &str) -> bool {
    code.starts_with("Neo.TransientError")
        || code == NOT_A_LEADER
        || code == FORBIDDEN_ON_READ_ONLY_DATABASE
}

/// 보안 에러 코드 확인
fn is_security_code(code: &str) -> bool {
    code.starts_with("Neo.ClientError.Security")
}

// ============================================================================
// Result Type
// ============================================================================

/// 드라이버 결과 타입
pub type DriverResult<T> = Result<T, DriverError>;

// ============================================================================
// Tests
// ============================================================================
