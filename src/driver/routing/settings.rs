//! 라우팅 설정
//!
//! 재탐색 재시도 횟수, 지연, 라우터 순서, 부하 분산 정책, 라우팅 컨텍스트를
//! 담는 불변 설정입니다.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::super::error::{DriverError, DriverResult};
use super::super::types::Value;
use super::policy::RoutingPolicy;

// ============================================================================
// RetryBackoff / InitialRouterOrder
// ============================================================================

/// 재탐색 패스 사이의 지연 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryBackoff {
    /// 항상 `retry_timeout_delay`
    Fixed,
    /// `max(retry_timeout_delay, 이전 지연 * 2)`
    #[default]
    Exponential,
}

/// 재탐색 시 초기 라우터를 시도하는 순서
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialRouterOrder {
    /// 알려진 라우터 먼저, 그 다음 초기 라우터
    #[default]
    KnownRoutersFirst,
    /// 초기 라우터 먼저, 그 다음 알려진 라우터
    InitialRouterFirst,
}

// ============================================================================
// RoutingContext - 라우팅 컨텍스트
// ============================================================================

/// 라우팅 프로시저에 전달되는 키-값 컨텍스트 (URI 쿼리에서 읽음)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingContext {
    context: BTreeMap<String, String>,
}

impl RoutingContext {
    /// 빈 컨텍스트
    pub fn empty() -> Self {
        Self::default()
    }

    /// URI 쿼리 파라미터에서 컨텍스트 생성
    ///
    /// `zeta4g://host:7687?policy=eu&region=west` 형식을 받습니다. 키나 값이
    /// 비어 있거나 같은 키가 두 번 나오면 `Configuration` 에러입니다.
    pub fn from_uri(uri: &str) -> DriverResult<Self> {
        let query = match uri.split_once('?') {
            Some((_, query)) => query,
            None => return Ok(Self::empty()),
        };

        let mut context = BTreeMap::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                DriverError::configuration(format!(
                    "Invalid parameters: '{}' in URI '{}'",
                    pair, uri
                ))
            })?;

            let key = key.trim();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                return Err(DriverError::configuration(format!(
                    "Illegal empty key or value in URI query '{}'",
                    uri
                )));
            }

            if context.insert(key.to_string(), value.to_string()).is_some() {
                return Err(DriverError::configuration(format!(
                    "Duplicated query parameters with key '{}' in URI '{}'",
                    key, uri
                )));
            }
        }

        Ok(Self { context })
    }

    /// 값이 하나라도 있는지 확인
    pub fn is_defined(&self) -> bool {
        !self.context.is_empty()
    }

    /// 키로 값 조회
    pub fn get(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }

    /// 프로시저 파라미터 값으로 변환
    pub fn to_value(&self) -> Value {
        let map: HashMap<String, Value> = self
            .context
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect();
        Value::Map(map)
    }
}

// ============================================================================
// RoutingSettings - 라우팅 설정
// ============================================================================

/// 라우팅 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    /// 재탐색 패스 최대 횟수
    pub max_routing_failures: u32,
    /// 패스 사이 기본 지연
    #[serde(with = "duration_millis")]
    pub retry_timeout_delay: Duration,
    /// 지연 증가 방식
    pub backoff: RetryBackoff,
    /// 초기 라우터 시도 순서
    pub initial_router_order: InitialRouterOrder,
    /// 서버 선택 정책
    pub load_balancing: RoutingPolicy,
    /// 라우팅 컨텍스트
    pub routing_context: RoutingContext,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            max_routing_failures: 1,
            retry_timeout_delay: Duration::from_secs(5),
            backoff: RetryBackoff::default(),
            initial_router_order: InitialRouterOrder::default(),
            load_balancing: RoutingPolicy::default(),
            routing_context: RoutingContext::empty(),
        }
    }
}

impl RoutingSettings {
    /// 빌더 패턴으로 설정 생성
    pub fn builder() -> RoutingSettingsBuilder {
        RoutingSettingsBuilder::default()
    }

    /// 다음 패스 전 지연 계산
    pub fn next_retry_delay(&self, previous: Duration) -> Duration {
        match self.backoff {
            RetryBackoff::Fixed => self.retry_timeout_delay,
            RetryBackoff::Exponential => self.retry_timeout_delay.max(previous.saturating_mul(2)),
        }
    }
}

/// 라우팅 설정 빌더
#[derive(Debug, Clone, Default)]
pub struct RoutingSettingsBuilder {
    settings: RoutingSettings,
}

impl RoutingSettingsBuilder {
    /// 재탐색 패스 최대 횟수 설정
    pub fn max_routing_failures(mut self, count: u32) -> Self {
        self.settings.max_routing_failures = count;
        self
    }

    /// 패스 사이 기본 지연 설정
    pub fn retry_timeout_delay(mut self, delay: Duration) -> Self {
        self.settings.retry_timeout_delay = delay;
        self
    }

    /// 지연 증가 방식 설정
    pub fn backoff(mut self, backoff: RetryBackoff) -> Self {
        self.settings.backoff = backoff;
        self
    }

    /// 초기 라우터 시도 순서 설정
    pub fn initial_router_order(mut self, order: InitialRouterOrder) -> Self {
        self.settings.initial_router_order = order;
        self
    }

    /// 서버 선택 정책 설정
    pub fn load_balancing(mut self, policy: RoutingPolicy) -> Self {
        self.settings.load_balancing = policy;
        self
    }

    /// 라우팅 컨텍스트 설정
    pub fn routing_context(mut self, context: RoutingContext) -> Self {
        self.settings.routing_context = context;
        self
    }

    /// 설정 빌드
    pub fn build(self) -> DriverResult<RoutingSettings> {
        if self.settings.max_routing_failures == 0 {
            return Err(DriverError::configuration(
                "max_routing_failures must be greater than zero",
            ));
        }
        Ok(self.settings)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
