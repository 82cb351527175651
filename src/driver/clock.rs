//! 시계
//!
//! 라우팅 테이블 만료 판단에 쓰이는 밀리초 단위 시계입니다.

use std::fmt;

/// 현재 시각(에포크 기준 밀리초) 제공자
pub trait Clock: Send + Sync + fmt::Debug {
    /// 현재 시각 (밀리초)
    fn now_millis(&self) -> i64;
}

/// 시스템 시계
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
pub(crate) use fake::FakeClock;
