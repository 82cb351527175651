//! Driver Types
//!
//! 라우팅 계층에서 사용하는 타입 정의

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DriverError;

// ============================================================================
// AccessMode - 접근 모드
// ============================================================================

/// 접근 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessMode {
    /// 읽기 (리더로 라우팅)
    #[default]
    Read,
    /// 쓰기 (라이터로 라우팅)
    Write,
}

impl AccessMode {
    /// 모드를 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessMode {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "READ" => Ok(Self::Read),
            "WRITE" => Ok(Self::Write),
            _ => Err(DriverError::configuration(format!("Mode '{}' is not supported", s))),
        }
    }
}

// ============================================================================
// Value - 프로시저 결과 값
// ============================================================================

/// 라우팅 프로시저가 주고받는 값 타입
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null
    Null,
    /// Boolean
    Boolean(bool),
    /// Integer (i64)
    Integer(i64),
    /// Float (f64)
    Float(f64),
    /// String
    String(String),
    /// List
    List(Vec<Value>),
    /// Map
    Map(HashMap<String, Value>),
}

impl Value {
    /// Integer로 변환
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// String으로 변환
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// List로 변환
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Map으로 변환
    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::List(l) => write!(f, "[{} items]", l.len()),
            Value::Map(m) => write!(f, "{{{} entries}}", m.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// ServerVersion - 서버 버전
// ============================================================================

/// 서버 에이전트 문자열(`Product/3.2.1`)에서 읽은 버전
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerVersion {
    /// 메이저
    pub major: u32,
    /// 마이너
    pub minor: u32,
    /// 패치
    pub patch: u32,
}

impl ServerVersion {
    /// 라우팅 컨텍스트를 받는 프로시저가 도입된 버전
    pub const V3_2_0: ServerVersion = ServerVersion::new(3, 2, 0);

    /// 새 버전 생성
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// 서버 에이전트 문자열 파싱
    ///
    /// `-SNAPSHOT`, `-rc1` 같은 접미사는 무시합니다.
    pub fn parse(agent: &str) -> Option<Self> {
        let version = agent.rsplit('/').next()?;
        let version = version.split(|c: char| c == '-' || c == '+').next()?;
        let mut parts = version.split('.');

        let major = parts.next()?.trim().parse().ok()?;
        let minor = parts.next()?.trim().parse().ok()?;
        let patch = match parts.next() {
            Some(p) => p.trim().parse().ok()?,
            None => 0,
        };

        Some(Self::new(major, minor, patch))
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_mode_from_str() {
        assert_eq!("READ".parse::<AccessMode>().unwrap(), AccessMode::Read);
        assert_eq!("write".parse::<AccessMode>().unwrap(), AccessMode::Write);

        let err = "ADMIN".parse::<AccessMode>().unwrap_err();
        assert!(matches!(err, DriverError::Configuration(_)));
        assert_eq!(AccessMode::Write.to_string(), "WRITE");
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Integer(300).as_int(), Some(300));
        assert_eq!(Value::from("READ").as_str(), Some("READ"));
        assert!(Value::from("x").as_int().is_none());

        let list = Value::from(vec!["a:1", "b:2"]);
        assert_eq!(list.as_list().map(|l| l.len()), Some(2));
    }

    #[test]
    fn test_value_serde_untagged() {
        let value: Value = serde_json::from_str(r#"{"ttl": 300, "db": "zeta4g"}"#).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.get("ttl"), Some(&Value::Integer(300)));
        assert_eq!(map.get("db").and_then(Value::as_str), Some("zeta4g"));
    }

    #[test]
    fn test_server_version_parse() {
        assert_eq!(ServerVersion::parse("Zeta4G/3.2.1"), Some(ServerVersion::new(3, 2, 1)));
        assert_eq!(ServerVersion::parse("Neo4j/3.1"), Some(ServerVersion::new(3, 1, 0)));
        assert_eq!(
            ServerVersion::parse("Zeta4G/5.0.0-SNAPSHOT"),
            Some(ServerVersion::new(5, 0, 0))
        );
        assert_eq!(ServerVersion::parse("Zeta4G/dev"), None);

        assert!(ServerVersion::new(3, 1, 9) < ServerVersion::V3_2_0);
        assert!(ServerVersion::new(4, 0, 0) >= ServerVersion::V3_2_0);
    }
}
