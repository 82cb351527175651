//! Record - 프로시저 결과 레코드
//!
//! 라우팅 프로시저 결과의 단일 레코드

use std::collections::HashMap;
use std::fmt;

use super::types::Value;

// ============================================================================
// Record - 단일 레코드
// ============================================================================

/// 쿼리 결과 레코드
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// 컬럼 키
    keys: Vec<String>,
    /// 값들
    values: Vec<Value>,
    /// 키-인덱스 매핑
    key_index: HashMap<String, usize>,
}

impl Record {
    /// 새 레코드 생성
    pub fn new(keys: Vec<String>, values: Vec<Value>) -> Self {
        let key_index = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();

        Self {
            keys,
            values,
            key_index,
        }
    }

    /// 키-값 쌍에서 레코드 생성
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let (keys, values): (Vec<String>, Vec<Value>) = pairs.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Self::new(keys, values)
    }

    /// 키 목록
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// 값 목록
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// 레코드 길이
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 빈 레코드 여부
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 키로 값 가져오기
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.key_index.get(key).and_then(|&i| self.values.get(i))
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record<{{")?;
        for (i, (key, value)) in self.keys.iter().zip(&self.values).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, "}}>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_get() {
        let record = Record::from_pairs([("ttl", Value::Integer(300)), ("servers", Value::List(vec![]))]);

        assert_eq!(record.len(), 2);
        assert_eq!(record.keys(), &["ttl".to_string(), "servers".to_string()]);
        assert_eq!(record.get("ttl"), Some(&Value::Integer(300)));
        assert!(record.get("missing").is_none());
    }

    #[test]
    fn test_record_display() {
        let record = Record::from_pairs([("ttl", Value::Integer(1))]);
        assert_eq!(record.to_string(), "Record<{ttl: 1}>");
        assert!(Record::new(vec![], vec![]).is_empty());
    }
}
