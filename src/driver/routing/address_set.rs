//! 주소 집합
//!
//! 순서를 보존하는 중복 없는 서버 주소 목록입니다.
//!
//! 내용은 `Arc<[ServerAddress]>` 스냅샷으로 보관되며, 변경은 항상 새 스냅샷을
//! 만들어 교체합니다. 따라서 [`AddressSet::to_array`]로 얻은 스냅샷은 이후의
//! 변경과 무관하게 일관된 시점의 내용을 유지합니다.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::super::address::ServerAddress;

/// 주소 집합
#[derive(Clone)]
pub struct AddressSet {
    addresses: Arc<[ServerAddress]>,
}

impl AddressSet {
    /// 빈 집합 생성
    pub fn new() -> Self {
        Self {
            addresses: Arc::from(Vec::new()),
        }
    }

    /// 현재 내용의 스냅샷
    pub fn to_array(&self) -> Arc<[ServerAddress]> {
        Arc::clone(&self.addresses)
    }

    /// 주소 수
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// 비어 있는지 확인
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// 주소 포함 여부
    pub fn contains(&self, address: &ServerAddress) -> bool {
        self.addresses.contains(address)
    }

    /// 새 주소 목록으로 교체
    ///
    /// 기존에 있던 주소는 상대 순서를 유지하고, 새 주소는 주어진 순서대로 뒤에
    /// 붙습니다. 기존에 있었지만 새 목록에 없는 주소는 `removed`에 추가됩니다.
    pub fn update<I>(&mut self, addresses: I, removed: &mut HashSet<ServerAddress>)
    where
        I: IntoIterator<Item = ServerAddress>,
    {
        let mut incoming = Vec::new();
        let mut pending = HashSet::new();
        for address in addresses {
            if pending.insert(address.clone()) {
                incoming.push(address);
            }
        }

        let mut next = Vec::with_capacity(incoming.len());
        for existing in self.addresses.iter() {
            if pending.remove(existing) {
                next.push(existing.clone());
            } else {
                removed.insert(existing.clone());
            }
        }

        // pending에 남은 것이 새로 추가된 주소
        next.extend(incoming.into_iter().filter(|a| pending.contains(a)));

        if next.as_slice() != &*self.addresses {
            self.addresses = Arc::from(next);
        }
    }

    /// 주소 하나 제거
    pub fn remove(&mut self, address: &ServerAddress) -> bool {
        if !self.contains(address) {
            return false;
        }

        let next: Vec<ServerAddress> = self
            .addresses
            .iter()
            .filter(|a| *a != address)
            .cloned()
            .collect();
        self.addresses = Arc::from(next);
        true
    }
}

impl Default for AddressSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<ServerAddress> for AddressSet {
    fn from_iter<T: IntoIterator<Item = ServerAddress>>(iter: T) -> Self {
        let mut set = Self::new();
        set.update(iter, &mut HashSet::new());
        set
    }
}

impl fmt::Debug for AddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.addresses.iter()).finish()
    }
}

impl fmt::Display for AddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, address) in self.addresses.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", address)?;
        }
        write!(f, "]")
    }
}
