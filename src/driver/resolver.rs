//! DNS 해석
//!
//! 초기 라우터 주소를 재탐색마다 다시 해석하기 위한 리졸버입니다.

use async_trait::async_trait;

use super::address::ServerAddress;
use super::error::{DriverError, DriverResult};

/// 주소 리졸버
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// 주소를 하나 이상의 주소로 해석
    async fn resolve(&self, address: &ServerAddress) -> DriverResult<Vec<ServerAddress>>;
}

/// `tokio::net::lookup_host` 기반 시스템 리졸버
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDnsResolver;

#[async_trait]
impl DnsResolver for SystemDnsResolver {
    async fn resolve(&self, address: &ServerAddress) -> DriverResult<Vec<ServerAddress>> {
        let resolved = tokio::net::lookup_host(address.to_socket_addr())
            .await
            .map_err(|e| {
                DriverError::service_unavailable(format!("Failed to resolve '{}': {}", address, e))
            })?;

        let mut addresses: Vec<ServerAddress> = Vec::new();
        for socket in resolved {
            let candidate = ServerAddress::from(socket);
            if !addresses.contains(&candidate) {
                addresses.push(candidate);
            }
        }

        if addresses.is_empty() {
            return Err(DriverError::service_unavailable(format!(
                "No addresses found for '{}'",
                address
            )));
        }

        Ok(addresses)
    }
}
