//! # Zeta4G Routing
//!
//! Client-side cluster routing and load balancing for the
//! [Zeta4G](https://github.com/zeta9044/zeta4g) Bolt driver.
//!
//! ## Features
//!
//! - **Routing table** - Per-role server lists (routers, readers, writers) with TTL-based expiry
//! - **Rediscovery** - Known routers and initial router fallback with bounded, backed-off retry passes
//! - **Single-flight refresh** - Concurrent callers share one in-flight routing table refresh
//! - **Load balancing** - Least-connected, round-robin and random server selection
//! - **Failure handling** - Unreachable servers are forgotten and the next candidate is tried
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! zeta4g-routing = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! ## Basic Usage
//!
//! The load balancer sits on top of a connection pool supplied by the
//! application through the [`ConnectionPool`] trait:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use zeta4g_routing::{AccessMode, LoadBalancer, RoutingSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = Arc::new(MyBoltPool::new());
//!
//!     // Routing context is read from the URI query
//!     let load_balancer = LoadBalancer::from_uri(
//!         "zeta4g://server1:7687?region=eu",
//!         RoutingSettings::default(),
//!         pool,
//!     )?;
//!
//!     // Reads go to readers, writes to writers
//!     let mut connection = load_balancer.acquire_connection(AccessMode::Write).await?;
//!     connection.run("CREATE (n:Node)", Default::default()).await?;
//!     connection.release().await?;
//!
//!     load_balancer.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Customize rediscovery and selection with [`RoutingSettings`]:
//!
//! ```rust
//! use std::time::Duration;
//! use zeta4g_routing::{InitialRouterOrder, RetryBackoff, RoutingPolicy, RoutingSettings};
//!
//! let settings = RoutingSettings::builder()
//!     .max_routing_failures(3)
//!     .retry_timeout_delay(Duration::from_millis(500))
//!     .backoff(RetryBackoff::Exponential)
//!     .initial_router_order(InitialRouterOrder::KnownRoutersFirst)
//!     .load_balancing(RoutingPolicy::LeastConnected)
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`DriverResult`]. Connectivity failures are handled
//! internally by forgetting the server and retrying; everything else is
//! surfaced:
//!
//! ```rust,ignore
//! # use zeta4g_routing::{AccessMode, DriverError};
//! match load_balancer.acquire_connection(AccessMode::Read).await {
//!     Ok(connection) => println!("Connected to {}", connection.server_address()),
//!     Err(DriverError::NoServerAvailable(msg)) => eprintln!("No server: {}", msg),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```
//!
//! ## Modules
//!
//! - [`driver`] - Addresses, values, collaborator traits and errors
//! - [`driver::routing`] - Routing table, rediscovery and load balancer
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod driver;

// Re-exports for convenience
pub use driver::{
    AccessMode, Clock, Connection, ConnectionPool, DnsResolver, DriverError, DriverResult,
    Record, ServerAddress, ServerVersion, SystemClock, SystemDnsResolver, Value,
};

pub use driver::routing::{
    ClusterComposition, InitialRouterOrder, LoadBalancer, LoadBalancingStrategy, RetryBackoff,
    RoutingConnection, RoutingContext, RoutingPolicy, RoutingSettings, RoutingTable,
};
