//! JSON-RPC transport: per-endpoint clients and the failover pool.

pub mod client;
pub mod pool;

pub use client::{HttpRpcClient, RpcClientConfig};
pub use pool::EndpointPool;
