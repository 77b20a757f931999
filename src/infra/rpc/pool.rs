//! Ordered endpoint failover.
//!
//! The pool walks the configured endpoints in priority order. Rate-limited
//! calls back off and retry the same endpoint within policy bounds; network
//! errors and timeouts fail over immediately. Total underlying calls per
//! `execute` are bounded by `endpoints * max_retries_per_endpoint`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::domain::{AppError, NodeClient, RpcError, RpcFailure};
use crate::infra::retry::{RequestPacer, RetryDecision, RetryPolicy};
use crate::infra::rpc::client::{HttpRpcClient, RpcClientConfig};

/// Priority-ordered pool of per-endpoint clients
pub struct EndpointPool {
    clients: Vec<Arc<dyn NodeClient>>,
    policy: RetryPolicy,
    pacer: RequestPacer,
}

impl EndpointPool {
    /// Build one HTTP client per configured endpoint.
    pub fn new(config: &EngineConfig) -> Result<Self, AppError> {
        if config.endpoints.is_empty() {
            return Err(crate::domain::ConfigError::NoEndpoints.into());
        }

        let client_config = RpcClientConfig {
            request_timeout: config.request_timeout,
            commitment: config.commitment,
        };

        let mut clients: Vec<Arc<dyn NodeClient>> = Vec::with_capacity(config.endpoints.len());
        for endpoint in &config.endpoints {
            let client = HttpRpcClient::new(endpoint.clone(), client_config.clone())
                .map_err(AppError::Config)?;
            clients.push(Arc::new(client));
        }

        Ok(Self::from_clients(
            clients,
            config.retry_policy(),
            config.min_request_interval,
        ))
    }

    /// Assemble a pool from pre-built clients (mock injection in tests).
    #[must_use]
    pub fn from_clients(
        clients: Vec<Arc<dyn NodeClient>>,
        policy: RetryPolicy,
        min_request_interval: Duration,
    ) -> Self {
        Self {
            clients,
            policy,
            pacer: RequestPacer::new(min_request_interval),
        }
    }

    /// Number of configured endpoints
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Run one RPC primitive across the endpoint list until it succeeds or
    /// every endpoint is exhausted.
    ///
    /// The closure is invoked once per underlying network call; retry state
    /// lives entirely within this call and is never shared.
    pub async fn execute<T, F, Fut>(&self, method: &'static str, call: F) -> Result<T, RpcError>
    where
        F: Fn(Arc<dyn NodeClient>) -> Fut,
        Fut: Future<Output = Result<T, RpcFailure>>,
    {
        let mut attempts: u32 = 0;
        let mut last_failure = RpcFailure::Network("no endpoints configured".to_string());

        for client in &self.clients {
            let endpoint = client.endpoint().clone();
            let mut endpoint_attempt: u32 = 0;

            loop {
                self.pacer.pace().await;
                attempts += 1;

                match call(Arc::clone(client)).await {
                    Ok(value) => {
                        debug!(method, endpoint = %endpoint, attempts, "RPC call succeeded");
                        return Ok(value);
                    }
                    Err(failure) => {
                        warn!(
                            method,
                            endpoint = %endpoint,
                            attempt = endpoint_attempt,
                            error = %failure,
                            "RPC call failed"
                        );
                        match self.policy.decide(endpoint_attempt, &failure) {
                            RetryDecision::Retry(delay) => {
                                debug!(method, endpoint = %endpoint, ?delay, "Backing off");
                                tokio::time::sleep(delay).await;
                                endpoint_attempt += 1;
                            }
                            RetryDecision::GiveUp => {
                                last_failure = failure;
                                break;
                            }
                        }
                    }
                }
            }
        }

        warn!(method, attempts, "All endpoints exhausted");
        Err(RpcError::AllEndpointsExhausted {
            endpoints: self.clients.len(),
            attempts,
            last: last_failure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::mocks::MockNodeClient;

    fn no_backoff_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
            jitter_window: Duration::ZERO,
            max_retries_per_endpoint: max_retries,
        }
    }

    fn pool_of(clients: Vec<Arc<MockNodeClient>>, max_retries: u32) -> EndpointPool {
        let dyn_clients: Vec<Arc<dyn NodeClient>> = clients
            .into_iter()
            .map(|c| c as Arc<dyn NodeClient>)
            .collect();
        EndpointPool::from_clients(dyn_clients, no_backoff_policy(max_retries), Duration::ZERO)
    }

    #[tokio::test]
    async fn test_first_endpoint_success_contacts_no_others() {
        let first = Arc::new(MockNodeClient::new("node-1").with_balance(42));
        let second = Arc::new(MockNodeClient::new("node-2"));
        let pool = pool_of(vec![Arc::clone(&first), Arc::clone(&second)], 3);

        let address = solana_sdk::pubkey::Pubkey::new_unique();
        let balance = pool
            .execute("getBalance", move |c| async move {
                c.get_balance(&address).await
            })
            .await
            .unwrap();

        assert_eq!(balance, 42);
        assert_eq!(first.calls().len(), 1);
        assert!(second.calls().is_empty());
    }

    #[tokio::test]
    async fn test_network_errors_exhaust_after_exactly_n_attempts() {
        let clients: Vec<Arc<MockNodeClient>> = (0..3)
            .map(|i| {
                Arc::new(MockNodeClient::new(format!("node-{}", i)).failing_with(
                    RpcFailure::Network("connection refused".to_string()),
                ))
            })
            .collect();
        let pool = pool_of(clients.clone(), 5);

        let address = solana_sdk::pubkey::Pubkey::new_unique();
        let result = pool
            .execute("getBalance", move |c| async move {
                c.get_balance(&address).await
            })
            .await;

        match result {
            Err(RpcError::AllEndpointsExhausted {
                endpoints,
                attempts,
                ..
            }) => {
                assert_eq!(endpoints, 3);
                // No retries on non-rate-limit errors: one call per endpoint
                assert_eq!(attempts, 3);
            }
            other => panic!("Expected exhaustion, got {:?}", other.map(|_| ())),
        }
        for client in clients {
            assert_eq!(client.calls().len(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_retries_same_endpoint_then_fails_over() {
        let first = Arc::new(
            MockNodeClient::new("node-1")
                .failing_with(RpcFailure::RateLimited("429".to_string())),
        );
        let second = Arc::new(MockNodeClient::new("node-2").with_balance(7));
        let pool = pool_of(vec![Arc::clone(&first), Arc::clone(&second)], 3);

        let address = solana_sdk::pubkey::Pubkey::new_unique();
        let balance = pool
            .execute("getBalance", move |c| async move {
                c.get_balance(&address).await
            })
            .await
            .unwrap();

        assert_eq!(balance, 7);
        // The rate-limited endpoint got its full per-endpoint budget
        assert_eq!(first.calls().len(), 3);
        assert_eq!(second.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_calls_bounded_by_endpoints_times_budget() {
        let clients: Vec<Arc<MockNodeClient>> = (0..2)
            .map(|i| {
                Arc::new(
                    MockNodeClient::new(format!("node-{}", i))
                        .failing_with(RpcFailure::RateLimited("429".to_string())),
                )
            })
            .collect();
        let pool = pool_of(clients.clone(), 4);

        let address = solana_sdk::pubkey::Pubkey::new_unique();
        let result = pool
            .execute("getBalance", move |c| async move {
                c.get_balance(&address).await
            })
            .await;

        match result {
            Err(RpcError::AllEndpointsExhausted { attempts, .. }) => {
                assert_eq!(attempts, 8);
            }
            other => panic!("Expected exhaustion, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_timeout_advances_without_backoff() {
        let first = Arc::new(
            MockNodeClient::new("node-1")
                .failing_with(RpcFailure::Timeout("deadline elapsed".to_string())),
        );
        let second = Arc::new(MockNodeClient::new("node-2").with_balance(1));
        let pool = pool_of(vec![Arc::clone(&first), Arc::clone(&second)], 3);

        let address = solana_sdk::pubkey::Pubkey::new_unique();
        let balance = pool
            .execute("getBalance", move |c| async move {
                c.get_balance(&address).await
            })
            .await
            .unwrap();

        assert_eq!(balance, 1);
        assert_eq!(first.calls().len(), 1);
    }
}
