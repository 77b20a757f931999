//! Balance queries with endpoint failover.

use std::sync::Arc;
use tracing::{info, instrument};

use crate::domain::{AppError, PriceFeed, WalletBalance, lamports_to_sol};
use crate::infra::rpc::pool::EndpointPool;

use super::parse_address;

/// Answers "what is this account's balance", normalized to SOL and converted
/// with the externally supplied price. All retry behavior lives in the pool;
/// this service adds none of its own.
pub struct BalanceQueryService {
    pool: Arc<EndpointPool>,
    price_feed: Arc<dyn PriceFeed>,
}

impl BalanceQueryService {
    #[must_use]
    pub fn new(pool: Arc<EndpointPool>, price_feed: Arc<dyn PriceFeed>) -> Self {
        Self { pool, price_feed }
    }

    /// Fetch the balance for a base58 account address.
    ///
    /// Fails `InvalidAddress` before any network call on a malformed address;
    /// propagates `AllEndpointsExhausted` unchanged.
    #[instrument(skip(self))]
    pub async fn get_balance(&self, address: &str) -> Result<WalletBalance, AppError> {
        let pubkey = parse_address(address)?;

        let lamports = self
            .pool
            .execute("getBalance", move |client| async move {
                client.get_balance(&pubkey).await
            })
            .await?;

        let sol_balance = lamports_to_sol(lamports);
        let price = self.price_feed.current_price().await;
        let display_value = sol_balance * price;

        info!(lamports, sol_balance, display_value, "Balance fetched");

        Ok(WalletBalance {
            address: address.to_string(),
            lamports,
            sol_balance,
            display_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NodeClient, RpcError, RpcFailure, StaticPriceFeed, ValidationError};
    use crate::infra::retry::RetryPolicy;
    use crate::test_utils::mocks::MockNodeClient;
    use solana_sdk::pubkey::Pubkey;
    use std::time::Duration;

    fn service_with(clients: Vec<Arc<MockNodeClient>>, price: f64) -> BalanceQueryService {
        let dyn_clients: Vec<Arc<dyn NodeClient>> = clients
            .into_iter()
            .map(|c| c as Arc<dyn NodeClient>)
            .collect();
        let pool = Arc::new(EndpointPool::from_clients(
            dyn_clients,
            RetryPolicy {
                jitter_window: Duration::ZERO,
                ..Default::default()
            },
            Duration::ZERO,
        ));
        BalanceQueryService::new(pool, Arc::new(StaticPriceFeed::new(price)))
    }

    #[tokio::test]
    async fn test_balance_converted_and_priced() {
        let node = Arc::new(MockNodeClient::new("node-1").with_balance(2_500_000_000));
        let service = service_with(vec![Arc::clone(&node)], 20.0);

        let address = Pubkey::new_unique().to_string();
        let balance = service.get_balance(&address).await.unwrap();

        assert_eq!(balance.lamports, 2_500_000_000);
        assert_eq!(balance.sol_balance, 2.5);
        assert_eq!(balance.display_value, 50.0);
        assert_eq!(balance.address, address);
    }

    #[tokio::test]
    async fn test_malformed_address_makes_no_network_calls() {
        let node = Arc::new(MockNodeClient::new("node-1"));
        let service = service_with(vec![Arc::clone(&node)], 20.0);

        let result = service.get_balance("definitely-not-base58!!!").await;
        assert!(matches!(
            result,
            Err(AppError::Validation(ValidationError::InvalidAddress { .. }))
        ));
        assert!(node.calls().is_empty());
    }

    #[tokio::test]
    async fn test_exhaustion_propagates_unchanged() {
        let node = Arc::new(
            MockNodeClient::new("node-1")
                .failing_with(RpcFailure::Network("connection refused".to_string())),
        );
        let service = service_with(vec![node], 20.0);

        let result = service
            .get_balance(&Pubkey::new_unique().to_string())
            .await;
        assert!(matches!(
            result,
            Err(AppError::Rpc(RpcError::AllEndpointsExhausted { .. }))
        ));
    }
}
