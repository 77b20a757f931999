//! HTTP-level tests for the per-endpoint client and the failover pool.
//!
//! Uses `wiremock` to pin down failure classification: HTTP 429 backs off,
//! deadlines time out, and everything else transport-shaped fails over.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use solana_transfer_engine::domain::{
    ConfirmationStatus, Endpoint, NodeClient, RpcError, RpcFailure, SignedTransaction,
};
use solana_transfer_engine::infra::{EndpointPool, HttpRpcClient, RetryPolicy, RpcClientConfig};

fn client_for(uri: &str) -> HttpRpcClient {
    HttpRpcClient::new(
        Endpoint::new(uri),
        RpcClientConfig {
            request_timeout: Duration::from_secs(2),
            commitment: CommitmentConfig::confirmed(),
        },
    )
    .unwrap()
}

fn balance_response(lamports: u64) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": { "context": { "slot": 12345 }, "value": lamports }
    })
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

mod classification {
    use super::*;

    #[tokio::test]
    async fn test_success_parses_balance() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(balance_response(990_000_000)))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let balance = client.get_balance(&Pubkey::new_unique()).await.unwrap();
        assert_eq!(balance, 990_000_000);
    }

    #[tokio::test]
    async fn test_http_429_classified_as_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let result = client.get_balance(&Pubkey::new_unique()).await;
        assert!(matches!(result, Err(RpcFailure::RateLimited(_))));
    }

    #[tokio::test]
    async fn test_http_500_classified_as_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let result = client.get_balance(&Pubkey::new_unique()).await;
        assert!(matches!(result, Err(RpcFailure::Network(_))));
    }

    #[tokio::test]
    async fn test_garbage_body_classified_as_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not valid json"))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let result = client.get_balance(&Pubkey::new_unique()).await;
        assert!(matches!(result, Err(RpcFailure::Network(_))));
    }

    #[tokio::test]
    async fn test_json_rpc_error_classified_as_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": null,
                "error": { "code": -32602, "message": "Invalid params" }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let result = client.get_balance(&Pubkey::new_unique()).await;
        match result {
            Err(RpcFailure::Network(msg)) => assert!(msg.contains("Invalid params")),
            other => panic!("Expected network error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_json_rpc_rate_limit_message_classified_as_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": null,
                "error": { "code": -32005, "message": "Too many requests for this endpoint" }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let result = client.get_balance(&Pubkey::new_unique()).await;
        assert!(matches!(result, Err(RpcFailure::RateLimited(_))));
    }

    #[tokio::test]
    async fn test_slow_response_classified_as_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(balance_response(1))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = HttpRpcClient::new(
            Endpoint::new(server.uri()),
            RpcClientConfig {
                request_timeout: Duration::from_millis(100),
                commitment: CommitmentConfig::confirmed(),
            },
        )
        .unwrap();

        let result = client.get_balance(&Pubkey::new_unique()).await;
        assert!(matches!(result, Err(RpcFailure::Timeout(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_classified_as_network_error() {
        // Nothing listens on the discard port
        let client = client_for("http://127.0.0.1:9");
        let result = client.get_balance(&Pubkey::new_unique()).await;
        assert!(matches!(result, Err(RpcFailure::Network(_))));
    }
}

// ============================================================================
// WIRE PARSING
// ============================================================================

mod wire_parsing {
    use super::*;

    #[tokio::test]
    async fn test_get_recency_token_returns_blockhash() {
        let blockhash = "GHtXQBsoZHVnNFa9YevAzFr17DJjgHXk3ycTy5nRhVT3".to_string();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "context": { "slot": 12345 },
                    "value": { "blockhash": blockhash, "lastValidBlockHeight": 3090 }
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let token = client.get_recency_token().await.unwrap();
        assert_eq!(token.token, blockhash);
        assert!(!token.is_expired(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_get_recency_token_rejects_malformed_blockhash() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "context": { "slot": 12345 },
                    "value": { "blockhash": "!!definitely-not-base58!!", "lastValidBlockHeight": 1 }
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let result = client.get_recency_token().await;
        assert!(matches!(result, Err(RpcFailure::Network(_))));
    }

    #[tokio::test]
    async fn test_send_transaction_returns_signature() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdpKuc147dw2N9d"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let signed = SignedTransaction::new(vec![1, 2, 3, 4]);
        let signature = client.send_transaction(&signed).await.unwrap();
        assert_eq!(signature, "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdpKuc147dw2N9d");
    }

    #[tokio::test]
    async fn test_signature_status_confirmed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "context": { "slot": 12345 },
                    "value": [{ "err": null, "confirmationStatus": "finalized" }]
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let status = client.get_signature_status("sig").await.unwrap();
        assert_eq!(status, ConfirmationStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_signature_status_unknown_is_pending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": { "context": { "slot": 12345 }, "value": [null] }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let status = client.get_signature_status("sig").await.unwrap();
        assert_eq!(status, ConfirmationStatus::Pending);
    }

    #[tokio::test]
    async fn test_signature_status_with_ledger_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "context": { "slot": 12345 },
                    "value": [{
                        "err": { "InstructionError": [0, "Custom"] },
                        "confirmationStatus": "confirmed"
                    }]
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let status = client.get_signature_status("sig").await.unwrap();
        assert!(matches!(status, ConfirmationStatus::Failed(_)));
    }
}

// ============================================================================
// POOL FAILOVER OVER HTTP
// ============================================================================

mod pool_failover {
    use super::*;

    #[tokio::test]
    async fn test_rate_limited_endpoint_retried_then_failed_over() {
        let throttled = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
            .mount(&throttled)
            .await;

        let healthy = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(balance_response(7)))
            .mount(&healthy)
            .await;

        let clients: Vec<Arc<dyn NodeClient>> = vec![
            Arc::new(client_for(&throttled.uri())),
            Arc::new(client_for(&healthy.uri())),
        ];
        let pool = EndpointPool::from_clients(
            clients,
            RetryPolicy {
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
                jitter_window: Duration::ZERO,
                max_retries_per_endpoint: 2,
            },
            Duration::ZERO,
        );

        let address = Pubkey::new_unique();
        let balance = pool
            .execute("getBalance", move |c| async move {
                c.get_balance(&address).await
            })
            .await
            .unwrap();

        assert_eq!(balance, 7);
        // The throttled endpoint got its full per-endpoint budget before the
        // pool moved on
        assert_eq!(throttled.received_requests().await.unwrap().len(), 2);
        assert_eq!(healthy.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_all_http_endpoints_down_exhausts_after_one_call_each() {
        let broken_a = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&broken_a)
            .await;
        let broken_b = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&broken_b)
            .await;

        let clients: Vec<Arc<dyn NodeClient>> = vec![
            Arc::new(client_for(&broken_a.uri())),
            Arc::new(client_for(&broken_b.uri())),
        ];
        let pool = EndpointPool::from_clients(
            clients,
            RetryPolicy {
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
                jitter_window: Duration::ZERO,
                max_retries_per_endpoint: 3,
            },
            Duration::ZERO,
        );

        let address = Pubkey::new_unique();
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
                assert_eq!(endpoints, 2);
                assert_eq!(attempts, 2);
            }
            other => panic!("Expected exhaustion, got {:?}", other.map(|_| ())),
        }
        assert_eq!(broken_a.received_requests().await.unwrap().len(), 1);
        assert_eq!(broken_b.received_requests().await.unwrap().len(), 1);
    }
}
