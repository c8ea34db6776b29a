pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::routes;
pub use state::ApiState;

/// Binds and serves the route table on `port` until the process exits
/// (spec.md §5's "API servicer" task; spec.md §6's client API). Mirrors the
/// teacher's `RpcServer::start`, generalized from three hand-built routes
/// to the full table in [`routes`].
pub async fn serve(state: ApiState, port: u16) {
    let routes = routes::routes(state);
    tracing::info!(port, "API servicer listening");
    warp::serve(routes).run(([127, 0, 0, 1], port)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use node_core::{Ledger, LedgerConfig};
    use node_network::peer::PeerRegistry;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use warp::http::StatusCode;
    use warp::test::request;

    fn test_state() -> ApiState {
        let ledger = Ledger::new(LedgerConfig::default());
        ApiState::new(Arc::new(Mutex::new(ledger)), PeerRegistry::new())
    }

    #[tokio::test]
    async fn status_reports_genesis_head() {
        let filter = routes::routes(test_state());
        let resp = request().method("GET").path("/status").reply(&filter).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["head_index"], 0);
    }

    #[tokio::test]
    async fn chain_head_returns_genesis_block() {
        let filter = routes::routes(test_state());
        let resp = request().method("GET").path("/chain/head").reply(&filter).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_block_hash_is_404() {
        let filter = routes::routes(test_state());
        let resp = request()
            .method("GET")
            .path(&format!("/block/{}", "00".repeat(32)))
            .reply(&filter)
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_balance_address_is_400() {
        let filter = routes::routes(test_state());
        let resp = request()
            .method("GET")
            .path("/balance/not-a-valid-address!!")
            .reply(&filter)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn deleting_an_unknown_peer_is_400() {
        let filter = routes::routes(test_state());
        let resp = request()
            .method("DELETE")
            .path("/peers/ghost")
            .reply(&filter)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
