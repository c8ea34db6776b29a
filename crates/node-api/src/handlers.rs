use crate::error::{ApiRejection, BadRequest};
use crate::state::ApiState;
use node_core::{SubmitOutcome, Transaction};
use node_crypto::{Address, Hash256};
use node_network::message::PeerAddr;
use node_network::peer::{LivenessState, PeerDescriptor};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

pub async fn submit_tx(tx: Transaction, state: ApiState) -> Result<impl Reply, Rejection> {
    let mut ledger = state.ledger.lock().await;
    match ledger.submit_transaction(tx) {
        SubmitOutcome::Admitted => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({"status": "admitted"})),
            StatusCode::OK,
        )),
        SubmitOutcome::Rejected(reason) => Err(warp::reject::custom(BadRequest(reason))),
    }
}

pub async fn get_chain_index(index: u64, state: ApiState) -> Result<impl Reply, Rejection> {
    let ledger = state.ledger.lock().await;
    ledger
        .block_at(index)
        .map(|b| warp::reply::json(b))
        .map_err(|e| warp::reject::custom(ApiRejection(e)))
}

pub async fn get_chain_head(state: ApiState) -> Result<impl Reply, Rejection> {
    let ledger = state.ledger.lock().await;
    Ok::<_, Rejection>(warp::reply::json(ledger.head()))
}

pub async fn get_block_by_hash(hash_hex: String, state: ApiState) -> Result<impl Reply, Rejection> {
    let hash = Hash256::from_hex(&hash_hex)
        .map_err(|e| warp::reject::custom(BadRequest(e.to_string())))?;
    let ledger = state.ledger.lock().await;
    ledger
        .block_by_hash(&hash)
        .map(|b| warp::reply::json(b))
        .map_err(|e| warp::reject::custom(ApiRejection(e)))
}

pub async fn get_balance(address_b58: String, state: ApiState) -> Result<impl Reply, Rejection> {
    let address = Address::from_base58(&address_b58)
        .map_err(|e| warp::reject::custom(BadRequest(e.to_string())))?;
    let ledger = state.ledger.lock().await;
    Ok::<_, Rejection>(warp::reply::json(&serde_json::json!({
        "address": address_b58,
        "balance": ledger.balance(&address),
    })))
}

pub async fn get_mempool(state: ApiState) -> Result<impl Reply, Rejection> {
    let ledger = state.ledger.lock().await;
    Ok::<_, Rejection>(warp::reply::json(&ledger.mempool_snapshot()))
}

#[derive(Serialize)]
struct PeerView {
    host: String,
    port: u16,
    node_id: String,
    state: &'static str,
}

fn describe(peer: &PeerDescriptor) -> PeerView {
    PeerView {
        host: peer.addr.host.clone(),
        port: peer.addr.port,
        node_id: peer.node_id.clone(),
        state: match peer.state {
            LivenessState::Connecting => "connecting",
            LivenessState::Ready => "ready",
            LivenessState::Stale => "stale",
            LivenessState::Dropped => "dropped",
        },
    }
}

pub async fn get_peers(state: ApiState) -> Result<impl Reply, Rejection> {
    let peers: Vec<PeerView> = state.peers.snapshot().await.iter().map(describe).collect();
    Ok::<_, Rejection>(warp::reply::json(&peers))
}

#[derive(Deserialize)]
pub struct AddPeerRequest {
    pub host: String,
    pub port: u16,
    pub node_id: String,
}

pub async fn post_peers(body: AddPeerRequest, state: ApiState) -> Result<impl Reply, Rejection> {
    let descriptor = PeerDescriptor::new(
        PeerAddr {
            host: body.host,
            port: body.port,
        },
        body.node_id,
        node_network::message::PROTOCOL_VERSION,
    );
    state.peers.upsert(descriptor).await;
    Ok::<_, Rejection>(StatusCode::CREATED)
}

pub async fn delete_peer(node_id: String, state: ApiState) -> Result<impl Reply, Rejection> {
    match state.peers.remove(&node_id).await {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(warp::reject::custom(BadRequest(format!(
            "unknown peer {node_id}"
        )))),
    }
}

pub async fn mining_start(state: ApiState) -> Result<impl Reply, Rejection> {
    state.mining_enabled.store(true, Ordering::SeqCst);
    Ok::<_, Rejection>(StatusCode::OK)
}

pub async fn mining_stop(state: ApiState) -> Result<impl Reply, Rejection> {
    state.mining_enabled.store(false, Ordering::SeqCst);
    Ok::<_, Rejection>(StatusCode::OK)
}

pub async fn status(state: ApiState) -> Result<impl Reply, Rejection> {
    let ledger = state.ledger.lock().await;
    let peer_count = state.peers.snapshot().await.len();
    Ok::<_, Rejection>(warp::reply::json(&serde_json::json!({
        "head_index": ledger.head().index,
        "head_hash": ledger.head().hash.to_hex(),
        "difficulty": ledger.current_difficulty(),
        "mempool_len": ledger.mempool_len(),
        "active_validators": ledger.active_validators().len(),
        "peer_count": peer_count,
        "mining_enabled": state.mining_enabled.load(Ordering::SeqCst),
    })))
}
