use crate::error::handle_rejection;
use crate::handlers;
use crate::state::ApiState;
use warp::Filter;

fn with_state(
    state: ApiState,
) -> impl Filter<Extract = (ApiState,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Builds the full route table named in spec.md §6. Grounded on the
/// teacher's `handler_filter.clone()` composition pattern, generalized from
/// three routes to the full endpoint list.
pub fn routes(
    state: ApiState,
) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone {
    let post_tx = warp::path("tx")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handlers::submit_tx);

    let chain_index = warp::path!("chain" / u64)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::get_chain_index);

    let chain_head = warp::path!("chain" / "head")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::get_chain_head);

    let block_by_hash = warp::path!("block" / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::get_block_by_hash);

    let balance = warp::path!("balance" / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::get_balance);

    let mempool = warp::path("mempool")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::get_mempool);

    let get_peers = warp::path("peers")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::get_peers);

    let post_peers = warp::path("peers")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handlers::post_peers);

    let delete_peer = warp::path!("peers" / String)
        .and(warp::delete())
        .and(with_state(state.clone()))
        .and_then(handlers::delete_peer);

    let mining_start = warp::path!("mining" / "start")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(handlers::mining_start);

    let mining_stop = warp::path!("mining" / "stop")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(handlers::mining_stop);

    let status = warp::path("status")
        .and(warp::get())
        .and(with_state(state))
        .and_then(handlers::status);

    post_tx
        .or(chain_head)
        .or(chain_index)
        .or(block_by_hash)
        .or(balance)
        .or(mempool)
        .or(get_peers)
        .or(post_peers)
        .or(delete_peer)
        .or(mining_start)
        .or(mining_stop)
        .or(status)
        .recover(handle_rejection)
}
