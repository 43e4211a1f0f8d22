use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger_core::{Balances, BlockView, ChainStore, Ledger, LedgerError};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::policy::{self, Rejection};

pub type SharedLedger = Arc<Mutex<Ledger<Box<dyn ChainStore>>>>;

/// Handed to every handler. All reads and writes go through the one mutex,
/// so a balance check and the append it guards cannot interleave with
/// another request.
#[derive(Clone)]
pub struct AppState {
    ledger: SharedLedger,
    system_account: Arc<str>,
}

impl AppState {
    pub fn new(ledger: Ledger<Box<dyn ChainStore>>, system_account: &str) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            system_account: Arc::from(system_account),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger<Box<dyn ChainStore>>>, ApiError> {
        self.ledger
            .lock()
            .map_err(|_| ApiError::Internal("ledger lock poisoned".to_string()))
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error("invalid request body: {}", .0.body_text())]
    Body(#[from] JsonRejection),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Rejected(_) | ApiError::Body(_) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(_) | ApiError::Internal(_) => {
                error!("request failed: {self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Serialize, Deserialize)]
pub struct Health {
    pub status: String,
}

#[derive(Serialize, Deserialize)]
pub struct Head {
    pub height: u64,
    pub hash: String,
}

#[derive(Serialize, Deserialize)]
pub struct Validity {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct PartyBalance {
    pub party: String,
    pub balance: i128,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TxIn {
    pub transaction: String,
}

#[derive(Serialize, Deserialize)]
pub struct TopUpIn {
    pub account: String,
    pub amount: u64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chain", get(chain))
        .route("/chain/head", get(head))
        .route("/chain/valid", get(validity))
        .route("/balances", get(balances))
        .route("/balances/{party}", get(balance_of))
        .route("/tx", post(submit_tx))
        .route("/topup", post(top_up))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

async fn chain(State(state): State<AppState>) -> Result<Json<Vec<BlockView>>, ApiError> {
    Ok(Json(state.lock()?.get_chain()))
}

async fn head(State(state): State<AppState>) -> Result<Json<Head>, ApiError> {
    let ledger = state.lock()?;
    let tip = ledger.last();
    Ok(Json(Head {
        height: tip.index(),
        hash: tip.hash().to_string(),
    }))
}

async fn validity(State(state): State<AppState>) -> Result<Json<Validity>, ApiError> {
    let outcome = state.lock()?.verify();
    Ok(Json(Validity {
        valid: outcome.is_ok(),
        violation: outcome.err().map(|v| v.to_string()),
    }))
}

async fn balances(State(state): State<AppState>) -> Result<Json<Balances>, ApiError> {
    Ok(Json(state.lock()?.calculate_balances()))
}

async fn balance_of(
    State(state): State<AppState>,
    Path(party): Path<String>,
) -> Result<Json<PartyBalance>, ApiError> {
    let balance = state.lock()?.balance_of(&party);
    Ok(Json(PartyBalance { party, balance }))
}

async fn submit_tx(
    State(state): State<AppState>,
    payload: Result<Json<TxIn>, JsonRejection>,
) -> Result<(StatusCode, Json<BlockView>), ApiError> {
    let Json(tx) = payload?;
    debug!("transfer submitted: {:?}", tx.transaction);
    // mining is CPU bound, keep it off the async workers
    let view = tokio::task::spawn_blocking(move || {
        let mut ledger = state.lock()?;
        let transfer = policy::check_spend(&ledger.calculate_balances(), &tx.transaction)?;
        info!("mining block for {transfer}");
        let block = ledger.append(transfer.to_string())?;
        Ok::<_, ApiError>(block.view())
    })
    .await??;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn top_up(
    State(state): State<AppState>,
    payload: Result<Json<TopUpIn>, JsonRejection>,
) -> Result<(StatusCode, Json<BlockView>), ApiError> {
    let Json(req) = payload?;
    let view = tokio::task::spawn_blocking(move || {
        let transfer = policy::top_up(&state.system_account, &req.account, req.amount)?;
        let mut ledger = state.lock()?;
        info!("mining top-up {transfer}");
        let block = ledger.append(transfer.to_string())?;
        Ok::<_, ApiError>(block.view())
    })
    .await??;
    Ok((StatusCode::CREATED, Json(view)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::FromRequest, http::Request};
    use ledger_core::{MemoryStore, TxParseError};

    fn state() -> AppState {
        let store: Box<dyn ChainStore> = Box::new(MemoryStore::new());
        AppState::new(Ledger::open(store, 1).unwrap(), "Sistem")
    }

    async fn top_up_ok(state: &AppState, account: &str, amount: u64) -> BlockView {
        let req = TopUpIn {
            account: account.to_string(),
            amount,
        };
        let (status, Json(view)) = top_up(State(state.clone()), Ok(Json(req)))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        view
    }

    async fn submit(state: &AppState, text: &str) -> Result<BlockView, ApiError> {
        let req = TxIn {
            transaction: text.to_string(),
        };
        submit_tx(State(state.clone()), Ok(Json(req)))
            .await
            .map(|(_, Json(view))| view)
    }

    #[tokio::test]
    async fn top_up_then_spend_updates_balances() {
        let state = state();
        let view = top_up_ok(&state, "andi", 1_000).await;
        assert_eq!(view.index, 1);
        assert_eq!(view.transactions, "Sistem -> andi: Rp1000");

        let view = submit(&state, "andi -> budi: Rp400").await.unwrap();
        assert_eq!(view.index, 2);

        let Json(all) = balances(State(state.clone())).await.unwrap();
        assert_eq!(all["Sistem"], -1_000);
        assert_eq!(all["andi"], 600);
        assert_eq!(all["budi"], 400);

        let Json(one) = balance_of(State(state.clone()), Path("budi".to_string()))
            .await
            .unwrap();
        assert_eq!(one.balance, 400);

        let Json(head) = head(State(state.clone())).await.unwrap();
        assert_eq!(head.height, 2);

        let Json(validity) = validity(State(state)).await.unwrap();
        assert!(validity.valid);
        assert!(validity.violation.is_none());
    }

    #[tokio::test]
    async fn overdraft_is_refused_and_nothing_is_mined() {
        let state = state();
        top_up_ok(&state, "andi", 100).await;

        let err = submit(&state, "andi -> budi: Rp101").await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Rejected(Rejection::InsufficientBalance { balance: 100, .. })
        ));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let Json(chain) = chain(State(state)).await.unwrap();
        assert_eq!(chain.len(), 2);
    }

    #[tokio::test]
    async fn malformed_transfer_is_a_bad_request() {
        let state = state();
        let err = submit(&state, "hello world").await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn chained_receiver_is_refused_like_a_top_up_to_it() {
        let state = state();
        top_up_ok(&state, "andi", 500).await;

        let err = submit(&state, "andi -> budi -> carol: Rp100")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Rejected(Rejection::Malformed(TxParseError::AmbiguousReceiver(_)))
        ));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let req = TopUpIn {
            account: "budi -> carol".to_string(),
            amount: 100,
        };
        let err = top_up(State(state.clone()), Ok(Json(req))).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let Json(chain) = chain(State(state.clone())).await.unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(state.lock().unwrap().balance_of("andi"), 500);
    }

    #[tokio::test]
    async fn repeated_maximum_top_ups_keep_exact_balances() {
        let state = state();
        let max = i64::MAX as u64;
        top_up_ok(&state, "andi", max).await;
        top_up_ok(&state, "andi", max).await;

        submit(&state, &format!("andi -> budi: Rp{max}")).await.unwrap();

        let Json(all) = balances(State(state.clone())).await.unwrap();
        assert_eq!(all["Sistem"], -2 * i128::from(i64::MAX));
        assert_eq!(all["andi"], i128::from(i64::MAX));
        assert_eq!(all["budi"], i128::from(i64::MAX));

        let body = serde_json::to_string(&all).unwrap();
        assert!(body.contains("\"Sistem\":-18446744073709551614"));
    }

    #[tokio::test]
    async fn unparseable_body_is_a_json_bad_request() {
        let state = state();
        let request = Request::builder()
            .method("POST")
            .uri("/tx")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let rejection = Json::<TxIn>::from_request(request, &()).await.unwrap_err();

        let err = submit_tx(State(state.clone()), Err(rejection))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Body(_)));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid request body"));

        let Json(chain) = chain(State(state)).await.unwrap();
        assert_eq!(chain.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_spends_cannot_overdraw() {
        let state = state();
        top_up_ok(&state, "andi", 300).await;

        let mut handles = Vec::new();
        for i in 0..6 {
            let state = state.clone();
            handles.push(tokio::spawn(async move {
                submit(&state, &format!("andi -> peer{i}: Rp100")).await.is_ok()
            }));
        }
        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 3);
        let ledger = state.lock().unwrap();
        assert_eq!(ledger.balance_of("andi"), 0);
        assert_eq!(ledger.len(), 5);
        assert!(ledger.is_valid());
    }
}
