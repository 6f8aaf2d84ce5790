use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;

use crate::cache;
use crate::errors::AppError;
use crate::models::{BalanceResponse, PaymentReceipt, PaymentResponse, SimulatePaymentRequest};
use crate::payments;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/balance/:address", get(get_balance))
        .route("/simulate", post(simulate_payment))
}

/// Cached USDC balance for a wallet. A cache miss falls through to a single
/// eth_call when an RPC URL is configured; otherwise the balance is unknown.
async fn cached_balance(state: &AppState, address: &str) -> Result<Option<Decimal>, AppError> {
    let key = cache::balance_key(address);
    if let Some(balance) = cache::get::<Decimal>(&key) {
        return Ok(Some(balance));
    }

    let Some(rpc_url) = state.config.base_rpc_url.as_deref() else {
        return Ok(None);
    };

    match payments::fetch_usdc_balance(&state.http, rpc_url, address).await {
        Ok(balance) => {
            if let Err(e) = cache::set(&key, &balance, cache::BALANCE_TTL) {
                tracing::warn!("Failed to cache balance for {}: {}", address, e);
            }
            Ok(Some(balance))
        }
        Err(e) => {
            tracing::warn!("Failed to fetch USDC balance for {}: {}", address, e);
            Ok(None)
        }
    }
}

/// GET /api/payments/balance/:address
async fn get_balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>, AppError> {
    let address = payments::normalize_address(&address).map_err(AppError::BadRequest)?;
    let balance = cached_balance(&state, &address).await?;

    Ok(Json(BalanceResponse {
        success: true,
        address,
        token: "USDC",
        balance,
    }))
}

/// POST /api/payments/simulate - run the demo payment flow. An insufficient
/// balance is a domain outcome (status "error" in a 200 envelope), not a
/// transport failure; malformed inputs are 400s.
async fn simulate_payment(
    State(state): State<AppState>,
    Json(payload): Json<SimulatePaymentRequest>,
) -> Result<Json<PaymentResponse>, AppError> {
    let address = payload
        .address
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Wallet address is required".to_string()))?;
    let address = payments::normalize_address(address).map_err(AppError::BadRequest)?;

    let amount = payload
        .amount
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Payment amount is required".to_string()))?;
    let amount = payments::parse_usdc_amount(amount).map_err(AppError::BadRequest)?;

    let balance = cached_balance(&state, &address).await?;
    let result = payments::run_payment(amount, balance).await;

    Ok(Json(PaymentResponse {
        success: true,
        payment: PaymentReceipt {
            status: result.status,
            tx_hash: result.tx_hash,
            error: result.error,
            history: result.history,
            address,
            amount: amount.to_string(),
            description: payload.description,
        },
    }))
}
