use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Client-visible states of the simulated payment flow.
/// idle -> preparing -> confirming -> {success, error}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Idle,
    Preparing,
    Confirming,
    Success,
    Error,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatePaymentRequest {
    pub address: Option<String>,
    pub amount: Option<String>,
    pub description: Option<String>,
}

/// Terminal record of one simulated payment run. The transaction hash is
/// fabricated; nothing is written on-chain.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub status: PaymentStatus,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
    pub history: Vec<PaymentStatus>,
    pub address: String,
    pub amount: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub success: bool,
    pub payment: PaymentReceipt,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub success: bool,
    pub address: String,
    pub token: &'static str,
    pub balance: Option<Decimal>,
}
