use rand::Rng;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::models::PaymentStatus;

/// USDC contract address on Base
pub const USDC_ADDRESS: &str = "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913";

/// USDC uses 6 decimal places
pub const USDC_DECIMALS: u32 = 6;

/// Fixed delay standing in for transaction confirmation
pub const CONFIRMATION_DELAY: Duration = Duration::from_secs(2);

/// Outcome of one simulated payment run. This is a UI demonstration stub:
/// the transaction hash is fabricated and nothing is settled on-chain.
#[derive(Debug)]
pub struct SimulationResult {
    pub status: PaymentStatus,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
    pub history: Vec<PaymentStatus>,
}

#[derive(Debug, thiserror::Error)]
pub enum BalanceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rpc error: {0}")]
    Rpc(String),
}

/// Lowercase a 20-byte hex wallet address, rejecting anything else
pub fn normalize_address(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .ok_or_else(|| "Wallet address must start with 0x".to_string())?;

    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("Wallet address must be 20 bytes of hex".to_string());
    }

    Ok(format!("0x{}", hex.to_lowercase()))
}

/// Parse a human USDC amount ("12.50") into a positive decimal with at
/// most 6 fractional digits
pub fn parse_usdc_amount(raw: &str) -> Result<Decimal, String> {
    let amount: Decimal = raw
        .trim()
        .parse()
        .map_err(|_| format!("Invalid payment amount: {}", raw))?;

    if amount <= Decimal::ZERO {
        return Err("Payment amount must be positive".to_string());
    }
    if amount.scale() > USDC_DECIMALS {
        return Err(format!(
            "Payment amount supports at most {} decimal places",
            USDC_DECIMALS
        ));
    }

    Ok(amount.normalize())
}

/// Fabricate a 32-byte transaction hash
pub fn mock_transaction_hash() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes[..]);

    let mut hash = String::with_capacity(66);
    hash.push_str("0x");
    for byte in bytes {
        hash.push_str(&format!("{:02x}", byte));
    }
    hash
}

/// Run the simulated flow against an already-resolved balance.
/// preparing -> confirming happens only when the cached balance covers the
/// amount; confirming -> success happens unconditionally after the fixed
/// delay. An unknown balance fails the same way an insufficient one does.
pub async fn run_payment(amount: Decimal, balance: Option<Decimal>) -> SimulationResult {
    let mut history = vec![PaymentStatus::Preparing];

    let available = balance.unwrap_or(Decimal::ZERO);
    if available < amount {
        history.push(PaymentStatus::Error);
        return SimulationResult {
            status: PaymentStatus::Error,
            tx_hash: None,
            error: Some(format!(
                "Insufficient USDC balance. Required: {} USDC, Available: {} USDC",
                amount, available
            )),
            history,
        };
    }

    history.push(PaymentStatus::Confirming);
    tokio::time::sleep(CONFIRMATION_DELAY).await;

    history.push(PaymentStatus::Success);
    SimulationResult {
        status: PaymentStatus::Success,
        tx_hash: Some(mock_transaction_hash()),
        error: None,
        history,
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    message: String,
}

/// Read the wallet's USDC balance with a single ERC-20 `balanceOf` eth_call
pub async fn fetch_usdc_balance(
    http: &reqwest::Client,
    rpc_url: &str,
    address: &str,
) -> Result<Decimal, BalanceError> {
    let payload = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "eth_call",
        "params": [
            { "to": USDC_ADDRESS, "data": balance_call_data(address) },
            "latest"
        ],
    });

    let response: RpcResponse = http
        .post(rpc_url)
        .json(&payload)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if let Some(err) = response.error {
        return Err(BalanceError::Rpc(err.message));
    }

    let result = response
        .result
        .ok_or_else(|| BalanceError::Rpc("empty eth_call result".to_string()))?;

    decode_balance_result(&result).map_err(BalanceError::Rpc)
}

/// ABI-encoded calldata for `balanceOf(address)`
fn balance_call_data(address: &str) -> String {
    let hex = address.trim_start_matches("0x");
    format!("0x70a08231000000000000000000000000{}", hex)
}

fn decode_balance_result(result: &str) -> Result<Decimal, String> {
    let hex = result.trim_start_matches("0x");
    if hex.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let raw = u128::from_str_radix(hex, 16)
        .map_err(|_| format!("unparseable balance result: {}", result))?;

    Ok(Decimal::from_i128_with_scale(
        raw as i128,
        USDC_DECIMALS,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdc(units: i64, scale: u32) -> Decimal {
        Decimal::new(units, scale)
    }

    #[test]
    fn address_normalization() {
        let addr = normalize_address("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913").unwrap();
        assert_eq!(addr, USDC_ADDRESS);

        assert!(normalize_address("833589fcd6edb6e08f4c7c32d4f71b54bda02913").is_err());
        assert!(normalize_address("0x1234").is_err());
        assert!(normalize_address("0xzz3589fcd6edb6e08f4c7c32d4f71b54bda02913").is_err());
    }

    #[test]
    fn amount_parsing() {
        assert_eq!(parse_usdc_amount("12.50").unwrap(), usdc(125, 1));
        assert_eq!(parse_usdc_amount(" 1 ").unwrap(), usdc(1, 0));

        assert!(parse_usdc_amount("0").is_err());
        assert!(parse_usdc_amount("-5").is_err());
        assert!(parse_usdc_amount("1.0000001").is_err());
        assert!(parse_usdc_amount("ten").is_err());
    }

    #[test]
    fn mock_hash_is_32_bytes_of_hex() {
        let hash = mock_transaction_hash();
        assert_eq!(hash.len(), 66);
        assert!(hash.starts_with("0x"));
        assert!(hash[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn balance_calldata_layout() {
        let data = balance_call_data("0x833589fcd6edb6e08f4c7c32d4f71b54bda02913");
        assert_eq!(data.len(), 2 + 8 + 64);
        assert!(data.starts_with("0x70a08231"));
        assert!(data.ends_with("833589fcd6edb6e08f4c7c32d4f71b54bda02913"));
    }

    #[test]
    fn balance_result_decoding() {
        // 1_500_000 base units = 1.5 USDC
        let raw = format!("0x{:064x}", 1_500_000u64);
        assert_eq!(decode_balance_result(&raw).unwrap(), usdc(15, 1));
        assert_eq!(decode_balance_result("0x").unwrap(), Decimal::ZERO);
        assert!(decode_balance_result("0xnothex").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn successful_payment_confirms_after_fixed_delay() {
        let start = tokio::time::Instant::now();
        let result = run_payment(usdc(5, 0), Some(usdc(10, 0))).await;

        assert_eq!(start.elapsed(), CONFIRMATION_DELAY);
        assert_eq!(result.status, PaymentStatus::Success);
        assert!(result.error.is_none());
        assert_eq!(
            result.history,
            vec![
                PaymentStatus::Preparing,
                PaymentStatus::Confirming,
                PaymentStatus::Success
            ]
        );

        let hash = result.tx_hash.unwrap();
        assert_eq!(hash.len(), 66);
        assert!(hash[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test(start_paused = true)]
    async fn insufficient_balance_errors_without_delay() {
        let start = tokio::time::Instant::now();
        let result = run_payment(usdc(5, 0), Some(usdc(1, 0))).await;

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(result.status, PaymentStatus::Error);
        assert!(result.tx_hash.is_none());
        assert!(result.error.unwrap().contains("Insufficient USDC balance"));
        assert_eq!(
            result.history,
            vec![PaymentStatus::Preparing, PaymentStatus::Error]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_balance_errors_like_insufficient() {
        let result = run_payment(usdc(5, 0), None).await;
        assert_eq!(result.status, PaymentStatus::Error);
    }
}
