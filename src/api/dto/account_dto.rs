//! Simulated account DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response body for `GET /accounts/:who/balances/:asset`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    /// Account identity.
    pub account: String,
    /// Asset.
    pub asset: String,
    /// Balance held.
    pub balance: String,
}

/// Request body for `POST /accounts/:who/credit`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreditRequest {
    /// Asset to credit (`"native"` or a token id).
    pub asset: String,
    /// Amount to credit.
    pub amount: String,
}
