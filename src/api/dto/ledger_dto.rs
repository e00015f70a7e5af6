//! Deposit and withdraw DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /pools/:id/deposit`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositRequest {
    /// Amount of the pool's source asset to contribute.
    pub amount: String,
    /// Native currency attached to the call. Must equal `amount` for a
    /// native source asset and be absent or zero otherwise.
    #[serde(default)]
    pub attached_value: Option<String>,
}

/// Response body for `POST /pools/:id/deposit`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DepositResponse {
    /// Correlation id for this command.
    pub command_id: String,
    /// Pool index.
    pub pool_id: u64,
    /// Depositor.
    pub participant: String,
    /// Amount deposited.
    pub amount: String,
    /// Depositor's contribution after the deposit.
    pub contribution: String,
    /// Pool total after the deposit.
    pub pool_total: String,
}

/// Request body for `POST /pools/:id/withdraw`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WithdrawRequest {
    /// Amount to withdraw. Larger requests release the full balance.
    pub amount: String,
}

/// Response body for `POST /pools/:id/withdraw`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WithdrawResponse {
    /// Correlation id for this command.
    pub command_id: String,
    /// Pool index.
    pub pool_id: u64,
    /// Withdrawer.
    pub participant: String,
    /// Amount requested.
    pub requested: String,
    /// Amount actually released.
    pub withdrawn: String,
    /// Withdrawer's contribution after the withdrawal.
    pub contribution: String,
    /// Pool total after the withdrawal.
    pub pool_total: String,
}
