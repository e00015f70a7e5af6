//! Caller identity taken from the `x-participant-id` request header.

use axum::http::HeaderMap;

use crate::domain::ParticipantId;
use crate::error::SettlementError;

/// Header carrying the caller's participant id.
pub const PARTICIPANT_HEADER: &str = "x-participant-id";

/// Reads the caller identity from `headers`.
///
/// # Errors
///
/// Returns [`SettlementError::InvalidRequest`] when the header is missing,
/// empty, or not valid visible ASCII.
pub fn caller(headers: &HeaderMap) -> Result<ParticipantId, SettlementError> {
    let value = headers
        .get(PARTICIPANT_HEADER)
        .ok_or_else(|| SettlementError::InvalidRequest(format!("missing {PARTICIPANT_HEADER} header")))?;
    let id = value
        .to_str()
        .map_err(|_| SettlementError::InvalidRequest(format!("malformed {PARTICIPANT_HEADER} header")))?
        .trim();
    if id.is_empty() {
        return Err(SettlementError::InvalidRequest(format!(
            "empty {PARTICIPANT_HEADER} header"
        )));
    }
    Ok(ParticipantId::new(id))
}
