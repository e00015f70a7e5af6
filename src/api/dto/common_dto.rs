//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::SettlementError;

/// Pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u32,
    /// Total number of pages.
    pub total_pages: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl PaginationParams {
    /// Clamps `per_page` to the allowed maximum of 100.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 100),
        }
    }

    /// Slices `items` down to the requested page and builds its metadata.
    #[must_use]
    pub fn paginate<T>(&self, items: Vec<T>) -> (Vec<T>, PaginationMeta) {
        let params = self.clamped();
        let total = u32::try_from(items.len()).unwrap_or(u32::MAX);
        let total_pages = if total == 0 {
            0
        } else {
            total.div_ceil(params.per_page)
        };
        let start = usize::try_from(
            u64::from(params.page - 1).saturating_mul(u64::from(params.per_page)),
        )
        .unwrap_or(usize::MAX);
        let data = items
            .into_iter()
            .skip(start)
            .take(params.per_page as usize)
            .collect();
        (
            data,
            PaginationMeta {
                page: params.page,
                per_page: params.per_page,
                total,
                total_pages,
            },
        )
    }
}

/// Parses a decimal string amount.
///
/// # Errors
///
/// Returns [`SettlementError::InvalidRequest`] naming `field` when `raw` is
/// not a non-negative integer that fits in 128 bits.
pub fn parse_amount(field: &str, raw: &str) -> Result<u128, SettlementError> {
    raw.trim()
        .parse()
        .map_err(|_| SettlementError::InvalidRequest(format!("invalid {field}: {raw}")))
}

/// Parses an optional decimal string amount, defaulting to zero.
///
/// # Errors
///
/// Same as [`parse_amount`].
pub fn parse_optional_amount(field: &str, raw: Option<&str>) -> Result<u128, SettlementError> {
    raw.map_or(Ok(0), |raw| parse_amount(field, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_and_slices() {
        let params = PaginationParams {
            page: 2,
            per_page: 2,
        };
        let (data, meta) = params.paginate(vec![1, 2, 3, 4, 5]);
        assert_eq!(data, vec![3, 4]);
        assert_eq!(meta.total, 5);
        assert_eq!(meta.total_pages, 3);

        let params = PaginationParams {
            page: 0,
            per_page: 1_000,
        };
        let (data, meta) = params.paginate(vec![1, 2]);
        assert_eq!(data.len(), 2);
        assert_eq!(meta.page, 1);
        assert_eq!(meta.per_page, 100);
    }

    #[test]
    fn amounts_parse_as_u128() {
        assert_eq!(
            parse_amount("amount", "340282366920938463463374607431768211455"),
            Ok(u128::MAX)
        );
        assert!(parse_amount("amount", "-1").is_err());
        assert!(parse_amount("amount", "1.5").is_err());
        assert_eq!(parse_optional_amount("attached_value", None), Ok(0));
    }
}
