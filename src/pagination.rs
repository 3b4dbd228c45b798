use axum::extract::{rejection::QueryRejection, Query};
use serde::Deserialize;

use crate::error::ApiError;

const DEFAULT_LIMIT: i64 = 20;

/// Shared list-endpoint query string: `?q=mug&_page=2&_limit=10`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    #[serde(rename = "_page")]
    pub page: Option<i64>,
    #[serde(rename = "_limit")]
    pub limit: Option<i64>,
}

impl ListQuery {
    /// Resolve to `(limit, offset)`. Page numbering is 1-based; page 0 and 1
    /// both mean the first page. Negative values are malformed.
    pub fn limit_offset(&self) -> Result<(i64, i64), ApiError> {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        let page = self.page.unwrap_or(0);
        if limit < 0 || page < 0 {
            return Err(ApiError::bad_request("Malformed pagination parameters."));
        }
        let offset = if page <= 1 { 0 } else { (page - 1) * limit };
        Ok((limit, offset))
    }
}

/// Unwrap the axum Query extractor, turning deserialization failures into the
/// standard BadRequest envelope instead of axum's plain-text rejection.
pub fn list_query(
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<ListQuery, ApiError> {
    let Query(q) = query.map_err(|_| ApiError::bad_request("Malformed pagination parameters."))?;
    Ok(q)
}
