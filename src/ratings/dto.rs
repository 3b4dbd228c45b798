use serde::Deserialize;

/// The rater is always the authenticated identity; only the target product
/// and the value come from the body.
#[derive(Debug, Deserialize)]
pub struct CreateRatingRequest {
    pub value: Option<i64>,
    pub product_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRatingRequest {
    pub value: Option<i64>,
}
