use serde::Deserialize;

/// Admin-created account. Unlike self-registration this carries a role and
/// the account comes up active, with no confirmation round-trip.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    #[serde(rename = "birthDate")]
    pub birth_date: Option<String>,
    pub document: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Admin partial update. `id`, `password`, `role` and the timestamps are not
/// part of the shape, so they cannot be changed here.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    #[serde(rename = "birthDate")]
    pub birth_date: Option<String>,
    pub document: Option<String>,
    pub email: Option<String>,
}
