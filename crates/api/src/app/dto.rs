use serde::{Deserialize, Serialize};

// -------------------------
// Query parameters
// -------------------------

/// Representation detail requested with `?v=`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Default,
    /// Same field set as `default`; no audit data is ever exposed.
    Full,
    Ref,
}

#[derive(Debug, Default, Deserialize)]
pub struct RetrieveQuery {
    #[serde(default)]
    pub v: View,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub v: View,
    #[serde(default)]
    pub include_all: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    pub reason: Option<String>,
    #[serde(default)]
    pub purge: bool,
}

// -------------------------
// Request / response bodies
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ValidateIdentifierRequest {
    pub identifier: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateIdentifierResponse {
    pub valid: bool,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub results: Vec<T>,
}
