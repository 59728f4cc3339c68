use serde::Serialize;

/// Body of `POST /setup`, only accepted before the first admin exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetupAdminUserRequest {
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    pub password: String,
}
