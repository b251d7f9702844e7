use serde::Deserialize;
use uuid::Uuid;

/// Body of `GET /auth/v1/user`.
#[derive(Debug, Deserialize)]
pub struct AuthUserResponse {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub nombre_completo: Option<String>,
}

/// Error body returned by the platform; the field name depends on which
/// sub-API rejected the request.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl ApiErrorResponse {
    pub fn mensaje(self) -> Option<String> {
        self.message.or(self.msg).or(self.error_description)
    }
}
