use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo::{Profile, Role};

/// Request body for signup. Role defaults to `finder`.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Returned by signup. No tokens: a session is only ever established by
/// login, after the (static) verification-pending step.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub profile: PublicProfile,
}

/// Response returned after login or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub profile: PublicProfile,
}

/// Role-tagged profile as exposed to clients; `role` drives owner-only
/// navigation.
#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

impl From<Profile> for PublicProfile {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            full_name: p.full_name,
            email: p.email,
            role: p.role,
        }
    }
}
