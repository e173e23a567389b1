use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::User;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Extends the session lifetime when set.
    #[serde(default)]
    pub remember: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// Where the client should navigate after this action.
    pub next: String,
    pub user: PublicUser,
}

/// Identity fields safe to hand to any caller.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub username: String,
    pub email: String,
    /// Short-lived presigned link to the profile picture.
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequestBody {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordBody {
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remember_defaults_to_false() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.com","password":"pw"}"#).unwrap();
        assert!(!req.remember);
    }

    #[test]
    fn message_response_omits_absent_next() {
        let json = serde_json::to_string(&MessageResponse {
            message: "done".into(),
            next: None,
        })
        .unwrap();
        assert!(!json.contains("next"));

        let json = serde_json::to_string(&MessageResponse {
            message: "done".into(),
            next: Some("/login".into()),
        })
        .unwrap();
        assert!(json.contains(r#""next":"/login""#));
    }
}
