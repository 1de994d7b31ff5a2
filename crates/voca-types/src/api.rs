use serde::{Deserialize, Serialize};

use crate::models::Message;

// -- Token claims --

/// Which signing context a token belongs to. Carried inside every claim set
/// so a token minted for one scope is rejected by the verifier of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Login,
    User,
    Group,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::User => "user",
            Self::Group => "group",
        }
    }
}

/// Claims of the short-lived login token. Only used to derive the user and
/// group tokens right after the password check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginClaims {
    pub kind: TokenKind,
    #[serde(default)]
    pub sub: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    pub kind: TokenKind,
    pub sub: i64,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupClaims {
    pub kind: TokenKind,
    pub group_id: String,
    pub iat: i64,
    pub exp: i64,
}

/// Implemented by every claim set so the verifier can check the scope
/// without knowing the concrete type.
pub trait ScopedClaims {
    fn kind(&self) -> TokenKind;
}

impl ScopedClaims for LoginClaims {
    fn kind(&self) -> TokenKind {
        self.kind
    }
}

impl ScopedClaims for UserClaims {
    fn kind(&self) -> TokenKind {
        self.kind
    }
}

impl ScopedClaims for GroupClaims {
    fn kind(&self) -> TokenKind {
        self.kind
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub birthdate: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: i64,
}

/// Login body. The account may be named through `username_or_email`,
/// `username` or `email`; see [`LoginRequest::login_name`].
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username_or_email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
    #[serde(default)]
    pub group_id: Option<String>,
}

impl LoginRequest {
    /// First non-blank of `username_or_email`, `username`, `email`.
    pub fn login_name(&self) -> Option<&str> {
        [&self.username_or_email, &self.username, &self.email]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .map(str::trim)
            .find(|name| !name.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub login_token: String,
    pub user_token: String,
    pub group_token: Option<String>,
    pub user_id: i64,
    pub group_id: Option<String>,
    pub email: String,
    pub username: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditProfileRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
}

/// Per-field rejection reasons; `None` means the field passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationDetails {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ValidationDetails>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub user_token: Option<String>,
    /// `null` after a login without a group; rejected like a bad token.
    #[serde(default)]
    pub group_token: Option<String>,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LatestMessageResponse {
    pub message: Option<Message>,
}

/// A message with presentation flags computed for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedMessage {
    #[serde(flatten)]
    pub message: Message,
    pub is_current_group: bool,
    pub is_current_user: bool,
}

#[derive(Debug, Deserialize)]
pub struct LatestMessageQuery {
    pub group_id: Option<String>,
}
