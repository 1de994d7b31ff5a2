use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rand::RngCore;
use voca_types::api::TokenKind;

use crate::TokenError;

/// Secrets that show up in sample configs and MUST NOT be used.
pub const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "your_secret_key",
];

/// Generate a random 256-bit secret, base64-encoded so it can live in a `.env` file.
pub fn generate_secret() -> String {
    let mut key = [0u8; 32];
    rand::rng().fill_bytes(&mut key);
    BASE64.encode(key)
}

/// The three HMAC secrets of the token chain, one per [`TokenKind`].
///
/// Construction validates that no secret is empty or a known placeholder and
/// that all three differ, so leaking one never lets an attacker forge tokens
/// of another kind.
#[derive(Clone)]
pub struct SigningKeys {
    login: Vec<u8>,
    user: Vec<u8>,
    group: Vec<u8>,
}

impl SigningKeys {
    pub fn new(
        login: impl Into<Vec<u8>>,
        user: impl Into<Vec<u8>>,
        group: impl Into<Vec<u8>>,
    ) -> Result<Self, TokenError> {
        let keys = Self {
            login: login.into(),
            user: user.into(),
            group: group.into(),
        };

        for kind in [TokenKind::Login, TokenKind::User, TokenKind::Group] {
            let secret = keys.get(kind);
            if secret.is_empty() {
                return Err(TokenError::EmptyKey(kind.as_str()));
            }
            if PLACEHOLDER_SECRETS.iter().any(|p| p.as_bytes() == secret) {
                return Err(TokenError::PlaceholderKey(kind.as_str()));
            }
        }

        let pairs = [
            (TokenKind::Login, TokenKind::User),
            (TokenKind::Login, TokenKind::Group),
            (TokenKind::User, TokenKind::Group),
        ];
        for (a, b) in pairs {
            if keys.get(a) == keys.get(b) {
                return Err(TokenError::SharedKey(a.as_str(), b.as_str()));
            }
        }

        Ok(keys)
    }

    /// Fresh random secrets for all three kinds.
    pub fn generate() -> Self {
        Self {
            login: generate_secret().into_bytes(),
            user: generate_secret().into_bytes(),
            group: generate_secret().into_bytes(),
        }
    }

    pub fn get(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Login => &self.login,
            TokenKind::User => &self.user,
            TokenKind::Group => &self.group,
        }
    }
}

impl fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeys")
            .field("login", &"<redacted>")
            .field("user", &"<redacted>")
            .field("group", &"<redacted>")
            .finish()
    }
}
