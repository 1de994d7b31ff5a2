use chrono::{DateTime, Duration, Utc};
use tracing::error;
use voca_types::api::{GroupClaims, LoginClaims, TokenKind, UserClaims};

use crate::keys::SigningKeys;
use crate::signer::Signer;
use crate::TokenError;

/// Lifetime of user and group tokens: 7 days.
pub const DERIVED_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Default lifetime of a login token. It only has to survive the derivation
/// calls made right after the password check.
pub const DEFAULT_LOGIN_TOKEN_TTL_SECS: i64 = 60;

/// Mints and validates the three token kinds of one authentication event.
///
/// Stateless: verification is pure CPU work, so a single `TokenChain` is
/// shared behind an `Arc` by every request handler.
pub struct TokenChain {
    login: Signer,
    user: Signer,
    group: Signer,
    login_ttl: Duration,
}

impl TokenChain {
    pub fn new(keys: &SigningKeys) -> Self {
        Self {
            login: Signer::new(TokenKind::Login, keys.get(TokenKind::Login)),
            user: Signer::new(TokenKind::User, keys.get(TokenKind::User)),
            group: Signer::new(TokenKind::Group, keys.get(TokenKind::Group)),
            login_ttl: Duration::seconds(DEFAULT_LOGIN_TOKEN_TTL_SECS),
        }
    }

    pub fn with_login_ttl(mut self, ttl: Duration) -> Self {
        self.login_ttl = ttl;
        self
    }

    // -- Login --

    /// Mint the login token right after the password check succeeded.
    /// Returns `None` when there is no user to vouch for.
    pub fn issue_login_token(&self, user_id: Option<i64>, group_id: Option<&str>) -> Option<String> {
        let user_id = user_id?;
        self.mint_login_token(user_id, group_id, Utc::now())
            .inspect_err(|e| error!("{}", e))
            .ok()
    }

    pub fn mint_login_token(
        &self,
        user_id: i64,
        group_id: Option<&str>,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        self.login.sign(&LoginClaims {
            kind: TokenKind::Login,
            sub: Some(user_id),
            group_id: group_id.filter(|g| !g.is_empty()).map(str::to_string),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.login_ttl).timestamp(),
        })
    }

    // -- Derivation --

    /// Exchange a valid login token for a 7-day user token.
    pub fn derive_user_token(&self, login_token: &str) -> Option<String> {
        let claims: LoginClaims = self.login.verify(login_token)?;
        let user_id = claims.sub?;
        self.mint_user_token(user_id, Utc::now())
            .inspect_err(|e| error!("{}", e))
            .ok()
    }

    /// Exchange a valid login token for a 7-day group token. `None` when the
    /// login happened outside of any group.
    pub fn derive_group_token(&self, login_token: &str) -> Option<String> {
        let claims: LoginClaims = self.login.verify(login_token)?;
        let group_id = claims.group_id.filter(|g| !g.is_empty())?;
        self.mint_group_token(&group_id, Utc::now())
            .inspect_err(|e| error!("{}", e))
            .ok()
    }

    pub fn mint_user_token(&self, user_id: i64, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        self.user.sign(&UserClaims {
            kind: TokenKind::User,
            sub: user_id,
            iat: issued_at.timestamp(),
            exp: issued_at.timestamp() + DERIVED_TOKEN_TTL_SECS,
        })
    }

    pub fn mint_group_token(&self, group_id: &str, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        self.group.sign(&GroupClaims {
            kind: TokenKind::Group,
            group_id: group_id.to_string(),
            iat: issued_at.timestamp(),
            exp: issued_at.timestamp() + DERIVED_TOKEN_TTL_SECS,
        })
    }

    // -- Resolution --

    /// Identity carried by a user token, or `None` if it is malformed, expired
    /// or signed by anything but the user key.
    pub fn resolve_user_id(&self, user_token: &str) -> Option<i64> {
        self.user.verify::<UserClaims>(user_token).map(|c| c.sub)
    }

    pub fn resolve_group_id(&self, group_token: &str) -> Option<String> {
        self.group
            .verify::<GroupClaims>(group_token)
            .map(|c| c.group_id)
            .filter(|g| !g.is_empty())
    }
}
