//! Voca token chain
//!
//! One password check produces a short-lived login token, which is exchanged
//! for two long-lived tokens: a user token (identity) and a group token
//! (message scope). Each kind has its own HMAC key and its own `Signer`, so a
//! holder of one capability can never present another.

pub mod chain;
pub mod keys;
pub mod signer;

pub use chain::TokenChain;
pub use keys::SigningKeys;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("{0} signing key is empty")]
    EmptyKey(&'static str),

    #[error("{0} signing key is a placeholder value")]
    PlaceholderKey(&'static str),

    #[error("{0} and {1} signing keys must differ")]
    SharedKey(&'static str, &'static str),

    #[error("failed to sign {kind} token: {source}")]
    Sign {
        kind: &'static str,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
}
