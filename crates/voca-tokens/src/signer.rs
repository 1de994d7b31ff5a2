use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;
use voca_types::api::{ScopedClaims, TokenKind};

use crate::TokenError;

/// One signing context: a single HMAC key bound to a single token kind.
///
/// The chain owns one `Signer` per kind and never shares them.
pub struct Signer {
    kind: TokenKind,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl Signer {
    pub fn new(kind: TokenKind, secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            kind,
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn sign<C: Serialize>(&self, claims: &C) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(|source| {
            TokenError::Sign {
                kind: self.kind.as_str(),
                source,
            }
        })
    }

    /// Check signature, expiry and scope. Every failure mode yields `None`;
    /// the reason is only logged server-side.
    pub fn verify<C>(&self, token: &str) -> Option<C>
    where
        C: DeserializeOwned + ScopedClaims,
    {
        match decode::<C>(token, &self.decoding, &self.validation) {
            Ok(data) if data.claims.kind() == self.kind => Some(data.claims),
            Ok(data) => {
                debug!(
                    "{} token rejected: carries {} scope",
                    self.kind.as_str(),
                    data.claims.kind().as_str()
                );
                None
            }
            Err(e) => {
                debug!("{} token rejected: {}", self.kind.as_str(), e);
                None
            }
        }
    }
}
